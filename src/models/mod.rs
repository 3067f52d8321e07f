pub mod ids;
pub mod order;
pub mod trader;
pub mod trade;

pub use ids::*;
pub use order::*;
pub use trader::*;
pub use trade::*;
