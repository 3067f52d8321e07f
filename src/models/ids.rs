use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
        )]
        #[sqlx(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }
    };
}

uuid_id!(TraderId);
uuid_id!(OrderId);
uuid_id!(TradeId);

/// A validated instrument symbol: uppercase ASCII letters, 2-10 chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct Ticker(pub String);

impl Ticker {
    /// Matches `^[A-Z]{2,10}$` exactly -- lowercase and mixed-case input is
    /// rejected, not case-folded, matching the source's
    /// `constr(pattern="^[A-Z]{2,10}$")`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let len_ok = (2..=10).contains(&raw.len());
        let chars_ok = raw.chars().all(|c| c.is_ascii_uppercase());
        if len_ok && chars_ok {
            Ok(Self(raw.to_string()))
        } else {
            Err(format!(
                "invalid ticker '{}': must be 2-10 uppercase ASCII letters",
                raw
            ))
        }
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_rejects_bad_length_and_punctuation() {
        assert!(Ticker::parse("b").is_err());
        assert!(Ticker::parse("TOOLONGTICKER").is_err());
        assert!(Ticker::parse("BTC-USD").is_err());
    }

    #[test]
    fn ticker_rejects_lowercase_and_mixed_case() {
        assert!(Ticker::parse("btc").is_err());
        assert!(Ticker::parse("Btc").is_err());
    }

    #[test]
    fn ticker_accepts_valid_uppercase() {
        assert_eq!(Ticker::parse("BTC").unwrap().0, "BTC");
    }
}
