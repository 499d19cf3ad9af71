//! Email value object.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{IdpError, Result};

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email regex is valid")
    })
}

/// A validated, normalised (trimmed, lowercased) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Email(String);

impl Email {
    /// Parse and normalise an email address.
    ///
    /// Fails with a `Required` validation error on empty input and with
    /// `InvalidFormat` when the address does not match the email grammar.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(IdpError::required("email"));
        }
        if !email_regex().is_match(&normalized) {
            return Err(IdpError::invalid_format(
                "email",
                format!("'{}' is not a valid email address", normalized),
            ));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substring before the `@`.
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map(|(local, _)| local).unwrap_or("")
    }

    /// Substring after the `@`.
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map(|(_, domain)| domain).unwrap_or("")
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Email {
    type Err = IdpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = IdpError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl Serialize for Email {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Email {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Email::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::ValidationKind;

    #[test]
    fn test_normalises_case_and_whitespace() {
        let a = Email::parse("  Alice@Example.COM ").unwrap();
        let b = Email::parse("alice@example.com").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "alice@example.com");
    }

    #[test]
    fn test_parts() {
        let email = Email::parse("bob.smith+tag@mail.example.org").unwrap();
        assert_eq!(email.local_part(), "bob.smith+tag");
        assert_eq!(email.domain(), "mail.example.org");
    }

    #[test]
    fn test_empty_is_required() {
        for raw in ["", "   "] {
            let err = Email::parse(raw).unwrap_err();
            assert!(matches!(
                err,
                IdpError::Validation { kind: ValidationKind::Required, .. }
            ));
        }
    }

    #[test]
    fn test_malformed_is_invalid_format() {
        for raw in ["no-at-sign", "two@@example.com", "user@", "@example.com", "a@b", "a b@c.io"] {
            let err = Email::parse(raw).unwrap_err();
            assert!(
                matches!(err, IdpError::Validation { kind: ValidationKind::InvalidFormat, .. }),
                "expected InvalidFormat for {raw:?}"
            );
        }
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let email: Email = serde_json::from_str("\"Carol@Example.com\"").unwrap();
        assert_eq!(email.as_str(), "carol@example.com");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }
}
