//! Record identifiers
//!
//! The backend hands out integer primary keys. Some endpoints echo them back
//! as strings, so both representations are accepted on the way in; on the way
//! out they are always written as JSON numbers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Identifier of an emotion record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EmotionId(i64);

/// Identifier of a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CommentId(i64);

/// Error when parsing an identifier from a string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("invalid identifier format")]
    InvalidFormat,
}

fn parse_raw(s: &str) -> Result<i64, IdParseError> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| IdParseError::InvalidFormat)
}

impl EmotionId {
    /// Create an identifier from a raw value
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner value
    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        parse_raw(s).map(Self)
    }
}

impl CommentId {
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        parse_raw(s).map(Self)
    }
}

impl fmt::Display for EmotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EmotionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<i64> for CommentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for EmotionId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmotionId::parse(s)
    }
}

impl std::str::FromStr for CommentId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommentId::parse(s)
    }
}

impl Serialize for EmotionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

impl Serialize for CommentId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

// Deserialize from string or number
fn deserialize_raw<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct RawIdVisitor;

    impl Visitor<'_> for RawIdVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer representing a record ID")
        }

        fn visit_i64<E>(self, value: i64) -> Result<i64, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<i64, E>
        where
            E: de::Error,
        {
            i64::try_from(value).map_err(|_| de::Error::custom("record ID out of range"))
        }

        fn visit_str<E>(self, value: &str) -> Result<i64, E>
        where
            E: de::Error,
        {
            parse_raw(value).map_err(|_| de::Error::custom("invalid record ID string"))
        }
    }

    deserializer.deserialize_any(RawIdVisitor)
}

impl<'de> Deserialize<'de> for EmotionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_raw(deserializer).map(Self)
    }
}

impl<'de> Deserialize<'de> for CommentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_raw(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_parse() {
        assert_eq!(EmotionId::parse("42").unwrap(), EmotionId::new(42));
        assert_eq!(EmotionId::parse(" 7 ").unwrap(), EmotionId::new(7));
        assert!(EmotionId::parse("abc").is_err());
        assert!(CommentId::parse("").is_err());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(EmotionId::new(123).to_string(), "123");
        assert_eq!(CommentId::new(9).to_string(), "9");
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&EmotionId::new(17)).unwrap();
        assert_eq!(json, "17");
    }

    #[test]
    fn test_deserialize_number_or_string() {
        let id: EmotionId = serde_json::from_str("12345").unwrap();
        assert_eq!(id.into_inner(), 12345);

        let id: EmotionId = serde_json::from_str("\"678\"").unwrap();
        assert_eq!(id.into_inner(), 678);

        assert!(serde_json::from_str::<CommentId>("\"x1\"").is_err());
        assert!(serde_json::from_str::<CommentId>("true").is_err());
    }
}
