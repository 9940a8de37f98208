use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Primary key of the legacy tables: an integer persisted as text.
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct LegacyId(pub i64);

impl LegacyId {
    /// Reserved seed row (the legacy "system" user).
    pub const SEED: LegacyId = LegacyId(1);

    /// `None` once the id space is exhausted.
    pub fn next(self) -> Option<LegacyId> {
        self.0.checked_add(1).map(LegacyId)
    }
}

impl fmt::Display for LegacyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LegacyId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(LegacyId)
    }
}

impl Serialize for LegacyId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LegacyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(LegacyId(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// `LoginUsers.IsActive` code domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Inactive,
    Unknown(String),
}

impl AccountStatus {
    pub const ACTIVE_CODE: &'static str = "X";
    pub const INACTIVE_CODE: &'static str = ".";

    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            Self::ACTIVE_CODE => AccountStatus::Active,
            Self::INACTIVE_CODE => AccountStatus::Inactive,
            other => AccountStatus::Unknown(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            AccountStatus::Active => Self::ACTIVE_CODE,
            AccountStatus::Inactive => Self::INACTIVE_CODE,
            AccountStatus::Unknown(code) => code,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_id_serializes_as_decimal_text() {
        let json = serde_json::to_string(&LegacyId(42)).unwrap();
        assert_eq!(json, "\"42\"");
    }

    #[test]
    fn next_stops_at_the_top_of_the_range() {
        assert_eq!(LegacyId(41).next(), Some(LegacyId(42)));
        assert_eq!(LegacyId(i64::MAX).next(), None);
    }

    #[test]
    fn legacy_id_accepts_text_or_number() {
        let a: LegacyId = serde_json::from_str("\"17\"").unwrap();
        let b: LegacyId = serde_json::from_str("17").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<LegacyId>("\"abc\"").is_err());
    }

    #[test]
    fn status_codes_map_to_tri_state() {
        assert_eq!(AccountStatus::from_code("X"), AccountStatus::Active);
        assert_eq!(AccountStatus::from_code("."), AccountStatus::Inactive);
        assert_eq!(
            AccountStatus::from_code("Z"),
            AccountStatus::Unknown("Z".to_string())
        );
        assert!(!AccountStatus::from_code("").is_active());
    }
}
