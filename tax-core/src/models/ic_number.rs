use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const IC_NUMBER_LEN: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("IC number must be exactly {IC_NUMBER_LEN} digits, got '{0}'")]
pub struct IcNumberError(pub String);

/// A Malaysian identity card number: exactly twelve ASCII digits.
///
/// Kept as text so leading zeros survive every round trip through storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IcNumber(String);

impl IcNumber {
    pub fn parse(s: &str) -> Result<Self, IcNumberError> {
        let trimmed = s.trim();
        if trimmed.len() == IC_NUMBER_LEN && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(IcNumberError(s.to_string()))
        }
    }

    /// Parses a stored value, restoring leading zeros that a spreadsheet or
    /// numeric column may have dropped (`"12345678901"` becomes
    /// `"012345678901"`).
    pub fn from_stored(s: &str) -> Result<Self, IcNumberError> {
        let trimmed = s.trim();
        if !trimmed.is_empty()
            && trimmed.len() < IC_NUMBER_LEN
            && trimmed.bytes().all(|b| b.is_ascii_digit())
        {
            return Self::parse(&format!("{trimmed:0>width$}", width = IC_NUMBER_LEN));
        }
        Self::parse(trimmed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn last_four(&self) -> &str {
        &self.0[IC_NUMBER_LEN - 4..]
    }

    /// The password for an account is the last four digits of its IC number.
    pub fn verify_password(
        &self,
        password: &str,
    ) -> bool {
        password.trim() == self.last_four()
    }
}

impl TryFrom<String> for IcNumber {
    type Error = IcNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_stored(&value)
    }
}

impl From<IcNumber> for String {
    fn from(value: IcNumber) -> Self {
        value.0
    }
}

impl std::fmt::Display for IcNumber {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_accepts_twelve_digits() {
        let ic = IcNumber::parse("900101145678").unwrap();

        assert_eq!(ic.as_str(), "900101145678");
    }

    #[test]
    fn parse_keeps_leading_zeros() {
        let ic = IcNumber::parse("010203040506").unwrap();

        assert_eq!(ic.to_string(), "010203040506");
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert_eq!(
            IcNumber::parse("12345"),
            Err(IcNumberError("12345".to_string()))
        );
        assert!(IcNumber::parse("1234567890123").is_err());
    }

    #[test]
    fn parse_rejects_non_digits() {
        assert!(IcNumber::parse("90010114567a").is_err());
        assert!(IcNumber::parse("900101-14-5678").is_err());
    }

    #[test]
    fn from_stored_pads_dropped_zeros() {
        let ic = IcNumber::from_stored("10203040506").unwrap();

        assert_eq!(ic.as_str(), "010203040506");
    }

    #[test]
    fn from_stored_still_rejects_garbage() {
        assert!(IcNumber::from_stored("").is_err());
        assert!(IcNumber::from_stored("abc").is_err());
    }

    #[test]
    fn verify_password_matches_last_four_digits() {
        let ic = IcNumber::parse("900101145678").unwrap();

        assert_eq!(ic.last_four(), "5678");
        assert!(ic.verify_password("5678"));
        assert!(ic.verify_password(" 5678 "));
        assert!(!ic.verify_password("1234"));
        assert!(!ic.verify_password(""));
    }
}
