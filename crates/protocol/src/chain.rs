//! Chain ids and account addresses as the provider speaks them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a chain id string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainIdParseError {
    #[error("chain id must start with 0x: {0:?}")]
    MissingPrefix(String),

    #[error("chain id has no hex digits")]
    Empty,

    #[error("chain id contains a non-hex character: {0:?}")]
    InvalidDigit(String),
}

/// A chain id in the provider's wire form: a `0x`-prefixed hex string.
///
/// Providers are inconsistent about case and there is no canonical
/// padding, so the value is normalized to lowercase on construction;
/// equality and hashing therefore ignore the case the wallet happened
/// to emit. Serializes as the bare hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(String);

impl ChainId {
    /// Parses and normalizes a hex chain id such as `"0xA86A"`.
    pub fn parse(s: &str) -> Result<Self, ChainIdParseError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| ChainIdParseError::MissingPrefix(s.to_string()))?;
        if digits.is_empty() {
            return Err(ChainIdParseError::Empty);
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ChainIdParseError::InvalidDigit(s.to_string()));
        }
        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// The normalized `0x...` hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ChainId {
    type Error = ChainIdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ChainId> for String {
    fn from(id: ChainId) -> String {
        id.0
    }
}

impl std::str::FromStr for ChainId {
    type Err = ChainIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error parsing an account address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("address must start with 0x: {0:?}")]
    MissingPrefix(String),

    #[error("address must have 40 hex digits, got {0}")]
    WrongLength(usize),

    #[error("address contains a non-hex character: {0:?}")]
    InvalidDigit(String),
}

/// An EVM account address, `0x` + 40 hex digits.
///
/// Case is preserved as received (checksummed form stays readable);
/// equality compares case-insensitively since EIP-55 casing carries no
/// identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| AddressParseError::MissingPrefix(s.to_string()))?;
        if digits.len() != 40 {
            return Err(AddressParseError::WrongLength(digits.len()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressParseError::InvalidDigit(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Full `0x...` form as received from the provider.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display form shown to users: first six characters, an ellipsis,
    /// and the last four (`0x1234...abcd`).
    pub fn truncated(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Address {}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> String {
        addr.0
    }
}

impl std::str::FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
