// Short codes
//
// Six-character, human-enterable identifiers audiences type to join an event.
// The alphabet drops 0/O and 1/I so codes survive being read off a projector.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Number of characters in a short code
pub const SHORT_CODE_LEN: usize = 6;

/// Characters a generated short code is drawn from
pub const SHORT_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Rejected short code input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid short code: {0:?}")]
pub struct InvalidShortCode(pub String);

/// Validated, upper-cased 6-character event code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[cfg_attr(feature = "openapi", schema(value_type = String, example = "AB12CD"))]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

impl ShortCode {
    /// Generate a random code from `SHORT_CODE_ALPHABET`.
    /// Uniqueness is the caller's concern (checked against active events).
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code: String = (0..SHORT_CODE_LEN)
            .map(|_| SHORT_CODE_ALPHABET[rng.gen_range(0..SHORT_CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Parse user input: trims, upper-cases, then checks length and characters.
    ///
    /// Any ASCII alphanumeric is accepted so codes issued before the alphabet
    /// was narrowed still resolve.
    pub fn parse(input: &str) -> Result<Self, InvalidShortCode> {
        let normalized = input.trim().to_ascii_uppercase();
        if normalized.len() != SHORT_CODE_LEN
            || !normalized.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(InvalidShortCode(input.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShortCode {
    type Err = InvalidShortCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShortCode {
    type Error = InvalidShortCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShortCode> for String {
    fn from(code: ShortCode) -> Self {
        code.0
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
