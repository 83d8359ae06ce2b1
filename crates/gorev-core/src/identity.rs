//! Turkish national identification number (TC Kimlik No) validation.
//!
//! An identity number is eleven ASCII digits. The first digit is never zero,
//! and the last two digits are check digits derived from the preceding ones:
//!
//! - `d[9]  = (7 * (d0 + d2 + d4 + d6 + d8) - (d1 + d3 + d5 + d7)) mod 10`
//! - `d[10] = (d0 + ... + d8 + d[9]) mod 10`
//!
//! The modulo in the first formula is the mathematical one: the intermediate
//! can be negative and the result is always in `0..=9`.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of characters in an identity number.
pub const IDENTITY_NUMBER_LENGTH: usize = 11;

lazy_static! {
    /// Eleven ASCII digits. `\d` would also accept non-ASCII digits.
    static ref IDENTITY_FORMAT: Regex = Regex::new(r"^[0-9]{11}$").unwrap();
}

/// Why a candidate string was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity number must be exactly 11 characters, got {0}")]
    WrongLength(usize),

    #[error("identity number must contain only the digits 0-9")]
    NonDigit,

    #[error("identity number cannot start with 0")]
    LeadingZero,

    #[error("10th digit does not match checksum (expected {expected}, found {found})")]
    TenthDigit { expected: u8, found: u8 },

    #[error("11th digit does not match checksum (expected {expected}, found {found})")]
    EleventhDigit { expected: u8, found: u8 },
}

/// Returns `true` if `candidate` is a well-formed identity number.
///
/// Total over every input: malformed strings of any length or content are
/// simply `false`.
pub fn validate_identity_number(candidate: &str) -> bool {
    verify(candidate).is_ok()
}

/// Compute the 10th and 11th digits for nine leading digits.
///
/// Each element of `prefix` must be in `0..=9`.
pub fn check_digits(prefix: [u8; 9]) -> (u8, u8) {
    let odd_sum: i32 = prefix.iter().step_by(2).map(|&d| i32::from(d)).sum();
    let even_sum: i32 = prefix[1..8].iter().step_by(2).map(|&d| i32::from(d)).sum();

    let tenth = (odd_sum * 7 - even_sum).rem_euclid(10);
    let eleventh = (odd_sum + even_sum + tenth).rem_euclid(10);

    (tenth as u8, eleventh as u8)
}

fn verify(candidate: &str) -> Result<(), IdentityError> {
    let length = candidate.chars().count();
    if length != IDENTITY_NUMBER_LENGTH {
        return Err(IdentityError::WrongLength(length));
    }

    if !IDENTITY_FORMAT.is_match(candidate) {
        return Err(IdentityError::NonDigit);
    }

    let mut digits = [0u8; IDENTITY_NUMBER_LENGTH];
    for (slot, b) in digits.iter_mut().zip(candidate.bytes()) {
        *slot = b - b'0';
    }

    if digits[0] == 0 {
        return Err(IdentityError::LeadingZero);
    }

    let mut prefix = [0u8; 9];
    prefix.copy_from_slice(&digits[..9]);
    let (tenth, eleventh) = check_digits(prefix);

    if tenth != digits[9] {
        return Err(IdentityError::TenthDigit {
            expected: tenth,
            found: digits[9],
        });
    }

    if eleventh != digits[10] {
        return Err(IdentityError::EleventhDigit {
            expected: eleventh,
            found: digits[10],
        });
    }

    Ok(())
}

/// A validated identity number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityNumber(String);

impl IdentityNumber {
    /// Parse and validate a candidate, reporting the first failed check.
    pub fn parse(candidate: &str) -> Result<Self, IdentityError> {
        verify(candidate)?;
        Ok(Self(candidate.to_string()))
    }

    /// Build a valid identity number from nine leading digits.
    ///
    /// Returns `None` if `prefix` is not nine ASCII digits or starts with `0`.
    pub fn complete(prefix: &str) -> Option<Self> {
        if prefix.len() != 9 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let mut digits = [0u8; 9];
        for (slot, b) in digits.iter_mut().zip(prefix.bytes()) {
            *slot = b - b'0';
        }
        if digits[0] == 0 {
            return None;
        }

        let (tenth, eleventh) = check_digits(digits);
        Some(Self(format!("{prefix}{tenth}{eleventh}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for IdentityNumber {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for IdentityNumber {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IdentityNumber> for String {
    fn from(value: IdentityNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for IdentityNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
