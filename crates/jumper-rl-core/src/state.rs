//! State representations and the state codec
//!
//! The environment reports its state as a bit string such as `"0b0010100"`.
//! The whole string, read as an unsigned binary number, is the row of the
//! value table; fixed slices of it carry the platform the player stands on
//! and the direction it faces.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{RLError, Result};

/// Raw state string as produced by the environment, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateBits(pub String);

impl StateBits {
    /// Create a new state string
    pub fn new(bits: impl Into<String>) -> Self {
        Self(bits.into())
    }

    /// Borrow the raw string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StateBits {
    fn from(bits: &str) -> Self {
        Self(bits.to_owned())
    }
}

impl From<String> for StateBits {
    fn from(bits: String) -> Self {
        Self(bits)
    }
}

impl fmt::Display for StateBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Row index into the value table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateIndex(pub usize);

impl StateIndex {
    /// Index of the state made of `platform` and `direction` when every
    /// platform has `directions` directions
    #[must_use]
    pub fn from_parts(platform: usize, direction: usize, directions: usize) -> Self {
        Self(platform * directions + direction)
    }

    /// Get the raw index
    #[must_use]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl From<usize> for StateIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for StateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable fields of a state, for logs and inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateDetails {
    /// Platform the player stands on
    pub platform: usize,
    /// Direction the player faces
    pub direction: usize,
}

impl fmt::Display for StateDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "platform {} direction {}", self.platform, self.direction)
    }
}

/// Layout of the state bit string
///
/// Offsets count characters of the raw string, so a `0b` prefix occupies
/// the first two positions, exactly as the environment lays it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateCodec {
    /// Character offset where the platform bits start
    pub platform_offset: usize,
    /// Number of platform bits
    pub platform_width: usize,
    /// Number of trailing direction bits
    pub direction_width: usize,
}

impl Default for StateCodec {
    fn default() -> Self {
        Self {
            platform_offset: 2,
            platform_width: 5,
            direction_width: 2,
        }
    }
}

impl StateCodec {
    /// Decode the platform and direction fields of a state
    ///
    /// The string must be at least `platform_offset + platform_width`
    /// characters long; shorter strings are rejected with
    /// [`RLError::InvalidState`].
    pub fn decode(&self, bits: &StateBits) -> Result<StateDetails> {
        let raw = bits.as_str();
        let platform_end = self.platform_offset + self.platform_width;

        let platform_bits = raw
            .get(self.platform_offset..platform_end)
            .ok_or_else(|| too_short(raw, platform_end))?;
        let direction_bits = raw
            .len()
            .checked_sub(self.direction_width)
            .and_then(|start| raw.get(start..))
            .ok_or_else(|| too_short(raw, self.direction_width))?;

        Ok(StateDetails {
            platform: parse_binary(platform_bits, raw)?,
            direction: parse_binary(direction_bits, raw)?,
        })
    }

    /// Interpret the whole state string as one unsigned binary integer
    ///
    /// An optional `0b`/`0B` prefix is ignored. The result is not checked
    /// against the size of any table.
    pub fn to_index(&self, bits: &StateBits) -> Result<StateIndex> {
        let raw = bits.as_str();
        let digits = raw
            .strip_prefix("0b")
            .or_else(|| raw.strip_prefix("0B"))
            .unwrap_or(raw);
        parse_binary(digits, raw).map(StateIndex)
    }

    /// Decode both the table index and the descriptive fields
    pub fn interpret(&self, bits: &StateBits) -> Result<(StateIndex, StateDetails)> {
        Ok((self.to_index(bits)?, self.decode(bits)?))
    }

    /// Write `index` as a state string in this layout
    ///
    /// Layouts whose platform field starts at or after position 2 get a
    /// `0b` prefix. The digits are zero-padded so that [`Self::decode`]
    /// finds both fields, and [`Self::to_index`] returns `index`.
    #[must_use]
    pub fn encode(&self, index: StateIndex) -> StateBits {
        let prefix = if self.platform_offset >= 2 { "0b" } else { "" };
        let width =
            self.platform_offset - prefix.len() + self.platform_width + self.direction_width;
        StateBits(format!("{prefix}{:0width$b}", index.0))
    }
}

fn too_short(raw: &str, needed: usize) -> RLError {
    RLError::InvalidState(format!(
        "{raw:?} is too short, expected at least {needed} characters"
    ))
}

fn parse_binary(digits: &str, raw: &str) -> Result<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(RLError::InvalidState(format!(
            "{digits:?} in {raw:?} is not a binary number"
        )));
    }
    usize::from_str_radix(digits, 2)
        .map_err(|e| RLError::InvalidState(format!("{raw:?}: {e}")))
}
