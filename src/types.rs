//! Domain value types shared by the catalog client, scheduler and committer

use std::fmt;
use std::str::FromStr;

/// Public ImageNet synset identifier such as `n00007846`
///
/// Validation is case-insensitive but the spelling as given is kept, since it
/// is only ever echoed back to the catalog and to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SynsetId(String);

impl SynsetId {
    /// Number of digits following the `n` prefix
    pub const DIGITS: usize = 8;

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_well_formed(value: &str) -> bool {
        let lowered = value.to_ascii_lowercase();
        match lowered.strip_prefix('n') {
            Some(digits) => {
                digits.len() == Self::DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
            },
            None => false,
        }
    }
}

impl FromStr for SynsetId {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        if Self::is_well_formed(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(format!(
                "{} is not a valid synset id; example: n00007846",
                value
            ))
        }
    }
}

impl fmt::Display for SynsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The catalog's internal numeric id for a synset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CatalogTargetId(pub u64);

impl fmt::Display for CatalogTargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One `<image>` entry of the synset index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Storage node serving the thumbnail
    pub node: String,
    /// Synset offset path component
    pub synset_offset: String,
    /// Stable per-image token, used as filename stem and identifier
    pub prefix: String,
}

/// Exact output dimensions for rescaled thumbnails
///
/// Parsed from `WIDTH,HEIGHT`. Both components must be at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FromStr for TargetSize {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || format!("{} is not a valid size; example: 100,100", value);

        let (width, height) = value.split_once(',').ok_or_else(invalid)?;
        let parse = |part: &str| -> Option<u32> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            part.parse::<u32>().ok().filter(|v| *v > 0)
        };

        match (parse(width), parse(height)) {
            (Some(width), Some(height)) => Ok(Self { width, height }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
