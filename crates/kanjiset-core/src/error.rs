use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("no record with hash {hash:?}")]
    UnknownRecord { hash: String },
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("top-level value must be a JSON object")]
    NotAnObject,

    #[error("missing required key {0:?}")]
    MissingKey(&'static str),

    #[error("key {key:?} has the wrong shape: {reason}")]
    WrongShape { key: &'static str, reason: String },

    #[error("invalid record {hash:?} does not match any record")]
    DanglingInvalidRecord { hash: String },

    #[error("mixed hash formats in one dataset: {first} and {other}")]
    MixedHashFormats {
        first: &'static str,
        other: &'static str,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("range {start}..{end} is inverted")]
    Inverted { start: u64, end: u64 },

    #[error("range {start}..{end} exceeds blob length {len}")]
    OutOfBounds { start: u64, end: u64, len: u64 },

    #[error("range {start}..{end} overlaps {other_start}..{other_end}")]
    Overlap {
        start: u64,
        end: u64,
        other_start: u64,
        other_end: u64,
    },
}

impl RangeError {
    /// Check `start..end` against a blob of `len` bytes.
    pub fn check(start: u64, end: u64, len: u64) -> Result<(), Self> {
        if end < start {
            return Err(Self::Inverted { start, end });
        }
        if end > len {
            return Err(Self::OutOfBounds { start, end, len });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_check_accepts_exact_end() {
        assert_eq!(RangeError::check(0, 10, 10), Ok(()));
        assert_eq!(RangeError::check(4, 4, 4), Ok(()));
    }

    #[test]
    fn range_check_rejects_inverted_and_past_end() {
        assert_eq!(
            RangeError::check(5, 3, 10),
            Err(RangeError::Inverted { start: 5, end: 3 })
        );
        assert_eq!(
            RangeError::check(8, 11, 10),
            Err(RangeError::OutOfBounds {
                start: 8,
                end: 11,
                len: 10
            })
        );
    }
}
