use sha2::{Digest, Sha256};

use crate::error::SchemaError;

/// Content digest of an encoded image payload: SHA-256 as 64 uppercase hex
/// characters.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(bytes))
}

/// Digest layouts that can appear in a metadata file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFormat {
    /// 128-bit digest written by older dataset generations.
    Md5Hex,
    Sha256Hex,
}

impl HashFormat {
    pub fn detect(hash: &str) -> Option<Self> {
        if !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        match hash.len() {
            32 => Some(Self::Md5Hex),
            64 => Some(Self::Sha256Hex),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Md5Hex => "md5",
            Self::Sha256Hex => "sha256",
        }
    }
}

/// Returns the single format shared by all `hashes` (`None` when empty).
pub fn uniform_hash_format<'a>(
    hashes: impl IntoIterator<Item = &'a str>,
) -> Result<Option<HashFormat>, SchemaError> {
    let mut seen: Option<HashFormat> = None;
    for h in hashes {
        let Some(format) = HashFormat::detect(h) else {
            return Err(SchemaError::WrongShape {
                key: "records",
                reason: format!("hash {h:?} is not a hex digest"),
            });
        };
        match seen {
            None => seen = Some(format),
            Some(first) if first != format => {
                return Err(SchemaError::MixedHashFormats {
                    first: first.name(),
                    other: format.name(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_known_vector_empty() {
        assert_eq!(
            content_hash(b""),
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
        );
    }

    #[test]
    fn content_hash_is_deterministic_and_detected_as_sha256() {
        let a = content_hash(b"\x89PNG payload");
        assert_eq!(a, content_hash(b"\x89PNG payload"));
        assert_ne!(a, content_hash(b"\x89PNG other"));
        assert_eq!(HashFormat::detect(&a), Some(HashFormat::Sha256Hex));
    }

    #[test]
    fn detects_legacy_md5() {
        assert_eq!(
            HashFormat::detect("D41D8CD98F00B204E9800998ECF8427E"),
            Some(HashFormat::Md5Hex)
        );
        assert_eq!(HashFormat::detect("xyz"), None);
    }

    #[test]
    fn mixed_formats_are_rejected() {
        let sha = content_hash(b"a");
        let md5 = "D41D8CD98F00B204E9800998ECF8427E";
        let err = uniform_hash_format([sha.as_str(), md5]).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MixedHashFormats {
                first: "sha256",
                other: "md5"
            }
        ));
        assert_eq!(uniform_hash_format([]).unwrap(), None);
    }
}
