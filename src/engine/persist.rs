//! Matcher snapshots.
//!
//! A snapshot is the bincode encoding of `(FORMAT_VERSION, Matcher)`. The
//! version is read on its own first, so a snapshot from an incompatible build
//! is reported as such instead of as garbage. Compile warnings are not part of
//! a snapshot.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::compiler::Matcher;
use crate::error::{Error, Result};

/// Version tag written at the head of every snapshot.
pub const FORMAT_VERSION: u16 = 1;

impl Matcher {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&(FORMAT_VERSION, self))?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Matcher> {
        let found: u16 = bincode::deserialize(bytes)?;
        if found != FORMAT_VERSION {
            return Err(Error::UnsupportedFormat { found, expected: FORMAT_VERSION });
        }

        let (_, matcher): (u16, Matcher) = bincode::deserialize(bytes)?;
        if !matcher.trie().is_consistent() {
            return Err(Error::Persistence(Box::new(bincode::ErrorKind::Custom(
                "snapshot trie references missing nodes".to_string(),
            ))));
        }
        Ok(matcher)
    }

    /// Write a snapshot to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "saved matcher snapshot");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Matcher> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let matcher = Matcher::from_bytes(&bytes)?;
        debug!(path = %path.display(), nodes = matcher.node_count(), "loaded matcher snapshot");
        Ok(matcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trip_keeps_behaviour() {
        let matcher = Matcher::compile("set\tcs\t1\nc\tb\tB\ns\tlmr\tkappa\nr\tword\tseveral words\n").unwrap();
        let restored = Matcher::from_bytes(&matcher.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, matcher);
        assert_eq!(restored.settings(), matcher.settings());
    }

    #[test]
    fn rejects_other_versions() {
        let bytes = bincode::serialize(&(FORMAT_VERSION + 1, Matcher::default())).unwrap();
        let err = Matcher::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { found: 2, expected: 1 }));
    }

    #[test]
    fn rejects_truncated_input() {
        let bytes = Matcher::compile("s\tlmr\talpha\n").unwrap().to_bytes().unwrap();
        assert!(matches!(Matcher::from_bytes(&bytes[..bytes.len() / 2]), Err(Error::Persistence(_))));
        assert!(matches!(Matcher::from_bytes(&[]), Err(Error::Persistence(_))));
    }
}
