use std::{fmt::Display, fs::File, path::Path};

use anyhow::Context;
use blake3::Hash;

/// Content hash of a music file.
///
/// Two files with the same bytes share a hash, which makes it the key
/// used to recognise a track that was already stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(pub Hash);

impl ContentHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    pub fn from_hex(hex: &str) -> anyhow::Result<Self> {
        Ok(Self(
            Hash::from_hex(hex).with_context(|| format!("invalid content hash '{hex}'"))?,
        ))
    }

    /// Streams the file through the hasher instead of loading it whole.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open {}", path.to_string_lossy()))?;
        let mut hasher = blake3::Hasher::new();
        hasher
            .update_reader(file)
            .with_context(|| format!("failed to hash {}", path.to_string_lossy()))?;
        Ok(Self(hasher.finalize()))
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
