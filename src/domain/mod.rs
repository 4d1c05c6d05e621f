pub mod artist;
pub mod hash;
pub mod track;

/// Raw image bytes handed from a worker to cover persistence.
///
/// Moved, never cloned: once written to disk the buffer is dropped.
#[derive(Debug, PartialEq, Eq)]
pub struct CoverBuffer(pub Vec<u8>);

impl CoverBuffer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
