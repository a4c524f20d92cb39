//! SHA-256 hashing for content addressing and data integrity.

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 hash of in-memory data.
pub fn sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Incremental SHA-256 over a sequence of length-prefixed fields.
///
/// Each field is prefixed with its byte length so that `["ab", "c"]` and
/// `["a", "bc"]` hash differently.
#[derive(Default)]
pub struct FieldHasher {
    inner: Sha256,
}

impl FieldHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one field.
    pub fn field(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        let data = data.as_ref();
        self.inner.update((data.len() as u64).to_le_bytes());
        self.inner.update(data);
        self
    }

    /// Finish and return the lowercase hex digest.
    pub fn finish(self) -> String {
        hex::encode(self.inner.finalize())
    }
}
