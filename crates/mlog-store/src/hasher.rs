//! Domain-separated hashing of stored objects.

use mlog_types::ContentId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so the identifiers of this store never collide with raw
/// BLAKE3 digests of the same bytes computed elsewhere.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for stored objects (entries and log descriptors).
    pub const OBJECT: Self = Self {
        domain: "mlog-object-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ContentId::from_hash(*hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let id1 = ContentHasher::OBJECT.hash(b"hello world");
        let id2 = ContentHasher::OBJECT.hash(b"hello world");
        assert_eq!(id1, id2);
    }

    #[test]
    fn domain_hash_differs_from_raw_hash() {
        let raw = ContentId::from_bytes(b"test");
        assert_ne!(raw, ContentHasher::OBJECT.hash(b"test"));
    }
}
