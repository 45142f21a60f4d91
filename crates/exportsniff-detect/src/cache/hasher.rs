//! Content hashing via xxh3.

use xxhash_rust::xxh3::xxh3_64;

/// xxh3 64-bit hash of the full content.
#[inline]
pub fn hash_content(content: &[u8]) -> u64 {
    xxh3_64(content)
}

/// Cache key: xxh3 of at most `prefix_bytes` leading bytes of the input.
/// Inputs sharing a prefix share a key; callers must compare content.
#[inline]
pub fn prefix_key(serialized: &str, prefix_bytes: usize) -> u64 {
    let bytes = serialized.as_bytes();
    hash_content(&bytes[..bytes.len().min(prefix_bytes)])
}

/// Lower-case hex form of the full-content hash, for metadata records.
pub fn content_hash_hex(serialized: &str) -> String {
    format!("{:016x}", hash_content(serialized.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_hash() {
        assert_eq!(hash_content(b"{\"a\":1}"), hash_content(b"{\"a\":1}"));
        assert_ne!(hash_content(b"{\"a\":1}"), hash_content(b"{\"a\":2}"));
    }

    #[test]
    fn prefix_key_ignores_tail() {
        assert_eq!(prefix_key("{\"a\":1}", 4), prefix_key("{\"a\":2}", 4));
        assert_ne!(prefix_key("{\"a\":1}", 64), prefix_key("{\"a\":2}", 64));
        assert_eq!(prefix_key("ab", 4096), hash_content(b"ab"));
    }

    #[test]
    fn hex_is_fixed_width() {
        assert_eq!(content_hash_hex("").len(), 16);
    }
}
