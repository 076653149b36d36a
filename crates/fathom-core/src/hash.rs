use xxhash_rust::xxh64::xxh64;

const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Fixed width of a rendered hash; u64::MAX needs exactly 11 base62 digits.
const HASH_WIDTH: usize = 11;

/// Render a u64 as a zero-padded base62 string, least significant digit
/// written into the rightmost slot.
fn base62_encode(value: u64) -> String {
    let mut digits = [b'0'; HASH_WIDTH];
    let mut rest = value;
    for slot in digits.iter_mut().rev() {
        *slot = BASE62_ALPHABET[(rest % 62) as usize];
        rest /= 62;
        if rest == 0 {
            break;
        }
    }
    String::from_utf8(digits.to_vec()).expect("base62 alphabet is ASCII")
}

/// Content hash of a file's source text, used to skip rebuilds when an
/// add_or_update carries identical text.
pub fn content_hash(source: &str) -> u64 {
    xxh64(source.as_bytes(), 0)
}

/// Printable form of a content hash for diagnostics and storage.
pub fn content_hash_str(source: &str) -> String {
    base62_encode(content_hash(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_hash() {
        assert_eq!(content_hash("fn main() {}"), content_hash("fn main() {}"));
    }

    #[test]
    fn test_hash_changes_with_content() {
        assert_ne!(content_hash("a"), content_hash("b"));
    }

    #[test]
    fn test_hash_str_length() {
        assert_eq!(content_hash_str("anything").len(), 11);
    }

    #[test]
    fn test_base62_zero() {
        let encoded = base62_encode(0);
        assert_eq!(encoded.len(), 11);
        assert!(encoded.chars().all(|c| c == '0'));
    }
}
