//! Storage-key scheme and prefix ownership rules.
//!
//! Keys are unique by construction: epoch milliseconds, a random base-36
//! suffix and, for batches, the item index. No lock or sequence service is
//! involved.
//!
//! ```text
//! single: uploads/anonymous/<millis>-<random>.<ext>
//! batch:  uploads/<millis>-<index>-<random>.<ext>
//! ```

use rand::Rng;

/// Root of every key this service issues.
pub const UPLOAD_ROOT: &str = "uploads/";

/// Namespace for anonymous single uploads. Listing, download, details and
/// single delete are confined to it.
pub const ANONYMOUS_PREFIX: &str = "uploads/anonymous/";

/// Key for a single anonymous upload.
#[must_use]
pub fn single_key(timestamp_millis: i64, suffix: &str, file_name: &str) -> String {
    format!(
        "{ANONYMOUS_PREFIX}{timestamp_millis}-{suffix}.{}",
        file_extension(file_name)
    )
}

/// Key for item `index` of a batch upload.
#[must_use]
pub fn batch_key(timestamp_millis: i64, index: usize, suffix: &str, file_name: &str) -> String {
    format!(
        "{UPLOAD_ROOT}{timestamp_millis}-{index}-{suffix}.{}",
        file_extension(file_name)
    )
}

/// Extension of `file_name`: the text after the last dot, or the whole name
/// when there is no dot. Unsafe characters are replaced with `_`.
#[must_use]
pub fn file_extension(file_name: &str) -> String {
    let raw = file_name.rsplit('.').next().unwrap_or(file_name);
    sanitize(raw)
}

/// Name shown to users: the key without the anonymous prefix.
#[must_use]
pub fn display_name(key: &str) -> &str {
    key.strip_prefix(ANONYMOUS_PREFIX).unwrap_or(key)
}

/// Whether `key` lies under `prefix`.
#[must_use]
pub fn is_owned(key: &str, prefix: &str) -> bool {
    key.starts_with(prefix)
}

/// Random base-36 suffix, 10 to 13 characters long.
#[must_use]
pub fn random_suffix() -> String {
    let mut rng = rand::rng();
    // At least 10 digits keeps the suffix length close to constant.
    let value = rng.random_range(36u64.pow(9)..u64::MAX);
    to_base36(value)
}

/// Lowercase base-36 rendering of `value`.
#[must_use]
pub fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(13);
    while value > 0 {
        out.push(DIGITS[usize::try_from(value % 36).unwrap_or(0)]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Only allows ASCII alphanumeric characters, hyphens, and underscores.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("a.png", "png")]
    #[case("archive.tar.gz", "gz")]
    #[case("README", "README")]
    #[case("photo.", "")]
    #[case("evil.p/ng", "p_ng")]
    #[case("直播.mp4", "mp4")]
    fn test_file_extension(#[case] name: &str, #[case] ext: &str) {
        assert_eq!(file_extension(name), ext);
    }

    #[test]
    fn test_single_key_format() {
        let key = single_key(1_700_000_000_000, "k3j9x0a1b2", "a.png");
        assert_eq!(key, "uploads/anonymous/1700000000000-k3j9x0a1b2.png");
    }

    #[test]
    fn test_batch_key_format() {
        let key = batch_key(1_700_000_000_000, 3, "k3j9x0a1b2", "clip.mp4");
        assert_eq!(key, "uploads/1700000000000-3-k3j9x0a1b2.mp4");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("uploads/anonymous/1-abc.png"), "1-abc.png");
        assert_eq!(display_name("uploads/1-0-abc.png"), "uploads/1-0-abc.png");
    }

    #[test]
    fn test_is_owned() {
        assert!(is_owned("uploads/anonymous/x.png", ANONYMOUS_PREFIX));
        assert!(is_owned("uploads/1-0-x.png", UPLOAD_ROOT));
        assert!(!is_owned("uploads/1-0-x.png", ANONYMOUS_PREFIX));
        assert!(!is_owned("private/x.png", UPLOAD_ROOT));
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(u64::MAX), "3w5e11264sgsf");
    }

    #[test]
    fn test_random_suffixes_are_distinct() {
        let suffixes: HashSet<String> = (0..1000).map(|_| random_suffix()).collect();
        assert_eq!(suffixes.len(), 1000);
    }

    proptest! {
        #[test]
        fn prop_random_suffix_is_base36(_seed in 0u8..255) {
            let suffix = random_suffix();
            prop_assert!((10..=13).contains(&suffix.len()));
            prop_assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }

        #[test]
        fn prop_batch_keys_unique_within_millisecond(
            ts in 0i64..4_000_000_000_000,
            n in 1usize..=10,
        ) {
            let keys: HashSet<String> = (0..n)
                .map(|i| batch_key(ts, i, "samesuffix", "f.bin"))
                .collect();
            prop_assert_eq!(keys.len(), n);
        }

        #[test]
        fn prop_single_key_under_anonymous_prefix(
            ts in 0i64..4_000_000_000_000,
            name in "[a-zA-Z0-9 _.-]{1,40}",
        ) {
            let key = single_key(ts, &random_suffix(), &name);
            prop_assert!(key.starts_with(ANONYMOUS_PREFIX));
            prop_assert_eq!(key.matches('/').count(), 2);
        }
    }
}
