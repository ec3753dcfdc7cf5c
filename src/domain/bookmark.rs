use sha2::{Digest, Sha256};

use crate::domain::value_objects::BookmarkName;

/// Version tag mixed into every bookmark hash. Bump it if the naming scheme
/// changes so stale links fail loudly instead of pointing elsewhere.
pub const BOOKMARK_SCHEME: &str = "v1";

/// Derive a stable anchor name for `text` inside `section`.
///
/// Algorithm: SHA-256 over `"v1:" + section + "\0" + text`, keep the first
/// 16 hex digits and prefix with `b` so the name never starts with a digit.
/// The alphabet is `[0-9a-f]`, safe for both `id` attributes and URL
/// fragments.
pub fn bookmark_name(section: &str, text: &str) -> BookmarkName {
    let mut hasher = Sha256::new();
    hasher.update(BOOKMARK_SCHEME.as_bytes());
    hasher.update(b":");
    hasher.update(section.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    BookmarkName(format!("b{}", &hex[..16]))
}
