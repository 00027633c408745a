//! Store-relative path normalization

use std::path::Path;

/// Convert a path to forward-slash form without touching the filesystem.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Normalize a base directory: forward slashes, no trailing slash (except root).
pub fn normalize_base(base: &Path) -> String {
    let mut base = to_slash(base);
    while base.len() > 1 && base.ends_with('/') {
        base.pop();
    }
    base
}

/// Turn a raw notification path into a store-relative path.
///
/// Separators become `/`, the `base` prefix is removed when it covers whole
/// components, and one leading `/` is stripped. An empty result means the
/// event concerns the base directory itself.
pub fn normalize(base: &str, raw: &Path) -> String {
    let path = to_slash(raw);
    let rest = match path.strip_prefix(base) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || base.ends_with('/') => rest,
        _ => path.as_str(),
    };
    rest.strip_prefix('/').unwrap_or(rest).to_string()
}
