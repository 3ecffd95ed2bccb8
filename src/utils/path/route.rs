//! URL <-> filesystem path mapping.

use std::path::{Component, Path, PathBuf};

use super::fs::lexical_normalize;

/// Path of `target` relative to `base`, joined with `/`.
///
/// Both paths are folded lexically first. When `target` lies outside of
/// `base` the result starts with `../` segments.
///
/// # Examples
/// ```ignore
/// relative_url_path("/t".as_ref(), "/t/a/./thumb.png".as_ref()) -> "a/thumb.png"
/// relative_url_path("/t".as_ref(), "/t/a/../../x.png".as_ref()) -> "../x.png"
/// ```
pub fn relative_url_path(base: &Path, target: &Path) -> String {
    let base = lexical_normalize(base);
    let target = lexical_normalize(target);

    let base: Vec<Component<'_>> = base.components().collect();
    let target: Vec<Component<'_>> = target.components().collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let ups = base[common..].iter().map(|_| "..".to_string());
    let downs = target[common..]
        .iter()
        .map(|c| c.as_os_str().to_string_lossy().into_owned());

    ups.chain(downs).collect::<Vec<_>>().join("/")
}

/// Resolve a request URL path to a file under `serve_root`.
///
/// Directory URLs resolve to their `index.html`. Paths escaping the root
/// (via `..` or symlinks) resolve to `None`.
pub fn resolve_url_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let local = serve_root.join(&clean);

    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Normalize URL: decode, strip query string, trim slashes
fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    decoded.trim_matches('/').to_string()
}
