//! Template preview server: serves the template root under `/templates/`.

use std::path::Path;

use anyhow::Result;
use tiny_http::Request;

use super::response;
use crate::utils::path::resolve_url_path;

/// URL prefix of the preview namespace, without the trailing slash.
const BASE: &str = "/templates";

/// Strip the preview base from a request URL.
///
/// `/templates` and `/templates/...` map to the template root; anything
/// else is outside the namespace.
fn strip_base(url: &str) -> Option<&str> {
    let rest = url.strip_prefix(BASE)?;
    match rest.chars().next() {
        None | Some('/' | '?' | '#') => Some(rest),
        Some(_) => None,
    }
}

pub fn handle_request(request: Request, root: &Path) -> Result<()> {
    let resolved = strip_base(request.url()).and_then(|rest| resolve_url_path(rest, root));

    match resolved {
        Some(path) => response::respond_file(request, &path),
        None => response::respond_not_found(request),
    }
}
