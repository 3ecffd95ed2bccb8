//! HTTP response helpers shared by the preview and proxy servers.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::mime::{self, types::PLAIN};

/// Respond with a static file. Supports `HEAD` and single byte ranges.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    // Check for Range header (video seeking)
    if let Some(range) = get_range_header(&request) {
        return respond_range(request, path, content_type, &range);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    send_body(request, 200, content_type, body)
}

/// Handle Range request for media files.
fn respond_range(
    request: Request,
    path: &Path,
    content_type: &'static str,
    range: &str,
) -> Result<()> {
    use std::io::{Seek, SeekFrom};

    let file_size = fs::metadata(path)?.len();
    if file_size == 0 {
        return send_body(request, 200, content_type, Vec::new());
    }

    let range = range.strip_prefix("bytes=").unwrap_or(range);
    let (start, end) = parse_range(range, file_size);
    if start > end {
        return send_status(request, 416, "416 Range Not Satisfiable");
    }
    let length = end - start + 1;

    let mut file = fs::File::open(path)?;
    file.seek(SeekFrom::Start(start))?;
    let reader = file.take(length);

    let content_range = format!("bytes {start}-{end}/{file_size}");
    let response = Response::new(StatusCode(206), Vec::new(), reader, Some(length as usize), None);
    let response = with_header(response, "Content-Type", content_type);
    let response = with_header(response, "Content-Range", &content_range);
    let response = with_header(response, "Accept-Ranges", "bytes");

    request.respond(response)?;
    Ok(())
}

/// Parse `start-end`, `start-` or `-suffix` into an inclusive byte range.
fn parse_range(range: &str, file_size: u64) -> (u64, u64) {
    let last = file_size - 1;
    let parts: Vec<&str> = range.trim().split('-').collect();

    match parts.as_slice() {
        [s, e] if !s.is_empty() && !e.is_empty() => {
            let start = s.trim().parse().unwrap_or(0);
            let end: u64 = e.trim().parse().unwrap_or(last);
            (start, end.min(last))
        }
        [s, ""] if !s.is_empty() => (s.trim().parse().unwrap_or(0), last),
        ["", e] if !e.is_empty() => {
            let suffix: u64 = e.trim().parse().unwrap_or(0);
            (file_size.saturating_sub(suffix), last)
        }
        _ => (0, last),
    }
}

fn get_range_header(request: &Request) -> Option<String> {
    header_value(request, "range").map(str::to_string)
}

/// Case-insensitive request header lookup.
pub fn header_value<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

pub fn respond_not_found(request: Request) -> Result<()> {
    send_status(request, 404, "404 Not Found")
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_status(request, 503, "503 Service Unavailable")
}

/// Upstream server could not be reached.
pub fn respond_bad_gateway(request: Request, error: &str) -> Result<()> {
    send_body(request, 502, PLAIN, format!("502 Bad Gateway\n\n{error}").into_bytes())
}

fn send_status(request: Request, status: u16, text: &str) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, status, PLAIN);
    }
    send_body(request, status, PLAIN, text.as_bytes().to_vec())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &str) -> Result<()> {
    let response = with_header(Response::empty(StatusCode(status)), "Content-Type", content_type);
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body).with_status_code(StatusCode(status));
    let response = with_header(response, "Content-Type", content_type);
    request.respond(response)?;
    Ok(())
}

/// Add a header, skipping values tiny_http rejects.
pub fn with_header<R: Read>(response: Response<R>, name: &str, value: &str) -> Response<R> {
    match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}
