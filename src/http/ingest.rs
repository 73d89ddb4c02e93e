//! Build `Request` values from `http` crate types.
//!
//! # Data Flow
//! ```text
//! http::request::Parts ──► request_from_parts ──► Request (line, headers_in, host)
//! StatusCode + HeaderMap ──► apply_response ──► Request::headers_out
//! ```

use std::sync::Arc;

use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST, TRANSFER_ENCODING};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, Version};
use bytes::Bytes;

use crate::http::{Arena, ConnectionInfo, Request, ServerInfo};

/// Protocol token as it appears on the request line.
pub fn protocol_token(version: Version) -> Option<&'static str> {
    match version {
        Version::HTTP_09 => None,
        Version::HTTP_10 => Some("HTTP/1.0"),
        Version::HTTP_11 => Some("HTTP/1.1"),
        Version::HTTP_2 => Some("HTTP/2.0"),
        Version::HTTP_3 => Some("HTTP/3.0"),
        _ => Some("HTTP/1.1"),
    }
}

/// Create a request from parsed request head parts.
pub fn request_from_parts(
    parts: &Parts,
    connection: ConnectionInfo,
    server: Arc<ServerInfo>,
    pool: Arena,
) -> Request {
    let mut request = Request::new(server, pool);

    let target = parts
        .uri
        .path_and_query()
        .map_or("/", |pq| pq.as_str())
        .to_string();
    let path = parts.uri.path();

    request.method = Bytes::copy_from_slice(parts.method.as_str().as_bytes());
    request.unparsed_uri = Bytes::from(target.clone());
    request.uri = Bytes::from(decode_path(path.as_bytes()));
    request.args = parts.uri.query().map(|q| Bytes::copy_from_slice(q.as_bytes()));
    request.version = parts.version;
    request.http_protocol = protocol_token(parts.version).map(|p| Bytes::from_static(p.as_bytes()));

    let line = match protocol_token(parts.version) {
        Some(proto) => format!("{} {} {}", parts.method, target, proto),
        None => format!("{} {}", parts.method, target),
    };
    request.request_line = Bytes::from(line);

    let mut header_bytes = 0u64;
    for (name, value) in &parts.headers {
        header_bytes += (name.as_str().len() + value.len() + 4) as u64;
        request.headers_in.headers.push(
            Bytes::copy_from_slice(name.as_str().as_bytes()),
            Bytes::copy_from_slice(value.as_bytes()),
        );
    }
    request.request_length = request.request_line.len() as u64 + 2 + header_bytes + 2;

    // Host: header first, then the absolute-form authority.
    let host = parts
        .headers
        .get(HOST)
        .map(|v| v.as_bytes())
        .or_else(|| parts.uri.host().map(str::as_bytes));
    request.headers_in.server = host.map(strip_port).map(|h| Bytes::from(h.to_ascii_lowercase()));

    request.headers_in.content_length_n = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());

    request.connection = connection;
    request.keepalive = match parts.version {
        Version::HTTP_09 | Version::HTTP_10 => false,
        _ => !parts
            .headers
            .get_all(axum::http::header::CONNECTION)
            .iter()
            .any(|v| v.as_bytes().eq_ignore_ascii_case(b"close")),
    };

    tracing::trace!(
        method = %parts.method,
        target = %target,
        headers = parts.headers.len(),
        "request ingested"
    );

    request
}

/// Record the response head on `request`.
pub fn apply_response(request: &mut Request, status: StatusCode, headers: &HeaderMap) {
    request.headers_out.status = status.as_u16();

    for (name, value) in headers {
        if *name == CONTENT_TYPE {
            request.headers_out.content_type = Some(Bytes::copy_from_slice(value.as_bytes()));
            continue;
        }
        if *name == CONTENT_LENGTH {
            request.headers_out.content_length_n =
                value.to_str().ok().and_then(|v| v.trim().parse().ok());
            continue;
        }
        if *name == TRANSFER_ENCODING && value.as_bytes().eq_ignore_ascii_case(b"chunked") {
            request.chunked = true;
        }
        request.headers_out.headers.push(
            Bytes::copy_from_slice(name.as_str().as_bytes()),
            Bytes::copy_from_slice(value.as_bytes()),
        );
    }
}

fn strip_port(host: &[u8]) -> &[u8] {
    // bracketed IPv6 literal
    if host.first() == Some(&b'[') {
        return match host.iter().position(|&c| c == b']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.iter().rposition(|&c| c == b':') {
        Some(colon) => &host[..colon],
        None => host,
    }
}

fn decode_path(path: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(path.len());
    let mut i = 0;
    while i < path.len() {
        if path[i] == b'%' && i + 2 < path.len() {
            if let (Some(h), Some(l)) = (hex(path[i + 1]), hex(path[i + 2])) {
                out.push(h << 4 | l);
                i += 3;
                continue;
            }
        }
        out.push(path[i]);
        i += 1;
    }
    out
}

fn hex(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
