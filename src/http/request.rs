//! Request state read by variable getters.
//!
//! # Responsibilities
//! - Hold the parsed request line, headers in/out and connection metadata
//! - Own the per-request arena and variable slots
//! - Expose the small amount of mutable state setters touch (args, limit rate)
//!
//! # Design Decisions
//! - Fields are public: the embedding server fills them as it parses and responds
//! - Optional fields model "absent" (no query string, HTTP/0.9 with no protocol)
//! - Dropping the request drops its arena and slots in one step

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Version;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::http::{Arena, HeadersIn, HeadersOut, ServerInfo};
use crate::net::connection::ConnectionGuard;
use crate::variables::VariableState;

/// Kernel TCP statistics sampled for the connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpInfo {
    pub rtt: u32,
    pub rttvar: u32,
    pub snd_cwnd: u32,
    pub rcv_space: u32,
}

/// Connection-level metadata.
#[derive(Debug, Clone, Default)]
pub struct ConnectionInfo {
    /// Connection serial number (`$connection`).
    pub number: u64,
    /// Requests served on this connection so far, this one included.
    pub requests: u64,
    pub remote: Option<SocketAddr>,
    pub local: Option<SocketAddr>,
    /// Client address announced by the PROXY protocol header.
    pub proxy_protocol: Option<SocketAddr>,
    pub tls: bool,
    /// Bytes written to the client.
    pub sent: u64,
    pub tcp_info: Option<TcpInfo>,
}

impl ConnectionInfo {
    /// Metadata for the next request on a tracked connection.
    pub fn tracked(
        guard: &ConnectionGuard,
        remote: Option<SocketAddr>,
        local: Option<SocketAddr>,
    ) -> Self {
        Self {
            number: guard.number(),
            requests: guard.next_request(),
            remote,
            local,
            ..Self::default()
        }
    }
}

/// Request body as read by the server.
#[derive(Debug, Clone, Default)]
pub struct RequestBody {
    /// In-memory buffers, in order.
    pub bufs: Vec<Bytes>,
    /// Spool file when the body did not fit in memory.
    pub temp_file: Option<PathBuf>,
}

/// One HTTP request.
#[derive(Debug)]
pub struct Request {
    pub method: Bytes,
    /// Request target as received (`$request_uri`).
    pub unparsed_uri: Bytes,
    /// Normalized path (`$uri`).
    pub uri: Bytes,
    /// Query string without `?`.
    pub args: Option<Bytes>,
    /// Protocol token from the request line; `None` for HTTP/0.9.
    pub http_protocol: Option<Bytes>,
    pub version: Version,
    /// Full request line (`$request`).
    pub request_line: Bytes,
    pub headers_in: HeadersIn,
    pub headers_out: HeadersOut,
    pub connection: ConnectionInfo,
    pub server: Arc<ServerInfo>,
    pub start: DateTime<Utc>,
    pub body: Option<RequestBody>,
    /// Bytes read from the client (line, headers, body).
    pub request_length: u64,
    /// Size of the response header block.
    pub header_size: u64,
    pub pipeline: bool,
    pub keepalive: bool,
    pub chunked: bool,
    pub request_complete: bool,
    /// Status set by an error page; wins over `headers_out.status`.
    pub err_status: u16,
    /// Response rate limit in bytes per second; 0 is unlimited.
    pub limit_rate: u64,
    /// Cleared when `unparsed_uri` no longer reflects `uri` + `args`.
    pub valid_unparsed_uri: bool,
    pub pool: Arena,
    pub variables: VariableState,
}

impl Request {
    pub fn new(server: Arc<ServerInfo>, pool: Arena) -> Self {
        Self {
            method: Bytes::new(),
            unparsed_uri: Bytes::new(),
            uri: Bytes::new(),
            args: None,
            http_protocol: None,
            version: Version::HTTP_11,
            request_line: Bytes::new(),
            headers_in: HeadersIn::default(),
            headers_out: HeadersOut::default(),
            connection: ConnectionInfo::default(),
            server,
            start: Utc::now(),
            body: None,
            request_length: 0,
            header_size: 0,
            pipeline: false,
            keepalive: false,
            chunked: false,
            request_complete: false,
            err_status: 0,
            limit_rate: 0,
            valid_unparsed_uri: true,
            pool,
            variables: VariableState::default(),
        }
    }

    /// Add a request header.
    pub fn add_header(&mut self, name: impl Into<Bytes>, value: impl Into<Bytes>) -> &mut Self {
        self.headers_in.headers.push(name, value);
        self
    }

    /// Add a response header.
    pub fn add_response_header(
        &mut self,
        name: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> &mut Self {
        self.headers_out.headers.push(name, value);
        self
    }

    /// Replace the query string; the raw target no longer matches.
    pub fn set_args(&mut self, args: Bytes) {
        self.args = Some(args);
        self.valid_unparsed_uri = false;
    }

    /// Status reported by `$status`.
    pub fn status(&self) -> u16 {
        if self.err_status != 0 {
            self.err_status
        } else if self.headers_out.status != 0 {
            self.headers_out.status
        } else if self.version == Version::HTTP_09 {
            9
        } else {
            0
        }
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new(Arc::new(ServerInfo::default()), Arena::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_precedence() {
        let mut r = Request::default();
        assert_eq!(r.status(), 0);

        r.headers_out.status = 200;
        assert_eq!(r.status(), 200);

        r.err_status = 404;
        assert_eq!(r.status(), 404);

        let mut r = Request::default();
        r.version = Version::HTTP_09;
        assert_eq!(r.status(), 9);
    }

    #[test]
    fn test_set_args_invalidates_unparsed_uri() {
        let mut r = Request::default();
        r.set_args(Bytes::from_static(b"a=1"));
        assert_eq!(r.args.as_deref(), Some(&b"a=1"[..]));
        assert!(!r.valid_unparsed_uri);
    }
}
