//! Core variable table.
//!
//! # Responsibilities
//! - Name every built-in variable and prefix family
//! - Register them with their flags and setters
//! - Give each one a typed accessor over `Request`
//!
//! # Design Decisions
//! - One enum variant per variable; dispatch is a single `match`
//! - Volatile values (clock, live stats, rewritable URI parts) are NOCACHEABLE
//! - Multi-value headers join with `"; "` for cookies and `", "` otherwise

mod connection;
pub mod headers;
mod request;
mod response;

use bytes::Bytes;

use crate::http::parse;
use crate::variables::{
    ConfigError, Evaluation, EvaluationError, Getter, Setter, VariableFlags, VariableValue,
    VariablesBuilder,
};

pub use headers::{COOKIE_SEPARATOR, LIST_SEPARATOR};

/// A built-in variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    HttpHost,
    HttpUserAgent,
    HttpReferer,
    HttpVia,
    HttpXForwardedFor,
    HttpCookie,
    ContentLength,
    ContentType,
    Host,
    BinaryRemoteAddr,
    RemoteAddr,
    RemotePort,
    ProxyProtocolAddr,
    ProxyProtocolPort,
    ServerAddr,
    ServerPort,
    ServerProtocol,
    Scheme,
    Https,
    RequestUri,
    Uri,
    DocumentUri,
    Request,
    DocumentRoot,
    RealpathRoot,
    QueryString,
    Args,
    IsArgs,
    RequestFilename,
    ServerName,
    RequestMethod,
    RemoteUser,
    BytesSent,
    BodyBytesSent,
    Pipe,
    RequestCompletion,
    RequestBody,
    RequestBodyFile,
    RequestLength,
    RequestTime,
    RequestId,
    Status,
    SentHttpContentType,
    SentHttpContentLength,
    SentHttpLocation,
    SentHttpLastModified,
    SentHttpConnection,
    SentHttpKeepAlive,
    SentHttpTransferEncoding,
    SentHttpCacheControl,
    LimitRate,
    Connection,
    ConnectionRequests,
    ServerVersion,
    Hostname,
    Pid,
    Msec,
    TimeIso8601,
    TimeLocal,
    TcpinfoRtt,
    TcpinfoRttvar,
    TcpinfoSndCwnd,
    TcpinfoRcvSpace,
    ConnectionsActive,
    ConnectionsReading,
    ConnectionsWriting,
    ConnectionsWaiting,
}

/// A built-in prefix family; the getter receives the full variable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixFamily {
    /// `http_<header>`
    HeaderIn,
    /// `sent_http_<header>`
    HeaderOut,
    /// `cookie_<name>`
    Cookie,
    /// `arg_<name>`
    Arg,
}

impl PrefixFamily {
    pub fn prefix(self) -> &'static str {
        match self {
            PrefixFamily::HeaderIn => "http_",
            PrefixFamily::HeaderOut => "sent_http_",
            PrefixFamily::Cookie => "cookie_",
            PrefixFamily::Arg => "arg_",
        }
    }
}

const NONE: VariableFlags = VariableFlags::empty();
const VOLATILE: VariableFlags = VariableFlags::NOCACHEABLE;
const SETTABLE: VariableFlags = VariableFlags::CHANGEABLE.union(VariableFlags::NOCACHEABLE);

/// Name, variant and flags of every core variable.
pub const CORE_VARIABLES: &[(&str, Builtin, VariableFlags)] = &[
    ("http_host", Builtin::HttpHost, NONE),
    ("http_user_agent", Builtin::HttpUserAgent, NONE),
    ("http_referer", Builtin::HttpReferer, NONE),
    ("http_via", Builtin::HttpVia, NONE),
    ("http_x_forwarded_for", Builtin::HttpXForwardedFor, NONE),
    ("http_cookie", Builtin::HttpCookie, NONE),
    ("content_length", Builtin::ContentLength, NONE),
    ("content_type", Builtin::ContentType, NONE),
    ("host", Builtin::Host, NONE),
    ("binary_remote_addr", Builtin::BinaryRemoteAddr, NONE),
    ("remote_addr", Builtin::RemoteAddr, NONE),
    ("remote_port", Builtin::RemotePort, NONE),
    ("proxy_protocol_addr", Builtin::ProxyProtocolAddr, NONE),
    ("proxy_protocol_port", Builtin::ProxyProtocolPort, NONE),
    ("server_addr", Builtin::ServerAddr, NONE),
    ("server_port", Builtin::ServerPort, NONE),
    ("server_protocol", Builtin::ServerProtocol, NONE),
    ("scheme", Builtin::Scheme, NONE),
    ("https", Builtin::Https, NONE),
    ("request_uri", Builtin::RequestUri, NONE),
    ("uri", Builtin::Uri, VOLATILE),
    ("document_uri", Builtin::DocumentUri, VOLATILE),
    ("request", Builtin::Request, NONE),
    ("document_root", Builtin::DocumentRoot, VOLATILE),
    ("realpath_root", Builtin::RealpathRoot, VOLATILE),
    ("query_string", Builtin::QueryString, VOLATILE),
    ("args", Builtin::Args, SETTABLE),
    ("is_args", Builtin::IsArgs, VOLATILE),
    ("request_filename", Builtin::RequestFilename, VOLATILE),
    ("server_name", Builtin::ServerName, NONE),
    ("request_method", Builtin::RequestMethod, VOLATILE),
    ("remote_user", Builtin::RemoteUser, NONE),
    ("bytes_sent", Builtin::BytesSent, NONE),
    ("body_bytes_sent", Builtin::BodyBytesSent, NONE),
    ("pipe", Builtin::Pipe, NONE),
    ("request_completion", Builtin::RequestCompletion, NONE),
    ("request_body", Builtin::RequestBody, NONE),
    ("request_body_file", Builtin::RequestBodyFile, NONE),
    ("request_length", Builtin::RequestLength, VOLATILE),
    ("request_time", Builtin::RequestTime, VOLATILE),
    ("request_id", Builtin::RequestId, NONE),
    ("status", Builtin::Status, VOLATILE),
    ("sent_http_content_type", Builtin::SentHttpContentType, NONE),
    ("sent_http_content_length", Builtin::SentHttpContentLength, NONE),
    ("sent_http_location", Builtin::SentHttpLocation, NONE),
    ("sent_http_last_modified", Builtin::SentHttpLastModified, NONE),
    ("sent_http_connection", Builtin::SentHttpConnection, NONE),
    ("sent_http_keep_alive", Builtin::SentHttpKeepAlive, NONE),
    ("sent_http_transfer_encoding", Builtin::SentHttpTransferEncoding, NONE),
    ("sent_http_cache_control", Builtin::SentHttpCacheControl, NONE),
    ("limit_rate", Builtin::LimitRate, SETTABLE),
    ("connection", Builtin::Connection, NONE),
    ("connection_requests", Builtin::ConnectionRequests, NONE),
    ("server_version", Builtin::ServerVersion, NONE),
    ("hostname", Builtin::Hostname, NONE),
    ("pid", Builtin::Pid, NONE),
    ("msec", Builtin::Msec, VOLATILE),
    ("time_iso8601", Builtin::TimeIso8601, VOLATILE),
    ("time_local", Builtin::TimeLocal, VOLATILE),
    ("tcpinfo_rtt", Builtin::TcpinfoRtt, VOLATILE),
    ("tcpinfo_rttvar", Builtin::TcpinfoRttvar, VOLATILE),
    ("tcpinfo_snd_cwnd", Builtin::TcpinfoSndCwnd, VOLATILE),
    ("tcpinfo_rcv_space", Builtin::TcpinfoRcvSpace, VOLATILE),
    ("connections_active", Builtin::ConnectionsActive, VOLATILE),
    ("connections_reading", Builtin::ConnectionsReading, VOLATILE),
    ("connections_writing", Builtin::ConnectionsWriting, VOLATILE),
    ("connections_waiting", Builtin::ConnectionsWaiting, VOLATILE),
];

/// Prefix families with their flags.
pub const CORE_PREFIXES: &[(PrefixFamily, VariableFlags)] = &[
    (PrefixFamily::HeaderIn, NONE),
    (PrefixFamily::HeaderOut, NONE),
    (PrefixFamily::Cookie, NONE),
    (PrefixFamily::Arg, VOLATILE),
];

fn setter_for(builtin: Builtin) -> Option<Setter> {
    match builtin {
        Builtin::Args => Some(Setter::Args),
        Builtin::LimitRate => Some(Setter::LimitRate),
        _ => None,
    }
}

/// Register the core variables and prefix families.
pub fn add_core_variables(builder: &mut VariablesBuilder) -> Result<(), ConfigError> {
    for &(name, builtin, flags) in CORE_VARIABLES {
        let descriptor = builder.register(name, flags)?;
        descriptor.set_getter(Getter::Builtin(builtin));
        if let Some(setter) = setter_for(builtin) {
            descriptor.set_setter(setter);
        }
    }

    for &(family, flags) in CORE_PREFIXES {
        builder
            .register_prefix(family.prefix(), flags)?
            .set_getter(Getter::Prefix(family));
    }

    tracing::debug!(
        variables = CORE_VARIABLES.len(),
        prefixes = CORE_PREFIXES.len(),
        "core variables registered"
    );
    Ok(())
}

/// Resolve a built-in variable.
pub(crate) fn get(builtin: Builtin, eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    use Builtin as B;

    let r = eval.request();
    let value = match builtin {
        B::HttpHost => headers::single(&r.headers_in.headers, "host"),
        B::HttpUserAgent => headers::single(&r.headers_in.headers, "user-agent"),
        B::HttpReferer => headers::single(&r.headers_in.headers, "referer"),
        B::HttpVia => headers::single(&r.headers_in.headers, "via"),
        B::HttpXForwardedFor => {
            let values = headers::collect(&r.headers_in.headers, "x-forwarded-for");
            return headers::multi(eval, values, LIST_SEPARATOR);
        }
        B::HttpCookie => {
            let values = headers::collect(&r.headers_in.headers, "cookie");
            return headers::multi(eval, values, COOKIE_SEPARATOR);
        }
        B::ContentLength => return request::content_length(eval),
        B::ContentType => headers::single(&r.headers_in.headers, "content-type"),
        B::Host => request::host(eval),
        B::BinaryRemoteAddr => return connection::binary_remote_addr(eval),
        B::RemoteAddr => return connection::remote_addr(eval),
        B::RemotePort => return connection::remote_port(eval),
        B::ProxyProtocolAddr => return connection::proxy_protocol_addr(eval),
        B::ProxyProtocolPort => return connection::proxy_protocol_port(eval),
        B::ServerAddr => return connection::server_addr(eval),
        B::ServerPort => return connection::server_port(eval),
        B::ServerProtocol => request::optional(r.http_protocol.as_ref()),
        B::Scheme => VariableValue::from_static(if r.connection.tls { b"https" } else { b"http" }),
        B::Https => {
            if r.connection.tls {
                VariableValue::from_static(b"on")
            } else {
                VariableValue::empty()
            }
        }
        B::RequestUri => request::non_empty(&r.unparsed_uri),
        B::Uri | B::DocumentUri => request::non_empty(&r.uri),
        B::Request => request::non_empty(&r.request_line),
        B::DocumentRoot => request::document_root(eval),
        B::RealpathRoot => return request::realpath_root(eval),
        B::QueryString | B::Args => request::optional(r.args.as_ref()),
        B::IsArgs => request::is_args(eval),
        B::RequestFilename => return request::request_filename(eval),
        B::ServerName => VariableValue::valid(r.server.server_name.clone()),
        B::RequestMethod => request::non_empty(&r.method),
        B::RemoteUser => request::remote_user(eval),
        B::BytesSent => {
            let sent = r.connection.sent;
            return request::number(eval, sent);
        }
        B::BodyBytesSent => return response::body_bytes_sent(eval),
        B::Pipe => VariableValue::from_static(if r.pipeline { b"p" } else { b"." }),
        B::RequestCompletion => {
            if r.request_complete {
                VariableValue::from_static(b"OK")
            } else {
                VariableValue::empty()
            }
        }
        B::RequestBody => return request::request_body(eval),
        B::RequestBodyFile => request::request_body_file(eval),
        B::RequestLength => {
            let length = r.request_length;
            return request::number(eval, length);
        }
        B::RequestTime => return connection::request_time(eval),
        B::RequestId => return request::request_id(eval),
        B::Status => return response::status(eval),
        B::SentHttpContentType => response::content_type(eval),
        B::SentHttpContentLength => return response::content_length(eval),
        B::SentHttpLocation => response::location(eval),
        B::SentHttpLastModified => return response::last_modified(eval),
        B::SentHttpConnection => response::connection(eval),
        B::SentHttpKeepAlive => return response::keep_alive(eval),
        B::SentHttpTransferEncoding => response::transfer_encoding(eval),
        B::SentHttpCacheControl => {
            let values = headers::collect(&r.headers_out.headers, "cache-control");
            return headers::multi(eval, values, LIST_SEPARATOR);
        }
        B::LimitRate => {
            let rate = r.limit_rate;
            return request::number(eval, rate);
        }
        B::Connection => {
            let number = r.connection.number;
            return request::number(eval, number);
        }
        B::ConnectionRequests => {
            let requests = r.connection.requests;
            return request::number(eval, requests);
        }
        B::ServerVersion => VariableValue::from_static(env!("CARGO_PKG_VERSION").as_bytes()),
        B::Hostname => VariableValue::valid(r.server.hostname.clone()),
        B::Pid => return connection::pid(eval),
        B::Msec => return connection::msec(eval),
        B::TimeIso8601 => return connection::time_iso8601(eval),
        B::TimeLocal => return connection::time_local(eval),
        B::TcpinfoRtt | B::TcpinfoRttvar | B::TcpinfoSndCwnd | B::TcpinfoRcvSpace => {
            return connection::tcpinfo(eval, builtin)
        }
        B::ConnectionsActive
        | B::ConnectionsReading
        | B::ConnectionsWriting
        | B::ConnectionsWaiting => return connection::connections(eval, builtin),
    };

    Ok(value)
}

/// Resolve a prefix-family variable; `name` is the full name in any case.
pub(crate) fn get_prefixed(
    family: PrefixFamily,
    eval: &mut Evaluation<'_>,
    name: &str,
) -> Result<VariableValue, EvaluationError> {
    let suffix = name.get(family.prefix().len()..).unwrap_or_default();
    let r = eval.request();

    Ok(match family {
        PrefixFamily::HeaderIn => headers::unknown(&r.headers_in.headers, suffix),
        PrefixFamily::HeaderOut => headers::unknown(&r.headers_out.headers, suffix),
        PrefixFamily::Cookie => headers::cookie(eval, suffix),
        PrefixFamily::Arg => headers::arg(eval, suffix),
    })
}

/// `set $args ...`
pub(crate) fn set_args(eval: &mut Evaluation<'_>, value: Bytes) {
    eval.request_mut().set_args(value);
}

/// `set $limit_rate ...`; an unparsable size is logged and ignored.
pub(crate) fn set_limit_rate(eval: &mut Evaluation<'_>, value: Bytes) {
    match parse::parse_size(&value) {
        Some(rate) => eval.request_mut().limit_rate = rate,
        None => {
            tracing::error!(
                value = %String::from_utf8_lossy(&value),
                "invalid $limit_rate value"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_table_registers_cleanly() {
        let mut builder = VariablesBuilder::default();
        add_core_variables(&mut builder).unwrap();

        let args = builder.lookup("args").unwrap();
        assert!(args.flags().contains(VariableFlags::CHANGEABLE));
        assert!(matches!(args.setter(), Some(Setter::Args)));
        assert!(builder
            .lookup("msec")
            .unwrap()
            .flags()
            .contains(VariableFlags::NOCACHEABLE));
        assert!(builder
            .lookup_prefix("arg_")
            .unwrap()
            .flags()
            .contains(VariableFlags::NOCACHEABLE));

        // non-changeable core names cannot be redefined
        assert!(matches!(
            builder.register("remote_addr", VariableFlags::empty()),
            Err(ConfigError::DuplicateVariable(_))
        ));
        assert!(builder.finalize().is_ok());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = CORE_VARIABLES.iter().map(|(n, _, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CORE_VARIABLES.len());
    }
}
