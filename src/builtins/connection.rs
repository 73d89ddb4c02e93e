//! Connection, address, clock and process getters.

use std::net::{IpAddr, SocketAddr};

use chrono::{Local, Utc};

use crate::builtins::request::number;
use crate::builtins::Builtin;
use crate::variables::{Evaluation, EvaluationError, VariableValue};

fn ip_text(
    eval: &mut Evaluation<'_>,
    addr: Option<SocketAddr>,
) -> Result<VariableValue, EvaluationError> {
    match addr {
        Some(addr) => number(eval, addr.ip()),
        None => Ok(VariableValue::not_found()),
    }
}

fn port_text(
    eval: &mut Evaluation<'_>,
    addr: Option<SocketAddr>,
) -> Result<VariableValue, EvaluationError> {
    match addr {
        Some(addr) if addr.port() > 0 => number(eval, addr.port()),
        Some(_) => Ok(VariableValue::empty()),
        None => Ok(VariableValue::not_found()),
    }
}

pub(crate) fn remote_addr(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let addr = eval.request().connection.remote;
    ip_text(eval, addr)
}

pub(crate) fn remote_port(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let addr = eval.request().connection.remote;
    port_text(eval, addr)
}

pub(crate) fn server_addr(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let addr = eval.request().connection.local;
    ip_text(eval, addr)
}

pub(crate) fn server_port(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let addr = eval.request().connection.local;
    port_text(eval, addr)
}

/// Without a PROXY protocol header these read as empty, not as absent.
pub(crate) fn proxy_protocol_addr(
    eval: &mut Evaluation<'_>,
) -> Result<VariableValue, EvaluationError> {
    let addr = eval.request().connection.proxy_protocol;
    match addr {
        Some(addr) => number(eval, addr.ip()),
        None => Ok(VariableValue::empty()),
    }
}

pub(crate) fn proxy_protocol_port(
    eval: &mut Evaluation<'_>,
) -> Result<VariableValue, EvaluationError> {
    let addr = eval.request().connection.proxy_protocol;
    match addr {
        Some(addr) if addr.port() > 0 => number(eval, addr.port()),
        _ => Ok(VariableValue::empty()),
    }
}

/// 4 bytes for IPv4, 16 for IPv6.
pub(crate) fn binary_remote_addr(
    eval: &mut Evaluation<'_>,
) -> Result<VariableValue, EvaluationError> {
    let Some(addr) = eval.request().connection.remote else {
        return Ok(VariableValue::not_found());
    };
    let raw = match addr.ip() {
        IpAddr::V4(v4) => eval.arena().copy(&v4.octets())?,
        IpAddr::V6(v6) => eval.arena().copy(&v6.octets())?,
    };
    Ok(VariableValue::valid(raw))
}

pub(crate) fn tcpinfo(
    eval: &mut Evaluation<'_>,
    which: Builtin,
) -> Result<VariableValue, EvaluationError> {
    // Unavailable socket statistics read as zeros.
    let info = eval.request().connection.tcp_info.unwrap_or_default();
    let value = match which {
        Builtin::TcpinfoRtt => info.rtt,
        Builtin::TcpinfoRttvar => info.rttvar,
        Builtin::TcpinfoSndCwnd => info.snd_cwnd,
        _ => info.rcv_space,
    };
    number(eval, value)
}

pub(crate) fn connections(
    eval: &mut Evaluation<'_>,
    which: Builtin,
) -> Result<VariableValue, EvaluationError> {
    let stats = eval.request().server.stats.snapshot();
    let value = match which {
        Builtin::ConnectionsActive => stats.active,
        Builtin::ConnectionsReading => stats.reading,
        Builtin::ConnectionsWriting => stats.writing,
        _ => stats.waiting,
    };
    number(eval, value)
}

/// Seconds with millisecond resolution, `1700000000.123`.
pub(crate) fn msec(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let ms = Utc::now().timestamp_millis();
    let text = eval
        .arena()
        .format(format_args!("{}.{:03}", ms / 1000, ms % 1000))?;
    Ok(VariableValue::valid(text))
}

pub(crate) fn request_time(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let elapsed = (Utc::now() - eval.request().start).num_milliseconds().max(0);
    let text = eval
        .arena()
        .format(format_args!("{}.{:03}", elapsed / 1000, elapsed % 1000))?;
    Ok(VariableValue::valid(text))
}

pub(crate) fn time_iso8601(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let now = Local::now();
    let text = eval
        .arena()
        .format(format_args!("{}", now.format("%Y-%m-%dT%H:%M:%S%:z")))?;
    Ok(VariableValue::valid(text))
}

pub(crate) fn time_local(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let now = Local::now();
    let text = eval
        .arena()
        .format(format_args!("{}", now.format("%d/%b/%Y:%H:%M:%S %z")))?;
    Ok(VariableValue::valid(text))
}

pub(crate) fn pid(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    number(eval, std::process::id())
}
