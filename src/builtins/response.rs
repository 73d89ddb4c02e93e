//! Response-side getters (`$status`, `$sent_http_*`, byte counters).

use chrono::DateTime;

use crate::builtins::headers;
use crate::builtins::request::number;
use crate::variables::{Evaluation, EvaluationError, VariableValue};

pub(crate) fn status(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let status = eval.request().status();
    let text = eval.arena().format(format_args!("{:03}", status))?;
    Ok(VariableValue::valid(text))
}

pub(crate) fn content_type(eval: &Evaluation<'_>) -> VariableValue {
    match &eval.request().headers_out.content_type {
        Some(ct) => VariableValue::valid(ct.clone()),
        None => VariableValue::not_found(),
    }
}

pub(crate) fn content_length(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let out = &eval.request().headers_out;
    if let Some(h) = out.first("content-length") {
        return Ok(VariableValue::valid(h.value.clone()));
    }
    let length = out.content_length_n;
    match length {
        Some(n) => number(eval, n),
        None => Ok(VariableValue::not_found()),
    }
}

pub(crate) fn last_modified(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let out = &eval.request().headers_out;
    if let Some(h) = out.first("last-modified") {
        return Ok(VariableValue::valid(h.value.clone()));
    }
    let Some(time) = out.last_modified_time.and_then(|t| DateTime::from_timestamp(t, 0)) else {
        return Ok(VariableValue::not_found());
    };
    let text = eval
        .arena()
        .format(format_args!("{}", time.format("%a, %d %b %Y %H:%M:%S GMT")))?;
    Ok(VariableValue::valid(text))
}

pub(crate) fn connection(eval: &Evaluation<'_>) -> VariableValue {
    let r = eval.request();
    if r.headers_out.status == 101 {
        VariableValue::from_static(b"upgrade")
    } else if r.keepalive {
        VariableValue::from_static(b"keep-alive")
    } else {
        VariableValue::from_static(b"close")
    }
}

pub(crate) fn keep_alive(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let r = eval.request();
    let timeout = r.server.keepalive_header;
    if !r.keepalive || timeout == 0 {
        return Ok(VariableValue::not_found());
    }
    let text = eval.arena().format(format_args!("timeout={}", timeout))?;
    Ok(VariableValue::valid(text))
}

pub(crate) fn transfer_encoding(eval: &Evaluation<'_>) -> VariableValue {
    if eval.request().chunked {
        VariableValue::from_static(b"chunked")
    } else {
        VariableValue::not_found()
    }
}

pub(crate) fn location(eval: &Evaluation<'_>) -> VariableValue {
    headers::unknown(&eval.request().headers_out.headers, "location")
}

pub(crate) fn body_bytes_sent(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let r = eval.request();
    let sent = r.connection.sent.saturating_sub(r.header_size);
    number(eval, sent)
}
