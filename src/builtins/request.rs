//! Request line, body and server-context getters.

use bytes::Bytes;

use crate::http::parse;
use crate::variables::{Evaluation, EvaluationError, VariableValue};

/// A request field that may be empty; empty reads as not-found.
pub(crate) fn non_empty(value: &Bytes) -> VariableValue {
    if value.is_empty() {
        VariableValue::not_found()
    } else {
        VariableValue::valid(value.clone())
    }
}

pub(crate) fn optional(value: Option<&Bytes>) -> VariableValue {
    match value {
        Some(v) => VariableValue::valid(v.clone()),
        None => VariableValue::not_found(),
    }
}

/// Host from the request, falling back to the server name.
pub(crate) fn host(eval: &Evaluation<'_>) -> VariableValue {
    let r = eval.request();
    match &r.headers_in.server {
        Some(server) if !server.is_empty() => VariableValue::valid(server.clone()),
        _ => VariableValue::valid(r.server.server_name.clone()),
    }
}

pub(crate) fn is_args(eval: &Evaluation<'_>) -> VariableValue {
    match &eval.request().args {
        Some(args) if !args.is_empty() => VariableValue::from_static(b"?"),
        _ => VariableValue::empty(),
    }
}

pub(crate) fn document_root(eval: &Evaluation<'_>) -> VariableValue {
    let root = eval.request().server.root.to_string_lossy().into_owned();
    VariableValue::valid(root)
}

pub(crate) fn realpath_root(eval: &Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let root = &eval.request().server.root;
    match std::fs::canonicalize(root) {
        Ok(path) => Ok(VariableValue::valid(path.to_string_lossy().into_owned())),
        Err(e) => {
            tracing::error!(root = %root.display(), error = %e, "realpath() failed");
            Err(EvaluationError::Getter(format!(
                "realpath() \"{}\" failed: {}",
                root.display(),
                e
            )))
        }
    }
}

pub(crate) fn request_filename(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let r = eval.request();
    let root = Bytes::from(r.server.root.to_string_lossy().into_owned());
    let uri = r.uri.clone();
    let path = eval.arena().join([&root[..], &uri[..]], b"")?;
    Ok(VariableValue::valid(path))
}

pub(crate) fn remote_user(eval: &Evaluation<'_>) -> VariableValue {
    eval.request()
        .headers_in
        .first("authorization")
        .and_then(|h| parse::basic_auth_user(&h.value))
        .map_or_else(VariableValue::not_found, VariableValue::valid)
}

pub(crate) fn content_length(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let r = eval.request();
    if let Some(h) = r.headers_in.first("content-length") {
        return Ok(VariableValue::valid(h.value.clone()));
    }
    let length = r.headers_in.content_length_n;
    match length {
        Some(n) => number(eval, n),
        None => Ok(VariableValue::not_found()),
    }
}

pub(crate) fn request_body(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let bufs = match &eval.request().body {
        Some(body) if body.temp_file.is_none() && !body.bufs.is_empty() => body.bufs.clone(),
        _ => return Ok(VariableValue::not_found()),
    };
    if let [one] = bufs.as_slice() {
        return Ok(VariableValue::valid(one.clone()));
    }
    let joined = eval.arena().join(bufs.iter().map(|b| &b[..]), b"")?;
    Ok(VariableValue::valid(joined))
}

pub(crate) fn request_body_file(eval: &Evaluation<'_>) -> VariableValue {
    match eval.request().body.as_ref().and_then(|b| b.temp_file.as_ref()) {
        Some(path) => VariableValue::valid(path.to_string_lossy().into_owned()),
        None => VariableValue::not_found(),
    }
}

pub(crate) fn request_id(eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
    let id = uuid::Uuid::new_v4();
    let text = eval.arena().format(format_args!("{}", id.simple()))?;
    Ok(VariableValue::valid(text))
}

/// Decimal rendering into the arena.
pub(crate) fn number(
    eval: &mut Evaluation<'_>,
    n: impl std::fmt::Display,
) -> Result<VariableValue, EvaluationError> {
    Ok(VariableValue::valid(eval.arena().format(format_args!("{}", n))?))
}
