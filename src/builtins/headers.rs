//! Header-backed getters and the prefix families.

use bytes::Bytes;

use crate::http::headers::HeaderList;
use crate::http::parse;
use crate::variables::{Evaluation, EvaluationError, VariableValue};

/// Separator for `Cookie`-style multi headers.
pub const COOKIE_SEPARATOR: &[u8] = b"; ";
/// Separator for every other multi header.
pub const LIST_SEPARATOR: &[u8] = b", ";

/// First value of `name`.
pub(crate) fn single(list: &HeaderList, name: &str) -> VariableValue {
    match list.first(name) {
        Some(h) => VariableValue::valid(h.value.clone()),
        None => VariableValue::not_found(),
    }
}

/// Every value of `name` in arrival order, joined with `sep`.
///
/// No entries is not-found; one entry is returned verbatim.
pub(crate) fn multi(
    eval: &mut Evaluation<'_>,
    values: Vec<Bytes>,
    sep: &[u8],
) -> Result<VariableValue, EvaluationError> {
    match values.as_slice() {
        [] => Ok(VariableValue::not_found()),
        [one] => Ok(VariableValue::valid(one.clone())),
        many => {
            let joined = eval.arena().join(many.iter().map(|v| &v[..]), sep)?;
            Ok(VariableValue::valid(joined))
        }
    }
}

pub(crate) fn collect(list: &HeaderList, name: &str) -> Vec<Bytes> {
    list.all(name).map(|h| h.value.clone()).collect()
}

/// First header whose name matches `var` case-insensitively, with `-` read as `_`.
pub(crate) fn unknown(list: &HeaderList, var: &str) -> VariableValue {
    let var = var.as_bytes();
    let found = list.iter().find(|h| {
        h.lowcase_key.len() == var.len()
            && h.lowcase_key
                .iter()
                .zip(var)
                .all(|(&k, &v)| {
                    if k == b'-' {
                        v == b'_'
                    } else {
                        k == v.to_ascii_lowercase()
                    }
                })
    });

    match found {
        Some(h) => VariableValue::valid(h.value.clone()),
        None => VariableValue::not_found(),
    }
}

/// `$cookie_<name>`.
pub(crate) fn cookie(eval: &Evaluation<'_>, name: &str) -> VariableValue {
    let name = name.as_bytes();
    for header in eval.request().headers_in.all("cookie") {
        if let Some(range) = parse::find_cookie(&header.value, name) {
            return VariableValue::valid(header.value.slice(range));
        }
    }
    VariableValue::not_found()
}

/// `$arg_<name>`.
pub(crate) fn arg(eval: &Evaluation<'_>, name: &str) -> VariableValue {
    let Some(args) = eval.request().args.as_ref() else {
        return VariableValue::not_found();
    };
    match parse::find_arg(args, name.as_bytes()) {
        Some(range) => VariableValue::valid(args.slice(range)),
        None => VariableValue::not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_maps_dash_to_underscore() {
        let mut list = HeaderList::new();
        list.push("X-Real-IP", "10.1.1.1");
        list.push("X_Other", "v");

        assert_eq!(unknown(&list, "x_real_ip").as_bytes(), b"10.1.1.1");
        assert_eq!(unknown(&list, "X_Real_IP").as_bytes(), b"10.1.1.1");
        assert!(unknown(&list, "x_real").is_not_found());
        // an underscore in the header name still matches
        assert_eq!(unknown(&list, "x_other").as_bytes(), b"v");
    }

    #[test]
    fn test_single_takes_first() {
        let mut list = HeaderList::new();
        list.push("Host", "a");
        list.push("Host", "b");
        assert_eq!(single(&list, "host").as_bytes(), b"a");
        assert!(single(&list, "via").is_not_found());
    }
}
