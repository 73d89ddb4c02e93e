//! Small parsers over raw request bytes.
//!
//! Every function returns sub-slices of its input as byte ranges so callers
//! can hand out zero-copy `Bytes::slice` views.

use std::ops::Range;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

/// Find the value of query argument `name` (case-insensitive) in `args`.
///
/// Only `name=value` forms that start the string or follow `&` match; the
/// value is returned undecoded.
pub fn find_arg(args: &[u8], name: &[u8]) -> Option<Range<usize>> {
    if name.is_empty() || args.len() <= name.len() {
        return None;
    }

    let mut pos = 0;
    while pos + name.len() < args.len() {
        let at_boundary = pos == 0 || args[pos - 1] == b'&';
        if at_boundary
            && args[pos..pos + name.len()].eq_ignore_ascii_case(name)
            && args[pos + name.len()] == b'='
        {
            let start = pos + name.len() + 1;
            let end = args[start..]
                .iter()
                .position(|&c| c == b'&')
                .map_or(args.len(), |n| start + n);
            return Some(start..end);
        }
        pos += 1;
    }

    None
}

/// Find cookie `name` inside one `Cookie` header value.
///
/// Entries are separated by `;` or `,`; spaces around `=` are skipped.
pub fn find_cookie(value: &[u8], name: &[u8]) -> Option<Range<usize>> {
    let end = value.len();
    let mut start = 0;

    while start < end {
        if value.len() - start >= name.len()
            && value[start..start + name.len()].eq_ignore_ascii_case(name)
        {
            let mut p = start + name.len();
            while p < end && value[p] == b' ' {
                p += 1;
            }
            if p < end && value[p] == b'=' {
                p += 1;
                while p < end && value[p] == b' ' {
                    p += 1;
                }
                let from = p;
                while p < end && value[p] != b';' && value[p] != b',' {
                    p += 1;
                }
                return Some(from..p);
            }
        }

        // skip to the next entry
        while start < end {
            let c = value[start];
            start += 1;
            if c == b';' || c == b',' {
                break;
            }
        }
        while start < end && value[start] == b' ' {
            start += 1;
        }
    }

    None
}

/// User name from an `Authorization: Basic ...` header value.
pub fn basic_auth_user(authorization: &[u8]) -> Option<Bytes> {
    const SCHEME: &[u8] = b"basic ";

    if authorization.len() < SCHEME.len()
        || !authorization[..SCHEME.len()].eq_ignore_ascii_case(SCHEME)
    {
        return None;
    }

    let encoded = authorization[SCHEME.len()..]
        .iter()
        .position(|&c| c != b' ')
        .map(|n| &authorization[SCHEME.len() + n..])?;

    let decoded = STANDARD.decode(encoded).ok()?;
    let colon = decoded.iter().position(|&c| c == b':')?;
    if colon == 0 {
        return None;
    }

    let mut decoded = decoded;
    decoded.truncate(colon);
    Some(Bytes::from(decoded))
}

/// Parse a size with an optional `k`/`m` suffix (`512`, `10k`, `1M`).
pub fn parse_size(value: &[u8]) -> Option<u64> {
    let (digits, scale) = match value.last()? {
        b'k' | b'K' => (&value[..value.len() - 1], 1024),
        b'm' | b'M' => (&value[..value.len() - 1], 1024 * 1024),
        _ => (value, 1),
    };

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    std::str::from_utf8(digits)
        .ok()?
        .parse::<u64>()
        .ok()?
        .checked_mul(scale)
}
