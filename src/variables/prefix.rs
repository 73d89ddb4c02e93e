//! Longest-prefix selection shared by finalize and by-name lookup.

/// Anything that can be matched by name prefix.
pub(crate) trait Prefixed {
    fn prefix(&self) -> &str;
}

/// Pick the longest registered prefix that is a proper prefix of `name`.
///
/// `name` must already be lowercase. On equal lengths the later entry wins.
pub(crate) fn longest_match<'a, P: Prefixed>(prefixes: &'a [P], name: &str) -> Option<&'a P> {
    let mut best: Option<&P> = None;

    for candidate in prefixes {
        let p = candidate.prefix();
        if name.len() <= p.len() || !name.starts_with(p) {
            continue;
        }
        match best {
            Some(b) if b.prefix().len() > p.len() => {}
            _ => best = Some(candidate),
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    struct P(&'static str, u8);

    impl Prefixed for P {
        fn prefix(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_longest_prefix_wins() {
        let table = [P("http_", 0), P("http_x_", 1)];
        let hit = longest_match(&table, "http_x_forwarded_for").unwrap();
        assert_eq!(hit.1, 1);

        let hit = longest_match(&table, "http_host").unwrap();
        assert_eq!(hit.1, 0);
    }

    #[test]
    fn test_proper_prefix_required() {
        let table = [P("arg_", 0)];
        assert!(longest_match(&table, "arg_").is_none());
        assert!(longest_match(&table, "args").is_none());
        assert!(longest_match(&table, "arg_a").is_some());
    }

    #[test]
    fn test_tie_prefers_later_registration() {
        let table = [P("cookie_", 0), P("cookie_", 1)];
        assert_eq!(longest_match(&table, "cookie_sid").unwrap().1, 1);
    }
}
