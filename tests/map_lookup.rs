//! Configuration-driven map variables.

mod common;

const CONFIG: &str = r#"
[server]
server_name = "default.test"

[[maps]]
variable = "$site"
source = "$http_host"
default = "fallback"
hostnames = true

[[maps.entries]]
key = "www.example.com"
value = "exact"

[[maps.entries]]
key = "*.example.com"
value = "wildcard"

[[maps.entries]]
key = "~^(?<tenant>[a-z]+)\\.tenants\\.net$"
value = "tenant-$tenant"

[[maps.entries]]
key = "~*^STATIC\\."
value = "$server_name"

[[maps]]
variable = "flag"
source = "$arg_debug"

[[maps.entries]]
key = "1"
value = "on"
"#;

fn site(host: &str) -> String {
    let engine = common::engine_from_toml(CONFIG);
    let mut request = common::request(&engine, "/", &[("host", host)]);
    let mut eval = engine.variables().evaluate(&mut request);
    common::text(&eval.get_by_name("site").unwrap())
}

#[test]
fn test_exact_key_is_case_insensitive() {
    assert_eq!(site("WWW.Example.com"), "exact");
    // a trailing dot is ignored for hostname maps
    assert_eq!(site("www.example.com."), "exact");
}

#[test]
fn test_wildcard_key() {
    assert_eq!(site("api.example.com"), "wildcard");
    assert_eq!(site("a.b.example.com"), "wildcard");
}

#[test]
fn test_regex_key_binds_captures() {
    assert_eq!(site("acme.tenants.net"), "tenant-acme");
    assert_eq!(site("static.cdn.org"), "default.test");
}

#[test]
fn test_default_on_miss() {
    assert_eq!(site("unknown.org"), "fallback");
}

#[test]
fn test_miss_without_default_is_empty() {
    let engine = common::engine_from_toml(CONFIG);

    let mut request = common::request(&engine, "/?debug=1", &[]);
    let mut eval = engine.variables().evaluate(&mut request);
    assert_eq!(common::text(&eval.get_by_name("flag").unwrap()), "on");

    let mut request = common::request(&engine, "/?debug=0", &[]);
    let mut eval = engine.variables().evaluate(&mut request);
    let value = eval.get_by_name("flag").unwrap();
    assert!(value.is_valid());
    assert!(value.is_empty());
}

#[test]
fn test_volatile_map_over_capture_name_recomputes() {
    // `tag` is first registered as a capture group, then redefined as a volatile map
    let engine = common::engine_from_toml(
        r#"
[[maps]]
variable = "section"
source = "$uri"

[[maps.entries]]
key = "~^/(?<tag>[a-z]+)$"
value = "$tag"

[[maps]]
variable = "tag"
source = "$arg_v"
volatile = true

[[maps.entries]]
key = "a"
value = "alpha"

[[maps.entries]]
key = "b"
value = "beta"
"#,
    );

    let mut request = common::request(&engine, "/x?v=a", &[]);
    let mut eval = engine.variables().evaluate(&mut request);
    let first = eval.get_by_name("tag").unwrap();
    assert_eq!(common::text(&first), "alpha");
    assert!(first.is_no_cacheable());

    eval.request_mut().set_args(bytes::Bytes::from_static(b"v=b"));
    assert_eq!(common::text(&eval.get_by_name("tag").unwrap()), "beta");
}
