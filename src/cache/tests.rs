//! Render cache expiry and pass-through tests.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;

use super::{config_fingerprint, render_cache_key, RenderCache};
use crate::ConfigMap;

fn counting_render(counter: &AtomicUsize, value: &str) -> Result<String, Infallible> {
    counter.fetch_add(1, Ordering::SeqCst);
    Ok(value.to_string())
}

#[test]
fn second_read_within_ttl_skips_render() {
    let cache = RenderCache::new(Duration::from_millis(10));
    let renders = AtomicUsize::new(0);

    let first = cache.get_or_render("k", || counting_render(&renders, "v1"));
    let second = cache.get_or_render("k", || counting_render(&renders, "v2"));

    assert_eq!(first.expect("infallible"), "v1");
    assert_eq!(second.expect("infallible"), "v1", "cached value wins");
    assert_eq!(renders.load(Ordering::SeqCst), 1, "render ran once");
}

#[test]
fn read_past_ttl_renders_again() {
    let cache = RenderCache::new(Duration::from_millis(10));
    let renders = AtomicUsize::new(0);

    let _ = cache.get_or_render("k", || counting_render(&renders, "v1"));
    std::thread::sleep(Duration::from_millis(15));
    let value = cache.get_or_render("k", || counting_render(&renders, "v2"));

    assert_eq!(value.expect("infallible"), "v2");
    assert_eq!(renders.load(Ordering::SeqCst), 2, "render ran twice");
}

#[test]
fn zero_ttl_is_pass_through() {
    let cache = RenderCache::new(Duration::ZERO);
    let renders = AtomicUsize::new(0);

    let _ = cache.get_or_render("k", || counting_render(&renders, "v1"));
    let _ = cache.get_or_render("k", || counting_render(&renders, "v2"));

    assert_eq!(renders.load(Ordering::SeqCst), 2, "every call renders");
}

#[test]
fn failed_render_is_not_cached() {
    let cache = RenderCache::new(Duration::from_secs(60));
    let renders = AtomicUsize::new(0);

    let failed: Result<String, String> = cache.get_or_render("k", || {
        renders.fetch_add(1, Ordering::SeqCst);
        Err("backend down".to_string())
    });
    assert!(failed.is_err());

    let recovered = cache.get_or_render("k", || counting_render(&renders, "v1"));
    assert_eq!(
        recovered.expect("second render succeeds"),
        "v1",
        "error was not stored"
    );
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}

#[test]
fn distinct_keys_do_not_collide() {
    let cache = RenderCache::new(Duration::from_secs(60));
    let renders = AtomicUsize::new(0);

    let a = cache.get_or_render("a", || counting_render(&renders, "va"));
    let b = cache.get_or_render("b", || counting_render(&renders, "vb"));

    assert_eq!(a.expect("infallible"), "va");
    assert_eq!(b.expect("infallible"), "vb");
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}

#[test]
fn config_fingerprint_tracks_content() {
    let empty = ConfigMap::new();
    assert_eq!(config_fingerprint(&empty), "empty");

    let mut a = ConfigMap::new();
    a.insert("metric".into(), json!("total"));
    let mut b = ConfigMap::new();
    b.insert("metric".into(), json!("total"));
    assert_eq!(config_fingerprint(&a), config_fingerprint(&b));

    b.insert("metric".into(), json!("active"));
    assert_ne!(
        config_fingerprint(&a),
        config_fingerprint(&b),
        "changed configuration changes the fingerprint"
    );
}

#[test]
fn render_cache_key_uses_recommended_scheme() {
    let mut cfg = ConfigMap::new();
    cfg.insert("range".into(), json!("30d"));
    let key = render_cache_key("acme.widget.sales", "w1", "line", &cfg);
    let expected_suffix = config_fingerprint(&cfg);
    assert_eq!(
        key,
        format!("acme.widget.sales:w1:line:{}", expected_suffix)
    );
}
