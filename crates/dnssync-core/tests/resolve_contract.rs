//! Contract Test: Resolve Stage
//!
//! Constraints verified:
//! - Address sets never contain duplicates
//! - Only answers matching the queried family are kept
//! - A failing lookup never stops the remaining lookups
//! - Lookups are issued sequentially, A before AAAA, in hostname order

mod common;

use common::*;
use dnssync_core::AddressFamily::{V4, V6};
use dnssync_core::engine::resolve_hostnames;
use dnssync_core::traits::Answer;

fn hosts(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn repeated_answers_and_hostnames_are_deduplicated() {
    let resolver = ScriptedResolver::new()
        .with_addresses("a.example", V4, &["1.1.1.1", "1.1.1.1"])
        .with_addresses("b.example", V4, &["1.1.1.1", "2.2.2.2"])
        .with_addresses("b.example", V6, &["::1", "::1"]);

    let resolution = resolve_hostnames(
        &resolver,
        &hosts(&["a.example", "b.example", "a.example"]),
    )
    .await;

    assert_eq!(
        resolution.addresses.ipv4.iter().collect::<Vec<_>>(),
        vec!["1.1.1.1", "2.2.2.2"]
    );
    assert_eq!(resolution.addresses.ipv6.iter().collect::<Vec<_>>(), vec!["::1"]);
    assert!(resolution.failures.is_empty());
}

#[tokio::test]
async fn answers_of_other_types_are_ignored() {
    // CNAME hop (5) and a mis-typed entry in each family's answer section
    let resolver = ScriptedResolver::new()
        .with_answers(
            "cdn.example",
            V4,
            vec![
                Answer::new("cdn.example.", 5, "edge.example.net."),
                Answer::new("edge.example.net.", 1, "203.0.113.7"),
                Answer::new("edge.example.net.", 28, "2001:db8::7"),
            ],
        )
        .with_answers(
            "cdn.example",
            V6,
            vec![
                Answer::new("cdn.example.", 5, "edge.example.net."),
                Answer::new("edge.example.net.", 28, "2001:db8::8"),
                Answer::new("edge.example.net.", 16, "\"txt\""),
            ],
        );

    let resolution = resolve_hostnames(&resolver, &hosts(&["cdn.example"])).await;

    assert_eq!(
        resolution.addresses.ipv4.iter().collect::<Vec<_>>(),
        vec!["203.0.113.7"]
    );
    assert_eq!(
        resolution.addresses.ipv6.iter().collect::<Vec<_>>(),
        vec!["2001:db8::8"]
    );
}

#[tokio::test]
async fn failing_hostname_does_not_stop_the_batch() {
    let resolver = ScriptedResolver::new()
        .with_host_failure("broken.example", "connection refused")
        .with_addresses("ok.example", V4, &["198.51.100.1"])
        .with_addresses("ok.example", V6, &["2001:db8::1"]);
    let queries = resolver.queries();

    let resolution =
        resolve_hostnames(&resolver, &hosts(&["broken.example", "ok.example"])).await;

    assert_eq!(resolution.addresses.len(), 2);
    assert!(resolution.addresses.ipv4.contains("198.51.100.1"));
    assert!(resolution.addresses.ipv6.contains("2001:db8::1"));

    assert_eq!(resolution.failures.len(), 2);
    assert!(resolution.failures.iter().all(|f| f.hostname == "broken.example"));
    assert!(resolution.failures[0].error.contains("connection refused"));

    assert_eq!(
        *queries.lock().unwrap(),
        vec![
            ("broken.example".to_string(), V4),
            ("broken.example".to_string(), V6),
            ("ok.example".to_string(), V4),
            ("ok.example".to_string(), V6),
        ]
    );
}

#[tokio::test]
async fn a_failure_does_not_skip_aaaa_lookup() {
    let resolver = ScriptedResolver::new()
        .with_failure("dual.example", V4, "HTTP 502")
        .with_addresses("dual.example", V6, &["2001:db8::2"]);

    let resolution = resolve_hostnames(&resolver, &hosts(&["dual.example"])).await;

    assert!(resolution.addresses.ipv4.is_empty());
    assert_eq!(resolution.addresses.ipv6.len(), 1);
    assert_eq!(resolution.failures.len(), 1);
    assert_eq!(resolution.failures[0].family, V4);
}

#[tokio::test]
async fn missing_answer_section_is_not_an_error() {
    let resolver = ScriptedResolver::new();

    let resolution = resolve_hostnames(&resolver, &hosts(&["nxdomain.example"])).await;

    assert!(resolution.addresses.is_empty());
    assert!(resolution.failures.is_empty());
}
