//! List pagination: skip before limit, malformed parameters ignored.

use std::collections::HashMap;

use cart_items::store::InMemoryCollection;
use cart_items::{ItemHandler, ListQuery};
use serde_json::{json, Value};

use crate::support;

fn seeded(n: usize) -> (ItemHandler<InMemoryCollection>, Vec<String>) {
    let handler = support::handler();
    let ids = (0..n)
        .map(|i| support::create(&handler, json!({ "name": format!("item-{i}"), "position": i })))
        .collect();
    (handler, ids)
}

fn page(handler: &ItemHandler<InMemoryCollection>, pairs: &[(&str, &str)]) -> Vec<Value> {
    let params: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let reply = handler.list(&ListQuery::from_params(&params)).unwrap();
    assert_eq!(reply.status, 200);
    let items = reply.body["items"].as_array().unwrap().clone();
    assert_eq!(reply.body["count"], items.len());
    items
}

fn ids(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn page_sizes_follow_min_formula() {
    let n = 7;
    let (handler, _) = seeded(n);

    for limit in 0..=9usize {
        for skip in 0..=9usize {
            let items = page(
                &handler,
                &[
                    ("limit", limit.to_string().as_str()),
                    ("skip", skip.to_string().as_str()),
                ],
            );
            let expected = limit.min(n.saturating_sub(skip));
            assert_eq!(items.len(), expected, "limit={limit} skip={skip}");
        }
    }
}

#[test]
fn consecutive_pages_cover_everything_once() {
    let (handler, all_ids) = seeded(10);

    let first = page(&handler, &[("limit", "5"), ("skip", "0")]);
    let second = page(&handler, &[("limit", "5"), ("skip", "5")]);

    let mut combined = ids(&first);
    combined.extend(ids(&second));
    assert_eq!(combined, all_ids);
}

#[test]
fn skip_applies_before_limit() {
    let (handler, all_ids) = seeded(6);
    let items = page(&handler, &[("skip", "2"), ("limit", "3")]);
    assert_eq!(ids(&items), all_ids[2..5].to_vec());
    assert_eq!(items[0]["position"], 2);
}

#[test]
fn malformed_params_fall_back_to_defaults() {
    let (handler, all_ids) = seeded(4);

    for bad in ["-3", "ten", "2.5", ""] {
        let items = page(&handler, &[("limit", bad), ("skip", bad)]);
        assert_eq!(ids(&items), all_ids, "value {bad:?}");
    }
}

#[test]
fn skip_past_end_is_empty_not_an_error() {
    let (handler, _) = seeded(3);
    assert!(page(&handler, &[("skip", "50")]).is_empty());
}

#[test]
fn limit_zero_is_an_empty_page() {
    let (handler, _) = seeded(3);
    assert!(page(&handler, &[("limit", "0")]).is_empty());
    assert!(page(&handler, &[("limit", "0"), ("skip", "1")]).is_empty());
}
