//! Record fixtures.

use serde_json::{Value, json};

/// Three products, `p1` to `p3`.
pub fn products() -> Vec<Value> {
    (1..=3)
        .map(|i| {
            json!({
                "id": format!("p{}", i),
                "name": format!("Product {}", i),
                "owner": {"email": "pm@example.com"},
                "links": {"html": format!("https://example.com/products/p{}", i)}
            })
        })
        .collect()
}

/// A feature record.
pub fn feature(id: &str, name: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": "feature",
        "status": {"id": format!("s-{}", status.to_lowercase()), "name": status},
        "owner": {"email": "dev@example.com"},
        "parent": {"component": {"id": "c1"}},
        "createdAt": "2024-02-01T09:00:00Z",
        "links": {"html": format!("https://example.com/features/{}", id)}
    })
}

/// Three features, `f1` to `f3`.
pub fn features() -> Vec<Value> {
    vec![
        feature("f1", "Dark mode", "Done"),
        feature("f2", "Export to CSV", "Planned"),
        feature("f3", "Darker charts", "In progress"),
    ]
}

/// Five notes; `n2`, `n3` and `n4` have no usable title.
pub fn notes() -> Vec<Value> {
    vec![
        json!({"id": "n1", "title": "Login is broken", "state": "unprocessed", "tags": ["bug"]}),
        json!({"id": "n2", "title": "", "state": "processed"}),
        json!({"id": "n3", "title": null, "state": "unprocessed"}),
        json!({"id": "n4", "state": "archived"}),
        json!({"id": "n5", "title": "Dark mode please", "state": "processed", "tags": ["ui"]}),
    ]
}

/// Returns the `id` of each record.
pub fn ids(records: &[Value]) -> Vec<String> {
    records
        .iter()
        .map(|r| r["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

/// Returns the origin-type marker of each record.
pub fn origin_types(records: &[Value]) -> Vec<String> {
    records
        .iter()
        .map(|r| {
            r[collection_query::ORIGIN_TYPE_FIELD]
                .as_str()
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}
