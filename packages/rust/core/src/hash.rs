//! Content hashing for resolved documents.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use contentgraph_shared::{ContentGraphError, Result};

/// SHA-256 hex digest of `value`'s canonical JSON form.
///
/// Object keys are sorted at every level before hashing, so two values
/// that differ only in key insertion order hash the same. With serde_json's
/// default `BTreeMap` maps this is already true; the explicit pass keeps the
/// digest stable if `preserve_order` gets enabled somewhere in the build.
pub fn content_hash<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)
        .map_err(|e| ContentGraphError::parse(format!("failed to serialize document: {e}")))?;
    let canonical = serde_json::to_vec(&canonicalize(value))
        .map_err(|e| ContentGraphError::parse(format!("failed to serialize document: {e}")))?;

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(format!("{:x}", hasher.finalize()))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_is_hex_sha256() {
        let hash = content_hash(&json!({ "a": 1 })).unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hashing_is_idempotent() {
        let doc = json!({ "_id": "p1", "title": "Hi", "tags": ["a", "b"] });
        assert_eq!(content_hash(&doc).unwrap(), content_hash(&doc).unwrap());
    }

    #[test]
    fn key_order_does_not_matter() {
        let mut first = Map::new();
        first.insert("title".into(), json!("Hi"));
        first.insert("nested".into(), json!({ "b": 2, "a": 1 }));

        let mut second = Map::new();
        second.insert("nested".into(), json!({ "a": 1, "b": 2 }));
        second.insert("title".into(), json!("Hi"));

        assert_eq!(
            content_hash(&Value::Object(first)).unwrap(),
            content_hash(&Value::Object(second)).unwrap()
        );
    }

    #[test]
    fn canonical_form_sorts_nested_keys() {
        let mut inner = Map::new();
        inner.insert("z".into(), json!(1));
        inner.insert("a".into(), json!([{ "y": 2, "b": 3 }]));
        let mut outer = Map::new();
        outer.insert("m".into(), Value::Object(inner));

        let text = serde_json::to_string(&canonicalize(Value::Object(outer))).unwrap();
        assert_eq!(text, r#"{"m":{"a":[{"b":3,"y":2}],"z":1}}"#);
    }

    #[test]
    fn typed_and_dynamic_documents_hash_alike() {
        #[derive(Serialize)]
        struct Post {
            title: &'static str,
            body: &'static str,
        }

        let typed = content_hash(&Post {
            title: "Hi",
            body: "# Hi",
        })
        .unwrap();
        let dynamic = content_hash(&json!({ "body": "# Hi", "title": "Hi" })).unwrap();
        assert_eq!(typed, dynamic);
    }

    #[test]
    fn content_changes_change_the_hash() {
        let a = content_hash(&json!({ "title": "Hi" })).unwrap();
        let b = content_hash(&json!({ "title": "Hello" })).unwrap();
        assert_ne!(a, b);

        // Array order is content, not layout.
        let c = content_hash(&json!(["x", "y"])).unwrap();
        let d = content_hash(&json!(["y", "x"])).unwrap();
        assert_ne!(c, d);
    }
}
