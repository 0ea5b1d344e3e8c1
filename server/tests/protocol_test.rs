//! Unit tests for the wire formats the server accepts and returns.

use serde_json::json;
use sift_engine::{
    classify, Credentials, Error, ErrorKind, EventKind, MutationEvent, Registry, SyncAction,
};

#[cfg(test)]
mod event_payload_tests {
    use super::*;

    #[test]
    fn test_single_create_payload() {
        let event: MutationEvent = serde_json::from_value(json!({
            "collection": "restaurant",
            "event": "afterCreate",
            "result": {"id": 1, "documentId": "abc", "name": "Trattoria"},
            "params": {"data": {"name": "Trattoria"}}
        }))
        .unwrap();

        assert_eq!(event.kind, EventKind::AfterCreate);
        assert_eq!(event.plan(None).unwrap(), SyncAction::Add("abc".to_string()));
    }

    #[test]
    fn test_bulk_delete_payload() {
        let event: MutationEvent = serde_json::from_value(json!({
            "collection": "c",
            "event": "afterDeleteMany",
            "result": {"count": 3},
            "params": {"where": {"id": {"in": [4, 5, 6]}}}
        }))
        .unwrap();

        match event.plan(None).unwrap() {
            SyncAction::Delete(ids) => assert_eq!(ids, vec!["4", "5", "6"]),
            other => panic!("Expected delete, got {other:?}"),
        }
    }

    #[test]
    fn test_bulk_update_payload_is_refused() {
        let event: MutationEvent = serde_json::from_value(json!({
            "collection": "articles",
            "event": "afterUpdateMany",
            "params": {"data": {"published": true}, "where": {"id": {"in": [1, 2]}}}
        }))
        .unwrap();

        let err = event.plan(None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBulkOperation { .. }));
        assert_eq!(classify(&err, "").kind, ErrorKind::UnsupportedBulkOperation);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let result = serde_json::from_value::<MutationEvent>(json!({
            "collection": "articles",
            "event": "beforeCreate",
            "params": {}
        }));
        assert!(result.is_err());
    }
}

#[cfg(test)]
mod admin_payload_tests {
    use super::*;

    #[test]
    fn test_error_body_shape() {
        let err = Error::EngineValidation {
            message: "The index `products` already exists.".into(),
            code: Some("index_already_exists".into()),
            link: Some("https://docs.meilisearch.com/errors#index_already_exists".into()),
        };

        let classified = classify(&err, "http://localhost:7700");
        let body = serde_json::to_value(classified.into_body()).unwrap();
        assert_eq!(
            body,
            json!({
                "error": {
                    "message": "The index `products` already exists.",
                    "link": "https://docs.meilisearch.com/errors#index_already_exists"
                }
            })
        );
    }

    #[test]
    fn test_unreachable_body_names_host() {
        let err = Error::EngineUnreachable {
            host: "http://localhost:7700".into(),
            reason: "connection failed".into(),
        };
        let classified = classify(&err, "http://localhost:7700");
        let body = serde_json::to_value(classified.into_body()).unwrap();

        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("http://localhost:7700"));
        assert!(body["error"].get("link").is_none());
    }

    #[test]
    fn test_credentials_update_payload() {
        let update: Credentials =
            serde_json::from_value(json!({"host": "http://localhost:7700", "apiKey": "masterKey"}))
                .unwrap();
        assert_eq!(update, Credentials::new("http://localhost:7700", "masterKey"));

        let partial: Credentials = serde_json::from_value(json!({"apiKey": "other"})).unwrap();
        assert_eq!(partial.host, None);
    }

    #[test]
    fn test_collections_file() {
        let registry = Registry::from_json(
            r#"[
                {"collection": "shirts", "indexName": "products"},
                {"collection": "pants", "indexName": ["products", "pants"], "idField": "sku"},
                {"collection": "restaurant", "populate": ["categories"],
                 "settings": {"filterableAttributes": ["categories"]}}
            ]"#,
        )
        .unwrap();

        assert_eq!(registry.collections_sharing_index("products"), vec!["shirts", "pants"]);
        assert_eq!(registry.index_names("pants"), vec!["products", "pants"]);
        assert_eq!(registry.index_name("restaurant"), "restaurant");
        assert!(!registry.get("restaurant").unwrap().settings.is_empty());
    }
}
