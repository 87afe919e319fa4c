// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lws_core::FakeClock;

fn engine() -> ObjectStoreEngine<FakeClock> {
    let engine = ObjectStoreEngine::new(FakeClock::new());
    engine.create_bucket("assets").unwrap();
    engine
}

fn put(engine: &ObjectStoreEngine<FakeClock>, key: &str, body: &str) {
    engine
        .put_object(
            "assets",
            key,
            PutObjectRequest { body: body.as_bytes().to_vec(), ..Default::default() },
        )
        .unwrap();
}

#[test]
fn put_get_round_trips_bytes() {
    let engine = engine();
    engine
        .put_object(
            "assets",
            "docs/readme.md",
            PutObjectRequest {
                body: b"# hi".to_vec(),
                content_type: Some("text/markdown".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    let object = engine.get_object("assets", "docs/readme.md").unwrap();
    assert_eq!(object.body, b"# hi");
    assert_eq!(object.content_type.as_deref(), Some("text/markdown"));
}

#[test]
fn get_missing_object_vs_missing_bucket() {
    let engine = engine();
    let err = engine.get_object("assets", "nope").unwrap_err();
    assert!(matches!(err, EngineError::NotFound { resource: "object", .. }));
    let err = engine.get_object("missing", "nope").unwrap_err();
    assert!(matches!(err, EngineError::NotFound { resource: "bucket", .. }));
}

#[test]
fn listing_is_lexicographic_with_prefix() {
    let engine = engine();
    for key in ["b/2", "a/1", "b/1", "c"] {
        put(&engine, key, "x");
    }
    let all: Vec<String> =
        engine.list_objects("assets", "").unwrap().into_iter().map(|o| o.key).collect();
    assert_eq!(all, ["a/1", "b/1", "b/2", "c"]);

    let under_b: Vec<String> =
        engine.list_objects("assets", "b/").unwrap().into_iter().map(|o| o.key).collect();
    assert_eq!(under_b, ["b/1", "b/2"]);
}

#[test]
fn head_object_reports_size_and_etag() {
    let engine = engine();
    put(&engine, "a.txt", "hello");
    let head = engine.head_object("assets", "a.txt").unwrap();
    assert_eq!(head.size, 5);
    assert_eq!(head.etag, "5d41402abc4b2a76b9719d911017c592");
}

#[test]
fn overwrite_replaces_body_and_etag() {
    let engine = engine();
    put(&engine, "a.txt", "one");
    let first = engine.head_object("assets", "a.txt").unwrap().etag;
    put(&engine, "a.txt", "two");
    let second = engine.head_object("assets", "a.txt").unwrap().etag;
    assert_ne!(first, second);
    assert_eq!(engine.get_object("assets", "a.txt").unwrap().body, b"two");
}

#[tokio::test]
async fn copy_object_duplicates_content() {
    let engine = engine();
    put(&engine, "src.txt", "payload");
    engine.copy_object("assets", "src.txt", "assets", "dst.txt").unwrap();
    assert_eq!(engine.get_object("assets", "dst.txt").unwrap().body, b"payload");
}

#[test]
fn bucket_lifecycle() {
    let engine = ObjectStoreEngine::new(FakeClock::new());
    engine.create_bucket("b1").unwrap();
    assert!(matches!(
        engine.create_bucket("b1").unwrap_err(),
        EngineError::AlreadyExists { .. }
    ));
    assert!(engine.head_bucket("b1").is_ok());
    assert_eq!(engine.list_buckets(), ["b1"]);
    engine.delete_bucket("b1").unwrap();
    assert!(engine.head_bucket("b1").unwrap_err().is_not_found());
}

#[test]
fn bucket_tagging_and_policy_defaults() {
    let engine = engine();
    assert!(engine.get_bucket_tagging("assets").unwrap().is_empty());
    engine
        .put_bucket_tagging("assets", [("env".to_string(), "dev".to_string())].into())
        .unwrap();
    assert_eq!(engine.get_bucket_tagging("assets").unwrap()["env"], "dev");
    engine.delete_bucket_tagging("assets").unwrap();
    assert!(engine.get_bucket_tagging("assets").unwrap().is_empty());

    assert!(engine.get_bucket_policy("assets").unwrap().contains("2012-10-17"));
    engine.put_bucket_policy("assets", "{\"Statement\":[1]}".to_string()).unwrap();
    assert!(engine.get_bucket_policy("assets").unwrap().contains("[1]"));

    assert!(engine
        .get_notification_configuration("assets")
        .unwrap()
        .contains("NotificationConfiguration"));
}

#[tokio::test]
async fn put_fires_matching_notifications() {
    let engine = engine();
    let seen = Arc::new(parking_lot::Mutex::new(Vec::<(String, String)>::new()));
    {
        let seen = seen.clone();
        engine
            .register_notification(
                "assets",
                "ObjectCreated:*",
                "img/",
                "",
                Arc::new(move |event: ObjectEvent| {
                    let seen = seen.clone();
                    Box::pin(async move {
                        seen.lock().push((event.event_type, event.key));
                        Ok(())
                    })
                }),
            )
            .unwrap();
    }

    put(&engine, "img/a.png", "x");
    put(&engine, "docs/b.txt", "x");
    engine.delete_object("assets", "img/a.png").unwrap();
    // Deleting something absent fires nothing.
    engine.delete_object("assets", "img/a.png").unwrap();

    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    let events = seen.lock().clone();
    assert_eq!(events, [("ObjectCreated:Put".to_string(), "img/a.png".to_string())]);
}

#[tokio::test]
async fn delete_fires_object_removed() {
    let engine = engine();
    let seen = Arc::new(parking_lot::Mutex::new(Vec::<String>::new()));
    {
        let seen = seen.clone();
        engine
            .register_notification(
                "assets",
                "ObjectRemoved:*",
                "",
                "",
                Arc::new(move |event: ObjectEvent| {
                    let seen = seen.clone();
                    Box::pin(async move {
                        seen.lock().push(event.event_type);
                        Ok(())
                    })
                }),
            )
            .unwrap();
    }
    put(&engine, "a.txt", "x");
    engine.delete_object("assets", "a.txt").unwrap();
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert_eq!(seen.lock().as_slice(), ["ObjectRemoved:Delete"]);
}
