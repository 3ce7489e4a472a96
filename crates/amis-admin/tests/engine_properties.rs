//! Engine behavior against the in-memory store: memoization, codec round
//! trips, inline exclusion, link-set minimality, pagination, validation,
//! and fail-fast construction.

mod common;

use std::sync::Arc;

use amis_admin::{ListParams, ModelAdmin, ModelAdminEngine, OptionsPage, OptionsRequest, ValueCodec};
use amis_admin_core::{AdminError, Settings};
use amis_admin_db::{EnumMember, InMemoryStore, StoreCall, Value};
use serde_json::{json, Map, Value as Json};

use common::{article_admin, catalog, engine_with, seed};

fn payload(value: Json) -> Map<String, Json> {
    match value {
        Json::Object(map) => map,
        _ => Map::new(),
    }
}

// ── Memoization ─────────────────────────────────────────────────────

#[test]
fn test_descriptors_are_built_once() {
    let store = InMemoryStore::new();
    let engine = engine_with(article_admin(), &store);
    let title = engine.control("title").unwrap();
    assert!(std::ptr::eq(title.edit_control(), title.edit_control()));
    assert!(std::ptr::eq(title.read_column(), title.read_column()));
    assert!(std::ptr::eq(
        title.inline_column().unwrap(),
        title.inline_column().unwrap()
    ));
    let again = engine.control("title").unwrap();
    assert!(Arc::ptr_eq(&title, &again));
}

// ── Round trips ─────────────────────────────────────────────────────

#[test]
fn test_codec_round_trips() {
    let cases: Vec<(ValueCodec, Value)> = vec![
        (ValueCodec::Text { max_length: Some(10) }, Value::from("hello")),
        (ValueCodec::Integer, Value::Int(-7)),
        (ValueCodec::Float, Value::Float(2.5)),
        (
            ValueCodec::Decimal {
                max_digits: 6,
                decimal_places: 2,
            },
            Value::Float(1234.56),
        ),
        (
            ValueCodec::Decimal {
                max_digits: 2,
                decimal_places: 2,
            },
            Value::Float(0.55),
        ),
        (ValueCodec::Boolean, Value::Bool(true)),
        (ValueCodec::TriState, Value::Bool(false)),
        (
            ValueCodec::Date,
            Value::Date(chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
        ),
        (
            ValueCodec::DateTime,
            Value::DateTime(
                chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
                    .unwrap()
                    .and_hms_opt(3, 4, 5)
                    .unwrap(),
            ),
        ),
        (
            ValueCodec::Time,
            Value::Time(chrono::NaiveTime::from_hms_opt(23, 59, 1).unwrap()),
        ),
        (
            ValueCodec::Enum {
                members: vec![EnumMember::new("draft", 0), EnumMember::new("live", 1)],
                sentinel: true,
            },
            Value::Int(1),
        ),
        (
            ValueCodec::Media {
                media_url: "/media/".into(),
            },
            Value::from("covers/a.png"),
        ),
        (ValueCodec::ForeignKey, Value::Int(3)),
        (
            ValueCodec::ManyToMany,
            Value::List(vec![Value::Int(1), Value::Int(2)]),
        ),
    ];
    for (codec, value) in cases {
        let wire = codec.to_wire(&value);
        assert_eq!(codec.to_storage(&wire), Ok(value), "codec {codec:?}");
    }
}

#[test]
fn test_tristate_wire_values() {
    let codec = ValueCodec::TriState;
    assert_eq!(codec.to_wire(&Value::Null), json!("None"));
    assert_eq!(codec.to_wire(&Value::Bool(true)), json!("True"));
    assert_eq!(codec.to_wire(&Value::Bool(false)), json!("False"));
    assert_eq!(codec.to_storage(&json!("None")), Ok(Value::Null));
    assert_eq!(codec.to_storage(&json!("True")), Ok(Value::Bool(true)));
    assert_eq!(codec.to_storage(&json!("False")), Ok(Value::Bool(false)));
}

// ── Inline exclusion ────────────────────────────────────────────────

#[test]
fn test_relations_have_no_inline_column() {
    let store = InMemoryStore::new();
    let engine = engine_with(article_admin(), &store);
    for name in ["category", "tags"] {
        let control = engine.control(name).unwrap();
        assert!(matches!(
            control.inline_column(),
            Err(AdminError::Structural(_))
        ));
    }
}

// ── Link-set reconciliation ─────────────────────────────────────────

#[tokio::test]
async fn test_many_to_many_reconciliation_is_minimal() {
    let store = InMemoryStore::new();
    seed(&store, "tag", "tag", 3).await;
    let engine = engine_with(article_admin(), &store);

    let created = engine
        .create(&payload(json!({"title": "Post", "tags": [1, 2]})))
        .await
        .unwrap();
    assert_eq!(created["pk"], 1);
    let adds: Vec<_> = store.relation_calls();
    assert_eq!(
        adds,
        vec![StoreCall::RelatedAdd {
            model: "article".into(),
            field: "tags".into(),
            owner: Value::Int(1),
            targets: vec![Value::Int(1), Value::Int(2)],
        }]
    );

    store.clear_calls();
    engine
        .update("1", &payload(json!({"tags": [2, 3]})))
        .await
        .unwrap();
    assert_eq!(
        store.relation_calls(),
        vec![
            StoreCall::RelatedRemove {
                model: "article".into(),
                field: "tags".into(),
                owner: Value::Int(1),
                targets: vec![Value::Int(1)],
            },
            StoreCall::RelatedAdd {
                model: "article".into(),
                field: "tags".into(),
                owner: Value::Int(1),
                targets: vec![Value::Int(3)],
            },
        ]
    );

    store.clear_calls();
    engine
        .update("1", &payload(json!({"tags": "3,2"})))
        .await
        .unwrap();
    assert!(store.relation_calls().is_empty());
    let saves = store
        .calls()
        .iter()
        .filter(|c| matches!(c, StoreCall::Save { .. }))
        .count();
    assert_eq!(saves, 1);
}

#[tokio::test]
async fn test_missing_related_key_is_field_error() {
    let store = InMemoryStore::new();
    seed(&store, "category", "cat", 1).await;
    let engine = engine_with(article_admin(), &store);
    let err = engine
        .create(&payload(json!({"title": "Post", "category": 5, "tags": [9]})))
        .await
        .unwrap_err();
    let AdminError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert!(errors.get("category").is_some());
    assert!(errors.get("tags").is_some());
    assert!(store.calls().is_empty());
}

// ── Pagination ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_pagination_and_count_are_independent() {
    let store = InMemoryStore::new();
    seed(&store, "article", "Article", 25).await;
    let engine = engine_with(article_admin(), &store);

    let second = engine
        .list(&ListParams {
            page: Some(2),
            per_page: Some(10),
            ..ListParams::default()
        })
        .await
        .unwrap();
    assert_eq!(second.total, 25);
    assert_eq!(second.items.len(), 10);
    assert_eq!(second.items[0]["title"], "Article 11");

    let last = engine
        .list(&ListParams {
            page: Some(3),
            per_page: Some(10),
            ..ListParams::default()
        })
        .await
        .unwrap();
    assert_eq!(last.total, 25);
    assert_eq!(last.items.len(), 5);

    let searched = engine
        .list(&ListParams {
            keywords: Some("article 2".into()),
            per_page: Some(2),
            ..ListParams::default()
        })
        .await
        .unwrap();
    // "Article 2" and "Article 20" through "Article 25"
    assert_eq!(searched.total, 7);
    assert_eq!(searched.items.len(), 2);
}

#[tokio::test]
async fn test_per_page_is_clamped() {
    let store = InMemoryStore::new();
    seed(&store, "article", "Article", 3).await;
    let engine = engine_with(article_admin(), &store);
    let page = engine
        .list(&ListParams {
            page: Some(0),
            per_page: Some(100_000),
            ..ListParams::default()
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let store = InMemoryStore::new();
    seed(&store, "article", "Article", 3).await;
    seed(&store, "tag", "tag", 4).await;
    let engine = engine_with(article_admin(), &store);

    let page = engine
        .list(&ListParams {
            page: Some(usize::MAX),
            per_page: Some(10),
            ..ListParams::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert!(page.items.is_empty());

    let options = engine
        .select_options(
            "tags",
            &OptionsRequest {
                page: Some(usize::MAX),
                per_page: Some(10),
                ..OptionsRequest::default()
            },
        )
        .await
        .unwrap();
    let OptionsPage::Paged { total, items } = options else {
        panic!("expected paged options");
    };
    assert_eq!(total, 4);
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_list_serializes_relations() {
    let store = InMemoryStore::new();
    seed(&store, "category", "News", 1).await;
    seed(&store, "tag", "tag", 2).await;
    let engine = engine_with(article_admin(), &store);
    engine
        .create(&payload(json!({"title": "Post", "category": {"label": "News 1", "value": 1}, "tags": "1,2"})))
        .await
        .unwrap();
    let page = engine.list(&ListParams::default()).await.unwrap();
    let row = &page.items[0];
    assert_eq!(row["category"], json!({"label": "News 1", "value": 1}));
    assert_eq!(
        row["tags"],
        json!([{"label": "tag 1", "value": 1}, {"label": "tag 2", "value": 2}])
    );
    assert_eq!(row["status"], "draft");
    assert_eq!(row["featured"], "None");
}

// ── Validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_requires_non_nullable_fields() {
    let store = InMemoryStore::new();
    let engine = engine_with(article_admin(), &store);

    let err = engine
        .create(&payload(json!({"body": "text", "price": 1.5})))
        .await
        .unwrap_err();
    let AdminError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.get("title"), Some("This field is required."));

    let row = engine
        .create(&payload(json!({"title": "Now complete", "body": "text", "price": 1.5})))
        .await
        .unwrap();
    assert_eq!(row["title"], "Now complete");
}

#[tokio::test]
async fn test_every_bad_field_is_reported() {
    let store = InMemoryStore::new();
    let engine = engine_with(article_admin(), &store);
    let err = engine
        .create(&payload(json!({
            "title": "x".repeat(101),
            "status": "archived",
            "price": 12345.678,
            "published": "yesterday",
            "featured": "maybe",
        })))
        .await
        .unwrap_err();
    let AdminError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    for field in ["title", "status", "price", "published", "featured"] {
        assert!(errors.get(field).is_some(), "missing error for {field}");
    }
}

#[tokio::test]
async fn test_patch_only_touches_inline_fields() {
    let store = InMemoryStore::new();
    let engine = engine_with(article_admin(), &store);
    engine
        .create(&payload(json!({"title": "Old", "body": "kept"})))
        .await
        .unwrap();
    let row = engine
        .patch("1", &payload(json!({"title": "New", "body": "ignored", "status": "live"})))
        .await
        .unwrap();
    assert_eq!(row["title"], "New");
    assert_eq!(row["status"], "live");
    assert_eq!(row["body"], "kept");
}

// ── Options ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_select_options_paged_and_scoped() {
    let store = InMemoryStore::new();
    seed(&store, "tag", "tag", 12).await;
    let engine = engine_with(article_admin(), &store);
    engine
        .create(&payload(json!({"title": "Post", "tags": [3, 4]})))
        .await
        .unwrap();

    let paged = engine
        .select_options(
            "tags",
            &OptionsRequest {
                page: Some(2),
                per_page: Some(5),
                ..OptionsRequest::default()
            },
        )
        .await
        .unwrap();
    let OptionsPage::Paged { total, items } = paged else {
        panic!("expected paged options");
    };
    assert_eq!(total, 12);
    assert_eq!(items.len(), 5);
    assert_eq!(items[0].label, "tag 6");

    let scoped = engine
        .select_options(
            "tags",
            &OptionsRequest {
                pk: Some(Value::Int(1)),
                ..OptionsRequest::default()
            },
        )
        .await
        .unwrap();
    let OptionsPage::All { options } = scoped else {
        panic!("expected full option list");
    };
    let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["tag 3", "tag 4"]);
}

// ── Fail-fast construction ──────────────────────────────────────────

#[test]
fn test_unknown_field_fails_construction() {
    for admin in [
        ModelAdmin::new("article").list_display(vec!["pk", "headline"]),
        ModelAdmin::new("article").create_fields(vec!["headline"]),
        ModelAdmin::new("article").update_fields(vec!["headline"]),
        ModelAdmin::new("article").inline_fields(vec!["headline"]),
    ] {
        let result = ModelAdminEngine::new(
            admin,
            catalog(),
            Arc::new(InMemoryStore::new()),
            Arc::new(Settings::default()),
        );
        assert!(matches!(result, Err(AdminError::Configuration(_))));
    }
}

#[test]
fn test_unknown_model_fails_construction() {
    let result = ModelAdminEngine::new(
        ModelAdmin::new("comment"),
        catalog(),
        Arc::new(InMemoryStore::new()),
        Arc::new(Settings::default()),
    );
    assert!(matches!(result, Err(AdminError::Configuration(_))));
}
