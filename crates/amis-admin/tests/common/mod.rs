//! Shared fixtures: a small blog with categories, tags and articles.

#![allow(dead_code)]

use std::sync::Arc;

use amis_admin::{AdminSite, ModelAdmin, ModelAdminEngine};
use amis_admin_core::Settings;
use amis_admin_db::{
    EnumMember, FieldDef, FieldType, InMemoryStore, ModelCatalog, ModelMeta, Record, Store,
};

pub fn catalog() -> Arc<ModelCatalog> {
    let mut catalog = ModelCatalog::new();
    catalog
        .register(
            ModelMeta::new("category")
                .field(FieldDef::new("name", FieldType::ShortText).max_length(50))
                .label_field("name"),
        )
        .unwrap();
    catalog
        .register(ModelMeta::new("tag").field(FieldDef::new("name", FieldType::ShortText)))
        .unwrap();
    catalog
        .register(
            ModelMeta::new("article")
                .field(
                    FieldDef::new("title", FieldType::ShortText)
                        .max_length(100)
                        .description("Title(Shown on the front page):Enter a title"),
                )
                .field(FieldDef::new("body", FieldType::LongText).nullable())
                .field(
                    FieldDef::new(
                        "status",
                        FieldType::Enum {
                            members: vec![
                                EnumMember::new("draft", 0).label("Draft"),
                                EnumMember::new("live", 1).label("Live"),
                            ],
                        },
                    )
                    .default(0),
                )
                .field(FieldDef::new("featured", FieldType::Boolean).nullable())
                .field(
                    FieldDef::new(
                        "price",
                        FieldType::Decimal {
                            max_digits: 6,
                            decimal_places: 2,
                        },
                    )
                    .nullable(),
                )
                .field(FieldDef::new("cover", FieldType::Image).nullable())
                .field(FieldDef::new("published", FieldType::Date).nullable())
                .field(
                    FieldDef::new(
                        "category",
                        FieldType::ForeignKey {
                            to: "category".into(),
                        },
                    )
                    .nullable(),
                )
                .field(FieldDef::new("tags", FieldType::ManyToMany { to: "tag".into() })),
        )
        .unwrap();
    Arc::new(catalog)
}

pub fn article_admin() -> ModelAdmin {
    ModelAdmin::new("article")
        .title("Articles")
        .list_display(vec!["pk", "title", "status", "featured", "category", "tags"])
        .inline_fields(vec!["title", "status"])
        .search_fields(vec!["title"])
        .ordering(vec!["pk"])
}

pub fn engine_with(admin: ModelAdmin, store: &InMemoryStore) -> ModelAdminEngine {
    ModelAdminEngine::new(
        admin,
        catalog(),
        Arc::new(store.clone()),
        Arc::new(Settings::default()),
    )
    .unwrap()
}

pub fn site(store: &InMemoryStore) -> AdminSite {
    let settings = Arc::new(Settings::default());
    let catalog = catalog();
    let mut site = AdminSite::new(Arc::clone(&settings));
    for admin in [
        article_admin(),
        ModelAdmin::new("category"),
        ModelAdmin::new("tag").operations(vec![amis_admin::Operation::List]),
    ] {
        site.register(
            ModelAdminEngine::new(
                admin,
                Arc::clone(&catalog),
                Arc::new(store.clone()),
                Arc::clone(&settings),
            )
            .unwrap(),
        )
        .unwrap();
    }
    site
}

/// Inserts rows named `prefix 1..=count` into `model`.
pub async fn seed(store: &InMemoryStore, model: &str, prefix: &str, count: usize) {
    let meta = catalog().require(model).unwrap();
    let field = if model == "article" { "title" } else { "name" };
    for i in 1..=count {
        store
            .insert(&meta, Record::from_pairs([(field, format!("{prefix} {i}"))]))
            .await
            .unwrap();
    }
}
