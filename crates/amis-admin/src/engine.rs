//! The per-resource CRUD engine.
//!
//! A [`ModelAdminEngine`] binds one [`ModelAdmin`] to its model, a
//! [`Store`] and the site [`Settings`]. Construction checks every field
//! name the configuration mentions, so a typo fails at startup instead of
//! on the first request. Each operation then runs as one request-scoped
//! chain: validate the payload field by field, collecting every error;
//! resolve relation keys; write the row once; reconcile many-to-many link
//! sets; serialize the result.
//!
//! ```text
//! Validating -> Resolving-Relations -> Persisting -> Serializing -> Done
//!      \______________\_____________________\______________\-> Error
//! ```

use std::future::Future;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::{Map, Value as Json};
use tracing::Instrument;

use amis_admin_core::logging::operation_span;
use amis_admin_core::{AdminError, AdminResult, Settings, ValidationError};
use amis_admin_db::{Lookup, ModelCatalog, ModelMeta, Query, Record, Store, Value, Q};

use crate::control::FieldControl;
use crate::model_admin::{ModelAdmin, Operation};
use crate::registry::{FieldRegistry, PK_FIELD};
use crate::relation::{OptionsPage, OptionsRequest};

/// Parameters of a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    /// 1-indexed page.
    pub page: Option<usize>,
    /// Page size, clamped to the site maximum.
    pub per_page: Option<usize>,
    /// Search text matched against the search fields.
    pub keywords: Option<String>,
    /// Column to sort by.
    pub order_by: Option<String>,
    /// `asc` or `desc`.
    pub order_dir: Option<String>,
}

/// One page of serialized rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage {
    /// Rows matching the filter, ignoring pagination.
    pub total: usize,
    /// Rows on this page.
    pub items: Vec<Json>,
}

/// Generic CRUD over one model.
pub struct ModelAdminEngine {
    admin: ModelAdmin,
    meta: Arc<ModelMeta>,
    store: Arc<dyn Store>,
    settings: Arc<Settings>,
    registry: FieldRegistry,
    base_url: String,
    list_display: Vec<String>,
    create_fields: Vec<String>,
    update_fields: Vec<String>,
    detail_fields: Vec<String>,
    schema: OnceCell<Json>,
}

impl ModelAdminEngine {
    /// Builds an engine, checking every configured field name.
    ///
    /// Fails with [`AdminError::Configuration`] when a list names a field
    /// the model lacks, when a relation points at an unknown model, when an
    /// inline field is a relation, or when a form would write a key the
    /// store generates.
    pub fn new(
        admin: ModelAdmin,
        catalog: Arc<ModelCatalog>,
        store: Arc<dyn Store>,
        settings: Arc<Settings>,
    ) -> AdminResult<Self> {
        let meta = catalog.require(&admin.model)?;
        let base_url = format!(
            "{}/{}",
            settings.api_prefix.trim_end_matches('/'),
            admin.resource
        );
        let registry = FieldRegistry::new(Arc::clone(&meta), catalog, &settings, &base_url)?;

        let list_display = admin.list_display.clone().unwrap_or_else(|| {
            std::iter::once(PK_FIELD.to_string())
                .chain(
                    meta.fields
                        .iter()
                        .filter(|f| f.name != meta.pk)
                        .map(|f| f.name.clone()),
                )
                .collect()
        });
        let create_fields = admin.create_fields.clone().unwrap_or_else(|| {
            meta.fields
                .iter()
                .filter(|f| !(f.name == meta.pk && meta.auto_pk()))
                .map(|f| f.name.clone())
                .collect()
        });
        let update_fields = admin.update_fields.clone().unwrap_or_else(|| {
            create_fields
                .iter()
                .filter(|name| !registry.is_pk(name))
                .cloned()
                .collect()
        });

        let lists: [(&str, &[String]); 6] = [
            ("list_display", &list_display),
            ("create_fields", &create_fields),
            ("update_fields", &update_fields),
            ("inline_fields", &admin.inline_fields),
            ("search_fields", &admin.search_fields),
            ("ordering", &admin.ordering),
        ];
        for (list, names) in lists {
            for name in names {
                registry
                    .validate(name.trim_start_matches('-'))
                    .map_err(|e| configuration(&admin.resource, list, &e))?;
            }
        }

        if meta.auto_pk() {
            if let Some(name) = create_fields.iter().find(|n| registry.is_pk(n)) {
                return Err(AdminError::Configuration(format!(
                    "Resource '{}': create_fields lists '{name}', but the store generates primary keys",
                    admin.resource
                )));
            }
        }
        for (list, names) in [("update_fields", &update_fields), ("inline_fields", &admin.inline_fields)] {
            if let Some(name) = names.iter().find(|n| registry.is_pk(n)) {
                return Err(AdminError::Configuration(format!(
                    "Resource '{}': {list} lists the primary key '{name}', which cannot be changed",
                    admin.resource
                )));
            }
        }
        for (list, names) in [("inline_fields", &admin.inline_fields), ("search_fields", &admin.search_fields)] {
            if let Some(name) = names
                .iter()
                .find(|n| meta.get_field(n).is_some_and(|f| f.is_relation()))
            {
                return Err(AdminError::Configuration(format!(
                    "Resource '{}': {list} lists relation field '{name}'",
                    admin.resource
                )));
            }
        }

        let mut detail_fields = vec![PK_FIELD.to_string()];
        for name in list_display.iter().chain(&update_fields) {
            if name != PK_FIELD && !detail_fields.contains(name) {
                detail_fields.push(name.clone());
            }
        }

        Ok(Self {
            admin,
            meta,
            store,
            settings,
            registry,
            base_url,
            list_display,
            create_fields,
            update_fields,
            detail_fields,
            schema: OnceCell::new(),
        })
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// The resource name.
    pub fn resource(&self) -> &str {
        &self.admin.resource
    }

    /// The page title.
    pub fn title(&self) -> &str {
        self.admin.title.as_deref().unwrap_or(&self.meta.verbose_name)
    }

    /// The resource's API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The configuration.
    pub const fn admin(&self) -> &ModelAdmin {
        &self.admin
    }

    /// The model served.
    pub const fn meta(&self) -> &Arc<ModelMeta> {
        &self.meta
    }

    /// The field registry.
    pub const fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// The site settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Resolved list columns.
    pub fn list_display(&self) -> &[String] {
        &self.list_display
    }

    /// Resolved create form fields.
    pub fn create_fields(&self) -> &[String] {
        &self.create_fields
    }

    /// Resolved update form fields.
    pub fn update_fields(&self) -> &[String] {
        &self.update_fields
    }

    /// Inline-editable columns.
    pub fn inline_fields(&self) -> &[String] {
        &self.admin.inline_fields
    }

    /// Returns `true` if `op` is enabled.
    pub fn allows(&self, op: Operation) -> bool {
        self.admin.allows(op)
    }

    /// Resolves a field control.
    pub fn control(&self, name: &str) -> AdminResult<Arc<FieldControl>> {
        self.registry.control(name)
    }

    /// The amis page schema, built once.
    pub fn page_schema(&self) -> AdminResult<&Json> {
        self.schema.get_or_try_init(|| crate::schema::page(self))
    }

    // ── Operations ─────────────────────────────────────────────────

    /// Lists one page of rows.
    ///
    /// The page and the total come from two separate queries sharing one
    /// filter; only the page query is sliced.
    pub async fn list(&self, params: &ListParams) -> AdminResult<ListPage> {
        self.run("list", async {
            self.ensure(Operation::List)?;
            let per_page = self
                .settings
                .clamp_per_page(params.per_page.or(self.admin.list_per_page));
            let page = params.page.unwrap_or(1).max(1);

            let mut query = Query::new(&self.meta.name);
            if let Some(filter) = self.search_filter(params.keywords.as_deref()) {
                query = query.filter(filter);
            }
            for spec in self.ordering(params)? {
                query = query.order_by(&spec);
            }
            let count_query = query.for_count();
            let page_query = self
                .eager_load(query, &self.list_display)?
                .offset((page - 1).saturating_mul(per_page))
                .limit(per_page);

            let (rows, total) = tokio::try_join!(
                self.store.fetch(&self.meta, &page_query),
                self.store.count(&self.meta, &count_query),
            )?;
            let items = rows
                .iter()
                .map(|row| self.serialize(row, &self.list_display))
                .collect::<AdminResult<Vec<_>>>()?;
            Ok(ListPage { total, items })
        })
        .await
    }

    /// Reads one row with every list and update field.
    pub async fn read(&self, pk: &str) -> AdminResult<Json> {
        self.run("read", async {
            if !self.allows(Operation::List) && !self.allows(Operation::Update) {
                return Err(self.denied(Operation::List));
            }
            let pk = Value::parse_pk(pk);
            self.fetch_detail(&pk).await
        })
        .await
    }

    /// Creates a row from `payload`.
    ///
    /// Every create field is converted before anything is written; all
    /// failures come back together. The row is inserted once, then
    /// many-to-many members are added.
    pub async fn create(&self, payload: &Map<String, Json>) -> AdminResult<Json> {
        self.run("create", async {
            self.ensure(Operation::Create)?;
            let (record, links) = self.convert(payload, &self.create_fields, true).await?;
            let saved = self.store.insert(&self.meta, record).await?;
            let pk = saved.pk(&self.meta).clone();
            self.reconcile(&pk, links, true).await?;
            self.fetch_detail(&pk).await
        })
        .await
    }

    /// Updates a row from `payload` over the update fields.
    ///
    /// Fields absent from the payload keep their stored values.
    pub async fn update(&self, pk: &str, payload: &Map<String, Json>) -> AdminResult<Json> {
        self.run("update", self.modify(pk, payload, &self.update_fields))
            .await
    }

    /// Updates a row from `payload` over the inline fields only.
    pub async fn patch(&self, pk: &str, payload: &Map<String, Json>) -> AdminResult<Json> {
        self.run("patch", self.modify(pk, payload, &self.admin.inline_fields))
            .await
    }

    /// Deletes the rows whose keys appear in the comma-joined `pks`.
    ///
    /// Issues a single delete and returns how many rows it removed; keys
    /// that match nothing are not an error.
    pub async fn delete(&self, pks: &str) -> AdminResult<usize> {
        self.run("delete", async {
            self.ensure(Operation::Delete)?;
            let keys: Vec<Value> = pks
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Value::parse_pk)
                .collect();
            if keys.is_empty() {
                return Err(AdminError::field(PK_FIELD, "Enter at least one primary key."));
            }
            let filter = Q::filter(&self.meta.pk, Lookup::In(keys));
            self.store.delete(&self.meta, &filter).await
        })
        .await
    }

    /// Lists the selectable rows of a relation field.
    pub async fn select_options(
        &self,
        field: &str,
        request: &OptionsRequest,
    ) -> AdminResult<OptionsPage> {
        self.run("options", async {
            let listed = self
                .list_display
                .iter()
                .chain(&self.create_fields)
                .chain(&self.update_fields)
                .any(|name| name == field);
            let control = if listed { Some(self.registry.control(field)?) } else { None };
            let relation = control.as_ref().and_then(|c| c.relation()).ok_or_else(|| {
                AdminError::NotFound(format!(
                    "Resource '{}' has no relation field '{field}'",
                    self.admin.resource
                ))
            })?;
            let mut request = request.clone();
            if request.per_page.is_some() {
                request.per_page = Some(self.settings.clamp_per_page(request.per_page));
            }
            relation.options(self.store.as_ref(), &request).await
        })
        .await
    }

    // ── Internals ──────────────────────────────────────────────────

    async fn run<T, F>(&self, op: &'static str, fut: F) -> AdminResult<T>
    where
        F: Future<Output = AdminResult<T>>,
    {
        let span = operation_span(&self.admin.resource, op);
        let result = fut.instrument(span.clone()).await;
        span.in_scope(|| match &result {
            Ok(_) => tracing::debug!("operation succeeded"),
            Err(AdminError::Validation(errors)) => {
                tracing::debug!(fields = errors.len(), "payload rejected");
            }
            Err(e @ (AdminError::NotFound(_) | AdminError::PermissionDenied(_))) => {
                tracing::info!(error = %e, "operation refused");
            }
            Err(e) => tracing::error!(error = %e, "operation failed"),
        });
        result
    }

    fn ensure(&self, op: Operation) -> AdminResult<()> {
        if self.allows(op) {
            Ok(())
        } else {
            Err(self.denied(op))
        }
    }

    fn denied(&self, op: Operation) -> AdminError {
        AdminError::PermissionDenied(format!(
            "Operation '{}' is disabled for '{}'",
            op.as_str(),
            self.admin.resource
        ))
    }

    async fn modify(
        &self,
        pk: &str,
        payload: &Map<String, Json>,
        fields: &[String],
    ) -> AdminResult<Json> {
        self.ensure(Operation::Update)?;
        let existing = self
            .store
            .get(&self.meta, &Value::parse_pk(pk))
            .await?
            .ok_or_else(|| self.not_found(pk))?;
        let pk = existing.pk(&self.meta).clone();

        let present: Vec<String> = fields
            .iter()
            .filter(|name| payload.contains_key(name.as_str()))
            .cloned()
            .collect();
        let (mut record, links) = self.convert(payload, &present, false).await?;
        record.set(&self.meta.pk, pk.clone());
        self.store.save(&self.meta, &record).await?;
        self.reconcile(&pk, links, false).await?;
        self.fetch_detail(&pk).await
    }

    /// Converts `fields` of `payload`, collecting every field error.
    /// Many-to-many values are returned apart from the row.
    async fn convert(
        &self,
        payload: &Map<String, Json>,
        fields: &[String],
        creating: bool,
    ) -> AdminResult<(Record, Vec<(Arc<FieldControl>, Vec<Value>)>)> {
        let mut record = Record::new();
        let mut links = Vec::new();
        let mut errors = ValidationError::new();
        for name in fields {
            let control = self.registry.control(name)?;
            let converted = control
                .to_storage(self.store.as_ref(), payload.get(name), creating)
                .await?;
            match converted {
                Ok(value) if control.field().is_many_to_many() => {
                    let keys = match value {
                        Value::List(keys) => keys,
                        Value::Null => Vec::new(),
                        key => vec![key],
                    };
                    links.push((control, keys));
                }
                Ok(value) => record.set(control.column(), value),
                Err(error) => errors.push(name, error),
            }
        }
        errors.into_result()?;
        Ok((record, links))
    }

    async fn reconcile(
        &self,
        pk: &Value,
        links: Vec<(Arc<FieldControl>, Vec<Value>)>,
        creating: bool,
    ) -> AdminResult<()> {
        for (control, keys) in links {
            if let Some(relation) = control.relation() {
                relation
                    .reconcile(self.store.as_ref(), pk, &keys, creating)
                    .await?;
            }
        }
        Ok(())
    }

    async fn fetch_detail(&self, pk: &Value) -> AdminResult<Json> {
        let query = Query::new(&self.meta.name)
            .filter(Q::filter(&self.meta.pk, Lookup::Exact(pk.clone())))
            .limit(1);
        let query = self.eager_load(query, &self.detail_fields)?;
        let row = self
            .store
            .fetch(&self.meta, &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| self.not_found(&pk.to_string()))?;
        self.serialize(&row, &self.detail_fields)
    }

    fn not_found(&self, pk: &str) -> AdminError {
        AdminError::NotFound(format!("{} with pk '{pk}' does not exist", self.meta.verbose_name))
    }

    fn eager_load(&self, mut query: Query, names: &[String]) -> AdminResult<Query> {
        for name in names {
            if let Some(relation) = self.registry.control(name)?.relation() {
                query = relation.eager_load(query);
            }
        }
        Ok(query)
    }

    /// Renders `names` of `row`; the `pk` pseudo-field is always included.
    fn serialize(&self, row: &Record, names: &[String]) -> AdminResult<Json> {
        let mut out = Map::new();
        out.insert(PK_FIELD.to_string(), row.pk(&self.meta).to_json());
        for name in names {
            let control = self.registry.control(name)?;
            out.insert(name.clone(), control.to_wire(row));
        }
        Ok(Json::Object(out))
    }

    fn search_filter(&self, keywords: Option<&str>) -> Option<Q> {
        let keywords = keywords.map(str::trim).filter(|k| !k.is_empty())?;
        self.admin
            .search_fields
            .iter()
            .map(|name| {
                let column = if name == PK_FIELD { &self.meta.pk } else { name };
                Q::filter(column, Lookup::IContains(keywords.to_string()))
            })
            .reduce(|a, b| a | b)
    }

    fn ordering(&self, params: &ListParams) -> AdminResult<Vec<String>> {
        let mut specs = Vec::new();
        if let Some(order_by) = params.order_by.as_deref().filter(|s| !s.is_empty()) {
            if !self.list_display.iter().any(|n| n == order_by) {
                return Err(AdminError::field("orderBy", format!("Cannot sort by '{order_by}'.")));
            }
            let control = self.registry.control(order_by)?;
            if control.kind().is_relation() {
                return Err(AdminError::field("orderBy", format!("Cannot sort by '{order_by}'.")));
            }
            let desc = params
                .order_dir
                .as_deref()
                .is_some_and(|d| d.eq_ignore_ascii_case("desc"));
            specs.push(format!("{}{}", if desc { "-" } else { "" }, control.column()));
        } else {
            for spec in &self.admin.ordering {
                let (sign, name) = spec
                    .strip_prefix('-')
                    .map_or(("", spec.as_str()), |rest| ("-", rest));
                let column = if name == PK_FIELD { self.meta.pk.as_str() } else { name };
                specs.push(format!("{sign}{column}"));
            }
        }
        if !specs.iter().any(|s| s.trim_start_matches('-') == self.meta.pk) {
            specs.push(self.meta.pk.clone());
        }
        Ok(specs)
    }
}

impl std::fmt::Debug for ModelAdminEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAdminEngine")
            .field("resource", &self.admin.resource)
            .field("model", &self.meta.name)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn configuration(resource: &str, list: &str, err: &AdminError) -> AdminError {
    match err {
        AdminError::Configuration(msg) => {
            AdminError::Configuration(format!("Resource '{resource}', {list}: {msg}"))
        }
        other => AdminError::Configuration(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amis_admin_db::{FieldDef, FieldType, InMemoryStore, StoreCall};
    use serde_json::json;

    fn catalog() -> Arc<ModelCatalog> {
        let mut catalog = ModelCatalog::new();
        catalog
            .register(ModelMeta::new("tag").field(FieldDef::new("name", FieldType::ShortText)))
            .unwrap();
        catalog
            .register(
                ModelMeta::new("note")
                    .field(FieldDef::new("title", FieldType::ShortText).max_length(40))
                    .field(FieldDef::new("body", FieldType::LongText).nullable())
                    .field(FieldDef::new("rank", FieldType::Integer).default(0))
                    .field(FieldDef::new("tags", FieldType::ManyToMany { to: "tag".into() })),
            )
            .unwrap();
        Arc::new(catalog)
    }

    fn engine_with(admin: ModelAdmin) -> (ModelAdminEngine, InMemoryStore) {
        let store = InMemoryStore::new();
        let engine = ModelAdminEngine::new(
            admin,
            catalog(),
            Arc::new(store.clone()),
            Arc::new(Settings::default()),
        )
        .unwrap();
        (engine, store)
    }

    fn payload(value: Json) -> Map<String, Json> {
        match value {
            Json::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_default_field_lists() {
        let (engine, _) = engine_with(ModelAdmin::new("note"));
        assert_eq!(engine.list_display(), ["pk", "title", "body", "rank", "tags"]);
        assert_eq!(engine.create_fields(), ["title", "body", "rank", "tags"]);
        assert_eq!(engine.update_fields(), engine.create_fields());
        assert_eq!(engine.base_url(), "/admin/note");
        assert_eq!(engine.title(), "note");
    }

    #[test]
    fn test_unknown_field_fails_at_construction() {
        let err = ModelAdminEngine::new(
            ModelAdmin::new("note").update_fields(vec!["title", "missing"]),
            catalog(),
            Arc::new(InMemoryStore::new()),
            Arc::new(Settings::default()),
        )
        .unwrap_err();
        assert!(matches!(err, AdminError::Configuration(ref m) if m.contains("missing")));
    }

    #[test]
    fn test_inline_relation_fails_at_construction() {
        let err = ModelAdminEngine::new(
            ModelAdmin::new("note").inline_fields(vec!["tags"]),
            catalog(),
            Arc::new(InMemoryStore::new()),
            Arc::new(Settings::default()),
        )
        .unwrap_err();
        assert!(matches!(err, AdminError::Configuration(_)));
    }

    #[test]
    fn test_generated_pk_cannot_be_created() {
        let result = ModelAdminEngine::new(
            ModelAdmin::new("note").create_fields(vec!["pk", "title"]),
            catalog(),
            Arc::new(InMemoryStore::new()),
            Arc::new(Settings::default()),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_collects_every_error() {
        let (engine, store) = engine_with(
            ModelAdmin::new("note").create_fields(vec!["title", "rank"]),
        );
        let err = engine
            .create(&payload(json!({"rank": "many"})))
            .await
            .unwrap_err();
        let AdminError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.get("title").is_some());
        assert!(errors.get("rank").is_some());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_saves_once_then_links() {
        let (engine, store) = engine_with(ModelAdmin::new("note"));
        let tag_meta = catalog().require("tag").unwrap();
        for name in ["a", "b"] {
            store
                .insert(&tag_meta, Record::from_pairs([("name", name)]))
                .await
                .unwrap();
        }
        store.clear_calls();

        let row = engine
            .create(&payload(json!({"title": "Hello", "tags": [1, 2]})))
            .await
            .unwrap();
        assert_eq!(row["pk"], 1);
        assert_eq!(row["rank"], 0);
        assert_eq!(row["tags"].as_array().map(Vec::len), Some(2));

        let calls = store.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], StoreCall::Insert { .. }));
        assert!(matches!(calls[1], StoreCall::RelatedAdd { .. }));
    }

    #[tokio::test]
    async fn test_update_leaves_absent_fields() {
        let (engine, _) = engine_with(ModelAdmin::new("note"));
        engine
            .create(&payload(json!({"title": "One", "body": "text"})))
            .await
            .unwrap();
        let row = engine
            .update("1", &payload(json!({"title": "Two"})))
            .await
            .unwrap();
        assert_eq!(row["title"], "Two");
        assert_eq!(row["body"], "text");
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let (engine, _) = engine_with(ModelAdmin::new("note"));
        let err = engine
            .update("9", &payload(json!({"title": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_disabled_operation_touches_nothing() {
        let (engine, store) =
            engine_with(ModelAdmin::new("note").operations(vec![Operation::List]));
        let err = engine
            .create(&payload(json!({"title": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::PermissionDenied(_)));
        assert!(matches!(
            engine.delete("1").await,
            Err(AdminError::PermissionDenied(_))
        ));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_search_and_order() {
        let (engine, _) = engine_with(
            ModelAdmin::new("note")
                .list_display(vec!["pk", "title"])
                .search_fields(vec!["title"])
                .ordering(vec!["-pk"]),
        );
        for title in ["alpha", "beta", "alphabet"] {
            engine
                .create(&payload(json!({"title": title})))
                .await
                .unwrap();
        }
        let page = engine
            .list(&ListParams {
                keywords: Some("ALPHA".into()),
                ..ListParams::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0]["title"], "alphabet");

        let sorted = engine
            .list(&ListParams {
                order_by: Some("title".into()),
                order_dir: Some("asc".into()),
                ..ListParams::default()
            })
            .await
            .unwrap();
        assert_eq!(sorted.items[0]["title"], "alpha");

        let bad = engine
            .list(&ListParams {
                order_by: Some("body".into()),
                ..ListParams::default()
            })
            .await;
        assert!(matches!(bad, Err(AdminError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_many_and_absent() {
        let (engine, _) = engine_with(ModelAdmin::new("note"));
        for title in ["a", "b", "c"] {
            engine
                .create(&payload(json!({"title": title})))
                .await
                .unwrap();
        }
        assert_eq!(engine.delete("1, 3").await.unwrap(), 2);
        assert_eq!(engine.delete("1").await.unwrap(), 0);
        assert!(matches!(
            engine.delete(" , ").await,
            Err(AdminError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_select_options_requires_relation() {
        let (engine, _) = engine_with(ModelAdmin::new("note"));
        let err = engine
            .select_options("title", &OptionsRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::NotFound(_)));
        let page = engine
            .select_options("tags", &OptionsRequest::default())
            .await
            .unwrap();
        assert_eq!(page, OptionsPage::All { options: vec![] });
    }
}
