//! Site registry and router generation.
//!
//! [`AdminSite`] maps resource names to their [`ModelAdminEngine`]s. It is
//! built once at startup, then turned into an axum [`Router`] that serves
//! the page schemas and the CRUD endpoints under `settings.api_prefix`.
//! There is no runtime re-registration: [`AdminSite::into_router`] consumes
//! the site.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Map, Value as Json};
use tower_http::trace::TraceLayer;

use amis_admin_core::{AdminError, AdminResult, Settings};
use amis_admin_db::Value;

use crate::api::{failure, respond};
use crate::engine::{ListParams, ModelAdminEngine};
use crate::relation::OptionsRequest;

/// The registry of admin resources.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use amis_admin::model_admin::ModelAdmin;
/// use amis_admin::engine::ModelAdminEngine;
/// use amis_admin::site::AdminSite;
/// use amis_admin_core::Settings;
/// use amis_admin_db::{FieldDef, FieldType, InMemoryStore, ModelCatalog, ModelMeta};
///
/// let mut catalog = ModelCatalog::new();
/// catalog.register(ModelMeta::new("tag").field(FieldDef::new("name", FieldType::ShortText))).unwrap();
/// let settings = Arc::new(Settings::default());
/// let engine = ModelAdminEngine::new(
///     ModelAdmin::new("tag"),
///     Arc::new(catalog),
///     Arc::new(InMemoryStore::new()),
///     Arc::clone(&settings),
/// ).unwrap();
///
/// let mut site = AdminSite::new(settings);
/// site.register(engine).unwrap();
/// assert!(site.get("tag").is_some());
/// let router = site.into_router();
/// ```
pub struct AdminSite {
    settings: Arc<Settings>,
    engines: BTreeMap<String, Arc<ModelAdminEngine>>,
}

impl AdminSite {
    /// Creates an empty site.
    pub const fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            engines: BTreeMap::new(),
        }
    }

    /// The site settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Registers an engine under its resource name. Names must be unique.
    pub fn register(&mut self, engine: ModelAdminEngine) -> AdminResult<()> {
        let name = engine.resource().to_string();
        if self.engines.contains_key(&name) {
            return Err(AdminError::Configuration(format!(
                "Resource '{name}' is already registered"
            )));
        }
        tracing::info!(resource = %name, model = %engine.meta().name, "registered admin resource");
        self.engines.insert(name, Arc::new(engine));
        Ok(())
    }

    /// Returns the engine registered under `resource`.
    pub fn get(&self, resource: &str) -> Option<Arc<ModelAdminEngine>> {
        self.engines.get(resource).cloned()
    }

    /// Returns the engine registered under `resource`, or a not-found error.
    pub fn lookup(&self, resource: &str) -> AdminResult<Arc<ModelAdminEngine>> {
        self.get(resource)
            .ok_or_else(|| AdminError::NotFound(format!("Unknown resource '{resource}'")))
    }

    /// Registered resource names in sorted order.
    pub fn resources(&self) -> Vec<&str> {
        self.engines.keys().map(String::as_str).collect()
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// The index payload: site title plus one entry per resource.
    pub fn index(&self) -> Json {
        let resources: Vec<Json> = self
            .engines
            .values()
            .map(|engine| {
                json!({
                    "name": engine.resource(),
                    "title": engine.title(),
                    "api": format!("{}/", engine.base_url()),
                    "schema": format!("{}/schema", engine.base_url()),
                })
            })
            .collect();
        json!({"title": self.settings.site_title, "resources": resources})
    }

    /// Generates the axum router.
    ///
    /// Routes, relative to `settings.api_prefix`:
    ///
    /// - `GET /` - site index
    /// - `GET /{resource}/schema` - page schema
    /// - `GET /{resource}/` - list (`page`, `perPage`, `keywords`, `orderBy`, `orderDir`)
    /// - `POST /{resource}/` - create
    /// - `GET /{resource}/options/{field}` - relation options (`pk`, `page`, `perPage`, `term`)
    /// - `GET /{resource}/{pk}` - read
    /// - `PUT /{resource}/{pk}` - update
    /// - `PATCH /{resource}/{pk}` - inline update
    /// - `DELETE /{resource}/{pk}` - delete, comma-joined keys allowed
    pub fn into_router(self) -> Router {
        let prefix = self.settings.api_prefix.trim_end_matches('/').to_string();
        let state = Arc::new(self);
        Router::new()
            .route(&format!("{prefix}/"), get(handle_index))
            .route(&format!("{prefix}/{{resource}}/schema"), get(handle_schema))
            .route(
                &format!("{prefix}/{{resource}}/"),
                get(handle_list).post(handle_create),
            )
            .route(
                &format!("{prefix}/{{resource}}/options/{{field}}"),
                get(handle_options),
            )
            .route(
                &format!("{prefix}/{{resource}}/{{pk}}"),
                get(handle_read)
                    .put(handle_update)
                    .patch(handle_patch)
                    .delete(handle_delete),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

impl std::fmt::Debug for AdminSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSite")
            .field("api_prefix", &self.settings.api_prefix)
            .field("resources", &self.resources().join(", "))
            .finish()
    }
}

type SiteState = State<Arc<AdminSite>>;

// ── Query parameters ───────────────────────────────────────────────

/// Raw list parameters. amis fills unset template variables with empty
/// strings, so everything arrives as text and blanks mean "unset".
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page: Option<String>,
    per_page: Option<String>,
    keywords: Option<String>,
    order_by: Option<String>,
    order_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsQuery {
    pk: Option<String>,
    page: Option<String>,
    per_page: Option<String>,
    term: Option<String>,
}

fn text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Blank means unset; anything else must be a whole number.
fn number(name: &str, raw: Option<String>) -> AdminResult<Option<usize>> {
    text(raw)
        .map(|s| {
            s.parse()
                .map_err(|_| AdminError::field(name, "Enter a whole number."))
        })
        .transpose()
}

impl TryFrom<ListQuery> for ListParams {
    type Error = AdminError;

    fn try_from(q: ListQuery) -> AdminResult<Self> {
        Ok(Self {
            page: number("page", q.page)?,
            per_page: number("perPage", q.per_page)?,
            keywords: text(q.keywords),
            order_by: text(q.order_by),
            order_dir: text(q.order_dir),
        })
    }
}

impl TryFrom<OptionsQuery> for OptionsRequest {
    type Error = AdminError;

    fn try_from(q: OptionsQuery) -> AdminResult<Self> {
        Ok(Self {
            pk: text(q.pk).map(|pk| Value::parse_pk(&pk)),
            page: number("page", q.page)?,
            per_page: number("perPage", q.per_page)?,
            term: text(q.term),
        })
    }
}

fn parse_payload(body: &[u8]) -> AdminResult<Map<String, Json>> {
    if body.is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Json>(body)? {
        Json::Object(map) => Ok(map),
        _ => Err(AdminError::Serialization(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

// ── Handlers ───────────────────────────────────────────────────────

async fn handle_index(State(site): SiteState) -> Response {
    respond(Ok(site.index()))
}

async fn handle_schema(State(site): SiteState, Path(resource): Path<String>) -> Response {
    respond(
        site.lookup(&resource)
            .and_then(|engine| engine.page_schema().cloned()),
    )
}

async fn handle_list(
    State(site): SiteState,
    Path(resource): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response {
    let engine = match site.lookup(&resource) {
        Ok(engine) => engine,
        Err(e) => return failure(&e),
    };
    let params = match ListParams::try_from(query) {
        Ok(params) => params,
        Err(e) => return failure(&e),
    };
    respond(engine.list(&params).await)
}

async fn handle_create(
    State(site): SiteState,
    Path(resource): Path<String>,
    body: Bytes,
) -> Response {
    let (engine, payload) = match site
        .lookup(&resource)
        .and_then(|engine| Ok((engine, parse_payload(&body)?)))
    {
        Ok(parts) => parts,
        Err(e) => return failure(&e),
    };
    respond(engine.create(&payload).await)
}

async fn handle_read(
    State(site): SiteState,
    Path((resource, pk)): Path<(String, String)>,
) -> Response {
    let engine = match site.lookup(&resource) {
        Ok(engine) => engine,
        Err(e) => return failure(&e),
    };
    respond(engine.read(&pk).await)
}

async fn handle_update(
    State(site): SiteState,
    Path((resource, pk)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let (engine, payload) = match site
        .lookup(&resource)
        .and_then(|engine| Ok((engine, parse_payload(&body)?)))
    {
        Ok(parts) => parts,
        Err(e) => return failure(&e),
    };
    respond(engine.update(&pk, &payload).await)
}

async fn handle_patch(
    State(site): SiteState,
    Path((resource, pk)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let (engine, payload) = match site
        .lookup(&resource)
        .and_then(|engine| Ok((engine, parse_payload(&body)?)))
    {
        Ok(parts) => parts,
        Err(e) => return failure(&e),
    };
    respond(engine.patch(&pk, &payload).await)
}

async fn handle_delete(
    State(site): SiteState,
    Path((resource, pk)): Path<(String, String)>,
) -> Response {
    let engine = match site.lookup(&resource) {
        Ok(engine) => engine,
        Err(e) => return failure(&e),
    };
    respond(engine.delete(&pk).await.map(|deleted| json!({"deleted": deleted})))
}

async fn handle_options(
    State(site): SiteState,
    Path((resource, field)): Path<(String, String)>,
    Query(query): Query<OptionsQuery>,
) -> Response {
    let engine = match site.lookup(&resource) {
        Ok(engine) => engine,
        Err(e) => return failure(&e),
    };
    let request = match OptionsRequest::try_from(query) {
        Ok(request) => request,
        Err(e) => return failure(&e),
    };
    respond(engine.select_options(&field, &request).await)
}
