//! amis page schema for one resource.
//!
//! The page is `{type: "page", title, body: [...]}`. Its body holds a
//! create button (when creation is enabled) and a `crud` table whose
//! columns, row actions, bulk actions and quick-save API follow the
//! resource's field lists and enabled operations.

use serde_json::{json, Value as Json};

use amis_admin_core::AdminResult;

use crate::engine::ModelAdminEngine;
use crate::model_admin::Operation;

/// Builds the page schema of `engine`.
pub fn page(engine: &ModelAdminEngine) -> AdminResult<Json> {
    let mut body = Vec::new();
    if engine.allows(Operation::Create) {
        body.push(create_button(engine)?);
    }
    body.push(crud(engine)?);
    Ok(json!({
        "type": "page",
        "title": engine.title(),
        "body": body,
    }))
}

fn form_items(engine: &ModelAdminEngine, names: &[String]) -> AdminResult<Vec<Json>> {
    names
        .iter()
        .map(|name| Ok(engine.control(name)?.edit_control().to_json()))
        .collect()
}

fn create_button(engine: &ModelAdminEngine) -> AdminResult<Json> {
    Ok(json!({
        "type": "button",
        "label": "Create",
        "level": "primary",
        "actionType": "dialog",
        "dialog": {
            "title": format!("Create {}", engine.title()),
            "size": "lg",
            "body": {
                "type": "form",
                "api": format!("post:{}/", engine.base_url()),
                "body": form_items(engine, engine.create_fields())?,
            },
        },
    }))
}

fn crud(engine: &ModelAdminEngine) -> AdminResult<Json> {
    let base = engine.base_url();
    let can_update = engine.allows(Operation::Update);
    let can_delete = engine.allows(Operation::Delete);

    let mut columns = Vec::new();
    for name in engine.list_display() {
        let control = engine.control(name)?;
        let column = if can_update && engine.inline_fields().contains(name) {
            control.inline_column()?.to_json()
        } else {
            control.read_column().to_json()
        };
        columns.push(column);
    }

    let mut buttons = Vec::new();
    if can_update {
        buttons.push(json!({
            "type": "button",
            "icon": "fa fa-pencil",
            "tooltip": "Edit",
            "actionType": "dialog",
            "dialog": {
                "title": format!("Edit {}", engine.title()),
                "size": "lg",
                "body": {
                    "type": "form",
                    "initApi": format!("get:{base}/${{pk}}"),
                    "api": format!("put:{base}/${{pk}}"),
                    "body": form_items(engine, engine.update_fields())?,
                },
            },
        }));
    }
    if can_delete {
        buttons.push(json!({
            "type": "button",
            "icon": "fa fa-times text-danger",
            "tooltip": "Delete",
            "actionType": "ajax",
            "confirmText": "Delete this row?",
            "api": format!("delete:{base}/${{pk}}"),
        }));
    }
    if !buttons.is_empty() {
        columns.push(json!({
            "type": "operation",
            "label": "Actions",
            "fixed": "right",
            "buttons": buttons,
        }));
    }

    let mut crud = json!({
        "type": "crud",
        "name": engine.resource(),
        "api": format!(
            "get:{base}/?page=${{page}}&perPage=${{perPage}}&keywords=${{keywords}}&orderBy=${{orderBy}}&orderDir=${{orderDir}}"
        ),
        "syncLocation": false,
        "primaryField": "pk",
        "perPage": engine.settings().clamp_per_page(engine.admin().list_per_page),
        "columns": columns,
        "headerToolbar": ["reload", "bulkActions", {"type": "columns-toggler", "align": "right"}],
        "footerToolbar": ["statistics", "switch-per-page", "pagination"],
    });

    if can_delete {
        crud["bulkActions"] = json!([{
            "label": "Delete selected",
            "actionType": "ajax",
            "confirmText": "Delete the selected rows?",
            "api": format!("delete:{base}/${{ids|raw}}"),
        }]);
    }
    if can_update && !engine.inline_fields().is_empty() {
        crud["quickSaveItemApi"] = json!(format!("patch:{base}/${{pk}}"));
    }
    if !engine.admin().search_fields.is_empty() {
        crud["filter"] = json!({
            "title": "",
            "mode": "inline",
            "wrapWithPanel": false,
            "body": [{
                "type": "input-text",
                "name": "keywords",
                "placeholder": "Search",
                "clearable": true,
                "addOn": {"type": "submit", "label": "Search", "level": "primary"},
            }],
        });
    }
    Ok(crud)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use amis_admin_core::Settings;
    use amis_admin_db::{FieldDef, FieldType, InMemoryStore, ModelCatalog, ModelMeta};

    use crate::model_admin::{ModelAdmin, Operation};

    use super::*;

    fn engine(admin: ModelAdmin) -> ModelAdminEngine {
        let mut catalog = ModelCatalog::new();
        catalog
            .register(
                ModelMeta::new("post")
                    .field(FieldDef::new("title", FieldType::ShortText))
                    .field(FieldDef::new("views", FieldType::Integer).default(0)),
            )
            .unwrap();
        ModelAdminEngine::new(
            admin,
            Arc::new(catalog),
            Arc::new(InMemoryStore::new()),
            Arc::new(Settings::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_full_page() {
        let e = engine(
            ModelAdmin::new("post")
                .title("Posts")
                .inline_fields(vec!["views"])
                .search_fields(vec!["title"]),
        );
        let page = e.page_schema().unwrap();
        assert_eq!(page["type"], "page");
        assert_eq!(page["title"], "Posts");
        assert_eq!(page["body"][0]["dialog"]["body"]["api"], "post:/admin/post/");

        let crud = &page["body"][1];
        assert_eq!(crud["type"], "crud");
        assert_eq!(crud["quickSaveItemApi"], "patch:/admin/post/${pk}");
        assert_eq!(crud["primaryField"], "pk");
        assert_eq!(crud["perPage"], 10);
        assert!(crud["api"].as_str().unwrap().starts_with("get:/admin/post/?page="));
        assert!(crud.get("filter").is_some());
        assert!(crud.get("bulkActions").is_some());

        let columns = crud["columns"].as_array().unwrap();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[2]["name"], "views");
        assert!(columns[2].get("quickEdit").is_some());
        assert!(columns[1].get("quickEdit").is_none());
        assert_eq!(columns[3]["type"], "operation");
    }

    #[test]
    fn test_read_only_page() {
        let e = engine(ModelAdmin::new("post").operations(vec![Operation::List]));
        let page = e.page_schema().unwrap();
        let body = page["body"].as_array().unwrap();
        assert_eq!(body.len(), 1);
        let crud = &body[0];
        assert!(crud.get("quickSaveItemApi").is_none());
        assert!(crud.get("bulkActions").is_none());
        let columns = crud["columns"].as_array().unwrap();
        assert!(columns.iter().all(|c| c["type"] != "operation"));
    }

    #[test]
    fn test_schema_is_memoized() {
        let e = engine(ModelAdmin::new("post"));
        assert!(std::ptr::eq(e.page_schema().unwrap(), e.page_schema().unwrap()));
    }
}
