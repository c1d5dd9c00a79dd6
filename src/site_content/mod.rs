//! Editable copy and media blocks addressed by (section, key).

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use diesel::pg::upsert::excluded;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::core::error::{ApiError, ApiJson, ApiQuery};
use crate::core::shared::schema::site_content;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{with_conn, DbPool};
use crate::core::urls::ApiUrls;
use crate::security::validation::ValidationResult;

pub const CONTENT_TYPES: &[&str] = &["text", "image", "json"];

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = site_content)]
#[serde(rename_all = "camelCase")]
pub struct SiteContent {
    pub id: i32,
    pub section: String,
    pub key: String,
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = site_content)]
struct NewSiteContent {
    section: String,
    key: String,
    value: Option<String>,
    content_type: String,
}

/// `value` may be a string or, for structured blocks, any JSON value; the
/// latter is stored as its JSON text.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertContentRequest {
    pub section: String,
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
}

impl UpsertContentRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = ValidationResult::new();
        v.required("section", &self.section)
            .required("key", &self.key)
            .one_of("type", self.content_type.as_deref(), CONTENT_TYPES);
        if self.value.is_null() {
            v.add_error("value", "is required");
        }
        v.into_result()
    }

    pub fn stored_value(&self) -> String {
        match &self.value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentQuery {
    pub section: Option<String>,
    pub key: Option<String>,
}

pub struct SiteContentStore {
    db: DbPool,
}

impl SiteContentStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: ContentQuery) -> Result<Vec<SiteContent>, ApiError> {
        with_conn(&self.db, move |conn| {
            let mut rows = site_content::table
                .select(SiteContent::as_select())
                .into_boxed();

            if let Some(section) = query.section.filter(|s| !s.is_empty()) {
                rows = rows.filter(site_content::section.eq(section));
            }
            if let Some(key) = query.key.filter(|k| !k.is_empty()) {
                rows = rows.filter(site_content::key.eq(key));
            }

            Ok(rows
                .order((site_content::section.asc(), site_content::key.asc()))
                .load(conn)?)
        })
        .await
    }

    pub async fn upsert(
        &self,
        section: String,
        key: String,
        value: String,
        content_type: String,
    ) -> Result<SiteContent, ApiError> {
        let new = NewSiteContent {
            section,
            key,
            value: Some(value),
            content_type,
        };

        with_conn(&self.db, move |conn| {
            Ok(diesel::insert_into(site_content::table)
                .values(&new)
                .on_conflict((site_content::section, site_content::key))
                .do_update()
                .set((
                    site_content::value.eq(excluded(site_content::value)),
                    site_content::content_type.eq(excluded(site_content::content_type)),
                    site_content::updated_at.eq(Utc::now()),
                ))
                .returning(SiteContent::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn delete(&self, section: String, key: String) -> Result<(), ApiError> {
        with_conn(&self.db, move |conn| {
            let deleted = diesel::delete(
                site_content::table
                    .filter(site_content::section.eq(section))
                    .filter(site_content::key.eq(key)),
            )
            .execute(conn)?;
            if deleted == 0 {
                return Err(ApiError::not_found("Site content"));
            }
            Ok(())
        })
        .await
    }
}

// ============================================================================
// HTTP HANDLERS
// ============================================================================

pub async fn list_content(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ContentQuery>,
) -> Result<Json<Vec<SiteContent>>, ApiError> {
    let store = SiteContentStore::new(state.conn.clone());
    Ok(Json(store.list(query).await?))
}

pub async fn upsert_content(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<UpsertContentRequest>,
) -> Result<Json<SiteContent>, ApiError> {
    req.validate()?;
    let store = SiteContentStore::new(state.conn.clone());
    let value = req.stored_value();
    let content = store
        .upsert(
            req.section,
            req.key,
            value,
            req.content_type.unwrap_or_else(|| "text".to_string()),
        )
        .await?;

    info!("Site content {}/{} updated", content.section, content.key);
    Ok(Json(content))
}

pub async fn delete_content(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ContentQuery>,
) -> Result<StatusCode, ApiError> {
    let mut v = ValidationResult::new();
    v.required("section", query.section.as_deref().unwrap_or_default())
        .required("key", query.key.as_deref().unwrap_or_default());
    v.into_result()?;

    let store = SiteContentStore::new(state.conn.clone());
    store
        .delete(query.section.unwrap_or_default(), query.key.unwrap_or_default())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_site_content_routes() -> Router<Arc<AppState>> {
    Router::new().route(ApiUrls::SITE_CONTENT, get(list_content))
}

pub fn configure_site_content_admin_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        ApiUrls::ADMIN_SITE_CONTENT,
        get(list_content).put(upsert_content).delete(delete_content),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_request_uses_type_key() {
        let request: UpsertContentRequest = serde_json::from_value(serde_json::json!({
            "section": "hero",
            "key": "title",
            "value": "Learn anything",
            "type": "text"
        }))
        .expect("deserialize");
        assert_eq!(request.content_type.as_deref(), Some("text"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_upsert_request_rejects_unknown_type_and_blank_key() {
        let request = UpsertContentRequest {
            section: "hero".into(),
            key: " ".into(),
            value: serde_json::Value::String(String::new()),
            content_type: Some("video".into()),
        };
        match request.validate() {
            Err(ApiError::Validation(fields)) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].field, "key");
                assert_eq!(fields[1].field, "type");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_structured_value_is_stored_as_json_text() {
        let request: UpsertContentRequest = serde_json::from_value(serde_json::json!({
            "section": "home",
            "key": "stats",
            "value": { "students": 1200, "courses": [1, 2] },
            "type": "json"
        }))
        .expect("deserialize");
        assert!(request.validate().is_ok());

        let stored: serde_json::Value =
            serde_json::from_str(&request.stored_value()).expect("json text");
        assert_eq!(stored["students"], 1200);
        assert_eq!(stored["courses"][1], 2);

        let text: UpsertContentRequest = serde_json::from_value(serde_json::json!({
            "section": "hero",
            "key": "title",
            "value": "Learn anything"
        }))
        .expect("deserialize");
        assert_eq!(text.stored_value(), "Learn anything");
    }

    #[test]
    fn test_missing_value_is_a_field_error() {
        let request: UpsertContentRequest =
            serde_json::from_value(serde_json::json!({ "section": "hero", "key": "title" }))
                .expect("deserialize");
        match request.validate() {
            Err(ApiError::Validation(fields)) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "value");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_content_serializes_type_field() {
        let now = Utc::now();
        let content = SiteContent {
            id: 1,
            section: "hero".into(),
            key: "image".into(),
            value: Some("/img/hero.png".into()),
            content_type: "image".into(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&content).expect("serialize");
        assert_eq!(json["type"], "image");
        assert!(json.get("contentType").is_none());
    }
}
