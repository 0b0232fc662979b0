//! Collection creation and record deletion

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::LlmBackend;
use crate::error::Result;
use crate::server::state::AppState;

/// Optional token for path-addressed endpoints
#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub collection_name: Option<String>,
}

/// POST /collection/create/:provider/:collection
pub async fn create_collection(
    State(state): State<AppState>,
    Path((provider, collection)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Value>> {
    let handle = state.handle(&LlmBackend {
        llm_provider: provider,
        token: query.token,
        collection_name: Some(collection),
    })?;
    handle.create_collection().await?;

    tracing::info!("Collection '{}' ready for {}", handle.collection(), handle.binding());
    Ok(Json(json!({
        "message": format!("Collection {} created.", handle.collection()),
        "collection": handle.collection(),
        "provider": handle.binding(),
    })))
}

/// DELETE /embeddings/delete/:provider/:page/:source
pub async fn delete_vectors(
    State(state): State<AppState>,
    Path((provider, page, source)): Path<(String, u32, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Value>> {
    let handle = state.handle(&LlmBackend {
        llm_provider: provider,
        token: query.token,
        collection_name: query.collection_name,
    })?;
    let deleted = handle.delete(page, &source).await?;

    Ok(Json(json!({
        "collection": handle.collection(),
        "page": page,
        "source": source,
        "deleted": deleted,
    })))
}

#[cfg(test)]
mod tests {
    use super::super::test_helpers::{app, send};
    use crate::providers::VectorStoreGateway;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_create_collection() {
        let (app, store) = app();
        let (status, body) = send(app.clone(), Method::POST, "/collection/create/gpt4all/manuals", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collection"], "manuals");
        assert_eq!(body["provider"], "gpt4all");
        assert!(store.collection_exists("manuals").await.unwrap());

        let (status, _) = send(app, Method::POST, "/collection/create/gpt4all/manuals", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_rejects_foreign_collection() {
        let (app, _) = app();
        let (status, body) = send(
            app,
            Method::POST,
            "/collection/create/openai/aleph-alpha?token=sk-test",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "binding_mismatch");
    }

    #[tokio::test]
    async fn test_create_requires_token() {
        let (app, _) = app();
        let (status, body) = send(app, Method::POST, "/collection/create/openai/docs", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["type"], "missing_credential");
    }

    #[tokio::test]
    async fn test_delete() {
        let (app, store) = app();
        let (status, body) = send(app.clone(), Method::DELETE, "/embeddings/delete/gpt4all/3/doc.pdf", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "collection_not_found");

        store.create_collection("gpt4all", 384).await.unwrap();
        let (status, body) = send(app, Method::DELETE, "/embeddings/delete/gpt4all/3/doc.pdf", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 0);
        assert_eq!(body["source"], "doc.pdf");
    }
}
