//! Qdrant vector store over the REST API
//!
//! Points carry `page_content`, a `metadata` object (`source`, `page` and any
//! extra chunk metadata), the insertion time in microseconds and a content
//! hash. Equal scores are ordered by insertion time on the way out; an
//! overwritten point keeps the insertion time of its first write.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::providers::{MetadataFilter, UpsertFailure, UpsertReport, VectorStoreGateway};
use crate::types::{EmbeddingRecord, SearchResult};

/// Qdrant-backed vector store
pub struct QdrantVectorStore {
    client: Client,
    base_url: String,
}

impl QdrantVectorStore {
    pub fn new(config: &VectorDbConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            headers.insert(
                "api-key",
                HeaderValue::from_str(key.trim())
                    .map_err(|_| Error::Config("Invalid Qdrant API key".to_string()))?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build Qdrant HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn collection_url(&self, collection: &str, path: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, collection, path)
    }

    async fn send(&self, collection: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(Error::from_store_request)?;
        check_status(collection, response).await
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        collection: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(collection, request).await?;
        let envelope: QdrantResponse<T> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                Error::ExternalServiceTimeout {
                    service: "vector-store".to_string(),
                }
            } else {
                Error::VectorStore(format!("Invalid Qdrant response: {}", e))
            }
        })?;
        Ok(envelope.result)
    }

    /// Configured vector size of an existing collection
    async fn collection_dimensions(&self, collection: &str) -> Result<usize> {
        let info: CollectionInfo = self
            .send_json(collection, self.client.get(self.collection_url(collection, "")))
            .await?;
        Ok(info.config.params.vectors.size)
    }

    /// Insertion times of the points that already exist, keyed by point id
    async fn insertion_times(&self, collection: &str, ids: &[String]) -> Result<HashMap<String, i64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let body = json!({ "ids": ids, "with_payload": ["inserted_at"], "with_vector": false });
        let points: Vec<StoredPoint> = self
            .send_json(
                collection,
                self.client.post(self.collection_url(collection, "/points")).json(&body),
            )
            .await?;

        Ok(points
            .into_iter()
            .filter_map(|p| Some((p.id.as_str()?.to_string(), p.payload.inserted_at?)))
            .collect())
    }

    async fn upsert_one(&self, collection: &str, record: &EmbeddingRecord, inserted_at: i64) -> Result<()> {
        let body = json!({ "points": [point_body(record, inserted_at)] });
        self.send(
            collection,
            self.client
                .put(self.collection_url(collection, "/points?wait=true"))
                .json(&body),
        )
        .await?;
        Ok(())
    }
}

async fn check_status(collection: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(match status {
        StatusCode::NOT_FOUND => Error::CollectionNotFound(collection.to_string()),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            Error::StoreUnavailable(format!("Qdrant returned {}: {}", status, body))
        }
        _ => Error::VectorStore(format!("Qdrant request failed ({}): {}", status, body)),
    })
}

/// Point body for one record
fn point_body(record: &EmbeddingRecord, inserted_at: i64) -> Value {
    let chunk = &record.chunk;
    let mut metadata = Map::new();
    for (key, value) in &chunk.extra_metadata {
        metadata.insert(key.clone(), Value::String(value.clone()));
    }
    metadata.insert("source".to_string(), json!(chunk.source_id));
    metadata.insert("page".to_string(), json!(chunk.page));

    json!({
        "id": chunk.point_id().to_string(),
        "vector": record.vector,
        "payload": {
            "page_content": chunk.text,
            "metadata": metadata,
            "inserted_at": inserted_at,
            "content_hash": chunk.content_hash(),
        }
    })
}

/// More tied points may exist past a full page whose last score equals the
/// score at the `top_k` cut
fn tie_crosses_cut(points: &[ScoredPoint], top_k: usize, limit: usize) -> bool {
    if top_k == 0 || points.len() < limit || points.len() <= top_k {
        return false;
    }
    let boundary = points[top_k - 1].score;
    points.last().map_or(false, |last| last.score >= boundary)
}

/// Qdrant filter clause, `None` when nothing is filtered
fn filter_body(filter: &MetadataFilter) -> Option<Value> {
    let mut must = Vec::new();
    if let Some(source) = &filter.source {
        must.push(json!({ "key": "metadata.source", "match": { "value": source } }));
    }
    if let Some(page) = filter.page {
        must.push(json!({ "key": "metadata.page", "match": { "value": page } }));
    }
    if must.is_empty() {
        None
    } else {
        Some(json!({ "must": must }))
    }
}

fn search_body(
    query_vector: &[f32],
    limit: usize,
    score_threshold: f32,
    filter: &MetadataFilter,
) -> Value {
    let mut body = json!({
        "vector": query_vector,
        "limit": limit,
        "with_payload": true,
        "score_threshold": score_threshold,
    });
    if let Some(filter) = filter_body(filter) {
        body["filter"] = filter;
    }
    body
}

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Debug, Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Debug, Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

#[derive(Debug, Deserialize)]
struct VectorParams {
    size: usize,
}

#[derive(Debug, Deserialize)]
struct StoredPoint {
    id: Value,
    #[serde(default)]
    payload: InsertionPayload,
}

#[derive(Debug, Default, Deserialize)]
struct InsertionPayload {
    #[serde(default)]
    inserted_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: usize,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: PointPayload,
}

#[derive(Debug, Default, Deserialize)]
struct PointPayload {
    #[serde(default)]
    page_content: String,
    #[serde(default)]
    metadata: PointMetadata,
    #[serde(default)]
    inserted_at: i64,
}

#[derive(Debug, Default, Deserialize)]
struct PointMetadata {
    #[serde(default)]
    source: String,
    #[serde(default)]
    page: u32,
}

/// Drop non-positive scores and order by score, then insertion time
fn into_results(mut points: Vec<ScoredPoint>, top_k: usize) -> Vec<SearchResult> {
    points.retain(|p| p.score > 0.0);
    points.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.payload.inserted_at.cmp(&b.payload.inserted_at))
    });
    points.truncate(top_k);
    points
        .into_iter()
        .map(|p| SearchResult {
            text: p.payload.page_content,
            page: p.payload.metadata.page,
            source: p.payload.metadata.source,
            score: p.score,
        })
        .collect()
}

#[async_trait]
impl VectorStoreGateway for QdrantVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        if self.collection_exists(name).await? {
            tracing::debug!("Collection '{}' already exists", name);
            return Ok(());
        }

        let body = json!({ "vectors": { "size": dimensions, "distance": "Cosine" } });
        self.send(name, self.client.put(self.collection_url(name, "")).json(&body))
            .await?;
        tracing::info!("Created Qdrant collection '{}' ({} dimensions)", name, dimensions);
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: &[EmbeddingRecord]) -> Result<UpsertReport> {
        let dimensions = self.collection_dimensions(collection).await?;
        let ids: Vec<String> = records
            .iter()
            .filter(|r| r.vector.len() == dimensions)
            .map(|r| r.chunk.point_id().to_string())
            .collect();
        let existing = self.insertion_times(collection, &ids).await?;

        let mut report = UpsertReport::default();
        let mut last_stamp = 0i64;

        for record in records {
            let label = record.chunk.label();
            let outcome = if record.vector.len() != dimensions {
                Err(Error::DimensionMismatch {
                    collection: collection.to_string(),
                    expected: dimensions,
                    actual: record.vector.len(),
                })
            } else {
                let inserted_at = match existing.get(&record.chunk.point_id().to_string()) {
                    Some(&first) => first,
                    None => {
                        // Strictly increasing within a batch
                        last_stamp = chrono::Utc::now().timestamp_micros().max(last_stamp + 1);
                        last_stamp
                    }
                };
                self.upsert_one(collection, record, inserted_at).await
            };

            match outcome {
                Ok(()) => report.succeeded.push(label),
                Err(error) => {
                    tracing::warn!("Failed to upsert {}: {}", label, error);
                    report.failed.push(UpsertFailure { item: label, error });
                }
            }
        }

        Ok(report)
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
        score_threshold: f32,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        // Fetch past the cut until the tie group at the boundary is complete
        let mut limit = top_k.saturating_add(1);
        loop {
            let body = search_body(query_vector, limit, score_threshold, filter);
            let response = self
                .send_json(
                    collection,
                    self.client
                        .post(self.collection_url(collection, "/points/search"))
                        .json(&body),
                )
                .await;
            let points: Vec<ScoredPoint> = match response {
                Ok(points) => points,
                Err(Error::CollectionNotFound(_)) => {
                    tracing::debug!("Search in missing collection '{}'", collection);
                    return Ok(Vec::new());
                }
                Err(e) => return Err(e),
            };

            if !tie_crosses_cut(&points, top_k, limit) {
                return Ok(into_results(points, top_k));
            }
            limit = limit.saturating_mul(2);
            tracing::debug!("Tied scores at the top_k cut, fetching {} points", limit);
        }
    }

    async fn delete(&self, collection: &str, page: u32, source: &str) -> Result<usize> {
        let filter = filter_body(&MetadataFilter {
            source: Some(source.to_string()),
            page: Some(page),
        });

        let counted: CountResult = self
            .send_json(
                collection,
                self.client
                    .post(self.collection_url(collection, "/points/count"))
                    .json(&json!({ "filter": filter, "exact": true })),
            )
            .await?;
        if counted.count == 0 {
            return Ok(0);
        }

        self.send(
            collection,
            self.client
                .post(self.collection_url(collection, "/points/delete?wait=true"))
                .json(&json!({ "filter": filter })),
        )
        .await?;
        Ok(counted.count)
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let response = self
            .client
            .get(self.collection_url(name, ""))
            .send()
            .await
            .map_err(Error::from_store_request)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(name, response).await?;
        Ok(true)
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
