//! # Elasticsearch Client
//!
//! [`SearchService`] over the cluster's REST API. One `reqwest::Client` (one
//! connection pool) is shared by every request of a run.
//!
//! | Call           | Request                                                     |
//! |----------------|-------------------------------------------------------------|
//! | `submit`       | `POST /<index>/_eql/search?wait_for_completion_timeout=<t>` |
//! | `poll_status`  | `GET /_eql/search/status/<id>`                              |
//! | `fetch_result` | `GET /_eql/search/<id>`                                     |
//! | `list_indices` | `GET /_cat/indices/<pattern>`                               |
//! | `health`       | `GET /_cat/health`                                          |

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Url};
use serde_json::Value;

use ef_core::{IndexName, JobHandle, JobStatus, QueryDocument, ResultPayload, SubmitResponse};

use crate::client::SearchService;
use crate::credentials::Credentials;
use crate::{FanoutError, Result};

/// Default per-request timeout. Inline submissions and catalog listings on
/// large clusters can take minutes.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(360);

pub struct ElasticClient {
    http: reqwest::Client,
    base: Url,
    authorization: String,
}

impl ElasticClient {
    pub fn new(base_url: &str, credentials: &Credentials, request_timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| FanoutError::Url {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(FanoutError::Url {
                url: base_url.to_string(),
                reason: "not a hierarchical URL".into(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base,
            authorization: credentials.authorization(),
        })
    }

    /// Base URL with `segments` appended, each percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| FanoutError::Url {
                url: self.base.to_string(),
                reason: "cannot append path segments".into(),
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, endpoint: &Url) -> Result<reqwest::Response> {
        let response = request
            .header(AUTHORIZATION, &self.authorization)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("{} -> {}", endpoint.path(), status);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(FanoutError::Status {
            endpoint: endpoint.path().to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json(&self, segments: &[&str]) -> Result<Value> {
        let url = self.endpoint(segments)?;
        let response = self.send(self.http.get(url.clone()), &url).await?;
        Ok(response.json().await?)
    }

    async fn get_text(&self, segments: &[&str]) -> Result<String> {
        let url = self.endpoint(segments)?;
        let response = self.send(self.http.get(url.clone()), &url).await?;
        Ok(response.text().await?)
    }
}

#[async_trait::async_trait]
impl SearchService for ElasticClient {
    async fn submit(
        &self,
        index: &IndexName,
        query: &QueryDocument,
        inline_timeout: &str,
    ) -> Result<SubmitResponse> {
        let url = self.endpoint(&[index.as_str(), "_eql", "search"])?;
        let request = self
            .http
            .post(url.clone())
            .query(&[("wait_for_completion_timeout", inline_timeout)])
            .json(query.as_value());
        let raw: Value = self.send(request, &url).await?.json().await?;
        Ok(SubmitResponse::classify(raw)?)
    }

    async fn poll_status(&self, handle: &JobHandle) -> Result<JobStatus> {
        let raw = self
            .get_json(&["_eql", "search", "status", handle.as_str()])
            .await?;
        Ok(JobStatus::from_value(raw)?)
    }

    async fn fetch_result(&self, handle: &JobHandle) -> Result<ResultPayload> {
        let raw = self.get_json(&["_eql", "search", handle.as_str()]).await?;
        Ok(ResultPayload(raw))
    }

    async fn list_indices(&self, pattern: &str) -> Result<String> {
        self.get_text(&["_cat", "indices", pattern]).await
    }

    async fn health(&self) -> Result<String> {
        Ok(self.get_text(&["_cat", "health"]).await?.trim().to_string())
    }
}
