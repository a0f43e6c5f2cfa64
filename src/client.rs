use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::load_config;
use crate::criteria::{DownloadRequest, GeoPoint, SearchCriteria};
use crate::error::{Stage, StageError};
use crate::reply::{
    ApiReply, DownloadData, DownloadHandle, SceneReference, SceneSearchData, ServiceStatus,
    decode, handle_from_reply, scene_from_reply,
};
use crate::util::urljoin;

const AUTH_HEADER: &str = "X-Auth-Token";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base M2M URL, typically `https://m2m.cr.usgs.gov/api/api/json/stable/`.
    pub url: String,
    /// Static API token sent as `X-Auth-Token` on every catalog request.
    pub token: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
    /// Per-request timeout. `None` blocks until the server answers.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    token: HeaderValue,
    pub(crate) progress: bool,
    pub(crate) http: HttpClient,
}

impl Client {
    /// Creates a client using environment variables and/or `.m2mrc`.
    ///
    /// This is equivalent to `Client::new(None, None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`token` arguments
    /// - environment variables `M2M_API_URL` / `M2M_API_TOKEN`
    /// - config file from `M2M_RC` or `.m2mrc`
    pub fn new(url: Option<String>, token: Option<String>, verify: Option<bool>) -> Result<Self> {
        let cfg = load_config(url, token, verify)?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: ClientConfig) -> Result<Self> {
        let mut token = HeaderValue::from_str(cfg.token.trim())
            .context("API token contains characters that are not allowed in an HTTP header")?;
        token.set_sensitive(true);

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("m2mapi-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("m2mapi-rs")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(cfg.timeout);

        if !cfg.verify {
            warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            url: cfg.url,
            token,
            progress: true,
            http,
        })
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// Asks the catalog whether it is online.
    pub fn check_service_status(&self) -> Result<ServiceStatus, StageError> {
        let stage = Stage::Status;
        let url = self.endpoint(stage);
        let body = self.send(stage, &url, self.http.get(&url))?;
        let body: Value = decode(stage, &body)?;
        info!("service is online");
        Ok(ServiceStatus { body })
    }

    /// Lists datasets matching `dataset_name`. The listing is returned as-is.
    pub fn search_datasets(&self, dataset_name: &str) -> Result<Value, StageError> {
        let stage = Stage::DatasetSearch;
        let url = self.endpoint(stage);
        let req = self.http.get(&url).query(&[("datasetName", dataset_name)]);
        let body = self.send(stage, &url, req)?;
        let listing: Value = decode(stage, &body)?;
        info!(dataset = dataset_name, "dataset search succeeded");
        Ok(listing)
    }

    /// Searches for scenes inside the criteria's bounding box and returns the first one.
    pub fn search_scenes(&self, criteria: &SearchCriteria) -> Result<SceneReference, StageError> {
        let stage = Stage::SceneSearch;
        let url = self.endpoint(stage);
        let req = self.http.post(&url).json(&criteria.to_request());
        let body = self.send(stage, &url, req)?;
        let reply: ApiReply<SceneSearchData> = decode(stage, &body)?;

        match scene_from_reply(reply, &criteria.dataset) {
            Ok(scene) => {
                info!(entity_id = %scene.entity_id, dataset = %scene.dataset, "found scene");
                Ok(scene)
            }
            Err(e) => {
                warn!(dataset = %criteria.dataset, "{e}");
                Err(e)
            }
        }
    }

    pub fn search_scenes_at(
        &self,
        dataset_name: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<SceneReference, StageError> {
        let criteria = SearchCriteria::new(dataset_name, GeoPoint::new(latitude, longitude));
        self.search_scenes(&criteria)
    }

    /// Requests a download URL for a scene, using the dataset the scene was found in.
    pub fn request_download(&self, scene: &SceneReference) -> Result<DownloadHandle, StageError> {
        let stage = Stage::DownloadRequest;
        let url = self.endpoint(stage);
        let payload = DownloadRequest {
            dataset_name: &scene.dataset,
            entity_id: &scene.entity_id,
        };
        let body = self.send(stage, &url, self.http.post(&url).json(&payload))?;
        let reply: ApiReply<DownloadData> = decode(stage, &body)?;

        match handle_from_reply(reply, &scene.entity_id) {
            Ok(handle) => {
                info!(entity_id = %scene.entity_id, url = %handle.url, "download URL issued");
                Ok(handle)
            }
            Err(e) => {
                warn!(entity_id = %scene.entity_id, "{e}");
                Err(e)
            }
        }
    }

    fn endpoint(&self, stage: Stage) -> String {
        urljoin(&self.url, stage.endpoint())
    }

    /// Sends one authenticated request. Only HTTP 200 counts as success; the body
    /// is returned as text either way.
    fn send(&self, stage: Stage, url: &str, req: RequestBuilder) -> Result<String, StageError> {
        debug!(%stage, url, "sending request");

        let transport = |source| StageError::Transport {
            stage,
            url: url.to_string(),
            source,
        };

        let resp = req
            .header(AUTH_HEADER, self.token.clone())
            .send()
            .map_err(transport)?;
        let status = resp.status();
        let body = resp.text().map_err(transport)?;

        if status != StatusCode::OK {
            warn!(%stage, %status, "request failed");
            return Err(StageError::Http {
                stage,
                status,
                body,
            });
        }

        Ok(body)
    }
}
