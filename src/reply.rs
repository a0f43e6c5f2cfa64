use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Stage, StageError};

/// Every M2M response wraps its payload in `data`, alongside error fields that
/// are set when the request was accepted but could not be served.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiReply<T> {
    pub(crate) data: Option<T>,
    #[serde(default)]
    pub(crate) error_code: Option<String>,
    #[serde(default)]
    pub(crate) error_message: Option<String>,
}

impl<T> ApiReply<T> {
    pub(crate) fn message(&self) -> Option<String> {
        match (&self.error_code, &self.error_message) {
            (Some(code), Some(msg)) => Some(format!("{code}: {msg}")),
            (None, Some(msg)) => Some(msg.clone()),
            (Some(code), None) => Some(code.clone()),
            (None, None) => None,
        }
    }
}

/// Results stay untyped so that only the entry actually used has to be well formed.
#[derive(Debug, Deserialize)]
pub(crate) struct SceneSearchData {
    #[serde(default)]
    pub(crate) results: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SceneResult {
    pub(crate) entity_id: String,
    #[serde(default)]
    pub(crate) display_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DownloadData {
    #[serde(default)]
    pub(crate) download_url: Option<String>,
}

/// Entity identifier of a scene found by a search, tied to the dataset it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneReference {
    pub entity_id: String,
    pub dataset: String,
    pub display_id: Option<String>,
}

impl SceneReference {
    pub fn new(entity_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            dataset: dataset.into(),
            display_id: None,
        }
    }
}

/// URL returned by a download request. Expiry is decided by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadHandle {
    pub url: String,
}

/// Decoded body of a successful status check.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceStatus {
    pub body: serde_json::Value,
}

pub(crate) fn decode<T: DeserializeOwned>(
    stage: Stage,
    body: &str,
) -> Result<T, StageError> {
    serde_json::from_str(body).map_err(|source| StageError::Decode {
        stage,
        body: body.to_string(),
        source,
    })
}

pub(crate) fn scene_from_reply(
    reply: ApiReply<SceneSearchData>,
    dataset: &str,
) -> Result<SceneReference, StageError> {
    let message = reply.message();
    let first = reply
        .data
        .and_then(|d| d.results)
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| StageError::NoScenes {
            dataset: dataset.to_string(),
            message,
        })?;

    let body = first.to_string();
    let first: SceneResult =
        serde_json::from_value(first).map_err(|source| StageError::Decode {
            stage: Stage::SceneSearch,
            body,
            source,
        })?;

    Ok(SceneReference {
        entity_id: first.entity_id,
        dataset: dataset.to_string(),
        display_id: first.display_id,
    })
}

pub(crate) fn handle_from_reply(
    reply: ApiReply<DownloadData>,
    entity_id: &str,
) -> Result<DownloadHandle, StageError> {
    let message = reply.message();
    reply
        .data
        .and_then(|d| d.download_url)
        .filter(|url| !url.trim().is_empty())
        .map(|url| DownloadHandle { url })
        .ok_or_else(|| StageError::NoDownloadUrl {
            entity_id: entity_id.to_string(),
            message,
        })
}
