use reqwest::StatusCode;
use std::fmt;

/// One step of the search chain, named after the endpoint it calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Status,
    DatasetSearch,
    SceneSearch,
    DownloadRequest,
}

impl Stage {
    pub fn endpoint(self) -> &'static str {
        match self {
            Stage::Status => "system-status",
            Stage::DatasetSearch => "dataset-search",
            Stage::SceneSearch => "scene-search",
            Stage::DownloadRequest => "download-request",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("{stage}: could not reach {url}: {source}")]
    Transport {
        stage: Stage,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{stage}: HTTP {status}{}\n{body}", hint_for(.status))]
    Http {
        stage: Stage,
        status: StatusCode,
        body: String,
    },

    #[error("{stage}: unexpected response body: {source}\n{body}")]
    Decode {
        stage: Stage,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no scenes found in {dataset} for this location{}", api_message(.message))]
    NoScenes {
        dataset: String,
        message: Option<String>,
    },

    #[error("no download URL returned for {entity_id}{}", api_message(.message))]
    NoDownloadUrl {
        entity_id: String,
        message: Option<String>,
    },
}

impl StageError {
    pub fn stage(&self) -> Stage {
        match self {
            StageError::Transport { stage, .. }
            | StageError::Http { stage, .. }
            | StageError::Decode { stage, .. } => *stage,
            StageError::NoScenes { .. } => Stage::SceneSearch,
            StageError::NoDownloadUrl { .. } => Stage::DownloadRequest,
        }
    }

    /// Raw response body, when the server sent one.
    pub fn body(&self) -> Option<&str> {
        match self {
            StageError::Http { body, .. } | StageError::Decode { body, .. } => Some(body),
            _ => None,
        }
    }
}

fn hint_for(status: &StatusCode) -> &'static str {
    match *status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            " (token rejected: check M2M_API_TOKEN or `token:` in .m2mrc and that it has not expired)"
        }
        StatusCode::NOT_FOUND => " (endpoint not found: check the configured base URL)",
        _ => "",
    }
}

fn api_message(message: &Option<String>) -> String {
    match message.as_deref() {
        Some(m) if !m.is_empty() => format!(" ({m})"),
        _ => String::new(),
    }
}
