use serde_json::Value;
use tracing::{info, warn};

use crate::client::Client;
use crate::criteria::SearchCriteria;
use crate::error::{Stage, StageError};
use crate::reply::{DownloadHandle, SceneReference, ServiceStatus};

/// Runs status check, dataset search, scene search and download request in that order.
///
/// Scene search is the only stage whose failure stops the chain, unless
/// [`Workflow::halt_on_status_failure`] is set, in which case a failed status
/// check stops it too.
#[derive(Debug)]
pub struct Workflow<'a> {
    client: &'a Client,
    criteria: SearchCriteria,
    halt_on_status_failure: bool,
}

/// Outcome of every stage of one run. `None` means the stage was not reached.
#[derive(Debug)]
pub struct WorkflowReport {
    pub status: Result<ServiceStatus, StageError>,
    pub datasets: Option<Result<Value, StageError>>,
    pub scene: Option<Result<SceneReference, StageError>>,
    pub download: Option<Result<DownloadHandle, StageError>>,
}

impl WorkflowReport {
    pub fn is_online(&self) -> bool {
        self.status.is_ok()
    }

    pub fn download_handle(&self) -> Option<&DownloadHandle> {
        self.download.as_ref().and_then(|r| r.as_ref().ok())
    }

    /// The stage that ended the chain, if it did not run to the end.
    pub fn halted_at(&self) -> Option<Stage> {
        if self.datasets.is_none() {
            return Some(Stage::Status);
        }
        match &self.scene {
            Some(Err(_)) => Some(Stage::SceneSearch),
            _ => None,
        }
    }
}

impl<'a> Workflow<'a> {
    pub fn new(client: &'a Client, criteria: SearchCriteria) -> Self {
        Self {
            client,
            criteria,
            halt_on_status_failure: false,
        }
    }

    pub fn halt_on_status_failure(mut self, halt: bool) -> Self {
        self.halt_on_status_failure = halt;
        self
    }

    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    pub fn run(&self) -> WorkflowReport {
        let status = self.client.check_service_status();
        if let Err(e) = &status {
            if self.halt_on_status_failure {
                warn!("status check failed, stopping: {e}");
                return WorkflowReport {
                    status,
                    datasets: None,
                    scene: None,
                    download: None,
                };
            }
            warn!("status check failed, continuing: {e}");
        }

        let datasets = self.client.search_datasets(&self.criteria.dataset);
        let scene = self.client.search_scenes(&self.criteria);

        let download = match &scene {
            Ok(scene) => Some(self.client.request_download(scene)),
            Err(_) => {
                info!("no scene to request, skipping download request");
                None
            }
        };

        WorkflowReport {
            status,
            datasets: Some(datasets),
            scene: Some(scene),
            download,
        }
    }
}
