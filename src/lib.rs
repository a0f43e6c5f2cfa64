//! A small Rust client for the USGS Machine-to-Machine (M2M) API.
//!
//! This crate implements a four-step search flow:
//! check the service status, look up a dataset, search for a scene around a point,
//! then request a download URL for the scene that was found.
//!
//! ## Quick start
//! - Configure authentication via environment variables (`M2M_API_URL`, `M2M_API_TOKEN`) or a
//!   `.m2mrc` file (supported in the current directory and in your home directory).
//! - Build a [`SearchCriteria`] and hand it to a [`Workflow`], or call the
//!   [`Client`] stages yourself.
//!
//! ```no_run
//! use anyhow::Result;
//! use m2mapi::{Client, GeoPoint, SearchCriteria, Workflow};
//!
//! fn main() -> Result<()> {
//!     let client = Client::from_env()?;
//!     let criteria = SearchCriteria::new("landsat_8_c1", GeoPoint::new(34.0, -118.0));
//!     let report = Workflow::new(&client, criteria).run();
//!     if let Some(handle) = report.download_handle() {
//!         println!("{}", handle.url);
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod client;
mod config;
mod criteria;
mod download;
mod error;
mod reply;
mod util;
mod workflow;

pub use client::{Client, ClientConfig};
pub use config::DEFAULT_API_URL;
pub use criteria::{BoundingBox, GeoPoint, MAX_RESULTS, SEARCH_MARGIN_DEG, SearchCriteria};
pub use error::{Stage, StageError};
pub use reply::{DownloadHandle, SceneReference, ServiceStatus};
pub use workflow::{Workflow, WorkflowReport};
