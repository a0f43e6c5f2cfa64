use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use m2mapi::{Client, GeoPoint, SearchCriteria, Workflow, WorkflowReport};
use tracing_subscriber::EnvFilter;

/// Search the USGS M2M catalog for a scene around a point and request its download URL.
#[derive(Parser, Debug)]
#[command(name = "m2m-search", version)]
struct Args {
    /// Dataset to search
    #[arg(long, default_value = "landsat_8_c1")]
    dataset: String,

    /// Latitude of the search point in decimal degrees
    #[arg(long, default_value_t = 34.0, allow_negative_numbers = true)]
    lat: f64,

    /// Longitude of the search point in decimal degrees
    #[arg(long, default_value_t = -118.0, allow_negative_numbers = true)]
    lon: f64,

    /// API base URL (overrides M2M_API_URL and .m2mrc)
    #[arg(long)]
    url: Option<String>,

    /// API token (overrides M2M_API_TOKEN and .m2mrc)
    #[arg(long)]
    token: Option<String>,

    /// Stop before the dataset search when the status check fails
    #[arg(long)]
    halt_on_status_failure: bool,

    /// Fetch the scene to this path once a download URL is issued
    #[arg(long, value_name = "PATH")]
    download: Option<PathBuf>,

    /// Hide the download progress bar
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let client = Client::new(args.url, args.token, None)?.with_progress(!args.no_progress);
    let criteria = SearchCriteria::new(args.dataset, GeoPoint::new(args.lat, args.lon));
    let report = Workflow::new(&client, criteria)
        .halt_on_status_failure(args.halt_on_status_failure)
        .run();

    print_report(&report)?;

    if let (Some(target), Some(handle)) = (args.download, report.download_handle()) {
        let path = client.download(handle, &target)?;
        println!("Saved scene to {}", path.display());
    }

    Ok(())
}

fn print_report(report: &WorkflowReport) -> Result<()> {
    match &report.status {
        Ok(status) => println!("API is online: {}", status.body),
        Err(e) => println!("Failed to connect: {e}"),
    }

    match &report.datasets {
        Some(Ok(listing)) => println!(
            "Available datasets: {}",
            serde_json::to_string_pretty(listing)?
        ),
        Some(Err(e)) => println!("Dataset search failed: {e}"),
        None => return Ok(()),
    }

    match &report.scene {
        Some(Ok(scene)) => println!("Found scene ID: {}", scene.entity_id),
        Some(Err(e)) => println!("Image search failed: {e}"),
        None => {}
    }

    match &report.download {
        Some(Ok(handle)) => println!("Download URL: {}", handle.url),
        Some(Err(e)) => println!("Download request failed: {e}"),
        None => {}
    }

    Ok(())
}
