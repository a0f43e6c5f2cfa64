use anyhow::Result;
use m2mapi::{Client, GeoPoint, SearchCriteria};

fn main() -> Result<()> {
    // Calls the stages one at a time instead of going through `Workflow`.
    // Configure authentication via env vars or a `.m2mrc` file.
    let client = Client::from_env()?;

    let status = client.check_service_status()?;
    println!("status: {}", status.body);

    let criteria = SearchCriteria::new("landsat_8_c1", GeoPoint::new(34.0, -118.0));
    let scene = client.search_scenes(&criteria)?;
    println!("scene: {}", scene.entity_id);

    let handle = client.request_download(&scene)?;
    println!("download: {}", handle.url);
    Ok(())
}
