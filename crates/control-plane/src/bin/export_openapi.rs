// Export the OpenAPI document as JSON
//
// Usage: cargo run -p outreach-control-plane --bin export-openapi > openapi.json

use outreach_control_plane::openapi::ApiDoc;

fn main() -> Result<(), serde_json::Error> {
    println!("{}", ApiDoc::to_json()?);
    Ok(())
}
