//! Writes the OpenAPI document for the credit API to a file.
//!
//! Usage: `cargo run --bin generate_openapi [output-path]` (defaults to `openapi.json`).

use rust_credit_api::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());

    let document = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(&output, document)?;

    println!("OpenAPI document written to {}", output);
    Ok(())
}
