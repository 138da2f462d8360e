//! Flattens a nested JSON document into records with a schema, without
//! touching the network.
//!
//! Run with: `cargo run --example extract_records`

use flatfetch_core::{extract, Getter, JsonSchema};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flatfetch=debug".into()),
        )
        .init();

    let document = json!({
        "result": [
            {"s": "BTCUSD", "p": "42000.5", "vol": {"base": "1200", "quote": "50400000"}},
            {"s": "ETHUSD", "p": "2200.0", "vol": {"base": "9000", "quote": "19800000"}},
        ]
    });

    let schema = JsonSchema::new()
        .field("symbol", "s")
        .field("price", "p")
        .field("base_volume", "vol.base")
        .field(
            "venue",
            Getter::computed(|_document, _record| Some(json!("example"))),
        );

    for record in extract(&document, Some("result"), Some(&schema))? {
        println!("{}", serde_json::to_string(&record)?);
    }

    Ok(())
}
