//! File-backed item schema.
//!
//! Loads base-name and effect tables from a JSON file into the engine's
//! `ItemSchema` seam. The file maps defindexes and effect ids (as JSON
//! object keys) to names:
//!
//! ```json
//! {
//!   "items": { "5021": "Mann Co. Supply Crate Key", "378": "The Team Captain" },
//!   "effects": { "703": "Cool" }
//! }
//! ```

use crate::error::{AppError, AppResult};
use merc_pricelist::MapSchema;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct RawSchemaFile {
    items: HashMap<String, String>,
    #[serde(default)]
    effects: HashMap<String, String>,
}

/// Parse a schema from raw JSON.
pub fn schema_from_json(json: &str) -> AppResult<MapSchema> {
    let raw: RawSchemaFile = serde_json::from_str(json)
        .map_err(|e| AppError::Schema(format!("Failed to parse schema file: {e}")))?;

    let mut schema = MapSchema::new();
    for (defindex, name) in raw.items {
        let defindex: u32 = defindex
            .parse()
            .map_err(|_| AppError::Schema(format!("bad defindex key '{defindex}'")))?;
        schema = schema.with_item(defindex, name);
    }
    for (effect, name) in raw.effects {
        let effect: u32 = effect
            .parse()
            .map_err(|_| AppError::Schema(format!("bad effect key '{effect}'")))?;
        schema = schema.with_effect(effect, name);
    }
    Ok(schema)
}

/// Load the schema from a JSON file on disk.
pub fn load_schema(path: &str) -> AppResult<MapSchema> {
    let content = std::fs::read_to_string(path)?;
    schema_from_json(&content)
}
