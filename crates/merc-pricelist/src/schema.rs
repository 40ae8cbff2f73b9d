//! Item-schema collaborator seam.
//!
//! The engine keys its catalog by resolved display name, so it needs a
//! way to turn a sku into the name a human (and the remote pricelist)
//! uses. Name resolution is owned by an external schema; this module
//! provides the trait plus a map-backed implementation for tests and
//! simple deployments.

use merc_core::{KillstreakTier, Sku, QUALITY_UNUSUAL};
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for resolving item display names.
pub trait ItemSchema: Send + Sync {
    /// Resolve the display name for a sku. `None` when the item is
    /// unknown to the schema.
    fn display_name(&self, sku: &Sku) -> Option<String>;

    /// Name of a cosmetic effect by id.
    fn effect_name(&self, effect: u32) -> Option<String>;
}

/// Arc wrapper for ItemSchema trait objects.
pub type DynItemSchema = Arc<dyn ItemSchema>;

/// Quality prefix for display names. Unique (6) has none.
fn quality_prefix(quality: u8) -> Option<&'static str> {
    match quality {
        1 => Some("Genuine"),
        3 => Some("Vintage"),
        5 => Some("Unusual"),
        7 => Some("Community"),
        9 => Some("Self-Made"),
        11 => Some("Strange"),
        13 => Some("Haunted"),
        14 => Some("Collector's"),
        _ => None,
    }
}

/// Compose a display name from a base name and the sku's modifiers.
///
/// A resolved effect name replaces the quality-5 "Unusual" prefix, which
/// is what makes specific effect variants distinct catalog names from
/// their generic.
pub fn decorate_name(sku: &Sku, base: &str, effect: Option<&str>) -> String {
    let mut name = String::new();
    if !sku.craftable {
        name.push_str("Non-Craftable ");
    }
    match (sku.quality, effect) {
        (QUALITY_UNUSUAL, Some(effect)) => {
            name.push_str(effect);
            name.push(' ');
        }
        (quality, _) => {
            if let Some(prefix) = quality_prefix(quality) {
                name.push_str(prefix);
                name.push(' ');
            }
        }
    }
    if sku.killstreak != KillstreakTier::None {
        name.push_str(&sku.killstreak.to_string());
        name.push(' ');
    }
    if sku.australium {
        name.push_str("Australium ");
    }
    name.push_str(base);
    name
}

/// Map-backed schema.
#[derive(Debug, Default)]
pub struct MapSchema {
    base_names: HashMap<u32, String>,
    effects: HashMap<u32, String>,
}

impl MapSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, defindex: u32, base_name: impl Into<String>) -> Self {
        self.base_names.insert(defindex, base_name.into());
        self
    }

    pub fn with_effect(mut self, effect: u32, name: impl Into<String>) -> Self {
        self.effects.insert(effect, name.into());
        self
    }
}

impl ItemSchema for MapSchema {
    fn display_name(&self, sku: &Sku) -> Option<String> {
        let base = self.base_names.get(&sku.defindex)?;
        let effect = match sku.effect {
            // An effect variant whose effect id is unknown cannot be
            // named, and an unnameable item cannot be priced.
            Some(id) => Some(self.effect_name(id)?),
            None => None,
        };
        Some(decorate_name(sku, base, effect.as_deref()))
    }

    fn effect_name(&self, effect: u32) -> Option<String> {
        self.effects.get(&effect).cloned()
    }
}
