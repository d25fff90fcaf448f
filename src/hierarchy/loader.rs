//! Farm configuration loader.
//!
//! Builds a [`FieldHierarchy`] from the deployment's JSON document:
//!
//! ```json
//! {
//!   "farm": {
//!     "id": "willow_creek",
//!     "name": "Willow Creek Farm",
//!     "fields": [
//!       {
//!         "id": "north_40",
//!         "display_name": "North 40",
//!         "acres": 40.0,
//!         "crop": { "type": "corn" },
//!         "zones": [
//!           { "id": "zone_01", "display_name": "NE Corner",
//!             "acres": 10.0, "priority": 5, "nodes": [4097] }
//!         ]
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! Transport is the caller's concern; this module only parses a string
//! already read from SD, flash, or a provisioning packet.

use log::{info, warn};
use serde::Deserialize;

use crate::config::IrrigationConfig;
use crate::error::{Error, Result};

use super::{truncate_str, Farm, Field, FieldHierarchy, Zone};

// ── Document shape ────────────────────────────────────────────

#[derive(Deserialize)]
struct FarmDoc {
    farm: FarmSection,
}

#[derive(Deserialize)]
struct FarmSection {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    total_acres: f32,
    #[serde(default)]
    water_allocation_l: f32,
    #[serde(default)]
    fields: Vec<FieldDoc>,
}

#[derive(Deserialize)]
struct FieldDoc {
    id: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    acres: f32,
    #[serde(default)]
    crop: CropDoc,
    #[serde(default)]
    max_concurrent_zones: Option<u8>,
    #[serde(default)]
    water_allocation_l: f32,
    #[serde(default)]
    zones: Vec<ZoneDoc>,
}

#[derive(Deserialize, Default)]
struct CropDoc {
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Deserialize)]
struct ZoneDoc {
    id: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    acres: f32,
    #[serde(default)]
    priority: u8,
    /// Mesh node IDs actuating this zone.
    #[serde(default)]
    nodes: Vec<u32>,
}

// ── Loader ────────────────────────────────────────────────────

/// Parse a farm configuration document into a [`FieldHierarchy`].
///
/// Fields that do not configure `max_concurrent_zones` inherit
/// `config.default_max_concurrent_zones`. Capacity overruns and
/// duplicate identifiers fail the whole load; a half-built hierarchy is
/// worse than a visible provisioning error.
pub fn load_farm_config(json: &str, config: &IrrigationConfig) -> Result<FieldHierarchy> {
    let doc: FarmDoc = serde_json::from_str(json).map_err(|e| {
        warn!("Farm configuration parse error: {}", e);
        Error::Config("invalid farm configuration JSON")
    })?;

    let mut hierarchy = FieldHierarchy::new();
    hierarchy.set_farm(Farm {
        id: truncate_str(&doc.farm.id),
        name: truncate_str(&doc.farm.name),
        total_acres: doc.farm.total_acres,
        water_allocation_l: doc.farm.water_allocation_l,
    });

    for field_doc in &doc.farm.fields {
        let mut field = Field::new(&field_doc.id, &field_doc.display_name);
        field.acres = field_doc.acres;
        field.crop_type = truncate_str(&field_doc.crop.kind);
        field.water_allocation_l = field_doc.water_allocation_l;
        field.max_concurrent_zones = field_doc
            .max_concurrent_zones
            .unwrap_or(config.default_max_concurrent_zones);
        let handle = hierarchy.add_field(field)?;

        for zone_doc in &field_doc.zones {
            let zone = Zone::new(
                &zone_doc.id,
                &zone_doc.display_name,
                zone_doc.acres,
                zone_doc.priority,
            );
            hierarchy.add_zone(handle, zone)?;
            for node_id in &zone_doc.nodes {
                hierarchy.assign_node(*node_id, &zone_doc.id)?;
            }
        }
    }

    info!(
        "Loaded farm configuration: {} fields, {} zones",
        hierarchy.field_count(),
        hierarchy.zone_count()
    );
    Ok(hierarchy)
}
