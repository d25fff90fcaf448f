//! Farm → Field → Zone hierarchy.
//!
//! Fields and zones live in flat, fixed-capacity arenas indexed by
//! generated handles; parent/child relations are handle-based rather
//! than pointer-based, so the tree is acyclic by construction and cheap
//! to walk. A `node_id → zone` map lets the mesh dispatcher resolve
//! which zone a physical device reading belongs to.
//!
//! The irrigating flag and the per-field active counter are owned by the
//! [`coordinator`](crate::coordinator): mutators are `pub(crate)` so no
//! outside component can bypass admission control.

pub mod loader;

use heapless::{FnvIndexMap, Vec};
use serde::{Deserialize, Serialize};

use crate::error::HierarchyError;

/// Maximum fields per farm.
pub const MAX_FIELDS: usize = 8;
/// Maximum zones across the whole farm.
pub const MAX_ZONES: usize = 32;
/// Maximum physical node → zone bindings.
pub const MAX_NODE_BINDINGS: usize = 32;

/// Hierarchy identifier (field or zone), fixed capacity.
pub type HierarchyId = heapless::String<24>;

/// Display label for farm/field/zone records.
pub type DisplayName = heapless::String<32>;

/// Handle into the field arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldHandle(u8);

/// Handle into the zone arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneHandle(u8);

// ═══════════════════════════════════════════════════════════════
//  Records
// ═══════════════════════════════════════════════════════════════

/// Root scope: one farm per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Farm {
    pub id: HierarchyId,
    pub name: DisplayName,
    pub total_acres: f32,
    /// Cumulative water budget in litres; 0 means unlimited.
    pub water_allocation_l: f32,
}

impl Default for Farm {
    fn default() -> Self {
        Self {
            id: HierarchyId::new(),
            name: DisplayName::new(),
            total_acres: 0.0,
            water_allocation_l: 0.0,
        }
    }
}

/// A resource-sharing scope containing zones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub id: HierarchyId,
    pub display_name: DisplayName,
    pub acres: f32,
    pub crop_type: heapless::String<16>,
    /// How many zones under this field may irrigate at once.
    pub max_concurrent_zones: u8,
    /// Water budget in litres; 0 means unlimited.
    pub water_allocation_l: f32,
    /// Litres drawn so far, reported back by the actuation side.
    water_used_l: f32,
    /// Currently irrigating zones. Coordinator-owned.
    active_zones: u8,
}

impl Field {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: truncate_str(id),
            display_name: truncate_str(display_name),
            acres: 0.0,
            crop_type: heapless::String::new(),
            max_concurrent_zones: 2,
            water_allocation_l: 0.0,
            water_used_l: 0.0,
            active_zones: 0,
        }
    }

    pub fn active_zones(&self) -> u8 {
        self.active_zones
    }

    pub fn water_used_l(&self) -> f32 {
        self.water_used_l
    }

    /// Whether a configured water allocation has been used up.
    pub fn allocation_exhausted(&self) -> bool {
        self.water_allocation_l > 0.0 && self.water_used_l >= self.water_allocation_l
    }
}

/// Smallest irrigable unit; the admission subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: HierarchyId,
    pub display_name: DisplayName,
    pub acres: f32,
    pub priority: u8,
    /// Non-owning back-reference to the parent field.
    field: FieldHandle,
    /// Coordinator-owned activation flag.
    irrigating: bool,
    water_used_l: f32,
}

impl Zone {
    pub fn new(id: &str, display_name: &str, acres: f32, priority: u8) -> Self {
        Self {
            id: truncate_str(id),
            display_name: truncate_str(display_name),
            acres,
            priority,
            field: FieldHandle(0), // assigned on insertion
            irrigating: false,
            water_used_l: 0.0,
        }
    }

    pub fn field(&self) -> FieldHandle {
        self.field
    }

    pub fn is_irrigating(&self) -> bool {
        self.irrigating
    }

    pub fn water_used_l(&self) -> f32 {
        self.water_used_l
    }
}

// ═══════════════════════════════════════════════════════════════
//  Hierarchy arena
// ═══════════════════════════════════════════════════════════════

/// The whole deployment tree plus node bindings.
#[derive(Debug, Default)]
pub struct FieldHierarchy {
    farm: Farm,
    fields: Vec<Field, MAX_FIELDS>,
    zones: Vec<Zone, MAX_ZONES>,
    node_to_zone: FnvIndexMap<u32, u8, MAX_NODE_BINDINGS>,
    farm_water_used_l: f32,
}

impl FieldHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_farm(&mut self, farm: Farm) {
        self.farm = farm;
    }

    pub fn farm(&self) -> &Farm {
        &self.farm
    }

    pub fn add_field(&mut self, field: Field) -> Result<FieldHandle, HierarchyError> {
        if self.find_field(&field.id).is_some() {
            return Err(HierarchyError::DuplicateId);
        }
        if self.fields.is_full() {
            return Err(HierarchyError::TableFull);
        }
        let handle = FieldHandle(self.fields.len() as u8);
        let _ = self.fields.push(field);
        Ok(handle)
    }

    pub fn add_zone(
        &mut self,
        field: FieldHandle,
        mut zone: Zone,
    ) -> Result<ZoneHandle, HierarchyError> {
        if usize::from(field.0) >= self.fields.len() {
            return Err(HierarchyError::UnknownField);
        }
        if self.find_zone(&zone.id).is_some() {
            return Err(HierarchyError::DuplicateId);
        }
        if self.zones.is_full() {
            return Err(HierarchyError::TableFull);
        }
        zone.field = field;
        let handle = ZoneHandle(self.zones.len() as u8);
        let _ = self.zones.push(zone);
        Ok(handle)
    }

    /// Bind a physical mesh node to a zone.
    pub fn assign_node(&mut self, node_id: u32, zone_id: &str) -> Result<(), HierarchyError> {
        let handle = self.find_zone(zone_id).ok_or(HierarchyError::UnknownZone)?;
        self.node_to_zone
            .insert(node_id, handle.0)
            .map_err(|_| HierarchyError::TableFull)?;
        Ok(())
    }

    // ── Lookups ───────────────────────────────────────────────

    pub fn field(&self, handle: FieldHandle) -> Option<&Field> {
        self.fields.get(usize::from(handle.0))
    }

    pub fn zone(&self, handle: ZoneHandle) -> Option<&Zone> {
        self.zones.get(usize::from(handle.0))
    }

    pub fn find_field(&self, id: &str) -> Option<FieldHandle> {
        self.fields
            .iter()
            .position(|f| f.id.as_str() == id)
            .map(|i| FieldHandle(i as u8))
    }

    pub fn find_zone(&self, id: &str) -> Option<ZoneHandle> {
        self.zones
            .iter()
            .position(|z| z.id.as_str() == id)
            .map(|i| ZoneHandle(i as u8))
    }

    /// Resolve which zone a physical device reading belongs to.
    pub fn zone_by_node(&self, node_id: u32) -> Option<ZoneHandle> {
        self.node_to_zone.get(&node_id).map(|i| ZoneHandle(*i))
    }

    /// Handles of every zone under `field`.
    pub fn zones_in_field(
        &self,
        field: FieldHandle,
    ) -> impl Iterator<Item = ZoneHandle> + '_ {
        self.zones
            .iter()
            .enumerate()
            .filter(move |(_, z)| z.field == field)
            .map(|(i, _)| ZoneHandle(i as u8))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn farm_water_used_l(&self) -> f32 {
        self.farm_water_used_l
    }

    pub fn farm_allocation_exhausted(&self) -> bool {
        self.farm.water_allocation_l > 0.0
            && self.farm_water_used_l >= self.farm.water_allocation_l
    }

    // ── Coordinator-owned mutation ────────────────────────────

    /// Flip a zone's irrigating flag, keeping the parent field's active
    /// counter in sync. No-op when the flag already matches.
    pub(crate) fn mark_irrigating(&mut self, handle: ZoneHandle, on: bool) {
        let Some(zone) = self.zones.get_mut(usize::from(handle.0)) else {
            return;
        };
        if zone.irrigating == on {
            return;
        }
        zone.irrigating = on;
        let field_idx = usize::from(zone.field.0);
        if let Some(field) = self.fields.get_mut(field_idx) {
            field.active_zones = if on {
                field.active_zones.saturating_add(1)
            } else {
                field.active_zones.saturating_sub(1)
            };
        }
    }

    /// Account reported water usage against zone, field, and farm.
    pub(crate) fn add_water_used(&mut self, handle: ZoneHandle, liters: f32) {
        let Some(zone) = self.zones.get_mut(usize::from(handle.0)) else {
            return;
        };
        zone.water_used_l += liters;
        let field_idx = usize::from(zone.field.0);
        if let Some(field) = self.fields.get_mut(field_idx) {
            field.water_used_l += liters;
        }
        self.farm_water_used_l += liters;
    }
}

/// Copy `s` into a fixed-capacity string, truncating on a char boundary
/// if it does not fit (the wire format carries fixed-width fields).
pub(crate) fn truncate_str<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
