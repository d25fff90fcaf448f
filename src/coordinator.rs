//! Hierarchical concurrency coordinator.
//!
//! Single source of truth for "may zone Z start irrigating now". The
//! coordinator owns the farm/field/zone tree and is the only writer of
//! the activation state: admission is a check-then-set performed inside
//! one `&mut self` call, so two callers can never both observe "room
//! available" and both be admitted. Hosts that dispatch ticks and
//! inbound commands from different execution contexts must wrap the
//! whole coordinator in one mutual-exclusion boundary.

use log::{info, warn};

use crate::error::AdmissionError;
use crate::hierarchy::{FieldHandle, FieldHierarchy, ZoneHandle};

/// Admission control over simultaneous zone activation.
pub struct HierarchicalCoordinator {
    hierarchy: FieldHierarchy,
}

impl HierarchicalCoordinator {
    pub fn new(hierarchy: FieldHierarchy) -> Self {
        Self { hierarchy }
    }

    /// Read access to the tree (lookups, reporting).
    pub fn hierarchy(&self) -> &FieldHierarchy {
        &self.hierarchy
    }

    /// Request permission to start irrigating `zone_id`.
    ///
    /// Granting marks the zone active and bumps the parent field's
    /// counter. A request for an already-active zone succeeds without
    /// double-counting.
    pub fn request_start(&mut self, zone_id: &str) -> Result<(), AdmissionError> {
        let handle = self
            .hierarchy
            .find_zone(zone_id)
            .ok_or(AdmissionError::UnknownZone)?;
        self.request_start_handle(handle)
    }

    /// Handle-based variant of [`request_start`](Self::request_start).
    pub fn request_start_handle(&mut self, handle: ZoneHandle) -> Result<(), AdmissionError> {
        let zone = self
            .hierarchy
            .zone(handle)
            .ok_or(AdmissionError::UnknownZone)?;

        if zone.is_irrigating() {
            return Ok(()); // idempotent: no double-count
        }

        let field_handle = zone.field();
        let field = self
            .hierarchy
            .field(field_handle)
            .ok_or(AdmissionError::UnknownZone)?;

        if field.active_zones() >= field.max_concurrent_zones {
            info!(
                "Admission denied for {}: field {} at limit ({})",
                zone.id, field.id, field.max_concurrent_zones
            );
            return Err(AdmissionError::FieldConcurrencyLimitReached);
        }

        if field.allocation_exhausted() || self.hierarchy.farm_allocation_exhausted() {
            warn!("Admission denied for {}: water allocation exhausted", zone.id);
            return Err(AdmissionError::AllocationExceeded);
        }

        self.hierarchy.mark_irrigating(handle, true);
        info!("Zone {} admitted for irrigation", self.zone_id_str(handle));
        Ok(())
    }

    /// Stop a zone. Idempotent: stopping an inactive or unknown zone is
    /// a no-op and never fails.
    pub fn request_stop(&mut self, zone_id: &str) {
        let Some(handle) = self.hierarchy.find_zone(zone_id) else {
            return;
        };
        self.request_stop_handle(handle);
    }

    /// Handle-based variant of [`request_stop`](Self::request_stop).
    pub fn request_stop_handle(&mut self, handle: ZoneHandle) {
        let Some(zone) = self.hierarchy.zone(handle) else {
            return;
        };
        if zone.is_irrigating() {
            info!("Zone {} stopped", zone.id);
            self.hierarchy.mark_irrigating(handle, false);
        }
    }

    /// Account water usage reported back by the actuation collaborator.
    pub fn record_water_usage(&mut self, zone_id: &str, liters: f32) {
        if let Some(handle) = self.hierarchy.find_zone(zone_id) {
            self.hierarchy.add_water_used(handle, liters);
        }
    }

    /// Whether the zone is currently irrigating.
    pub fn is_active(&self, zone_id: &str) -> bool {
        self.hierarchy
            .find_zone(zone_id)
            .and_then(|h| self.hierarchy.zone(h))
            .is_some_and(|z| z.is_irrigating())
    }

    /// Active zones under a field.
    pub fn active_zone_count(&self, field: FieldHandle) -> u8 {
        self.hierarchy.field(field).map_or(0, |f| f.active_zones())
    }

    fn zone_id_str(&self, handle: ZoneHandle) -> &str {
        self.hierarchy.zone(handle).map_or("?", |z| z.id.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
