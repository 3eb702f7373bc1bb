//! Shared resource registry.
//!
//! One process-wide table mapping external resource handles to the
//! family that owns the per-resource bookkeeping record. Both arbiters
//! register here so that handle-addressed operations can be routed
//! without guessing the family, and so that double registration (an
//! implementation bug) is caught immediately.

use std::collections::HashMap;

use crate::event::Family;
use crate::resource::ResourceHandle;
use crate::zone::{ZoneId, ZoneMask};

/// Table of every tracked resource handle and its owning family.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: HashMap<ResourceHandle, Family>,
    zones: ZoneMask,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handle under a family.
    ///
    /// # Panics
    ///
    /// Panics if the handle is already registered; two bookkeeping
    /// records for one handle would corrupt the priority lists.
    pub fn insert(&mut self, handle: ResourceHandle, family: Family, zone: ZoneId) {
        let previous = self.entries.insert(handle, family);
        assert!(
            previous.is_none(),
            "resource {handle} registered twice (was {}, now {})",
            previous.map_or("?", Family::name),
            family,
        );
        self.zones.set(zone);
    }

    /// Unregisters a handle, returning its family if it was tracked.
    pub fn remove(&mut self, handle: ResourceHandle) -> Option<Family> {
        self.entries.remove(&handle)
    }

    /// Looks up the family owning a handle.
    pub fn lookup(&self, handle: ResourceHandle) -> Option<Family> {
        self.entries.get(&handle).copied()
    }

    /// Returns true if the handle is tracked.
    pub fn contains(&self, handle: ResourceHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Zones that have ever held a tracked resource.
    pub fn zones(&self) -> ZoneMask {
        self.zones
    }

    /// Number of tracked handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no handle is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let mut registry = ResourceRegistry::new();
        registry.insert(ResourceHandle(1), Family::Screen, ZoneId(0));
        registry.insert(ResourceHandle(2), Family::Audio, ZoneId(1));

        assert_eq!(registry.lookup(ResourceHandle(1)), Some(Family::Screen));
        assert_eq!(registry.lookup(ResourceHandle(2)), Some(Family::Audio));
        assert_eq!(registry.lookup(ResourceHandle(3)), None);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_returns_family() {
        let mut registry = ResourceRegistry::new();
        registry.insert(ResourceHandle(1), Family::Screen, ZoneId(0));

        assert_eq!(registry.remove(ResourceHandle(1)), Some(Family::Screen));
        assert_eq!(registry.remove(ResourceHandle(1)), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn zone_mask_accumulates() {
        let mut registry = ResourceRegistry::new();
        registry.insert(ResourceHandle(1), Family::Screen, ZoneId(0));
        registry.insert(ResourceHandle(2), Family::Audio, ZoneId(3));
        registry.remove(ResourceHandle(1));

        // The mask records zones ever used, not current occupancy.
        assert!(registry.zones().contains(ZoneId(0)));
        assert!(registry.zones().contains(ZoneId(3)));
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn double_registration_panics() {
        let mut registry = ResourceRegistry::new();
        registry.insert(ResourceHandle(1), Family::Screen, ZoneId(0));
        registry.insert(ResourceHandle(1), Family::Audio, ZoneId(0));
    }
}
