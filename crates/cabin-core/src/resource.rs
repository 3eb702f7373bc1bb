//! External resource records and the lifecycle notification contract.
//!
//! A [`Resource`] is the record the external resource framework owns
//! for every tracked surface or audio stream: a stable handle, the
//! share flag of its resource set, and the family's attribute block.
//! The engine never stores references into it; each arbiter snapshots
//! the attributes it needs when the resource is created.

use std::fmt;

use crate::attribute::AttrSet;
use crate::event::Family;

/// Stable identifier of an external resource.
///
/// Stands in for the resource pointer of the external framework; the
/// engine uses it as the registry key and never interprets the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(pub u64);

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle notifications delivered through the `notify` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The resource was created by the framework.
    Created,
    /// The resource is being destroyed.
    Destroyed,
    /// The client wants the resource granted.
    Acquire,
    /// The client no longer wants the resource granted.
    Release,
}

/// Application class a resource was created under.
///
/// The class contributes its priority to the composite key (screen)
/// and its name to the interrupt classification (audio).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationClass {
    /// Class token (`player`, `event`, `phone`, ...).
    pub name: String,
    /// Class priority, used when a resource declares none.
    pub priority: u32,
}

impl ApplicationClass {
    /// Creates a class descriptor.
    pub fn new(name: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            priority,
        }
    }

    /// True for classes whose audio interrupts the base program.
    ///
    /// Everything except `player` and `base` interrupts.
    pub fn interrupts(&self) -> bool {
        self.name != "player" && self.name != "base"
    }
}

/// External resource record driven through the engine callbacks.
#[derive(Debug, Clone)]
pub struct Resource {
    handle: ResourceHandle,
    family: Family,
    shared: bool,
    attrs: AttrSet,
}

impl Resource {
    /// Creates a screen resource with default attributes.
    pub fn screen(handle: ResourceHandle) -> Self {
        Self {
            handle,
            family: Family::Screen,
            shared: false,
            attrs: AttrSet::new(crate::screen::attribute_table()),
        }
    }

    /// Creates an audio resource with default attributes.
    pub fn audio(handle: ResourceHandle) -> Self {
        Self {
            handle,
            family: Family::Audio,
            shared: false,
            attrs: AttrSet::new(crate::audio::attribute_table()),
        }
    }

    /// Marks the resource's set as shared.
    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// The resource's stable handle.
    pub fn handle(&self) -> ResourceHandle {
        self.handle
    }

    /// The family the resource belongs to.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Whether the resource's set allows sharing its grant.
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Read access to the attribute block.
    pub fn attrs(&self) -> &AttrSet {
        &self.attrs
    }

    /// Write access to the attribute block.
    pub fn attrs_mut(&mut self) -> &mut AttrSet {
        &mut self.attrs
    }
}
