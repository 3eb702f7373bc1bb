//! Cabin Core - resource arbitration engine for IVI system controllers
//!
//! This crate decides, at every moment, which applications may show
//! window surfaces and which may produce sound. Applications compete
//! for `screen` and `audio` resources; the engine keeps priority-
//! ordered lists per area (screen) and per zone (audio), picks the
//! winners on every state change, and emits grant/revoke events for
//! the window manager and audio router to enact.
//!
//! # Core Abstractions
//!
//! ## Engine
//!
//! - [`ResourceManager`] - one engine instance: directories, registry,
//!   notifier and both arbiters
//! - [`ZoneArbiter`] - the six-callback skeleton (`notify`, `init`,
//!   `allocate`, `free`, `advice`, `commit`) both families implement
//! - [`ScreenArbiter`] / [`AudioArbiter`] - the two instantiations
//!
//! ## Data model
//!
//! - [`ZoneDirectory`] - up to [`ZONE_MAX`] named zones
//! - [`AreaDef`] - rectangular regions of an output, screen resources
//!   bind to them by name
//! - [`ApplicationDirectory`] - appid-keyed descriptors: privileges,
//!   requisites, class, window bindings
//! - [`Resource`] / [`AttrSet`] - the external framework's records and
//!   their typed attribute blocks
//!
//! ## Decisions and events
//!
//! - [`key`] - the packed composite sort keys of both families
//! - [`Notifier`] - per-zone FIFO event queues with one installed sink
//! - [`DisableFilter`] - the administrative overlay that blocks
//!   resources from being granted without deleting them
//!
//! # Example
//!
//! ```rust
//! use cabin_core::{
//!     ApplicationClass, Family, LifecycleEvent, Resource, ResourceHandle, ResourceManager,
//!     AreaDef, AreaGeometry, ZoneId,
//! };
//!
//! let mut mgr = ResourceManager::new();
//! let zone = mgr.define_zone("driver").unwrap();
//! mgr.area_create(&AreaDef::new(
//!     0, "full", 0, "center", "driver",
//!     AreaGeometry::new(0, 0, 1920, 1080),
//! ));
//! mgr.register_sink(|event| println!("{event}"));
//!
//! let mut surface = Resource::screen(ResourceHandle(1));
//! surface.attrs_mut().set_string("appid", "org.example.navi");
//! surface.attrs_mut().set_integer("surface", 101);
//! surface.attrs_mut().set_string("area", "center.full");
//!
//! let class = ApplicationClass::new("navigator", 0);
//! mgr.notify(LifecycleEvent::Created, zone, &class, &surface);
//! mgr.notify(LifecycleEvent::Acquire, zone, &class, &surface);
//! mgr.init(Family::Screen, zone);
//! mgr.commit(Family::Screen, zone); // sink sees preallocate + grant
//! ```
//!
//! # Design Principles
//!
//! - **Single-threaded**: every callback runs to completion on one
//!   event loop; there are no locks in the engine
//! - **Infallible surface**: recoverable failures are logged and
//!   return distinguished values; only invariant violations panic
//! - **Handle-based**: resources reference zones, areas and
//!   applications through stable ids, never through back-pointers

pub mod application;
pub mod arbiter;
pub mod area;
pub mod attribute;
pub mod audio;
pub mod disable;
pub mod event;
pub mod key;
pub mod manager;
pub mod notifier;
pub mod registry;
pub mod resource;
pub mod screen;
pub mod zone;

// Re-export main types at crate root
pub use application::{
    Application, ApplicationDirectory, DEFAULT_APPID, Privilege, Privileges, Requisite,
    Requisites, WindowBinding,
};
pub use arbiter::{ArbiterCtx, ZoneArbiter};
pub use area::{AREA_MAX, AreaAlign, AreaDef, AreaGeometry, AreaId, OutputId};
pub use attribute::{AttrDef, AttrDefault, AttrSet, AttrValue};
pub use audio::AudioArbiter;
pub use disable::{DisableFilter, DisableMask};
pub use event::{Event, EventId, EventPayload, Family};
pub use manager::ResourceManager;
pub use notifier::{EVENT_SCAN_MAX, EventSink, Notifier};
pub use registry::ResourceRegistry;
pub use resource::{ApplicationClass, LifecycleEvent, Resource, ResourceHandle};
pub use zone::{UNKNOWN_ZONE, ZONE_MAX, ZoneDirectory, ZoneId, ZoneMask};
