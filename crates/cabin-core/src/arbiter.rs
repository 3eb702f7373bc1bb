//! The arbiter seam shared by the screen and audio families.
//!
//! Both arbiters implement the same six-callback skeleton the external
//! resource framework drives; they differ in key layout and in the
//! grant-selection rule. [`ArbiterCtx`] bundles the engine-wide state
//! an arbiter needs while servicing a callback: the zone and
//! application directories for name resolution and the notifier and
//! registry it shares with the other family.

use crate::application::ApplicationDirectory;
use crate::notifier::Notifier;
use crate::registry::ResourceRegistry;
use crate::resource::{ApplicationClass, LifecycleEvent, Resource};
use crate::zone::{ZoneDirectory, ZoneId};

/// Engine-wide state lent to an arbiter for the duration of a callback.
pub struct ArbiterCtx<'a> {
    /// Zone name table.
    pub zones: &'a ZoneDirectory,
    /// Application directory.
    pub apps: &'a ApplicationDirectory,
    /// Shared by-handle registry.
    pub registry: &'a mut ResourceRegistry,
    /// Event queues.
    pub notifier: &'a mut Notifier,
}

/// The callback surface one resource family implements.
///
/// All methods run to completion on the single engine thread; none of
/// them fails: recoverable problems are logged and skipped per the
/// engine's error policy.
pub trait ZoneArbiter {
    /// Lifecycle notification: create, destroy, acquire or release.
    fn notify(
        &mut self,
        ctx: &mut ArbiterCtx<'_>,
        event: LifecycleEvent,
        zone: ZoneId,
        class: &ApplicationClass,
        res: &Resource,
    );

    /// Opens a zone's grant decision: advance the grant id and choose
    /// the candidates for the upcoming commit.
    fn init(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId);

    /// Reports whether a resource holds the zone's current grant.
    fn allocate(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId, res: &Resource) -> bool;

    /// Clears a resource's grant id.
    fn free(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId, res: &Resource);

    /// Advisory hook; always grants.
    fn advice(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId, res: &Resource) -> bool;

    /// Queues edge-triggered grant/revoke events and flushes the zone.
    fn commit(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId);
}
