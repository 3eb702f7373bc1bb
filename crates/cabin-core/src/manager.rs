//! The engine facade.
//!
//! [`ResourceManager`] owns the zone and application directories, the
//! shared registry, the notifier and both arbiters, and exposes the
//! callback surface the external resource framework drives. It also
//! carries the administrative entry points: the disable overlay,
//! raise/lower by appid, and area registration.
//!
//! Owner recalculation is modeled as `init` followed by `commit` for
//! the affected family; the framework's allocate/free handshake adds
//! no engine state transitions, so the pair reproduces the decision a
//! full recalculation would reach.

use crate::application::{Application, ApplicationDirectory};
use crate::arbiter::{ArbiterCtx, ZoneArbiter};
use crate::area::{AreaDef, AreaId};
use crate::audio::AudioArbiter;
use crate::disable::DisableFilter;
use crate::event::{Event, Family};
use crate::notifier::Notifier;
use crate::registry::ResourceRegistry;
use crate::resource::{ApplicationClass, LifecycleEvent, Resource};
use crate::screen::ScreenArbiter;
use crate::zone::{ZoneDirectory, ZoneId};

/// One engine instance: directories, registry, notifier and arbiters.
pub struct ResourceManager {
    zones: ZoneDirectory,
    apps: ApplicationDirectory,
    registry: ResourceRegistry,
    notifier: Notifier,
    screen: ScreenArbiter,
    audio: AudioArbiter,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceManager {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self {
            zones: ZoneDirectory::new(),
            apps: ApplicationDirectory::new(),
            registry: ResourceRegistry::new(),
            notifier: Notifier::new(),
            screen: ScreenArbiter::new(),
            audio: AudioArbiter::new(),
        }
    }

    /// Splits the engine into the per-callback context and the two
    /// arbiters, so one can be driven while the other stays borrowable.
    fn split(&mut self) -> (ArbiterCtx<'_>, &mut ScreenArbiter, &mut AudioArbiter) {
        (
            ArbiterCtx {
                zones: &self.zones,
                apps: &self.apps,
                registry: &mut self.registry,
                notifier: &mut self.notifier,
            },
            &mut self.screen,
            &mut self.audio,
        )
    }

    // --- Directories ---

    /// Defines a zone; see [`ZoneDirectory::define`].
    pub fn define_zone(&mut self, name: &str) -> Option<ZoneId> {
        self.zones.define(name)
    }

    /// The zone directory.
    pub fn zones(&self) -> &ZoneDirectory {
        &self.zones
    }

    /// Installs or replaces an application descriptor.
    pub fn install_application(&mut self, app: Application) {
        self.apps.insert(app);
    }

    /// The application directory.
    pub fn applications(&self) -> &ApplicationDirectory {
        &self.apps
    }

    /// The shared resource registry.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Read access to the screen arbiter.
    pub fn screen(&self) -> &ScreenArbiter {
        &self.screen
    }

    /// Read access to the audio arbiter.
    pub fn audio(&self) -> &AudioArbiter {
        &self.audio
    }

    /// Installs the notifier sink; see [`Notifier::register_sink`].
    pub fn register_sink(&mut self, sink: impl FnMut(&Event) + 'static) {
        self.notifier.register_sink(sink);
    }

    // --- Area management (screen family) ---

    /// Registers a screen area and recalculates owners of every zone
    /// that picked up late-resolved resources.
    pub fn area_create(&mut self, def: &AreaDef) {
        let (mut ctx, screen, _) = self.split();
        let touched = screen.area_create(&mut ctx, def);
        for zone in touched.iter() {
            self.recalc_owner(Family::Screen, zone);
        }
    }

    /// Unregisters a screen area.
    pub fn area_destroy(&mut self, areaid: AreaId) {
        self.screen.area_destroy(areaid);
    }

    // --- External callback surface ---

    /// Lifecycle notification for the resource's family.
    pub fn notify(
        &mut self,
        event: LifecycleEvent,
        zone: ZoneId,
        class: &ApplicationClass,
        res: &Resource,
    ) {
        let (mut ctx, screen, audio) = self.split();
        match res.family() {
            Family::Screen => screen.notify(&mut ctx, event, zone, class, res),
            Family::Audio => audio.notify(&mut ctx, event, zone, class, res),
        }
    }

    /// Opens a zone's grant decision for one family.
    pub fn init(&mut self, family: Family, zone: ZoneId) {
        let (mut ctx, screen, audio) = self.split();
        match family {
            Family::Screen => screen.init(&mut ctx, zone),
            Family::Audio => audio.init(&mut ctx, zone),
        }
    }

    /// Reports whether the resource holds its zone's current grant.
    pub fn allocate(&mut self, zone: ZoneId, res: &Resource) -> bool {
        let (mut ctx, screen, audio) = self.split();
        match res.family() {
            Family::Screen => screen.allocate(&mut ctx, zone, res),
            Family::Audio => audio.allocate(&mut ctx, zone, res),
        }
    }

    /// Clears the resource's grant id.
    pub fn free(&mut self, zone: ZoneId, res: &Resource) {
        let (mut ctx, screen, audio) = self.split();
        match res.family() {
            Family::Screen => screen.free(&mut ctx, zone, res),
            Family::Audio => audio.free(&mut ctx, zone, res),
        }
    }

    /// Advisory hook; always grants.
    pub fn advice(&mut self, zone: ZoneId, res: &Resource) -> bool {
        let (mut ctx, screen, audio) = self.split();
        match res.family() {
            Family::Screen => screen.advice(&mut ctx, zone, res),
            Family::Audio => audio.advice(&mut ctx, zone, res),
        }
    }

    /// Commits a zone's decision for one family: queues edge-triggered
    /// grant/revoke events and flushes them to the sink.
    pub fn commit(&mut self, family: Family, zone: ZoneId) {
        let (mut ctx, screen, audio) = self.split();
        match family {
            Family::Screen => screen.commit(&mut ctx, zone),
            Family::Audio => audio.commit(&mut ctx, zone),
        }
    }

    /// Recalculates a zone's owners for one family.
    pub fn recalc_owner(&mut self, family: Family, zone: ZoneId) {
        self.init(family, zone);
        self.commit(family, zone);
    }

    // --- Administration ---

    /// Runs a disable/enable pass.
    ///
    /// `zone_name` scopes the pass to one zone; `"*"` means every
    /// zone. Returns the number of resources whose mask changed, or
    /// `-1` when the zone, surface or filter cannot be resolved. With
    /// `recalc` set, owners of every touched zone are recalculated.
    pub fn disable(
        &mut self,
        family: Family,
        zone_name: &str,
        disable: bool,
        filter: &DisableFilter<'_>,
        recalc: bool,
    ) -> i32 {
        tracing::debug!(
            zone = zone_name,
            disable,
            ?filter,
            "{} disable pass",
            family
        );

        let zone = if zone_name == "*" {
            None
        } else {
            match self.zones.id(zone_name) {
                Some(z) => Some(z),
                None => {
                    tracing::error!(
                        zone = zone_name,
                        "failed to disable {}: can't find zone",
                        family
                    );
                    return -1;
                }
            }
        };

        let (count, touched) = match family {
            Family::Screen => self.screen.disable(zone, disable, filter),
            Family::Audio => self.audio.disable(zone, disable, filter),
        };
        if count < 0 {
            return -1;
        }

        if recalc {
            for z in touched.iter() {
                self.recalc_owner(family, z);
            }
        }
        count
    }

    /// Raises the matching screen resources and recalculates the
    /// touched zones; see [`ScreenArbiter::raise`].
    pub fn raise(&mut self, appid: &str, surface: i32) {
        let touched = self.screen.raise(appid, surface);
        for zone in touched.iter() {
            self.recalc_owner(Family::Screen, zone);
        }
    }

    /// Lowers the matching screen resources and recalculates the
    /// touched zones; see [`ScreenArbiter::lower`].
    pub fn lower(&mut self, appid: &str, surface: i32) {
        let touched = self.screen.lower(appid, surface);
        for zone in touched.iter() {
            self.recalc_owner(Family::Screen, zone);
        }
    }

    /// Renders one family's state in one zone for operators.
    pub fn dump(&self, family: Family, zone: ZoneId) -> String {
        match family {
            Family::Screen => self.screen.dump(zone),
            Family::Audio => self.audio.dump(zone),
        }
    }
}
