//! Audio arbiter - per-zone ordered allocation of audio streams.
//!
//! Audio resources are grouped per zone in one ordered list each. The
//! grant scan walks the list top-down: the first acquiring,
//! non-disabled resource takes the grant; a non-shared winner ends the
//! scan, a shared winner lets every further shared candidate join the
//! grant. The interrupt classification (any application class except
//! `player` and `base`) is derived once at create time and packed
//! into the most significant key bit.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::application::Requisite;
use crate::arbiter::{ArbiterCtx, ZoneArbiter};
use crate::attribute::{AttrDef, AttrDefault};
use crate::disable::{self, DisableFilter, DisableMask};
use crate::event::{EventId, Family};
use crate::key;
use crate::resource::{ApplicationClass, LifecycleEvent, Resource, ResourceHandle};
use crate::zone::{ZONE_MAX, ZoneId, ZoneMask};

const PRIORITY_ATTR: usize = 0;
const CLASSPRI_ATTR: usize = 1;
const APPID_ATTR: usize = 2;

static ATTR_DEFS: &[AttrDef] = &[
    AttrDef::new("priority", AttrDefault::Integer(0)),
    AttrDef::new("classpri", AttrDefault::Integer(-1)),
    AttrDef::new("appid", AttrDefault::String("<undefined>")),
    AttrDef::new("role", AttrDefault::String("music")),
    AttrDef::new("pid", AttrDefault::String("<unknown>")),
    AttrDef::new("policy", AttrDefault::String("relaxed")),
];

/// The attribute table audio resources are created with.
pub(crate) fn attribute_table() -> &'static [AttrDef] {
    ATTR_DEFS
}

/// Per-resource bookkeeping of the audio arbiter.
#[derive(Debug)]
struct AudioResource {
    zone: ZoneId,
    /// Engine-assigned id, not to be confused with the resource handle.
    audioid: u32,
    appid: String,
    interrupt: bool,
    shared: bool,
    priority: u32,
    classpri: u32,
    key: u32,
    acquire: bool,
    grant: bool,
    grantid: u32,
    requisite: Requisite,
    disable: DisableMask,
}

impl AudioResource {
    fn rebuild_key(&mut self) {
        self.key = key::audio_key(
            0, // stamp, reserved
            self.priority,
            self.classpri,
            self.acquire,
            self.shared,
            self.interrupt,
        );
    }
}

/// Arbiter for the audio resource family.
#[derive(Debug)]
pub struct AudioArbiter {
    /// Ordered resource list per zone, descending by key.
    zones: [Vec<ResourceHandle>; ZONE_MAX],
    grantids: [u32; ZONE_MAX],
    resources: HashMap<ResourceHandle, AudioResource>,
    by_audioid: HashMap<u32, ResourceHandle>,
    next_audioid: u32,
}

impl Default for AudioArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioArbiter {
    /// Creates an arbiter with no resources.
    pub fn new() -> Self {
        Self {
            zones: std::array::from_fn(|_| Vec::new()),
            grantids: [0; ZONE_MAX],
            resources: HashMap::new(),
            by_audioid: HashMap::new(),
            next_audioid: 0,
        }
    }

    /// Current grant id of a zone.
    pub fn grantid(&self, zone: ZoneId) -> u32 {
        self.grantids[zone.index()]
    }

    /// Number of tracked audio resources.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Reinserts a resource into its zone list at its key position.
    fn insert_ordered(
        list: &mut Vec<ResourceHandle>,
        resources: &HashMap<ResourceHandle, AudioResource>,
        handle: ResourceHandle,
    ) {
        list.retain(|&h| h != handle);
        let key = resources[&handle].key;
        let pos = list
            .iter()
            .rposition(|h| resources[h].key >= key)
            .map_or(0, |i| i + 1);
        list.insert(pos, handle);
    }

    // --- Lifecycle ---

    fn resource_create(
        &mut self,
        ctx: &mut ArbiterCtx<'_>,
        zone: ZoneId,
        class: &ApplicationClass,
        res: &Resource,
    ) {
        let handle = res.handle();
        let appid = res
            .attrs()
            .string(APPID_ATTR)
            .unwrap_or("<undefined>")
            .to_owned();

        let Some(app) = ctx.apps.resolve(&appid) else {
            tracing::error!(%appid, "failed to create audio resource: can't find application");
            return;
        };

        let priority = res
            .attrs()
            .integer(PRIORITY_ATTR)
            .filter(|&v| v >= 0)
            .map_or(0, |v| v as u32);
        // Negative classpri means unset; audio has no class fallback.
        let classpri = res
            .attrs()
            .integer(CLASSPRI_ATTR)
            .filter(|&v| v >= 0)
            .map_or(0, |v| v as u32);

        let audioid = self.next_audioid;
        self.next_audioid += 1;

        let mut record = AudioResource {
            zone,
            audioid,
            appid,
            interrupt: class.interrupts(),
            shared: res.is_shared(),
            priority,
            classpri,
            key: 0,
            acquire: false,
            grant: false,
            grantid: 0,
            requisite: app.requisites.audio,
            disable: DisableMask::empty(),
        };
        record.rebuild_key();
        let event_appid = app.appid.clone();

        ctx.registry.insert(handle, Family::Audio, zone);
        self.resources.insert(handle, record);
        self.by_audioid.insert(audioid, handle);
        Self::insert_ordered(&mut self.zones[zone.index()], &self.resources, handle);

        ctx.notifier.queue_audio(
            zone,
            ctx.zones.name_or_unknown(zone),
            EventId::Create,
            &event_appid,
            audioid,
        );
        ctx.notifier.flush(zone, Some(Family::Audio));
    }

    fn resource_destroy(&mut self, ctx: &mut ArbiterCtx<'_>, res: &Resource) {
        let handle = res.handle();
        if ctx.registry.remove(handle).is_none() {
            tracing::debug!(%handle, "destroy of untracked audio resource ignored");
            return;
        }
        let record = self
            .resources
            .remove(&handle)
            .unwrap_or_else(|| panic!("audio resource {handle} in registry but not tracked"));

        ctx.notifier.queue_audio(
            record.zone,
            ctx.zones.name_or_unknown(record.zone),
            EventId::Destroy,
            &record.appid,
            record.audioid,
        );

        self.by_audioid.remove(&record.audioid);
        self.zones[record.zone.index()].retain(|&h| h != handle);

        ctx.notifier.flush(record.zone, Some(Family::Audio));
    }

    fn set_acquire(&mut self, handle: ResourceHandle, acquire: bool) {
        let Some(r) = self.resources.get_mut(&handle) else {
            tracing::error!(%handle, "can't find audio resource");
            return;
        };
        if r.acquire == acquire {
            return;
        }
        r.acquire = acquire;
        r.rebuild_key();
        let zone = r.zone;
        Self::insert_ordered(&mut self.zones[zone.index()], &self.resources, handle);
    }

    fn grant_resources(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId) {
        let zonename = ctx.zones.name_or_unknown(zone);
        self.grantids[zone.index()] += 1;
        let grantid = self.grantids[zone.index()];

        let mut leader_granted = false;
        for &handle in &self.zones[zone.index()] {
            let r = self
                .resources
                .get_mut(&handle)
                .expect("listed handles are tracked");
            if !(r.acquire && r.disable.is_empty()) {
                continue;
            }
            if !leader_granted {
                // The topmost candidate always takes the grant; a
                // non-shared winner ends the scan.
                tracing::debug!(appid = %r.appid, zone = zonename, "preallocate audio resource");
                r.grantid = grantid;
                if !r.shared {
                    break;
                }
                leader_granted = true;
            } else if r.shared {
                tracing::debug!(appid = %r.appid, zone = zonename, "preallocate audio resource");
                r.grantid = grantid;
            }
        }
    }

    fn queue_events(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId) {
        let zonename = ctx.zones.name_or_unknown(zone);
        let grantid = self.grantids[zone.index()];
        let mut grants = Vec::new();

        // One scan; revokes queue immediately so every revoke of the
        // zone precedes its grants.
        for &handle in &self.zones[zone.index()] {
            let r = self
                .resources
                .get_mut(&handle)
                .expect("listed handles are tracked");
            let grant = r.grantid == grantid;
            if grant != r.grant {
                if grant {
                    grants.push(handle);
                } else {
                    ctx.notifier.queue_audio(
                        zone,
                        zonename,
                        EventId::Revoke,
                        &r.appid,
                        r.audioid,
                    );
                }
            }
            r.grant = grant;
        }

        for handle in grants {
            let r = &self.resources[&handle];
            ctx.notifier
                .queue_audio(zone, zonename, EventId::Grant, &r.appid, r.audioid);
        }
    }

    // --- Disable overlay ---

    /// Runs a disable/enable pass over the audio resources.
    ///
    /// The surface filter is a screen concept; passing it here fails
    /// with `-1`. Returns the number of changed resources and the
    /// zones that had a match.
    pub(crate) fn disable(
        &mut self,
        zone: Option<ZoneId>,
        disable: bool,
        filter: &DisableFilter<'_>,
    ) -> (i32, ZoneMask) {
        let mut touched = ZoneMask::new();
        if matches!(filter, DisableFilter::Surface(_)) {
            tracing::error!("invalid filter type for audio disable");
            return (-1, touched);
        }

        let bit = filter.mask_bit();
        let mut counter = 0;
        for r in self.resources.values_mut() {
            if let Some(z) = zone
                && r.zone != z
            {
                continue;
            }
            let matched = match filter {
                DisableFilter::Requisite(req) => {
                    !req.is_empty() && r.requisite.contains(*req)
                }
                DisableFilter::Appid(appid) => *appid == "*" || r.appid == *appid,
                DisableFilter::Surface(_) => unreachable!("rejected above"),
            };
            if matched && disable::apply_bit(&mut r.disable, bit, disable) {
                counter += 1;
                touched.set(r.zone);
            }
        }

        (counter, touched)
    }

    // --- Introspection ---

    /// Composite keys of a zone's list, top first.
    ///
    /// Diagnostics; the grant logic never reads keys through this.
    pub fn zone_keys(&self, zone: ZoneId) -> Vec<u32> {
        self.zones[zone.index()]
            .iter()
            .map(|h| self.resources[h].key)
            .collect()
    }

    /// `(audioid, shared)` of every resource holding the zone's
    /// current grant, top first.
    pub fn granted(&self, zone: ZoneId) -> Vec<(u32, bool)> {
        let grantid = self.grantids[zone.index()];
        self.zones[zone.index()]
            .iter()
            .map(|h| &self.resources[h])
            .filter(|r| grantid != 0 && r.grantid == grantid)
            .map(|r| (r.audioid, r.shared))
            .collect()
    }

    /// Renders the arbiter state of one zone for operators.
    pub fn dump(&self, zone: ZoneId) -> String {
        let mut out = String::new();
        let grantid = self.grantids[zone.index()];
        let _ = writeln!(out, "Resource 'audio' - grantid:{grantid}");

        let list = &self.zones[zone.index()];
        if list.is_empty() {
            let _ = writeln!(out, "   No resources");
            return out;
        }

        for handle in list {
            let r = &self.resources[handle];
            let _ = writeln!(
                out,
                "   key:0x{:08x} {} {} grantid:{} requisite:{} disable:{} \
                 appid:'{}' audioid:{} priority:{} classpri:{}",
                r.key,
                if r.interrupt { "interrupt" } else { "base" },
                if r.acquire { "acquire" } else { "release" },
                r.grantid,
                r.requisite,
                r.disable,
                r.appid,
                r.audioid,
                r.priority,
                r.classpri,
            );
        }
        out
    }
}

impl ZoneArbiter for AudioArbiter {
    fn notify(
        &mut self,
        ctx: &mut ArbiterCtx<'_>,
        event: LifecycleEvent,
        zone: ZoneId,
        class: &ApplicationClass,
        res: &Resource,
    ) {
        let zonename = ctx.zones.name_or_unknown(zone);
        match event {
            LifecycleEvent::Created => {
                tracing::debug!(zone = zonename, "audio resource created");
                self.resource_create(ctx, zone, class, res);
            }
            LifecycleEvent::Destroyed => {
                tracing::debug!(zone = zonename, "audio resource destroyed");
                self.resource_destroy(ctx, res);
            }
            LifecycleEvent::Acquire => {
                tracing::debug!(zone = zonename, "audio resource is acquiring");
                self.set_acquire(res.handle(), true);
            }
            LifecycleEvent::Release => {
                tracing::debug!(zone = zonename, "audio resource is released");
                self.set_acquire(res.handle(), false);
            }
        }
    }

    fn init(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId) {
        tracing::debug!(zone = ctx.zones.name_or_unknown(zone), "audio init");
        self.grant_resources(ctx, zone);
    }

    fn allocate(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId, res: &Resource) -> bool {
        let zonename = ctx.zones.name_or_unknown(zone);
        let grantid = self.grantids[zone.index()];

        if let Some(r) = self.resources.get(&res.handle()) {
            let allocated = r.grantid == grantid;
            tracing::debug!(
                zone = zonename,
                appid = %r.appid,
                "audio allocation {}",
                if allocated { "succeeded" } else { "failed" }
            );
            return allocated;
        }

        tracing::error!(zone = zonename, "attempt to allocate untracked audio resource");
        false
    }

    fn free(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId, res: &Resource) {
        tracing::debug!(zone = ctx.zones.name_or_unknown(zone), "free audio resource");
        if let Some(r) = self.resources.get_mut(&res.handle()) {
            r.grantid = 0;
        }
    }

    fn advice(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId, _res: &Resource) -> bool {
        tracing::debug!(zone = ctx.zones.name_or_unknown(zone), "audio advice");
        true
    }

    fn commit(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId) {
        tracing::debug!(zone = ctx.zones.name_or_unknown(zone), "audio commit");
        self.queue_events(ctx, zone);
        ctx.notifier.flush(zone, Some(Family::Audio));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationDirectory;
    use crate::notifier::Notifier;
    use crate::registry::ResourceRegistry;
    use crate::zone::ZoneDirectory;

    struct Fixture {
        zones: ZoneDirectory,
        apps: ApplicationDirectory,
        registry: ResourceRegistry,
        notifier: Notifier,
        audio: AudioArbiter,
    }

    macro_rules! ctx {
        ($f:expr) => {
            &mut ArbiterCtx {
                zones: &$f.zones,
                apps: &$f.apps,
                registry: &mut $f.registry,
                notifier: &mut $f.notifier,
            }
        };
    }

    impl Fixture {
        fn new() -> Self {
            let mut zones = ZoneDirectory::new();
            zones.define("driver").unwrap();
            Self {
                zones,
                apps: ApplicationDirectory::new(),
                registry: ResourceRegistry::new(),
                notifier: Notifier::new(),
                audio: AudioArbiter::new(),
            }
        }

        fn create(&mut self, handle: u64, class: &str, priority: i32, shared: bool) {
            let mut res = Resource::audio(ResourceHandle(handle)).with_shared(shared);
            res.attrs_mut().set_string("appid", format!("app-{handle}"));
            res.attrs_mut().set_integer("priority", priority);
            let class = ApplicationClass::new(class, 0);
            self.audio.notify(
                ctx!(self),
                LifecycleEvent::Created,
                ZoneId(0),
                &class,
                &res,
            );
        }

        fn acquire(&mut self, handle: u64) {
            let res = Resource::audio(ResourceHandle(handle));
            self.audio
                .notify(ctx!(self), LifecycleEvent::Acquire, ZoneId(0), &player(), &res);
        }

        fn decide(&mut self) {
            self.audio.init(ctx!(self), ZoneId(0));
        }

        fn granted(&self) -> Vec<u64> {
            let grantid = self.audio.grantid(ZoneId(0));
            self.audio.zones[0]
                .iter()
                .copied()
                .filter(|h| self.audio.resources[h].grantid == grantid)
                .map(|h| h.0)
                .collect()
        }
    }

    fn player() -> ApplicationClass {
        ApplicationClass::new("player", 0)
    }

    #[test]
    fn audioids_are_monotonic() {
        let mut f = Fixture::new();
        f.create(1, "player", 0, true);
        f.create(2, "event", 0, false);

        assert_eq!(f.audio.resources[&ResourceHandle(1)].audioid, 0);
        assert_eq!(f.audio.resources[&ResourceHandle(2)].audioid, 1);
    }

    #[test]
    fn interrupt_derived_from_class() {
        let mut f = Fixture::new();
        f.create(1, "player", 0, true);
        f.create(2, "base", 0, true);
        f.create(3, "navigator", 0, false);

        assert!(!f.audio.resources[&ResourceHandle(1)].interrupt);
        assert!(!f.audio.resources[&ResourceHandle(2)].interrupt);
        assert!(f.audio.resources[&ResourceHandle(3)].interrupt);
    }

    #[test]
    fn acquire_reorders_list() {
        let mut f = Fixture::new();
        f.create(1, "player", 0, true);
        f.create(2, "player", 0, true);

        f.acquire(2);
        assert_eq!(f.audio.zones[0], vec![ResourceHandle(2), ResourceHandle(1)]);

        // Releasing drops it back behind nothing in particular; equal
        // keys keep insertion order of the reinsert.
        let res = Resource::audio(ResourceHandle(2));
        f.audio
            .notify(ctx!(f), LifecycleEvent::Release, ZoneId(0), &player(), &res);
        assert_eq!(f.audio.zones[0], vec![ResourceHandle(1), ResourceHandle(2)]);
    }

    #[test]
    fn non_shared_winner_ends_scan() {
        let mut f = Fixture::new();
        f.create(1, "player", 0, true);
        f.create(2, "event", 0, false);
        f.create(3, "phone", 5, false);

        f.acquire(1);
        f.acquire(2);
        f.acquire(3);
        f.decide();

        assert_eq!(f.granted(), vec![3]);
    }

    #[test]
    fn shared_winner_grants_further_shared_only() {
        let mut f = Fixture::new();
        f.create(1, "player", 0, true);
        f.create(2, "event", 0, false);
        f.create(3, "phone", 5, true);

        f.acquire(1);
        f.acquire(2);
        f.acquire(3);
        f.decide();

        // phone leads and shares; event is non-shared and skipped;
        // player joins the shared grant.
        assert_eq!(f.granted(), vec![3, 1]);
    }

    #[test]
    fn disabled_resource_is_never_granted() {
        let mut f = Fixture::new();
        f.create(1, "phone", 5, false);
        f.create(2, "player", 0, true);
        f.acquire(1);
        f.acquire(2);

        let (count, _) = f.audio.disable(None, true, &DisableFilter::Appid("app-1"));
        assert_eq!(count, 1);

        f.decide();
        assert_eq!(f.granted(), vec![2]);
    }

    #[test]
    fn disable_surface_filter_is_rejected() {
        let mut f = Fixture::new();
        let (count, touched) = f.audio.disable(None, true, &DisableFilter::Surface(1));
        assert_eq!(count, -1);
        assert!(touched.is_empty());
    }

    #[test]
    fn free_clears_grantid() {
        let mut f = Fixture::new();
        f.create(1, "player", 0, true);
        f.acquire(1);
        f.decide();
        assert_eq!(f.granted(), vec![1]);

        let res = Resource::audio(ResourceHandle(1));
        f.audio.free(ctx!(f), ZoneId(0), &res);
        assert_eq!(f.audio.resources[&ResourceHandle(1)].grantid, 0);
    }
}
