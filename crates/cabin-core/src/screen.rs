//! Screen arbiter - per-area ordered allocation of window surfaces.
//!
//! Screen resources are grouped by area; each area keeps a stack of
//! resources ordered by composite key, descending, with the visible
//! candidate at the top. Acquiring raises the resource to the top of
//! its area by allocating a fresh z-order value; releasing drops it to
//! the bottom. The grant decision picks the topmost acquiring,
//! non-disabled resource per area.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::application::Requisite;
use crate::arbiter::{ArbiterCtx, ZoneArbiter};
use crate::area::{AREA_MAX, AreaAlign, AreaDef, AreaGeometry, AreaId, OutputId};
use crate::attribute::{AttrDef, AttrDefault};
use crate::disable::{self, DisableFilter, DisableMask};
use crate::event::{EventId, Family};
use crate::key;
use crate::resource::{ApplicationClass, LifecycleEvent, Resource, ResourceHandle};
use crate::zone::{ZONE_MAX, ZoneId, ZoneMask};

const PRIORITY_ATTR: usize = 0;
const CLASSPRI_ATTR: usize = 1;
const AREA_ATTR: usize = 2;
const APPID_ATTR: usize = 3;
const SURFACE_ATTR: usize = 4;

static ATTR_DEFS: &[AttrDef] = &[
    AttrDef::new("priority", AttrDefault::Integer(0)),
    AttrDef::new("classpri", AttrDefault::Integer(-1)),
    AttrDef::new("area", AttrDefault::String("<undefined>")),
    AttrDef::new("appid", AttrDefault::String("<undefined>")),
    AttrDef::new("surface", AttrDefault::Integer(0)),
];

/// The attribute table screen resources are created with.
pub(crate) fn attribute_table() -> &'static [AttrDef] {
    ATTR_DEFS
}

/// Per-resource bookkeeping of the screen arbiter.
#[derive(Debug)]
struct ScreenResource {
    zone: ZoneId,
    output: Option<OutputId>,
    area: Option<AreaId>,
    surface: i32,
    appid: String,
    /// Area name the resource asked for, possibly not yet resolvable.
    area_name: String,
    priority: u32,
    classpri: u32,
    key: u32,
    acquire: bool,
    grant: bool,
    grantid: u32,
    requisite: Requisite,
    disable: DisableMask,
}

/// Internal record of one registered area.
#[derive(Debug)]
struct ScreenArea {
    name: String,
    fullname: String,
    output: OutputId,
    zone: ZoneId,
    geometry: AreaGeometry,
    keep_ratio: bool,
    align: AreaAlign,
    overlaps: Vec<AreaId>,
    /// Top-of-stack counter feeding the z-order key field.
    zorder: u32,
    /// Resource stack, descending by key; index 0 is the top.
    stack: Vec<ResourceHandle>,
}

/// Arbiter for the screen resource family.
#[derive(Debug)]
pub struct ScreenArbiter {
    areas: Vec<Option<ScreenArea>>,
    /// Areas attached to each zone, in registration order.
    zones: [Vec<AreaId>; ZONE_MAX],
    grantids: [u32; ZONE_MAX],
    resources: HashMap<ResourceHandle, ScreenResource>,
    by_surface: HashMap<i32, ResourceHandle>,
}

impl Default for ScreenArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenArbiter {
    /// Creates an arbiter with no areas and no resources.
    pub fn new() -> Self {
        Self {
            areas: Vec::new(),
            zones: std::array::from_fn(|_| Vec::new()),
            grantids: [0; ZONE_MAX],
            resources: HashMap::new(),
            by_surface: HashMap::new(),
        }
    }

    /// Current grant id of a zone.
    pub fn grantid(&self, zone: ZoneId) -> u32 {
        self.grantids[zone.index()]
    }

    /// Number of tracked screen resources.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    // --- Area management ---

    /// Registers an area and attaches it to its zone.
    ///
    /// Resources that named this area before it existed are resolved
    /// into it now; a `CREATE` event is queued for each and the
    /// returned mask lists the zones whose owners need recalculation.
    pub(crate) fn area_create(&mut self, ctx: &mut ArbiterCtx<'_>, def: &AreaDef) -> ZoneMask {
        let mut touched = ZoneMask::new();

        if def.id >= AREA_MAX {
            tracing::error!(
                area = %def.name,
                id = def.id,
                "refuse to create screen area: id out of range (0 - {})",
                AREA_MAX - 1
            );
            return touched;
        }
        let Some(zone) = ctx.zones.id(&def.zone) else {
            tracing::error!(
                area = %def.name,
                zone = %def.zone,
                "can't create screen area: can't find its zone"
            );
            return touched;
        };
        if self.areas.len() <= def.id {
            self.areas.resize_with(def.id + 1, || None);
        }
        if self.areas[def.id].is_some() {
            tracing::error!(id = def.id, "attempt to redefine screen area");
            return touched;
        }

        let fullname = def.fullname();

        let mut overlaps = Vec::new();
        for (id, other) in self.areas.iter().enumerate() {
            if let Some(other) = other
                && other.output == def.output
                && other.geometry.overlaps(&def.geometry)
            {
                overlaps.push(id);
            }
        }
        for &id in &overlaps {
            self.areas[id]
                .as_mut()
                .expect("overlap ids reference live areas")
                .overlaps
                .push(def.id);
        }

        self.areas[def.id] = Some(ScreenArea {
            name: def.name.clone(),
            fullname: fullname.clone(),
            output: def.output,
            zone,
            geometry: def.geometry,
            keep_ratio: def.keep_ratio,
            align: def.align.normalized(),
            overlaps,
            zorder: 0,
            stack: Vec::new(),
        });
        self.zones[zone.index()].push(def.id);

        tracing::debug!(area = %fullname, "resolving resources in new area");

        let mut pending: Vec<ResourceHandle> = self
            .resources
            .iter()
            .filter(|(_, r)| r.area.is_none() && r.area_name == fullname)
            .map(|(&h, _)| h)
            .collect();
        pending.sort_unstable();

        for handle in pending {
            let r = self
                .resources
                .get_mut(&handle)
                .expect("pending handles are tracked");
            tracing::debug!(appid = %r.appid, "resolving screen resource");
            r.area = Some(def.id);
            r.output = Some(def.output);
            let (rzone, appid, surface) = (r.zone, r.appid.clone(), r.surface);
            touched.set(rzone);

            let area = self.areas[def.id].as_mut().expect("area created above");
            Self::insert_ordered(&mut area.stack, &self.resources, handle);

            ctx.notifier.queue_screen(
                rzone,
                ctx.zones.name_or_unknown(rzone),
                EventId::Create,
                &appid,
                surface,
                -1,
                &def.name,
            );
        }

        for z in touched.iter() {
            ctx.notifier.flush(z, Some(Family::Screen));
        }

        tracing::info!(id = def.id, area = %fullname, "registered screen area");
        touched
    }

    /// Unregisters an area.
    ///
    /// Its resources survive with their area unresolved again; the
    /// z-order field of their keys is cleared.
    pub(crate) fn area_destroy(&mut self, areaid: AreaId) {
        let Some(area) = self.areas.get_mut(areaid).and_then(Option::take) else {
            tracing::error!(id = areaid, "attempt to destroy non-existent screen area");
            return;
        };

        self.zones[area.zone.index()].retain(|&a| a != areaid);
        for &other in &area.overlaps {
            if let Some(other) = self.areas.get_mut(other).and_then(Option::as_mut) {
                other.overlaps.retain(|&a| a != areaid);
            }
        }
        for handle in area.stack {
            if let Some(r) = self.resources.get_mut(&handle) {
                r.area = None;
                r.output = None;
                r.key = key::screen_with_zorder(r.key, 0);
            }
        }

        tracing::info!(id = areaid, area = %area.fullname, "destroyed screen area");
    }

    fn find_area(&self, fullname: &str) -> Option<AreaId> {
        self.areas.iter().position(|a| {
            a.as_ref().is_some_and(|area| area.fullname == fullname)
        })
    }

    // --- Stack maintenance ---

    /// Reinserts a resource into a stack at its key position.
    ///
    /// The walk is back-to-front so equal keys keep insertion order.
    fn insert_ordered(
        stack: &mut Vec<ResourceHandle>,
        resources: &HashMap<ResourceHandle, ScreenResource>,
        handle: ResourceHandle,
    ) {
        stack.retain(|&h| h != handle);
        let key = resources[&handle].key;
        let pos = stack
            .iter()
            .rposition(|h| resources[h].key >= key)
            .map_or(0, |i| i + 1);
        stack.insert(pos, handle);
    }

    /// Allocates the next top-of-stack z-order value for an area.
    ///
    /// On counter overflow the area is rebased: the minimum in-use
    /// z-order is subtracted from every resource in the stack and the
    /// counter restarts above the compacted range.
    fn zorder_new_top_value(
        area: &mut ScreenArea,
        resources: &mut HashMap<ResourceHandle, ScreenResource>,
    ) -> u32 {
        area.zorder += 1;
        if area.zorder < key::ZORDER_MAX {
            return area.zorder;
        }

        if area.stack.is_empty() {
            area.zorder = 1;
            return 1;
        }

        let mut min = key::ZORDER_MAX;
        let mut max = 0;
        for h in &area.stack {
            let z = key::screen_zorder(resources[h].key);
            min = min.min(z);
            max = max.max(z);
        }

        // Rebasing can't help when the range itself fills the field.
        assert!(
            max - min + 1 < key::ZORDER_MAX,
            "z-order overflow in area '{}'",
            area.name
        );

        for h in &area.stack {
            let r = resources.get_mut(h).expect("stacked handles are tracked");
            let z = key::screen_zorder(r.key) - min;
            r.key = key::screen_with_zorder(r.key, z);
        }

        area.zorder = max - min + 1;
        area.zorder
    }

    fn is_on_top(&self, handle: ResourceHandle) -> bool {
        self.resources
            .get(&handle)
            .and_then(|r| r.area)
            .and_then(|id| self.areas.get(id)?.as_ref())
            .is_some_and(|area| area.stack.first() == Some(&handle))
    }

    /// Raises a resource to the top of its area and marks it acquiring.
    fn raise_to_top(&mut self, handle: ResourceHandle) {
        let areaid = self.resources.get(&handle).and_then(|r| r.area);
        match areaid.and_then(|id| self.areas.get_mut(id)?.as_mut()) {
            Some(area) => {
                let top = Self::zorder_new_top_value(area, &mut self.resources);
                let r = self
                    .resources
                    .get_mut(&handle)
                    .expect("raised handle is tracked");
                r.key = key::screen_with_zorder(r.key, top);
                Self::insert_ordered(&mut area.stack, &self.resources, handle);
            }
            None => {
                tracing::error!("failed to raise screen resource: can't find its area");
            }
        }
        if let Some(r) = self.resources.get_mut(&handle) {
            r.acquire = true;
        }
    }

    /// Drops a resource to the bottom of its area and releases it.
    fn lower_to_bottom(&mut self, handle: ResourceHandle) {
        let areaid = self.resources.get(&handle).and_then(|r| r.area);
        match areaid.and_then(|id| self.areas.get_mut(id)?.as_mut()) {
            Some(area) => {
                let r = self
                    .resources
                    .get_mut(&handle)
                    .expect("lowered handle is tracked");
                r.key = key::screen_with_zorder(r.key, 0);
                Self::insert_ordered(&mut area.stack, &self.resources, handle);
            }
            None => {
                tracing::error!("failed to lower screen resource: can't find its area");
            }
        }
        if let Some(r) = self.resources.get_mut(&handle) {
            r.acquire = false;
        }
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
            tracing::error!(%appid, "failed to create screen resource: can't find application");
            return;
        };

        let surface = res.attrs().integer(SURFACE_ATTR).unwrap_or(0);
        if surface == 0 {
            tracing::error!(%appid, "failed to create screen resource: invalid surface attribute");
            return;
        }

        let area_name = res
            .attrs()
            .string(AREA_ATTR)
            .unwrap_or("<undefined>")
            .to_owned();
        let areaid = self.find_area(&area_name);
        if areaid.is_none() {
            tracing::debug!(area = %area_name, "delayed area resolution");
        }

        let priority = res
            .attrs()
            .integer(PRIORITY_ATTR)
            .filter(|&v| v >= 0)
            .map_or(0, |v| v as u32);
        let classpri = res
            .attrs()
            .integer(CLASSPRI_ATTR)
            .filter(|&v| v >= 0)
            .map_or(class.priority, |v| v as u32);

        let record = ScreenResource {
            zone,
            output: areaid.map(|id| {
                self.areas[id].as_ref().expect("resolved area is live").output
            }),
            area: areaid,
            surface,
            appid: appid.clone(),
            area_name,
            priority,
            classpri,
            key: key::screen_key(priority, classpri, 0),
            acquire: false,
            grant: false,
            grantid: 0,
            requisite: app.requisites.screen,
            disable: DisableMask::empty(),
        };

        ctx.registry.insert(handle, Family::Screen, zone);
        self.resources.insert(handle, record);
        if let Some(old) = self.by_surface.insert(surface, handle) {
            tracing::error!(surface, %old, "surface id reused by another screen resource");
        }

        if let Some(areaid) = areaid {
            let area = self.areas[areaid].as_mut().expect("resolved area is live");
            Self::insert_ordered(&mut area.stack, &self.resources, handle);

            let area_name = self.areas[areaid].as_ref().expect("resolved area is live").name.clone();
            ctx.notifier.queue_screen(
                zone,
                ctx.zones.name_or_unknown(zone),
                EventId::Create,
                &appid,
                surface,
                -1,
                &area_name,
            );
            ctx.notifier.flush(zone, Some(Family::Screen));
        }
    }

    fn resource_destroy(&mut self, ctx: &mut ArbiterCtx<'_>, res: &Resource) {
        let handle = res.handle();
        if ctx.registry.remove(handle).is_none() {
            tracing::debug!(%handle, "destroy of untracked screen resource ignored");
            return;
        }
        let record = self
            .resources
            .remove(&handle)
            .unwrap_or_else(|| panic!("screen resource {handle} in registry but not tracked"));

        ctx.notifier.queue_screen(
            record.zone,
            ctx.zones.name_or_unknown(record.zone),
            EventId::Destroy,
            &record.appid,
            record.surface,
            -1,
            &record.area_name,
        );

        if self.by_surface.get(&record.surface) == Some(&handle) {
            self.by_surface.remove(&record.surface);
        }
        if let Some(area) = record.area.and_then(|id| self.areas.get_mut(id)?.as_mut()) {
            area.stack.retain(|&h| h != handle);
        }

        ctx.notifier.flush(record.zone, Some(Family::Screen));
    }

    fn grant_resources(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId) {
        let zonename = ctx.zones.name_or_unknown(zone);
        self.grantids[zone.index()] += 1;
        let grantid = self.grantids[zone.index()];

        for &areaid in &self.zones[zone.index()] {
            let Some(area) = self.areas[areaid].as_ref() else {
                continue;
            };
            let candidate = area.stack.iter().copied().find(|h| {
                let r = &self.resources[h];
                r.acquire && r.disable.is_empty()
            });
            let area_name = area.name.clone();

            if let Some(handle) = candidate {
                let r = self
                    .resources
                    .get_mut(&handle)
                    .expect("candidate handle is tracked");
                tracing::debug!(
                    area = %area_name,
                    appid = %r.appid,
                    zone = zonename,
                    "preallocate screen resource"
                );
                r.grantid = grantid;
                ctx.notifier.queue_screen(
                    zone,
                    zonename,
                    EventId::Preallocate,
                    &r.appid,
                    r.surface,
                    -1,
                    &area_name,
                );
            }
        }
    }

    fn queue_events(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId) {
        let zonename = ctx.zones.name_or_unknown(zone);
        let grantid = self.grantids[zone.index()];
        let mut grants = Vec::new();

        // One scan; revokes queue immediately so every revoke of the
        // zone precedes its grants.
        for &areaid in &self.zones[zone.index()] {
            let Some(area) = self.areas[areaid].as_ref() else {
                continue;
            };
            for &handle in &area.stack {
                let r = self
                    .resources
                    .get_mut(&handle)
                    .expect("stacked handles are tracked");
                let grant = r.grantid == grantid;
                if grant != r.grant {
                    if grant {
                        grants.push(handle);
                    } else {
                        ctx.notifier.queue_screen(
                            zone,
                            zonename,
                            EventId::Revoke,
                            &r.appid,
                            r.surface,
                            -1,
                            &r.area_name,
                        );
                    }
                }
                r.grant = grant;
            }
        }

        for handle in grants {
            let r = &self.resources[&handle];
            ctx.notifier.queue_screen(
                zone,
                zonename,
                EventId::Grant,
                &r.appid,
                r.surface,
                -1,
                &r.area_name,
            );
        }
    }

    // --- Raise / lower ---

    /// Raises every matching resource to the top of its area.
    ///
    /// With `surface == 0` every resource of the appid is lifted; with
    /// a concrete surface id only that resource, after verifying the
    /// appid. Returns the zones whose owners need recalculation.
    pub(crate) fn raise(&mut self, appid: &str, surface: i32) -> ZoneMask {
        let mut touched = ZoneMask::new();

        if surface == 0 {
            for handle in self.handles_of_appid(appid) {
                if !self.is_on_top(handle) {
                    tracing::debug!(%handle, "raise surface to top");
                    self.raise_to_top(handle);
                    touched.set(self.resources[&handle].zone);
                }
            }
            if touched.is_empty() {
                tracing::debug!(appid, "nothing to be raised");
            }
        } else if let Some(&handle) = self.by_surface.get(&surface) {
            let r = &self.resources[&handle];
            if r.appid != appid {
                tracing::error!(
                    surface,
                    "can't raise window: appid mismatch ('{}' vs. '{}')",
                    r.appid,
                    appid
                );
            } else if self.is_on_top(handle) {
                tracing::debug!(surface, "nothing to be raised: surface is already on top");
            } else {
                tracing::debug!(surface, "raise surface to top");
                self.raise_to_top(handle);
                touched.set(self.resources[&handle].zone);
            }
        } else {
            tracing::debug!(surface, "nothing to be raised: unknown surface");
        }

        touched
    }

    /// Lowers every matching resource to the bottom of its area.
    ///
    /// The counterpart of [`raise`](Self::raise); lowered resources
    /// also lose their acquire flag, and with it grant candidacy.
    pub(crate) fn lower(&mut self, appid: &str, surface: i32) -> ZoneMask {
        let mut touched = ZoneMask::new();

        if surface == 0 {
            for handle in self.handles_of_appid(appid) {
                tracing::debug!(%handle, "lower surface to bottom");
                self.lower_to_bottom(handle);
                touched.set(self.resources[&handle].zone);
            }
            if touched.is_empty() {
                tracing::debug!(appid, "nothing to be lowered");
            }
        } else if let Some(&handle) = self.by_surface.get(&surface) {
            let r = &self.resources[&handle];
            if r.appid != appid {
                tracing::error!(
                    surface,
                    "can't lower window: appid mismatch ('{}' vs. '{}')",
                    r.appid,
                    appid
                );
            } else {
                tracing::debug!(surface, "lower surface to bottom");
                self.lower_to_bottom(handle);
                touched.set(self.resources[&handle].zone);
            }
        } else {
            tracing::debug!(surface, "nothing to be lowered: unknown surface");
        }

        touched
    }

    /// Handles of every stacked resource with the given appid, in area
    /// and stack order.
    fn handles_of_appid(&self, appid: &str) -> Vec<ResourceHandle> {
        self.areas
            .iter()
            .flatten()
            .flat_map(|area| area.stack.iter().copied())
            .filter(|h| self.resources[h].appid == appid)
            .collect()
    }

    // --- Disable overlay ---

    /// Runs a disable/enable pass over the screen resources.
    ///
    /// Returns the number of resources whose mask changed (`-1` on a
    /// reference-lookup failure) and the zones that had a match.
    pub(crate) fn disable(
        &mut self,
        zone: Option<ZoneId>,
        disable: bool,
        filter: &DisableFilter<'_>,
    ) -> (i32, ZoneMask) {
        let bit = filter.mask_bit();
        let mut counter = 0;
        let mut touched = ZoneMask::new();

        if let DisableFilter::Surface(surface) = filter {
            let Some(&handle) = self.by_surface.get(surface) else {
                tracing::error!(surface, "failed to disable screen: can't find surface");
                return (-1, touched);
            };
            let r = self
                .resources
                .get_mut(&handle)
                .expect("surface map entries are tracked");
            if zone.is_none_or(|z| z == r.zone) && disable::apply_bit(&mut r.disable, bit, disable)
            {
                counter += 1;
                touched.set(r.zone);
            }
            return (counter, touched);
        }

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
                DisableFilter::Surface(_) => unreachable!("handled above"),
            };
            if matched && disable::apply_bit(&mut r.disable, bit, disable) {
                counter += 1;
                touched.set(r.zone);
            }
        }

        (counter, touched)
    }

    // --- Introspection ---

    /// Composite keys of an area's stack, top first.
    ///
    /// Empty for unknown areas. Diagnostics; the grant logic never
    /// reads keys through this.
    pub fn stack_keys(&self, areaid: AreaId) -> Vec<u32> {
        self.areas
            .get(areaid)
            .and_then(Option::as_ref)
            .map(|area| {
                area.stack
                    .iter()
                    .map(|h| self.resources[h].key)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Renders the arbiter state of one zone for operators.
    pub fn dump(&self, zone: ZoneId) -> String {
        let mut out = String::new();
        let grantid = self.grantids[zone.index()];
        let _ = writeln!(out, "Resource 'screen' - grantid:{grantid}");

        let areas = &self.zones[zone.index()];
        if areas.is_empty() {
            let _ = writeln!(out, "   No resources");
            return out;
        }

        for &areaid in areas {
            let Some(area) = self.areas[areaid].as_ref() else {
                continue;
            };
            let _ = writeln!(
                out,
                "   Area '{}' ({},{} {}x{} keepratio:{} align:{}):",
                area.name,
                area.geometry.x,
                area.geometry.y,
                area.geometry.width,
                area.geometry.height,
                if area.keep_ratio { "yes" } else { "no" },
                area.align,
            );
            for handle in &area.stack {
                let r = &self.resources[handle];
                let _ = writeln!(
                    out,
                    "      key:0x{:08x} {} grantid:{} requisite:{} disable:{} \
                     appid:'{}' surface:{} output:{} area:'{}' priority:{} classpri:{}",
                    r.key,
                    if r.acquire { "acquire" } else { "release" },
                    r.grantid,
                    r.requisite,
                    r.disable,
                    r.appid,
                    r.surface,
                    r.output.map_or(-1, i64::from),
                    r.area_name,
                    r.priority,
                    r.classpri,
                );
            }
        }
        out
    }
}

impl ZoneArbiter for ScreenArbiter {
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
                tracing::debug!(zone = zonename, "screen resource created");
                self.resource_create(ctx, zone, class, res);
            }
            LifecycleEvent::Destroyed => {
                tracing::debug!(zone = zonename, "screen resource destroyed");
                self.resource_destroy(ctx, res);
            }
            LifecycleEvent::Acquire => {
                tracing::debug!(zone = zonename, "screen resource is acquiring");
                if self.resources.contains_key(&res.handle()) {
                    self.raise_to_top(res.handle());
                } else {
                    tracing::error!(zone = zonename, "can't find screen resource");
                }
            }
            LifecycleEvent::Release => {
                tracing::debug!(zone = zonename, "screen resource is released");
                if self.resources.contains_key(&res.handle()) {
                    self.lower_to_bottom(res.handle());
                } else {
                    tracing::error!(zone = zonename, "can't find screen resource");
                }
            }
        }
    }

    fn init(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId) {
        let zonename = ctx.zones.name_or_unknown(zone);
        tracing::debug!(zone = zonename, "screen init");

        ctx.notifier.queue_screen(
            zone,
            zonename,
            EventId::Init,
            "<unknown>",
            -1,
            -1,
            "<unknown>",
        );
        self.grant_resources(ctx, zone);
        ctx.notifier.flush(zone, Some(Family::Screen));
    }

    fn allocate(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId, res: &Resource) -> bool {
        let zonename = ctx.zones.name_or_unknown(zone);
        let grantid = self.grantids[zone.index()];

        if let Some(r) = self.resources.get(&res.handle()) {
            let allocated = r.grantid == grantid;
            tracing::debug!(
                zone = zonename,
                appid = %r.appid,
                "screen allocation {}",
                if allocated { "succeeded" } else { "failed" }
            );
            return allocated;
        }

        tracing::error!(zone = zonename, "attempt to allocate untracked screen resource");
        false
    }

    fn free(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId, res: &Resource) {
        tracing::debug!(zone = ctx.zones.name_or_unknown(zone), "free screen resource");
        if let Some(r) = self.resources.get_mut(&res.handle()) {
            r.grantid = 0;
        }
    }

    fn advice(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId, _res: &Resource) -> bool {
        tracing::debug!(zone = ctx.zones.name_or_unknown(zone), "screen advice");
        true
    }

    fn commit(&mut self, ctx: &mut ArbiterCtx<'_>, zone: ZoneId) {
        tracing::debug!(zone = ctx.zones.name_or_unknown(zone), "screen commit");
        self.queue_events(ctx, zone);
        ctx.notifier.flush(zone, Some(Family::Screen));
    }
}
