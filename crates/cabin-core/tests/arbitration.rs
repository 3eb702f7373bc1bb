//! End-to-end arbitration scenarios.
//!
//! These drive the whole engine through the external callback surface
//! and assert on the event stream the sink observes, the way the
//! window manager and audio router would.

use std::cell::RefCell;
use std::rc::Rc;

use cabin_core::{
    ApplicationClass, AreaDef, AreaGeometry, DisableFilter, Event, EventId, Family,
    LifecycleEvent, Resource, ResourceHandle, ResourceManager, ZoneId,
};

const ZONE: ZoneId = ZoneId(0);

struct Harness {
    mgr: ResourceManager,
    events: Rc<RefCell<Vec<Event>>>,
}

impl Harness {
    fn new() -> Self {
        let mut mgr = ResourceManager::new();
        mgr.define_zone("driver").unwrap();
        mgr.area_create(&AreaDef::new(
            0,
            "full",
            0,
            "center",
            "driver",
            AreaGeometry::new(0, 0, 1920, 1080),
        ));

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        mgr.register_sink(move |ev: &Event| sink.borrow_mut().push(ev.clone()));

        Self { mgr, events }
    }

    fn screen_resource(&mut self, handle: u64, appid: &str, surface: i32, priority: i32) -> Resource {
        let mut res = Resource::screen(ResourceHandle(handle));
        res.attrs_mut().set_string("appid", appid);
        res.attrs_mut().set_integer("surface", surface);
        res.attrs_mut().set_integer("priority", priority);
        res.attrs_mut().set_string("area", "center.full");
        let class = ApplicationClass::new("basic", 0);
        self.mgr.notify(LifecycleEvent::Created, ZONE, &class, &res);
        res
    }

    fn audio_resource(
        &mut self,
        handle: u64,
        appid: &str,
        class: &str,
        priority: i32,
        shared: bool,
    ) -> Resource {
        let mut res = Resource::audio(ResourceHandle(handle)).with_shared(shared);
        res.attrs_mut().set_string("appid", appid);
        res.attrs_mut().set_integer("priority", priority);
        let class = ApplicationClass::new(class, 0);
        self.mgr.notify(LifecycleEvent::Created, ZONE, &class, &res);
        res
    }

    fn acquire(&mut self, res: &Resource) {
        let class = ApplicationClass::new("basic", 0);
        self.mgr.notify(LifecycleEvent::Acquire, ZONE, &class, res);
    }

    fn destroy(&mut self, res: &Resource) {
        let class = ApplicationClass::new("basic", 0);
        self.mgr.notify(LifecycleEvent::Destroyed, ZONE, &class, res);
    }

    fn decide(&mut self, family: Family) {
        self.mgr.init(family, ZONE);
        self.mgr.commit(family, ZONE);
    }

    /// Drops the events recorded so far and returns them.
    fn take_events(&mut self) -> Vec<Event> {
        self.events.borrow_mut().drain(..).collect()
    }

    /// `(event, appid)` pairs of the grant/revoke traffic only.
    fn grant_traffic(&mut self) -> Vec<(EventId, String)> {
        self.take_events()
            .into_iter()
            .filter(|e| matches!(e.id, EventId::Grant | EventId::Revoke))
            .map(|e| (e.id, e.appid))
            .collect()
    }
}

// --- Screen scenarios ---

#[test]
fn higher_priority_acquirer_wins_the_area() {
    let mut h = Harness::new();
    let a = h.screen_resource(1, "app-a", 101, 0);
    let b = h.screen_resource(2, "app-b", 102, 1);
    h.acquire(&a);
    h.acquire(&b);

    h.decide(Family::Screen);

    assert_eq!(h.grant_traffic(), vec![(EventId::Grant, "app-b".to_owned())]);
}

#[test]
fn late_acquire_raises_above_higher_priority() {
    let mut h = Harness::new();
    let a = h.screen_resource(1, "app-a", 101, 0);
    let b = h.screen_resource(2, "app-b", 102, 1);

    h.acquire(&b);
    h.decide(Family::Screen);
    assert_eq!(h.grant_traffic(), vec![(EventId::Grant, "app-b".to_owned())]);

    // A acquires after B: recency outranks declared priority.
    h.acquire(&a);
    h.decide(Family::Screen);
    assert_eq!(
        h.grant_traffic(),
        vec![
            (EventId::Revoke, "app-b".to_owned()),
            (EventId::Grant, "app-a".to_owned()),
        ]
    );
}

#[test]
fn revokes_precede_grants_within_a_commit() {
    let mut h = Harness::new();
    let a = h.screen_resource(1, "app-a", 101, 0);
    let b = h.screen_resource(2, "app-b", 102, 0);
    h.acquire(&a);
    h.decide(Family::Screen);
    h.acquire(&b);
    h.take_events();

    h.decide(Family::Screen);

    let ids: Vec<EventId> = h
        .take_events()
        .iter()
        .filter(|e| matches!(e.id, EventId::Grant | EventId::Revoke))
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, [EventId::Revoke, EventId::Grant]);
}

#[test]
fn raise_of_unknown_appid_changes_nothing() {
    let mut h = Harness::new();
    let a = h.screen_resource(1, "app-a", 101, 0);
    h.acquire(&a);
    h.decide(Family::Screen);
    h.take_events();

    h.mgr.raise("no-such-app", 0);

    assert!(h.take_events().is_empty());
    assert!(h.mgr.allocate(ZONE, &a));
}

#[test]
fn raise_is_idempotent_for_grant_purposes() {
    let mut h = Harness::new();
    let a = h.screen_resource(1, "app-a", 101, 0);
    let b = h.screen_resource(2, "app-b", 102, 5);
    h.acquire(&a);
    h.acquire(&b);
    h.take_events();

    h.mgr.raise("app-a", 0);
    let first: Vec<_> = h.grant_traffic();
    assert!(first.contains(&(EventId::Grant, "app-a".to_owned())));

    // Raising again leaves the placement and the grant unchanged.
    h.mgr.raise("app-a", 0);
    let second = h.grant_traffic();
    assert!(second.is_empty(), "second raise queued {second:?}");
}

#[test]
fn lower_revokes_grant_candidacy() {
    let mut h = Harness::new();
    let a = h.screen_resource(1, "app-a", 101, 0);
    let b = h.screen_resource(2, "app-b", 102, 0);
    h.acquire(&a);
    h.acquire(&b); // B on top
    h.decide(Family::Screen);
    h.take_events();

    h.mgr.lower("app-b", 0);

    assert_eq!(
        h.grant_traffic(),
        vec![
            (EventId::Revoke, "app-b".to_owned()),
            (EventId::Grant, "app-a".to_owned()),
        ]
    );
}

#[test]
fn surface_addressed_raise_checks_appid() {
    let mut h = Harness::new();
    let a = h.screen_resource(1, "app-a", 101, 0);
    let b = h.screen_resource(2, "app-b", 102, 0);
    h.acquire(&a);
    h.acquire(&b);
    h.take_events();

    // Wrong appid for surface 102: logged error, no state change.
    h.mgr.raise("app-a", 102);
    assert!(h.take_events().is_empty());

    h.mgr.raise("app-a", 101);
    let traffic = h.grant_traffic();
    assert!(traffic.contains(&(EventId::Grant, "app-a".to_owned())));
}

// --- Audio scenarios ---

#[test]
fn non_shared_interrupt_takes_the_zone_alone() {
    let mut h = Harness::new();
    let player = h.audio_resource(11, "app-player", "player", 0, true);
    let event = h.audio_resource(12, "app-event", "event", 0, false);
    let phone = h.audio_resource(13, "app-phone", "phone", 5, false);
    h.acquire(&player);
    h.acquire(&event);
    h.acquire(&phone);

    h.decide(Family::Audio);

    assert_eq!(
        h.grant_traffic(),
        vec![(EventId::Grant, "app-phone".to_owned())]
    );
}

#[test]
fn shared_winner_lets_shared_followers_in() {
    let mut h = Harness::new();
    let player = h.audio_resource(11, "app-player", "player", 0, true);
    let event = h.audio_resource(12, "app-event", "event", 0, false);
    let phone = h.audio_resource(13, "app-phone", "phone", 5, true);
    h.acquire(&player);
    h.acquire(&event);
    h.acquire(&phone);

    h.decide(Family::Audio);

    let traffic = h.grant_traffic();
    assert!(traffic.contains(&(EventId::Grant, "app-phone".to_owned())));
    assert!(traffic.contains(&(EventId::Grant, "app-player".to_owned())));
    assert!(!traffic.iter().any(|(_, appid)| appid == "app-event"));
}

#[test]
fn at_most_one_non_shared_audio_grant() {
    let mut h = Harness::new();
    let a = h.audio_resource(11, "app-a", "event", 0, false);
    let b = h.audio_resource(12, "app-b", "event", 3, false);
    h.acquire(&a);
    h.acquire(&b);

    h.decide(Family::Audio);

    let granted = h.mgr.audio().granted(ZONE);
    let non_shared = granted.iter().filter(|(_, shared)| !shared).count();
    assert_eq!(non_shared, 1);
}

#[test]
fn audio_free_clears_grant_immediately() {
    let mut h = Harness::new();
    let player = h.audio_resource(11, "app-player", "player", 0, true);
    h.acquire(&player);
    h.decide(Family::Audio);
    assert!(h.mgr.allocate(ZONE, &player));

    h.mgr.free(ZONE, &player);
    assert!(!h.mgr.allocate(ZONE, &player));
}

// --- Disable overlay scenarios ---

#[test]
fn disable_moves_the_grant_and_enable_moves_it_back() {
    let mut h = Harness::new();
    let a = h.screen_resource(1, "app-a", 101, 0);
    let b = h.screen_resource(2, "app-b", 102, 0);
    h.acquire(&a);
    h.acquire(&b); // B on top, B granted
    h.decide(Family::Screen);
    h.take_events();

    let n = h
        .mgr
        .disable(Family::Screen, "*", true, &DisableFilter::Appid("app-b"), true);
    assert_eq!(n, 1);
    assert_eq!(
        h.grant_traffic(),
        vec![
            (EventId::Revoke, "app-b".to_owned()),
            (EventId::Grant, "app-a".to_owned()),
        ]
    );

    let n = h
        .mgr
        .disable(Family::Screen, "*", false, &DisableFilter::Appid("app-b"), true);
    assert_eq!(n, 1);
    assert_eq!(
        h.grant_traffic(),
        vec![
            (EventId::Revoke, "app-a".to_owned()),
            (EventId::Grant, "app-b".to_owned()),
        ]
    );
}

#[test]
fn disable_is_idempotent_and_counted_once() {
    let mut h = Harness::new();
    let _a = h.screen_resource(1, "app-a", 101, 0);

    let filter = DisableFilter::Appid("app-a");
    assert_eq!(h.mgr.disable(Family::Screen, "*", true, &filter, false), 1);
    assert_eq!(h.mgr.disable(Family::Screen, "*", true, &filter, false), 0);
    assert_eq!(h.mgr.disable(Family::Screen, "*", false, &filter, false), 1);
    assert_eq!(h.mgr.disable(Family::Screen, "*", false, &filter, false), 0);
}

#[test]
fn enable_disable_enable_roundtrip_restores_outcome() {
    let mut h = Harness::new();
    let a = h.screen_resource(1, "app-a", 101, 0);
    h.acquire(&a);
    h.decide(Family::Screen);
    h.take_events();

    let filter = DisableFilter::Appid("app-a");
    h.mgr.disable(Family::Screen, "*", true, &filter, true);
    h.mgr.disable(Family::Screen, "*", false, &filter, true);

    // Back where we started: A granted, mask clear.
    assert!(h.mgr.allocate(ZONE, &a));
    let traffic = h.grant_traffic();
    assert_eq!(traffic.last(), Some(&(EventId::Grant, "app-a".to_owned())));
}

#[test]
fn disable_wildcard_appid_hits_everything() {
    let mut h = Harness::new();
    let _a = h.screen_resource(1, "app-a", 101, 0);
    let _b = h.screen_resource(2, "app-b", 102, 0);

    let n = h
        .mgr
        .disable(Family::Screen, "*", true, &DisableFilter::Appid("*"), false);
    assert_eq!(n, 2);
}

// --- Boundary behaviors ---

#[test]
fn resource_reattaches_when_its_area_appears() {
    let mut h = Harness::new();
    let mut res = Resource::screen(ResourceHandle(5));
    res.attrs_mut().set_string("appid", "app-late");
    res.attrs_mut().set_integer("surface", 105);
    res.attrs_mut().set_string("area", "center.side");
    let class = ApplicationClass::new("basic", 0);
    h.mgr.notify(LifecycleEvent::Created, ZONE, &class, &res);
    h.acquire(&res);

    // No create event yet: the area is unknown.
    assert!(h.take_events().is_empty());

    h.mgr.area_create(&AreaDef::new(
        1,
        "side",
        0,
        "center",
        "driver",
        AreaGeometry::new(1920, 0, 640, 1080),
    ));

    let events = h.take_events();
    assert_eq!(events[0].id, EventId::Create);
    assert_eq!(events[0].appid, "app-late");
    assert!(events.iter().any(|e| e.id == EventId::Grant));
}

#[test]
fn destroy_and_recreate_yield_identical_keys() {
    let mut h = Harness::new();
    let res = h.screen_resource(1, "app-a", 101, 3);
    let before = h.mgr.screen().stack_keys(0);

    h.destroy(&res);
    assert!(h.mgr.screen().stack_keys(0).is_empty());

    h.screen_resource(1, "app-a", 101, 3);
    assert_eq!(h.mgr.screen().stack_keys(0), before);
}

#[test]
fn destroy_emits_destroy_event_and_forgets_the_resource() {
    let mut h = Harness::new();
    let res = h.screen_resource(1, "app-a", 101, 0);
    h.take_events();

    h.destroy(&res);

    let events = h.take_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, EventId::Destroy);
    assert_eq!(h.mgr.screen().resource_count(), 0);
    assert!(!h.mgr.allocate(ZONE, &res));
}

#[test]
fn grantids_are_monotonic_per_zone() {
    let mut h = Harness::new();
    let mut last = h.mgr.screen().grantid(ZONE);
    for _ in 0..5 {
        h.decide(Family::Screen);
        let now = h.mgr.screen().grantid(ZONE);
        assert!(now > last);
        last = now;
    }
}

#[test]
fn zones_decide_independently() {
    let mut h = Harness::new();
    h.mgr.define_zone("passenger").unwrap();
    h.mgr.area_create(&AreaDef::new(
        1,
        "full",
        1,
        "rear",
        "passenger",
        AreaGeometry::new(0, 0, 1280, 720),
    ));

    let mut res = Resource::screen(ResourceHandle(9));
    res.attrs_mut().set_string("appid", "app-rear");
    res.attrs_mut().set_integer("surface", 901);
    res.attrs_mut().set_string("area", "rear.full");
    let class = ApplicationClass::new("basic", 0);
    let rear = ZoneId(1);
    h.mgr.notify(LifecycleEvent::Created, rear, &class, &res);
    h.mgr.notify(LifecycleEvent::Acquire, rear, &class, &res);
    h.take_events();

    h.mgr.init(Family::Screen, rear);
    h.mgr.commit(Family::Screen, rear);

    let events = h.take_events();
    assert!(events.iter().all(|e| e.zone == "passenger"));
    assert_eq!(h.mgr.screen().grantid(ZONE), 0);
}
