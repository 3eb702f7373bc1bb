//! Event notifier - per-zone FIFO queues with a single installed sink.
//!
//! Arbiters stage create/destroy/init/preallocate/grant/revoke events
//! here while they mutate their ordered lists; a flush delivers the
//! queued events of one zone to the sink in FIFO order. Flushing first
//! detaches the drained events from the queue, so a sink that queues
//! further events never observes the list it is being fed from.

use std::collections::VecDeque;

use crate::event::{Event, EventId, EventPayload, Family};
use crate::zone::{ZONE_MAX, ZoneId};

/// How many entries [`Notifier::remove_last`] examines before giving
/// up. A safety cap, not a semantic contract: the event to coalesce is
/// always the immediately preceding one.
pub const EVENT_SCAN_MAX: usize = 4;

/// Callback invoked once per flushed event.
pub type EventSink = Box<dyn FnMut(&Event)>;

#[derive(Default)]
struct NotifierZone {
    events: VecDeque<Event>,
    nscreen: usize,
    naudio: usize,
}

impl NotifierZone {
    fn count(&self, filter: Option<Family>) -> usize {
        match filter {
            Some(Family::Screen) => self.nscreen,
            Some(Family::Audio) => self.naudio,
            None => self.nscreen + self.naudio,
        }
    }

    fn counter_mut(&mut self, family: Family) -> &mut usize {
        match family {
            Family::Screen => &mut self.nscreen,
            Family::Audio => &mut self.naudio,
        }
    }
}

/// Per-zone event queues and the fan-out sink.
pub struct Notifier {
    zones: Vec<NotifierZone>,
    sink: Option<EventSink>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    /// Creates a notifier with empty queues and no sink.
    pub fn new() -> Self {
        Self {
            zones: (0..ZONE_MAX).map(|_| NotifierZone::default()).collect(),
            sink: None,
        }
    }

    /// Installs the event sink, replacing any previous one.
    ///
    /// Without a sink, flushes still drain the queues; the events are
    /// discarded.
    pub fn register_sink(&mut self, sink: impl FnMut(&Event) + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Appends a screen event to a zone's queue.
    pub fn queue_screen(
        &mut self,
        zone: ZoneId,
        zone_name: &str,
        id: EventId,
        appid: &str,
        surface: i32,
        layer: i32,
        area: &str,
    ) {
        tracing::debug!(
            zone = zone_name,
            event = %id,
            appid,
            surface,
            layer,
            area,
            "queued screen event"
        );
        let nz = &mut self.zones[zone.index()];
        nz.events.push_back(Event {
            family: Family::Screen,
            id,
            zone: zone_name.to_owned(),
            appid: appid.to_owned(),
            payload: EventPayload::Screen {
                surface,
                layer,
                area: area.to_owned(),
            },
        });
        nz.nscreen += 1;
    }

    /// Appends an audio event to a zone's queue.
    pub fn queue_audio(
        &mut self,
        zone: ZoneId,
        zone_name: &str,
        id: EventId,
        appid: &str,
        audio_id: u32,
    ) {
        tracing::debug!(
            zone = zone_name,
            event = %id,
            appid,
            audio_id,
            "queued audio event"
        );
        let nz = &mut self.zones[zone.index()];
        nz.events.push_back(Event {
            family: Family::Audio,
            id,
            zone: zone_name.to_owned(),
            appid: appid.to_owned(),
            payload: EventPayload::Audio { audio_id },
        });
        nz.naudio += 1;
    }

    /// Removes the most recently queued event of a family in a zone.
    ///
    /// Used to coalesce a redundant event with its immediate
    /// predecessor. Examines at most [`EVENT_SCAN_MAX`] entries from
    /// the tail; logs an error when no matching event is found.
    pub fn remove_last(&mut self, zone: ZoneId, family: Family) {
        let nz = &mut self.zones[zone.index()];
        let found = nz
            .events
            .iter()
            .rev()
            .take(EVENT_SCAN_MAX)
            .position(|ev| ev.family == family);

        match found {
            Some(back_offset) => {
                let index = nz.events.len() - 1 - back_offset;
                let ev = nz.events.remove(index).expect("indexed event exists");
                tracing::debug!(zone = zone.index(), event = %ev.id, "removed last {} event", family);
                *nz.counter_mut(family) -= 1;
            }
            None => {
                tracing::error!(
                    zone = zone.index(),
                    "failed to remove last {} event: non-existent event",
                    family
                );
            }
        }
    }

    /// Number of queued events in a zone, optionally per family.
    pub fn pending(&self, zone: ZoneId, filter: Option<Family>) -> usize {
        self.zones[zone.index()].count(filter)
    }

    /// Drains a zone's events in FIFO order, invoking the sink per event.
    ///
    /// `filter` limits the drain to one family; `None` drains
    /// everything in the zone.
    pub fn flush(&mut self, zone: ZoneId, filter: Option<Family>) {
        let nz = &mut self.zones[zone.index()];
        let nevent = nz.count(filter);
        if nevent == 0 {
            tracing::debug!(zone = zone.index(), "event queue is empty: nothing to flush");
            return;
        }

        tracing::debug!(
            zone = zone.index(),
            nevent,
            "{} queued events",
            if self.sink.is_some() { "forwarding" } else { "throwing away" }
        );

        // Detach matching events before invoking the sink.
        let mut drained = Vec::with_capacity(nevent);
        let mut kept = VecDeque::with_capacity(nz.events.len() - nevent);
        while let Some(ev) = nz.events.pop_front() {
            if filter.is_none() || filter == Some(ev.family) {
                *nz.counter_mut(ev.family) -= 1;
                drained.push(ev);
            } else {
                kept.push_back(ev);
            }
        }
        nz.events = kept;

        if let Some(sink) = self.sink.as_mut() {
            for ev in &drained {
                sink(ev);
            }
        }
    }
}
