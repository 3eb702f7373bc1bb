//! Notifier event records.
//!
//! Events carry enough context for an external consumer (the window
//! manager for screen, the audio router for audio) to enact a grant
//! decision without consulting the engine again.

use std::fmt;

/// Resource family an event or arbiter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Window surfaces on a compositor.
    Screen,
    /// Audio output streams.
    Audio,
}

impl Family {
    /// Lowercase family name used in logs and dumps.
    pub fn name(self) -> &'static str {
        match self {
            Family::Screen => "screen",
            Family::Audio => "audio",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of a queued resource event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EventId {
    /// A resource was created and attached.
    Create = 1,
    /// A resource was destroyed.
    Destroy = 2,
    /// A zone entered its grant decision.
    Init = 3,
    /// A resource was chosen as a grant candidate for the next commit.
    Preallocate = 4,
    /// A resource transitioned to granted.
    Grant = 5,
    /// A resource lost its grant.
    Revoke = 6,
    /// A zone's decision was committed.
    Commit = 7,
}

impl EventId {
    /// Lowercase event name used in logs and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            EventId::Create => "create",
            EventId::Destroy => "destroy",
            EventId::Init => "init",
            EventId::Preallocate => "preallocate",
            EventId::Grant => "grant",
            EventId::Revoke => "revoke",
            EventId::Commit => "commit",
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Family-specific payload of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    /// Screen event payload.
    Screen {
        /// Surface id of the resource.
        surface: i32,
        /// Layer id; `-1` while layer propagation is unimplemented.
        layer: i32,
        /// Area name the resource names (may be unresolved).
        area: String,
    },
    /// Audio event payload.
    Audio {
        /// Engine-assigned audio id, distinct from the resource handle.
        audio_id: u32,
    },
}

/// One queued notifier event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Family the event belongs to.
    pub family: Family,
    /// Event kind.
    pub id: EventId,
    /// Zone name the event was queued for.
    pub zone: String,
    /// Appid of the affected resource.
    pub appid: String,
    /// Family-specific fields.
    pub payload: EventPayload,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            EventPayload::Screen { surface, layer, area } => write!(
                f,
                "[{}] screen {} appid='{}' surface={} layer={} area='{}'",
                self.zone, self.id, self.appid, surface, layer, area
            ),
            EventPayload::Audio { audio_id } => write!(
                f,
                "[{}] audio {} appid='{}' audioid={}",
                self.zone, self.id, self.appid, audio_id
            ),
        }
    }
}
