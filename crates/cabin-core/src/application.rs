//! Application directory - descriptors for every known application.
//!
//! Applications are created when discovered and updated in place by the
//! external application-update path; the arbiters only consult them.
//! An application contributes its privilege levels, requisite masks,
//! resource class and screen priority to arbitration, plus the
//! `(window name → area name)` bindings used to place windows.

use std::collections::HashMap;
use std::fmt;

use bitflags::bitflags;

/// Appid of the fallback application every directory carries.
///
/// Resources whose appid cannot be resolved inherit this application's
/// class, priority and requisites.
pub const DEFAULT_APPID: &str = "default";

/// Privilege ladder for a resource family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Privilege {
    /// No privilege.
    #[default]
    None,
    /// Certified third-party application.
    Certified,
    /// Manufacturer-installed application.
    Manufacturer,
    /// System application.
    System,
    /// Unrestricted.
    Unlimited,
}

impl Privilege {
    /// Parses a privilege from its lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Privilege::None),
            "certified" => Some(Privilege::Certified),
            "manufacturer" => Some(Privilege::Manufacturer),
            "system" => Some(Privilege::System),
            "unlimited" => Some(Privilege::Unlimited),
            _ => None,
        }
    }

    /// Returns the lowercase name of the privilege level.
    pub fn name(self) -> &'static str {
        match self {
            Privilege::None => "none",
            Privilege::Certified => "certified",
            Privilege::Manufacturer => "manufacturer",
            Privilege::System => "system",
            Privilege::Unlimited => "unlimited",
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Vehicle-state conditions an application declares as requisites.
    ///
    /// Used as the query key of the disable overlay's `Requisite` filter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Requisite: u32 {
        /// Vehicle is driving.
        const DRIVING = 0x01;
        /// Vehicle is parked.
        const PARKED = 0x02;
        /// Reverse gear engaged.
        const REVERSES = 0x04;
        /// Left blinker active.
        const BLINKER_LEFT = 0x08;
        /// Right blinker active.
        const BLINKER_RIGHT = 0x10;
    }
}

impl Requisite {
    /// Parses a single requisite from its lowercase name.
    pub fn from_token(name: &str) -> Option<Self> {
        match name {
            "driving" => Some(Requisite::DRIVING),
            "parked" => Some(Requisite::PARKED),
            "reverses" => Some(Requisite::REVERSES),
            "blinker-left" => Some(Requisite::BLINKER_LEFT),
            "blinker-right" => Some(Requisite::BLINKER_RIGHT),
            _ => None,
        }
    }
}

impl fmt::Display for Requisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names = [
            (Requisite::DRIVING, "driving"),
            (Requisite::PARKED, "parked"),
            (Requisite::REVERSES, "reverses"),
            (Requisite::BLINKER_LEFT, "blinker-left"),
            (Requisite::BLINKER_RIGHT, "blinker-right"),
        ];
        let mut sep = "";
        for (bit, name) in names {
            if self.contains(bit) {
                write!(f, "{sep}{name}")?;
                sep = "|";
            }
        }
        Ok(())
    }
}

/// Per-family privilege levels of an application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Privileges {
    /// Privilege for screen resources.
    pub screen: Privilege,
    /// Privilege for audio resources.
    pub audio: Privilege,
}

/// Per-family requisite masks of an application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requisites {
    /// Requisites inherited by the application's screen resources.
    pub screen: Requisite,
    /// Requisites inherited by the application's audio resources.
    pub audio: Requisite,
}

/// Binding of one of an application's windows to an area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowBinding {
    /// Window name as reported by the application.
    pub window: String,
    /// Fully qualified area name (`output.area`).
    pub area: String,
}

/// Descriptor of one application, keyed by appid.
#[derive(Debug, Clone)]
pub struct Application {
    /// Application id.
    pub appid: String,
    /// Default area name for windows without a binding.
    pub area: Option<String>,
    /// Privilege levels per family.
    pub privileges: Privileges,
    /// Resource class token (`player`, `event`, `phone`, ...).
    pub resource_class: String,
    /// Application-declared screen priority.
    pub screen_priority: i32,
    /// Requisite masks per family.
    pub requisites: Requisites,
    /// Window-to-area bindings.
    pub windows: Vec<WindowBinding>,
}

impl Application {
    /// Creates a descriptor with no privileges, class or bindings.
    pub fn new(appid: impl Into<String>) -> Self {
        Self {
            appid: appid.into(),
            area: None,
            privileges: Privileges::default(),
            resource_class: String::new(),
            screen_priority: 0,
            requisites: Requisites::default(),
            windows: Vec::new(),
        }
    }

    /// Sets the default area name.
    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    /// Sets the resource class.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.resource_class = class.into();
        self
    }

    /// Sets the screen priority.
    pub fn with_screen_priority(mut self, priority: i32) -> Self {
        self.screen_priority = priority;
        self
    }

    /// Sets both privilege levels.
    pub fn with_privileges(mut self, screen: Privilege, audio: Privilege) -> Self {
        self.privileges = Privileges { screen, audio };
        self
    }

    /// Sets both requisite masks.
    pub fn with_requisites(mut self, screen: Requisite, audio: Requisite) -> Self {
        self.requisites = Requisites { screen, audio };
        self
    }

    /// Adds a window-to-area binding.
    pub fn with_window(
        mut self,
        window: impl Into<String>,
        area: impl Into<String>,
    ) -> Self {
        self.windows.push(WindowBinding {
            window: window.into(),
            area: area.into(),
        });
        self
    }

    /// Resolves the area name for one of the application's windows.
    ///
    /// Bindings take precedence; the default area is the fallback.
    pub fn area_for_window(&self, window: &str) -> Option<&str> {
        self.windows
            .iter()
            .find(|b| b.window == window)
            .map(|b| b.area.as_str())
            .or(self.area.as_deref())
    }
}

/// Keyed table of application descriptors.
///
/// Always contains the [`DEFAULT_APPID`] application.
#[derive(Debug)]
pub struct ApplicationDirectory {
    apps: HashMap<String, Application>,
}

impl Default for ApplicationDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationDirectory {
    /// Creates a directory seeded with the default application.
    pub fn new() -> Self {
        let mut apps = HashMap::new();
        apps.insert(
            DEFAULT_APPID.to_owned(),
            Application::new(DEFAULT_APPID).with_class("default"),
        );
        Self { apps }
    }

    /// Installs or replaces an application descriptor.
    pub fn insert(&mut self, app: Application) {
        self.apps.insert(app.appid.clone(), app);
    }

    /// Removes an application by appid.
    ///
    /// The default application cannot be removed.
    pub fn remove(&mut self, appid: &str) -> Option<Application> {
        if appid == DEFAULT_APPID {
            tracing::error!("refusing to remove the default application");
            return None;
        }
        self.apps.remove(appid)
    }

    /// Looks up an application by exact appid.
    pub fn find(&self, appid: &str) -> Option<&Application> {
        self.apps.get(appid)
    }

    /// Resolves an appid, falling back to the default application.
    pub fn resolve(&self, appid: &str) -> Option<&Application> {
        self.apps.get(appid).or_else(|| self.apps.get(DEFAULT_APPID))
    }

    /// Number of applications, the default included.
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Always false: the default application is never removed.
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Iterates all descriptors in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Application> {
        self.apps.values()
    }
}
