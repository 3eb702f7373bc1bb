//! The TOML configuration schema and its installation into an engine.

use std::path::Path;

use cabin_core::{
    Application, AreaAlign, AreaDef, AreaGeometry, Privilege, Requisite, ResourceManager,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::validation::{self, parse_align};

/// One output zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Zone name; arbitration state is scoped by it.
    pub name: String,
}

/// One screen area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaConfig {
    /// Area id; unique, below the engine's area table size.
    pub id: usize,
    /// Area name within its output.
    pub name: String,
    /// Output index.
    pub output: u32,
    /// Output name; resources bind to `output_name.name`.
    pub output_name: String,
    /// Zone the area belongs to.
    pub zone: String,
    /// Left edge in output pixels.
    #[serde(default)]
    pub x: i32,
    /// Top edge in output pixels.
    #[serde(default)]
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Preserve window aspect ratio when fitting.
    #[serde(default)]
    pub keep_ratio: bool,
    /// Anchor tokens: `left`, `right`, `top`, `bottom`.
    #[serde(default)]
    pub align: Vec<String>,
}

impl AreaConfig {
    /// Builds the engine-side area definition.
    pub fn to_def(&self) -> AreaDef {
        let align = self
            .align
            .iter()
            .filter_map(|t| parse_align(t))
            .fold(AreaAlign::empty(), |acc, a| acc | a);
        AreaDef::new(
            self.id,
            self.name.clone(),
            self.output,
            self.output_name.clone(),
            self.zone.clone(),
            AreaGeometry::new(self.x, self.y, self.width, self.height),
        )
        .with_keep_ratio(self.keep_ratio)
        .with_align(align)
    }
}

/// One window-to-area binding of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window name as the application reports it.
    pub window: String,
    /// Fully qualified area name.
    pub area: String,
}

/// One application descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application id.
    pub appid: String,
    /// Resource class token.
    pub class: String,
    /// Default area for unbound windows.
    pub area: Option<String>,
    /// Application-declared screen priority.
    pub screen_priority: i32,
    /// Screen privilege level name.
    pub screen_privilege: String,
    /// Audio privilege level name.
    pub audio_privilege: String,
    /// Screen requisite tokens.
    pub screen_requisites: Vec<String>,
    /// Audio requisite tokens.
    pub audio_requisites: Vec<String>,
    /// Window-to-area bindings.
    pub windows: Vec<WindowConfig>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            appid: String::new(),
            class: String::new(),
            area: None,
            screen_priority: 0,
            screen_privilege: "none".into(),
            audio_privilege: "none".into(),
            screen_requisites: Vec::new(),
            audio_requisites: Vec::new(),
            windows: Vec::new(),
        }
    }
}

impl ApplicationConfig {
    /// Builds the engine-side application descriptor.
    ///
    /// Must only be called on a validated configuration; unparsable
    /// tokens fall back to their defaults here.
    pub fn to_application(&self) -> Application {
        let mut app = Application::new(&self.appid)
            .with_class(&self.class)
            .with_screen_priority(self.screen_priority)
            .with_privileges(
                Privilege::from_name(&self.screen_privilege).unwrap_or_default(),
                Privilege::from_name(&self.audio_privilege).unwrap_or_default(),
            )
            .with_requisites(
                parse_requisites(&self.screen_requisites),
                parse_requisites(&self.audio_requisites),
            );
        if let Some(area) = &self.area {
            app = app.with_area(area);
        }
        for w in &self.windows {
            app = app.with_window(&w.window, &w.area);
        }
        app
    }
}

fn parse_requisites(tokens: &[String]) -> Requisite {
    tokens
        .iter()
        .filter_map(|t| Requisite::from_token(t))
        .fold(Requisite::empty(), |acc, r| acc | r)
}

/// A complete engine configuration: zones, areas and applications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Output zones, in id order.
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
    /// Screen areas.
    #[serde(default)]
    pub areas: Vec<AreaConfig>,
    /// Known applications.
    #[serde(default)]
    pub applications: Vec<ApplicationConfig>,
}

impl SystemConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Serializes the configuration to TOML text.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Loads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&text)
    }

    /// Writes the configuration to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = self.to_toml()?;
        std::fs::write(path, text).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Checks the configuration against the engine's limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)?;
        Ok(())
    }

    /// Validates and installs the configuration into an engine.
    ///
    /// Zones first, then applications, then areas, so late area
    /// registration picks up resources that already name them.
    pub fn apply(&self, mgr: &mut ResourceManager) -> Result<(), ConfigError> {
        self.validate()?;

        for zone in &self.zones {
            mgr.define_zone(&zone.name);
        }
        for app in &self.applications {
            mgr.install_application(app.to_application());
        }
        for area in &self.areas {
            mgr.area_create(&area.to_def());
        }

        tracing::info!(
            zones = self.zones.len(),
            areas = self.areas.len(),
            applications = self.applications.len(),
            "installed system configuration"
        );
        Ok(())
    }
}
