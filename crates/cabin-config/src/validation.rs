//! Structural validation of a [`SystemConfig`](crate::SystemConfig).
//!
//! Validation rejects configurations the engine would only discover
//! piecemeal at install time: duplicate names and ids, references to
//! undefined zones, and privilege/requisite/alignment tokens that
//! don't parse. A valid configuration installs without a single
//! engine-side error log.

use cabin_core::{AREA_MAX, Privilege, Requisite, ZONE_MAX};
use thiserror::Error;

use crate::system::SystemConfig;

/// A reason a configuration cannot be installed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// More zones than the engine supports.
    #[error("too many zones: {0} defined, at most {ZONE_MAX} supported")]
    TooManyZones(usize),

    /// The same zone name appears twice.
    #[error("duplicate zone name '{0}'")]
    DuplicateZone(String),

    /// The same area id appears twice.
    #[error("duplicate area id {0}")]
    DuplicateAreaId(usize),

    /// An area id beyond the engine's table.
    #[error("area id {0} out of range (0 - {max})", max = AREA_MAX - 1)]
    AreaIdOutOfRange(usize),

    /// An area names a zone the configuration does not define.
    #[error("area '{area}' references unknown zone '{zone}'")]
    UnknownZone {
        /// Name of the offending area.
        area: String,
        /// The unresolvable zone name.
        zone: String,
    },

    /// The same appid appears twice.
    #[error("duplicate application '{0}'")]
    DuplicateApplication(String),

    /// A privilege token that does not parse.
    #[error("application '{appid}' has unknown privilege '{value}'")]
    UnknownPrivilege {
        /// Appid of the offending application.
        appid: String,
        /// The unparsable token.
        value: String,
    },

    /// A requisite token that does not parse.
    #[error("application '{appid}' has unknown requisite '{value}'")]
    UnknownRequisite {
        /// Appid of the offending application.
        appid: String,
        /// The unparsable token.
        value: String,
    },

    /// An alignment token that does not parse.
    #[error("area '{area}' has unknown alignment '{value}'")]
    UnknownAlign {
        /// Name of the offending area.
        area: String,
        /// The unparsable token.
        value: String,
    },
}

/// Checks a configuration against the engine's structural limits.
pub fn validate(config: &SystemConfig) -> Result<(), ValidationError> {
    if config.zones.len() > ZONE_MAX {
        return Err(ValidationError::TooManyZones(config.zones.len()));
    }
    for (i, zone) in config.zones.iter().enumerate() {
        if config.zones[..i].iter().any(|z| z.name == zone.name) {
            return Err(ValidationError::DuplicateZone(zone.name.clone()));
        }
    }

    for (i, area) in config.areas.iter().enumerate() {
        if area.id >= AREA_MAX {
            return Err(ValidationError::AreaIdOutOfRange(area.id));
        }
        if config.areas[..i].iter().any(|a| a.id == area.id) {
            return Err(ValidationError::DuplicateAreaId(area.id));
        }
        if !config.zones.iter().any(|z| z.name == area.zone) {
            return Err(ValidationError::UnknownZone {
                area: area.name.clone(),
                zone: area.zone.clone(),
            });
        }
        for token in &area.align {
            if parse_align(token).is_none() {
                return Err(ValidationError::UnknownAlign {
                    area: area.name.clone(),
                    value: token.clone(),
                });
            }
        }
    }

    for (i, app) in config.applications.iter().enumerate() {
        if config.applications[..i].iter().any(|a| a.appid == app.appid) {
            return Err(ValidationError::DuplicateApplication(app.appid.clone()));
        }
        for value in [&app.screen_privilege, &app.audio_privilege] {
            if Privilege::from_name(value).is_none() {
                return Err(ValidationError::UnknownPrivilege {
                    appid: app.appid.clone(),
                    value: value.clone(),
                });
            }
        }
        for token in app.screen_requisites.iter().chain(&app.audio_requisites) {
            if Requisite::from_token(token).is_none() {
                return Err(ValidationError::UnknownRequisite {
                    appid: app.appid.clone(),
                    value: token.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Parses one alignment token.
pub(crate) fn parse_align(token: &str) -> Option<cabin_core::AreaAlign> {
    match token {
        "left" => Some(cabin_core::AreaAlign::LEFT),
        "right" => Some(cabin_core::AreaAlign::RIGHT),
        "top" => Some(cabin_core::AreaAlign::TOP),
        "bottom" => Some(cabin_core::AreaAlign::BOTTOM),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{ApplicationConfig, AreaConfig, SystemConfig, ZoneConfig};

    fn minimal() -> SystemConfig {
        SystemConfig {
            zones: vec![ZoneConfig {
                name: "driver".into(),
            }],
            areas: vec![AreaConfig {
                id: 0,
                name: "full".into(),
                output: 0,
                output_name: "center".into(),
                zone: "driver".into(),
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
                keep_ratio: false,
                align: vec![],
            }],
            applications: vec![],
        }
    }

    #[test]
    fn minimal_config_is_valid() {
        assert_eq!(validate(&minimal()), Ok(()));
    }

    #[test]
    fn duplicate_zone_rejected() {
        let mut config = minimal();
        config.zones.push(ZoneConfig {
            name: "driver".into(),
        });
        assert_eq!(
            validate(&config),
            Err(ValidationError::DuplicateZone("driver".into()))
        );
    }

    #[test]
    fn unknown_zone_reference_rejected() {
        let mut config = minimal();
        config.areas[0].zone = "backseat".into();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::UnknownZone { .. })
        ));
    }

    #[test]
    fn duplicate_area_id_rejected() {
        let mut config = minimal();
        let mut dup = config.areas[0].clone();
        dup.name = "other".into();
        config.areas.push(dup);
        assert_eq!(validate(&config), Err(ValidationError::DuplicateAreaId(0)));
    }

    #[test]
    fn bad_privilege_rejected() {
        let mut config = minimal();
        config.applications.push(ApplicationConfig {
            appid: "x".into(),
            screen_privilege: "root".into(),
            ..ApplicationConfig::default()
        });
        assert!(matches!(
            validate(&config),
            Err(ValidationError::UnknownPrivilege { .. })
        ));
    }

    #[test]
    fn bad_requisite_rejected() {
        let mut config = minimal();
        config.applications.push(ApplicationConfig {
            appid: "x".into(),
            screen_requisites: vec!["flying".into()],
            ..ApplicationConfig::default()
        });
        assert!(matches!(
            validate(&config),
            Err(ValidationError::UnknownRequisite { .. })
        ));
    }

    #[test]
    fn bad_align_rejected() {
        let mut config = minimal();
        config.areas[0].align = vec!["center".into()];
        assert!(matches!(
            validate(&config),
            Err(ValidationError::UnknownAlign { .. })
        ));
    }
}
