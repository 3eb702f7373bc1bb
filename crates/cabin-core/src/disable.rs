//! Disable overlay - administrative masking of resources.
//!
//! An operator can temporarily block resources from being granted
//! without deleting them. Each resource carries a [`DisableMask`]; a
//! disable pass selects resources with a [`DisableFilter`] and sets or
//! clears the single mask bit corresponding to the filter kind. A
//! resource with any bit set is skipped by the grant scan.

use std::fmt;

use bitflags::bitflags;

use crate::application::Requisite;

bitflags! {
    /// Per-resource disable bits, one per filter kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DisableMask: u32 {
        /// Disabled through a requisite filter.
        const REQUISITE = 0x01;
        /// Disabled through an appid filter.
        const APPID = 0x02;
        /// Disabled through a surface-id filter (screen only).
        const SURFACE = 0x04;
    }
}

impl fmt::Display for DisableMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names = [
            (DisableMask::REQUISITE, "requisite"),
            (DisableMask::APPID, "appid"),
            (DisableMask::SURFACE, "surface"),
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

/// Selector of a disable pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisableFilter<'a> {
    /// Matches resources whose requisite mask covers the query mask.
    ///
    /// An empty query matches nothing.
    Requisite(Requisite),
    /// Matches resources of the given appid, or every resource for `"*"`.
    Appid(&'a str),
    /// Matches the screen resource with the given surface id.
    ///
    /// Invalid for the audio family.
    Surface(i32),
}

impl DisableFilter<'_> {
    /// The mask bit this filter kind sets or clears.
    pub fn mask_bit(&self) -> DisableMask {
        match self {
            DisableFilter::Requisite(_) => DisableMask::REQUISITE,
            DisableFilter::Appid(_) => DisableMask::APPID,
            DisableFilter::Surface(_) => DisableMask::SURFACE,
        }
    }
}

/// Applies one disable/enable step to a resource's mask.
///
/// Returns `true` when the mask actually changed; a resource already
/// in the requested state is not counted by the pass.
pub(crate) fn apply_bit(mask: &mut DisableMask, bit: DisableMask, disable: bool) -> bool {
    let set = mask.contains(bit);
    if disable {
        if set {
            return false;
        }
        mask.insert(bit);
    } else {
        if !set {
            return false;
        }
        mask.remove(bit);
    }
    true
}
