//! Composite sort keys.
//!
//! A composite key is a packed `u32` summarizing a resource's position
//! in its ordered list. Lists are kept strictly descending by key;
//! equal keys preserve insertion order. Each family packs different
//! fields:
//!
//! - screen: `priority` (8 bits, low), `class_priority` (8 bits),
//!   `zorder` (16 bits, high); a raise-to-top always wins because the
//!   z-order occupies the most significant bits;
//! - audio: `stamp` (13 bits, low, reserved), `priority` (8),
//!   `class_priority` (8), `acquire` (1), `share` (1), `interrupt`
//!   (1, high).

const fn mask(width: u32) -> u32 {
    (1 << width) - 1
}

const PRIORITY_BITS: u32 = 8;
const CLASSPRI_BITS: u32 = 8;

// Screen layout.
const ZORDER_BITS: u32 = 16;
const SCREEN_PRIORITY_POS: u32 = 0;
const SCREEN_CLASSPRI_POS: u32 = SCREEN_PRIORITY_POS + PRIORITY_BITS;
const ZORDER_POS: u32 = SCREEN_CLASSPRI_POS + CLASSPRI_BITS;

/// First z-order value that no longer fits the screen key field.
pub const ZORDER_MAX: u32 = 1 << ZORDER_BITS;

// Audio layout.
const STAMP_BITS: u32 = 13;
const STAMP_POS: u32 = 0;
const AUDIO_PRIORITY_POS: u32 = STAMP_POS + STAMP_BITS;
const AUDIO_CLASSPRI_POS: u32 = AUDIO_PRIORITY_POS + PRIORITY_BITS;
const ACQUIRE_POS: u32 = AUDIO_CLASSPRI_POS + CLASSPRI_BITS;
const SHARE_POS: u32 = ACQUIRE_POS + 1;
const INTERRUPT_POS: u32 = SHARE_POS + 1;

/// Packs a screen key from its components.
///
/// Out-of-range components are truncated to their field width.
pub fn screen_key(priority: u32, class_priority: u32, zorder: u32) -> u32 {
    ((priority & mask(PRIORITY_BITS)) << SCREEN_PRIORITY_POS)
        | ((class_priority & mask(CLASSPRI_BITS)) << SCREEN_CLASSPRI_POS)
        | ((zorder & mask(ZORDER_BITS)) << ZORDER_POS)
}

/// Extracts the z-order field of a screen key.
pub fn screen_zorder(key: u32) -> u32 {
    (key >> ZORDER_POS) & mask(ZORDER_BITS)
}

/// Replaces the z-order field of a screen key.
pub fn screen_with_zorder(key: u32, zorder: u32) -> u32 {
    (key & !(mask(ZORDER_BITS) << ZORDER_POS)) | ((zorder & mask(ZORDER_BITS)) << ZORDER_POS)
}

/// Packs an audio key from its components.
///
/// The stamp field is reserved and currently always passed as 0.
pub fn audio_key(
    stamp: u32,
    priority: u32,
    class_priority: u32,
    acquire: bool,
    share: bool,
    interrupt: bool,
) -> u32 {
    ((stamp & mask(STAMP_BITS)) << STAMP_POS)
        | ((priority & mask(PRIORITY_BITS)) << AUDIO_PRIORITY_POS)
        | ((class_priority & mask(CLASSPRI_BITS)) << AUDIO_CLASSPRI_POS)
        | (u32::from(acquire) << ACQUIRE_POS)
        | (u32::from(share) << SHARE_POS)
        | (u32::from(interrupt) << INTERRUPT_POS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_zorder_dominates_priority() {
        let high_pri = screen_key(200, 50, 1);
        let raised = screen_key(0, 0, 2);
        assert!(raised > high_pri);
    }

    #[test]
    fn screen_priority_breaks_equal_zorder() {
        let a = screen_key(3, 0, 7);
        let b = screen_key(4, 0, 7);
        assert!(b > a);
    }

    #[test]
    fn screen_classpri_dominates_priority() {
        let a = screen_key(255, 0, 0);
        let b = screen_key(0, 1, 0);
        assert!(b > a);
    }

    #[test]
    fn screen_zorder_field_roundtrip() {
        let key = screen_key(12, 34, 0);
        let keyed = screen_with_zorder(key, 0xBEEF);
        assert_eq!(screen_zorder(keyed), 0xBEEF);
        assert_eq!(screen_with_zorder(keyed, 0), key);
    }

    #[test]
    fn screen_fields_are_truncated() {
        let key = screen_key(0x1FF, 0, 0);
        assert_eq!(key, screen_key(0xFF, 0, 0));
        assert_eq!(screen_zorder(screen_with_zorder(0, ZORDER_MAX)), 0);
    }

    #[test]
    fn audio_interrupt_dominates_everything() {
        let loud = audio_key(0, 255, 255, true, true, false);
        let interrupting = audio_key(0, 0, 0, false, false, true);
        assert!(interrupting > loud);
    }

    #[test]
    fn audio_share_dominates_acquire() {
        let acquiring = audio_key(0, 0, 0, true, false, false);
        let sharing = audio_key(0, 0, 0, false, true, false);
        assert!(sharing > acquiring);
    }

    #[test]
    fn audio_priority_orders_same_flags() {
        let a = audio_key(0, 1, 0, true, false, true);
        let b = audio_key(0, 2, 0, true, false, true);
        assert!(b > a);
    }

    #[test]
    fn audio_stamp_is_least_significant() {
        let stamped = audio_key(0x1FFF, 0, 0, false, false, false);
        let priority = audio_key(0, 1, 0, false, false, false);
        assert!(priority > stamped);
    }
}
