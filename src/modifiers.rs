//! Modifiers and locks
//!
//! There are four modifier keys on the board: two shifts, alt and symbol.
//! They act while held.  On top of those are two latches, caps-lock and
//! num-lock, which are toggled by chords:
//!
//! - Right shift + alt turns caps-lock on.
//! - Left shift + alt turns num-lock on.
//! - A shift press otherwise turns both off.
//!
//! Each latch can only change once for as long as alt stays down, which keeps
//! a held chord from flickering the latch on every key that goes down with it.
//!
//! Caps-lock acts as a held shift, and num-lock as a held alt, when resolving
//! characters.  Symbol acts as control.

use bitflags::bitflags;
use enumset::{EnumSet, EnumSetType};

use crate::config::ConfigFlags;
use crate::keymap::{KeyEntry, Keymap, KEY_MOD_ALT, KEY_MOD_SHL, KEY_MOD_SHR, KEY_MOD_SYM};

/// The modifier keys.
#[derive(EnumSetType, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Modifier {
    Alt,
    ShiftLeft,
    ShiftRight,
    Symbol,
}

impl Modifier {
    /// The character reported for this modifier when modifiers are reported
    /// as keys.
    pub fn marker(self) -> u8 {
        match self {
            Modifier::Alt => KEY_MOD_ALT,
            Modifier::ShiftLeft => KEY_MOD_SHL,
            Modifier::ShiftRight => KEY_MOD_SHR,
            Modifier::Symbol => KEY_MOD_SYM,
        }
    }
}

bitflags! {
    /// Which latches changed during a key press.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct LockChange: u8 {
        const CAPS = 0b01;
        const NUM = 0b10;
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Latch {
    on: bool,
    /// Set once the latch has changed during the current alt gesture.
    changed: bool,
}

impl Latch {
    fn set(&mut self, on: bool) {
        self.on = on;
        self.changed = true;
    }
}

/// The current modifier and latch state.
#[derive(Clone, Debug, Default)]
pub struct ModifierState {
    held: EnumSet<Modifier>,
    caps: Latch,
    num: Latch,
}

impl ModifierState {
    pub fn new() -> ModifierState {
        ModifierState::default()
    }

    pub fn is_active(&self, modifier: Modifier) -> bool {
        self.held.contains(modifier)
    }

    /// All of the modifiers currently held.
    pub fn held(&self) -> EnumSet<Modifier> {
        self.held
    }

    pub fn capslock(&self) -> bool {
        self.caps.on
    }

    pub fn numlock(&self) -> bool {
        self.num.on
    }

    /// A key has gone down.  Marks its modifier as held, and then applies the
    /// latch rules.  Returns the latches that changed and should be announced.
    ///
    /// The rules are checked in a fixed order, and the enable rules come
    /// before the disable ones.  Since each one marks its latch as changed,
    /// a shift + alt chord enables, where a bare shift disables.
    pub fn press(&mut self, modifier: Option<Modifier>) -> LockChange {
        if let Some(modifier) = modifier {
            self.held.insert(modifier);
        }

        let alt = self.held.contains(Modifier::Alt);
        let shift_left = self.held.contains(Modifier::ShiftLeft);
        let shift_right = self.held.contains(Modifier::ShiftRight);
        let mut change = LockChange::empty();

        if !self.num.changed && shift_left && alt {
            self.num.set(true);
            change |= LockChange::NUM;
        }

        if !self.caps.changed && shift_right && alt {
            self.caps.set(true);
            change |= LockChange::CAPS;
        }

        if !self.caps.changed && (shift_left || shift_right) {
            self.caps.set(false);
            change |= LockChange::CAPS;
        }

        if !self.num.changed && (shift_left || shift_right) {
            self.num.set(false);
            change |= LockChange::NUM;
        }

        // Outside of an alt gesture, nothing stays marked, and nothing is
        // announced.
        if !alt {
            self.rearm();
            return LockChange::empty();
        }

        change
    }

    /// A key has gone up.  Releasing alt ends the gesture.
    pub fn release(&mut self, modifier: Option<Modifier>) {
        if let Some(modifier) = modifier {
            self.held.remove(modifier);
            if modifier == Modifier::Alt {
                self.rearm();
            }
        }
    }

    fn rearm(&mut self) {
        self.caps.changed = false;
        self.num.changed = false;
    }

    /// Compute the character a key produces under the current modifiers.
    ///
    /// Returns 0 when the key should produce nothing.
    pub fn resolve(&self, entry: &KeyEntry, keymap: &Keymap, flags: ConfigFlags) -> u8 {
        if let Some(modifier) = entry.modifier {
            return if flags.contains(ConfigFlags::REPORT_MODIFIERS) {
                modifier.marker()
            } else {
                0
            };
        }

        if !flags.contains(ConfigFlags::USE_MODIFIERS) {
            return entry.normal;
        }

        let shift = self.held.contains(Modifier::ShiftLeft)
            || self.held.contains(Modifier::ShiftRight)
            || self.caps.on;
        let alt = self.held.contains(Modifier::Alt) || self.num.on;
        let ctrl = self.held.contains(Modifier::Symbol);

        if let Some(button) = entry.button() {
            // Later checks win, so control beats shift beats alt.
            let mut index = 0;
            if alt {
                index = 1;
            }
            if shift {
                index = 2;
            }
            if ctrl {
                index = 3;
            }
            return keymap.remap(index, button);
        }

        if alt {
            entry.alt
        } else if entry.normal.is_ascii_uppercase() {
            if ctrl {
                entry.normal - 0x40
            } else if !shift {
                entry.normal + 0x20
            } else {
                entry.normal
            }
        } else {
            entry.normal
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keymap::{DEFAULT_KEYMAP, KEY_BTN_LEFT1, KEY_BTN_RIGHT2, KEY_JOY_RIGHT};

    const USE: ConfigFlags = ConfigFlags::USE_MODIFIERS;

    fn a() -> KeyEntry {
        KeyEntry::new(b'A', b'*')
    }

    #[test]
    fn letters() {
        let mut mods = ModifierState::new();
        let map = &DEFAULT_KEYMAP;

        assert_eq!(mods.resolve(&a(), map, USE), b'a');

        mods.press(Some(Modifier::ShiftLeft));
        assert_eq!(mods.resolve(&a(), map, USE), b'A');
        mods.release(Some(Modifier::ShiftLeft));

        mods.press(Some(Modifier::Symbol));
        assert_eq!(mods.resolve(&a(), map, USE), 0x01);
        mods.release(Some(Modifier::Symbol));

        mods.press(Some(Modifier::Alt));
        assert_eq!(mods.resolve(&a(), map, USE), b'*');

        // Non letters pass through.
        mods.release(Some(Modifier::Alt));
        assert_eq!(mods.resolve(&KeyEntry::new(b'~', b'0'), map, USE), b'~');
    }

    #[test]
    fn capslock_shifts() {
        let mut mods = ModifierState::new();
        mods.press(Some(Modifier::ShiftRight));
        mods.press(Some(Modifier::Alt));
        mods.release(Some(Modifier::Alt));
        mods.release(Some(Modifier::ShiftRight));
        assert!(mods.capslock());

        assert_eq!(mods.resolve(&a(), &DEFAULT_KEYMAP, USE), b'A');
    }

    #[test]
    fn modifiers_ignored() {
        let mut mods = ModifierState::new();
        mods.press(Some(Modifier::ShiftLeft));
        assert_eq!(mods.resolve(&a(), &DEFAULT_KEYMAP, ConfigFlags::empty()), b'A');
    }

    #[test]
    fn modifier_markers() {
        let mods = ModifierState::new();
        let alt = KeyEntry::modifier(Modifier::Alt);
        assert_eq!(mods.resolve(&alt, &DEFAULT_KEYMAP, USE), 0);
        assert_eq!(
            mods.resolve(&alt, &DEFAULT_KEYMAP, USE | ConfigFlags::REPORT_MODIFIERS),
            KEY_MOD_ALT
        );
        assert_eq!(
            mods.resolve(
                &KeyEntry::modifier(Modifier::Symbol),
                &DEFAULT_KEYMAP,
                ConfigFlags::REPORT_MODIFIERS
            ),
            KEY_MOD_SYM
        );
    }

    #[test]
    fn button_precedence() {
        let mut mods = ModifierState::new();
        let map = &DEFAULT_KEYMAP;
        let left1 = KeyEntry::plain(KEY_BTN_LEFT1);
        let right2 = KeyEntry::plain(KEY_BTN_RIGHT2);

        assert_eq!(mods.resolve(&left1, map, USE), map.remap(0, 0));
        assert_eq!(mods.resolve(&right2, map, USE), b'\\');

        mods.press(Some(Modifier::Alt));
        assert_eq!(mods.resolve(&left1, map, USE), b'*');

        // Control wins over everything.
        mods.press(Some(Modifier::Symbol));
        mods.press(Some(Modifier::ShiftLeft));
        assert_eq!(mods.resolve(&right2, map, USE), KEY_JOY_RIGHT);

        mods.release(Some(Modifier::Symbol));
        assert_eq!(mods.resolve(&right2, map, USE), b'}');

        // Without the modifier flag, the button code itself goes out.
        assert_eq!(mods.resolve(&right2, map, ConfigFlags::empty()), KEY_BTN_RIGHT2);
    }

    #[test]
    fn latch_once_per_gesture() {
        let mut mods = ModifierState::new();

        assert_eq!(mods.press(Some(Modifier::ShiftRight)), LockChange::empty());
        let change = mods.press(Some(Modifier::Alt));
        assert!(change.contains(LockChange::CAPS));
        assert!(mods.capslock());

        // More keys during the same gesture change nothing.
        assert_eq!(mods.press(None), LockChange::empty());
        assert_eq!(mods.press(Some(Modifier::Symbol)), LockChange::empty());
        assert!(mods.capslock());

        // Releasing alt re-arms, and the chord fires again.
        mods.release(Some(Modifier::Alt));
        assert!(mods.press(Some(Modifier::Alt)).contains(LockChange::CAPS));
        assert!(mods.capslock());
    }

    #[test]
    fn numlock_and_shift_clear() {
        let mut mods = ModifierState::new();
        mods.press(Some(Modifier::Alt));
        let change = mods.press(Some(Modifier::ShiftLeft));
        assert_eq!(change, LockChange::NUM | LockChange::CAPS);
        assert!(mods.numlock());
        assert!(!mods.capslock());

        mods.release(Some(Modifier::ShiftLeft));
        mods.release(Some(Modifier::Alt));
        assert!(mods.numlock());

        // A plain shift press turns the latch back off, quietly.
        assert_eq!(mods.press(Some(Modifier::ShiftLeft)), LockChange::empty());
        assert!(!mods.numlock());
    }
}
