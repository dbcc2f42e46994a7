//! Keymaps
//!
//! A keymap says what each physical position on the board means.  Matrix
//! positions are numbered `row * cols + col`, and the directly wired buttons
//! have their own numbering starting at zero.
//!
//! Most keys carry two characters: the one typed normally, and the one typed
//! when alt (or num-lock) is in effect.  A few keys are modifiers instead, and
//! four "button" keys get their characters from a small remap table indexed by
//! which modifier is active.

use crate::modifiers::Modifier;

// Joystick.
pub const KEY_JOY_UP: u8 = 0x01;
pub const KEY_JOY_DOWN: u8 = 0x02;
pub const KEY_JOY_LEFT: u8 = 0x03;
pub const KEY_JOY_RIGHT: u8 = 0x04;
pub const KEY_JOY_CENTER: u8 = 0x05;

// The four buttons that go through the remap table.
pub const KEY_BTN_LEFT1: u8 = 0x06;
pub const KEY_BTN_RIGHT1: u8 = 0x07;
pub const KEY_BTN_LEFT2: u8 = 0x11;
pub const KEY_BTN_RIGHT2: u8 = 0x12;

// Markers reported for the modifiers themselves.
pub const KEY_MOD_ALT: u8 = 0x1A;
pub const KEY_MOD_SHL: u8 = 0x1B;
pub const KEY_MOD_SHR: u8 = 0x1C;
pub const KEY_MOD_SYM: u8 = 0x1D;

const ESC: u8 = 0x1B;

/// The definition of a single key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEntry {
    /// Character typed without alt.  Zero for a position with no key.
    pub normal: u8,
    /// Character typed with alt.  Zero if alt has nothing to give.
    pub alt: u8,
    /// Set if this key is a modifier rather than a character.
    pub modifier: Option<Modifier>,
}

impl KeyEntry {
    /// An unpopulated position.
    pub const NONE: KeyEntry = KeyEntry::new(0, 0);

    pub const fn new(normal: u8, alt: u8) -> KeyEntry {
        KeyEntry {
            normal,
            alt,
            modifier: None,
        }
    }

    /// A key with no alt character.
    pub const fn plain(normal: u8) -> KeyEntry {
        KeyEntry::new(normal, 0)
    }

    pub const fn modifier(modifier: Modifier) -> KeyEntry {
        KeyEntry {
            normal: 0,
            alt: 0,
            modifier: Some(modifier),
        }
    }

    /// If this is one of the remapped buttons, which column of the remap
    /// table it reads from.
    pub fn button(&self) -> Option<usize> {
        match self.normal {
            KEY_BTN_LEFT1 => Some(0),
            KEY_BTN_LEFT2 => Some(1),
            KEY_BTN_RIGHT1 => Some(2),
            KEY_BTN_RIGHT2 => Some(3),
            _ => None,
        }
    }
}

/// A physical position, as an index into one of the keymap's tables.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyId {
    /// `row * cols + col` in the matrix.
    Matrix(u16),
    /// A directly wired button.
    Button(u8),
}

/// The remap table for the buttons.  Indexed by `[modifier][button]`, where
/// modifier 0 is none, 1 alt, 2 shift and 3 control.
pub type ButtonMap = [[u8; 4]; 4];

/// The full description of a board's keys.
pub struct Keymap {
    rows: usize,
    cols: usize,
    matrix: &'static [KeyEntry],
    buttons: &'static [KeyEntry],
    button_map: ButtonMap,
}

impl Keymap {
    /// Build a keymap.  `matrix` is laid out row major, and must have exactly
    /// `rows * cols` entries.
    pub const fn new(
        rows: usize,
        cols: usize,
        matrix: &'static [KeyEntry],
        buttons: &'static [KeyEntry],
        button_map: ButtonMap,
    ) -> Keymap {
        assert!(matrix.len() == rows * cols, "keymap matrix size mismatch");
        // Positions are carried in a `KeyId`.
        assert!(rows * cols <= u16::MAX as usize + 1, "keymap matrix too large");
        assert!(buttons.len() <= u8::MAX as usize + 1, "too many keymap buttons");
        Keymap {
            rows,
            cols,
            matrix,
            buttons,
            button_map,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    /// The id of the key at the given matrix location.
    pub fn matrix_id(&self, row: usize, col: usize) -> KeyId {
        KeyId::Matrix((row * self.cols + col) as u16)
    }

    pub fn get(&self, id: KeyId) -> Option<&KeyEntry> {
        match id {
            KeyId::Matrix(n) => self.matrix.get(n as usize),
            KeyId::Button(n) => self.buttons.get(n as usize),
        }
    }

    /// Look up a remapped button character.
    pub fn remap(&self, modifier: usize, button: usize) -> u8 {
        self.button_map[modifier][button]
    }
}

/// The layout of the 7x6 matrix board, with one extra button wired directly.
///
/// The matrix rows and columns don't follow the visual rows of the keyboard,
/// they follow the wiring.
pub static DEFAULT_KEYMAP: Keymap =
    Keymap::new(7, 6, &DEFAULT_MATRIX, &DEFAULT_BUTTONS, DEFAULT_BUTTON_MAP);

const fn k(normal: char, alt: char) -> KeyEntry {
    KeyEntry::new(normal as u8, alt as u8)
}

const fn m(modifier: Modifier) -> KeyEntry {
    KeyEntry::modifier(modifier)
}

const NO: KeyEntry = KeyEntry::NONE;

#[rustfmt::skip]
const DEFAULT_MATRIX: [KeyEntry; 42] = [
    // Row 0
    KeyEntry::plain(KEY_JOY_CENTER), k('W', '1'), k('G', '/'), k('S', '4'), k('L', '"'), k('H', ':'),
    // Row 1
    NO, k('Q', '#'), k('R', '3'), k('E', '2'), k('O', '+'), k('U', '_'),
    // Row 2
    KeyEntry::plain(KEY_BTN_LEFT1), k('~', '0'), k('F', '6'), m(Modifier::ShiftLeft), k('K', '\''), k('J', ';'),
    // Row 3
    NO, k(' ', '\t'), k('C', '9'), k('Z', '7'), k('M', '.'), k('N', ','),
    // Row 4
    KeyEntry::plain(KEY_BTN_LEFT2), m(Modifier::Symbol), k('T', '('), k('D', '5'), k('I', '-'), k('Y', ')'),
    // Row 5
    KeyEntry::plain(KEY_BTN_RIGHT1), m(Modifier::Alt), k('V', '?'), k('X', '8'), k('$', '`'), k('B', '!'),
    // Row 6
    NO, k('A', '*'), m(Modifier::ShiftRight), k('P', '@'), KeyEntry::plain(0x08), k('\n', '|'),
];

const DEFAULT_BUTTONS: [KeyEntry; 1] = [KeyEntry::plain(KEY_BTN_RIGHT2)];

const DEFAULT_BUTTON_MAP: ButtonMap = [
    [ESC, b'&', b'=', b'\\'],
    [b'*', b'%', b'[', b']'],
    [b'<', b'>', b'{', b'}'],
    [KEY_JOY_LEFT, KEY_JOY_DOWN, KEY_JOY_UP, KEY_JOY_RIGHT],
];

#[cfg(test)]
mod test {
    use alloc::vec;

    use super::*;

    #[test]
    fn default_lookup() {
        let map = &DEFAULT_KEYMAP;
        assert_eq!(map.rows(), 7);
        assert_eq!(map.cols(), 6);
        assert_eq!(map.button_count(), 1);

        let q = map.get(map.matrix_id(1, 1)).unwrap();
        assert_eq!(q.normal, b'Q');
        assert_eq!(q.alt, b'#');

        let alt = map.get(map.matrix_id(5, 1)).unwrap();
        assert_eq!(alt.modifier, Some(Modifier::Alt));

        assert_eq!(map.get(KeyId::Button(0)).unwrap().normal, KEY_BTN_RIGHT2);
        assert_eq!(map.get(KeyId::Button(1)), None);
        assert_eq!(map.get(KeyId::Matrix(42)), None);
    }

    #[test]
    #[should_panic(expected = "keymap matrix too large")]
    fn matrix_too_large() {
        let matrix = vec![KeyEntry::NONE; 257 * 256].leak();
        Keymap::new(257, 256, matrix, &[], [[0; 4]; 4]);
    }

    #[test]
    #[should_panic(expected = "too many keymap buttons")]
    fn too_many_buttons() {
        let buttons = vec![KeyEntry::NONE; 257].leak();
        Keymap::new(1, 1, &[KeyEntry::NONE], buttons, [[0; 4]; 4]);
    }

    #[test]
    fn buttons() {
        assert_eq!(KeyEntry::plain(KEY_BTN_LEFT1).button(), Some(0));
        assert_eq!(KeyEntry::plain(KEY_BTN_LEFT2).button(), Some(1));
        assert_eq!(KeyEntry::plain(KEY_BTN_RIGHT1).button(), Some(2));
        assert_eq!(KeyEntry::plain(KEY_BTN_RIGHT2).button(), Some(3));
        assert_eq!(KeyEntry::plain(KEY_JOY_CENTER).button(), None);
        assert_eq!(DEFAULT_KEYMAP.remap(0, 0), ESC);
        assert_eq!(DEFAULT_KEYMAP.remap(3, 3), KEY_JOY_RIGHT);
    }
}
