//! Key debouncing
//!
//! Switch contacts bounce for a few ms when they change.  Each position gets a
//! small state machine that only reports a change once the raw reading has
//! agreed with it for a number of scans in a row.
//!
//! With a count of 0 or 1 the raw readings are passed straight through.  The
//! key state machine doesn't need debouncing to work, since a key is only
//! resolved once per press, but a bounce on release would show up as a
//! second press.

use heapless::Vec;

use crate::log::warn;

/// The most positions (matrix plus buttons) that can be debounced.
pub const MAX_POSITIONS: usize = 64;

/// The state of an individual key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum State {
    /// Key is stable with the given pressed state.
    Stable(bool),
    /// We've detected the start of a transition to the dest, but need to see it stable before
    /// considering it done.
    Debounce(bool),
}

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Debouncer {
    state: State,
    /// Count how many times in a row we've seen the debounce target.
    counter: u8,
}

impl Debouncer {
    pub const fn new() -> Debouncer {
        Debouncer {
            state: State::Stable(false),
            counter: 0,
        }
    }

    /// Take a raw reading, and return the debounced one.  `count` is how many
    /// agreeing readings a change needs.
    pub fn react(&mut self, pressed: bool, count: u8) -> bool {
        match self.state {
            State::Stable(cur) => {
                if cur == pressed {
                    cur
                } else if count <= 1 {
                    self.state = State::Stable(pressed);
                    pressed
                } else {
                    self.state = State::Debounce(pressed);
                    self.counter = 1;
                    cur
                }
            }
            State::Debounce(target) => {
                if target != pressed {
                    // Reset the counter any time the state isn't our goal.
                    self.counter = 0;
                    !target
                } else {
                    self.counter = self.counter.saturating_add(1);
                    if self.counter >= count {
                        self.state = State::Stable(target);
                        target
                    } else {
                        !target
                    }
                }
            }
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

/// A debouncer for every position on a board.
pub struct Debounce {
    count: u8,
    keys: Vec<Debouncer, MAX_POSITIONS>,
}

impl Debounce {
    pub fn new(positions: usize, count: u8) -> Debounce {
        let mut keys = Vec::new();
        if keys.resize(positions, Debouncer::new()).is_err() {
            warn!("Only debouncing {} of {} positions", MAX_POSITIONS, positions);
            let _ = keys.resize(MAX_POSITIONS, Debouncer::new());
        }
        Debounce { count, keys }
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn set_count(&mut self, count: u8) {
        self.count = count;
    }

    /// Debounce a reading for the given position.  Positions past what we
    /// have room for are passed through.
    pub fn react(&mut self, position: usize, pressed: bool) -> bool {
        match self.keys.get_mut(position) {
            Some(key) => key.react(pressed, self.count),
            None => pressed,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn passthrough() {
        let mut deb = Debouncer::new();
        for count in [0, 1] {
            assert!(deb.react(true, count));
            assert!(!deb.react(false, count));
        }
    }

    #[test]
    fn bounce() {
        let mut deb = Debouncer::new();

        // Needs three in a row.
        assert!(!deb.react(true, 3));
        assert!(!deb.react(true, 3));
        assert!(deb.react(true, 3));

        // A bounce during release restarts the count.
        assert!(deb.react(false, 3));
        assert!(deb.react(true, 3));
        assert!(deb.react(false, 3));
        assert!(deb.react(false, 3));
        assert!(!deb.react(false, 3));
        assert!(!deb.react(true, 3));
    }

    #[test]
    fn positions() {
        let mut deb = Debounce::new(4, 2);
        assert!(!deb.react(1, true));
        assert!(!deb.react(2, true));
        assert!(deb.react(1, true));
        // Out of range is raw.
        assert!(deb.react(9, true));

        let big = Debounce::new(MAX_POSITIONS + 4, 2);
        assert_eq!(big.keys.len(), MAX_POSITIONS);
    }
}
