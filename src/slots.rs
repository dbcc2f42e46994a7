//! Tracked keys
//!
//! Only the keys that are currently doing something get any state.  The slot
//! table holds up to `N` of them.  A key is given a slot when it is first seen
//! pressed, and gives it back once it has been released.  If every slot is
//! taken, further presses are just ignored until one frees up.

use crate::keymap::KeyId;
use crate::KeyState;

/// A single tracked key.
#[derive(Clone, Copy, Debug, Default)]
pub struct Slot {
    /// The key this slot is tracking, None when free.
    pub key: Option<KeyId>,
    /// When the key went down, in ms.
    pub press_time: u32,
    pub state: KeyState,
    /// The resolved character, 0 until resolved.
    pub effective: u8,
}

impl Slot {
    const FREE: Slot = Slot {
        key: None,
        press_time: 0,
        state: KeyState::Idle,
        effective: 0,
    };

    pub fn is_free(&self) -> bool {
        self.key.is_none()
    }
}

pub struct SlotTable<const N: usize> {
    slots: [Slot; N],
}

impl<const N: usize> SlotTable<N> {
    pub const fn new() -> Self {
        SlotTable {
            slots: [Slot::FREE; N],
        }
    }

    /// The slot currently tracking `key`.
    pub fn find(&self, key: KeyId) -> Option<usize> {
        self.slots.iter().position(|s| s.key == Some(key))
    }

    /// Bind the first free slot to `key`.  Returns None if the table is full.
    pub fn allocate(&mut self, key: KeyId) -> Option<usize> {
        let index = self.slots.iter().position(Slot::is_free)?;
        self.slots[index] = Slot {
            key: Some(key),
            ..Slot::FREE
        };
        Some(index)
    }

    pub fn free(&mut self, index: usize) {
        self.slots[index] = Slot::FREE;
    }

    pub fn get(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Slot {
        &mut self.slots[index]
    }

    /// Number of slots in use.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_free()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        N
    }

    /// The slots in use, with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Slot)> {
        self.slots.iter().enumerate().filter(|(_, s)| !s.is_free())
    }
}

impl<const N: usize> Default for SlotTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn allocate_and_free() {
        let mut table = SlotTable::<3>::new();
        assert!(table.is_empty());

        let a = table.allocate(KeyId::Matrix(4)).unwrap();
        let b = table.allocate(KeyId::Button(0)).unwrap();
        assert_ne!(a, b);
        assert_eq!(table.find(KeyId::Matrix(4)), Some(a));
        assert_eq!(table.find(KeyId::Button(0)), Some(b));
        assert_eq!(table.find(KeyId::Matrix(0)), None);
        assert_eq!(table.len(), 2);

        table.get_mut(a).effective = b'x';
        table.free(a);
        assert_eq!(table.find(KeyId::Matrix(4)), None);
        assert_eq!(table.len(), 1);

        // Freed slots are reused, and come back clean.
        let c = table.allocate(KeyId::Matrix(9)).unwrap();
        assert_eq!(c, a);
        assert_eq!(table.get(c).effective, 0);
        assert_eq!(table.get(c).state, KeyState::Idle);
    }

    #[test]
    fn full() {
        let mut table = SlotTable::<2>::new();
        assert!(table.allocate(KeyId::Matrix(0)).is_some());
        assert!(table.allocate(KeyId::Matrix(1)).is_some());
        assert_eq!(table.allocate(KeyId::Matrix(2)), None);
        assert_eq!(table.len(), table.capacity());
        assert_eq!(table.iter().count(), 2);
    }
}
