//! The key event queue
//!
//! Key events are held in a queue until the host gets around to reading them.
//! The queue itself belongs to whatever serves the host, the keyboard only
//! needs to be able to put things in it, through [`KeyQueue`].  A fixed
//! [`ArrayDeque`] is provided as one.
//!
//! [`QueueForwarder`] is the key subscriber that feeds the queue, and applies
//! the overflow policy from the configuration.  [`StatusNotifier`] raises the
//! lock change interrupts.

use core::cell::RefCell;

use arraydeque::{ArrayDeque, Saturating};

use crate::config::{Config, ConfigFlags, Interrupts};
use crate::dispatch::{KeyListener, LockListener};
use crate::log::{debug, warn};
use crate::KeyState;

/// A single queued key event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueItem {
    pub key: u8,
    pub state: KeyState,
}

/// A bounded queue of key events.
pub trait KeyQueue {
    /// Add an item, returning false if there is no room.
    fn try_enqueue(&mut self, item: QueueItem) -> bool;

    /// Add an item regardless.  What gets lost to make room is up to the queue.
    fn force_enqueue(&mut self, item: QueueItem);
}

/// A full deque makes room by dropping its oldest item.
impl<const N: usize> KeyQueue for ArrayDeque<QueueItem, N, Saturating> {
    fn try_enqueue(&mut self, item: QueueItem) -> bool {
        self.push_back(item).is_ok()
    }

    fn force_enqueue(&mut self, item: QueueItem) {
        if self.is_full() {
            self.pop_front();
        }
        let _ = self.push_back(item);
    }
}

impl<Q: KeyQueue + ?Sized> KeyQueue for &mut Q {
    fn try_enqueue(&mut self, item: QueueItem) -> bool {
        (**self).try_enqueue(item)
    }

    fn force_enqueue(&mut self, item: QueueItem) {
        (**self).force_enqueue(item)
    }
}

impl<Q: KeyQueue> KeyQueue for &RefCell<Q> {
    fn try_enqueue(&mut self, item: QueueItem) -> bool {
        self.borrow_mut().try_enqueue(item)
    }

    fn force_enqueue(&mut self, item: QueueItem) {
        self.borrow_mut().force_enqueue(item)
    }
}

/// Forwards key events into a queue.
///
/// When the queue is full, `OVERFLOW_ON_INTERRUPT` raises the overflow
/// interrupt, and `OVERFLOW_FORCE_ENQUEUE` pushes the event in anyway.  The
/// two are independent.
pub struct QueueForwarder<C, Q> {
    config: C,
    queue: Q,
}

impl<C: Config, Q: KeyQueue> QueueForwarder<C, Q> {
    pub fn new(config: C, queue: Q) -> Self {
        QueueForwarder { config, queue }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn into_inner(self) -> Q {
        self.queue
    }
}

impl<C: Config, Q: KeyQueue> KeyListener for QueueForwarder<C, Q> {
    fn key_event(&mut self, key: u8, state: KeyState) {
        let item = QueueItem { key, state };
        let flags = self.config.flags();

        let queued = if self.queue.try_enqueue(item) {
            true
        } else {
            warn!("Key queue full: {}", key);

            if flags.contains(ConfigFlags::OVERFLOW_ON_INTERRUPT) {
                self.config.raise(Interrupts::OVERFLOW);
            }

            if flags.contains(ConfigFlags::OVERFLOW_FORCE_ENQUEUE) {
                self.queue.force_enqueue(item);
                true
            } else {
                false
            }
        };

        if queued && flags.contains(ConfigFlags::KEY_INTERRUPT) {
            self.config.raise(Interrupts::KEY);
        }
    }
}

/// Raises the lock interrupts when the latches change.
pub struct StatusNotifier<C> {
    config: C,
}

impl<C: Config> StatusNotifier<C> {
    pub fn new(config: C) -> Self {
        StatusNotifier { config }
    }
}

impl<C: Config> LockListener for StatusNotifier<C> {
    fn lock_changed(&mut self, caps_changed: bool, num_changed: bool) {
        let flags = self.config.flags();
        let mut raise = Interrupts::empty();

        if caps_changed && flags.contains(ConfigFlags::CAPSLOCK_INTERRUPT) {
            raise |= Interrupts::CAPSLOCK;
        }
        if num_changed && flags.contains(ConfigFlags::NUMLOCK_INTERRUPT) {
            raise |= Interrupts::NUMLOCK;
        }

        if !raise.is_empty() {
            debug!("Lock interrupt: {}", raise.bits());
            self.config.raise(raise);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Registers;

    type Fifo = ArrayDeque<QueueItem, 2, Saturating>;

    fn item(key: u8) -> QueueItem {
        QueueItem {
            key,
            state: KeyState::Pressed,
        }
    }

    #[test]
    fn forward() {
        let regs = Registers::new();
        let fifo = RefCell::new(Fifo::new());
        let mut fwd = QueueForwarder::new(&regs, &fifo);

        fwd.key_event(b'a', KeyState::Pressed);
        fwd.key_event(b'a', KeyState::Released);
        assert_eq!(fifo.borrow().len(), 2);
        assert_eq!(regs.take_interrupts(), Interrupts::KEY);
    }

    #[test]
    fn overflow_interrupt() {
        let regs = Registers::new();
        regs.set_flags(ConfigFlags::OVERFLOW_ON_INTERRUPT);
        let fifo = RefCell::new(Fifo::new());
        let mut fwd = QueueForwarder::new(&regs, &fifo);

        fwd.key_event(b'a', KeyState::Pressed);
        fwd.key_event(b'b', KeyState::Pressed);
        assert_eq!(regs.interrupts(), Interrupts::empty());

        fwd.key_event(b'c', KeyState::Pressed);
        assert_eq!(regs.take_interrupts(), Interrupts::OVERFLOW);
        fwd.key_event(b'd', KeyState::Pressed);
        assert_eq!(regs.take_interrupts(), Interrupts::OVERFLOW);

        // Nothing forced in.
        let fifo = fifo.into_inner();
        assert_eq!(fifo.front(), Some(&item(b'a')));
        assert_eq!(fifo.back(), Some(&item(b'b')));
    }

    #[test]
    fn overflow_force() {
        let regs = Registers::new();
        regs.set_flags(ConfigFlags::OVERFLOW_ON_INTERRUPT | ConfigFlags::OVERFLOW_FORCE_ENQUEUE);
        let fifo = RefCell::new(Fifo::new());
        let mut fwd = QueueForwarder::new(&regs, &fifo);

        for key in [b'a', b'b', b'c'] {
            fwd.key_event(key, KeyState::Pressed);
        }
        assert_eq!(regs.take_interrupts(), Interrupts::OVERFLOW);

        let fifo = fifo.into_inner();
        assert_eq!(fifo.front(), Some(&item(b'b')));
        assert_eq!(fifo.back(), Some(&item(b'c')));
    }

    #[test]
    fn force_without_interrupt() {
        let regs = Registers::new();
        regs.set_flags(ConfigFlags::OVERFLOW_FORCE_ENQUEUE);
        let mut fifo = Fifo::new();
        {
            let mut fwd = QueueForwarder::new(&regs, &mut fifo);
            for key in [b'a', b'b', b'c'] {
                fwd.key_event(key, KeyState::Hold);
            }
        }
        assert_eq!(regs.interrupts(), Interrupts::empty());
        assert_eq!(fifo.len(), 2);
    }

    #[test]
    fn lock_interrupts() {
        let regs = Registers::new();
        regs.set_flags(ConfigFlags::CAPSLOCK_INTERRUPT);
        let mut notify = StatusNotifier::new(&regs);

        notify.lock_changed(false, true);
        assert_eq!(regs.interrupts(), Interrupts::empty());
        notify.lock_changed(true, true);
        assert_eq!(regs.take_interrupts(), Interrupts::CAPSLOCK);

        regs.insert_flags(ConfigFlags::NUMLOCK_INTERRUPT);
        notify.lock_changed(true, true);
        assert_eq!(regs.take_interrupts(), Interrupts::CAPSLOCK | Interrupts::NUMLOCK);
    }
}
