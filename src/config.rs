//! Runtime configuration
//!
//! The tunables the keyboard core reads live in a small register file that
//! the host can read and write over its own interface.  The core only sees
//! them through [`Config`], so it doesn't care where they come from.
//!
//! [`Registers`] is the register file itself.  It is written by the host side
//! and read (and the interrupt bits set) by the scanner, which may be in a
//! different execution context, so every register is an atomic.

use bitflags::bitflags;
use portable_atomic::{AtomicU8, Ordering};

bitflags! {
    /// The configuration register.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct ConfigFlags: u8 {
        /// Force an event into the queue when it is full, dropping the oldest.
        const OVERFLOW_FORCE_ENQUEUE = 1 << 0;
        /// Raise [`Interrupts::OVERFLOW`] when the queue is full.
        const OVERFLOW_ON_INTERRUPT = 1 << 1;
        /// Raise [`Interrupts::CAPSLOCK`] when caps-lock changes.
        const CAPSLOCK_INTERRUPT = 1 << 2;
        /// Raise [`Interrupts::NUMLOCK`] when num-lock changes.
        const NUMLOCK_INTERRUPT = 1 << 3;
        /// Raise [`Interrupts::KEY`] when an event is queued.
        const KEY_INTERRUPT = 1 << 4;
        /// Report the modifier keys themselves as key events.
        const REPORT_MODIFIERS = 1 << 6;
        /// Apply the modifiers and latches to the characters.
        const USE_MODIFIERS = 1 << 7;
    }
}

bitflags! {
    /// The interrupt status register.  Bits are set by the keyboard and
    /// cleared by whoever services them.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct Interrupts: u8 {
        const OVERFLOW = 1 << 0;
        const CAPSLOCK = 1 << 1;
        const NUMLOCK = 1 << 2;
        const KEY = 1 << 3;
    }
}

/// What the keyboard core needs from the configuration.
pub trait Config {
    fn flags(&self) -> ConfigFlags;

    /// How long a key must be down before it is considered held.
    fn hold_threshold_ms(&self) -> u32;

    /// Time between scans of the matrix.
    fn scan_interval_ms(&self) -> u32;

    /// Set interrupt status bits.
    fn raise(&self, interrupts: Interrupts);
}

/// Hold threshold register is in units of 10ms.
const HOLD_UNIT_MS: u32 = 10;

/// The register file.
pub struct Registers {
    cfg: AtomicU8,
    hold: AtomicU8,
    freq: AtomicU8,
    int: AtomicU8,
}

impl Registers {
    pub const DEFAULT_FLAGS: ConfigFlags = ConfigFlags::OVERFLOW_ON_INTERRUPT
        .union(ConfigFlags::KEY_INTERRUPT)
        .union(ConfigFlags::USE_MODIFIERS);
    /// 300ms
    pub const DEFAULT_HOLD: u8 = 30;
    /// 5ms
    pub const DEFAULT_FREQ: u8 = 5;

    pub const fn new() -> Registers {
        Registers {
            cfg: AtomicU8::new(Self::DEFAULT_FLAGS.bits()),
            hold: AtomicU8::new(Self::DEFAULT_HOLD),
            freq: AtomicU8::new(Self::DEFAULT_FREQ),
            int: AtomicU8::new(0),
        }
    }

    pub fn set_flags(&self, flags: ConfigFlags) {
        self.cfg.store(flags.bits(), Ordering::Relaxed);
    }

    /// Set flags, leaving the others alone.
    pub fn insert_flags(&self, flags: ConfigFlags) {
        self.cfg.fetch_or(flags.bits(), Ordering::Relaxed);
    }

    pub fn remove_flags(&self, flags: ConfigFlags) {
        self.cfg.fetch_and(!flags.bits(), Ordering::Relaxed);
    }

    /// Hold threshold, in units of 10ms.
    pub fn set_hold(&self, value: u8) {
        self.hold.store(value, Ordering::Relaxed);
    }

    /// Scan interval, in ms.  Zero is treated as 1.
    pub fn set_scan_interval(&self, value: u8) {
        self.freq.store(value, Ordering::Relaxed);
    }

    /// The interrupt status bits currently set.
    pub fn interrupts(&self) -> Interrupts {
        Interrupts::from_bits_truncate(self.int.load(Ordering::Acquire))
    }

    /// Acknowledge the given interrupts, clearing them.
    pub fn clear_interrupts(&self, interrupts: Interrupts) {
        self.int.fetch_and(!interrupts.bits(), Ordering::AcqRel);
    }

    /// Read and clear all of the interrupt status bits.
    pub fn take_interrupts(&self) -> Interrupts {
        Interrupts::from_bits_truncate(self.int.swap(0, Ordering::AcqRel))
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for Registers {
    fn flags(&self) -> ConfigFlags {
        ConfigFlags::from_bits_truncate(self.cfg.load(Ordering::Relaxed))
    }

    fn hold_threshold_ms(&self) -> u32 {
        self.hold.load(Ordering::Relaxed) as u32 * HOLD_UNIT_MS
    }

    fn scan_interval_ms(&self) -> u32 {
        (self.freq.load(Ordering::Relaxed) as u32).max(1)
    }

    fn raise(&self, interrupts: Interrupts) {
        self.int.fetch_or(interrupts.bits(), Ordering::AcqRel);
    }
}

impl<C: Config + ?Sized> Config for &C {
    fn flags(&self) -> ConfigFlags {
        (**self).flags()
    }

    fn hold_threshold_ms(&self) -> u32 {
        (**self).hold_threshold_ms()
    }

    fn scan_interval_ms(&self) -> u32 {
        (**self).scan_interval_ms()
    }

    fn raise(&self, interrupts: Interrupts) {
        (**self).raise(interrupts)
    }
}
