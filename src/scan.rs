//! Matrix scanning
//!
//! The scanner runs one pass over the whole board every scan interval.  For
//! each column, it drives the column, reads every row, and feeds what it saw
//! for each position into the keyboard.  The column is then released back to
//! an input, so that it doesn't fight with the other columns sharing the same
//! row lines.  The directly wired buttons are read after the matrix.
//!
//! Passes are scheduled against an absolute deadline that is advanced by the
//! interval each time, rather than "now plus the interval", so time spent in a
//! pass doesn't push the following ones later.  The interval is read from the
//! configuration every pass, so a change takes effect from the next one.

use crate::config::Config;
use crate::debounce::Debounce;
use crate::keyboard::Keyboard;
use crate::keymap::KeyId;
use crate::log::{info, warn};
use crate::SLOT_COUNT;

/// The hardware side of the matrix.
///
/// Rows, columns and buttons are addressed by their index in the board's pin
/// tables.  Translating to real pins, and their polarity, is up to the
/// implementation.
pub trait MatrixIo {
    /// Read a row line, with the current column driven.  True is pressed.
    fn read_row(&mut self, row: usize) -> bool;

    /// Drive a column active or inactive.
    fn drive_column(&mut self, col: usize, active: bool);

    /// Return a column to a non-driving input.
    fn release_column(&mut self, col: usize);

    /// Read a directly wired button.  True is pressed.
    fn sample_button(&mut self, button: usize) -> bool;

    /// Monotonic time in ms.
    fn now_ms(&self) -> u32;
}

/// Something to wait on between scans.
#[allow(async_fn_in_trait)]
pub trait ScanTimer {
    /// Wait until the given time, on the same clock as [`MatrixIo::now_ms`].
    async fn wait_until(&mut self, deadline: u32);
}

/// Has `now` reached `deadline`, allowing for the clock wrapping.
fn reached(now: u32, deadline: u32) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}

pub struct Scanner<'a, IO, C, const N: usize = SLOT_COUNT> {
    io: IO,
    keyboard: Keyboard<'a, C, N>,
    debounce: Debounce,
    next_deadline: u32,
}

impl<'a, IO: MatrixIo, C: Config, const N: usize> Scanner<'a, IO, C, N> {
    /// Build a scanner.  The first pass is due one interval from now.
    pub fn new(io: IO, keyboard: Keyboard<'a, C, N>) -> Self {
        let keymap = keyboard.keymap();
        let positions = keymap.rows() * keymap.cols() + keymap.button_count();
        let next_deadline = io.now_ms().wrapping_add(keyboard.config().scan_interval_ms().max(1));

        Scanner {
            io,
            keyboard,
            debounce: Debounce::new(positions, 0),
            next_deadline,
        }
    }

    /// Require `count` agreeing samples before a key changes.
    pub fn with_debounce(mut self, count: u8) -> Self {
        self.debounce.set_count(count);
        self
    }

    pub fn keyboard(&self) -> &Keyboard<'a, C, N> {
        &self.keyboard
    }

    pub fn keyboard_mut(&mut self) -> &mut Keyboard<'a, C, N> {
        &mut self.keyboard
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    /// When the next pass is due.
    pub fn next_deadline(&self) -> u32 {
        self.next_deadline
    }

    /// Run a single pass over the board.
    pub fn scan(&mut self) {
        let now = self.io.now_ms();
        let keymap = self.keyboard.keymap();
        let rows = keymap.rows();
        let cols = keymap.cols();

        for col in 0..cols {
            self.io.drive_column(col, true);

            for row in 0..rows {
                let position = row * cols + col;
                let pressed = self.debounce.react(position, self.io.read_row(row));
                self.keyboard.sample(KeyId::Matrix(position as u16), pressed, now);
            }

            self.io.drive_column(col, false);
            self.io.release_column(col);
        }

        for button in 0..keymap.button_count() {
            let position = rows * cols + button;
            let pressed = self.debounce.react(position, self.io.sample_button(button));
            self.keyboard.sample(KeyId::Button(button as u8), pressed, now);
        }
    }

    /// Run a pass if one is due, and schedule the next.  Returns true if a
    /// pass ran.
    pub fn poll(&mut self) -> bool {
        if !reached(self.io.now_ms(), self.next_deadline) {
            return false;
        }

        self.scan();
        self.rearm();
        true
    }

    fn rearm(&mut self) {
        let interval = self.keyboard.config().scan_interval_ms().max(1);
        self.next_deadline = self.next_deadline.wrapping_add(interval);

        // If whole intervals have been missed, skip them rather than running
        // a burst of passes to catch up.  The schedule keeps its phase.
        let now = self.io.now_ms();
        if reached(now, self.next_deadline) {
            let behind = now.wrapping_sub(self.next_deadline);
            if behind >= interval {
                let missed = behind / interval;
                warn!("Scan behind by {} intervals", missed);
                self.next_deadline = self.next_deadline.wrapping_add(missed * interval);
            }
        }
    }

    /// Scan forever.
    pub async fn run<T: ScanTimer>(&mut self, timer: &mut T) -> ! {
        info!("Scanner: running every {} ms", self.keyboard.config().scan_interval_ms());
        loop {
            timer.wait_until(self.next_deadline).await;
            self.poll();
        }
    }
}

#[cfg(feature = "embassy")]
pub use self::embassy::EmbassyTimer;

#[cfg(feature = "embassy")]
mod embassy {
    use embassy_time::{Instant, Timer};

    use super::ScanTimer;

    /// Waits using the embassy time driver.  The matrix's `now_ms` must be
    /// `Instant::now().as_millis()`, truncated to 32 bits.
    pub struct EmbassyTimer;

    impl ScanTimer for EmbassyTimer {
        async fn wait_until(&mut self, deadline: u32) {
            let now = Instant::now().as_millis() as u32;
            let wait = deadline.wrapping_sub(now);
            if (wait as i32) > 0 {
                Timer::after_millis(wait as u64).await;
            }
        }
    }
}
