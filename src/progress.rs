//! Progress reporting for long-running bulk operations.
//!
//! Decoupled from the command loop via [`ProgressObserver`] so tests can
//! swap in [`NullProgress`] instead of drawing to a terminal.

use std::io::Write;
use std::time::{Duration, Instant};

/// Receives progress updates from a command's block iteration.
pub trait ProgressObserver {
    /// Called once before the first block is processed.
    fn start(&mut self);
    /// Called after each block, with the number completed and the total.
    fn update(&mut self, completed: usize, total: usize);
    /// Called once after the last block, to flush a final 100% state.
    fn finish(&mut self);
}

/// Draws an ASCII progress bar with elapsed time to stderr, throttled so it
/// does not redraw more often than every quarter second.
pub struct BarProgress {
    start_time: Option<Instant>,
    last_print: Option<Instant>,
    last_total: usize,
}

const BAR_LEN: usize = 50;
const PRINT_INTERVAL: Duration = Duration::from_millis(250);

impl BarProgress {
    pub fn new() -> Self {
        BarProgress { start_time: None, last_print: None, last_total: 0 }
    }

    fn draw(&mut self, completed: usize, total: usize) {
        let start = match self.start_time {
            Some(s) => s,
            None => return,
        };
        let fraction = if total > 0 { completed as f64 / total as f64 } else { 1.0 };
        let bars = (fraction * BAR_LEN as f64).floor() as usize;
        let percent = fraction * 100.0;

        let elapsed = start.elapsed().as_secs();
        let (hours, rem) = (elapsed / 3600, elapsed % 3600);
        let (minutes, seconds) = (rem / 60, rem % 60);

        eprint!(
            "\r|{}{}| {:.1}% completed ({completed}/{total} mapblocks) {hours:02}:{minutes:02}:{seconds:02}",
            "=".repeat(bars),
            " ".repeat(BAR_LEN - bars),
            percent,
        );
        let _ = std::io::stderr().flush();
        self.last_print = Some(Instant::now());
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for BarProgress {
    fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    fn update(&mut self, completed: usize, total: usize) {
        self.last_total = total;
        let should_print = match self.last_print {
            Some(t) => t.elapsed() > PRINT_INTERVAL,
            None => true,
        };
        if should_print {
            self.draw(completed, total);
        }
    }

    fn finish(&mut self) {
        if self.start_time.is_some() {
            self.draw(self.last_total, self.last_total);
            eprintln!();
        }
    }
}

/// Discards all progress updates; used by tests and non-interactive runs.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressObserver for NullProgress {
    fn start(&mut self) {}
    fn update(&mut self, _completed: usize, _total: usize) {}
    fn finish(&mut self) {}
}
