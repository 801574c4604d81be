//! # Progress Reporting
//!
//! Rendering and stitching report frame counts through [`ProgressReporter`].
//! The orchestrator never talks to the terminal directly; it asks a
//! [`ProgressFactory`] for one reporter per phase, so tests can record the
//! calls and the CLI can draw a bar.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Mutex;
use std::time::Instant;

/// Receives progress for one phase of a render
pub trait ProgressReporter: Send + Sync {
    /// Begin tracking `total` units of work
    fn start(&self, total: u64);

    /// Report that `value` units are done
    fn update(&self, value: u64);

    /// Finish the phase
    fn stop(&self);
}

/// Creates a reporter for a labelled phase
pub type ProgressFactory = Box<dyn Fn(&str) -> Box<dyn ProgressReporter> + Send + Sync>;

/// Factory producing [`TerminalProgress`] bars
pub fn terminal_progress() -> ProgressFactory {
    Box::new(|label| Box::new(TerminalProgress::new(label)))
}

/// Factory producing [`NoProgress`] reporters
pub fn no_progress() -> ProgressFactory {
    Box::new(|_| Box::new(NoProgress))
}

/// Reporter that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn start(&self, _total: u64) {}
    fn update(&self, _value: u64) {}
    fn stop(&self) {}
}

const BAR_WIDTH: usize = 40;
const ETA_BUFFER: usize = 150;

struct BarState {
    total: u64,
    value: u64,
    active: bool,
    samples: VecDeque<(Instant, u64)>,
}

/// Single-line progress bar drawn on stderr
///
/// `[label] Progress ████████░░░░ 42% | ETA: 3s | 42/100`
pub struct TerminalProgress {
    label: String,
    clear_on_complete: bool,
    state: Mutex<BarState>,
}

impl TerminalProgress {
    pub fn new<S: Into<String>>(label: S) -> Self {
        Self {
            label: label.into(),
            clear_on_complete: true,
            state: Mutex::new(BarState {
                total: 0,
                value: 0,
                active: false,
                samples: VecDeque::with_capacity(ETA_BUFFER),
            }),
        }
    }

    /// Leave the final bar on screen instead of clearing it
    pub fn keep_on_complete(mut self) -> Self {
        self.clear_on_complete = false;
        self
    }

    fn draw(&self, state: &BarState) {
        let eta = estimate_eta(&state.samples, state.total);
        let line = render_line(&self.label, state.value, state.total, eta);
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}", line);
        let _ = stderr.flush();
    }
}

impl ProgressReporter for TerminalProgress {
    fn start(&self, total: u64) {
        let Ok(mut state) = self.state.lock() else { return };
        state.total = total;
        state.value = 0;
        state.active = true;
        state.samples.clear();
        state.samples.push_back((Instant::now(), 0));
        self.draw(&state);
    }

    fn update(&self, value: u64) {
        let Ok(mut state) = self.state.lock() else { return };
        if !state.active {
            return;
        }
        state.value = value;
        if state.samples.len() == ETA_BUFFER {
            state.samples.pop_front();
        }
        state.samples.push_back((Instant::now(), value));
        self.draw(&state);
    }

    fn stop(&self) {
        let Ok(mut state) = self.state.lock() else { return };
        if !state.active {
            return;
        }
        state.active = false;

        let mut stderr = std::io::stderr().lock();
        if self.clear_on_complete {
            let _ = write!(stderr, "\r\x1b[2K");
        } else {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}

/// Seconds remaining, from the rate observed across the sample window
fn estimate_eta(samples: &VecDeque<(Instant, u64)>, total: u64) -> Option<u64> {
    let (first_at, first_value) = *samples.front()?;
    let (last_at, last_value) = *samples.back()?;

    let elapsed = last_at.duration_since(first_at).as_secs_f64();
    let done = last_value.saturating_sub(first_value);
    if done == 0 || elapsed <= 0.0 {
        return None;
    }

    let rate = done as f64 / elapsed;
    let remaining = total.saturating_sub(last_value) as f64;
    Some((remaining / rate).ceil() as u64)
}

fn render_line(label: &str, value: u64, total: u64, eta: Option<u64>) -> String {
    let ratio = if total == 0 {
        0.0
    } else {
        (value as f64 / total as f64).clamp(0.0, 1.0)
    };
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    let bar: String = "\u{2588}".repeat(filled) + &"\u{2591}".repeat(BAR_WIDTH - filled);
    let eta = eta.map_or_else(|| "N/A".to_string(), |s| s.to_string());

    format!(
        "[{}] Progress {} {}% | ETA: {}s | {}/{}",
        label,
        bar,
        (ratio * 100.0).round() as u32,
        eta,
        value,
        total
    )
}
