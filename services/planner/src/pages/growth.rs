//! Growth hub: focus timer and reflections

use tracing::{error, info};

use crate::{error::ServiceResult, services::DailyLogService};

/// Length of a focus session
pub const FOCUS_SESSION_SECS: u32 = 30 * 60;

/// Countdown of a focus session, advanced one second per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTimer {
    remaining: u32,
    running: bool,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self {
            remaining: FOCUS_SESSION_SECS,
            running: false,
        }
    }
}

impl FocusTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        if self.remaining > 0 {
            self.running = true;
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    /// Advance one second; true when this tick finished the session
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return true;
        }
        false
    }

    pub fn display(&self) -> String {
        format_clock(self.remaining)
    }
}

/// `mm:ss`
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Controller behind the growth hub view
pub struct GrowthHub {
    logs: DailyLogService,
    timer: FocusTimer,
    reflection: String,
    reflection_open: bool,
    submitting: bool,
}

impl GrowthHub {
    pub fn new(logs: DailyLogService) -> Self {
        Self {
            logs,
            timer: FocusTimer::new(),
            reflection: String::new(),
            reflection_open: false,
            submitting: false,
        }
    }

    pub fn timer(&self) -> &FocusTimer {
        &self.timer
    }

    pub fn start_timer(&mut self) {
        self.timer.start();
    }

    pub fn pause_timer(&mut self) {
        self.timer.pause();
    }

    pub fn reset_timer(&mut self) {
        self.timer.reset();
    }

    /// Advance the timer one second, opening the reflection prompt when
    /// the session ends
    pub fn tick(&mut self) {
        if self.timer.tick() {
            info!("Focus session complete");
            self.reflection_open = true;
        }
    }

    pub fn is_reflection_open(&self) -> bool {
        self.reflection_open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn reflection(&self) -> &str {
        &self.reflection
    }

    pub fn set_reflection(&mut self, text: impl Into<String>) {
        self.reflection = text.into();
    }

    /// Save the reflection as today's log
    ///
    /// Returns `Ok(false)` without writing when the text is blank. On
    /// failure the text is kept so it can be submitted again.
    pub async fn submit_reflection(&mut self) -> ServiceResult<bool> {
        if self.reflection.trim().is_empty() {
            return Ok(false);
        }

        self.submitting = true;
        let result = self.logs.record_reflection(&self.reflection).await;
        self.submitting = false;

        match result {
            Ok(_) => {
                info!("Reflection saved");
                self.reflection.clear();
                self.reflection_open = false;
                self.timer.reset();
                Ok(true)
            }
            Err(e) => {
                error!("Error saving reflection: {}", e);
                Err(e)
            }
        }
    }
}
