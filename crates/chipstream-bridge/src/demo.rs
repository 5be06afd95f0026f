//! Deterministic demo mode.
//!
//! When the game binary or a pty is unavailable the bridge synthesizes
//! plausible screens on a fixed timer: two players trading speed on a
//! triangle-wave profile, with a periodic scoring event. Everything is
//! derived from the tick counter, so output is reproducible.

use std::time::Duration;

use tokio::time::{Interval, interval};

use crate::parser::SCREEN_REFRESH_BYTES;
use crate::sound::MAX_VELOCITY;

/// Cadence of synthesized screens (8 per second).
pub const DEMO_TICK: Duration = Duration::from_millis(125);

/// A scoring trigger fires every this many ticks.
const TRIGGER_EVERY: u64 = 40;

/// Ticks in one triangle-wave speed cycle.
const SPEED_CYCLE: u64 = 64;

/// Screen width the demo renders at.
const COLS: usize = 80;

/// Synthesized stand-in for a real game process.
pub struct DemoGame {
    timer: Interval,
    tick: u64,
}

impl DemoGame {
    /// Start the demo clock.
    pub fn new() -> Self {
        Self {
            timer: interval(DEMO_TICK),
            tick: 0,
        }
    }

    /// Wait for the next tick and render one full screen.
    pub async fn next_output(&mut self) -> Vec<u8> {
        self.timer.tick().await;
        self.tick += 1;
        self.render().into_bytes()
    }

    /// Triangle-wave speed profile, phase-shifted per player.
    fn velocity(tick: u64, player: u64) -> f32 {
        let phase = (tick + player * 17) % SPEED_CYCLE;
        let ramp = if phase < SPEED_CYCLE / 2 {
            phase
        } else {
            SPEED_CYCLE - phase
        };
        ramp as f32 * (MAX_VELOCITY / (SPEED_CYCLE / 2) as f32)
    }

    /// Render one screenful: track art plus the speed lines the parser
    /// extracts. Padded to at least one full refresh so every tick cuts
    /// exactly one frame downstream.
    fn render(&self) -> String {
        let mut screen = String::with_capacity(SCREEN_REFRESH_BYTES + COLS);

        push_line(&mut screen, &format!("== DEMO RACE == lap tick {:>6}", self.tick));
        push_line(
            &mut screen,
            &format!("P0 speed: {:.1}", Self::velocity(self.tick, 0)),
        );
        push_line(
            &mut screen,
            &format!("P1 speed: {:.1}", Self::velocity(self.tick, 1)),
        );
        if self.tick % TRIGGER_EVERY == 0 {
            push_line(&mut screen, "*** SCORED ***");
        }

        // Scrolling track art fills the rest of the refresh.
        let mut row = 0u64;
        while screen.len() < SCREEN_REFRESH_BYTES {
            let offset = ((self.tick + row) % 8) as usize;
            let mut line = String::with_capacity(COLS);
            line.push('|');
            for _ in 0..offset {
                line.push(' ');
            }
            line.push_str("........");
            push_line(&mut screen, &line);
            row += 1;
        }

        screen
    }
}

impl Default for DemoGame {
    fn default() -> Self {
        Self::new()
    }
}

fn push_line(screen: &mut String, content: &str) {
    screen.push_str(content);
    for _ in content.len()..COLS.saturating_sub(1) {
        screen.push(' ');
    }
    screen.push('\n');
}
