//! Fixed-timestep game loop driver
//!
//! Each pass feeds at most one pending player action into the game, then
//! injects a gravity tick if its deadline has passed. The action is always
//! handled before the gravity check.

use crate::game::{Action, Game, Outcome};
use std::time::Instant;

/// Monotonic millisecond counter
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock measured from construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Holds the latest pending action; newer actions overwrite older ones
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandLatch {
    pending: Option<Action>,
}

impl CommandLatch {
    pub fn push(&mut self, action: Action) {
        self.pending = Some(action);
    }

    pub fn take(&mut self) -> Option<Action> {
        self.pending.take()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }
}

/// Drives a [`Game`] from player actions and the gravity timer
pub struct Scheduler<C: Clock> {
    clock: C,
    /// Deadline of the next gravity tick
    next_tick_ms: u64,
    latch: CommandLatch,
}

impl<C: Clock> Scheduler<C> {
    /// Start the gravity timer for `game`
    pub fn new(clock: C, game: &Game) -> Self {
        let next_tick_ms = clock.now_ms() + game.score.tick_interval_ms();
        Self {
            clock,
            next_tick_ms,
            latch: CommandLatch::default(),
        }
    }

    /// Queue a player action for the next pass
    pub fn submit(&mut self, action: Action) {
        self.latch.push(action);
    }

    #[cfg(test)]
    pub fn next_tick_ms(&self) -> u64 {
        self.next_tick_ms
    }

    /// Run one pass of the loop
    pub fn pass(&mut self, game: &mut Game) -> Outcome {
        if let Some(action) = self.latch.take() {
            if let outcome @ Outcome::GameOver { .. } = game.advance(action) {
                return outcome;
            }
        }

        let now = self.clock.now_ms();
        if now > self.next_tick_ms {
            let outcome = game.advance(Action::SoftDrop);
            self.next_tick_ms = self.clock.now_ms() + game.score.tick_interval_ms();
            return outcome;
        }
        game.outcome()
    }
}
