// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reconnect/backoff state machine for chain account watches.

use std::time::Duration;

/// Consecutive failures tolerated before giving up.
pub const MAX_RETRIES: u32 = 5;
/// Base delay for exponential backoff.
const BASE_BACKOFF: Duration = Duration::from_secs(1);
/// Upper bound on a single backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Connection state of an account watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Disconnected,
    Connecting,
    Subscribed,
    /// Waiting to reconnect after the n-th consecutive failure (1-based).
    Backoff(u32),
}

/// Inputs that drive the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// Connection established (first successful read).
    Open,
    /// Data arrived on an established subscription.
    Message,
    Error,
    /// Explicit close requested by the owner.
    Close,
    /// Backoff timer expired.
    TimerFired,
}

/// What the driver should do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    None,
    /// Connect (or poll) now.
    Connect,
    /// Arm a timer and fire [`WatchEvent::TimerFired`] when it expires.
    ScheduleRetry(Duration),
    /// Stop the watch.
    Stop,
}

impl WatchState {
    pub fn is_active(self) -> bool {
        self != WatchState::Disconnected
    }
}

/// Watch state plus the count of consecutive failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchMachine {
    state: WatchState,
    failures: u32,
}

impl Default for WatchMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchMachine {
    /// A machine about to make its first connection.
    pub fn new() -> Self {
        Self {
            state: WatchState::Connecting,
            failures: 0,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Apply an event and return the action the driver should take.
    pub fn on_event(&mut self, event: WatchEvent) -> WatchAction {
        use WatchEvent::*;
        use WatchState::*;

        let (state, action) = match (self.state, event) {
            (Disconnected, _) => (Disconnected, WatchAction::Stop),
            (_, Close) => (Disconnected, WatchAction::Stop),

            (Connecting, Open) | (Subscribed, Open) | (Subscribed, Message) => {
                self.failures = 0;
                (Subscribed, WatchAction::None)
            }

            (Connecting, Error) | (Subscribed, Error) | (Backoff(_), Error) => {
                self.failures += 1;
                if self.failures > MAX_RETRIES {
                    (Disconnected, WatchAction::Stop)
                } else {
                    (
                        Backoff(self.failures),
                        WatchAction::ScheduleRetry(backoff_delay(self.failures)),
                    )
                }
            }

            (Backoff(_), TimerFired) => (Connecting, WatchAction::Connect),

            // Late or irrelevant events leave the state alone.
            (state, _) => (state, WatchAction::None),
        };

        self.state = state;
        action
    }
}

/// `min(BASE * 2^(attempt-1), MAX)`.
pub fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    BASE_BACKOFF
        .saturating_mul(1u32 << exponent)
        .min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_and_receive() {
        let mut machine = WatchMachine::new();
        assert_eq!(machine.on_event(WatchEvent::Open), WatchAction::None);
        assert_eq!(machine.state(), WatchState::Subscribed);

        machine.on_event(WatchEvent::Message);
        assert_eq!(machine.state(), WatchState::Subscribed);
    }

    #[test]
    fn test_error_backs_off_then_reconnects() {
        let mut machine = WatchMachine::new();
        machine.on_event(WatchEvent::Open);

        let action = machine.on_event(WatchEvent::Error);
        assert_eq!(machine.state(), WatchState::Backoff(1));
        assert_eq!(action, WatchAction::ScheduleRetry(Duration::from_secs(1)));

        assert_eq!(machine.on_event(WatchEvent::TimerFired), WatchAction::Connect);
        assert_eq!(machine.state(), WatchState::Connecting);
    }

    #[test]
    fn test_failures_accumulate_across_reconnects() {
        let mut machine = WatchMachine::new();
        let mut delays = Vec::new();

        loop {
            match machine.on_event(WatchEvent::Error) {
                WatchAction::ScheduleRetry(delay) => {
                    delays.push(delay);
                    assert_eq!(machine.on_event(WatchEvent::TimerFired), WatchAction::Connect);
                }
                WatchAction::Stop => break,
                other => panic!("unexpected action {:?}", other),
            }
        }

        assert_eq!(machine.state(), WatchState::Disconnected);
        assert_eq!(delays.len(), MAX_RETRIES as usize);
        assert_eq!(delays[0], Duration::from_secs(1));
        assert_eq!(delays[4], Duration::from_secs(16));
    }

    #[test]
    fn test_success_resets_failures() {
        let mut machine = WatchMachine::new();
        machine.on_event(WatchEvent::Error);
        machine.on_event(WatchEvent::TimerFired);
        machine.on_event(WatchEvent::Error);
        assert_eq!(machine.state(), WatchState::Backoff(2));

        machine.on_event(WatchEvent::TimerFired);
        machine.on_event(WatchEvent::Open);
        machine.on_event(WatchEvent::Error);
        assert_eq!(machine.state(), WatchState::Backoff(1));
    }

    #[test]
    fn test_backoff_doubles_from_one_second() {
        let delays: Vec<u64> = (1..=6).map(|n| backoff_delay(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32]);
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff_delay(7), Duration::from_secs(60));
        assert_eq!(backoff_delay(40), Duration::from_secs(60));
    }

    #[test]
    fn test_close_always_stops() {
        let mut machine = WatchMachine::new();
        machine.on_event(WatchEvent::Error);
        assert_eq!(machine.on_event(WatchEvent::Close), WatchAction::Stop);
        assert!(!machine.state().is_active());

        // Nothing restarts a disconnected watch.
        assert_eq!(machine.on_event(WatchEvent::TimerFired), WatchAction::Stop);
    }

    #[test]
    fn test_stray_timer_is_ignored() {
        let mut machine = WatchMachine::new();
        machine.on_event(WatchEvent::Open);
        assert_eq!(machine.on_event(WatchEvent::TimerFired), WatchAction::None);
        assert_eq!(machine.state(), WatchState::Subscribed);
    }
}
