//! Input handling with DAS (Delayed Auto Shift) and ARR (Auto Repeat Rate)
//!
//! Uses a polling-based approach that doesn't rely on key release events,
//! which are unreliable on Linux terminals. The game itself treats every
//! action as a separate event; hold-to-repeat lives entirely here.

use crate::game::Action;
use crate::settings::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

/// Time after which we consider a key "released" if no repeat received
const KEY_TIMEOUT: Duration = Duration::from_millis(100);

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Action(Action),
    Quit,
}

/// Input handler with DAS/ARR support
pub struct InputHandler {
    /// Last press time for repeatable keys (for DAS)
    left_state: Option<KeyPressState>,
    right_state: Option<KeyPressState>,
    down_state: Option<KeyPressState>,
    /// Key bindings
    bindings: KeyBindings,
    /// DAS duration
    das: Duration,
    /// ARR duration
    arr: Duration,
}

#[derive(Debug, Clone)]
struct KeyPressState {
    first_press: Instant,
    last_seen: Instant,
    das_triggered: bool,
    last_arr: Option<Instant>,
}

impl KeyPressState {
    fn new(now: Instant) -> Self {
        Self {
            first_press: now,
            last_seen: now,
            das_triggered: false,
            last_arr: None,
        }
    }
}

/// Key bindings configuration - supports multiple keys per action
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub soft_drop: Vec<KeyCode>,
    pub rotate_cw: Vec<KeyCode>,
    pub rotate_ccw: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
}

impl KeyBindings {
    /// Parse a key string into KeyCode
    fn parse_key(s: &str) -> Option<KeyCode> {
        let lower = s.to_lowercase();
        let code = match lower.as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "esc" | "escape" => KeyCode::Esc,
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => {
                        tracing::warn!("unknown key name {:?} in bindings", s);
                        return None;
                    }
                }
            }
        };
        Some(code)
    }

    /// Parse a list of key strings into KeyCodes
    fn parse_keys(keys: &[String]) -> Vec<KeyCode> {
        keys.iter().filter_map(|s| Self::parse_key(s)).collect()
    }

    /// Create keybindings from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            move_left: Self::parse_keys(&settings.keys.move_left),
            move_right: Self::parse_keys(&settings.keys.move_right),
            soft_drop: Self::parse_keys(&settings.keys.soft_drop),
            rotate_cw: Self::parse_keys(&settings.keys.rotate_cw),
            rotate_ccw: Self::parse_keys(&settings.keys.rotate_ccw),
            quit: Self::parse_keys(&settings.keys.quit),
        }
    }
}

impl InputHandler {
    /// Create input handler from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            left_state: None,
            right_state: None,
            down_state: None,
            bindings: KeyBindings::from_settings(settings),
            das: Duration::from_millis(settings.gameplay.das_ms),
            arr: Duration::from_millis(settings.gameplay.arr_ms),
        }
    }

    /// Handle a key press event - returns the immediate input, if any
    pub fn key_down(&mut self, key: KeyEvent) -> Option<Input> {
        self.key_down_at(key, Instant::now())
    }

    fn key_down_at(&mut self, key: KeyEvent, now: Instant) -> Option<Input> {
        // Handle Ctrl+C for quit
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Input::Quit);
        }

        let code = normalize_key(key.code);

        if self.bindings.move_left.contains(&code) {
            // Cancel opposite direction
            self.right_state = None;
            press(&mut self.left_state, now).then_some(Input::Action(Action::MoveLeft))
        } else if self.bindings.move_right.contains(&code) {
            self.left_state = None;
            press(&mut self.right_state, now).then_some(Input::Action(Action::MoveRight))
        } else if self.bindings.soft_drop.contains(&code) {
            press(&mut self.down_state, now).then_some(Input::Action(Action::SoftDrop))
        } else if self.bindings.rotate_cw.contains(&code) {
            Some(Input::Action(Action::RotateCW))
        } else if self.bindings.rotate_ccw.contains(&code) {
            Some(Input::Action(Action::RotateCCW))
        } else if self.bindings.quit.contains(&code) {
            Some(Input::Quit)
        } else {
            None
        }
    }

    /// Handle a key release event (may not be called on Linux)
    pub fn key_up(&mut self, key: KeyEvent) {
        let code = normalize_key(key.code);

        if self.bindings.move_left.contains(&code) {
            self.left_state = None;
        } else if self.bindings.move_right.contains(&code) {
            self.right_state = None;
        } else if self.bindings.soft_drop.contains(&code) {
            self.down_state = None;
        }
    }

    /// Update held keys and return repeat actions (call every frame)
    pub fn update(&mut self) -> Vec<Action> {
        self.update_at(Instant::now())
    }

    fn update_at(&mut self, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();

        // Copy DAS/ARR values to avoid borrow issues
        let das = self.das;
        let arr = self.arr;

        for (state, action) in [
            (&mut self.left_state, Action::MoveLeft),
            (&mut self.right_state, Action::MoveRight),
            (&mut self.down_state, Action::SoftDrop),
        ] {
            // Check for timed-out keys (no recent key event = released)
            if state
                .as_ref()
                .is_some_and(|s| now.duration_since(s.last_seen) > KEY_TIMEOUT)
            {
                *state = None;
            }
            if let Some(state) = state {
                if process_das_arr(state, now, das, arr) {
                    actions.push(action);
                }
            }
        }

        actions
    }
}

/// Record a press of a repeatable key; true if it is a fresh press
fn press(state: &mut Option<KeyPressState>, now: Instant) -> bool {
    match state {
        Some(state) => {
            state.last_seen = now;
            false
        }
        None => {
            *state = Some(KeyPressState::new(now));
            true
        }
    }
}

/// Process DAS/ARR logic for a key state, returns true if should trigger action
fn process_das_arr(state: &mut KeyPressState, now: Instant, das: Duration, arr: Duration) -> bool {
    let held_duration = now.duration_since(state.first_press);

    if held_duration >= das {
        if !state.das_triggered {
            // First trigger after DAS
            state.das_triggered = true;
            state.last_arr = Some(now);
            return true;
        } else if let Some(last) = state.last_arr {
            // Subsequent ARR triggers
            if now.duration_since(last) >= arr {
                state.last_arr = Some(now);
                return true;
            }
        }
    }

    false
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn handler() -> InputHandler {
        InputHandler::from_settings(&Settings::default())
    }

    #[test]
    fn test_default_bindings() {
        let mut input = handler();
        let now = Instant::now();
        assert_eq!(
            input.key_down_at(key(KeyCode::Up), now),
            Some(Input::Action(Action::RotateCW))
        );
        assert_eq!(
            input.key_down_at(key(KeyCode::Char('Z')), now),
            Some(Input::Action(Action::RotateCCW))
        );
        assert_eq!(input.key_down_at(key(KeyCode::Char('q')), now), Some(Input::Quit));
        assert_eq!(input.key_down_at(key(KeyCode::Char('k')), now), None);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut input = handler();
        let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(input.key_down(event), Some(Input::Quit));
    }

    #[test]
    fn test_repeated_press_is_not_a_new_action() {
        let mut input = handler();
        let now = Instant::now();
        assert_eq!(
            input.key_down_at(key(KeyCode::Left), now),
            Some(Input::Action(Action::MoveLeft))
        );
        assert_eq!(input.key_down_at(key(KeyCode::Left), now + Duration::from_millis(30)), None);
        input.key_up(key(KeyCode::Left));
        assert_eq!(
            input.key_down_at(key(KeyCode::Left), now + Duration::from_millis(60)),
            Some(Input::Action(Action::MoveLeft))
        );
    }

    #[test]
    fn test_das_then_arr() {
        let mut input = handler();
        let start = Instant::now();
        input.key_down_at(key(KeyCode::Right), start);

        // Keep the key alive with terminal repeats
        let mut repeats = Vec::new();
        for ms in (10..=320).step_by(10) {
            let now = start + Duration::from_millis(ms);
            input.key_down_at(key(KeyCode::Right), now);
            repeats.extend(input.update_at(now));
        }
        // DAS fires at 200ms, ARR at 260ms and 320ms
        assert_eq!(repeats, vec![Action::MoveRight; 3]);
    }

    #[test]
    fn test_key_times_out_without_repeats() {
        let mut input = handler();
        let start = Instant::now();
        input.key_down_at(key(KeyCode::Down), start);
        assert!(input.update_at(start + Duration::from_millis(500)).is_empty());
        // Released by timeout, so the next press acts immediately
        assert_eq!(
            input.key_down_at(key(KeyCode::Down), start + Duration::from_millis(510)),
            Some(Input::Action(Action::SoftDrop))
        );
    }

    #[test]
    fn test_unknown_key_names_are_skipped() {
        let keys = KeyBindings::parse_keys(&["Left".to_string(), "Hyper".to_string()]);
        assert_eq!(keys, vec![KeyCode::Left]);
    }
}
