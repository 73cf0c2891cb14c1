use async_trait::async_trait;
use enigo::{Axis, Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use std::process::Command;
use std::thread;
use std::time::Duration;

use crate::errors::AgentError;
use crate::types::ResolvedAction;

/// Performs one validated action's side effect on the host. Side effects are
/// not transactional; nothing is compensated on failure.
#[async_trait]
pub trait ActionExecutor: Send {
    async fn execute(&mut self, action: &ResolvedAction) -> Result<(), AgentError>;
}

/// Injects pointer and keyboard events into the local desktop.
pub struct DesktopHands;

#[async_trait]
impl ActionExecutor for DesktopHands {
    async fn execute(&mut self, action: &ResolvedAction) -> Result<(), AgentError> {
        let action = action.clone();
        // Input injection and sleeps run in a blocking context so the
        // runtime stays free.
        tokio::task::spawn_blocking(move || perform(&action))
            .await
            .map_err(|e| AgentError::ExecutionFailed(format!("execution task panicked: {e}")))?
    }
}

fn perform(action: &ResolvedAction) -> Result<(), AgentError> {
    match action {
        ResolvedAction::MoveMouse { x, y } => {
            with_input(|e| e.move_mouse(*x, *y, Coordinate::Abs))
        }
        ResolvedAction::ClickMouse => with_input(|e| e.button(Button::Left, Direction::Click)),
        ResolvedAction::Write { text } => with_input(|e| e.text(text)),
        ResolvedAction::Wait { seconds } => {
            thread::sleep(Duration::from_secs_f64(*seconds));
            Ok(())
        }
        ResolvedAction::OpenApp { command } => open_app(command),
        ResolvedAction::Scroll { amount } => {
            // Positive amounts scroll up; enigo's axis runs the other way.
            with_input(|e| e.scroll(amount.saturating_neg(), Axis::Vertical))
        }
        ResolvedAction::PressKey { key } if key.is_empty() => Ok(()),
        ResolvedAction::PressKey { key } => {
            let key = map_key(key)?;
            with_input(|e| e.key(key, Direction::Click))
        }
        ResolvedAction::Hotkey { keys } => {
            let mapped = keys.iter().map(|k| map_key(k)).collect::<Result<Vec<_>, _>>()?;
            with_input(|e| {
                for key in &mapped {
                    e.key(*key, Direction::Press)?;
                }
                for key in mapped.iter().rev() {
                    e.key(*key, Direction::Release)?;
                }
                Ok(())
            })
        }
    }
}

fn with_input<F>(f: F) -> Result<(), AgentError>
where
    F: FnOnce(&mut Enigo) -> Result<(), enigo::InputError>,
{
    let mut enigo = Enigo::new(&Settings::default())
        .map_err(|e| AgentError::ExecutionFailed(format!("input driver init failed: {e}")))?;
    f(&mut enigo).map_err(|e| AgentError::ExecutionFailed(e.to_string()))
}

fn open_app(command: &str) -> Result<(), AgentError> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| AgentError::ExecutionFailed("open_app command is blank".into()))?;
    Command::new(program)
        .args(parts)
        .spawn()
        .map_err(|e| AgentError::ExecutionFailed(format!("failed to launch {program}: {e}")))?;
    Ok(())
}

/// Translate a planner key name into an input-driver key. Single characters
/// pass through as unicode keys.
fn map_key(name: &str) -> Result<Key, AgentError> {
    match name.to_lowercase().as_str() {
        "enter" | "return" => Ok(Key::Return),
        "tab" => Ok(Key::Tab),
        "escape" | "esc" => Ok(Key::Escape),
        "backspace" => Ok(Key::Backspace),
        "control" | "ctrl" => Ok(Key::Control),
        "shift" => Ok(Key::Shift),
        "alt" | "option" => Ok(Key::Alt),
        "meta" | "command" | "super" | "windows" => Ok(Key::Meta),
        "delete" | "del" => Ok(Key::Delete),
        "space" => Ok(Key::Space),
        "up" => Ok(Key::UpArrow),
        "down" => Ok(Key::DownArrow),
        "left" => Ok(Key::LeftArrow),
        "right" => Ok(Key::RightArrow),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Key::Unicode(c)),
                _ => Err(AgentError::ExecutionFailed(format!("unsupported key: {name}"))),
            }
        }
    }
}
