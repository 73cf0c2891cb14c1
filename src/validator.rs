use crate::errors::AgentError;
use crate::types::{Action, ResolvedAction, ScreenBounds};

/// Check one raw action against the schema and the current screen bounds.
///
/// Rules apply in order; the first failure wins. Nothing that fails here is
/// ever handed to the executor.
pub fn validate(action: &Action, bounds: ScreenBounds) -> Result<ResolvedAction, AgentError> {
    match action {
        Action::Unknown => Err(AgentError::InvalidAction("unknown action kind".into())),
        Action::MoveMouse { x, y, rel_x, rel_y } => {
            let x = resolve_axis(*x, *rel_x, bounds.width, "x")?;
            let y = resolve_axis(*y, *rel_y, bounds.height, "y")?;
            if x < 0 || x as i64 > bounds.width as i64 {
                return Err(AgentError::OutOfBounds(format!(
                    "x={x} outside 0..={}",
                    bounds.width
                )));
            }
            if y < 0 || y as i64 > bounds.height as i64 {
                return Err(AgentError::OutOfBounds(format!(
                    "y={y} outside 0..={}",
                    bounds.height
                )));
            }
            Ok(ResolvedAction::MoveMouse { x, y })
        }
        Action::Write { text } => match text.as_deref() {
            Some(t) if !t.is_empty() => Ok(ResolvedAction::Write { text: t.to_string() }),
            _ => Err(AgentError::InvalidAction("write requires non-empty text".into())),
        },
        Action::OpenApp { text } => match text.as_deref() {
            Some(t) if !t.is_empty() => Ok(ResolvedAction::OpenApp { command: t.to_string() }),
            _ => Err(AgentError::InvalidAction("open_app requires non-empty text".into())),
        },
        Action::Hotkey { text } => {
            let text = text.as_deref().unwrap_or("");
            let keys: Vec<String> = text.split('+').map(str::to_string).collect();
            if keys.iter().any(String::is_empty) {
                return Err(AgentError::InvalidAction(format!(
                    "hotkey {text:?} contains an empty key token"
                )));
            }
            Ok(ResolvedAction::Hotkey { keys })
        }
        Action::PressKey { text } => Ok(ResolvedAction::PressKey {
            key: text.clone().unwrap_or_default(),
        }),
        Action::Scroll { amount } => Ok(ResolvedAction::Scroll {
            amount: amount.unwrap_or(0),
        }),
        Action::Wait { seconds } => {
            let seconds = seconds.unwrap_or(1.0);
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(AgentError::InvalidAction(format!(
                    "wait of {seconds} seconds is not a duration"
                )));
            }
            Ok(ResolvedAction::Wait { seconds })
        }
        Action::ClickMouse => Ok(ResolvedAction::ClickMouse),
    }
}

/// One mouse axis: the absolute coordinate wins if present, else the
/// relative one scaled by the screen extent.
fn resolve_axis(
    abs: Option<i32>,
    rel: Option<f64>,
    extent: u32,
    name: &str,
) -> Result<i32, AgentError> {
    match (abs, rel) {
        (Some(v), _) => Ok(v),
        (None, Some(r)) => {
            if !(0.0..=1.0).contains(&r) {
                return Err(AgentError::OutOfBounds(format!(
                    "rel_{name}={r} outside [0, 1]"
                )));
            }
            Ok((r * f64::from(extent)) as i32)
        }
        (None, None) => Err(AgentError::InvalidAction(format!(
            "move_mouse needs {name} or rel_{name}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: ScreenBounds = ScreenBounds { width: 1000, height: 800 };

    #[test]
    fn unknown_kind_is_invalid() {
        let err = validate(&Action::Unknown, BOUNDS).unwrap_err();
        assert!(matches!(err, AgentError::InvalidAction(_)));
    }

    #[test]
    fn relative_coordinates_scale_by_bounds() {
        let action = Action::MoveMouse {
            x: None,
            y: None,
            rel_x: Some(0.5),
            rel_y: Some(0.5),
        };
        assert_eq!(
            validate(&action, BOUNDS).unwrap(),
            ResolvedAction::MoveMouse { x: 500, y: 400 }
        );
    }

    #[test]
    fn absolute_coordinates_win_over_relative() {
        let action = Action::MoveMouse {
            x: Some(10),
            y: Some(20),
            rel_x: Some(0.9),
            rel_y: Some(0.9),
        };
        assert_eq!(
            validate(&action, BOUNDS).unwrap(),
            ResolvedAction::MoveMouse { x: 10, y: 20 }
        );
    }

    #[test]
    fn screen_edges_are_inside_bounds() {
        let action = Action::MoveMouse {
            x: Some(1000),
            y: Some(800),
            rel_x: None,
            rel_y: None,
        };
        assert!(validate(&action, BOUNDS).is_ok());

        let origin = Action::MoveMouse { x: Some(0), y: Some(0), rel_x: None, rel_y: None };
        assert!(validate(&origin, BOUNDS).is_ok());
    }

    #[test]
    fn off_screen_points_are_rejected() {
        for (x, y) in [(-1, 400), (1001, 400), (500, -5), (500, 801)] {
            let action = Action::MoveMouse {
                x: Some(x),
                y: Some(y),
                rel_x: None,
                rel_y: None,
            };
            let err = validate(&action, BOUNDS).unwrap_err();
            assert!(matches!(err, AgentError::OutOfBounds(_)), "({x},{y})");
        }
    }

    #[test]
    fn relative_outside_unit_interval_is_rejected() {
        let action = Action::MoveMouse {
            x: None,
            y: None,
            rel_x: Some(1.2),
            rel_y: Some(0.5),
        };
        let err = validate(&action, BOUNDS).unwrap_err();
        assert!(matches!(err, AgentError::OutOfBounds(_)));

        let negative = Action::MoveMouse {
            x: None,
            y: None,
            rel_x: Some(0.5),
            rel_y: Some(-0.01),
        };
        assert!(matches!(
            validate(&negative, BOUNDS).unwrap_err(),
            AgentError::OutOfBounds(_)
        ));
    }

    #[test]
    fn move_without_any_coordinates_is_invalid() {
        let action = Action::MoveMouse { x: None, y: None, rel_x: None, rel_y: None };
        assert!(matches!(
            validate(&action, BOUNDS).unwrap_err(),
            AgentError::InvalidAction(_)
        ));
    }

    #[test]
    fn mixed_absolute_and_relative_axes_resolve_per_axis() {
        let action = Action::MoveMouse {
            x: Some(10),
            y: None,
            rel_x: None,
            rel_y: Some(0.5),
        };
        assert_eq!(
            validate(&action, BOUNDS).unwrap(),
            ResolvedAction::MoveMouse { x: 10, y: 400 }
        );
    }

    #[test]
    fn write_and_open_app_require_text() {
        for action in [
            Action::Write { text: None },
            Action::Write { text: Some(String::new()) },
            Action::OpenApp { text: None },
            Action::OpenApp { text: Some(String::new()) },
        ] {
            assert!(matches!(
                validate(&action, BOUNDS).unwrap_err(),
                AgentError::InvalidAction(_)
            ));
        }

        assert_eq!(
            validate(&Action::Write { text: Some("hi".into()) }, BOUNDS).unwrap(),
            ResolvedAction::Write { text: "hi".into() }
        );
    }

    #[test]
    fn hotkey_splits_into_ordered_tokens() {
        let action = Action::Hotkey { text: Some("ctrl+shift+a".into()) };
        assert_eq!(
            validate(&action, BOUNDS).unwrap(),
            ResolvedAction::Hotkey { keys: vec!["ctrl".into(), "shift".into(), "a".into()] }
        );
    }

    #[test]
    fn hotkey_with_empty_token_is_invalid() {
        for text in ["ctrl++a", "+a", "a+", ""] {
            let action = Action::Hotkey { text: Some(text.into()) };
            assert!(
                matches!(validate(&action, BOUNDS).unwrap_err(), AgentError::InvalidAction(_)),
                "{text:?}"
            );
        }
        assert!(matches!(
            validate(&Action::Hotkey { text: None }, BOUNDS).unwrap_err(),
            AgentError::InvalidAction(_)
        ));
    }

    #[test]
    fn press_key_defaults_to_empty() {
        assert_eq!(
            validate(&Action::PressKey { text: None }, BOUNDS).unwrap(),
            ResolvedAction::PressKey { key: String::new() }
        );
    }

    #[test]
    fn scroll_and_wait_defaults() {
        assert_eq!(
            validate(&Action::Scroll { amount: None }, BOUNDS).unwrap(),
            ResolvedAction::Scroll { amount: 0 }
        );
        assert_eq!(
            validate(&Action::Wait { seconds: None }, BOUNDS).unwrap(),
            ResolvedAction::Wait { seconds: 1.0 }
        );
    }

    #[test]
    fn negative_wait_is_invalid() {
        let action = Action::Wait { seconds: Some(-2.0) };
        assert!(matches!(
            validate(&action, BOUNDS).unwrap_err(),
            AgentError::InvalidAction(_)
        ));
    }

    #[test]
    fn click_needs_nothing() {
        assert_eq!(
            validate(&Action::ClickMouse, BOUNDS).unwrap(),
            ResolvedAction::ClickMouse
        );
    }
}
