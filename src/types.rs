use serde::{Deserialize, Serialize};
use std::fmt;

/// A single raw action as the planner returns it on the wire.
///
/// All fields are optional at this stage; validation fills in defaults and
/// rejects nonsense. Kind tags the planner invents land on `Unknown` instead
/// of failing the whole plan decode, so they can be rejected individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    MoveMouse {
        x: Option<i32>,
        y: Option<i32>,
        rel_x: Option<f64>,
        rel_y: Option<f64>,
    },
    ClickMouse,
    Write {
        text: Option<String>,
    },
    Wait {
        seconds: Option<f64>,
    },
    OpenApp {
        text: Option<String>,
    },
    Scroll {
        amount: Option<i32>,
    },
    PressKey {
        text: Option<String>,
    },
    Hotkey {
        text: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// The ordered action sequence one planning call returns. May be empty.
pub type Plan = Vec<Action>;

/// An action after validation: defaults filled in, relative coordinates
/// resolved to absolute pixels, hotkey text split into ordered key tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedAction {
    MoveMouse { x: i32, y: i32 },
    ClickMouse,
    Write { text: String },
    Wait { seconds: f64 },
    OpenApp { command: String },
    Scroll { amount: i32 },
    PressKey { key: String },
    Hotkey { keys: Vec<String> },
}

/// Pixel size of the captured display, fetched once per observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenBounds {
    pub width: u32,
    pub height: u32,
}

/// What the agent observes: the full visible display at one point in time.
#[derive(Clone)]
pub struct Perception {
    pub png: Vec<u8>,
    pub bounds: ScreenBounds,
}

impl fmt::Debug for Perception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Perception")
            .field("png_bytes", &self.png.len())
            .field("bounds", &self.bounds)
            .finish()
    }
}
