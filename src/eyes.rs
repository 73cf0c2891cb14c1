use async_trait::async_trait;
use image::ImageFormat;
use std::io::Cursor;
use xcap::Monitor;

use crate::errors::AgentError;
use crate::types::{Perception, ScreenBounds};

/// Produces an opaque snapshot of the current machine state.
#[async_trait]
pub trait PerceptionSource: Send {
    async fn capture(&mut self) -> Result<Perception, AgentError>;
}

/// Captures the primary monitor as a PNG.
pub struct ScreenEyes;

#[async_trait]
impl PerceptionSource for ScreenEyes {
    async fn capture(&mut self) -> Result<Perception, AgentError> {
        // Capture in a blocking task so we don't stall the runtime.
        tokio::task::spawn_blocking(capture_primary)
            .await
            .map_err(|e| AgentError::CaptureFailed(format!("capture task panicked: {e}")))?
    }
}

fn capture_primary() -> Result<Perception, AgentError> {
    let monitors = Monitor::all().map_err(|e| AgentError::CaptureFailed(e.to_string()))?;
    let monitor = monitors
        .iter()
        .find(|m| m.is_primary())
        .or_else(|| monitors.first())
        .ok_or_else(|| AgentError::CaptureFailed("no monitor found".into()))?;

    let bounds = ScreenBounds {
        width: monitor.width(),
        height: monitor.height(),
    };

    let shot = monitor
        .capture_image()
        .map_err(|e| AgentError::CaptureFailed(e.to_string()))?;
    let (width, height) = (shot.width(), shot.height());
    let image = image::RgbaImage::from_raw(width, height, shot.into_raw())
        .ok_or_else(|| AgentError::CaptureFailed("screenshot buffer has unexpected size".into()))?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AgentError::CaptureFailed(e.to_string()))?;

    tracing::debug!(bytes = png.len(), ?bounds, "screen captured");
    Ok(Perception { png, bounds })
}
