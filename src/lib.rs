//! Interactive point picking on a raster image.
//!
//! A [`Session`] collects image-space points from pointer clicks with
//! undo/redo/clear, re-rendering a preview frame after every change.
//! [`gui::run`] shows that frame in a window and returns the points and the
//! annotated frame once the operator quits.

pub mod config;
pub mod coords;
pub mod gui;
pub mod mapping;
pub mod render;
pub mod session;
pub mod state;

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;

pub use config::{KeyBindings, MarkerStyle, SelectionMode, SessionConfig};
pub use mapping::{to_display_space, to_image_space, Scale};
pub use render::{draw_points, render};
pub use session::{InputEvent, Outcome, Session, SessionError, SessionOutput};
pub use state::{AnnotationState, Point};

/// Decodes an image file into RGBA.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path)
        .with_context(|| format!("cannot open image {}", path.display()))?;
    Ok(image.to_rgba8())
}

/// Runs a full interactive session on `image` and returns its result.
pub fn pick_points(image: RgbaImage, config: SessionConfig) -> Result<SessionOutput> {
    let session = Session::new(image, config)?;
    let output = gui::run(session, "pointpick")?;
    Ok(output)
}
