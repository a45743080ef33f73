//! The annotation session: owns the point state for one image and turns
//! device events into state changes and redraws.
//!
//! A session knows nothing about windows. The GUI adapter in [`crate::gui`]
//! feeds it [`InputEvent`]s and displays [`Session::frame`] whenever
//! [`Session::handle`] reports [`Outcome::Redraw`].

use ab_glyph::FontArc;
use image::RgbaImage;
use thiserror::Error;

use crate::config::{ConfigError, ResolvedKeys, SelectionMode, SessionConfig};
use crate::mapping::{self, Scale};
use crate::render;
use crate::state::{AnnotationState, Point};

/// Largest preview side, in pixels.
pub const MAX_PREVIEW_DIM: u32 = 16_384;
/// Largest preview area, in pixels.
pub const MAX_PREVIEW_PIXELS: u64 = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("source image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(
        "preview of a {width}x{height} image at scale {scale} exceeds {} px per side or {} px total",
        MAX_PREVIEW_DIM,
        MAX_PREVIEW_PIXELS
    )]
    PreviewTooLarge { width: u32, height: u32, scale: f64 },
    #[error("display surface failed: {0}")]
    Surface(String),
    #[error("session ended without producing a result")]
    Aborted,
}

/// A raw device event, in display-space for pointer events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    Key(egui::Key),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Undo,
    Redo,
    Clear,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    WaitingForInput,
    Terminated,
}

/// What the surface has to do after an event was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The point list changed and a new frame is ready.
    Redraw,
    /// Nothing changed.
    Unchanged,
    /// The quit key was pressed; the session is now terminated.
    Quit,
}

/// Result handed back to the caller when a session ends.
#[derive(Clone, Debug)]
pub struct SessionOutput {
    pub points: Vec<Point>,
    pub frame: RgbaImage,
}

pub struct Session {
    image: RgbaImage,
    config: SessionConfig,
    keys: ResolvedKeys,
    font: Option<FontArc>,
    state: AnnotationState,
    phase: Phase,
    frame: RgbaImage,
}

impl Session {
    /// Creates a session, loading the label font named by the config (or a
    /// system font).
    pub fn new(image: RgbaImage, config: SessionConfig) -> Result<Self, SessionError> {
        let font = if config.marker.labels {
            let font = render::load_label_font(config.marker.font.as_deref());
            if font.is_none() {
                log::warn!("no usable font found, point labels are disabled");
            }
            font
        } else {
            None
        };
        Self::with_font(image, config, font)
    }

    /// Creates a session with an explicit label font (`None` draws markers
    /// only). Fails before any surface exists if the image is empty or the
    /// config is invalid.
    pub fn with_font(
        image: RgbaImage,
        config: SessionConfig,
        font: Option<FontArc>,
    ) -> Result<Self, SessionError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(SessionError::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }
        config.validate()?;
        let keys = config.keys.resolve()?;
        check_preview_size(&image, config.scale)?;

        let frame = render::render(&image, &[], config.scale, &config.marker, font.as_ref());
        log::info!(
            "session started: {}x{} image, scale {}, {:?} mode",
            image.width(),
            image.height(),
            config.scale.get(),
            config.mode
        );

        Ok(Self {
            image,
            config,
            keys,
            font,
            state: AnnotationState::new(),
            phase: Phase::WaitingForInput,
            frame,
        })
    }

    /// Pre-loads points, e.g. from a coordinate file. Seeded points behave
    /// like clicked ones and can be undone.
    pub fn seed(mut self, points: Vec<Point>) -> Self {
        let points = match self.config.mode {
            SelectionMode::Single => points.into_iter().last().into_iter().collect(),
            SelectionMode::Multi => points,
        };
        log::info!("seeded {} point(s)", points.len());
        self.state = AnnotationState::with_points(points);
        self.redraw();
        self
    }

    pub fn handle(&mut self, event: InputEvent) -> Outcome {
        if self.phase == Phase::Terminated {
            log::trace!("ignoring {event:?} after termination");
            return Outcome::Unchanged;
        }

        match event {
            InputEvent::PointerDown { x, y } => {
                self.click(x, y);
                self.redraw();
                Outcome::Redraw
            }
            InputEvent::Key(key) => match self.action_for(key) {
                Some(action) => self.apply(action),
                None => {
                    log::debug!("ignoring unbound key {key:?}");
                    Outcome::Unchanged
                }
            },
        }
    }

    pub fn action_for(&self, key: egui::Key) -> Option<Action> {
        let keys = &self.keys;
        if key == keys.undo {
            Some(Action::Undo)
        } else if key == keys.redo {
            Some(Action::Redo)
        } else if key == keys.clear {
            Some(Action::Clear)
        } else if key == keys.quit {
            Some(Action::Quit)
        } else {
            None
        }
    }

    fn click(&mut self, display_x: f64, display_y: f64) {
        let point = mapping::point_from_display(display_x, display_y, self.config.scale);
        match self.config.mode {
            SelectionMode::Multi => {
                self.state.add(point);
                log::info!("add: {point}");
            }
            SelectionMode::Single => {
                if let Some(previous) = self.state.replace(point) {
                    log::debug!("replacing {previous}");
                }
                log::info!("select: {point}");
            }
        }
    }

    fn apply(&mut self, action: Action) -> Outcome {
        let changed = match action {
            Action::Undo => self.state.undo().inspect(|p| log::info!("undo: {p}")).is_some(),
            Action::Redo => {
                let restored = match self.config.mode {
                    SelectionMode::Multi => self.state.redo(),
                    SelectionMode::Single => self.state.redo_replace(),
                };
                restored.inspect(|p| log::info!("redo: {p}")).is_some()
            }
            Action::Clear => {
                let cleared = self.state.clear_all();
                if cleared {
                    log::info!("clear all points");
                }
                cleared
            }
            Action::Quit => {
                self.phase = Phase::Terminated;
                log::info!("session terminated with {} point(s)", self.state.len());
                return Outcome::Quit;
            }
        };

        if changed {
            self.redraw();
            Outcome::Redraw
        } else {
            Outcome::Unchanged
        }
    }

    fn redraw(&mut self) {
        self.frame = render::render(
            &self.image,
            self.state.points(),
            self.config.scale,
            &self.config.marker,
            self.font.as_ref(),
        );
    }

    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    pub fn points(&self) -> &[Point] {
        self.state.points()
    }

    pub fn state(&self) -> &AnnotationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn scale(&self) -> Scale {
        self.config.scale
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Ends the session and returns its points and last frame.
    pub fn finish(mut self) -> SessionOutput {
        if self.phase != Phase::Terminated {
            log::debug!("finishing session without an explicit quit");
            self.phase = Phase::Terminated;
        }
        SessionOutput {
            points: self.state.finalize(),
            frame: self.frame,
        }
    }
}

fn check_preview_size(image: &RgbaImage, scale: Scale) -> Result<(), SessionError> {
    let fits = scale
        .checked_display_size(image.width(), image.height())
        .is_some_and(|(w, h)| {
            w <= MAX_PREVIEW_DIM
                && h <= MAX_PREVIEW_DIM
                && u64::from(w) * u64::from(h) <= MAX_PREVIEW_PIXELS
        });
    if fits {
        Ok(())
    } else {
        Err(SessionError::PreviewTooLarge {
            width: image.width(),
            height: image.height(),
            scale: scale.get(),
        })
    }
}
