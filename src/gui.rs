//! eframe adapter: shows the session frame in a window and forwards pointer
//! and key input to the session.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use eframe::egui;

use crate::session::{InputEvent, Outcome, Session, SessionError, SessionOutput};

type OutputSlot = Rc<RefCell<Option<SessionOutput>>>;

/// Pointer state for the image response in the current frame.
#[derive(Clone, Copy, Debug)]
struct PressState {
    on_image: bool,
    primary_pressed: bool,
    pos: Option<egui::Pos2>,
}

impl PressState {
    /// Display-space pixel position of a primary press that started on the
    /// image, if there was one this frame. Pointer positions are in points,
    /// the frame in pixels.
    fn display_position(self, image_rect: egui::Rect, pixels_per_point: f32) -> Option<(f64, f64)> {
        if !(self.on_image && self.primary_pressed) {
            return None;
        }
        let pos = self.pos.filter(|pos| image_rect.contains(*pos))?;
        let rel = (pos - image_rect.min) * pixels_per_point;
        Some((rel.x as f64, rel.y as f64))
    }
}

struct PickerApp {
    session: Option<Session>,
    texture: Option<egui::TextureHandle>,
    dirty: bool,
    poll_interval: Duration,
    hint: String,
    output: OutputSlot,
}

impl PickerApp {
    fn new(session: Session, output: OutputSlot) -> Self {
        let keys = &session.config().keys;
        let hint = format!(
            "click: add / {}: undo / {}: redo / {}: clear / {}: quit",
            keys.undo, keys.redo, keys.clear, keys.quit
        );
        Self {
            poll_interval: session.config().poll_interval(),
            session: Some(session),
            texture: None,
            dirty: true,
            hint,
            output,
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if !self.dirty && self.texture.is_some() {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let frame = session.frame();
        let size = [frame.width() as usize, frame.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, frame.as_raw());
        match self.texture.as_mut() {
            Some(texture) => texture.set(color_image, egui::TextureOptions::NEAREST),
            None => {
                self.texture =
                    Some(ctx.load_texture("frame", color_image, egui::TextureOptions::NEAREST));
            }
        }
        self.dirty = false;
    }

    fn dispatch(&mut self, ctx: &egui::Context, event: InputEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.handle(event) {
            Outcome::Redraw => {
                self.dirty = true;
                ctx.request_repaint();
            }
            Outcome::Unchanged => {}
            Outcome::Quit => {
                self.finish();
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn finish(&mut self) {
        if let Some(session) = self.session.take() {
            *self.output.borrow_mut() = Some(session.finish());
        }
    }
}

impl Drop for PickerApp {
    fn drop(&mut self) {
        self.finish();
    }
}

impl eframe::App for PickerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.finish();
            return;
        }

        let keys: Vec<egui::Key> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        repeat: false,
                        ..
                    } => Some(*key),
                    _ => None,
                })
                .collect()
        });
        for key in keys {
            self.dispatch(ctx, InputEvent::Key(key));
        }

        self.ensure_texture(ctx);

        let count = self.session.as_ref().map_or(0, |s| s.points().len());
        egui::TopBottomPanel::bottom("hint").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.hint.as_str());
                ui.separator();
                ui.label(format!("points: {count}"));
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let Some(texture) = self.texture.as_ref() else {
                    return;
                };
                let pixels_per_point = ctx.pixels_per_point();
                let size = texture.size_vec2() / pixels_per_point;
                let texture_id = texture.id();

                egui::ScrollArea::both().show(ui, |ui| {
                    let (response, painter) = ui.allocate_painter(size, egui::Sense::click());
                    painter.image(
                        texture_id,
                        response.rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );

                    // Scroll bars float over the image and take the press
                    // themselves, so only presses owned by this response count.
                    let press = PressState {
                        on_image: response.is_pointer_button_down_on(),
                        primary_pressed: ctx.input(|i| i.pointer.primary_pressed()),
                        pos: response.interact_pointer_pos(),
                    };
                    if let Some((x, y)) = press.display_position(response.rect, pixels_per_point) {
                        self.dispatch(ctx, InputEvent::PointerDown { x, y });
                    }
                });
            });

        ctx.request_repaint_after(self.poll_interval);
    }
}

/// Opens a window for `session`, blocks until the operator quits, and
/// returns the collected points together with the last rendered frame.
///
/// The window is torn down on every exit path, including the close button,
/// which counts as quitting.
pub fn run(session: Session, title: &str) -> Result<SessionOutput, SessionError> {
    let (width, height) = session.frame().dimensions();
    let output: OutputSlot = Rc::new(RefCell::new(None));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width as f32, height as f32 + 28.0])
            .with_title(title),
        ..Default::default()
    };

    let app = PickerApp::new(session, Rc::clone(&output));
    eframe::run_native(title, options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|err| SessionError::Surface(err.to_string()))?;

    let result = output.borrow_mut().take();
    result.ok_or(SessionError::Aborted)
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, Rect};

    use super::PressState;

    fn image_rect() -> Rect {
        Rect::from_min_max(pos2(10.0, 20.0), pos2(110.0, 120.0))
    }

    #[test]
    fn press_on_image_maps_to_frame_pixels() {
        let press = PressState {
            on_image: true,
            primary_pressed: true,
            pos: Some(pos2(15.0, 30.0)),
        };
        assert_eq!(press.display_position(image_rect(), 1.0), Some((5.0, 10.0)));
        assert_eq!(press.display_position(image_rect(), 2.0), Some((10.0, 20.0)));
    }

    #[test]
    fn press_owned_by_another_widget_is_ignored() {
        // e.g. a scroll bar drawn over the image
        let press = PressState {
            on_image: false,
            primary_pressed: true,
            pos: Some(pos2(105.0, 60.0)),
        };
        assert_eq!(press.display_position(image_rect(), 1.0), None);
    }

    #[test]
    fn held_button_does_not_repeat_the_press() {
        let press = PressState {
            on_image: true,
            primary_pressed: false,
            pos: Some(pos2(50.0, 50.0)),
        };
        assert_eq!(press.display_position(image_rect(), 1.0), None);
    }

    #[test]
    fn press_outside_the_image_is_ignored() {
        let press = PressState {
            on_image: true,
            primary_pressed: true,
            pos: Some(pos2(5.0, 50.0)),
        };
        assert_eq!(press.display_position(image_rect(), 1.0), None);
    }
}
