//! # Note Strip Widget
//!
//! A one-octave row of white keys, C through B, with the note most
//! recently sent to the device lit up. While a melody is paused the lit
//! key turns gold instead of green.

use iced::alignment;
use iced::widget::canvas::{self, Fill, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Pixels, Point, Rectangle, Renderer, Size, Theme, mouse};
use melody_core::Note;

/// Height of the strip in pixels.
const STRIP_HEIGHT: f32 = 90.0;

#[derive(Debug, Clone)]
pub struct NoteStrip {
    /// Note most recently sent, if any
    active: Option<Note>,
    paused: bool,
}

impl NoteStrip {
    pub fn new(active: Option<Note>, paused: bool) -> Self {
        Self { active, paused }
    }

    // Consumes `self` so the element owns its program.
    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(STRIP_HEIGHT)),
        )
        .into()
    }

    fn key_color(&self, note: Note) -> Color {
        match (self.active == Some(note), self.paused) {
            (true, false) => Color::from_rgb8(0x34, 0xDB, 0x98), // Green (Sounding)
            (true, true) => Color::from_rgb(1.0, 0.84, 0.0),     // Gold (Paused)
            _ => Color::WHITE,
        }
    }
}

impl<Message> canvas::Program<Message> for NoteStrip {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let key_width = bounds.width / Note::ALL.len() as f32;

        for note in Note::ALL {
            let x = note.index() as f32 * key_width;
            let top_left = Point::new(x, 0.0);
            let size = Size::new(key_width, bounds.height);

            frame.fill_rectangle(top_left, size, Fill::from(self.key_color(note)));
            frame.stroke(
                &Path::rectangle(top_left, size),
                Stroke::default().with_color(Color::BLACK),
            );
            frame.fill_text(canvas::Text {
                content: note.to_string(),
                position: Point::new(x + key_width / 2.0, bounds.height - 14.0),
                color: Color::from_rgb(0.2, 0.2, 0.2),
                size: Pixels(16.0),
                horizontal_alignment: alignment::Horizontal::Center,
                vertical_alignment: alignment::Vertical::Center,
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}
