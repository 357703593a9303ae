use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::Message;

/// Transparent canvas laid over the downscaled original.
/// A left click picks the focal point; the current crop window is outlined.
pub struct FocalPicker {
    /// Current focal point in preview coordinates
    pub focal: Option<Point>,
    /// Low-resolution crop window in preview coordinates
    pub window: Option<Rectangle>,
}

impl Program<Message> for FocalPicker {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let accent = Color::from_rgb(1.0, 0.35, 0.2);

        if let Some(window) = self.window {
            let outline = Path::rectangle(window.position(), window.size());
            frame.stroke(&outline, Stroke::default().with_color(accent).with_width(1.5));
        }

        if let Some(focal) = self.focal {
            let marker = Path::circle(focal, 3.0);
            frame.fill(&marker, accent);
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        if let canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) = event {
            // Position relative to the preview's top-left corner
            if let Some(position) = cursor.position_in(bounds) {
                return (canvas::event::Status::Captured, Some(Message::FocalPicked(position)));
            }
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}

/// Square outline reaching `half_extent` preview pixels either side of `focal`
pub fn window_outline(focal: (f32, f32), half_extent: f32) -> Rectangle {
    Rectangle::new(
        Point::new(focal.0 - half_extent, focal.1 - half_extent),
        Size::new(half_extent * 2.0, half_extent * 2.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_outline_is_centred() {
        let rect = window_outline((50.0, 40.0), 10.0);
        assert_eq!(rect.x, 40.0);
        assert_eq!(rect.y, 30.0);
        assert_eq!(rect.width, 20.0);
        assert_eq!(rect.height, 20.0);
        assert_eq!(rect.center(), Point::new(50.0, 40.0));
    }
}
