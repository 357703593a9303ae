/// Picture Gallery page: browse generations, zoom and compare
use iced::widget::image::{FilterMethod, Handle};
use iced::widget::{button, canvas, column, image, pick_list, row, slider, stack, text, Column, Space};
use iced::{Alignment, Element, Length, Pixels, Point};
use iced_aw::Wrap;

use super::canvas::{window_outline, FocalPicker};
use pixelpro::state::gallery::GalleryState;
use crate::Message;

/// Side length of each half of the comparison, in screen pixels
const COMPARISON_SIZE: f32 = 360.0;
const THUMBNAIL_SIZE: f32 = 120.0;

/// Handles the page renders, built once per picture change
#[derive(Debug, Clone, Default)]
pub struct GalleryImages {
    /// Downscaled original for the focal picker
    pub preview: Option<Handle>,
    /// Low- and high-resolution crops
    pub comparison: Option<(Handle, Handle)>,
}

pub fn view<'a>(state: &'a GalleryState, images: &'a GalleryImages) -> Element<'a, Message> {
    let selector = pick_list(
        state.generations.as_slice(),
        state.selected,
        Message::SelectGeneration,
    )
    .placeholder("Choose a timestamp");

    let mut content = column![
        text("Picture Gallery").size(40),
        row![text("Choose a timestamp").size(16), selector, button("Refresh").on_press(Message::RefreshGallery)]
            .spacing(12)
            .align_y(Alignment::Center),
    ]
    .spacing(20);

    if let Some(status) = &state.status {
        content = content.push(text(format!("⚠️ {}", status)));
    }

    if state.generations.is_empty() {
        return content
            .push(text("No pictures yet. Generate some on the Picture Generator page."))
            .into();
    }

    content = content.push(
        row![
            thumbnails(state),
            button("Download picture")
                .on_press_maybe(state.selected_file().map(|_| Message::Download))
                .padding(10),
        ]
        .spacing(20),
    );

    if state.selected_file().is_some() {
        content = content.push(
            row![
                column![text("Picture Comparison").size(24), comparison(state, images)]
                    .spacing(10)
                    .width(Length::FillPortion(3)),
                zoom_panel(state, images).width(Length::FillPortion(1)),
            ]
            .spacing(30),
        );
    }

    content.into()
}

fn thumbnails<'a>(state: &'a GalleryState) -> Element<'a, Message> {
    let tiles: Vec<Element<'a, Message>> = state
        .files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            let tile = column![
                image(Handle::from_path(&file.path))
                    .width(Length::Fixed(THUMBNAIL_SIZE))
                    .height(Length::Fixed(THUMBNAIL_SIZE)),
                text(file.file_name()).size(12),
            ]
            .spacing(4)
            .align_x(Alignment::Center);

            let style = if state.selected_file == Some(index) {
                button::primary
            } else {
                button::secondary
            };
            button(tile).style(style).on_press(Message::SelectFile(index)).into()
        })
        .collect();

    Wrap::with_elements(tiles)
        .spacing(Pixels(10.0))
        .line_spacing(Pixels(10.0))
        .into()
}

fn comparison<'a>(state: &'a GalleryState, images: &'a GalleryImages) -> Element<'a, Message> {
    match (&state.comparison, &images.comparison) {
        (Some(Ok(_)), Some((lowres, highres))) => {
            let label = state.selected_file().map(|f| f.file_name()).unwrap_or_default();
            row![
                column![text("original.png"), crop_view(lowres)].spacing(6),
                column![text(label), crop_view(highres)].spacing(6),
            ]
            .spacing(12)
            .into()
        }
        (Some(Err(e)), _) => text(format!("⚠️ Comparison unavailable: {}", e)).into(),
        _ => text("Loading pictures...").into(),
    }
}

fn crop_view<'a>(handle: &'a Handle) -> Element<'a, Message> {
    image(handle.clone())
        .width(Length::Fixed(COMPARISON_SIZE))
        .height(Length::Fixed(COMPARISON_SIZE))
        .filter_method(FilterMethod::Nearest)
        .into()
}

fn zoom_panel<'a>(state: &'a GalleryState, images: &'a GalleryImages) -> Column<'a, Message> {
    let mut panel = column![text("Zoom Area (click on image)").size(16)]
        .spacing(10)
        .align_x(Alignment::Center);

    if let (Some(transform), Some(preview)) = (&state.transform, &images.preview) {
        let (width, height) = transform.preview_size();
        let (width, height) = (width as f32, height as f32);

        // Outline the crop actually used, falling back to the raw click
        let (focal, window) = match &state.comparison {
            Some(Ok(cmp)) => {
                let centre = transform.to_preview(cmp.focal.0, cmp.focal.1);
                let half = (cmp.snippet_size / 2) as f32 * transform.ratio() as f32;
                (centre, Some(window_outline(centre, half)))
            }
            _ => (transform.to_preview(state.focal.0, state.focal.1), None),
        };

        let picker = FocalPicker {
            focal: Some(Point::new(focal.0, focal.1)),
            window,
        };

        panel = panel.push(stack![
            image(preview.clone())
                .width(Length::Fixed(width))
                .height(Length::Fixed(height)),
            canvas(picker).width(Length::Fixed(width)).height(Length::Fixed(height)),
        ]);
    } else {
        panel = panel.push(Space::with_height(Length::Fixed(100.0)));
    }

    panel = panel.push(text("Zoom").size(16)).push(
        row![
            slider(0..=100u8, state.zoom, Message::ZoomChanged).step(5u8),
            text(format!("{}%", state.zoom)),
        ]
        .spacing(8)
        .align_y(Alignment::Center),
    );

    panel = panel.push(text("Specifications").size(16));
    if let Some(loaded) = &state.loaded {
        let (width, height) = (loaded.original.width(), loaded.original.height());
        panel = panel.push(text(format!("Size (original): {} x {}", width, height)));

        if let Some(scale) = state.selected_scale().filter(|s| *s != 1) {
            panel = panel.push(text(format!("Size (x{}): {} x {}", scale, width * scale, height * scale)));
        }
    }

    panel
}
