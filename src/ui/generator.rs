/// Picture Generator page: upload, pick scales, generate
use iced::widget::image::Handle;
use iced::widget::{button, column, horizontal_rule, image, progress_bar, radio, row, text, Column, Space};
use iced::{Alignment, Element, Length};

use pixelpro::state::generator::GeneratorState;
use crate::Message;

pub fn view<'a>(state: &'a GeneratorState, preview: Option<&'a Handle>) -> Element<'a, Message> {
    let scale_selector = Column::with_children(scale_options(state)).spacing(6);

    let upload_row = row![
        column![
            text("Please upload a picture...").size(24),
            button("Browse files")
                .on_press_maybe((!state.is_busy()).then_some(Message::PickUpload))
                .padding(10),
            text("JPG, JPEG or PNG").size(12),
        ]
        .spacing(10)
        .width(Length::FillPortion(3)),
        column![text("Scaling factor").size(18), scale_selector]
            .spacing(8)
            .width(Length::FillPortion(1)),
    ]
    .spacing(20);

    let mut content = column![
        text("PixelPro").size(80),
        upload_row,
        horizontal_rule(1),
    ]
    .spacing(20);

    if let Some(upload) = &state.upload {
        let picture: Element<'a, Message> = match preview {
            Some(handle) => image(handle.clone()).width(Length::Fixed(400.0)).into(),
            None => Space::with_width(Length::Fixed(400.0)).into(),
        };

        let mut specs = column![
            text("Current specifications:").size(20),
            text(format!("Size: {} x {}", upload.width, upload.height)),
            text("Future specifications:").size(20),
        ]
        .spacing(6);
        for (scale, width, height) in state.future_sizes() {
            specs = specs.push(text(format!("Size ({}): {} x {}", scale, width, height)));
        }

        content = content.push(
            row![
                column![text("Uploaded picture").size(20), picture].spacing(8),
                specs.width(Length::Fill),
                button("Generate!")
                    .on_press_maybe(state.can_generate().then_some(Message::Generate))
                    .padding(10),
            ]
            .spacing(30)
            .align_y(Alignment::Start),
        );
    }

    if let Some(percent) = state.progress {
        content = content.push(
            column![
                text("Generating your pictures... ⏳"),
                progress_bar(0.0..=100.0, percent as f32),
            ]
            .spacing(6),
        );
    }

    content.push(text(&state.status).size(16)).into()
}

fn scale_options(state: &GeneratorState) -> Vec<Element<'static, Message>> {
    pixelpro::inference::ScaleSelection::OPTIONS
        .iter()
        .map(|option| radio(option.to_string(), *option, Some(state.selection), Message::SelectScale).into())
        .collect()
}
