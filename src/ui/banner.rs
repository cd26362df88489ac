use iced::widget::{button, container, horizontal_space, row, text};
use iced::{Alignment, Border, Color, Element, Length, Theme};

use crate::state::session::{Banner, Severity};
use crate::Message;

/// The message area: green for success, red for errors
pub fn view(banner: &Banner) -> Element<'_, Message> {
    let severity = banner.severity;
    let icon = match severity {
        Severity::Success => "✔",
        Severity::Error => "⚠",
    };

    let content = row![
        text(icon).size(16),
        text(&banner.text).size(16),
        horizontal_space(),
        button(text("✕").size(14))
            .on_press(Message::DismissBanner)
            .style(button::text),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    container(content)
        .width(Length::Fill)
        .padding(12)
        .style(move |theme: &Theme| {
            let palette = theme.extended_palette();
            let pair = match severity {
                Severity::Success => palette.success.weak,
                Severity::Error => palette.danger.weak,
            };
            container::Style {
                text_color: Some(pair.text),
                background: Some(pair.color.into()),
                border: Border {
                    color: Color { a: 0.6, ..pair.color },
                    width: 1.0,
                    radius: 6.0.into(),
                },
                ..Default::default()
            }
        })
        .into()
}
