use iced::widget::{button, column, row, text, text_input};
use iced::{Alignment, Element, Length};
use iced_aw::Spinner;

use crate::state::session::GallerySession;
use crate::Message;

/// Query and limit inputs with the Generate button
///
/// Inputs and button are disabled while a search is in flight.
pub fn view(session: &GallerySession) -> Element<'_, Message> {
    let busy = session.is_searching();

    let mut query = text_input("What should the images show?", session.query())
        .padding(10)
        .size(16)
        .width(Length::FillPortion(4));
    let mut limit = text_input("10", session.limit())
        .padding(10)
        .size(16)
        .width(Length::FillPortion(1));
    if !busy {
        query = query
            .on_input(Message::QueryChanged)
            .on_submit(Message::Submit);
        limit = limit
            .on_input(Message::LimitChanged)
            .on_submit(Message::Submit);
    }

    let mut label = row![].spacing(8).align_y(Alignment::Center);
    if busy {
        label = label.push(
            Spinner::new()
                .width(Length::Fixed(16.0))
                .height(Length::Fixed(16.0)),
        );
    }
    label = label.push(text(session.generate_label()));

    let generate = button(label)
        .padding(10)
        .on_press_maybe((!busy).then_some(Message::Submit));

    column![
        row![
            column![text("Search query").size(14), query].spacing(4),
            column![text("Number of images").size(14), limit].spacing(4),
        ]
        .spacing(12),
        generate,
    ]
    .spacing(12)
    .into()
}
