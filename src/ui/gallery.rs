use iced::widget::{
    button, checkbox, column, container, horizontal_space, image, mouse_area, row, scrollable,
    text,
};
use iced::{Alignment, Border, ContentFit, Element, Length, Theme};
use iced_aw::{Spinner, Wrap};

use crate::state::data::ImageDescriptor;
use crate::state::session::{GallerySession, Thumbnail, DOWNLOADING_LABEL, DOWNLOAD_LABEL};
use crate::Message;

const TILE_WIDTH: f32 = 180.0;
const THUMB_HEIGHT: f32 = 135.0;

/// Selection controls plus the wrapping grid of tiles
pub fn view(session: &GallerySession) -> Element<'_, Message> {
    let tiles: Vec<Element<'_, Message>> = session
        .images()
        .iter()
        .map(|desc| tile(session, desc))
        .collect();

    column![
        toolbar(session),
        scrollable(Wrap::with_elements(tiles)).height(Length::Fill),
    ]
    .spacing(12)
    .into()
}

fn toolbar(session: &GallerySession) -> Element<'_, Message> {
    let downloading = session.is_downloading();

    // Spinner + label while the archive is being built
    let download_content: Element<'_, Message> = if downloading {
        row![
            Spinner::new()
                .width(Length::Fixed(16.0))
                .height(Length::Fixed(16.0)),
            text(DOWNLOADING_LABEL),
        ]
        .spacing(8)
        .align_y(Alignment::Center)
        .into()
    } else {
        text(DOWNLOAD_LABEL).into()
    };

    row![
        button("Select All").on_press(Message::SelectAll),
        button("Deselect All")
            .on_press(Message::DeselectAll)
            .style(button::secondary),
        text(session.selection().label()).size(16),
        horizontal_space(),
        text(match session.session_id() {
            Some(id) => format!("Session {}", id),
            None => "No session".to_string(),
        })
        .size(12),
        button(download_content)
            .on_press_maybe((!downloading).then_some(Message::DownloadSelected))
            .style(button::success),
    ]
    .spacing(10)
    .align_y(Alignment::Center)
    .into()
}

/// One image: checkbox, thumbnail and filename caption
///
/// Highlight and checkbox both come from the selection set. The checkbox
/// captures its own clicks, so the surrounding `mouse_area` only fires for
/// clicks elsewhere on the tile.
fn tile<'a>(session: &'a GallerySession, image_desc: &'a ImageDescriptor) -> Element<'a, Message> {
    let filename = image_desc.filename.as_str();
    let selected = session.is_selected(filename);

    let thumb: Element<'a, Message> = match session.thumbnail(filename) {
        Some(Thumbnail::Ready(handle)) => image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fixed(THUMB_HEIGHT))
            .content_fit(ContentFit::Cover)
            .into(),
        Some(Thumbnail::Failed) => placeholder("Preview unavailable"),
        Some(Thumbnail::Loading) | None => placeholder("Loading..."),
    };

    let toggle = checkbox("", selected)
        .on_toggle(move |checked| Message::CheckboxToggled(filename.to_string(), checked));

    let body = column![
        toggle,
        thumb,
        text(filename).size(12).width(Length::Fill),
    ]
    .spacing(6);

    let card = container(body)
        .width(Length::Fixed(TILE_WIDTH))
        .padding(8)
        .style(move |theme: &Theme| {
            let palette = theme.extended_palette();
            let border_color = if selected {
                palette.primary.strong.color
            } else {
                palette.background.strong.color
            };
            container::Style {
                background: Some(palette.background.weak.color.into()),
                border: Border {
                    color: border_color,
                    width: if selected { 3.0 } else { 1.0 },
                    radius: 8.0.into(),
                },
                ..Default::default()
            }
        });

    // Outer padding doubles as grid spacing
    container(mouse_area(card).on_press(Message::TileClicked(filename.to_string())))
        .padding(6)
        .into()
}

fn placeholder<'a>(label: &'a str) -> Element<'a, Message> {
    container(text(label).size(12))
        .center_x(Length::Fill)
        .center_y(Length::Fixed(THUMB_HEIGHT))
        .into()
}
