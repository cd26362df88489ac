use iced::widget::{column, progress_bar, text};
use iced::{Element, Length};

use crate::state::progress::ProgressEstimator;
use crate::Message;

/// Estimated search progress: a bar plus the rounded percentage
///
/// Turns to the success style once the real response has arrived.
pub fn view(progress: &ProgressEstimator) -> Element<'_, Message> {
    let percent = progress.percent();

    let bar = progress_bar(0.0..=100.0, progress.value())
        .height(Length::Fixed(18.0))
        .style(if progress.is_complete() {
            progress_bar::success
        } else {
            progress_bar::primary
        });

    column![bar, text(format!("{}%", percent)).size(14)]
        .spacing(4)
        .width(Length::Fill)
        .into()
}
