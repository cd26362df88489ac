use iced::widget::{button, column, container, horizontal_space, row, text, Column};
use iced::{Alignment, Element, Length, Subscription, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod state;
mod thumbnail;
mod ui;

use api::ApiClient;
use config::{CliArgs, Config};
use error::Error;
use state::data::{ArchiveReady, Generated};
use state::progress::TICK_INTERVAL;
use state::session::{Effect, GallerySession};

/// Main application state
struct GalleryGrab {
    /// Everything the window shows
    session: GallerySession,
    /// Connection settings for the gallery server
    client: ApiClient,
    config: Config,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    QueryChanged(String),
    LimitChanged(String),
    /// User pressed Generate (or Enter in one of the inputs)
    Submit,
    /// `/generate` settled for the given search id
    Generated(u64, Result<Generated, Error>),
    /// The 100% pause is over for the given search id
    Reveal(u64),
    ProgressTick,
    ThumbnailLoaded(u64, String, Result<iced::widget::image::Handle, Error>),

    TileClicked(String),
    CheckboxToggled(String, bool),
    SelectAll,
    DeselectAll,

    DownloadSelected,
    ArchiveReady(Result<ArchiveReady, Error>),
    /// Archive fetch finished; carries the server message for that archive
    ArchiveSaved(String, Result<PathBuf, Error>),
    ChooseDownloadDir,

    ClearServer,
    Cleared(Result<String, Error>),
    DismissBanner,
}

impl GalleryGrab {
    /// Create a new instance of the application
    fn new(config: Config, client: ApiClient, warning: Option<String>) -> (Self, Task<Message>) {
        let mut session = GallerySession::new(config.default_limit);
        if let Some(warning) = warning {
            session.report_error(warning);
        }

        tracing::info!(
            "🎨 Gallery Grab ready, server {}, archives go to {}",
            client.base_url(),
            config.download_dir().display()
        );

        (
            GalleryGrab {
                session,
                client,
                config,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::QueryChanged(query) => {
                self.session.set_query(query);
                Task::none()
            }
            Message::LimitChanged(limit) => {
                self.session.set_limit(limit);
                Task::none()
            }
            Message::Submit => {
                let effect = self.session.submit();
                self.perform(effect)
            }
            Message::Generated(request, result) => {
                let effect = self.session.on_generated(request, result);
                self.perform(effect)
            }
            Message::Reveal(request) => {
                let effect = self.session.reveal(request);
                self.perform(effect)
            }
            Message::ProgressTick => {
                self.session.on_progress_tick();
                Task::none()
            }
            Message::ThumbnailLoaded(request, filename, result) => {
                self.session.on_thumbnail(request, filename, result);
                Task::none()
            }
            Message::TileClicked(filename) => {
                self.session.tile_clicked(&filename);
                Task::none()
            }
            Message::CheckboxToggled(filename, checked) => {
                self.session.checkbox_toggled(&filename, checked);
                Task::none()
            }
            Message::SelectAll => {
                self.session.select_all();
                Task::none()
            }
            Message::DeselectAll => {
                self.session.deselect_all();
                Task::none()
            }
            Message::DownloadSelected => {
                let effect = self.session.download_selected();
                self.perform(effect)
            }
            Message::ArchiveReady(result) => {
                let effect = self.session.on_archive_ready(result);
                self.perform(effect)
            }
            Message::ArchiveSaved(message, result) => {
                self.session.on_archive_saved(message, result);
                Task::none()
            }
            Message::ChooseDownloadDir => {
                // Show the native folder picker dialog
                let folder = FileDialog::new()
                    .set_title("Select Folder for Downloaded Archives")
                    .set_directory(self.config.download_dir())
                    .pick_folder();

                if let Some(folder) = folder {
                    tracing::info!(dir = %folder.display(), "download folder changed");
                    self.config.download_dir = Some(folder);
                    if let Err(err) = config::save(&self.config) {
                        tracing::warn!(error = %err, "could not save settings");
                        self.session
                            .report_error(format!("Could not save settings: {}", err));
                    }
                }
                Task::none()
            }
            Message::ClearServer => {
                let effect = self.session.clear_server();
                self.perform(effect)
            }
            Message::Cleared(result) => {
                self.session.on_cleared(result);
                Task::none()
            }
            Message::DismissBanner => {
                self.session.dismiss_banner();
                Task::none()
            }
        }
    }

    /// Turn a controller effect into a background task
    fn perform(&self, effect: Effect) -> Task<Message> {
        match effect {
            Effect::None => Task::none(),
            Effect::Generate { request, body } => {
                let client = self.client.clone();
                Task::perform(async move { client.generate(&body).await }, move |result| {
                    Message::Generated(request, result)
                })
            }
            Effect::RevealAfter { request, delay } => {
                Task::perform(tokio::time::sleep(delay), move |()| Message::Reveal(request))
            }
            Effect::LoadThumbnails { request, images } => {
                Task::batch(images.into_iter().map(|image| {
                    let filename = image.filename;
                    Task::perform(
                        thumbnail::load(self.client.clone(), image.url),
                        move |result| Message::ThumbnailLoaded(request, filename.clone(), result),
                    )
                }))
            }
            Effect::DownloadSelected(body) => {
                let client = self.client.clone();
                Task::perform(
                    async move { client.download_selected(&body).await },
                    Message::ArchiveReady,
                )
            }
            Effect::SaveArchive { zip_file, message } => {
                let client = self.client.clone();
                let dest_dir = self.config.download_dir();
                Task::perform(
                    async move { client.save_archive(&zip_file, &dest_dir).await },
                    move |result| Message::ArchiveSaved(message.clone(), result),
                )
            }
            Effect::Cleanup => {
                let client = self.client.clone();
                Task::perform(async move { client.cleanup().await }, Message::Cleared)
            }
        }
    }

    /// The progress timer only exists while a search is running
    fn subscription(&self) -> Subscription<Message> {
        if self.session.progress().is_running() {
            iced::time::every(TICK_INTERVAL).map(|_| Message::ProgressTick)
        } else {
            Subscription::none()
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let busy = self.session.is_searching() || self.session.is_cleaning();

        let header = row![
            text("Gallery Grab").size(32),
            horizontal_space(),
            column![
                text(format!("Server: {}", self.client.base_url())).size(12),
                text(format!("Archives: {}", self.config.download_dir().display())).size(12),
            ]
            .spacing(2),
            button("Download Folder")
                .on_press(Message::ChooseDownloadDir)
                .style(button::secondary),
            button("Clear Server Cache")
                .on_press_maybe((!busy).then_some(Message::ClearServer))
                .style(button::danger),
        ]
        .spacing(12)
        .align_y(Alignment::Center);

        let mut content: Column<Message> = column![header, ui::search::view(&self.session)]
            .spacing(20)
            .padding(24);

        if self.session.progress().is_visible() {
            content = content.push(ui::progress::view(self.session.progress()));
        }
        if let Some(banner) = self.session.banner() {
            content = content.push(ui::banner::view(banner));
        }
        if self.session.is_gallery_visible() {
            content = content.push(ui::gallery::view(&self.session));
        }

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gallery_grab=info")),
        )
        .init();

    let cli = match CliArgs::parse(pico_args::Arguments::from_env()) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("usage: gallery-grab [--server URL] [--download-dir PATH] [--limit N]");
            std::process::exit(2);
        }
    };

    let (mut config, warning) = config::load();
    config.apply(cli);

    let client = match ApiClient::new(&config.server_url, config.request_timeout()) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!(error = %err, "cannot start");
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };

    iced::application("Gallery Grab", GalleryGrab::update, GalleryGrab::view)
        .subscription(GalleryGrab::subscription)
        .theme(GalleryGrab::theme)
        .centered()
        .run_with(move || GalleryGrab::new(config, client, warning))
}
