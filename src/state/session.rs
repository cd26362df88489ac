/// Gallery session controller
///
/// Owns everything the window shows: the search form, the progress
/// estimate, the current result set and the selection. Each user event or
/// finished request is fed in through one of the `on_*`/action methods,
/// which update state and return the single `Effect` the shell has to run.
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use iced::widget::image::Handle;

use super::data::{
    ArchiveReady, DownloadRequest, GenerateRequest, Generated, ImageDescriptor, SessionId,
};
use super::progress::ProgressEstimator;
use super::selection::Selection;
use crate::error::Error;

/// How long 100% stays on screen before the results replace it
pub const REVEAL_DELAY: Duration = Duration::from_millis(500);

pub const GENERATE_LABEL: &str = "Generate Images";
pub const GENERATING_LABEL: &str = "Generating...";
pub const DOWNLOAD_LABEL: &str = "Download Selected";
pub const DOWNLOADING_LABEL: &str = "Creating ZIP...";

/// I/O the shell has to perform after a state change
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Nothing to do.
    None,
    /// Send `POST /generate`.
    Generate { request: u64, body: GenerateRequest },
    /// Call `reveal` for `request` after `delay`.
    RevealAfter { request: u64, delay: Duration },
    /// Fetch a thumbnail for every image of `request`.
    LoadThumbnails { request: u64, images: Vec<ImageDescriptor> },
    /// Send `POST /download-selected`.
    DownloadSelected(DownloadRequest),
    /// Fetch `/download-zip/<zip_file>` into the download directory;
    /// `message` is the server text to report once it is saved.
    SaveArchive { zip_file: String, message: String },
    /// Send `POST /cleanup`.
    Cleanup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// The single message area above the gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub severity: Severity,
    pub text: String,
}

/// Per-tile image state
#[derive(Debug, Clone)]
pub enum Thumbnail {
    Loading,
    Ready(Handle),
    Failed,
}

#[derive(Debug, Default)]
pub struct GallerySession {
    query: String,
    limit: String,

    /// Id of the latest search; completions for older ids are dropped
    request: u64,
    searching: bool,
    /// Successful result waiting for the reveal delay
    pending: Option<Generated>,

    progress: ProgressEstimator,
    banner: Option<Banner>,

    session_id: Option<SessionId>,
    images: Vec<ImageDescriptor>,
    /// Search id the rendered images belong to
    shown_request: u64,
    thumbnails: HashMap<String, Thumbnail>,
    gallery_visible: bool,
    selection: Selection,

    downloading: bool,
    cleaning: bool,
}

impl GallerySession {
    pub fn new(default_limit: u32) -> Self {
        Self {
            limit: default_limit.to_string(),
            ..Self::default()
        }
    }

    // ========== Search form ==========

    pub fn set_query(&mut self, query: String) {
        self.query = query;
    }

    pub fn set_limit(&mut self, limit: String) {
        self.limit = limit;
    }

    /// Validate the form and start a search
    pub fn submit(&mut self) -> Effect {
        if self.searching {
            return Effect::None;
        }

        let query = self.query.trim().to_string();
        if query.is_empty() {
            self.fail(Error::Validation("Please enter a search query".into()));
            return Effect::None;
        }
        let Some(limit) = parse_limit(&self.limit) else {
            self.fail(Error::Validation("Please enter a valid number of images".into()));
            return Effect::None;
        };

        self.request += 1;
        self.searching = true;
        self.pending = None;
        self.banner = None;
        self.gallery_visible = false;
        self.images.clear();
        self.thumbnails.clear();
        self.selection.clear();

        self.progress.start(limit);

        tracing::info!(request = self.request, %query, limit, "starting search");
        Effect::Generate {
            request: self.request,
            body: GenerateRequest { query, limit },
        }
    }

    /// `/generate` settled, successfully or not
    pub fn on_generated(&mut self, request: u64, result: Result<Generated, Error>) -> Effect {
        if request != self.request {
            tracing::debug!(request, current = self.request, "ignoring stale search result");
            return Effect::None;
        }
        self.searching = false;

        match result {
            Ok(generated) => {
                tracing::info!(request, images = generated.images.len(), "search succeeded");
                self.progress.complete();
                self.pending = Some(generated);
                Effect::RevealAfter {
                    request,
                    delay: REVEAL_DELAY,
                }
            }
            Err(err) => {
                tracing::warn!(request, error = %err, "search failed");
                self.progress.fail();
                self.session_id = None;
                self.fail(err);
                Effect::None
            }
        }
    }

    /// Swap the finished progress bar for the results
    pub fn reveal(&mut self, request: u64) -> Effect {
        if request != self.request {
            return Effect::None;
        }
        let Some(generated) = self.pending.take() else {
            return Effect::None;
        };

        self.show_success(generated.message);
        self.session_id = generated.session_id;
        self.images = generated.images;
        self.shown_request = request;
        self.thumbnails = self
            .images
            .iter()
            .map(|image| (image.filename.clone(), Thumbnail::Loading))
            .collect();
        self.selection.clear();
        self.gallery_visible = true;
        self.progress.hide();

        Effect::LoadThumbnails {
            request,
            images: self.images.clone(),
        }
    }

    pub fn on_progress_tick(&mut self) {
        self.progress.tick();
    }

    pub fn on_thumbnail(&mut self, request: u64, filename: String, result: Result<Handle, Error>) {
        if request != self.shown_request {
            return;
        }
        if let Some(slot) = self.thumbnails.get_mut(&filename) {
            *slot = match result {
                Ok(handle) => Thumbnail::Ready(handle),
                Err(err) => {
                    tracing::debug!(%filename, error = %err, "thumbnail unavailable");
                    Thumbnail::Failed
                }
            };
        }
    }

    // ========== Selection ==========

    /// Click on a tile outside its checkbox
    pub fn tile_clicked(&mut self, filename: &str) {
        if self.is_rendered(filename) {
            self.selection.toggle(filename);
        }
    }

    pub fn checkbox_toggled(&mut self, filename: &str, checked: bool) {
        if self.is_rendered(filename) {
            self.selection.set(filename, checked);
        }
    }

    pub fn select_all(&mut self) {
        self.selection
            .select_all(self.images.iter().map(|image| image.filename.as_str()));
    }

    pub fn deselect_all(&mut self) {
        self.selection
            .deselect_all(self.images.iter().map(|image| image.filename.as_str()));
    }

    // ========== Bulk download ==========

    pub fn download_selected(&mut self) -> Effect {
        if self.downloading {
            return Effect::None;
        }
        if self.selection.is_empty() {
            self.fail(Error::Validation("Please select at least one image".into()));
            return Effect::None;
        }

        self.downloading = true;
        let body = DownloadRequest {
            session_id: self.session_id.clone(),
            images: self.selection.filenames().to_vec(),
        };
        tracing::info!(images = body.images.len(), "requesting archive");
        Effect::DownloadSelected(body)
    }

    /// `/download-selected` settled
    pub fn on_archive_ready(&mut self, result: Result<ArchiveReady, Error>) -> Effect {
        self.downloading = false;

        match result {
            Ok(ready) => {
                tracing::info!(zip_file = %ready.zip_file, "archive ready");
                self.show_success(ready.message.clone());
                Effect::SaveArchive {
                    zip_file: ready.zip_file,
                    message: ready.message,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "archive request failed");
                self.fail(err);
                Effect::None
            }
        }
    }

    /// The archive fetch finished; `message` is what the server said when
    /// it built this archive
    pub fn on_archive_saved(&mut self, message: String, result: Result<PathBuf, Error>) {
        match result {
            Ok(path) => {
                tracing::info!(path = %path.display(), "archive saved");
                let text = if message.is_empty() {
                    format!("Saved to {}", path.display())
                } else {
                    format!("{} (saved to {})", message, path.display())
                };
                self.show_success(text);
            }
            Err(err) => {
                tracing::warn!(error = %err, "archive download failed");
                self.show_error(format!("Could not save archive: {}", err));
            }
        }
    }

    // ========== Server cleanup ==========

    pub fn clear_server(&mut self) -> Effect {
        if self.cleaning || self.searching {
            return Effect::None;
        }
        self.cleaning = true;
        Effect::Cleanup
    }

    pub fn on_cleared(&mut self, result: Result<String, Error>) {
        self.cleaning = false;
        match result {
            Ok(message) => {
                tracing::info!("server cache cleared");
                // A result still waiting for its reveal names a session the
                // server just forgot
                self.request += 1;
                self.pending = None;
                self.progress.hide();
                self.session_id = None;
                self.images.clear();
                self.thumbnails.clear();
                self.selection.clear();
                self.gallery_visible = false;
                self.show_success(message);
            }
            Err(err) => {
                tracing::warn!(error = %err, "cleanup failed");
                self.fail(err);
            }
        }
    }

    /// Show an error that did not come from one of the handlers above
    pub fn report_error(&mut self, text: impl Into<String>) {
        self.show_error(text);
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    // ========== Accessors for the view ==========

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> &str {
        &self.limit
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn generate_label(&self) -> &'static str {
        if self.searching {
            GENERATING_LABEL
        } else {
            GENERATE_LABEL
        }
    }

    pub fn progress(&self) -> &ProgressEstimator {
        &self.progress
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn images(&self) -> &[ImageDescriptor] {
        &self.images
    }

    pub fn thumbnail(&self, filename: &str) -> Option<&Thumbnail> {
        self.thumbnails.get(filename)
    }

    pub fn is_gallery_visible(&self) -> bool {
        self.gallery_visible
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_selected(&self, filename: &str) -> bool {
        self.selection.contains(filename)
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading
    }

    pub fn is_cleaning(&self) -> bool {
        self.cleaning
    }

    fn is_rendered(&self, filename: &str) -> bool {
        self.images.iter().any(|image| image.filename == filename)
    }

    fn show_success(&mut self, text: impl Into<String>) {
        self.banner = Some(Banner {
            severity: Severity::Success,
            text: text.into(),
        });
    }

    fn fail(&mut self, err: Error) {
        self.show_error(err.to_string());
    }

    fn show_error(&mut self, text: impl Into<String>) {
        self.banner = Some(Banner {
            severity: Severity::Error,
            text: text.into(),
        });
    }
}

/// Parse the raw limit field; only positive integers are accepted
pub fn parse_limit(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|limit| *limit > 0)
}
