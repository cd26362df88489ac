/// Thumbnail loading for gallery tiles
///
/// Images are fetched only once the grid is on screen, decoded off the UI
/// thread and shrunk so the grid never holds full-size bitmaps.
use iced::widget::image::Handle;
use image::imageops::FilterType;
use image::RgbaImage;

use crate::api::ApiClient;
use crate::error::{Error, Result};

/// Longest edge of a generated thumbnail
pub const THUMBNAIL_SIZE: u32 = 256;

/// Fetch `url` and turn it into a ready-to-draw handle
pub async fn load(client: ApiClient, url: String) -> Result<Handle> {
    let bytes = client.fetch_image(&url).await?;

    // Spawn blocking because decoding and resizing are CPU-intensive
    let pixels = tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|e| Error::Io(format!("Task join error: {}", e)))??;

    let (width, height) = pixels.dimensions();
    Ok(Handle::from_rgba(width, height, pixels.into_raw()))
}

/// Decode any supported format and fit it inside `THUMBNAIL_SIZE`
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| Error::Io(format!("Failed to decode image: {}", e)))?;

    let img = if img.width() > THUMBNAIL_SIZE || img.height() > THUMBNAIL_SIZE {
        img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
    } else {
        img
    };

    Ok(img.to_rgba8())
}
