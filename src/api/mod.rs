/// HTTP access to the gallery server
///
/// This module handles:
/// - The two JSON exchanges (`/generate`, `/download-selected`) and `/cleanup`
/// - Fetching image bytes for thumbnails
/// - Streaming finished archives to disk

pub mod client;

pub use client::ApiClient;
