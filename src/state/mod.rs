/// State management module
///
/// This module handles all application state, including:
/// - Wire and model data structures (data.rs)
/// - The simulated search progress (progress.rs)
/// - The set of selected images (selection.rs)
/// - The gallery session controller tying them together (session.rs)

pub mod data;
pub mod progress;
pub mod selection;
pub mod session;
