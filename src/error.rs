/// Error types shared by the controller, the HTTP client and the config layer
///
/// Every variant carries a plain string so errors can travel inside
/// `Message`s, which must be `Clone`.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Rejected locally before any request was made (empty query, empty selection)
    #[error("{0}")]
    Validation(String),

    /// The server answered with `success: false`
    #[error("{0}")]
    Server(String),

    /// The request never produced a usable JSON body
    #[error("Network error: {0}")]
    Transport(String),

    /// Local file system failure (saving an archive, reading settings)
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed settings file or command line value
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
