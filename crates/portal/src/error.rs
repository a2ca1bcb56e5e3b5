use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize preferences: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Not logged in. Run `portal login` first.")]
    NotLoggedIn,

    #[error(transparent)]
    Core(#[from] portal_core::Error),
}
