use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrelliumError {
    #[error("CREATION ERROR: {code} - {message}")]
    Creation { code: String, message: String },

    #[error("RESOLUTION ERROR: {code} - {message}")]
    Resolution { code: String, message: String },

    #[error("RESOURCE ERROR: {code} - {message}")]
    Resource { code: String, message: String },

    #[error("SYSTEM ERROR: {code} - {message}")]
    System { code: String, message: String },
}
