use async_trait::async_trait;

/// Storage for uploaded profile pictures.
#[async_trait]
pub trait AvatarStore: Send + Sync {
    /// Persist an uploaded image and return the stored file name.
    ///
    /// `original_name` is only consulted for its extension.
    async fn store(&self, original_name: &str, bytes: Vec<u8>) -> Result<String, MediaError>;

    /// Remove a previously stored image. Missing files are not an error.
    async fn remove(&self, file_name: &str) -> Result<(), MediaError>;
}

/// Avatar storage errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("File type not allowed: {0}")]
    UnsupportedType(String),

    #[error("Could not read image: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Io(String),
}
