//! Profile picture storage on the local filesystem.
//!
//! Uploads are decoded, shrunk to fit the configured square (aspect ratio
//! kept, never upscaled) and written under a random hex name. The client's
//! filename contributes nothing but its extension.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{DynamicImage, GenericImageView, ImageFormat};

use quill_core::ports::{AvatarStore, MediaError};

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "png"];

/// Avatar storage configuration.
#[derive(Debug, Clone)]
pub struct AvatarConfig {
    pub dir: PathBuf,
    /// Bounding box edge in pixels.
    pub size: u32,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("static/profile_pics"),
            size: 125,
        }
    }
}

impl AvatarConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            dir: std::env::var("AVATAR_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.dir),
            size: std::env::var("AVATAR_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.size),
        }
    }
}

/// Writes thumbnails into a single directory.
pub struct LocalAvatarStore {
    config: AvatarConfig,
}

impl LocalAvatarStore {
    pub fn new(config: AvatarConfig) -> Self {
        Self { config }
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }
}

/// Lower-cased extension of an allowed upload.
pub fn allowed_extension(original_name: &str) -> Result<String, MediaError> {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| MediaError::UnsupportedType(original_name.to_string()))?;

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(MediaError::UnsupportedType(ext))
    }
}

/// `<16 hex chars>.<ext>` - token and extension joined into one file name.
fn random_file_name(ext: &str) -> String {
    let token: [u8; 8] = rand::random();
    format!("{}.{}", hex::encode(token), ext)
}

fn shrink(bytes: &[u8], size: u32) -> Result<DynamicImage, MediaError> {
    let img = image::load_from_memory(bytes).map_err(|e| MediaError::Decode(e.to_string()))?;

    let (width, height) = img.dimensions();
    if width <= size && height <= size {
        return Ok(img);
    }
    Ok(img.thumbnail(size, size))
}

fn write_image(img: DynamicImage, path: &Path, ext: &str) -> Result<(), MediaError> {
    let (img, format) = match ext {
        // JPEG has no alpha channel
        "jpg" => (DynamicImage::ImageRgb8(img.to_rgb8()), ImageFormat::Jpeg),
        _ => (img, ImageFormat::Png),
    };

    img.save_with_format(path, format)
        .map_err(|e| MediaError::Io(e.to_string()))
}

#[async_trait]
impl AvatarStore for LocalAvatarStore {
    async fn store(&self, original_name: &str, bytes: Vec<u8>) -> Result<String, MediaError> {
        let ext = allowed_extension(original_name)?;
        let file_name = random_file_name(&ext);
        let path = self.config.dir.join(&file_name);
        let dir = self.config.dir.clone();
        let size = self.config.size;

        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&dir).map_err(|e| MediaError::Io(e.to_string()))?;
            let img = shrink(&bytes, size)?;
            write_image(img, &path, &ext)
        })
        .await
        .map_err(|e| MediaError::Io(e.to_string()))??;

        tracing::debug!(file = %file_name, "Avatar stored");
        Ok(file_name)
    }

    async fn remove(&self, file_name: &str) -> Result<(), MediaError> {
        // only names we generated live here
        if file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(MediaError::Io(format!("refusing to remove {file_name}")));
        }

        match tokio::fs::remove_file(self.config.dir.join(file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Io(e.to_string())),
        }
    }
}
