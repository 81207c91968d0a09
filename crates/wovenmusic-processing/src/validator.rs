use std::path::Path;

/// Common validation errors for uploaded files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

/// Upload validator
///
/// Checks size and extension for one upload family (audio or cover images)
/// without coupling to storage implementation details. Extension routing for
/// the transcode decision is a separate concern handled by the ingest
/// pipeline; this only answers "is the upload acceptable at all".
pub struct MediaValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
}

impl MediaValidator {
    pub fn new(max_file_size: usize, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
        }
    }

    /// Validator for audio uploads: direct-store and transcode formats are
    /// both acceptable here; routing between them happens later.
    pub fn for_audio(max_file_size: usize) -> Self {
        Self::new(
            max_file_size,
            wovenmusic_core::constants::DIRECT_AUDIO_EXTENSIONS
                .iter()
                .chain(wovenmusic_core::constants::TRANSCODE_AUDIO_EXTENSIONS)
                .map(|s| s.to_string())
                .collect(),
        )
    }

    /// Validator for cover image uploads.
    pub fn for_images(max_file_size: usize) -> Self {
        Self::new(
            max_file_size,
            ["jpg", "jpeg", "png", "gif", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate file extension and return it lowercased
    pub fn validate_extension(&self, filename: &str) -> Result<String, ValidationError> {
        let extension = extension_of(filename)
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(extension)
    }

    /// Validate size and extension in one call, returning the extension.
    pub fn validate(&self, filename: &str, file_size: usize) -> Result<String, ValidationError> {
        self.validate_file_size(file_size)?;
        self.validate_extension(filename)
    }
}

/// Lowercased extension of a filename, if it has one.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
