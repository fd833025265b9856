//! Crate-wide error type.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while setting up or driving a sketch.
///
/// Malformed polygons are deliberately absent: triangulation never fails, it
/// just yields fewer (or no) triangles.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The seed string is not 64 hexadecimal characters.
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    /// The configuration document could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The graphics context cannot render into a floating-point target.
    #[error("missing graphics capability: {0}")]
    MissingCapability(String),

    /// A shader failed to compile or link.
    #[error("shader error: {0}")]
    Shader(String),

    /// A GL object could not be created.
    #[error("GL error: {0}")]
    Gl(String),

    /// Encoding or writing a snapshot failed.
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Build an [`Error::InvalidSeed`].
    pub fn invalid_seed(msg: impl Into<String>) -> Self {
        Self::InvalidSeed(msg.into())
    }

    /// Build an [`Error::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build an [`Error::MissingCapability`].
    pub fn missing_capability(msg: impl Into<String>) -> Self {
        Self::MissingCapability(msg.into())
    }

    /// Build an [`Error::Shader`].
    pub fn shader(msg: impl Into<String>) -> Self {
        Self::Shader(msg.into())
    }

    /// Build an [`Error::Gl`].
    pub fn gl(msg: impl Into<String>) -> Self {
        Self::Gl(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(Error::invalid_seed("x").to_string().contains("invalid seed:"));
        assert!(Error::config("x").to_string().contains("configuration error:"));
        assert!(Error::missing_capability("x")
            .to_string()
            .contains("missing graphics capability:"));
        assert!(Error::shader("x").to_string().contains("shader error:"));
        assert!(Error::gl("x").to_string().contains("GL error:"));
    }

    #[test]
    fn image_error_is_transparent() {
        let io = std::io::Error::other("disk full");
        let err = Error::from(image::ImageError::IoError(io));
        assert!(err.to_string().contains("disk full"));
    }
}
