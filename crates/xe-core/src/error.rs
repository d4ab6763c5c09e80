//! Error types for the Xenos shader translator

use thiserror::Error;

/// Main error type for operations around a translation
///
/// Problems found *inside* a shader are never reported through this type;
/// they are recorded on the shader and translation continues.
#[derive(Error, Debug)]
pub enum XenosError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid microcode: {0}")]
    InvalidMicrocode(String),

    #[error("Unknown shader type: {0}")]
    UnknownShaderType(String),
}

impl From<toml::de::Error> for XenosError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for XenosError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for translator support operations
pub type Result<T> = std::result::Result<T, XenosError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = XenosError::InvalidMicrocode("length 7 is not a multiple of 4".to_string());
        assert_eq!(
            format!("{}", err),
            "Invalid microcode: length 7 is not a multiple of 4"
        );

        let err = XenosError::UnknownShaderType("gs".to_string());
        assert_eq!(format!("{}", err), "Unknown shader type: gs");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: XenosError = io_err.into();
        assert!(matches!(err, XenosError::Io(_)));

        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: XenosError = toml_err.into();
        assert!(matches!(err, XenosError::Config(_)));
    }
}
