//! # Error Types
//!
//! This module defines error types used throughout the inkpass library.
//!
//! ## Error Families
//!
//! | Family | Variants | When |
//! |--------|----------|------|
//! | Configuration | `NoResolution`, `NoInkMatch`, `PaperSize`, `Unknown*`, `InvalidCapability`, `InvalidOption` | Job setup, before any device I/O |
//! | Resource | `ResourceExhausted` | Pass buffer reservation failed |
//! | Device I/O | `Io` | Writing to the output sink failed |
//!
//! Configuration errors mean the job must not start. Resource and I/O errors
//! abort a running job; whatever pass was being buffered is discarded.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, InkpassError>;

/// Main error type for inkpass operations
#[derive(Debug, Error)]
pub enum InkpassError {
    /// No supported resolution satisfies the requested constraints
    #[error("No resolution available: {0}")]
    NoResolution(String),

    /// The requested ink type is not offered by the model
    #[error("No ink type matches '{0}'")]
    NoInkMatch(String),

    /// Paper dimensions outside the model's limits (points)
    #[error("Paper size {width}x{height}pt is outside model limits")]
    PaperSize { width: f64, height: f64 },

    /// Model id not present in the capability catalog
    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    /// Paper (media) type not offered by the model
    #[error("Unknown media type '{0}'")]
    UnknownMedia(String),

    /// Quality tier not defined for the model
    #[error("Unknown quality '{0}'")]
    UnknownQuality(String),

    /// Capability document failed validation
    #[error("Invalid capability table: {0}")]
    InvalidCapability(String),

    /// A job option is outside its allowed range
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Pass buffer allocation failed
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Preview image could not be written
    #[error("Image error: {0}")]
    Image(String),

    /// Capability or job document could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// I/O error wrapper (output sink, profile files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InkpassError {
    /// Whether this error was raised while resolving the job configuration.
    ///
    /// Configuration errors are detected before anything is handed to the
    /// protocol encoder.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoResolution(_)
                | Self::NoInkMatch(_)
                | Self::PaperSize { .. }
                | Self::UnknownModel(_)
                | Self::UnknownMedia(_)
                | Self::UnknownQuality(_)
                | Self::InvalidCapability(_)
                | Self::InvalidOption(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_family() {
        assert!(InkpassError::NoResolution("x".into()).is_configuration());
        assert!(
            InkpassError::PaperSize {
                width: 1.0,
                height: 2.0
            }
            .is_configuration()
        );
        assert!(!InkpassError::ResourceExhausted("x".into()).is_configuration());
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        assert!(!InkpassError::from(io).is_configuration());
    }

    #[test]
    fn test_display() {
        let err = InkpassError::NoInkMatch("photo7".into());
        assert_eq!(err.to_string(), "No ink type matches 'photo7'");
    }
}
