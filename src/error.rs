//! Error types for the pptx-concat library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pptx-concat library
#[derive(Error, Debug)]
pub enum Error {
    /// Zip container error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing or writing error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed XML attribute
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A part referenced by the package is absent
    #[error("Part not found in package: {0}")]
    MissingPart(String),

    /// The package is not a usable presentation
    #[error("Invalid presentation package: {0}")]
    InvalidPackage(String),

    /// Slide index past the end of the slide list
    #[error("Slide index {index} out of range (presentation has {count} slides)")]
    SlideIndexOutOfRange { index: usize, count: usize },

    /// General error
    #[error("{0}")]
    General(String),
}
