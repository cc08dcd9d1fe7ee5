//! PPTX Concatenator Library
//!
//! A cross-platform library for concatenating PowerPoint presentations.
//! This library provides functionality to:
//! - Append all slides of one or more presentations to a source presentation
//! - Accept file paths or already-loaded presentations interchangeably
//! - Copy single slides between presentations, with their images and media
//! - Read slide counts, titles and text
//! - Create blank presentations and add simple slides
//!
//! # Example
//!
//! ```no_run
//! use pptx_concat::concat_multiple;
//! use std::path::Path;
//!
//! let result = concat_multiple(
//!     "source.pptx",
//!     ["target1.pptx", "target2.pptx"],
//!     Some(Path::new("output.pptx")),
//! )
//! .expect("Failed to concatenate presentations");
//!
//! println!("{} slides", result.slide_count());
//! ```

pub mod concat;
pub mod error;
pub mod pptx;

// Re-export commonly used items
pub use concat::{
    concat, concat_multiple, concat_pptx, DocumentRef, PresentationHandle, SourceRef, TargetRef,
};
pub use error::{Error, Result};
pub use pptx::{copy_slide, Presentation, Slide};
