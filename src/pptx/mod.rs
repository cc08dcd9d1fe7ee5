//! PresentationML package handling

pub mod constants;
pub mod content_types;
pub mod copy;
pub mod package;
pub mod presentation;
pub mod rels;
pub mod slide;
mod template;
mod xml;

// Re-export commonly used items
pub use copy::copy_slide;
pub use package::Package;
pub use presentation::{Presentation, SlideLayout};
pub use rels::{Relationship, Relationships};
pub use slide::Slide;
