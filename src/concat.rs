//! Presentation concatenation
//!
//! Appends every slide of one or more target presentations to a source
//! presentation. Inputs may be file paths or presentations already in memory.
//! The source is mutated in place and handed back; when it was given as a path
//! the loaded presentation is returned instead.

use std::borrow::Cow;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::pptx::{copy_slide, Presentation};

/// A presentation given either by path or as an in-memory handle
#[derive(Debug)]
pub enum DocumentRef<D> {
    /// Load the presentation from this file
    Path(PathBuf),
    /// Use this presentation as-is
    Document(D),
}

/// Source argument: the presentation slides are appended to
pub type SourceRef<'a> = DocumentRef<&'a mut Presentation>;

/// Target argument: a presentation whose slides are copied
pub type TargetRef<'a> = DocumentRef<&'a Presentation>;

impl<D> From<&str> for DocumentRef<D> {
    fn from(path: &str) -> Self {
        DocumentRef::Path(PathBuf::from(path))
    }
}

impl<D> From<String> for DocumentRef<D> {
    fn from(path: String) -> Self {
        DocumentRef::Path(PathBuf::from(path))
    }
}

impl<D> From<&Path> for DocumentRef<D> {
    fn from(path: &Path) -> Self {
        DocumentRef::Path(path.to_path_buf())
    }
}

impl<D> From<PathBuf> for DocumentRef<D> {
    fn from(path: PathBuf) -> Self {
        DocumentRef::Path(path)
    }
}

impl<D> From<&PathBuf> for DocumentRef<D> {
    fn from(path: &PathBuf) -> Self {
        DocumentRef::Path(path.clone())
    }
}

impl<'a> From<&'a mut Presentation> for SourceRef<'a> {
    fn from(presentation: &'a mut Presentation) -> Self {
        DocumentRef::Document(presentation)
    }
}

impl<'a> From<&'a Presentation> for TargetRef<'a> {
    fn from(presentation: &'a Presentation) -> Self {
        DocumentRef::Document(presentation)
    }
}

/// The source presentation after concatenation
///
/// `Borrowed` is the caller's own handle, `Loaded` the presentation read from
/// the source path. Either way it derefs to the mutated [`Presentation`].
#[derive(Debug)]
pub enum PresentationHandle<'a> {
    Loaded(Presentation),
    Borrowed(&'a mut Presentation),
}

impl PresentationHandle<'_> {
    /// Take the presentation out when it was loaded from a path
    pub fn into_loaded(self) -> Option<Presentation> {
        match self {
            PresentationHandle::Loaded(presentation) => Some(presentation),
            PresentationHandle::Borrowed(_) => None,
        }
    }
}

impl Deref for PresentationHandle<'_> {
    type Target = Presentation;

    fn deref(&self) -> &Presentation {
        match self {
            PresentationHandle::Loaded(presentation) => presentation,
            PresentationHandle::Borrowed(presentation) => presentation,
        }
    }
}

impl DerefMut for PresentationHandle<'_> {
    fn deref_mut(&mut self) -> &mut Presentation {
        match self {
            PresentationHandle::Loaded(presentation) => presentation,
            PresentationHandle::Borrowed(presentation) => presentation,
        }
    }
}

fn open_source(source: SourceRef<'_>) -> Result<PresentationHandle<'_>> {
    match source {
        DocumentRef::Path(path) => Ok(PresentationHandle::Loaded(Presentation::open(&path)?)),
        DocumentRef::Document(presentation) => Ok(PresentationHandle::Borrowed(presentation)),
    }
}

fn open_target(target: TargetRef<'_>) -> Result<Cow<'_, Presentation>> {
    match target {
        DocumentRef::Path(path) => Ok(Cow::Owned(Presentation::open(&path)?)),
        DocumentRef::Document(presentation) => Ok(Cow::Borrowed(presentation)),
    }
}

/// Copy every slide of `target`, in order, to the end of `source`
fn append_slides(target: &Presentation, source: &mut Presentation) -> Result<()> {
    let count = target.slide_count();
    for index in 0..count {
        copy_slide(target, index, source)?;
    }
    debug!(copied = count, total = source.slide_count(), "appended slides");
    Ok(())
}

/// Append the slides of `target` to `source`
///
/// Each argument is a path or a presentation. If `output` is given the result
/// is saved there before returning. Errors from loading, copying or saving are
/// returned unchanged; slides copied before a failure stay in `source`.
///
/// # Example
///
/// ```no_run
/// use pptx_concat::concat;
/// use std::path::Path;
///
/// let result = concat("source.pptx", "target.pptx", Some(Path::new("output.pptx")))
///     .expect("Failed to concatenate");
/// println!("{} slides", result.slide_count());
/// ```
pub fn concat<'s, 't>(
    source: impl Into<SourceRef<'s>>,
    target: impl Into<TargetRef<'t>>,
    output: Option<&Path>,
) -> Result<PresentationHandle<'s>> {
    let mut source = open_source(source.into())?;
    let target = open_target(target.into())?;

    info!(
        source_slides = source.slide_count(),
        target_slides = target.slide_count(),
        "concatenating presentation"
    );
    append_slides(&target, &mut source)?;

    if let Some(output) = output {
        source.save(output)?;
        info!(path = %output.display(), slides = source.slide_count(), "saved result");
    }

    Ok(source)
}

/// Append the slides of every target, in order, to `source`
///
/// Targets are opened one at a time, each just before its slides are copied.
/// An empty target list leaves the slides untouched but still saves to
/// `output` when given.
///
/// # Example
///
/// ```no_run
/// use pptx_concat::{concat_multiple, Presentation, TargetRef};
/// use std::path::Path;
///
/// let appendix = Presentation::open(Path::new("appendix.pptx")).unwrap();
/// let targets = vec![TargetRef::from("target1.pptx"), TargetRef::from(&appendix)];
///
/// concat_multiple("source.pptx", targets, Some(Path::new("output.pptx")))
///     .expect("Failed to concatenate");
/// ```
pub fn concat_multiple<'s, 't, I>(
    source: impl Into<SourceRef<'s>>,
    targets: I,
    output: Option<&Path>,
) -> Result<PresentationHandle<'s>>
where
    I: IntoIterator,
    I::Item: Into<TargetRef<'t>>,
{
    let mut source = open_source(source.into())?;

    for (position, target) in targets.into_iter().enumerate() {
        let target = open_target(target.into())?;
        info!(
            target = position + 1,
            target_slides = target.slide_count(),
            "appending target"
        );
        append_slides(&target, &mut source)?;
    }

    if let Some(output) = output {
        source.save(output)?;
        info!(path = %output.display(), slides = source.slide_count(), "saved result");
    }

    Ok(source)
}

/// Concatenate two `.pptx` files into `output`
///
/// # Example
///
/// ```no_run
/// use pptx_concat::concat_pptx;
///
/// concat_pptx("source.pptx", "target.pptx", "result.pptx").expect("Failed to concatenate");
/// ```
pub fn concat_pptx(
    source: impl AsRef<Path>,
    target: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<()> {
    concat(source.as_ref(), target.as_ref(), Some(output.as_ref()))?;
    Ok(())
}
