//! Read-only view of a single slide

use quick_xml::events::Event;
use quick_xml::Reader;

use super::xml::attr_value;
use crate::error::Result;

/// A slide of a presentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    /// Zero-based position in the slide list
    pub index: usize,
    /// Part name of the slide XML
    pub partname: String,
    /// Part name of the slide layout the slide is based on
    pub layout_partname: Option<String>,
    /// Text of the title placeholder, if the slide has one
    pub title: Option<String>,
    /// Text of every text-bearing shape, in document order
    pub texts: Vec<String>,
}

/// Text collected from one `<p:sp>` while scanning
#[derive(Default)]
struct ShapeText {
    is_title: bool,
    paragraphs: Vec<String>,
}

/// Extract the title and shape texts from slide XML
///
/// A shape is the title when its placeholder type is `title` or `ctrTitle`.
/// Paragraphs of a shape are joined with `\n`.
pub(crate) fn read_slide_text(xml: &[u8]) -> Result<(Option<String>, Vec<String>)> {
    let mut reader = Reader::from_reader(xml);

    let mut shapes: Vec<ShapeText> = Vec::new();
    let mut in_text = false;
    let mut title = None;
    let mut texts = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sp" => shapes.push(ShapeText::default()),
                b"p" => {
                    if let Some(shape) = shapes.last_mut() {
                        shape.paragraphs.push(String::new());
                    }
                }
                b"t" => in_text = true,
                b"ph" => mark_title(&mut shapes, &e)?,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"ph" => mark_title(&mut shapes, &e)?,
                b"p" => {
                    if let Some(shape) = shapes.last_mut() {
                        shape.paragraphs.push(String::new());
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(paragraph) = shapes.last_mut().and_then(|s| s.paragraphs.last_mut()) {
                    paragraph.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"sp" => {
                    if let Some(shape) = shapes.pop() {
                        let text = shape.paragraphs.join("\n");
                        if text.is_empty() {
                            continue;
                        }
                        if shape.is_title && title.is_none() {
                            title = Some(text.clone());
                        }
                        texts.push(text);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((title, texts))
}

fn mark_title(shapes: &mut [ShapeText], ph: &quick_xml::events::BytesStart) -> Result<()> {
    let kind = attr_value(ph, b"type")?;
    if matches!(kind.as_deref(), Some("title") | Some("ctrTitle")) {
        if let Some(shape) = shapes.last_mut() {
            shape.is_title = true;
        }
    }
    Ok(())
}
