//! Small helpers over quick-xml shared by the part readers and writers

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::Result;

/// Look up an attribute by its exact qualified name and return the unescaped value
pub fn attr_value(element: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Read the `id` and `r:id` attributes of an id-list entry such as `<p:sldId>`
///
/// The relationship id is matched by local name on any prefixed attribute, since
/// the `r` prefix is only a convention.
pub fn id_and_rel_id(element: &BytesStart) -> Result<(Option<u32>, Option<String>)> {
    let mut id = None;
    let mut rel_id = None;

    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() != b"id" {
            continue;
        }
        let value = attr.unescape_value()?;
        if attr.key.prefix().is_some() {
            rel_id = Some(value.into_owned());
        } else {
            id = value.parse().ok();
        }
    }

    Ok((id, rel_id))
}

/// Collect the entries of an id list (`sldIdLst`, `sldMasterIdLst`, `sldLayoutIdLst`)
/// as `(id, r:id)` pairs in document order
pub fn read_id_list(xml: &[u8], list: &[u8], item: &[u8]) -> Result<Vec<(Option<u32>, String)>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut in_list = false;
    let mut entries = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == list => in_list = true,
            Event::End(e) if e.local_name().as_ref() == list => in_list = false,
            Event::Start(e) | Event::Empty(e) if in_list && e.local_name().as_ref() == item => {
                if let (id, Some(rel_id)) = id_and_rel_id(&e)? {
                    entries.push((id, rel_id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

/// Read the display name from `<p:cSld name="...">`
pub fn common_slide_name(xml: &[u8]) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"cSld" => {
                return attr_value(&e, b"name");
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Replace the text content of the first element with the given local name
///
/// Returns `None` when the element does not occur. An empty element
/// (`<Slides/>`) is expanded to hold the new text.
pub fn replace_element_text(xml: &[u8], local_name: &[u8], text: &str) -> Result<Option<Vec<u8>>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + text.len()));

    let mut replaced = false;
    let mut inside = false;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Eof => break,
            Event::Start(e) if !replaced && e.local_name().as_ref() == local_name => {
                writer.write_event(Event::Start(e.clone()))?;
                writer.write_event(Event::Text(BytesText::new(text)))?;
                inside = true;
                continue;
            }
            Event::Empty(e) if !replaced && e.local_name().as_ref() == local_name => {
                let end = e.to_end().into_owned();
                writer.write_event(Event::Start(e.clone()))?;
                writer.write_event(Event::Text(BytesText::new(text)))?;
                writer.write_event(Event::End(end))?;
                replaced = true;
                continue;
            }
            Event::End(e) if inside && e.local_name().as_ref() == local_name => {
                inside = false;
                replaced = true;
            }
            _ if inside => continue,
            _ => {}
        }
        writer.write_event(event)?;
    }

    Ok(replaced.then(|| writer.into_inner()))
}

/// Escape text for use in element content or attribute values
pub fn escape(text: &str) -> std::borrow::Cow<'_, str> {
    quick_xml::escape::escape(text)
}
