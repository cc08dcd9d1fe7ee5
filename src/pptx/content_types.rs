//! The `[Content_Types].xml` stream

use std::collections::BTreeMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::constants::namespace;
use super::xml::attr_value;
use crate::error::Result;

/// Content types of a package: per-extension defaults plus per-part overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// Lowercase extension to content type
    defaults: BTreeMap<String, String>,
    /// Part name to content type
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut types = Self::new();
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"Default" => {
                        if let (Some(ext), Some(ct)) =
                            (attr_value(&e, b"Extension")?, attr_value(&e, b"ContentType")?)
                        {
                            types.defaults.insert(ext.to_ascii_lowercase(), ct);
                        }
                    }
                    b"Override" => {
                        if let (Some(part), Some(ct)) =
                            (attr_value(&e, b"PartName")?, attr_value(&e, b"ContentType")?)
                        {
                            types.overrides.insert(part, ct);
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(types)
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut root = BytesStart::new("Types");
        root.push_attribute(("xmlns", namespace::CONTENT_TYPES));
        writer.write_event(Event::Start(root))?;

        for (ext, ct) in &self.defaults {
            let mut element = BytesStart::new("Default");
            element.push_attribute(("Extension", ext.as_str()));
            element.push_attribute(("ContentType", ct.as_str()));
            writer.write_event(Event::Empty(element))?;
        }
        for (part, ct) in &self.overrides {
            let mut element = BytesStart::new("Override");
            element.push_attribute(("PartName", part.as_str()));
            element.push_attribute(("ContentType", ct.as_str()));
            writer.write_event(Event::Empty(element))?;
        }

        writer.write_event(Event::End(BytesEnd::new("Types")))?;
        Ok(writer.into_inner())
    }

    /// Content type of a part: its override if present, else its extension default
    pub fn content_type(&self, partname: &str) -> Option<&str> {
        if let Some(ct) = self.overrides.get(partname) {
            return Some(ct.as_str());
        }
        // Part names compare case-insensitively
        if let Some((_, ct)) = self
            .overrides
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(partname))
        {
            return Some(ct.as_str());
        }
        self.default_for(extension(partname)?)
    }

    pub fn override_for(&self, partname: &str) -> Option<&str> {
        self.overrides.get(partname).map(String::as_str)
    }

    pub fn default_for(&self, ext: &str) -> Option<&str> {
        self.defaults.get(&ext.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn add_override(&mut self, partname: &str, content_type: &str) {
        self.overrides.insert(partname.to_string(), content_type.to_string());
    }

    /// Register an extension default unless one already exists
    pub fn ensure_default(&mut self, ext: &str, content_type: &str) {
        self.defaults
            .entry(ext.to_ascii_lowercase())
            .or_insert_with(|| content_type.to_string());
    }
}

/// Extension of a part name, without the dot
pub fn extension(partname: &str) -> Option<&str> {
    let file = partname.rsplit('/').next()?;
    file.rsplit_once('.').map(|(_, ext)| ext).filter(|ext| !ext.is_empty())
}
