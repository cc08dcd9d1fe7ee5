//! Package relationships (`.rels` parts) and part-name resolution

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::constants::namespace;
use super::xml::attr_value;
use crate::error::{Error, Result};

/// A single relationship from a source part to a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship id, e.g. `rId3`
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target reference, relative to the source part unless external
    pub target: String,
    /// Whether the target lives outside the package (`TargetMode="External"`)
    pub external: bool,
}

/// The relationships of one source part, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut rels = Vec::new();
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                    let id = attr_value(&e, b"Id")?
                        .ok_or_else(|| Error::InvalidPackage("relationship without Id".to_string()))?;
                    let rel_type = attr_value(&e, b"Type")?.unwrap_or_default();
                    let target = attr_value(&e, b"Target")?.unwrap_or_default();
                    let external = attr_value(&e, b"TargetMode")?.as_deref() == Some("External");
                    rels.push(Relationship { id, rel_type, target, external });
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self { rels })
    }

    /// Serialize back to a `.rels` part
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut root = BytesStart::new("Relationships");
        root.push_attribute(("xmlns", namespace::RELATIONSHIPS));
        writer.write_event(Event::Start(root))?;

        for rel in &self.rels {
            let mut element = BytesStart::new("Relationship");
            element.push_attribute(("Id", rel.id.as_str()));
            element.push_attribute(("Type", rel.rel_type.as_str()));
            element.push_attribute(("Target", rel.target.as_str()));
            if rel.external {
                element.push_attribute(("TargetMode", "External"));
            }
            writer.write_event(Event::Empty(element))?;
        }

        writer.write_event(Event::End(BytesEnd::new("Relationships")))?;
        Ok(writer.into_inner())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    pub fn len(&self) -> usize {
        self.rels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.id == id)
    }

    /// First relationship of the given type
    pub fn first_of_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.rel_type == rel_type)
    }

    /// Next unused id of the form `rIdN`
    pub fn next_id(&self) -> String {
        let max = self
            .rels
            .iter()
            .filter_map(|rel| rel.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }

    /// Add an internal relationship under a fresh id and return the id
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let id = self.next_id();
        self.rels.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        });
        id
    }

    /// Add a relationship keeping its id
    pub fn push(&mut self, rel: Relationship) {
        self.rels.push(rel);
    }
}

/// Part name of the relationships part belonging to `partname`
///
/// `/ppt/slides/slide1.xml` maps to `/ppt/slides/_rels/slide1.xml.rels`, and the
/// package itself (`/`) to `/_rels/.rels`.
pub fn rels_partname(partname: &str) -> String {
    let (dir, file) = split_partname(partname);
    if dir == "/" {
        format!("/_rels/{}.rels", file)
    } else {
        format!("{}/_rels/{}.rels", dir, file)
    }
}

/// Resolve a relationship target against the part that owns the relationship
pub fn resolve_target(source_partname: &str, target: &str) -> String {
    // Fragments and queries do not name parts
    let target = target.split(['#', '?']).next().unwrap_or_default();

    let mut segments: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        dir_segments(source_partname)
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Relative reference from `source_partname` to `target_partname`, the inverse of
/// [`resolve_target`]
pub fn relative_target(source_partname: &str, target_partname: &str) -> String {
    let base = dir_segments(source_partname);
    let target: Vec<&str> = target_partname.split('/').filter(|s| !s.is_empty()).collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count()
        // never consume the file name itself
        .min(target.len().saturating_sub(1));

    let mut parts: Vec<&str> = std::iter::repeat("..").take(base.len() - common).collect();
    parts.extend(&target[common..]);
    parts.join("/")
}

/// Split a part name into directory and file name
pub fn split_partname(partname: &str) -> (&str, &str) {
    match partname.rfind('/') {
        Some(0) => ("/", &partname[1..]),
        Some(pos) => (&partname[..pos], &partname[pos + 1..]),
        None => ("/", partname),
    }
}

fn dir_segments(partname: &str) -> Vec<&str> {
    let (dir, _) = split_partname(partname);
    dir.split('/').filter(|s| !s.is_empty()).collect()
}
