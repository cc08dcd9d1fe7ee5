//! The presentation document handle

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

use super::constants::{content_type, rel_type, MAX_SLIDE_ID, MIN_SLIDE_ID, PACKAGE_URI};
use super::package::Package;
use super::rels::{relative_target, resolve_target};
use super::slide::{read_slide_text, Slide};
use super::xml::{common_slide_name, read_id_list, replace_element_text};
use crate::error::{Error, Result};

/// Entry of the presentation's slide list (`<p:sldId>`)
#[derive(Debug, Clone, PartialEq, Eq)]
struct SlideEntry {
    id: u32,
    rel_id: String,
    partname: String,
}

/// A slide layout available to new slides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideLayout {
    /// Part name of the layout XML
    pub partname: String,
    /// Display name from `<p:cSld name="...">`
    pub name: Option<String>,
}

/// An in-memory presentation
///
/// Holds the whole package plus the ordered slide list read from
/// `<p:sldIdLst>`. All mutation goes through `&mut self`, so a handle cannot be
/// appended to from two places at once.
#[derive(Debug, Clone)]
pub struct Presentation {
    package: Package,
    main_part: String,
    slides: Vec<SlideEntry>,
}

impl Presentation {
    /// Load a presentation from a `.pptx` file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pptx_concat::Presentation;
    /// use std::path::Path;
    ///
    /// let deck = Presentation::open(Path::new("deck.pptx")).expect("Failed to open");
    /// println!("{} slides", deck.slide_count());
    /// ```
    pub fn open(path: &Path) -> Result<Self> {
        let package = Package::open(path)?;
        Self::from_package(package)
    }

    /// Load a presentation from the bytes of a `.pptx` file
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let package = Package::from_reader(Cursor::new(bytes))?;
        Self::from_package(package)
    }

    /// Wrap a package, locating its main presentation part and slide list
    pub fn from_package(package: Package) -> Result<Self> {
        let package_rels = package.relationships(PACKAGE_URI)?;
        let main_rel = package_rels
            .first_of_type(rel_type::OFFICE_DOCUMENT)
            .ok_or_else(|| Error::InvalidPackage("no officeDocument relationship".to_string()))?;
        let main_part = resolve_target(PACKAGE_URI, &main_rel.target);

        match package.content_types().content_type(&main_part) {
            Some(ct) if content_type::PRESENTATION_MAIN_TYPES.contains(&ct) => {}
            Some(ct) => {
                return Err(Error::InvalidPackage(format!(
                    "{} is not a presentation (content type {})",
                    main_part, ct
                )));
            }
            None => {
                return Err(Error::InvalidPackage(format!("{} has no content type", main_part)));
            }
        }

        let slides = read_slide_entries(&package, &main_part)?;
        debug!(main_part = %main_part, slides = slides.len(), "loaded presentation");

        Ok(Self { package, main_part, slides })
    }

    /// Save the presentation to a `.pptx` file
    ///
    /// The extended-properties slide count and the core-properties modified
    /// timestamp are refreshed in the written file. The handle itself is not
    /// changed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        debug!(path = %path.display(), slides = self.slide_count(), "saved presentation");
        Ok(())
    }

    /// Serialize the presentation to `.pptx` bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let replacements = self.refreshed_doc_props()?;
        let cursor = self.package.write_with(Cursor::new(Vec::new()), &replacements)?;
        Ok(cursor.into_inner())
    }

    /// Number of slides
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// All slides in presentation order
    pub fn slides(&self) -> Result<Vec<Slide>> {
        (0..self.slides.len()).map(|i| self.slide(i)).collect()
    }

    /// The slide at a zero-based index
    pub fn slide(&self, index: usize) -> Result<Slide> {
        let entry = self.slides.get(index).ok_or(Error::SlideIndexOutOfRange {
            index,
            count: self.slides.len(),
        })?;

        let xml = self.package.part(&entry.partname)?;
        let (title, texts) = read_slide_text(xml)?;

        let rels = self.package.relationships(&entry.partname)?;
        let layout_partname = rels
            .first_of_type(rel_type::SLIDE_LAYOUT)
            .map(|rel| resolve_target(&entry.partname, &rel.target));

        Ok(Slide {
            index,
            partname: entry.partname.clone(),
            layout_partname,
            title,
            texts,
        })
    }

    /// Part name of the slide at `index`
    pub fn slide_partname(&self, index: usize) -> Result<&str> {
        self.slides
            .get(index)
            .map(|entry| entry.partname.as_str())
            .ok_or(Error::SlideIndexOutOfRange {
                index,
                count: self.slides.len(),
            })
    }

    /// Slide layouts, masters in `sldMasterIdLst` order and each master's
    /// layouts in `sldLayoutIdLst` order
    pub fn slide_layouts(&self) -> Result<Vec<SlideLayout>> {
        let main_xml = self.package.part(&self.main_part)?;
        let main_rels = self.package.relationships(&self.main_part)?;

        let mut layouts = Vec::new();
        for (_, master_rel_id) in read_id_list(main_xml, b"sldMasterIdLst", b"sldMasterId")? {
            let Some(master_rel) = main_rels.get(&master_rel_id) else {
                continue;
            };
            let master = resolve_target(&self.main_part, &master_rel.target);
            let master_xml = self.package.part(&master)?;
            let master_rels = self.package.relationships(&master)?;

            for (_, layout_rel_id) in read_id_list(master_xml, b"sldLayoutIdLst", b"sldLayoutId")? {
                let Some(layout_rel) = master_rels.get(&layout_rel_id) else {
                    continue;
                };
                let partname = resolve_target(&master, &layout_rel.target);
                let name = common_slide_name(self.package.part(&partname)?)?;
                layouts.push(SlideLayout { partname, name });
            }
        }

        Ok(layouts)
    }

    /// Part name of the main presentation part
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    /// Register an already-written slide part as the new last slide
    ///
    /// Adds the presentation relationship and the `<p:sldId>` entry. The slide
    /// part, its relationships and its content type must already be in the package.
    pub(crate) fn append_slide_part(&mut self, slide_partname: &str) -> Result<()> {
        let id = self.next_slide_id()?;
        let mut rels = self.package.relationships(&self.main_part)?;
        let rel_id = rels.add(rel_type::SLIDE, &relative_target(&self.main_part, slide_partname));
        self.package.set_relationships(&self.main_part, &rels)?;

        let xml = self.package.part(&self.main_part)?;
        let updated = append_slide_id(xml, id, &rel_id)?;
        self.package.set_part(&self.main_part, updated);

        self.slides.push(SlideEntry {
            id,
            rel_id,
            partname: slide_partname.to_string(),
        });
        Ok(())
    }

    /// One above the largest slide id in use, or the smallest free id once
    /// that would leave the valid range
    fn next_slide_id(&self) -> Result<u32> {
        let max = self
            .slides
            .iter()
            .map(|entry| entry.id)
            .max()
            .unwrap_or(MIN_SLIDE_ID)
            .max(MIN_SLIDE_ID);
        if max < MAX_SLIDE_ID {
            return Ok(max + 1);
        }

        (MIN_SLIDE_ID + 1..=MAX_SLIDE_ID)
            .find(|id| !self.slides.iter().any(|entry| entry.id == *id))
            .ok_or_else(|| Error::InvalidPackage("no free slide id left".to_string()))
    }

    /// Replacement bytes for docProps parts whose content depends on save time
    fn refreshed_doc_props(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut replacements = BTreeMap::new();
        let package_rels = self.package.relationships(PACKAGE_URI)?;

        if let Some(rel) = package_rels.first_of_type(rel_type::EXTENDED_PROPERTIES) {
            let partname = resolve_target(PACKAGE_URI, &rel.target);
            if let Some(xml) = self.package.get_part(&partname) {
                let count = self.slide_count().to_string();
                if let Some(updated) = replace_element_text(xml, b"Slides", &count)? {
                    replacements.insert(partname, updated);
                }
            }
        }

        if let Some(rel) = package_rels.first_of_type(rel_type::CORE_PROPERTIES) {
            let partname = resolve_target(PACKAGE_URI, &rel.target);
            if let Some(xml) = self.package.get_part(&partname) {
                let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
                if let Some(updated) = replace_element_text(xml, b"modified", &now)? {
                    replacements.insert(partname, updated);
                }
            }
        }

        Ok(replacements)
    }

    pub(crate) fn from_parts(package: Package, main_part: String) -> Result<Self> {
        let slides = read_slide_entries(&package, &main_part)?;
        Ok(Self { package, main_part, slides })
    }
}

/// Read `<p:sldIdLst>` and resolve each entry to its slide part
fn read_slide_entries(package: &Package, main_part: &str) -> Result<Vec<SlideEntry>> {
    let xml = package.part(main_part)?;
    let rels = package.relationships(main_part)?;

    read_id_list(xml, b"sldIdLst", b"sldId")?
        .into_iter()
        .map(|(id, rel_id)| {
            let rel = rels.get(&rel_id).ok_or_else(|| {
                Error::InvalidPackage(format!("slide list refers to unknown relationship {}", rel_id))
            })?;
            let partname = resolve_target(main_part, &rel.target);
            if !package.contains(&partname) {
                return Err(Error::MissingPart(partname));
            }
            Ok(SlideEntry {
                id: id.unwrap_or(MIN_SLIDE_ID),
                rel_id,
                partname,
            })
        })
        .collect()
}

/// Children of `<p:presentation>` that precede `<p:sldIdLst>`
const BEFORE_SLIDE_LIST: [&[u8]; 3] = [b"sldMasterIdLst", b"notesMasterIdLst", b"handoutMasterIdLst"];

/// Append `<p:sldId id=.. r:id=..>` to the slide list of presentation XML
///
/// When the presentation has no slide list yet, one is created in schema
/// position: after the master id lists, before everything else.
fn append_slide_id(xml: &[u8], id: u32, rel_id: &str) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 64));

    let mut depth = 0usize;
    let mut prefix = String::new();
    let mut done = false;
    let id = id.to_string();

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Eof => break,
            Event::Start(e) => {
                depth += 1;
                if depth == 1 {
                    prefix = element_prefix(e);
                } else if depth == 2 && !done {
                    let name = e.local_name();
                    if name.as_ref() == b"sldIdLst" {
                        // entry is written when the list closes
                    } else if !BEFORE_SLIDE_LIST.contains(&name.as_ref()) {
                        write_slide_list(&mut writer, &prefix, &id, rel_id)?;
                        done = true;
                    }
                }
            }
            Event::Empty(e) if depth == 1 && !done => {
                let name = e.local_name();
                if name.as_ref() == b"sldIdLst" {
                    write_slide_list(&mut writer, &prefix, &id, rel_id)?;
                    done = true;
                    continue;
                }
                if !BEFORE_SLIDE_LIST.contains(&name.as_ref()) {
                    write_slide_list(&mut writer, &prefix, &id, rel_id)?;
                    done = true;
                }
            }
            Event::End(e) => {
                if !done && depth == 2 && e.local_name().as_ref() == b"sldIdLst" {
                    writer.write_event(Event::Empty(slide_id_element(&prefix, &id, rel_id)))?;
                    done = true;
                } else if !done && depth == 1 {
                    write_slide_list(&mut writer, &prefix, &id, rel_id)?;
                    done = true;
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
        writer.write_event(event)?;
    }

    if !done {
        return Err(Error::InvalidPackage("presentation part has no root element".to_string()));
    }

    Ok(writer.into_inner())
}

fn element_prefix(element: &BytesStart) -> String {
    element
        .name()
        .prefix()
        .map(|p| format!("{}:", String::from_utf8_lossy(p.as_ref())))
        .unwrap_or_default()
}

fn slide_id_element(prefix: &str, id: &str, rel_id: &str) -> BytesStart<'static> {
    let mut element = BytesStart::new(format!("{}sldId", prefix));
    element.push_attribute(("id", id));
    element.push_attribute(("r:id", rel_id));
    element
}

fn write_slide_list(writer: &mut Writer<Vec<u8>>, prefix: &str, id: &str, rel_id: &str) -> Result<()> {
    let list = format!("{}sldIdLst", prefix);
    writer.write_event(Event::Start(BytesStart::new(list.as_str())))?;
    writer.write_event(Event::Empty(slide_id_element(prefix, id, rel_id)))?;
    writer.write_event(Event::End(BytesEnd::new(list.as_str())))?;
    Ok(())
}
