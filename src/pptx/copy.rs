//! Copying slides between presentations
//!
//! A slide is copied as its XML plus the parts it relates to. Relationship ids
//! are kept, so the slide XML itself is never rewritten; only the targets of
//! its relationships are mapped into the destination package.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::constants::{content_type, rel_type};
use super::content_types::extension;
use super::presentation::{Presentation, SlideLayout};
use super::rels::{relative_target, resolve_target, split_partname, Relationship, Relationships};
use super::xml::common_slide_name;
use crate::error::{Error, Result};

/// Directory whose parts are shared between slides when byte-identical
const MEDIA_DIR: &str = "/ppt/media";

/// Copy the slide at `slide_index` of `target` to the end of `source`
///
/// # Example
///
/// ```no_run
/// use pptx_concat::{copy_slide, Presentation};
/// use std::path::Path;
///
/// let mut deck = Presentation::open(Path::new("deck.pptx")).unwrap();
/// let extra = Presentation::open(Path::new("extra.pptx")).unwrap();
/// copy_slide(&extra, 0, &mut deck).unwrap();
/// ```
pub fn copy_slide(target: &Presentation, slide_index: usize, source: &mut Presentation) -> Result<()> {
    let slide_part = target.slide_partname(slide_index)?.to_string();
    let slide_xml = target.package().part(&slide_part)?.to_vec();
    let slide_rels = target.package().relationships(&slide_part)?;

    let new_part = source.package().next_partname("/ppt/slides", "slide", "xml");
    debug!(from = %slide_part, to = %new_part, "copying slide");

    let new_rels = {
        let mut importer = PartImporter::new(target, source);
        let mut new_rels = Relationships::new();

        for rel in slide_rels.iter() {
            if rel.external {
                new_rels.push(rel.clone());
                continue;
            }

            let target_part = resolve_target(&slide_part, &rel.target);
            let mapped = match rel.rel_type.as_str() {
                rel_type::SLIDE_LAYOUT => importer.matching_layout(&target_part)?,
                rel_type::NOTES_SLIDE | rel_type::COMMENTS => {
                    debug!(rel = %rel.id, "dropping slide-private relationship");
                    continue;
                }
                // Links between slides point back at the copy itself
                rel_type::SLIDE => new_part.clone(),
                _ => importer.import(&target_part)?,
            };

            new_rels.push(Relationship {
                target: relative_target(&new_part, &mapped),
                ..rel.clone()
            });
        }
        new_rels
    };

    let package = source.package_mut();
    package.set_part(&new_part, slide_xml);
    package.set_relationships(&new_part, &new_rels)?;
    package.content_types_mut().add_override(&new_part, content_type::SLIDE);

    source.append_slide_part(&new_part)
}

/// Imports parts from one package into another, once per part
struct PartImporter<'a> {
    from: &'a Presentation,
    into: &'a mut Presentation,
    /// Part name in `from` to part name in `into`
    imported: HashMap<String, String>,
    layouts: Option<Vec<SlideLayout>>,
}

impl<'a> PartImporter<'a> {
    fn new(from: &'a Presentation, into: &'a mut Presentation) -> Self {
        Self {
            from,
            into,
            imported: HashMap::new(),
            layouts: None,
        }
    }

    /// The destination layout standing in for `layout_part` of the origin
    ///
    /// Layouts are matched by display name; without a match the first
    /// destination layout is used.
    fn matching_layout(&mut self, layout_part: &str) -> Result<String> {
        let name = match self.from.package().get_part(layout_part) {
            Some(xml) => common_slide_name(xml)?,
            None => None,
        };

        if self.layouts.is_none() {
            self.layouts = Some(self.into.slide_layouts()?);
        }
        let layouts = self.layouts.as_deref().unwrap_or_default();

        if let Some(layout) = layouts.iter().find(|l| name.is_some() && l.name == name) {
            return Ok(layout.partname.clone());
        }

        let fallback = layouts
            .first()
            .ok_or_else(|| Error::InvalidPackage("presentation has no slide layouts".to_string()))?;
        warn!(
            layout = name.as_deref().unwrap_or("<unnamed>"),
            fallback = fallback.name.as_deref().unwrap_or("<unnamed>"),
            "no layout with a matching name, using the first layout"
        );
        Ok(fallback.partname.clone())
    }

    /// Copy `partname` and everything it relates to; returns the new part name
    fn import(&mut self, partname: &str) -> Result<String> {
        if let Some(done) = self.imported.get(partname) {
            return Ok(done.clone());
        }

        let data = self.from.package().part(partname)?.to_vec();
        let (dir, _) = split_partname(partname);

        if dir == MEDIA_DIR {
            if let Some(existing) = self.into.package().find_identical(MEDIA_DIR, &data) {
                let existing = existing.to_string();
                debug!(from = %partname, to = %existing, "reusing identical media");
                self.imported.insert(partname.to_string(), existing.clone());
                return Ok(existing);
            }
        }

        let new_part = self.fresh_partname(partname);
        self.imported.insert(partname.to_string(), new_part.clone());
        // Reserve the name so parts imported below cannot claim it
        self.into.package_mut().set_part(&new_part, Vec::new());
        debug!(from = %partname, to = %new_part, "importing part");

        self.copy_content_type(partname, &new_part);

        let rels = self.from.package().relationships(partname)?;
        let mut new_rels = Relationships::new();
        for rel in rels.iter() {
            if rel.external {
                new_rels.push(rel.clone());
                continue;
            }
            // Parts hanging off a slide never own slides, layouts or masters
            if is_presentation_structure(&rel.rel_type) {
                debug!(part = %partname, rel = %rel.id, "dropping structure relationship");
                continue;
            }
            let mapped = self.import(&resolve_target(partname, &rel.target))?;
            new_rels.push(Relationship {
                target: relative_target(&new_part, &mapped),
                ..rel.clone()
            });
        }

        let package = self.into.package_mut();
        package.set_part(&new_part, data);
        if !new_rels.is_empty() {
            package.set_relationships(&new_part, &new_rels)?;
        }

        Ok(new_part)
    }

    /// A free part name in the same directory, numbered after the original stem
    fn fresh_partname(&self, partname: &str) -> String {
        let (dir, file) = split_partname(partname);
        let (stem, ext) = match file.rsplit_once('.') {
            Some((stem, ext)) => (stem, ext),
            None => (file, ""),
        };
        let stem = stem.trim_end_matches(|c: char| c.is_ascii_digit());

        self.into.package().next_partname(dir, stem, ext)
    }

    fn copy_content_type(&mut self, partname: &str, new_part: &str) {
        let from_types = self.from.package().content_types();
        let into_types = self.into.package_mut().content_types_mut();

        if let Some(ct) = from_types.override_for(partname) {
            into_types.add_override(new_part, ct);
        } else if let Some(ext) = extension(partname) {
            if let Some(ct) = from_types.default_for(ext) {
                into_types.ensure_default(ext, ct);
                // An existing default for the extension may disagree
                if into_types.default_for(ext) != Some(ct) {
                    into_types.add_override(new_part, ct);
                }
            }
        }
    }
}

fn is_presentation_structure(rel: &str) -> bool {
    matches!(
        rel,
        rel_type::SLIDE | rel_type::SLIDE_LAYOUT | rel_type::SLIDE_MASTER | rel_type::NOTES_SLIDE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL: &[u8] = b"\x89PNG\r\n\x1a\n-not-really-an-image";

    /// A deck whose first slide has an image and an external hyperlink
    fn deck_with_picture() -> Presentation {
        let mut deck = Presentation::new().unwrap();
        deck.add_slide(0, "Picture", None).unwrap();

        let slide = deck.slide_partname(0).unwrap().to_string();
        let mut rels = deck.package().relationships(&slide).unwrap();
        rels.add(rel_type::IMAGE, "../media/image1.png");
        rels.push(Relationship {
            id: "rId9".to_string(),
            rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink".to_string(),
            target: "https://example.com".to_string(),
            external: true,
        });

        let package = deck.package_mut();
        package.set_relationships(&slide, &rels).unwrap();
        package.set_part("/ppt/media/image1.png", PIXEL.to_vec());
        package.content_types_mut().ensure_default("png", content_type::PNG);
        deck
    }

    const CHART: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
    const PACKAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/package";
    const CHART_CT: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";
    const XLSX_CT: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

    /// Add a relationship from the first slide of `deck` and return its id
    fn link_from_first_slide(deck: &mut Presentation, rel: &str, target: &str) -> String {
        let slide = deck.slide_partname(0).unwrap().to_string();
        let mut rels = deck.package().relationships(&slide).unwrap();
        let id = rels.add(rel, target);
        deck.package_mut().set_relationships(&slide, &rels).unwrap();
        id
    }

    /// The part a relationship of the copied slide at `index` points at
    fn linked_part(deck: &Presentation, index: usize, rel_id: &str) -> String {
        let slide = deck.slide_partname(index).unwrap().to_string();
        let rels = deck.package().relationships(&slide).unwrap();
        resolve_target(&slide, &rels.get(rel_id).unwrap().target)
    }

    #[test]
    fn test_nested_parts_with_the_same_stem_get_distinct_names() {
        let mut target = Presentation::new().unwrap();
        target.add_slide(0, "Custom", None).unwrap();
        let link = link_from_first_slide(&mut target, CHART, "../custom/part1.xml");
        let package = target.package_mut();
        package.set_part("/ppt/custom/part1.xml", b"<parent/>".to_vec());
        package.set_part("/ppt/custom/part2.xml", b"<child/>".to_vec());
        let mut child_rels = Relationships::new();
        let child_link = child_rels.add(CHART, "part2.xml");
        package.set_relationships("/ppt/custom/part1.xml", &child_rels).unwrap();
        package.content_types_mut().add_override("/ppt/custom/part1.xml", CHART_CT);
        package.content_types_mut().add_override("/ppt/custom/part2.xml", CHART_CT);

        let mut source = Presentation::new().unwrap();
        copy_slide(&target, 0, &mut source).unwrap();

        let parent = linked_part(&source, 0, &link);
        let parent_rels = source.package().relationships(&parent).unwrap();
        let child = resolve_target(&parent, &parent_rels.get(&child_link).unwrap().target);

        assert_ne!(parent, child);
        assert_eq!(source.package().part(&parent).unwrap(), b"<parent/>");
        assert_eq!(source.package().part(&child).unwrap(), b"<child/>");
        assert_eq!(source.package().content_types().override_for(&child), Some(CHART_CT));
    }

    #[test]
    fn test_part_with_own_relationships_is_imported_recursively() {
        let mut target = Presentation::new().unwrap();
        target.add_slide(0, "Chart", None).unwrap();
        let link = link_from_first_slide(&mut target, CHART, "../charts/chart1.xml");
        let package = target.package_mut();
        package.set_part("/ppt/charts/chart1.xml", b"<c:chartSpace/>".to_vec());
        package.set_part("/ppt/embeddings/data1.xlsx", b"workbook".to_vec());
        let mut chart_rels = Relationships::new();
        let data_link = chart_rels.add(PACKAGE, "../embeddings/data1.xlsx");
        chart_rels.add(rel_type::SLIDE, "../slides/slide1.xml");
        package.set_relationships("/ppt/charts/chart1.xml", &chart_rels).unwrap();
        package.content_types_mut().add_override("/ppt/charts/chart1.xml", CHART_CT);
        package.content_types_mut().ensure_default("xlsx", XLSX_CT);

        let mut source = Presentation::new().unwrap();
        copy_slide(&target, 0, &mut source).unwrap();

        let chart = linked_part(&source, 0, &link);
        assert_eq!(chart, "/ppt/charts/chart1.xml");
        assert_eq!(source.package().content_types().override_for(&chart), Some(CHART_CT));

        let rels = source.package().relationships(&chart).unwrap();
        assert_eq!(rels.len(), 1, "slide relationship of the chart is dropped");
        assert!(rels.first_of_type(rel_type::SLIDE).is_none());

        let data = resolve_target(&chart, &rels.get(&data_link).unwrap().target);
        assert_eq!(source.package().part(&data).unwrap(), b"workbook");
        assert_eq!(source.package().content_types().default_for("xlsx"), Some(XLSX_CT));
    }

    #[test]
    fn test_disagreeing_extension_default_adds_override() {
        let target = deck_with_picture();
        let mut source = Presentation::new().unwrap();
        source.package_mut().content_types_mut().ensure_default("png", "image/x-png");

        copy_slide(&target, 0, &mut source).unwrap();

        let slide = source.slide_partname(0).unwrap().to_string();
        let rels = source.package().relationships(&slide).unwrap();
        let image = resolve_target(&slide, &rels.first_of_type(rel_type::IMAGE).unwrap().target);

        let types = source.package().content_types();
        assert_eq!(types.default_for("png"), Some("image/x-png"));
        assert_eq!(types.override_for(&image), Some(content_type::PNG));
        assert_eq!(types.content_type(&image), Some(content_type::PNG));
    }

    #[test]
    fn test_agreeing_extension_default_adds_no_override() {
        let target = deck_with_picture();
        let mut source = Presentation::new().unwrap();

        copy_slide(&target, 0, &mut source).unwrap();

        let types = source.package().content_types();
        assert_eq!(types.default_for("png"), Some(content_type::PNG));
        assert_eq!(types.override_for("/ppt/media/image1.png"), None);
    }

    #[test]
    fn test_copy_appends_slide_with_same_xml() {
        let mut source = Presentation::new().unwrap();
        source.add_slide(0, "Source", None).unwrap();
        let mut target = Presentation::new().unwrap();
        target.add_slide(1, "Target", Some("body")).unwrap();

        copy_slide(&target, 0, &mut source).unwrap();

        assert_eq!(source.slide_count(), 2);
        let copied = source.slide(1).unwrap();
        assert_eq!(copied.partname, "/ppt/slides/slide2.xml");
        assert_eq!(copied.title.as_deref(), Some("Target"));
        assert_eq!(
            source.package().part(&copied.partname).unwrap(),
            target.package().part("/ppt/slides/slide1.xml").unwrap()
        );
    }

    #[test]
    fn test_copy_reuses_layout_by_name() {
        let mut source = Presentation::new().unwrap();
        let mut target = Presentation::new().unwrap();
        target.add_slide(1, "Content", None).unwrap();
        let layouts_before = source.slide_layouts().unwrap();

        copy_slide(&target, 0, &mut source).unwrap();

        let copied = source.slide(0).unwrap();
        assert_eq!(copied.layout_partname.as_deref(), Some("/ppt/slideLayouts/slideLayout2.xml"));
        assert_eq!(source.slide_layouts().unwrap(), layouts_before);
    }

    #[test]
    fn test_unknown_layout_falls_back_to_first() {
        let mut target = Presentation::new().unwrap();
        target.add_slide(1, "Custom", None).unwrap();
        let layout = "/ppt/slideLayouts/slideLayout2.xml";
        let renamed = String::from_utf8(target.package().part(layout).unwrap().to_vec())
            .unwrap()
            .replace("name=\"Title and Content\"", "name=\"Two Columns\"");
        target.package_mut().set_part(layout, renamed.into_bytes());

        let mut source = Presentation::new().unwrap();
        copy_slide(&target, 0, &mut source).unwrap();

        let copied = source.slide(0).unwrap();
        assert_eq!(copied.layout_partname.as_deref(), Some("/ppt/slideLayouts/slideLayout1.xml"));
    }

    #[test]
    fn test_slide_link_points_at_the_copy() {
        let mut target = Presentation::new().unwrap();
        target.add_slide(0, "One", None).unwrap();
        target.add_slide(0, "Two", None).unwrap();
        let slide = target.slide_partname(0).unwrap().to_string();
        let mut rels = target.package().relationships(&slide).unwrap();
        let link = rels.add(rel_type::SLIDE, "slide2.xml");
        target.package_mut().set_relationships(&slide, &rels).unwrap();

        let mut source = Presentation::new().unwrap();
        source.add_slide(0, "Existing", None).unwrap();
        copy_slide(&target, 0, &mut source).unwrap();

        let copied = source.slide_partname(1).unwrap().to_string();
        let copied_rels = source.package().relationships(&copied).unwrap();
        let rel = copied_rels.get(&link).unwrap();
        assert_eq!(resolve_target(&copied, &rel.target), copied);
    }

    #[test]
    fn test_copy_imports_media_and_keeps_external_links() {
        let target = deck_with_picture();
        let mut source = Presentation::new().unwrap();

        copy_slide(&target, 0, &mut source).unwrap();

        let slide = source.slide_partname(0).unwrap().to_string();
        let rels = source.package().relationships(&slide).unwrap();
        let image = rels.first_of_type(rel_type::IMAGE).unwrap();
        let image_part = resolve_target(&slide, &image.target);
        assert_eq!(image_part, "/ppt/media/image1.png");
        assert_eq!(source.package().part(&image_part).unwrap(), PIXEL);
        assert_eq!(
            source.package().content_types().content_type(&image_part),
            Some(content_type::PNG)
        );

        let link = rels.get("rId9").unwrap();
        assert!(link.external);
        assert_eq!(link.target, "https://example.com");
    }

    #[test]
    fn test_identical_media_is_stored_once() {
        let target = deck_with_picture();
        let mut source = Presentation::new().unwrap();

        copy_slide(&target, 0, &mut source).unwrap();
        copy_slide(&target, 0, &mut source).unwrap();

        let media: Vec<_> = source
            .package()
            .part_names()
            .filter(|name| name.starts_with("/ppt/media/"))
            .collect();
        assert_eq!(media, vec!["/ppt/media/image1.png"]);
        assert_eq!(source.slide_count(), 2);
    }

    #[test]
    fn test_different_media_with_same_name_is_renamed() {
        let target = deck_with_picture();
        let mut source = deck_with_picture();
        source.package_mut().set_part("/ppt/media/image1.png", b"other bytes".to_vec());

        copy_slide(&target, 0, &mut source).unwrap();

        let slide = source.slide_partname(1).unwrap().to_string();
        let rels = source.package().relationships(&slide).unwrap();
        let image = rels.first_of_type(rel_type::IMAGE).unwrap();
        assert_eq!(resolve_target(&slide, &image.target), "/ppt/media/image2.png");
        assert_eq!(source.package().part("/ppt/media/image1.png").unwrap(), b"other bytes");
    }

    #[test]
    fn test_notes_relationship_is_dropped() {
        let mut target = Presentation::new().unwrap();
        target.add_slide(0, "With notes", None).unwrap();
        let slide = target.slide_partname(0).unwrap().to_string();
        let mut rels = target.package().relationships(&slide).unwrap();
        rels.add(rel_type::NOTES_SLIDE, "../notesSlides/notesSlide1.xml");
        target.package_mut().set_relationships(&slide, &rels).unwrap();

        let mut source = Presentation::new().unwrap();
        copy_slide(&target, 0, &mut source).unwrap();

        let copied = source.slide_partname(0).unwrap().to_string();
        let copied_rels = source.package().relationships(&copied).unwrap();
        assert!(copied_rels.first_of_type(rel_type::NOTES_SLIDE).is_none());
        assert_eq!(copied_rels.len(), 1);
    }

    #[test]
    fn test_copy_index_out_of_range() {
        let target = Presentation::new().unwrap();
        let mut source = Presentation::new().unwrap();
        let err = copy_slide(&target, 3, &mut source).unwrap_err();
        assert!(matches!(err, Error::SlideIndexOutOfRange { index: 3, count: 0 }));
        assert_eq!(source.slide_count(), 0);
    }
}
