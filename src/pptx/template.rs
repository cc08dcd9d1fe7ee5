//! Built-in blank presentation and slide creation
//!
//! The template has one slide master, a "Title Slide" and a "Title and Content"
//! layout, one theme, and document properties. It carries no slides and no
//! `<p:sldIdLst>`; the list is created with the first slide.

use chrono::{SecondsFormat, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::constants::{content_type, namespace, rel_type, PACKAGE_URI};
use super::package::Package;
use super::presentation::Presentation;
use super::rels::{relative_target, Relationships};
use super::xml::{attr_value, escape};
use crate::error::{Error, Result};

const PRESENTATION_PART: &str = "/ppt/presentation.xml";
const MASTER_PART: &str = "/ppt/slideMasters/slideMaster1.xml";
const THEME_PART: &str = "/ppt/theme/theme1.xml";
const CORE_PART: &str = "/docProps/core.xml";
const APP_PART: &str = "/docProps/app.xml";

/// Layouts of the template: part name, display name, layout type, placeholders
const LAYOUTS: [(&str, &str, &str, [(&str, Option<u32>); 2]); 2] = [
    (
        "/ppt/slideLayouts/slideLayout1.xml",
        "Title Slide",
        "title",
        [("ctrTitle", None), ("subTitle", Some(1))],
    ),
    (
        "/ppt/slideLayouts/slideLayout2.xml",
        "Title and Content",
        "obj",
        [("title", None), ("body", Some(1))],
    ),
];

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

impl Presentation {
    /// Create a blank presentation with no slides
    ///
    /// # Example
    ///
    /// ```
    /// use pptx_concat::Presentation;
    ///
    /// let mut deck = Presentation::new().unwrap();
    /// deck.add_slide(0, "Slide 1", Some("This is content for slide 1")).unwrap();
    /// assert_eq!(deck.slide_count(), 1);
    /// ```
    pub fn new() -> Result<Self> {
        let mut package = Package::new();
        let types = package.content_types_mut();
        types.ensure_default("rels", content_type::RELATIONSHIPS);
        types.ensure_default("xml", content_type::XML);
        types.add_override(PRESENTATION_PART, content_type::PRESENTATION);
        types.add_override(MASTER_PART, content_type::SLIDE_MASTER);
        types.add_override(THEME_PART, content_type::THEME);
        types.add_override(CORE_PART, content_type::CORE_PROPERTIES);
        types.add_override(APP_PART, content_type::EXTENDED_PROPERTIES);

        let mut package_rels = Relationships::new();
        package_rels.add(rel_type::OFFICE_DOCUMENT, &relative_target(PACKAGE_URI, PRESENTATION_PART));
        package_rels.add(rel_type::CORE_PROPERTIES, &relative_target(PACKAGE_URI, CORE_PART));
        package_rels.add(rel_type::EXTENDED_PROPERTIES, &relative_target(PACKAGE_URI, APP_PART));
        package.set_relationships(PACKAGE_URI, &package_rels)?;

        let mut presentation_rels = Relationships::new();
        let master_rel = presentation_rels.add(
            rel_type::SLIDE_MASTER,
            &relative_target(PRESENTATION_PART, MASTER_PART),
        );
        presentation_rels.add(rel_type::THEME, &relative_target(PRESENTATION_PART, THEME_PART));
        package.set_relationships(PRESENTATION_PART, &presentation_rels)?;
        package.set_part(PRESENTATION_PART, presentation_xml(&master_rel).into_bytes());

        let mut master_rels = Relationships::new();
        let mut layout_rel_ids = Vec::new();
        for (partname, name, kind, placeholders) in LAYOUTS {
            layout_rel_ids.push(master_rels.add(rel_type::SLIDE_LAYOUT, &relative_target(MASTER_PART, partname)));

            let mut layout_rels = Relationships::new();
            layout_rels.add(rel_type::SLIDE_MASTER, &relative_target(partname, MASTER_PART));
            package.set_relationships(partname, &layout_rels)?;
            package.set_part(partname, layout_xml(name, kind, &placeholders).into_bytes());
            package.content_types_mut().add_override(partname, content_type::SLIDE_LAYOUT);
        }
        master_rels.add(rel_type::THEME, &relative_target(MASTER_PART, THEME_PART));
        package.set_relationships(MASTER_PART, &master_rels)?;
        package.set_part(MASTER_PART, master_xml(&layout_rel_ids).into_bytes());

        package.set_part(THEME_PART, theme_xml().into_bytes());
        package.set_part(CORE_PART, core_xml().into_bytes());
        package.set_part(APP_PART, app_xml().into_bytes());

        Self::from_parts(package, PRESENTATION_PART.to_string())
    }

    /// Append a new slide built on the layout at `layout_index`
    ///
    /// The layout's title placeholder receives `title`; its first indexed body
    /// placeholder receives `body`, one paragraph per line. Returns the index of
    /// the new slide.
    pub fn add_slide(&mut self, layout_index: usize, title: &str, body: Option<&str>) -> Result<usize> {
        let layouts = self.slide_layouts()?;
        let layout = layouts.get(layout_index).ok_or_else(|| {
            Error::General(format!(
                "no slide layout at index {} ({} layouts)",
                layout_index,
                layouts.len()
            ))
        })?;

        let placeholders = layout_placeholders(self.package().part(&layout.partname)?)?;
        let title_ph = placeholders.iter().find(|ph| ph.is_title());
        let body_ph = placeholders.iter().find(|ph| ph.is_body());

        let mut shapes = String::new();
        let mut shape_id = 2;
        if let Some(ph) = title_ph {
            shapes.push_str(&placeholder_shape(shape_id, "Title", ph.kind.as_deref(), ph.idx, Some(title)));
            shape_id += 1;
        }
        if let Some(ph) = body_ph {
            shapes.push_str(&placeholder_shape(shape_id, "Content", ph.kind.as_deref(), ph.idx, body));
        }

        let partname = self.package().next_partname("/ppt/slides", "slide", "xml");
        let mut rels = Relationships::new();
        rels.add(rel_type::SLIDE_LAYOUT, &relative_target(&partname, &layout.partname));

        let package = self.package_mut();
        package.set_part(&partname, slide_xml(&shapes).into_bytes());
        package.set_relationships(&partname, &rels)?;
        package.content_types_mut().add_override(&partname, content_type::SLIDE);

        self.append_slide_part(&partname)?;
        Ok(self.slide_count() - 1)
    }
}

/// A `<p:ph>` of a layout
#[derive(Debug, Clone, PartialEq, Eq)]
struct Placeholder {
    kind: Option<String>,
    idx: Option<u32>,
}

impl Placeholder {
    fn is_title(&self) -> bool {
        matches!(self.kind.as_deref(), Some("title") | Some("ctrTitle"))
    }

    fn is_body(&self) -> bool {
        self.idx.is_some()
            && !self.is_title()
            && !matches!(self.kind.as_deref(), Some("dt") | Some("ftr") | Some("sldNum") | Some("hdr"))
    }
}

fn layout_placeholders(xml: &[u8]) -> Result<Vec<Placeholder>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut placeholders = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"ph" => {
                placeholders.push(Placeholder {
                    kind: attr_value(&e, b"type")?,
                    idx: attr_value(&e, b"idx")?.and_then(|idx| idx.parse().ok()),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(placeholders)
}

fn root_namespaces() -> String {
    format!(
        "xmlns:a=\"{}\" xmlns:r=\"{}\" xmlns:p=\"{}\"",
        namespace::DRAWINGML,
        namespace::OFFICE_RELATIONSHIPS,
        namespace::PRESENTATIONML
    )
}

const GROUP_SHAPE_PROPS: &str = "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
<p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/><a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>";

fn placeholder_attrs(kind: Option<&str>, idx: Option<u32>) -> String {
    let mut attrs = String::new();
    if let Some(kind) = kind {
        attrs.push_str(&format!(" type=\"{}\"", escape(kind)));
    }
    if let Some(idx) = idx {
        attrs.push_str(&format!(" idx=\"{}\"", idx));
    }
    attrs
}

fn paragraphs(text: Option<&str>) -> String {
    match text {
        Some(text) => text
            .split('\n')
            .map(|line| format!("<a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r></a:p>", escape(line)))
            .collect(),
        None => "<a:p><a:endParaRPr lang=\"en-US\"/></a:p>".to_string(),
    }
}

/// A placeholder shape; `xfrm` is `(x, y, cx, cy)` in EMU when the shape positions itself
fn shape_xml(id: u32, name: &str, ph: &str, xfrm: Option<(u64, u64, u64, u64)>, text: Option<&str>) -> String {
    let sp_pr = match xfrm {
        Some((x, y, cx, cy)) => format!(
            "<p:spPr><a:xfrm><a:off x=\"{}\" y=\"{}\"/><a:ext cx=\"{}\" cy=\"{}\"/></a:xfrm></p:spPr>",
            x, y, cx, cy
        ),
        None => "<p:spPr/>".to_string(),
    };
    format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{}\" name=\"{}\"/><p:cNvSpPr><a:spLocks noGrp=\"1\"/></p:cNvSpPr>\
<p:nvPr><p:ph{}/></p:nvPr></p:nvSpPr>{}<p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>",
        id,
        escape(name),
        ph,
        sp_pr,
        paragraphs(text)
    )
}

fn placeholder_shape(id: u32, name: &str, kind: Option<&str>, idx: Option<u32>, text: Option<&str>) -> String {
    shape_xml(id, &format!("{} {}", name, id - 1), &placeholder_attrs(kind, idx), None, text)
}

fn slide_xml(shapes: &str) -> String {
    format!(
        "{}<p:sld {}><p:cSld><p:spTree>{}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>",
        XML_DECL,
        root_namespaces(),
        GROUP_SHAPE_PROPS,
        shapes
    )
}

fn presentation_xml(master_rel_id: &str) -> String {
    format!(
        "{}<p:presentation {} saveSubsetFonts=\"1\"><p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"{}\"/></p:sldMasterIdLst>\
<p:sldSz cx=\"9144000\" cy=\"6858000\" type=\"screen4x3\"/><p:notesSz cx=\"6858000\" cy=\"9144000\"/></p:presentation>",
        XML_DECL,
        root_namespaces(),
        escape(master_rel_id)
    )
}

fn master_xml(layout_rel_ids: &[String]) -> String {
    let title = shape_xml(2, "Title Placeholder 1", " type=\"title\"", Some((457200, 274638, 8229600, 1143000)), None);
    let body = shape_xml(
        3,
        "Text Placeholder 2",
        " type=\"body\" idx=\"1\"",
        Some((457200, 1600200, 8229600, 4525963)),
        None,
    );
    let layout_ids: String = layout_rel_ids
        .iter()
        .enumerate()
        .map(|(i, rel_id)| format!("<p:sldLayoutId id=\"{}\" r:id=\"{}\"/>", 2147483649u32 + i as u32, escape(rel_id)))
        .collect();

    format!(
        "{}<p:sldMaster {}><p:cSld><p:bg><p:bgRef idx=\"1001\"><a:schemeClr val=\"bg1\"/></p:bgRef></p:bg><p:spTree>{}{}{}</p:spTree></p:cSld>\
<p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" accent2=\"accent2\" accent3=\"accent3\" accent4=\"accent4\" accent5=\"accent5\" accent6=\"accent6\" hlink=\"hlink\" folHlink=\"folHlink\"/>\
<p:sldLayoutIdLst>{}</p:sldLayoutIdLst></p:sldMaster>",
        XML_DECL,
        root_namespaces(),
        GROUP_SHAPE_PROPS,
        title,
        body,
        layout_ids
    )
}

fn layout_xml(name: &str, kind: &str, placeholders: &[(&str, Option<u32>)]) -> String {
    let shapes: String = placeholders
        .iter()
        .enumerate()
        .map(|(i, (ph_type, idx))| {
            let id = i as u32 + 2;
            shape_xml(id, &format!("Placeholder {}", id - 1), &placeholder_attrs(Some(*ph_type), *idx), None, None)
        })
        .collect();

    format!(
        "{}<p:sldLayout {} type=\"{}\" preserve=\"1\"><p:cSld name=\"{}\"><p:spTree>{}{}</p:spTree></p:cSld>\
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>",
        XML_DECL,
        root_namespaces(),
        escape(kind),
        escape(name),
        GROUP_SHAPE_PROPS,
        shapes
    )
}

fn theme_xml() -> String {
    let colors = [
        ("dk2", "1F497D"),
        ("lt2", "EEECE1"),
        ("accent1", "4F81BD"),
        ("accent2", "C0504D"),
        ("accent3", "9BBB59"),
        ("accent4", "8064A2"),
        ("accent5", "4BACC6"),
        ("accent6", "F79646"),
        ("hlink", "0000FF"),
        ("folHlink", "800080"),
    ];
    let scheme: String = colors
        .iter()
        .map(|(slot, rgb)| format!("<a:{0}><a:srgbClr val=\"{1}\"/></a:{0}>", slot, rgb))
        .collect();
    let font = "<a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/>";
    let fill = "<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>".repeat(3);
    let line = "<a:ln w=\"9525\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln>".repeat(3);
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>".repeat(3);

    format!(
        "{}<a:theme xmlns:a=\"{}\" name=\"Office Theme\"><a:themeElements>\
<a:clrScheme name=\"Office\"><a:dk1><a:sysClr val=\"windowText\" lastClr=\"000000\"/></a:dk1><a:lt1><a:sysClr val=\"window\" lastClr=\"FFFFFF\"/></a:lt1>{}</a:clrScheme>\
<a:fontScheme name=\"Office\"><a:majorFont>{}</a:majorFont><a:minorFont>{}</a:minorFont></a:fontScheme>\
<a:fmtScheme name=\"Office\"><a:fillStyleLst>{}</a:fillStyleLst><a:lnStyleLst>{}</a:lnStyleLst><a:effectStyleLst>{}</a:effectStyleLst><a:bgFillStyleLst>{}</a:bgFillStyleLst></a:fmtScheme>\
</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>",
        XML_DECL,
        namespace::DRAWINGML,
        scheme,
        font,
        font,
        fill,
        line,
        effect,
        fill
    )
}

fn core_xml() -> String {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        "{}<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" \
xmlns:dcmitype=\"http://purl.org/dc/dcmitype/\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
<dc:title>PowerPoint Presentation</dc:title><cp:revision>1</cp:revision>\
<dcterms:created xsi:type=\"dcterms:W3CDTF\">{}</dcterms:created>\
<dcterms:modified xsi:type=\"dcterms:W3CDTF\">{}</dcterms:modified></cp:coreProperties>",
        XML_DECL, now, now
    )
}

fn app_xml() -> String {
    format!(
        "{}<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\">\
<Application>{} {}</Application><Slides>0</Slides></Properties>",
        XML_DECL,
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}
