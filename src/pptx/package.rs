//! OPC package container: the zip archive behind a `.pptx` file

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::constants::{CONTENT_TYPES_ENTRY, PACKAGE_URI};
use super::content_types::ContentTypes;
use super::rels::{rels_partname, Relationships};
use crate::error::{Error, Result};

/// An in-memory OPC package
///
/// Parts are keyed by absolute part name (`/ppt/slides/slide1.xml`).
/// `[Content_Types].xml` is not a part; it is kept parsed and regenerated on write.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
    content_types: ContentTypes,
}

impl Package {
    /// Create an empty package
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a package from a file
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "reading package");
        Self::from_reader(Cursor::new(bytes))
    }

    /// Load a package from any seekable reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = BTreeMap::new();
        let mut content_types = None;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;

            if name == CONTENT_TYPES_ENTRY {
                content_types = Some(ContentTypes::parse(&data)?);
            } else {
                parts.insert(format!("/{}", name.trim_start_matches('/')), data);
            }
        }

        let content_types = content_types.ok_or_else(|| {
            Error::InvalidPackage(format!("missing {}", CONTENT_TYPES_ENTRY))
        })?;

        Ok(Self { parts, content_types })
    }

    /// Serialize the package to zip bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let cursor = self.write_to(Cursor::new(Vec::new()))?;
        Ok(cursor.into_inner())
    }

    /// Write the package as a zip archive
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        self.write_with(writer, &BTreeMap::new())
    }

    /// Write the package, substituting the bytes of any part named in `replacements`
    ///
    /// Entry order: `[Content_Types].xml`, the package relationships, then every
    /// other part by name.
    pub(crate) fn write_with<W: Write + Seek>(
        &self,
        writer: W,
        replacements: &BTreeMap<String, Vec<u8>>,
    ) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(CONTENT_TYPES_ENTRY, options)?;
        zip.write_all(&self.content_types.to_xml()?)?;

        let package_rels = rels_partname(PACKAGE_URI);
        let ordered = self
            .parts
            .iter()
            .filter(|(name, _)| **name == package_rels)
            .chain(self.parts.iter().filter(|(name, _)| **name != package_rels));

        for (name, data) in ordered {
            let data = replacements.get(name).unwrap_or(data);
            zip.start_file(name.trim_start_matches('/'), options)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?)
    }

    /// Bytes of a part, or `MissingPart`
    pub fn part(&self, partname: &str) -> Result<&[u8]> {
        self.get_part(partname)
            .ok_or_else(|| Error::MissingPart(partname.to_string()))
    }

    pub fn get_part(&self, partname: &str) -> Option<&[u8]> {
        self.parts.get(partname).map(Vec::as_slice)
    }

    /// Insert or replace a part
    pub fn set_part(&mut self, partname: &str, data: Vec<u8>) {
        self.parts.insert(partname.to_string(), data);
    }

    pub fn contains(&self, partname: &str) -> bool {
        self.parts.contains_key(partname)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    pub fn content_types_mut(&mut self) -> &mut ContentTypes {
        &mut self.content_types
    }

    /// Relationships whose source is `partname`; empty when it has no `.rels` part
    pub fn relationships(&self, partname: &str) -> Result<Relationships> {
        match self.get_part(&rels_partname(partname)) {
            Some(xml) => Relationships::parse(xml),
            None => Ok(Relationships::new()),
        }
    }

    pub fn set_relationships(&mut self, partname: &str, rels: &Relationships) -> Result<()> {
        let xml = rels.to_xml()?;
        self.set_part(&rels_partname(partname), xml);
        Ok(())
    }

    /// First unused part name of the form `{dir}/{stem}{N}.{ext}`, N counting from 1
    ///
    /// An empty `ext` gives names without an extension.
    pub fn next_partname(&self, dir: &str, stem: &str, ext: &str) -> String {
        let dir = dir.trim_end_matches('/');
        let suffix = if ext.is_empty() { String::new() } else { format!(".{}", ext) };
        (1..)
            .map(|n| format!("{}/{}{}{}", dir, stem, n, suffix))
            .find(|name| !self.contains(name))
            .unwrap_or_default()
    }

    /// A part directly under `dir` whose bytes equal `data`
    pub fn find_identical(&self, dir: &str, data: &[u8]) -> Option<&str> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        self.parts
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix) && !name[prefix.len()..].contains('/'))
            .find(|(_, bytes)| bytes.as_slice() == data)
            .map(|(name, _)| name.as_str())
    }
}
