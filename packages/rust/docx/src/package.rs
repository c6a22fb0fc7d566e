//! Access to the parts of a docx (OPC zip) package.

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use notesite_shared::{NotesiteError, Result};

/// Relationships of `word/document.xml`.
pub(crate) const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

const REL_TYPE_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
const REL_TYPE_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// An opened docx package.
pub(crate) struct Package<R> {
    archive: ZipArchive<R>,
    source: PathBuf,
}

impl<R: Read + Seek> Package<R> {
    /// Open the zip container. `source` is only used for error messages.
    pub(crate) fn open(reader: R, source: &Path) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| NotesiteError::docx(source, format!("not a zip package: {e}")))?;
        Ok(Self {
            archive,
            source: source.to_path_buf(),
        })
    }

    pub(crate) fn source(&self) -> &Path {
        &self.source
    }

    /// Read a part as UTF-8 text. Returns `None` if the part does not exist.
    pub(crate) fn read_text(&mut self, name: &str) -> Result<Option<String>> {
        let Some(bytes) = self.read_binary(name)? else {
            return Ok(None);
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| NotesiteError::docx(&self.source, format!("{name} is not UTF-8: {e}")))
    }

    /// Read a part as raw bytes. Returns `None` if the part does not exist.
    pub(crate) fn read_binary(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(NotesiteError::docx(
                    &self.source,
                    format!("cannot open {name}: {e}"),
                ));
            }
        };

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| NotesiteError::docx(&self.source, format!("cannot read {name}: {e}")))?;
        Ok(Some(bytes))
    }

    /// Error for an XML part that failed to parse.
    pub(crate) fn malformed(&self, part: &str, err: roxmltree::Error) -> NotesiteError {
        NotesiteError::docx(&self.source, format!("malformed {part}: {err}"))
    }
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

/// A single `<Relationship>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub kind: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    pub(crate) fn is_hyperlink(&self) -> bool {
        self.kind == REL_TYPE_HYPERLINK
    }

    pub(crate) fn is_image(&self) -> bool {
        self.kind == REL_TYPE_IMAGE
    }
}

/// Parse a `.rels` part.
pub(crate) fn parse_relationships(
    xml: &str,
) -> std::result::Result<Vec<Relationship>, roxmltree::Error> {
    let doc = roxmltree::Document::parse(xml)?;

    let rels = doc
        .root_element()
        .children()
        .filter(|n| n.tag_name().name() == "Relationship")
        .filter_map(|n| {
            Some(Relationship {
                id: n.attribute("Id")?.to_string(),
                kind: n.attribute("Type").unwrap_or_default().to_string(),
                target: n.attribute("Target")?.to_string(),
                external: n.attribute("TargetMode") == Some("External"),
            })
        })
        .collect();

    Ok(rels)
}

/// Resolve a relationship target of `word/document.xml` to a zip entry name.
pub(crate) fn resolve_part_name(target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{target}"),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Load every embedded image as a `data:` URI, keyed by relationship id.
pub(crate) fn load_images<R: Read + Seek>(
    package: &mut Package<R>,
    rels: &[Relationship],
) -> Result<HashMap<String, String>> {
    let mut images = HashMap::new();

    for rel in rels.iter().filter(|r| r.is_image() && !r.external) {
        let part = resolve_part_name(&rel.target);
        let Some(bytes) = package.read_binary(&part)? else {
            debug!(rel_id = %rel.id, %part, "image part missing, skipping");
            continue;
        };
        let uri = format!("data:{};base64,{}", mime_for(&part), STANDARD.encode(&bytes));
        images.insert(rel.id.clone(), uri);
    }

    Ok(images)
}

fn mime_for(part: &str) -> &'static str {
    let ext = part.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_relationships_reads_entries() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/" TargetMode="External"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
</Relationships>"#;

        let rels = parse_relationships(xml).unwrap();
        assert_eq!(rels.len(), 3);
        assert!(rels[1].is_hyperlink());
        assert!(rels[1].external);
        assert!(rels[2].is_image());
        assert_eq!(rels[2].target, "media/image1.png");
    }

    #[test]
    fn resolve_part_name_handles_relative_and_absolute() {
        assert_eq!(resolve_part_name("media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_part_name("../media/a.jpeg"), "media/a.jpeg");
        assert_eq!(resolve_part_name("/word/media/b.gif"), "word/media/b.gif");
    }

    #[test]
    fn mime_for_known_extensions() {
        assert_eq!(mime_for("word/media/image1.PNG"), "image/png");
        assert_eq!(mime_for("word/media/photo.jpg"), "image/jpeg");
        assert_eq!(mime_for("word/media/blob"), "application/octet-stream");
    }
}
