//! docx → HTML conversion.
//!
//! Opens the docx zip package, reads `word/document.xml` together with its
//! styles, numbering definitions and relationships, and renders the body as
//! an HTML fragment for the Markdown converter.

mod numbering;
mod package;
mod render;
mod styles;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use tracing::{debug, instrument};

use notesite_shared::{NotesiteError, Result};

use crate::numbering::Numbering;
use crate::package::{DOCUMENT_RELS_PART, Package, load_images, parse_relationships};
use crate::render::RenderContext;
use crate::styles::StyleMap;

pub(crate) const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const R_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const NUMBERING_PART: &str = "word/numbering.xml";

/// Convert a `.docx` file on disk to an HTML fragment.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn docx_to_html(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| NotesiteError::io(path, e))?;
    convert_package(BufReader::new(file), path)
}

/// Convert an in-memory `.docx` package to an HTML fragment.
pub fn docx_bytes_to_html(bytes: &[u8]) -> Result<String> {
    convert_package(Cursor::new(bytes), Path::new("<memory>"))
}

fn convert_package<R: Read + Seek>(reader: R, source: &Path) -> Result<String> {
    let mut package = Package::open(reader, source)?;

    let document_xml = package
        .read_text(DOCUMENT_PART)?
        .ok_or_else(|| NotesiteError::docx(source, format!("missing {DOCUMENT_PART}")))?;

    let styles = match package.read_text(STYLES_PART)? {
        Some(xml) => StyleMap::parse(&xml).map_err(|e| package.malformed(STYLES_PART, e))?,
        None => StyleMap::default(),
    };

    let numbering = match package.read_text(NUMBERING_PART)? {
        Some(xml) => Numbering::parse(&xml).map_err(|e| package.malformed(NUMBERING_PART, e))?,
        None => Numbering::default(),
    };

    let rels = match package.read_text(DOCUMENT_RELS_PART)? {
        Some(xml) => {
            parse_relationships(&xml).map_err(|e| package.malformed(DOCUMENT_RELS_PART, e))?
        }
        None => Vec::new(),
    };

    let links: HashMap<String, String> = rels
        .iter()
        .filter(|r| r.is_hyperlink())
        .map(|r| (r.id.clone(), r.target.clone()))
        .collect();
    let images = load_images(&mut package, &rels)?;

    let doc = roxmltree::Document::parse(&document_xml)
        .map_err(|e| package.malformed(DOCUMENT_PART, e))?;
    let body = doc
        .root_element()
        .children()
        .find(|n| n.has_tag_name((W_NS, "body")))
        .ok_or_else(|| NotesiteError::docx(package.source(), "document has no w:body"))?;

    let ctx = RenderContext {
        styles: &styles,
        numbering: &numbering,
        links: &links,
        images: &images,
    };
    let html = render::render_body(body, &ctx);

    debug!(
        html_len = html.len(),
        links = links.len(),
        images = images.len(),
        "docx rendered to HTML"
    );

    Ok(html)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
