//! Walks the `w:body` element and emits an HTML fragment.
//!
//! Only the structure the notes actually use is kept: headings, paragraphs,
//! nested lists, tables, links, images, and inline emphasis. Everything else
//! (section properties, bookmarks, field codes, tracked deletions) is dropped.

use std::collections::HashMap;

use roxmltree::Node;
use tracing::debug;

use crate::numbering::Numbering;
use crate::styles::StyleMap;
use crate::{R_NS, W_NS};

/// Deepest list level Word allows (`w:ilvl` 0–8).
const MAX_LIST_LEVEL: u32 = 8;

/// Lookup tables shared by the whole render pass.
pub(crate) struct RenderContext<'a> {
    pub styles: &'a StyleMap,
    pub numbering: &'a Numbering,
    /// Hyperlink relationship id → href.
    pub links: &'a HashMap<String, String>,
    /// Image relationship id → `data:` URI.
    pub images: &'a HashMap<String, String>,
}

/// Render the children of `w:body` to HTML.
pub(crate) fn render_body(body: Node<'_, '_>, ctx: &RenderContext<'_>) -> String {
    let mut writer = HtmlWriter {
        ctx,
        out: String::new(),
        lists: Vec::new(),
    };
    writer.blocks(body);
    writer.close_lists();
    writer.out
}

// ---------------------------------------------------------------------------
// Block level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Ordered => "ol",
            Self::Unordered => "ul",
        }
    }
}

struct HtmlWriter<'c, 'a> {
    ctx: &'c RenderContext<'a>,
    out: String,
    /// Open lists, innermost last. Each one has an open `<li>`.
    lists: Vec<ListKind>,
}

impl HtmlWriter<'_, '_> {
    fn blocks(&mut self, parent: Node<'_, '_>) {
        for child in parent.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "p" => self.paragraph(child),
                "tbl" => {
                    self.close_lists();
                    let table = render_table(child, self.ctx);
                    self.out.push_str(&table);
                }
                "sdt" => {
                    if let Some(content) = find_child(child, "sdtContent") {
                        self.blocks(content);
                    }
                }
                _ => {}
            }
        }
    }

    fn paragraph(&mut self, p: Node<'_, '_>) {
        let props = find_child(p, "pPr");
        let inline = inline_html(p, self.ctx);

        if let Some((num_id, level)) = props.and_then(list_position) {
            let kind = if self.ctx.numbering.is_ordered(num_id, level) {
                ListKind::Ordered
            } else {
                ListKind::Unordered
            };
            self.list_item(kind, level);
            self.out.push_str(&inline);
            return;
        }

        self.close_lists();
        if inline.trim().is_empty() {
            return;
        }

        let heading = props
            .and_then(|pr| find_child(pr, "pStyle"))
            .and_then(|s| s.attribute((W_NS, "val")))
            .and_then(|id| self.ctx.styles.heading_level(id));

        match heading {
            Some(level) => self.out.push_str(&format!("<h{level}>{inline}</h{level}>")),
            None => self.out.push_str(&format!("<p>{inline}</p>")),
        }
    }

    /// Open a `<li>` at `level`, opening or closing lists as needed.
    fn list_item(&mut self, kind: ListKind, level: u32) {
        let depth = level.min(MAX_LIST_LEVEL) as usize + 1;

        while self.lists.len() > depth {
            self.close_one();
        }

        if self.lists.len() == depth {
            if self.lists.last() == Some(&kind) {
                self.out.push_str("</li><li>");
                return;
            }
            self.close_one();
        }

        while self.lists.len() < depth {
            self.out.push_str(&format!("<{}><li>", kind.tag()));
            self.lists.push(kind);
        }
    }

    fn close_one(&mut self) {
        if let Some(kind) = self.lists.pop() {
            self.out.push_str(&format!("</li></{}>", kind.tag()));
        }
    }

    fn close_lists(&mut self) {
        while !self.lists.is_empty() {
            self.close_one();
        }
    }
}

/// `(numId, ilvl)` of a list paragraph. `numId` 0 turns numbering off.
fn list_position<'a>(props: Node<'a, '_>) -> Option<(&'a str, u32)> {
    let num_pr = find_child(props, "numPr")?;
    let num_id = find_child(num_pr, "numId")?.attribute((W_NS, "val"))?;
    if num_id == "0" {
        return None;
    }
    let level = find_child(num_pr, "ilvl")
        .and_then(|n| n.attribute((W_NS, "val")))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    Some((num_id, level))
}

fn render_table(tbl: Node<'_, '_>, ctx: &RenderContext<'_>) -> String {
    let mut html = String::from("<table>");

    for row in tbl.children().filter(|n| n.tag_name().name() == "tr") {
        html.push_str("<tr>");
        for cell in row.children().filter(|n| n.tag_name().name() == "tc") {
            let parts: Vec<String> = cell
                .children()
                .filter(Node::is_element)
                .filter_map(|child| match child.tag_name().name() {
                    "p" => Some(inline_html(child, ctx)),
                    "tbl" => Some(render_table(child, ctx)),
                    _ => None,
                })
                .filter(|part| !part.trim().is_empty())
                .collect();
            html.push_str(&format!("<td>{}</td>", parts.join("<br />")));
        }
        html.push_str("</tr>");
    }

    html.push_str("</table>");
    html
}

// ---------------------------------------------------------------------------
// Inline level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RunFormat {
    bold: bool,
    italic: bool,
    strike: bool,
    superscript: bool,
    subscript: bool,
}

#[derive(Debug)]
struct Segment {
    format: RunFormat,
    html: String,
}

/// Render the inline content of a paragraph (or hyperlink) to HTML.
fn inline_html(container: Node<'_, '_>, ctx: &RenderContext<'_>) -> String {
    let mut segments = Vec::new();
    collect_segments(container, ctx, &mut segments);

    // Adjacent runs with the same formatting become one element.
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        match merged.last_mut() {
            Some(last) if last.format == segment.format => last.html.push_str(&segment.html),
            _ => merged.push(segment),
        }
    }

    merged.iter().map(wrap_segment).collect()
}

fn collect_segments(node: Node<'_, '_>, ctx: &RenderContext<'_>, out: &mut Vec<Segment>) {
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "r" => run_segments(child, ctx, out),
            "hyperlink" => {
                let inner = inline_html(child, ctx);
                let html = match hyperlink_href(child, ctx) {
                    Some(href) => format!("<a href=\"{}\">{inner}</a>", escape_html(&href)),
                    None => inner,
                };
                out.push(Segment {
                    format: RunFormat::default(),
                    html,
                });
            }
            "ins" | "smartTag" | "fldSimple" | "customXml" => collect_segments(child, ctx, out),
            "sdt" => {
                if let Some(content) = find_child(child, "sdtContent") {
                    collect_segments(content, ctx, out);
                }
            }
            _ => {}
        }
    }
}

fn run_segments(run: Node<'_, '_>, ctx: &RenderContext<'_>, out: &mut Vec<Segment>) {
    let format = find_child(run, "rPr").map(run_format).unwrap_or_default();
    let mut text = String::new();

    for child in run.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "t" => text.push_str(&escape_html(child.text().unwrap_or_default())),
            "tab" => text.push('\t'),
            "noBreakHyphen" => text.push('-'),
            "cr" => text.push_str("<br />"),
            "br" if child.attribute((W_NS, "type")) != Some("page") => text.push_str("<br />"),
            "drawing" | "pict" | "object" => {
                if let Some(img) = image_html(child, ctx) {
                    if !text.is_empty() {
                        out.push(Segment {
                            format,
                            html: std::mem::take(&mut text),
                        });
                    }
                    out.push(Segment {
                        format: RunFormat::default(),
                        html: img,
                    });
                }
            }
            _ => {}
        }
    }

    if !text.is_empty() {
        out.push(Segment { format, html: text });
    }
}

fn run_format(props: Node<'_, '_>) -> RunFormat {
    let mut format = RunFormat::default();

    for child in props.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "b" => format.bold = is_on(child),
            "i" => format.italic = is_on(child),
            "strike" | "dstrike" => format.strike = is_on(child),
            "vertAlign" => match child.attribute((W_NS, "val")) {
                Some("superscript") => format.superscript = true,
                Some("subscript") => format.subscript = true,
                _ => {}
            },
            _ => {}
        }
    }

    format
}

/// Toggle properties are on unless `w:val` explicitly turns them off.
fn is_on(node: Node<'_, '_>) -> bool {
    !matches!(
        node.attribute((W_NS, "val")),
        Some("0") | Some("false") | Some("off")
    )
}

fn hyperlink_href(link: Node<'_, '_>, ctx: &RenderContext<'_>) -> Option<String> {
    if let Some(target) = link
        .attribute((R_NS, "id"))
        .and_then(|id| ctx.links.get(id))
    {
        return Some(target.clone());
    }
    link.attribute((W_NS, "anchor"))
        .map(|anchor| format!("#{anchor}"))
}

fn image_html(node: Node<'_, '_>, ctx: &RenderContext<'_>) -> Option<String> {
    let rel_id = node.descendants().find_map(|n| match n.tag_name().name() {
        "blip" => n.attribute((R_NS, "embed")),
        "imagedata" => n.attribute((R_NS, "id")),
        _ => None,
    })?;

    let Some(src) = ctx.images.get(rel_id) else {
        debug!(rel_id, "image relationship not embedded, skipping");
        return None;
    };

    let alt = node
        .descendants()
        .find(|n| n.tag_name().name() == "docPr")
        .and_then(|n| n.attribute("descr"))
        .unwrap_or_default();

    Some(format!("<img src=\"{src}\" alt=\"{}\" />", escape_html(alt)))
}

/// Wrap a segment in its formatting tags, keeping edge whitespace outside so
/// the Markdown emphasis markers stay valid.
fn wrap_segment(segment: &Segment) -> String {
    let html = segment.html.as_str();
    let core = html.trim();
    if segment.format == RunFormat::default() || core.is_empty() {
        return html.to_string();
    }

    let lead = &html[..html.len() - html.trim_start().len()];
    let trail = &html[html.trim_end().len()..];

    let mut inner = core.to_string();
    let f = segment.format;
    if f.superscript {
        inner = format!("<sup>{inner}</sup>");
    } else if f.subscript {
        inner = format!("<sub>{inner}</sub>");
    }
    if f.strike {
        inner = format!("<s>{inner}</s>");
    }
    if f.italic {
        inner = format!("<em>{inner}</em>");
    }
    if f.bold {
        inner = format!("<strong>{inner}</strong>");
    }

    format!("{lead}{inner}{trail}")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn find_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.tag_name().name() == name)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
