//! `word/styles.xml`: style ids → heading levels.

use std::collections::HashMap;

use crate::W_NS;

/// Paragraph style names keyed by style id.
#[derive(Debug, Clone, Default)]
pub(crate) struct StyleMap {
    names: HashMap<String, String>,
}

impl StyleMap {
    pub(crate) fn parse(xml: &str) -> Result<Self, roxmltree::Error> {
        let doc = roxmltree::Document::parse(xml)?;
        let mut names = HashMap::new();

        for style in doc
            .root_element()
            .children()
            .filter(|n| n.tag_name().name() == "style")
        {
            let Some(id) = style.attribute((W_NS, "styleId")) else {
                continue;
            };
            let name = style
                .children()
                .find(|n| n.tag_name().name() == "name")
                .and_then(|n| n.attribute((W_NS, "val")))
                .unwrap_or(id);
            names.insert(id.to_string(), name.to_string());
        }

        Ok(Self { names })
    }

    /// Heading level (1–6) of a paragraph style, if it is a heading style.
    ///
    /// Localized templates use numeric ids (`"1"`, `"2"`) with English
    /// names (`"heading 1"`), so the name is checked first and the id second.
    pub(crate) fn heading_level(&self, style_id: &str) -> Option<u8> {
        self.names
            .get(style_id)
            .and_then(|name| level_from_name(name))
            .or_else(|| level_from_name(style_id))
    }
}

fn level_from_name(name: &str) -> Option<u8> {
    let name = name.trim().to_lowercase();
    if name == "title" {
        return Some(1);
    }
    let level: u8 = name.strip_prefix("heading")?.trim().parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}
