//! `word/numbering.xml`: decides whether a list paragraph is ordered.
//!
//! ```xml
//! <w:abstractNum w:abstractNumId="0">
//!   <w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl>
//! </w:abstractNum>
//! <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
//! ```

use std::collections::HashMap;

use crate::W_NS;

#[derive(Debug, Clone, Default)]
pub(crate) struct Numbering {
    /// abstractNumId → (ilvl → numFmt)
    formats: HashMap<String, HashMap<u32, String>>,
    /// numId → abstractNumId
    nums: HashMap<String, String>,
}

impl Numbering {
    pub(crate) fn parse(xml: &str) -> Result<Self, roxmltree::Error> {
        let doc = roxmltree::Document::parse(xml)?;
        let mut numbering = Self::default();

        for node in doc.root_element().children().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "abstractNum" => {
                    let Some(id) = node.attribute((W_NS, "abstractNumId")) else {
                        continue;
                    };
                    let levels = node
                        .children()
                        .filter(|n| n.tag_name().name() == "lvl")
                        .filter_map(|lvl| {
                            let ilvl = lvl.attribute((W_NS, "ilvl"))?.parse().ok()?;
                            let fmt = lvl
                                .children()
                                .find(|n| n.tag_name().name() == "numFmt")
                                .and_then(|n| n.attribute((W_NS, "val")))?;
                            Some((ilvl, fmt.to_string()))
                        })
                        .collect();
                    numbering.formats.insert(id.to_string(), levels);
                }
                "num" => {
                    let Some(num_id) = node.attribute((W_NS, "numId")) else {
                        continue;
                    };
                    if let Some(abstract_id) = node
                        .children()
                        .find(|n| n.tag_name().name() == "abstractNumId")
                        .and_then(|n| n.attribute((W_NS, "val")))
                    {
                        numbering
                            .nums
                            .insert(num_id.to_string(), abstract_id.to_string());
                    }
                }
                _ => {}
            }
        }

        Ok(numbering)
    }

    /// Unknown numbering definitions render as bullet lists.
    pub(crate) fn is_ordered(&self, num_id: &str, level: u32) -> bool {
        self.nums
            .get(num_id)
            .and_then(|abstract_id| self.formats.get(abstract_id))
            .and_then(|levels| levels.get(&level))
            .is_some_and(|fmt| fmt != "bullet" && fmt != "none")
    }
}
