//! Tagged-block extractor for generated tool output
//!
//! Model output is expected to look like
//!
//! ```text
//! <tool id="sticker">
//! <file name="tool.ts">...</file>
//! <file name="icon.svg">...</file>
//! </tool>
//! ```
//!
//! but nothing guarantees it is well-formed XML. Blocks are located by literal
//! anchor search rather than a markup parser, so extra attributes, attribute
//! order and stray angle brackets inside file bodies are all tolerated. File
//! bodies are passed through byte-for-byte: no trimming, no entity unescaping.
//! Nested `<file>` blocks are not supported.

use thiserror::Error;

const OUTER_OPEN: &str = "<tool";
const INNER_OPEN: &str = "<file";
const INNER_CLOSE: &str = "</file>";
const TAG_END: &str = ">";

const ID_ATTR: &str = "id";
const NAME_ATTR: &str = "name";

/// One `<file name="...">content</file>` span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedBlock {
    /// Value of the `name` attribute, empty when the attribute is absent
    pub name: String,
    pub content: String,
}

/// Outer identifier plus inner blocks in order of appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub id: String,
    pub blocks: Vec<TaggedBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid tool output: missing <tool> tag")]
    MissingOuterTag,

    #[error("invalid tool output: unterminated <file> tag at byte {offset}")]
    MalformedOpenTag { offset: usize },

    #[error("invalid tool output: missing </file> tag for {name:?} opened at byte {offset}")]
    MissingClosingTag { name: String, offset: usize },
}

enum ScanState {
    SeekingOpen,
    SeekingClose {
        name: String,
        open_at: usize,
        body_start: usize,
    },
}

/// Extract the tool id and every `<file>` block from raw model output.
///
/// Zero `<file>` blocks is not an error. A missing `id` or `name` attribute
/// yields an empty string.
pub fn extract(text: &str) -> Result<Extraction, ParseError> {
    let outer_start = text.find(OUTER_OPEN).ok_or(ParseError::MissingOuterTag)?;
    let outer_end = find_from(text, outer_start, TAG_END).ok_or(ParseError::MissingOuterTag)?;
    let id = attribute(&text[outer_start..outer_end], ID_ATTR).unwrap_or_default();

    let mut blocks = Vec::new();
    let mut cursor = outer_end + 1;
    let mut state = ScanState::SeekingOpen;

    loop {
        state = match state {
            ScanState::SeekingOpen => {
                let Some(open_at) = find_from(text, cursor, INNER_OPEN) else {
                    break;
                };
                let tag_end = find_from(text, open_at, TAG_END)
                    .ok_or(ParseError::MalformedOpenTag { offset: open_at })?;
                let name = attribute(&text[open_at..tag_end], NAME_ATTR).unwrap_or_default();

                ScanState::SeekingClose {
                    name: name.to_string(),
                    open_at,
                    body_start: tag_end + 1,
                }
            }
            ScanState::SeekingClose {
                name,
                open_at,
                body_start,
            } => {
                let Some(body_end) = find_from(text, body_start, INNER_CLOSE) else {
                    return Err(ParseError::MissingClosingTag {
                        name,
                        offset: open_at,
                    });
                };

                blocks.push(TaggedBlock {
                    name,
                    content: text[body_start..body_end].to_string(),
                });
                cursor = body_end + INNER_CLOSE.len();
                ScanState::SeekingOpen
            }
        };
    }

    Ok(Extraction {
        id: id.to_string(),
        blocks,
    })
}

/// Absolute index of the next `pat` at or after `from`.
fn find_from(text: &str, from: usize, pat: &str) -> Option<usize> {
    text[from..].find(pat).map(|i| from + i)
}

/// Literal `attr="value"` lookup inside a single tag span.
fn attribute<'a>(tag: &'a str, attr: &str) -> Option<&'a str> {
    let marker = format!("{attr}=\"");
    let start = tag.find(&marker)? + marker.len();
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_id_and_blocks() {
        let out = extract(
            r#"<tool id="sticker"><file name="tool.ts">A</file><file name="icon.svg">B</file></tool>"#,
        )
        .unwrap();

        assert_eq!(out.id, "sticker");
        assert_eq!(
            out.blocks,
            vec![
                TaggedBlock {
                    name: "tool.ts".into(),
                    content: "A".into()
                },
                TaggedBlock {
                    name: "icon.svg".into(),
                    content: "B".into()
                },
            ]
        );
    }

    #[test]
    fn test_missing_outer_tag() {
        let err = extract(r#"<file name="tool.ts">A</file>"#).unwrap_err();
        assert_eq!(err, ParseError::MissingOuterTag);

        assert_eq!(extract("").unwrap_err(), ParseError::MissingOuterTag);
        assert_eq!(
            extract("Sure! Here is your tool.").unwrap_err(),
            ParseError::MissingOuterTag
        );
    }

    #[test]
    fn test_outer_tag_without_end_is_missing() {
        assert_eq!(
            extract(r#"<tool id="x""#).unwrap_err(),
            ParseError::MissingOuterTag
        );
    }

    #[test]
    fn test_missing_closing_tag() {
        let text = format!(
            "<tool id=\"x\">\n<file name=\"util.tsx\">export default 1;\n{}",
            "trailing text with no terminator\n".repeat(50)
        );
        match extract(&text).unwrap_err() {
            ParseError::MissingClosingTag { name, offset } => {
                assert_eq!(name, "util.tsx");
                assert_eq!(offset, text.find("<file").unwrap());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_second_block_unterminated() {
        let err = extract(
            r#"<tool id="x"><file name="tool.ts">ok</file><file name="util.tsx">broken</tool>"#,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::MissingClosingTag { ref name, .. } if name == "util.tsx"));
    }

    #[test]
    fn test_unterminated_open_tag() {
        let err = extract(r#"<tool id="x"><file name="tool.ts""#).unwrap_err();
        assert_eq!(err, ParseError::MalformedOpenTag { offset: 13 });
    }

    #[test]
    fn test_no_inner_blocks() {
        let out = extract(r#"<tool id="empty"></tool>"#).unwrap();
        assert_eq!(out.id, "empty");
        assert!(out.blocks.is_empty());
    }

    #[test]
    fn test_missing_attributes_are_empty() {
        let out = extract("<tool><file>body</file></tool>").unwrap();
        assert_eq!(out.id, "");
        assert_eq!(out.blocks.len(), 1);
        assert_eq!(out.blocks[0].name, "");
        assert_eq!(out.blocks[0].content, "body");
    }

    #[test]
    fn test_extra_attributes_and_order() {
        let out = extract(
            r#"<tool version="2" id="polaroid" kind="box"><file lang="ts" name="tool.ts" x="1">T</file></tool>"#,
        )
        .unwrap();
        assert_eq!(out.id, "polaroid");
        assert_eq!(out.blocks[0].name, "tool.ts");
        assert_eq!(out.blocks[0].content, "T");
    }

    #[test]
    fn test_content_passed_through_verbatim() {
        let body = "\n  <HTMLContainer style={{ pointerEvents: 'all' }}>\n    {a > b && <span>&amp;</span>}\n  </HTMLContainer>\n\n";
        let text = format!("preamble\n<tool id=\"card\">\n<file name=\"util.tsx\">{body}</file>\n</tool>\ntrailer");
        let out = extract(&text).unwrap();
        assert_eq!(out.blocks[0].content, body);
    }

    #[test]
    fn test_text_before_outer_tag_is_ignored() {
        let out = extract(
            r#"<file name="tool.ts">stray</file><tool id="x"><file name="icon.svg">I</file></tool>"#,
        )
        .unwrap();
        assert_eq!(out.id, "x");
        assert_eq!(out.blocks.len(), 1);
        assert_eq!(out.blocks[0].name, "icon.svg");
    }

    #[test]
    fn test_round_trip_any_order() {
        let files = [
            ("tool.ts", "import { StateNode } from 'tldraw'\n\nexport default class T extends StateNode {}\n"),
            ("util.tsx", "\n\treturn <div className=\"p-2\">{x < 3 ? 'a' : 'b'}</div>\n"),
            ("icon.svg", "<svg viewBox=\"0 0 10 10\"><path d=\"M0 0 L10 10\"/></svg>"),
        ];
        let orders = [[0, 1, 2], [2, 0, 1], [1, 2, 0], [2, 1, 0]];

        for order in orders {
            let mut text = String::from("<tool id=\"roundtrip\">\n");
            for &i in &order {
                let (name, body) = files[i];
                text.push_str(&format!("<file name=\"{name}\">{body}</file>\n\n"));
            }
            text.push_str("</tool>\n");

            let out = extract(&text).unwrap();
            assert_eq!(out.id, "roundtrip");
            assert_eq!(out.blocks.len(), 3);
            for (block, &i) in out.blocks.iter().zip(&order) {
                assert_eq!(block.name, files[i].0);
                assert_eq!(block.content, files[i].1);
            }
        }
    }

    #[test]
    fn test_attribute_lookup() {
        assert_eq!(attribute(r#"<file name="a.ts""#, "name"), Some("a.ts"));
        assert_eq!(attribute(r#"<file name="a.ts"#, "name"), None);
        assert_eq!(attribute("<file", "name"), None);
    }
}
