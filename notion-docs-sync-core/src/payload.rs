//! Serialisation of [`Block`]s into Notion API payloads, and the fingerprints
//! used to decide whether a page needs rewriting.

use serde::Serialize;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::block::{Annotations, Block, RichText};
use crate::contract::RemoteBlock;

/// Maximum length of a single rich text `content` string.
pub const MAX_TEXT_LEN: usize = 2000;
/// Maximum number of blocks in one append request.
pub const MAX_BLOCKS_PER_REQUEST: usize = 100;

/// A block payload ready to send, with the children that must be appended
/// beneath it once it exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedBlock {
    pub payload: Value,
    pub children: Vec<PlannedBlock>,
}

impl PlannedBlock {
    fn leaf(payload: Value) -> Self {
        Self {
            payload,
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> &str {
        self.payload
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

pub fn plan_all(blocks: &[Block]) -> Vec<PlannedBlock> {
    blocks.iter().map(plan).collect()
}

pub fn plan(block: &Block) -> PlannedBlock {
    match block {
        Block::Paragraph { text } => PlannedBlock::leaf(typed("paragraph", rich_body(text))),
        Block::Heading { level, text } => {
            let kind = format!("heading_{}", (*level).clamp(1, 3));
            PlannedBlock::leaf(typed(&kind, rich_body(text)))
        }
        Block::Quote { text } => PlannedBlock::leaf(typed("quote", rich_body(text))),
        Block::Code { language, content } => {
            let language = language
                .map(str::to_lowercase)
                .unwrap_or_else(|| "plain text".to_string());
            PlannedBlock::leaf(typed(
                "code",
                json!({
                    "rich_text": text_objects(content, Annotations::default(), None),
                    "language": language,
                }),
            ))
        }
        Block::Divider => PlannedBlock::leaf(typed("divider", json!({}))),
        Block::BulletedListItem { text, children } => PlannedBlock {
            payload: typed("bulleted_list_item", rich_body(text)),
            children: plan_all(children),
        },
        Block::NumberedListItem { text, children } => PlannedBlock {
            payload: typed("numbered_list_item", rich_body(text)),
            children: plan_all(children),
        },
        Block::ToDo {
            checked,
            text,
            children,
        } => PlannedBlock {
            payload: typed(
                "to_do",
                json!({ "rich_text": rich_text(text), "checked": checked }),
            ),
            children: plan_all(children),
        },
        Block::Image { source, caption } => plan_image(source, caption),
        Block::Table { header, rows } => plan_table(header, rows),
    }
}

fn plan_image(source: &str, caption: &str) -> PlannedBlock {
    if is_web_url(source) {
        return PlannedBlock::leaf(typed(
            "image",
            json!({
                "type": "external",
                "external": { "url": source },
                "caption": text_objects(caption, Annotations::default(), None),
            }),
        ));
    }
    // Local files cannot be referenced by the API.
    warn!(source = %source, "Image is not a web URL and cannot be embedded, writing its caption instead");
    let text = if caption.is_empty() {
        source.to_string()
    } else {
        format!("{caption} ({source})")
    };
    PlannedBlock::leaf(typed("paragraph", rich_body(&[RichText::plain(text)])))
}

fn plan_table(header: &[Vec<RichText>], rows: &[Vec<Vec<RichText>>]) -> PlannedBlock {
    let width = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
        .max(1);

    let row_payload = |cells: &[Vec<RichText>]| {
        let mut cells: Vec<Value> = cells.iter().map(|c| rich_text(c)).collect();
        cells.resize(width, Value::Array(Vec::new()));
        typed("table_row", json!({ "cells": cells }))
    };

    let table_rows: Vec<Value> = std::iter::once(header)
        .chain(rows.iter().map(Vec::as_slice))
        .map(row_payload)
        .collect();

    PlannedBlock::leaf(typed(
        "table",
        json!({
            "table_width": width,
            "has_column_header": true,
            "has_row_header": false,
            "children": table_rows,
        }),
    ))
}

fn typed(kind: &str, body: Value) -> Value {
    let mut object = Map::new();
    object.insert("object".into(), json!("block"));
    object.insert("type".into(), json!(kind));
    object.insert(kind.into(), body);
    Value::Object(object)
}

fn rich_body(spans: &[RichText]) -> Value {
    json!({ "rich_text": rich_text(spans) })
}

fn rich_text(spans: &[RichText]) -> Value {
    Value::Array(
        spans
            .iter()
            .flat_map(|span| text_objects(&span.content, span.annotations, span.link.as_deref()))
            .collect(),
    )
}

/// One or more API text objects for `content`, split at [`MAX_TEXT_LEN`]
/// characters.
fn text_objects(content: &str, annotations: Annotations, link: Option<&str>) -> Vec<Value> {
    // Relative links (to sibling markdown files, anchors) are rejected by the API.
    let link = link.filter(|l| is_web_url(l) || l.starts_with("mailto:"));
    let chars: Vec<char> = content.chars().collect();
    chars
        .chunks(MAX_TEXT_LEN)
        .map(|chunk| {
            let chunk: String = chunk.iter().collect();
            json!({
                "type": "text",
                "text": {
                    "content": chunk,
                    "link": link.map(|url| json!({ "url": url })),
                },
                "annotations": {
                    "bold": annotations.bold,
                    "italic": annotations.italic,
                    "strikethrough": annotations.strikethrough,
                    "underline": false,
                    "code": annotations.code,
                    "color": "default",
                },
            })
        })
        .collect()
}

fn is_web_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// One run of rich text, normalised so that the API's response and our own
/// payload compare equal when they render the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub content: String,
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: String,
    pub link: Option<String>,
}

impl Span {
    fn same_format(&self, other: &Span) -> bool {
        self.bold == other.bold
            && self.italic == other.italic
            && self.strikethrough == other.strikethrough
            && self.underline == other.underline
            && self.code == other.code
            && self.color == other.color
            && self.link == other.link
    }
}

/// Comparable summary of one block, without its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintEntry {
    pub kind: String,
    pub text: Vec<Span>,
    /// Kind specific settings: code language, image url, to-do state,
    /// table shape and table row cells.
    pub attributes: Value,
    pub has_children: bool,
}

/// A [`FingerprintEntry`] with the fingerprints of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintTree {
    pub entry: FingerprintEntry,
    pub children: Vec<FingerprintTree>,
}

/// Fingerprints of everything a plan sends, nested children and table rows
/// included.
pub fn fingerprint_planned(blocks: &[PlannedBlock]) -> Vec<FingerprintTree> {
    blocks.iter().map(planned_tree).collect()
}

fn planned_tree(block: &PlannedBlock) -> FingerprintTree {
    let kind = block.kind();
    let body = block.payload.get(kind).unwrap_or(&Value::Null);

    // Table rows travel inside the table payload but come back as children.
    let mut children: Vec<FingerprintTree> = body
        .get("children")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| payload_tree(row, Vec::new()))
                .collect()
        })
        .unwrap_or_default();
    children.extend(block.children.iter().map(planned_tree));

    FingerprintTree {
        entry: fingerprint_body(kind, body, !children.is_empty()),
        children,
    }
}

fn payload_tree(payload: &Value, children: Vec<FingerprintTree>) -> FingerprintTree {
    let kind = payload.get("type").and_then(Value::as_str).unwrap_or_default();
    let body = payload.get(kind).unwrap_or(&Value::Null);
    FingerprintTree {
        entry: fingerprint_body(kind, body, !children.is_empty()),
        children,
    }
}

/// Fingerprint of one remote block as listed; its children are compared
/// separately.
pub fn fingerprint_remote(block: &RemoteBlock) -> FingerprintEntry {
    fingerprint_body(&block.kind, &block.body, block.has_children)
}

fn fingerprint_body(kind: &str, body: &Value, has_children: bool) -> FingerprintEntry {
    let text = body
        .get("rich_text")
        .or_else(|| body.get("caption"))
        .map(spans)
        .unwrap_or_default();

    let attributes = match kind {
        "code" => json!({ "language": body.get("language") }),
        "to_do" => json!({ "checked": body.get("checked").and_then(Value::as_bool).unwrap_or(false) }),
        "image" => json!({
            "url": body
                .pointer("/external/url")
                .or_else(|| body.pointer("/file/url"))
        }),
        "table" => json!({
            "table_width": body.get("table_width"),
            "has_column_header": body.get("has_column_header").and_then(Value::as_bool).unwrap_or(false),
            "has_row_header": body.get("has_row_header").and_then(Value::as_bool).unwrap_or(false),
        }),
        "table_row" => {
            let cells: Vec<Value> = body
                .get("cells")
                .and_then(Value::as_array)
                .map(|cells| cells.iter().map(|c| spans_value(&spans(c))).collect())
                .unwrap_or_default();
            json!({ "cells": cells })
        }
        _ => Value::Null,
    };

    FingerprintEntry {
        kind: kind.to_string(),
        text,
        attributes,
        has_children,
    }
}

/// Normalise an API rich text array: empty runs dropped, neighbouring runs
/// with the same formatting merged.
fn spans(rich_text: &Value) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::new();
    for item in rich_text.as_array().into_iter().flatten() {
        let content = item
            .pointer("/text/content")
            .or_else(|| item.get("plain_text"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if content.is_empty() {
            continue;
        }
        let flag = |name: &str| {
            item.get("annotations")
                .and_then(|a| a.get(name))
                .and_then(Value::as_bool)
                .unwrap_or(false)
        };
        let span = Span {
            content: content.to_string(),
            bold: flag("bold"),
            italic: flag("italic"),
            strikethrough: flag("strikethrough"),
            underline: flag("underline"),
            code: flag("code"),
            color: item
                .pointer("/annotations/color")
                .and_then(Value::as_str)
                .unwrap_or("default")
                .to_string(),
            link: item
                .pointer("/text/link/url")
                .and_then(Value::as_str)
                .map(str::to_string),
        };
        match out.last_mut() {
            Some(last) if last.same_format(&span) => last.content.push_str(&span.content),
            _ => out.push(span),
        }
    }
    out
}

fn spans_value(spans: &[Span]) -> Value {
    Value::Array(
        spans
            .iter()
            .map(|s| {
                json!([
                    s.content, s.bold, s.italic, s.strikethrough, s.underline, s.code, s.color, s.link
                ])
            })
            .collect(),
    )
}

/// Hex sha256 of the full planned payload tree.
pub fn content_hash(blocks: &[PlannedBlock]) -> String {
    let bytes = serde_json::to_vec(blocks).unwrap_or_default();
    format!("{:x}", Sha256::digest(&bytes))
}
