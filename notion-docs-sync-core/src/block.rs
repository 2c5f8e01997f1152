//! Block model: the in-memory description of a Notion page body.
//!
//! A converted markdown document is a flat `Vec<Block>` where only list items
//! and to-dos carry nested children. Inline formatting lives in [`RichText`]
//! spans rather than in markdown markers, since the Notion API represents
//! annotations structurally.

use serde::Serialize;

/// Inline formatting flags for a span of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
}

impl Annotations {
    pub fn is_plain(&self) -> bool {
        *self == Annotations::default()
    }
}

/// A run of text sharing the same annotations and link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichText {
    pub content: String,
    pub annotations: Annotations,
    pub link: Option<String>,
}

impl RichText {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            annotations: Annotations::default(),
            link: None,
        }
    }
}

/// Concatenate the text of a sequence of spans, dropping all formatting.
pub fn plain_text(spans: &[RichText]) -> String {
    spans.iter().map(|s| s.content.as_str()).collect()
}

/// Append `span` to `spans`, merging it into the previous span when the
/// formatting is identical.
pub fn push_span(spans: &mut Vec<RichText>, span: RichText) {
    if span.content.is_empty() {
        return;
    }
    if let Some(last) = spans.last_mut() {
        if last.annotations == span.annotations && last.link == span.link {
            last.content.push_str(&span.content);
            return;
        }
    }
    spans.push(span);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        text: Vec<RichText>,
    },
    /// Notion only has three heading levels; `level` is always 1..=3.
    Heading {
        level: u8,
        text: Vec<RichText>,
    },
    Quote {
        text: Vec<RichText>,
    },
    Code {
        /// Display name from [`CODE_LANGUAGES`], or `None` when unmatched.
        language: Option<&'static str>,
        content: String,
    },
    Divider,
    BulletedListItem {
        text: Vec<RichText>,
        children: Vec<Block>,
    },
    NumberedListItem {
        text: Vec<RichText>,
        children: Vec<Block>,
    },
    ToDo {
        checked: bool,
        text: Vec<RichText>,
        children: Vec<Block>,
    },
    Image {
        source: String,
        caption: String,
    },
    Table {
        header: Vec<Vec<RichText>>,
        rows: Vec<Vec<Vec<RichText>>>,
    },
}

impl Block {
    pub fn paragraph(text: &str) -> Self {
        Block::Paragraph {
            text: vec![RichText::plain(text)],
        }
    }

    /// Nested blocks that have to be appended beneath this one.
    pub fn children(&self) -> &[Block] {
        match self {
            Block::BulletedListItem { children, .. }
            | Block::NumberedListItem { children, .. }
            | Block::ToDo { children, .. } => children,
            _ => &[],
        }
    }
}

/// Language names accepted by Notion code blocks, in matching order.
pub const CODE_LANGUAGES: &[&str] = &[
    "ABAP",
    "Arduino",
    "Bash",
    "BASIC",
    "C",
    "Clojure",
    "CoffeeScript",
    "C++",
    "C#",
    "CSS",
    "Dart",
    "Diff",
    "Docker",
    "Elixir",
    "Elm",
    "Erlang",
    "Flow",
    "Fortran",
    "F#",
    "Gherkin",
    "GLSL",
    "Go",
    "GraphQL",
    "Groovy",
    "Haskell",
    "HTML",
    "Java",
    "JavaScript",
    "JSON",
    "Kotlin",
    "LaTeX",
    "Less",
    "Lisp",
    "LiveScript",
    "Lua",
    "Makefile",
    "Markdown",
    "Markup",
    "MATLAB",
    "Nix",
    "Objective-C",
    "OCaml",
    "Pascal",
    "Perl",
    "PHP",
    "Plain Text",
    "PowerShell",
    "Prolog",
    "Python",
    "R",
    "Reason",
    "Ruby",
    "Rust",
    "Sass",
    "Scala",
    "Scheme",
    "Scss",
    "Shell",
    "SQL",
    "Swift",
    "TypeScript",
    "VB.Net",
    "Verilog",
    "VHDL",
    "Visual Basic",
    "WebAssembly",
    "XML",
    "YAML",
];

pub const PLAIN_TEXT: &str = "Plain Text";

/// Resolve a fence info string to a Notion language name.
///
/// The first language whose name starts with `tag` (case-insensitively) wins,
/// so `py` resolves to `Python` and `c` to `C`. An empty tag is plain text.
pub fn match_language(tag: &str) -> Option<&'static str> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Some(PLAIN_TEXT);
    }
    let tag = tag.to_lowercase();
    CODE_LANGUAGES
        .iter()
        .copied()
        .find(|lang| lang.to_lowercase().starts_with(&tag))
}
