//! Markdown → [`Block`] conversion.
//!
//! Walks the pulldown-cmark event stream with a small recursive reader: every
//! handler is entered right after its `Start` event and consumes everything up
//! to and including the matching `End`. Nested `Start`s are always delegated to
//! another handler, so the first `End` a handler sees is its own.
//!
//! Conversion rules:
//! - Headings deeper than h3 are clamped to h3.
//! - Images are block-level in Notion, so an image inside a paragraph, heading
//!   or link is lifted out and emitted after the text that contained it.
//! - List item text is the concatenation of the item's inline content; any
//!   nested block (sub-list, code, image) becomes a child of the item.
//! - Line breaks inside a paragraph become a single space.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use tracing::{debug, info};

use crate::block::{match_language, plain_text, push_span, Annotations, Block, RichText};

/// Convert a markdown document into Notion blocks.
pub fn convert(markdown: &str) -> Vec<Block> {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut reader = Reader {
        events: Parser::new_ext(markdown, options),
    };
    let blocks = reader.blocks();
    debug!(blocks = blocks.len(), "Converted markdown document");
    blocks
}

#[derive(Debug, Clone, Default)]
struct Style {
    annotations: Annotations,
    link: Option<String>,
}

impl Style {
    fn span(&self, content: &str) -> RichText {
        RichText {
            content: content.to_string(),
            annotations: self.annotations,
            link: self.link.clone(),
        }
    }
}

/// Result of reading an inline run: the text, plus any blocks (images) that
/// had to be lifted out of it.
#[derive(Debug, Default)]
struct Inline {
    spans: Vec<RichText>,
    blocks: Vec<Block>,
    checked: Option<bool>,
}

impl Inline {
    fn append(&mut self, other: Inline) {
        for span in other.spans {
            push_span(&mut self.spans, span);
        }
        self.blocks.extend(other.blocks);
        if other.checked.is_some() {
            self.checked = other.checked;
        }
    }
}

struct Reader<'a> {
    events: Parser<'a>,
}

impl<'a> Reader<'a> {
    /// Read sibling blocks until the enclosing `End` (or end of input).
    fn blocks(&mut self) -> Vec<Block> {
        let mut out = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Start(tag) => self.block(tag, &mut out),
                Event::Rule => out.push(Block::Divider),
                Event::Html(_) => info!("Raw HTML is not supported in Notion, skipping"),
                other => debug!(event = ?other, "Ignoring stray block-level event"),
            }
        }
        out
    }

    fn block(&mut self, tag: Tag<'a>, out: &mut Vec<Block>) {
        match tag {
            Tag::Paragraph => {
                let inline = self.inline(&Style::default());
                if !inline.spans.is_empty() {
                    out.push(Block::Paragraph { text: inline.spans });
                }
                out.extend(inline.blocks);
            }
            Tag::Heading { level, .. } => {
                let level = heading_level(level);
                let inline = self.inline(&Style::default());
                if !inline.spans.is_empty() {
                    out.push(Block::Heading {
                        level,
                        text: inline.spans,
                    });
                }
                out.extend(inline.blocks);
            }
            Tag::BlockQuote(_) => self.quote(out),
            Tag::CodeBlock(kind) => out.push(self.code(kind)),
            Tag::List(start) => self.list(start.is_some(), out),
            Tag::Item => out.push(self.item(false)),
            Tag::Table(_) => out.push(self.table()),
            Tag::HtmlBlock => {
                info!("Raw HTML block is not supported in Notion, skipping");
                self.skip();
            }
            other => {
                debug!(tag = ?other, "Unsupported markdown element, skipping");
                self.skip();
            }
        }
    }

    /// Quote paragraphs are flattened into the quote's own text; anything
    /// else inside the quote follows it as a sibling block.
    fn quote(&mut self, out: &mut Vec<Block>) {
        let mut text: Vec<RichText> = Vec::new();
        let mut rest = Vec::new();
        for block in self.blocks() {
            match block {
                Block::Paragraph { text: spans } | Block::Quote { text: spans } => {
                    if !text.is_empty() {
                        push_span(&mut text, RichText::plain("\n"));
                    }
                    for span in spans {
                        push_span(&mut text, span);
                    }
                }
                other => rest.push(other),
            }
        }
        if !text.is_empty() {
            out.push(Block::Quote { text });
        }
        out.extend(rest);
    }

    fn code(&mut self, kind: CodeBlockKind<'a>) -> Block {
        let tag = match &kind {
            CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or("").to_string(),
            CodeBlockKind::Indented => String::new(),
        };
        let mut content = String::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Text(text) => content.push_str(&text),
                _ => {}
            }
        }
        // Fenced blocks always end with a newline that Notion would render.
        if content.ends_with('\n') {
            content.pop();
        }
        let language = match_language(&tag);
        if language.is_none() {
            info!(language = %tag, "Code block language has no corresponding syntax in Notion");
        }
        Block::Code { language, content }
    }

    fn list(&mut self, ordered: bool, out: &mut Vec<Block>) {
        while let Some(event) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Start(Tag::Item) => out.push(self.item(ordered)),
                Event::Start(other) => self.block(other, out),
                _ => {}
            }
        }
    }

    fn item(&mut self, ordered: bool) -> Block {
        let mut content = Inline::default();
        let mut children = Vec::new();
        let style = Style::default();

        while let Some(event) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Start(Tag::Paragraph) => {
                    let paragraph = self.inline(&style);
                    if !content.spans.is_empty() && !paragraph.spans.is_empty() {
                        push_span(&mut content.spans, RichText::plain("\n"));
                    }
                    content.append(paragraph);
                }
                Event::Start(tag) if is_inline(&tag) => {
                    let mut nested = Inline::default();
                    self.inline_start(tag, &style, &mut nested);
                    content.append(nested);
                }
                Event::Start(tag) => self.block(tag, &mut children),
                Event::Rule => children.push(Block::Divider),
                other => self.inline_event(other, &style, &mut content),
            }
        }

        // Lifted images come before the item's own nested blocks.
        let mut lifted = std::mem::take(&mut content.blocks);
        lifted.extend(children);
        let children = lifted;
        let text = content.spans;

        match content.checked {
            Some(checked) => Block::ToDo {
                checked,
                text,
                children,
            },
            None if ordered => Block::NumberedListItem { text, children },
            None => Block::BulletedListItem { text, children },
        }
    }

    fn table(&mut self) -> Block {
        let mut header = Vec::new();
        let mut rows = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Start(Tag::TableHead) => header = self.cells(),
                Event::Start(Tag::TableRow) => rows.push(self.cells()),
                Event::Start(_) => self.skip(),
                _ => {}
            }
        }
        Block::Table { header, rows }
    }

    fn cells(&mut self) -> Vec<Vec<RichText>> {
        let mut cells = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Start(Tag::TableCell) => {
                    let cell = self.inline(&Style::default());
                    if !cell.blocks.is_empty() {
                        info!(
                            dropped = cell.blocks.len(),
                            "Table cell contained non-text content (maybe an image?) which cannot be added"
                        );
                    }
                    cells.push(cell.spans);
                }
                Event::Start(_) => self.skip(),
                _ => {}
            }
        }
        cells
    }

    /// Read inline content up to the enclosing `End`.
    fn inline(&mut self, style: &Style) -> Inline {
        let mut out = Inline::default();
        while let Some(event) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Start(tag) => self.inline_start(tag, style, &mut out),
                other => self.inline_event(other, style, &mut out),
            }
        }
        out
    }

    fn inline_start(&mut self, tag: Tag<'a>, style: &Style, out: &mut Inline) {
        match tag {
            Tag::Emphasis => {
                let mut nested = style.clone();
                nested.annotations.italic = true;
                let inner = self.inline(&nested);
                out.append(inner);
            }
            Tag::Strong => {
                let mut nested = style.clone();
                nested.annotations.bold = true;
                let inner = self.inline(&nested);
                out.append(inner);
            }
            Tag::Strikethrough => {
                let mut nested = style.clone();
                nested.annotations.strikethrough = true;
                let inner = self.inline(&nested);
                out.append(inner);
            }
            Tag::Link { dest_url, .. } => {
                let mut nested = style.clone();
                nested.link = Some(dest_url.to_string());
                let inner = self.inline(&nested);
                out.append(inner);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let alt = self.inline(&Style::default());
                let caption = if title.is_empty() {
                    plain_text(&alt.spans)
                } else {
                    title.to_string()
                };
                out.blocks.push(Block::Image {
                    source: dest_url.to_string(),
                    caption,
                });
                out.blocks.extend(alt.blocks);
            }
            other => {
                // Block-level content in an inline position: keep the blocks.
                let mut blocks = Vec::new();
                self.block(other, &mut blocks);
                out.blocks.extend(blocks);
            }
        }
    }

    fn inline_event(&mut self, event: Event<'a>, style: &Style, out: &mut Inline) {
        match event {
            Event::Text(text) => push_span(&mut out.spans, style.span(&text)),
            Event::Code(code) => {
                let mut span = style.span(&code);
                span.annotations.code = true;
                push_span(&mut out.spans, span);
            }
            Event::SoftBreak | Event::HardBreak => push_span(&mut out.spans, style.span(" ")),
            Event::TaskListMarker(checked) => out.checked = Some(checked),
            Event::InlineHtml(_) | Event::Html(_) => {
                info!("Inline HTML is not supported in Notion, skipping")
            }
            Event::FootnoteReference(label) => {
                push_span(&mut out.spans, style.span(&format!("[^{label}]")))
            }
            Event::Rule => out.blocks.push(Block::Divider),
            other => debug!(event = ?other, "Ignoring inline event"),
        }
    }

    /// Consume the remainder of an element whose `Start` was just read.
    fn skip(&mut self) {
        let mut depth = 1usize;
        for event in self.events.by_ref() {
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }
}

fn is_inline(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
    )
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        deeper => {
            info!(level = ?deeper, "Heading level not supported in Notion, converting to h3");
            3
        }
    }
}
