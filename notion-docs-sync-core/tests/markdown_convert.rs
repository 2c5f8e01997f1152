use notion_docs_sync_core::block::{plain_text, Annotations, Block, RichText, PLAIN_TEXT};
use notion_docs_sync_core::markdown::convert;

fn styled(content: &str, annotations: Annotations) -> RichText {
    RichText {
        content: content.to_string(),
        annotations,
        link: None,
    }
}

fn text_of(block: &Block) -> String {
    match block {
        Block::Paragraph { text }
        | Block::Heading { text, .. }
        | Block::Quote { text }
        | Block::BulletedListItem { text, .. }
        | Block::NumberedListItem { text, .. }
        | Block::ToDo { text, .. } => plain_text(text),
        other => panic!("block has no rich text: {other:?}"),
    }
}

#[test]
fn headings_deeper_than_three_are_clamped() {
    let blocks = convert("# One\n\n## Two\n\n#### Four\n");
    let levels: Vec<u8> = blocks
        .iter()
        .map(|b| match b {
            Block::Heading { level, .. } => *level,
            other => panic!("expected heading, got {other:?}"),
        })
        .collect();
    assert_eq!(levels, vec![1, 2, 3]);
    assert_eq!(text_of(&blocks[2]), "Four");
}

#[test]
fn inline_formatting_becomes_annotations() {
    let blocks = convert("Some **bold**, *it*, `code`, ~~gone~~ and [link](https://example.com).");
    assert_eq!(blocks.len(), 1);
    let Block::Paragraph { text } = &blocks[0] else {
        panic!("expected paragraph, got {:?}", blocks[0]);
    };

    let bold = Annotations {
        bold: true,
        ..Default::default()
    };
    let italic = Annotations {
        italic: true,
        ..Default::default()
    };
    let code = Annotations {
        code: true,
        ..Default::default()
    };
    let strike = Annotations {
        strikethrough: true,
        ..Default::default()
    };
    let expected = vec![
        RichText::plain("Some "),
        styled("bold", bold),
        RichText::plain(", "),
        styled("it", italic),
        RichText::plain(", "),
        styled("code", code),
        RichText::plain(", "),
        styled("gone", strike),
        RichText::plain(" and "),
        RichText {
            content: "link".to_string(),
            annotations: Annotations::default(),
            link: Some("https://example.com".to_string()),
        },
        RichText::plain("."),
    ];
    assert_eq!(text, &expected);
}

#[test]
fn nested_emphasis_combines_annotations() {
    let blocks = convert("***both***");
    let Block::Paragraph { text } = &blocks[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(text.len(), 1);
    assert!(text[0].annotations.bold);
    assert!(text[0].annotations.italic);
}

#[test]
fn line_breaks_become_spaces() {
    let blocks = convert("line one\nline two");
    assert_eq!(blocks.len(), 1);
    assert_eq!(text_of(&blocks[0]), "line one line two");
}

#[test]
fn code_block_languages_are_matched() {
    let blocks = convert("```py\nprint(1)\n```\n\n```\nplain\n```\n\n```brainfuck\n+\n```\n");
    assert_eq!(
        blocks,
        vec![
            Block::Code {
                language: Some("Python"),
                content: "print(1)".to_string(),
            },
            Block::Code {
                language: Some(PLAIN_TEXT),
                content: "plain".to_string(),
            },
            Block::Code {
                language: None,
                content: "+".to_string(),
            },
        ]
    );
}

#[test]
fn thematic_break_is_a_divider() {
    let blocks = convert("above\n\n---\n\nbelow\n");
    assert_eq!(
        blocks,
        vec![
            Block::paragraph("above"),
            Block::Divider,
            Block::paragraph("below")
        ]
    );
}

#[test]
fn images_are_lifted_out_of_paragraphs() {
    let blocks = convert("See ![diagram](https://example.com/d.png) here");
    assert_eq!(blocks.len(), 2);
    assert_eq!(text_of(&blocks[0]), "See  here");
    assert_eq!(
        blocks[1],
        Block::Image {
            source: "https://example.com/d.png".to_string(),
            caption: "diagram".to_string(),
        }
    );
}

#[test]
fn image_title_wins_over_alt_text() {
    let blocks = convert("![alt text](https://example.com/a.png \"The Title\")");
    assert_eq!(
        blocks,
        vec![Block::Image {
            source: "https://example.com/a.png".to_string(),
            caption: "The Title".to_string(),
        }]
    );
}

#[test]
fn nested_lists_become_item_children() {
    let blocks = convert("- one\n- two\n  1. nested\n");
    assert_eq!(blocks.len(), 2);

    let Block::BulletedListItem { text, children } = &blocks[0] else {
        panic!("expected bulleted item, got {:?}", blocks[0]);
    };
    assert_eq!(plain_text(text), "one");
    assert!(children.is_empty());

    let Block::BulletedListItem { text, children } = &blocks[1] else {
        panic!("expected bulleted item, got {:?}", blocks[1]);
    };
    assert_eq!(plain_text(text), "two");
    assert_eq!(children.len(), 1);
    assert!(matches!(children[0], Block::NumberedListItem { .. }));
    assert_eq!(text_of(&children[0]), "nested");
}

#[test]
fn loose_list_items_keep_their_text() {
    let blocks = convert("1. first\n\n2. second\n");
    let texts: Vec<String> = blocks.iter().map(text_of).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert!(blocks
        .iter()
        .all(|b| matches!(b, Block::NumberedListItem { .. })));
}

#[test]
fn task_list_items_become_to_dos() {
    let blocks = convert("- [x] done\n- [ ] todo\n");
    assert_eq!(blocks.len(), 2);
    match (&blocks[0], &blocks[1]) {
        (
            Block::ToDo {
                checked: true,
                text: first,
                ..
            },
            Block::ToDo {
                checked: false,
                text: second,
                ..
            },
        ) => {
            assert_eq!(plain_text(first).trim(), "done");
            assert_eq!(plain_text(second).trim(), "todo");
        }
        other => panic!("expected two to-dos, got {other:?}"),
    }
}

#[test]
fn quote_paragraphs_are_joined() {
    let blocks = convert("> first\n>\n> second\n");
    assert_eq!(blocks.len(), 1);
    assert!(matches!(blocks[0], Block::Quote { .. }));
    assert_eq!(text_of(&blocks[0]), "first\nsecond");
}

#[test]
fn tables_keep_header_and_rows() {
    let blocks = convert("| a | b |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n");
    assert_eq!(blocks.len(), 1);
    let Block::Table { header, rows } = &blocks[0] else {
        panic!("expected table, got {:?}", blocks[0]);
    };
    let cells = |row: &Vec<Vec<RichText>>| -> Vec<String> {
        row.iter().map(|c| plain_text(c).trim().to_string()).collect()
    };
    assert_eq!(cells(header), vec!["a", "b"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(cells(&rows[0]), vec!["1", "2"]);
    assert_eq!(cells(&rows[1]), vec!["3", "4"]);
}

#[test]
fn raw_html_is_skipped() {
    let blocks = convert("<div>\nhidden\n</div>\n\ntext\n");
    assert_eq!(blocks, vec![Block::paragraph("text")]);
}

#[test]
fn empty_document_has_no_blocks() {
    assert!(convert("").is_empty());
    assert!(convert("\n\n   \n").is_empty());
}
