use notion_docs_sync_core::block::{Annotations, Block, RichText};
use notion_docs_sync_core::contract::RemoteBlock;
use notion_docs_sync_core::markdown::convert;
use notion_docs_sync_core::payload::{
    content_hash, fingerprint_planned, fingerprint_remote, plan, plan_all, MAX_TEXT_LEN,
};
use serde_json::json;

#[test]
fn test_plan_paragraph_carries_annotations_and_links() {
    let block = Block::Paragraph {
        text: vec![
            RichText {
                content: "bold".to_string(),
                annotations: Annotations {
                    bold: true,
                    ..Default::default()
                },
                link: None,
            },
            RichText {
                content: "site".to_string(),
                annotations: Annotations::default(),
                link: Some("https://example.com".to_string()),
            },
        ],
    };

    let planned = plan(&block);
    assert!(planned.children.is_empty());
    assert_eq!(planned.payload["object"], "block");
    assert_eq!(planned.payload["type"], "paragraph");

    let rich = planned.payload["paragraph"]["rich_text"].as_array().unwrap();
    assert_eq!(rich.len(), 2);
    assert_eq!(rich[0]["text"]["content"], "bold");
    assert_eq!(rich[0]["annotations"]["bold"], true);
    assert_eq!(rich[0]["text"]["link"], json!(null));
    assert_eq!(rich[1]["text"]["link"]["url"], "https://example.com");
}

#[test]
fn test_plan_drops_links_the_api_would_reject() {
    let block = Block::Paragraph {
        text: vec![RichText {
            content: "sibling".to_string(),
            annotations: Annotations::default(),
            link: Some("other.md#anchor".to_string()),
        }],
    };
    let planned = plan(&block);
    assert_eq!(
        planned.payload["paragraph"]["rich_text"][0]["text"]["link"],
        json!(null)
    );
    assert_eq!(
        planned.payload["paragraph"]["rich_text"][0]["text"]["content"],
        "sibling"
    );
}

#[test]
fn test_plan_splits_long_text() {
    let long = "x".repeat(MAX_TEXT_LEN * 2 + 10);
    let planned = plan(&Block::paragraph(&long));
    let rich = planned.payload["paragraph"]["rich_text"].as_array().unwrap();
    assert_eq!(rich.len(), 3);
    assert_eq!(
        rich[0]["text"]["content"].as_str().unwrap().chars().count(),
        MAX_TEXT_LEN
    );
    assert_eq!(rich[2]["text"]["content"].as_str().unwrap().len(), 10);
}

#[test]
fn test_plan_headings_code_and_divider() {
    let planned = plan_all(&[
        Block::Heading {
            level: 2,
            text: vec![RichText::plain("Title")],
        },
        Block::Code {
            language: Some("C++"),
            content: "int main() {}".to_string(),
        },
        Block::Code {
            language: None,
            content: "???".to_string(),
        },
        Block::Divider,
    ]);
    assert_eq!(planned[0].payload["type"], "heading_2");
    assert_eq!(planned[1].payload["code"]["language"], "c++");
    assert_eq!(
        planned[1].payload["code"]["rich_text"][0]["text"]["content"],
        "int main() {}"
    );
    assert_eq!(planned[2].payload["code"]["language"], "plain text");
    assert_eq!(planned[3].payload, json!({"object": "block", "type": "divider", "divider": {}}));
}

#[test]
fn test_plan_list_children_are_kept_separate() {
    let blocks = convert("- [ ] parent\n  1. child\n");
    let planned = plan_all(&blocks);
    assert_eq!(planned.len(), 1);
    assert_eq!(planned[0].payload["type"], "to_do");
    assert_eq!(planned[0].payload["to_do"]["checked"], false);
    assert!(planned[0].payload["to_do"].get("children").is_none());
    assert_eq!(planned[0].children.len(), 1);
    assert_eq!(planned[0].children[0].payload["type"], "numbered_list_item");
}

#[test]
fn test_plan_images() {
    let web = plan(&Block::Image {
        source: "https://example.com/a.png".to_string(),
        caption: "A".to_string(),
    });
    assert_eq!(web.payload["type"], "image");
    assert_eq!(web.payload["image"]["external"]["url"], "https://example.com/a.png");
    assert_eq!(web.payload["image"]["caption"][0]["text"]["content"], "A");

    let local = plan(&Block::Image {
        source: "img/a.png".to_string(),
        caption: "A".to_string(),
    });
    assert_eq!(local.payload["type"], "paragraph");
    assert_eq!(
        local.payload["paragraph"]["rich_text"][0]["text"]["content"],
        "A (img/a.png)"
    );
}

#[test]
fn test_plan_table_pads_rows_to_width() {
    let cell = |s: &str| vec![RichText::plain(s)];
    let planned = plan(&Block::Table {
        header: vec![cell("a"), cell("b"), cell("c")],
        rows: vec![vec![cell("1")]],
    });
    let table = &planned.payload["table"];
    assert_eq!(table["table_width"], 3);
    assert_eq!(table["has_column_header"], true);

    let rows = table["children"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["type"], "table_row");
    assert_eq!(rows[1]["table_row"]["cells"].as_array().unwrap().len(), 3);
    assert_eq!(rows[1]["table_row"]["cells"][2], json!([]));
}

#[test]
fn test_fingerprints_match_equivalent_remote_content() {
    let planned = fingerprint_planned(&plan_all(&convert("# Intro\n\nHello **world**\n\n---\n")));
    let remote_blocks = vec![
        remote("heading_1", json!({ "rich_text": [text_run("Intro", false)] }), false),
        remote(
            "paragraph",
            json!({ "rich_text": [text_run("Hel", false), text_run("lo ", false), text_run("world", true)] }),
            false,
        ),
        remote("divider", json!({}), false),
    ];

    let entries: Vec<_> = planned.iter().map(|tree| tree.entry.clone()).collect();
    let listed: Vec<_> = remote_blocks.iter().map(fingerprint_remote).collect();
    assert_eq!(entries, listed);
}

#[test]
fn test_fingerprints_see_formatting_and_attributes() {
    let bold = fingerprint_planned(&plan_all(&convert("**Hello**")));
    let plain = fingerprint_remote(&remote(
        "paragraph",
        json!({ "rich_text": [text_run("Hello", false)] }),
        false,
    ));
    assert_ne!(bold[0].entry, plain);

    let code = fingerprint_planned(&plan_all(&convert("```rust\nfn main() {}\n```\n")));
    assert_eq!(code[0].entry.attributes, json!({ "language": "rust" }));
}

#[test]
fn test_fingerprints_carry_nested_children_and_table_rows() {
    let lists = fingerprint_planned(&plan_all(&convert("- parent\n  - child\n")));
    assert!(lists[0].entry.has_children);
    assert_eq!(lists[0].children.len(), 1);
    assert_eq!(lists[0].children[0].entry.text[0].content, "child");

    let tables = fingerprint_planned(&plan_all(&convert("| a | b |\n|---|---|\n| 1 | 2 |\n")));
    assert_eq!(tables[0].entry.kind, "table");
    assert!(tables[0].entry.has_children);
    assert_eq!(tables[0].children.len(), 2);
    assert_eq!(tables[0].children[1].entry.kind, "table_row");
    assert_ne!(tables[0].children[0].entry, tables[0].children[1].entry);
}

#[test]
fn test_content_hash_is_stable_and_content_sensitive() {
    let a = plan_all(&convert("Hello"));
    let b = plan_all(&convert("Hello"));
    let c = plan_all(&convert("Hello!"));
    assert_eq!(content_hash(&a), content_hash(&b));
    assert_ne!(content_hash(&a), content_hash(&c));
    assert_eq!(content_hash(&a).len(), 64);
}

fn remote(kind: &str, body: serde_json::Value, has_children: bool) -> RemoteBlock {
    RemoteBlock {
        id: format!("{kind}-id"),
        kind: kind.to_string(),
        has_children,
        body,
        child_page_title: None,
    }
}

fn text_run(content: &str, bold: bool) -> serde_json::Value {
    json!({
        "type": "text",
        "text": { "content": content, "link": null },
        "annotations": { "bold": bold, "italic": false, "strikethrough": false, "underline": false, "code": false, "color": "default" },
        "plain_text": content
    })
}
