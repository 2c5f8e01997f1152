use notion_docs_sync_core::config::SyncOptions;
use notion_docs_sync_core::docs::{scan_docs, DocsError};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_scan_docs_finds_markdown_and_skips_hidden_entries() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::create_dir_all(root.join(".hidden")).unwrap();
    fs::write(root.join("a.md"), "# A").unwrap();
    fs::write(root.join("sub/b.markdown"), "B").unwrap();
    fs::write(root.join("sub/.secret.md"), "nope").unwrap();
    fs::write(root.join(".hidden/c.md"), "nope").unwrap();
    fs::write(root.join("notes.txt"), "not markdown").unwrap();

    let docs = scan_docs(root, &SyncOptions::default().extensions).expect("scan should succeed");

    let paths: Vec<PathBuf> = docs.iter().map(|d| d.relative_path.clone()).collect();
    assert_eq!(
        paths,
        vec![PathBuf::from("a.md"), PathBuf::from("sub").join("b.markdown")]
    );
    assert_eq!(docs[0].page_path, vec!["a"]);
    assert_eq!(docs[0].markdown, "# A");
    assert_eq!(docs[1].page_path, vec!["sub", "b"]);
    assert_eq!(docs[1].title(), "b");
}

#[test]
fn test_scan_docs_matches_extensions_case_insensitively() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("README.MD"), "readme").unwrap();
    fs::write(dir.path().join("page.txt"), "text").unwrap();

    let docs = scan_docs(dir.path(), &["md".to_string()]).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].title(), "README");

    let docs = scan_docs(dir.path(), &["txt".to_string()]).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].title(), "page");
}

#[test]
fn test_scan_docs_on_empty_directory_returns_nothing() {
    let dir = tempdir().unwrap();
    let docs = scan_docs(dir.path(), &SyncOptions::default().extensions).unwrap();
    assert!(docs.is_empty());
}

#[test]
fn test_scan_docs_rejects_missing_directory() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");
    let err = scan_docs(&missing, &SyncOptions::default().extensions).unwrap_err();
    assert!(matches!(err, DocsError::NotADirectory(ref p) if *p == missing));
    assert!(err.to_string().contains("is not a directory"));
}

#[test]
fn test_scan_docs_rejects_file_as_root() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("single.md");
    fs::write(&file, "x").unwrap();
    let err = scan_docs(&file, &SyncOptions::default().extensions).unwrap_err();
    assert!(matches!(err, DocsError::NotADirectory(_)));
}
