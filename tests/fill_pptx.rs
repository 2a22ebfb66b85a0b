mod common;

use std::collections::HashMap;
use std::path::PathBuf;

use common::{init_logs, pptx_bytes, write_file, xlsx_bytes, PNG_2X1};
use docfill::{fill_template, FillError, Presentation, UploadedFile};
use tempfile::{tempdir, TempDir};

fn text_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn fill_pptx(
    slides: &[&[&str]],
    files: HashMap<String, UploadedFile>,
    texts: HashMap<String, String>,
) -> (TempDir, PathBuf) {
    init_logs();
    let dir = tempdir().unwrap();
    let template = write_file(dir.path(), "deck.pptx", &pptx_bytes(slides));
    let out = dir.path().join("filled.pptx");
    fill_template(&template, &files, &texts, &out).unwrap();
    (dir, out)
}

#[test]
fn replaces_text_across_slides_and_shapes() {
    let (_dir, out) = fill_pptx(
        &[&["Hello {NAME}"], &["{NAME} again", "static text"]],
        HashMap::new(),
        text_map(&[("NAME", "Ada")]),
    );
    let deck = Presentation::open(&out).unwrap();
    assert_eq!(
        deck.slide_texts(),
        vec![
            vec!["Hello Ada".to_string()],
            vec!["Ada again".to_string(), "static text".to_string()],
        ]
    );
}

#[test]
fn missing_binding_substitutes_empty_string() {
    let (_dir, out) = fill_pptx(&[&["x {GONE} y"]], HashMap::new(), HashMap::new());
    let deck = Presentation::open(&out).unwrap();
    assert_eq!(deck.slide_texts(), vec![vec!["x  y".to_string()]]);
}

#[test]
fn image_binding_becomes_the_literal_notice() {
    let mut files = HashMap::new();
    files.insert(
        "PIC".to_string(),
        UploadedFile::new("photo.png", PNG_2X1.to_vec()),
    );
    let (_dir, out) = fill_pptx(&[&["see {PIC} here"]], files, HashMap::new());
    let deck = Presentation::open(&out).unwrap();
    assert_eq!(
        deck.slide_texts(),
        vec![vec![
            "see [IMAGE PLACEHOLDER - INSERT MANUALLY] here".to_string()
        ]]
    );
}

#[test]
fn text_file_binding_keeps_line_structure() {
    let mut files = HashMap::new();
    files.insert(
        "BODY".to_string(),
        UploadedFile::new("notes.txt", b"line one\nline two".to_vec()),
    );
    let (_dir, out) = fill_pptx(&[&["Notes: {BODY}"]], files, HashMap::new());
    let deck = Presentation::open(&out).unwrap();
    assert_eq!(
        deck.slide_texts(),
        vec![vec!["Notes: line one\nline two".to_string()]]
    );
}

#[test]
fn spreadsheet_binding_renders_as_text_table() {
    let sheet = xlsx_bytes(&["Name", "City"], &[&["Ada", "London"]]);
    let mut files = HashMap::new();
    files.insert("TBL".to_string(), UploadedFile::new("data.xlsx", sheet));
    let (_dir, out) = fill_pptx(&[&["{TBL}"]], files, HashMap::new());
    let deck = Presentation::open(&out).unwrap();
    let frame = &deck.slide_texts()[0][0];
    assert!(frame.contains("| Name | City |"), "{}", frame);
    assert!(frame.contains("| Ada | London |"), "{}", frame);
}

#[test]
fn malformed_spreadsheet_degrades_to_inline_marker() {
    let mut files = HashMap::new();
    files.insert(
        "TBL".to_string(),
        UploadedFile::new("broken.xlsx", b"junk".to_vec()),
    );
    let (_dir, out) = fill_pptx(&[&["{TBL}"]], files, HashMap::new());
    let deck = Presentation::open(&out).unwrap();
    let frame = &deck.slide_texts()[0][0];
    assert!(frame.starts_with("[Error reading spreadsheet for TBL"), "{}", frame);
}

#[test]
fn unsupported_template_extension_fails_without_output() {
    init_logs();
    let dir = tempdir().unwrap();
    let template = write_file(dir.path(), "deck.key", &pptx_bytes(&[&["{A}"]]));
    let out = dir.path().join("filled.key");
    let result = fill_template(&template, &HashMap::new(), &HashMap::new(), &out);
    assert!(matches!(result, Err(FillError::UnsupportedFormat(_))));
    assert!(!out.exists());
}
