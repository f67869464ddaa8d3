//! Integration tests for the lopdf-backed compress pipeline.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdf_recompress::{compress_with, CompressError, CompressionMode, LopdfBackend, NoProgress, ProgressObserver};
use std::fs;
use std::path::{Path, PathBuf};

/// Build an uncompressed document with `pages` text-heavy pages.
fn sample_document(pages: u32) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for number in 1..=pages {
        let mut operations = Vec::new();
        for line in 0..40 {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![50.into(), (780 - line * 18).into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(format!("Page {} line {}: the quick brown fox", number, line))],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn write_sample(dir: &Path, name: &str, pages: u32) -> PathBuf {
    let path = dir.join(name);
    sample_document(pages).save(&path).unwrap();
    path
}

fn page_text(doc: &Document, page_number: u32) -> String {
    let page_id = doc.get_pages()[&page_number];
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).to_string()
}

#[derive(Default)]
struct Recorder {
    started: Vec<usize>,
    pages: Vec<(usize, usize)>,
}

impl ProgressObserver for Recorder {
    fn started(&mut self, total: usize) {
        self.started.push(total);
    }

    fn page_done(&mut self, index: usize, total: usize) {
        self.pages.push((index, total));
    }
}

#[test]
fn test_five_page_sample_high_quality() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(dir.path(), "sample.pdf", 5);
    let output = dir.path().join("sample_compressed.pdf");

    let report = compress_with(&LopdfBackend, &input, &output, CompressionMode::HighQuality, &mut NoProgress).unwrap();

    assert_eq!(report.page_count, 5);
    assert_eq!(report.original_size_bytes, fs::metadata(&input).unwrap().len());
    assert!(report.compressed_size_bytes <= report.original_size_bytes);
    assert!(report.reduction_percent > 0.0);

    let text = report.to_string();
    assert!(text.contains("Original size:"));
    assert!(text.contains("Compressed size:"));
    assert!(text.contains("Reduction:"));
    assert!(text.contains("Processing time:"));
}

#[test]
fn test_reported_size_matches_written_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(dir.path(), "in.pdf", 3);

    for (mode, name) in [(CompressionMode::HighQuality, "hq.pdf"), (CompressionMode::Maximum, "max.pdf")] {
        let output = dir.path().join(name);
        let report = compress_with(&LopdfBackend, &input, &output, mode, &mut NoProgress).unwrap();
        assert_eq!(report.compressed_size_bytes, fs::read(&output).unwrap().len() as u64);
    }
}

#[test]
fn test_progress_emitted_once_per_page_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(dir.path(), "in.pdf", 4);
    let output = dir.path().join("out.pdf");

    let mut recorder = Recorder::default();
    compress_with(&LopdfBackend, &input, &output, CompressionMode::HighQuality, &mut recorder).unwrap();

    assert_eq!(recorder.started, vec![4]);
    assert_eq!(recorder.pages, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
}

#[test]
fn test_output_keeps_pages_and_content() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(dir.path(), "in.pdf", 3);

    for mode in [CompressionMode::HighQuality, CompressionMode::Maximum] {
        let output = dir.path().join("out.pdf");
        compress_with(&LopdfBackend, &input, &output, mode, &mut NoProgress).unwrap();

        let doc = Document::load(&output).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
        for number in 1..=3 {
            assert!(page_text(&doc, number).contains(&format!("Page {} line 0", number)));
        }

        // Inherited attributes were moved onto the pages
        let first = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
        assert!(first.has(b"Resources"));
        assert!(first.has(b"MediaBox"));
    }
}

#[test]
fn test_runs_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(dir.path(), "in.pdf", 5);

    for mode in [CompressionMode::HighQuality, CompressionMode::Maximum] {
        let first = dir.path().join("first.pdf");
        let second = dir.path().join("second.pdf");
        let a = compress_with(&LopdfBackend, &input, &first, mode, &mut NoProgress).unwrap();
        let b = compress_with(&LopdfBackend, &input, &second, mode, &mut NoProgress).unwrap();
        assert_eq!(a.compressed_size_bytes, b.compressed_size_bytes);
    }
}

#[test]
fn test_existing_output_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(dir.path(), "in.pdf", 2);
    let output = dir.path().join("out.pdf");
    fs::write(&output, vec![0u8; 1 << 20]).unwrap();

    let report = compress_with(&LopdfBackend, &input, &output, CompressionMode::HighQuality, &mut NoProgress).unwrap();
    assert!(report.compressed_size_bytes < 1 << 20);
    assert!(Document::load(&output).is_ok());
}

#[test]
fn test_missing_input_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("does_not_exist.pdf");
    let output = dir.path().join("out.pdf");

    let err = compress_with(&LopdfBackend, &input, &output, CompressionMode::HighQuality, &mut NoProgress).unwrap_err();
    assert!(matches!(err, CompressError::DocumentRead { .. }));
    assert!(!output.exists());
}

#[test]
fn test_invalid_input_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("not_a.pdf");
    fs::write(&input, b"this is plain text, not a PDF").unwrap();
    let output = dir.path().join("out.pdf");

    let err = compress_with(&LopdfBackend, &input, &output, CompressionMode::HighQuality, &mut NoProgress).unwrap_err();
    assert!(matches!(err, CompressError::DocumentRead { .. }));
    assert!(!output.exists());
}

#[test]
fn test_directory_input_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.pdf");

    let err = compress_with(&LopdfBackend, dir.path(), &output, CompressionMode::HighQuality, &mut NoProgress).unwrap_err();
    assert!(matches!(err, CompressError::DocumentRead { .. }));
}

#[test]
fn test_missing_output_directory_is_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(dir.path(), "in.pdf", 2);
    let output = dir.path().join("no_such_dir").join("out.pdf");

    let err = compress_with(&LopdfBackend, &input, &output, CompressionMode::HighQuality, &mut NoProgress).unwrap_err();
    assert!(matches!(err, CompressError::DocumentWrite { .. }));
    assert_eq!(err.path(), output.as_path());
}

#[test]
fn test_directory_as_output_is_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(dir.path(), "in.pdf", 2);
    let output = dir.path().join("taken");
    fs::create_dir(&output).unwrap();

    let err = compress_with(&LopdfBackend, &input, &output, CompressionMode::Maximum, &mut NoProgress).unwrap_err();
    assert!(matches!(err, CompressError::DocumentWrite { .. }));
}

#[cfg(unix)]
#[test]
fn test_read_only_output_directory_is_write_error() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(dir.path(), "in.pdf", 2);
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // Privileged users write through directory permissions
    let writable = fs::write(locked.join("check"), b"").is_ok();
    let result = if writable {
        None
    } else {
        let output = locked.join("out.pdf");
        Some(compress_with(&LopdfBackend, &input, &output, CompressionMode::HighQuality, &mut NoProgress))
    };
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    if let Some(result) = result {
        assert!(matches!(result.unwrap_err(), CompressError::DocumentWrite { .. }));
        assert!(!locked.join("out.pdf").exists());
    }
}
