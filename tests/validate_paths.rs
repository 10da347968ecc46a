mod common;

use pdf_to_docx::{
    error::ValidationError,
    inspect::{DocumentInspector, InspectError, LopdfInspector, PdfSummary},
    validate::{validate_input, validate_output},
};
use std::path::Path;

struct EncryptedInspector;

impl DocumentInspector for EncryptedInspector {
    fn open(&self, _path: &Path) -> Result<PdfSummary, InspectError> {
        Err(InspectError::Encrypted)
    }
}

#[test]
fn accepts_a_real_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("doc.pdf");
    common::write_pdf(&pdf, 2);
    validate_input(&LopdfInspector, &pdf).unwrap();
}

#[test]
fn missing_input_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = validate_input(&LopdfInspector, &dir.path().join("nope.pdf")).unwrap_err();
    assert!(matches!(err, ValidationError::NotFound(_)));
}

#[test]
fn directory_input_is_not_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("folder.pdf");
    std::fs::create_dir(&sub).unwrap();
    let err = validate_input(&LopdfInspector, &sub).unwrap_err();
    assert!(matches!(err, ValidationError::NotAFile(_)));
}

#[test]
fn wrong_input_extension() {
    let dir = tempfile::tempdir().unwrap();
    let txt = dir.path().join("notes.txt");
    std::fs::write(&txt, "hello").unwrap();
    let err = validate_input(&LopdfInspector, &txt).unwrap_err();
    assert!(matches!(err, ValidationError::WrongExtension { expected: "pdf", .. }));
}

#[test]
fn uppercase_extension_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("SCAN.PDF");
    common::write_pdf(&pdf, 1);
    validate_input(&LopdfInspector, &pdf).unwrap();
}

#[test]
fn garbage_input_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("broken.pdf");
    std::fs::write(&pdf, b"this is not a pdf at all").unwrap();
    let err = validate_input(&LopdfInspector, &pdf).unwrap_err();
    assert!(matches!(err, ValidationError::Corrupt { .. }));
}

#[test]
fn garbage_mentioning_encryption_is_still_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("junk.pdf");
    std::fs::write(&pdf, b"not a pdf at all, mentions /Encrypt in passing").unwrap();
    let err = validate_input(&LopdfInspector, &pdf).unwrap_err();
    assert!(matches!(err, ValidationError::Corrupt { .. }), "{err:?}");
}

#[test]
fn zero_page_pdf_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("empty.pdf");
    common::write_pdf(&pdf, 0);
    let err = validate_input(&LopdfInspector, &pdf).unwrap_err();
    assert!(matches!(err, ValidationError::Corrupt { .. }), "{err:?}");
}

#[test]
fn encrypted_input_is_left_to_the_converter() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("locked.pdf");
    std::fs::write(&pdf, b"%PDF-1.7 placeholder").unwrap();
    validate_input(&EncryptedInspector, &pdf).unwrap();
}

#[test]
fn encrypted_pdfs_pass_validation() {
    let dir = tempfile::tempdir().unwrap();

    let open = dir.path().join("open.pdf");
    common::write_encrypted_pdf(&open, 2, "");
    validate_input(&LopdfInspector, &open).unwrap();

    let locked = dir.path().join("locked.pdf");
    common::write_encrypted_pdf(&locked, 2, "user-secret");
    validate_input(&LopdfInspector, &locked).unwrap();
}

#[test]
fn output_needs_docx_extension() {
    let dir = tempfile::tempdir().unwrap();
    let err = validate_output(&dir.path().join("out.doc"), false).unwrap_err();
    assert!(matches!(err, ValidationError::WrongExtension { expected: "docx", .. }));
}

#[test]
fn existing_output_requires_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.docx");
    std::fs::write(&out, b"old").unwrap();

    let err = validate_output(&out, false).unwrap_err();
    assert!(matches!(err, ValidationError::AlreadyExists(_)));

    validate_output(&out, true).unwrap();
}

#[test]
fn missing_parent_directories_are_created() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("a").join("b").join("out.docx");
    validate_output(&out, false).unwrap();
    assert!(out.parent().unwrap().is_dir());

    // a second pass finds the directory already there
    validate_output(&out, false).unwrap();
}

#[test]
fn parent_that_is_a_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file").unwrap();
    let err = validate_output(&blocker.join("out.docx"), false).unwrap_err();
    assert!(matches!(err, ValidationError::NotADirectory(_)));
}

#[test]
fn bare_file_name_resolves_against_cwd() {
    // "out.docx" has an empty parent; it must be treated as the current directory.
    validate_output(Path::new("pdf-to-docx-validate-check.docx"), true).unwrap();
}
