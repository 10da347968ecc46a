mod common;

use pdf_to_docx::{
    config::{ConversionConfig, EngineConfig},
    converter::Converter,
    engine::python::PythonBackend,
    error::ConversionError,
};
use std::path::Path;

#[test]
fn explicit_interpreter_path_is_kept() {
    let backend = PythonBackend::new(&EngineConfig {
        python_exe: "/opt/venv/bin/python".into(),
        ..Default::default()
    });
    assert_eq!(backend.python_exe(), Path::new("/opt/venv/bin/python"));
}

#[test]
fn missing_interpreter_surfaces_as_conversion_failure() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("doc.pdf");
    common::write_pdf(&pdf, 1);

    let backend = PythonBackend::new(&EngineConfig {
        python_exe: dir.path().join("no-such-python").display().to_string(),
        ..Default::default()
    });
    let mut converter = Converter::new(&pdf, None, ConversionConfig::default(), backend).unwrap();
    let err = converter.convert().unwrap_err();

    match err {
        ConversionError::ConversionFailed(cause) => {
            assert!(format!("{cause:#}").contains("spawning python"), "{cause:#}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!pdf.with_extension("docx").exists());
}
