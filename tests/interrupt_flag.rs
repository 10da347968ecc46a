use pdf_to_docx::interrupt::{self, Interrupted};

#[test]
fn handler_installs_once_and_starts_clear() {
    interrupt::install_handler();
    // a second registration with ctrlc would fail; the call must stay a no-op
    interrupt::install_handler();
    assert!(!interrupt::requested());
}

#[test]
fn interrupted_marker_reads_as_cancellation() {
    let err = anyhow::Error::from(Interrupted);
    assert!(err.is::<Interrupted>());
    assert_eq!(err.to_string(), "interrupted by user");
}
