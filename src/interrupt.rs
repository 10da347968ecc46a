//! Process-wide Ctrl-C flag.
//!
//! The CLI installs the handler once; long waits on the conversion engine poll
//! [`requested`] and abort with [`Interrupted`].

use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::warn;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static INSTALL: Once = Once::new();

#[derive(Debug, Error)]
#[error("interrupted by user")]
pub struct Interrupted;

/// Replaces the default Ctrl-C action with setting the flag. Later calls are no-ops.
pub fn install_handler() {
    INSTALL.call_once(|| {
        if let Err(err) = ctrlc::set_handler(|| INTERRUPTED.store(true, Ordering::SeqCst)) {
            warn!("cannot install Ctrl-C handler: {err}");
        }
    });
}

pub fn requested() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}
