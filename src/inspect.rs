use lopdf::{Document, Object};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Snapshot of a document on disk. Built fresh on every call, never cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub page_count: u32,
    pub encrypted: bool,
    pub metadata: BTreeMap<String, String>,
}

/// What a successful open of a PDF reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfSummary {
    pub page_count: u32,
    pub encrypted: bool,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("cannot read file: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("PDF is encrypted and cannot be opened without a password")]
    Encrypted,
    #[error("{0}")]
    Corrupt(String),
}

pub trait DocumentInspector {
    fn open(&self, path: &Path) -> Result<PdfSummary, InspectError>;

    /// Informational inspection: failures degrade to zeroed fields.
    fn inspect(&self, path: &Path) -> FileInfo {
        let mut info = FileInfo {
            path: path.to_path_buf(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size_bytes: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            ..Default::default()
        };

        match self.open(path) {
            Ok(summary) => {
                info.page_count = summary.page_count;
                info.encrypted = summary.encrypted;
                info.metadata = summary.metadata;
            }
            Err(InspectError::Encrypted) => {
                info.encrypted = true;
            }
            Err(err) => {
                warn!("could not read PDF info for {}: {err}", path.display());
            }
        }

        info
    }
}

/// Inspector backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfInspector;

impl DocumentInspector for LopdfInspector {
    fn open(&self, path: &Path) -> Result<PdfSummary, InspectError> {
        let bytes = std::fs::read(path)?;

        let doc = match Document::load_mem(&bytes) {
            Ok(doc) => doc,
            Err(lopdf::Error::Decryption(err)) => {
                debug!("cannot decrypt {}: {err}", path.display());
                return Err(InspectError::Encrypted);
            }
            Err(err) => return Err(InspectError::Corrupt(err.to_string())),
        };

        let encrypted = doc.trailer.get(b"Encrypt").is_ok();
        // lopdf keeps loading when the empty user password is rejected, but
        // leaves every object except the encryption dictionary unparsed.
        if encrypted && doc.encryption_state.is_none() {
            return Err(InspectError::Encrypted);
        }

        let page_count = doc.get_pages().len() as u32;
        debug!(page_count, encrypted, "PDF opened: {}", path.display());

        Ok(PdfSummary {
            page_count,
            encrypted,
            metadata: read_info_dict(&doc),
        })
    }
}

fn read_info_dict(doc: &Document) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();

    let info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_object(*id).ok(),
        Ok(obj) => Some(obj),
        Err(_) => None,
    };
    let Some(Object::Dictionary(dict)) = info else {
        return out;
    };

    for (key, value) in dict.iter() {
        if let Object::String(bytes, _) = value {
            out.insert(
                String::from_utf8_lossy(key).into_owned(),
                decode_pdf_string(bytes),
            );
        }
    }
    out
}

/// PDF text strings are either UTF-16BE with a BOM or a single-byte encoding.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect())
}
