#![allow(dead_code)]

use anyhow::{Result, bail};
use lopdf::{Document, EncryptionState, EncryptionVersion, Object, Permissions, StringFormat, dictionary};
use pdf_to_docx::engine::{ConversionBackend, ConversionSession, ConvertIn};
use pdf_to_docx::interrupt::Interrupted;
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

/// Writes a minimal PDF with `pages` blank pages and a `Title` entry.
pub fn write_pdf(path: &Path, pages: u32) {
    build_pdf(pages).save(path).expect("save fixture pdf");
}

/// Like [`write_pdf`], but RC4-encrypted with the given passwords.
/// An empty `user_password` produces a file any reader can open.
pub fn write_encrypted_pdf(path: &Path, pages: u32, user_password: &str) {
    let mut doc = build_pdf(pages);
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String((1u8..=16).collect(), StringFormat::Literal),
            Object::String((1u8..=16).rev().collect(), StringFormat::Literal),
        ]),
    );

    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner-secret",
        user_password,
        key_length: 128,
        permissions: Permissions::all(),
    })
    .expect("derive encryption state");
    doc.encrypt(&state).expect("encrypt fixture pdf");
    doc.save(path).expect("save encrypted fixture pdf");
}

fn build_pdf(pages: u32) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            })
            .into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::from(pages),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Quarterly Report"),
    });
    doc.trailer.set("Info", info_id);

    doc
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    WriteOutput,
    SkipOutput,
    FailOpen,
    FailConvert,
    Interrupt,
}

#[derive(Default)]
pub struct Calls {
    pub opens: Cell<u32>,
    pub converts: Cell<u32>,
    pub closes: Cell<u32>,
    pub requests: RefCell<Vec<ConvertIn>>,
}

/// Stand-in for the pdf2docx engine that counts session calls.
pub struct FakeBackend {
    pub calls: Rc<Calls>,
    pub behavior: Behavior,
}

impl FakeBackend {
    pub fn new(behavior: Behavior) -> (Self, Rc<Calls>) {
        let calls = Rc::new(Calls::default());
        (
            Self {
                calls: Rc::clone(&calls),
                behavior,
            },
            calls,
        )
    }
}

impl ConversionBackend for FakeBackend {
    fn open(&self, _input: &Path) -> Result<Box<dyn ConversionSession>> {
        self.calls.opens.set(self.calls.opens.get() + 1);
        if self.behavior == Behavior::FailOpen {
            bail!("cannot open document");
        }
        Ok(Box::new(FakeSession {
            calls: Rc::clone(&self.calls),
            behavior: self.behavior,
        }))
    }
}

struct FakeSession {
    calls: Rc<Calls>,
    behavior: Behavior,
}

impl ConversionSession for FakeSession {
    fn convert(&mut self, req: &ConvertIn) -> Result<()> {
        self.calls.converts.set(self.calls.converts.get() + 1);
        self.calls.requests.borrow_mut().push(req.clone());
        match self.behavior {
            Behavior::WriteOutput => {
                std::fs::write(&req.output_docx, b"PK\x03\x04 fake docx")?;
                Ok(())
            }
            Behavior::SkipOutput | Behavior::FailOpen => Ok(()),
            Behavior::FailConvert => bail!("layout engine exploded on page 2"),
            Behavior::Interrupt => Err(Interrupted.into()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.calls.closes.set(self.calls.closes.get() + 1);
        Ok(())
    }
}
