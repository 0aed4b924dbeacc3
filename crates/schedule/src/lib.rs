//! Schedule documents: XMLTV encoding and the edit rebuilder.
//!
//! The rebuilder is pure: it takes a parsed [`ScheduleDocument`], the
//! edited sequence for one channel and a [`RebuildOptions`] carrying the
//! clock, and returns a new document. Reading and writing XML lives in
//! [`xmltv`] and [`request`] so the rebuilder never sees markup.
//!
//! [`ScheduleDocument`]: epgedit_core::ScheduleDocument

pub mod catalog;
pub mod rebuild;
pub mod request;
pub mod views;
pub mod xmltv;

pub use catalog::ProgramCatalogIndex;
pub use rebuild::{RebuildOptions, apply_request, generation_stamp, rebuild};
pub use request::parse_request;
pub use views::{draft_document, filter_by_date};
pub use xmltv::{parse_document, render_document};

/// Errors from reading or writing schedule XML.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("XML write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid document: {0}")]
    Invalid(String),
}

impl From<epgedit_core::Error> for CodecError {
    fn from(e: epgedit_core::Error) -> Self {
        CodecError::Invalid(e.to_string())
    }
}

impl From<CodecError> for epgedit_core::Error {
    fn from(e: CodecError) -> Self {
        epgedit_core::Error::MalformedInput(e.to_string())
    }
}
