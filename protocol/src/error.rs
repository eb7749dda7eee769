use thiserror::Error;

/// Malformed requests: these never reach `store`/`engine` at all.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("unknown root element: {0}")]
    UnknownRoot(String),
    #[error("missing required attribute: {0}")]
    MissingAttribute(&'static str),
    #[error("non-numeric value for attribute: {0}")]
    NotNumeric(&'static str),
    #[error("invalid UTF-8 in request body")]
    InvalidUtf8,
}
