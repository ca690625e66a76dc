//! Error types for model serializer construction and XML document handling.
//!
//! Construction of field serializers is the only place where a model can be
//! rejected, so [`ModelFieldError`] is raised by the builders and never by
//! `serialize`/`deserialize`. [`XmlError`] covers the text layer that turns
//! documents into trees and back.

use thiserror::Error;

/// A model field that cannot be mapped onto XML.
///
/// Raised while building serializers, before any document is processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{model}.{field} field type error: {message}")]
pub struct ModelFieldError {
    /// Name of the model owning the field.
    pub model: String,
    /// Name of the offending field.
    pub field: String,
    /// Human readable description of the problem.
    pub message: String,
}

impl ModelFieldError {
    pub fn new(
        model: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors produced while reading or writing XML documents.
#[derive(Error, Debug)]
pub enum XmlError {
    /// The model could not be mapped onto XML.
    #[error(transparent)]
    Model(#[from] ModelFieldError),

    /// Malformed XML or an encoding problem reported by quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// IO error while writing the document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document root does not carry the tag the model expects.
    #[error("unexpected root element: expected {expected}, found {found}")]
    UnexpectedRoot { expected: String, found: String },

    /// The document contains no element at all.
    #[error("document has no root element")]
    MissingRoot,

    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

impl From<quick_xml::events::attributes::AttrError> for XmlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        XmlError::Xml(err.into())
    }
}

impl From<quick_xml::encoding::EncodingError> for XmlError {
    fn from(err: quick_xml::encoding::EncodingError) -> Self {
        XmlError::Xml(err.into())
    }
}

impl From<String> for XmlError {
    fn from(msg: String) -> Self {
        XmlError::Custom(msg)
    }
}

impl From<&str> for XmlError {
    fn from(msg: &str) -> Self {
        XmlError::Custom(msg.to_string())
    }
}

/// Result type alias for XML document operations.
pub type Result<T> = std::result::Result<T, XmlError>;
