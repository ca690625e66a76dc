//! Document encoding configuration.
//!
//! # Example
//!
//! ```rust
//! use helios_xml_model::XmlConfig;
//!
//! // Load from JSON, unspecified keys keep their defaults
//! let config = XmlConfig::from_json_str(r#"{"skip_empty": true}"#).unwrap();
//! assert!(config.skip_empty);
//! assert!(config.xml_declaration);
//!
//! // Or create programmatically
//! let config = XmlConfig {
//!     indent: Some(2),
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, XmlError};

/// Options applied when models are written as XML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlConfig {
    /// Skip absent values and empty collections instead of writing empty
    /// elements.
    pub skip_empty: bool,

    /// Indentation width for pretty printed output. `None` writes compact XML.
    pub indent: Option<usize>,

    /// Write the `<?xml version="1.0" encoding="UTF-8"?>` declaration.
    pub xml_declaration: bool,
}

impl Default for XmlConfig {
    fn default() -> Self {
        Self {
            skip_empty: false,
            indent: None,
            xml_declaration: true,
        }
    }
}

impl XmlConfig {
    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| XmlError::Custom(format!("invalid configuration: {}", e)))
    }
}
