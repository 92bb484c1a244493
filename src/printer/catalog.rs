//! # Capability Catalog
//!
//! A capability document maps model ids to [`CapabilityTable`]s:
//!
//! ```text
//! {
//!   "models": {
//!     "demo-180": { "name": "Demo 180", "classes": [...], ... },
//!     "demo-photo6": { ... }
//!   }
//! }
//! ```
//!
//! Documents are validated when loaded; a catalog that fails validation is
//! never handed out.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::capability::CapabilityTable;
use crate::error::{InkpassError, Result};

/// Demo capability document shipped with the crate.
const BUILT_IN: &str = include_str!("../../profiles/demo.json");

/// Capability tables keyed by model id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityCatalog {
    pub models: BTreeMap<String, CapabilityTable>,
}

impl CapabilityCatalog {
    /// Parse and validate a capability document.
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        for table in catalog.models.values() {
            table.validate()?;
        }
        debug!("loaded capability catalog with {} models", catalog.models.len());
        Ok(catalog)
    }

    /// Load a capability document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The embedded demo catalog.
    pub fn built_in() -> Result<Self> {
        Self::from_json(BUILT_IN)
    }

    /// Look up a model by id.
    pub fn get(&self, model: &str) -> Result<&CapabilityTable> {
        self.models
            .get(model)
            .ok_or_else(|| InkpassError::UnknownModel(model.to_string()))
    }

    /// Model ids in sorted order.
    pub fn model_ids(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}
