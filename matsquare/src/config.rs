//! Backend configuration

/// Configuration shared by the direct backend and the boundary runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BackendConfig {
    /// Ceiling on cells held live at once; `None` means unlimited
    pub max_cells: Option<u64>,
}

impl BackendConfig {
    /// Config without an allocation ceiling
    pub const fn unlimited() -> Self {
        Self { max_cells: None }
    }

    /// Config that refuses allocations past `max_cells` live cells
    pub const fn with_max_cells(max_cells: u64) -> Self {
        Self {
            max_cells: Some(max_cells),
        }
    }

    /// Whether `requested` more cells fit next to `in_use` live ones
    pub fn admits(&self, in_use: u64, requested: u64) -> bool {
        match self.max_cells {
            Some(limit) => in_use
                .checked_add(requested)
                .is_some_and(|total| total <= limit),
            None => true,
        }
    }

    /// Load from a JSON document such as `{"max_cells": 1048576}`
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|err| crate::BridgeError::Config(err.to_string()))
    }
}
