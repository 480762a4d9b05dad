//! Packaged search result layout
//!
//! This is the only composite value allowed across a boundary. Field order and
//! widths are fixed: row, column, size, elapsed milliseconds, each a signed
//! 64-bit integer.

use bytemuck::{Pod, Zeroable};
use core::mem::size_of;

/// Fixed four-field result layout handed back across a boundary
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PackagedResult {
    /// Top-left row of the winning square, -1 if none
    pub row: i64,
    /// Top-left column of the winning square, -1 if none
    pub column: i64,
    /// Side length of the winning square
    pub size: i64,
    /// Wall time of the search in milliseconds
    pub elapsed_millis: i64,
}

impl PackagedResult {
    /// Size of the layout in bytes
    pub const SIZE: usize = size_of::<Self>();

    /// Encode as little-endian bytes in field order
    pub fn to_le_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.row.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.column.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.size.to_le_bytes());
        bytes[24..32].copy_from_slice(&self.elapsed_millis.to_le_bytes());
        bytes
    }

    /// Decode from little-endian bytes
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, crate::MatrixError> {
        if bytes.len() < Self::SIZE {
            return Err(crate::MatrixError::InsufficientBuffer);
        }

        let field = |offset: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[offset..offset + 8]);
            i64::from_le_bytes(raw)
        };

        Ok(Self {
            row: field(0),
            column: field(8),
            size: field(16),
            elapsed_millis: field(24),
        })
    }

    /// View as native-endian fields for a positional call
    pub fn as_fields(&self) -> &[i64; 4] {
        bytemuck::cast_ref(self)
    }
}
