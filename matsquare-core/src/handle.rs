//! Opaque matrix handle
//!
//! A [`MatrixHandle`] is the only thing a caller ever holds for a matrix. It
//! is a token, not storage: copying it does not copy the matrix, and it carries
//! no arithmetic. Whichever backend minted it owns the storage behind it.

use core::num::NonZeroU64;

/// Non-owning reference token to backend-owned matrix storage
///
/// The zero token is reserved as "null", so `Option<MatrixHandle>` has the
/// same size as the raw `u64` that crosses a boundary.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixHandle(NonZeroU64);

impl MatrixHandle {
    /// Rebuild a handle from a raw token received from a backend or boundary
    ///
    /// Returns `None` for the null token. Any other value is accepted here;
    /// whether it names live storage is for the owning backend to decide.
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(token) => Some(Self(token)),
            None => None,
        }
    }

    /// Raw token for passing across a boundary
    pub const fn into_raw(self) -> u64 {
        self.0.get()
    }
}

impl core::fmt::Display for MatrixHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "matrix#{:#x}", self.0.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_token_rejected() {
        assert_eq!(MatrixHandle::from_raw(0), None);
    }

    #[test]
    fn test_raw_token_preserved() {
        let raw = (7u64 << 32) | 42;
        let handle = MatrixHandle::from_raw(raw).unwrap();
        assert_eq!(handle.into_raw(), raw);

        // copying the token yields the same identity
        let copy = handle;
        assert_eq!(copy, handle);
    }

    #[test]
    fn test_niche_keeps_abi_width() {
        assert_eq!(
            core::mem::size_of::<Option<MatrixHandle>>(),
            core::mem::size_of::<u64>()
        );
    }
}
