//! ABI constants: status codes and axis selectors

/// Sentinel written for `row`/`column` when no square exists
pub const NO_POSITION: i64 = -1;

/// Selector value for the row axis in `dim`/`msq_size`
pub const AXIS_ROWS: i32 = 1;

/// Selector value for the column axis in `dim`/`msq_size`
pub const AXIS_COLS: i32 = 2;

/// Status code returned by every boundary entry point
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok = 0,
    AllocationFailed = 1,
    InvalidToken = 2,
    ContextMismatch = 3,
    UnknownContext = 4,
    NullOutPointer = 5,
    InsufficientBuffer = 6,
}

impl Status {
    /// Raw code as returned across the ABI
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Decode a raw status code; unknown codes yield `None`
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Status::Ok),
            1 => Some(Status::AllocationFailed),
            2 => Some(Status::InvalidToken),
            3 => Some(Status::ContextMismatch),
            4 => Some(Status::UnknownContext),
            5 => Some(Status::NullOutPointer),
            6 => Some(Status::InsufficientBuffer),
            _ => None,
        }
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}

/// Matrix dimension selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    Rows,
    Cols,
}

impl Axis {
    /// Decode an ABI axis selector; anything but 1 or 2 is unsupported
    pub const fn from_selector(selector: i32) -> Option<Self> {
        match selector {
            AXIS_ROWS => Some(Axis::Rows),
            AXIS_COLS => Some(Axis::Cols),
            _ => None,
        }
    }

    pub const fn selector(self) -> i32 {
        match self {
            Axis::Rows => AXIS_ROWS,
            Axis::Cols => AXIS_COLS,
        }
    }
}
