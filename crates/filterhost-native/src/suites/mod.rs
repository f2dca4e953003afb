//! Callback suites supplied to running plug-ins.
//!
//! Every suite entry point is an `extern "system"` trampoline that looks up
//! the active [`SessionContext`] and forwards to safe, lock-protected state
//! owned by that session. The tables themselves are immutable statics; all
//! mutable state lives in the context, so two sessions never share it.
//!
//! A trampoline called while no session is active, or with an identifier
//! that does not belong to the active session, returns a null or zero
//! value or an error code. It never touches freed memory.
//!
//! Suites provided:
//! - Buffer procs and the pointer-based buffer suite
//! - Handle procs and handle suites 1 and 2
//! - Property procs
//! - Action descriptor procs
//! - UI hooks
//! - The basic suite used to acquire all of the above by name

pub mod arena;
pub mod basic;
pub mod buffer;
pub mod descriptor;
mod ffi;
pub mod handle;
pub(crate) mod pixels;
pub mod property;
pub mod session;
pub mod ui_hooks;

use filterhost_abi::{OsErr, result_code, sp_error};
use thiserror::Error;

pub use arena::Arena;
pub use descriptor::{DescriptorStore, DescriptorValue, DescriptorValues};
pub use handle::{HandleStore, HandleSuiteVersion};
pub use property::{PropertyStore, PropertyValue};
pub use session::{LeakReport, SessionContext, SessionOptions, SuiteSession};

pub(crate) use ffi::{ACTION_DESCRIPTOR_PROCS, SP_BASIC_SUITE, install_record_procs};

/// Misuse of a suite by a plug-in.
///
/// None of these end a session; trampolines translate them into the
/// result code the plug-in expects and log them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuiteError {
    /// A call arrived while no session was active.
    #[error("no filter session is active")]
    NoSession,

    /// A required pointer argument was null.
    #[error("null pointer argument")]
    NullPointer,

    /// The buffer identifier is unknown or already freed.
    #[error("unknown buffer {0:#x}")]
    UnknownBuffer(u64),

    /// The handle identifier is unknown or already disposed.
    #[error("unknown handle {0:#x}")]
    UnknownHandle(u64),

    /// The descriptor identifier is unknown or already freed.
    #[error("unknown descriptor {0:#x}")]
    UnknownDescriptor(u64),

    /// A negative or oversized allocation request.
    #[error("invalid size {0}")]
    InvalidSize(i64),

    /// Not enough buffer space left.
    #[error("requested {requested} bytes but only {available} are available")]
    OutOfSpace {
        /// Bytes requested.
        requested: u64,
        /// Bytes left.
        available: u64,
    },

    /// The descriptor has no value under the key.
    #[error("key {key:#010x} not found")]
    KeyNotFound {
        /// Four-character key.
        key: u32,
    },

    /// A key index past the end of the descriptor.
    #[error("index {index} out of range for {count} keys")]
    IndexOutOfRange {
        /// Index requested.
        index: u32,
        /// Number of keys.
        count: u32,
    },

    /// The stored value has a different type than requested.
    #[error("key {key:#010x} holds {actual:#010x}, not {expected:#010x}")]
    TypeMismatch {
        /// Four-character key.
        key: u32,
        /// Type code requested.
        expected: u32,
        /// Type code stored.
        actual: u32,
    },

    /// The property is not provided by this host.
    #[error("property {key:#010x} is undefined")]
    PropertyUndefined {
        /// Property key.
        key: u32,
    },

    /// The suite name and version pair is not provided.
    #[error("suite {name:?} version {version} is not provided")]
    SuiteNotFound {
        /// Name requested.
        name: String,
        /// Version requested.
        version: i32,
    },

    /// The user dismissed a host dialog.
    #[error("cancelled by the user")]
    Cancelled,

    /// Pixel data in an image mode the host cannot display.
    #[error("cannot display image mode {0}")]
    UnsupportedMode(i32),

    /// The identifier space of a table is used up.
    #[error("identifier table exhausted")]
    Exhausted,
}

impl SuiteError {
    /// `OSErr` reported to the plug-in.
    pub fn os_err(&self) -> OsErr {
        match self {
            Self::NoSession | Self::UnknownBuffer(_) | Self::UnknownHandle(_) => {
                result_code::NIL_HANDLE
            }
            Self::OutOfSpace { .. } | Self::Exhausted => result_code::MEM_FULL,
            Self::PropertyUndefined { .. } => result_code::PROPERTY_UNDEFINED,
            Self::Cancelled => result_code::USER_CANCELED,
            Self::SuiteNotFound { .. } => result_code::HOST_INSUFFICIENT,
            Self::UnsupportedMode(_) => result_code::FILTER_BAD_MODE,
            Self::NullPointer
            | Self::UnknownDescriptor(_)
            | Self::InvalidSize(_)
            | Self::KeyNotFound { .. }
            | Self::IndexOutOfRange { .. }
            | Self::TypeMismatch { .. } => result_code::PARAM_ERR,
        }
    }

    /// `SPErr` reported through the basic suite.
    pub fn sp_err(&self) -> i32 {
        match self {
            Self::SuiteNotFound { .. } => sp_error::SUITE_NOT_FOUND,
            Self::OutOfSpace { .. } | Self::Exhausted => sp_error::OUT_OF_MEMORY,
            _ => sp_error::BAD_PARAMETER,
        }
    }
}

/// Result type for suite operations.
pub type SuiteResult<T> = std::result::Result<T, SuiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SuiteError::UnknownHandle(1).os_err(), result_code::NIL_HANDLE);
        assert_eq!(
            SuiteError::OutOfSpace {
                requested: 10,
                available: 1
            }
            .os_err(),
            result_code::MEM_FULL
        );
        assert_eq!(
            SuiteError::PropertyUndefined { key: 0 }.os_err(),
            result_code::PROPERTY_UNDEFINED
        );
        assert_eq!(
            SuiteError::SuiteNotFound {
                name: "x".into(),
                version: 1
            }
            .sp_err(),
            sp_error::SUITE_NOT_FOUND
        );
        assert_eq!(SuiteError::NullPointer.sp_err(), sp_error::BAD_PARAMETER);
    }
}
