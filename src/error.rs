// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Error taxonomy shared by every fallible primitive.
// Raw OS codes are translated through a per-platform table into `IpcErrorKind`
// and kept alongside the translated kind for diagnostics.

use std::fmt;

use thiserror::Error;

/// Convenience alias used by every public entry point.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty name, zero size, or an argument out of range.
    InvalidArgument,
    /// Allocation or OS handle exhaustion.
    NoResources,
    /// The backend for this platform is a stub.
    NotImplemented,
    /// The named object already exists.
    AlreadyExists,
    /// The named object does not exist.
    NotExists,
    /// Permission denied by the OS.
    AccessDenied,
    /// Any other OS failure; see [`Error::native_code`].
    SystemError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::NoResources => "no resources",
            ErrorKind::NotImplemented => "not implemented",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::NotExists => "does not exist",
            ErrorKind::AccessDenied => "access denied",
            ErrorKind::SystemError => "system error",
        };
        f.write_str(s)
    }
}

/// IPC-specific error codes, produced by [`error_from_system`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpcErrorKind {
    Access,
    Exists,
    NotExists,
    NoResources,
    Overflow,
    NameTooLong,
    InvalidArgument,
    NotImplemented,
    Deadlock,
    Failed,
}

impl From<IpcErrorKind> for ErrorKind {
    fn from(kind: IpcErrorKind) -> Self {
        match kind {
            IpcErrorKind::Access => ErrorKind::AccessDenied,
            IpcErrorKind::Exists => ErrorKind::AlreadyExists,
            IpcErrorKind::NotExists => ErrorKind::NotExists,
            IpcErrorKind::NoResources => ErrorKind::NoResources,
            IpcErrorKind::NameTooLong | IpcErrorKind::InvalidArgument => {
                ErrorKind::InvalidArgument
            }
            IpcErrorKind::NotImplemented => ErrorKind::NotImplemented,
            IpcErrorKind::Overflow | IpcErrorKind::Deadlock | IpcErrorKind::Failed => {
                ErrorKind::SystemError
            }
        }
    }
}

/// Error returned by every fallible operation in this crate.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    ipc: Option<IpcErrorKind>,
    native_code: Option<i32>,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            ipc: None,
            native_code: None,
            message: message.into(),
        }
    }

    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    #[inline]
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, message)
    }

    #[inline]
    pub fn no_resources(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoResources, message)
    }

    /// Build an IPC error from a raw OS code.
    pub fn from_system(code: i32, message: impl Into<String>) -> Self {
        let ipc = error_from_system(code);
        Self {
            kind: ipc.into(),
            ipc: Some(ipc),
            native_code: Some(code),
            message: message.into(),
        }
    }

    /// Build an IPC error from the calling thread's last OS error.
    pub fn last_os_error(message: impl Into<String>) -> Self {
        let code = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
        Self::from_system(code, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Translated IPC code, present when the error came from an OS call.
    pub fn ipc_kind(&self) -> Option<IpcErrorKind> {
        self.ipc
    }

    /// Raw `errno` / Win32 error code, if any.
    pub fn native_code(&self) -> Option<i32> {
        self.native_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        match e.raw_os_error() {
            Some(code) => Self::from_system(code, e.to_string()),
            None => Self::new(ErrorKind::SystemError, e.to_string()),
        }
    }
}

/// Translate a raw `errno` value into an [`IpcErrorKind`].
#[cfg(unix)]
pub fn error_from_system(code: i32) -> IpcErrorKind {
    match code {
        0 => IpcErrorKind::Failed,
        libc::EACCES | libc::EPERM => IpcErrorKind::Access,
        libc::EEXIST => IpcErrorKind::Exists,
        libc::ENOENT => IpcErrorKind::NotExists,
        libc::ENOMEM | libc::ENOSPC | libc::EMFILE | libc::ENFILE | libc::EAGAIN => {
            IpcErrorKind::NoResources
        }
        libc::EOVERFLOW | libc::ERANGE | libc::EFBIG => IpcErrorKind::Overflow,
        libc::ENAMETOOLONG => IpcErrorKind::NameTooLong,
        libc::EINVAL | libc::EBADF => IpcErrorKind::InvalidArgument,
        libc::ENOSYS | libc::ENOTSUP => IpcErrorKind::NotImplemented,
        libc::EDEADLK => IpcErrorKind::Deadlock,
        _ => IpcErrorKind::Failed,
    }
}

/// Translate a raw Win32 error code into an [`IpcErrorKind`].
#[cfg(windows)]
pub fn error_from_system(code: i32) -> IpcErrorKind {
    use windows_sys::Win32::Foundation::*;

    match code as u32 {
        ERROR_ACCESS_DENIED => IpcErrorKind::Access,
        ERROR_ALREADY_EXISTS | ERROR_FILE_EXISTS => IpcErrorKind::Exists,
        ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => IpcErrorKind::NotExists,
        ERROR_NOT_ENOUGH_MEMORY | ERROR_OUTOFMEMORY | ERROR_TOO_MANY_SEMAPHORES => {
            IpcErrorKind::NoResources
        }
        ERROR_TOO_MANY_POSTS => IpcErrorKind::Overflow,
        ERROR_FILENAME_EXCED_RANGE => IpcErrorKind::NameTooLong,
        ERROR_INVALID_HANDLE | ERROR_INVALID_PARAMETER => IpcErrorKind::InvalidArgument,
        ERROR_CALL_NOT_IMPLEMENTED => IpcErrorKind::NotImplemented,
        _ => IpcErrorKind::Failed,
    }
}

/// Platforms without a translation table report every code as a failure.
#[cfg(not(any(unix, windows)))]
pub fn error_from_system(_code: i32) -> IpcErrorKind {
    IpcErrorKind::Failed
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn errno_table() {
        assert_eq!(error_from_system(libc::EEXIST), IpcErrorKind::Exists);
        assert_eq!(error_from_system(libc::ENOENT), IpcErrorKind::NotExists);
        assert_eq!(error_from_system(libc::EACCES), IpcErrorKind::Access);
        assert_eq!(error_from_system(libc::ENAMETOOLONG), IpcErrorKind::NameTooLong);
        assert_eq!(error_from_system(libc::EIO), IpcErrorKind::Failed);
    }

    #[test]
    fn system_error_keeps_native_code() {
        let e = Error::from_system(libc::ENOENT, "shm_open");
        assert_eq!(e.kind(), ErrorKind::NotExists);
        assert_eq!(e.ipc_kind(), Some(IpcErrorKind::NotExists));
        assert_eq!(e.native_code(), Some(libc::ENOENT));
        assert!(e.to_string().contains("shm_open"));
    }

    #[test]
    fn io_error_conversion() {
        let e: Error = std::io::Error::from_raw_os_error(libc::EEXIST).into();
        assert_eq!(e.kind(), ErrorKind::AlreadyExists);
    }
}
