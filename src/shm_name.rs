// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Platform-key derivation for named IPC objects.
// A logical name of any length is hashed together with a per-object suffix,
// hex-encoded, and truncated to what the OS accepts as an object name.

use crate::digest::{to_hex, DigestKind};
use crate::error::{Error, Result};
use crate::runtime;

/// Maximum length of a platform key, including the leading '/' for POSIX.
///
/// macOS caps POSIX semaphore and shm names at 31 bytes (`PSEMNAMLEN`,
/// `PSHMNAMLEN`). Linux allows `NAME_MAX` minus the `sem.` prefix glibc adds.
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub const PLATFORM_KEY_MAX: usize = 31;

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
pub const PLATFORM_KEY_MAX: usize = 251;

/// Kind of object a key names; keeps a semaphore and a segment with the
/// same logical name from colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpcObject {
    Semaphore,
    SharedMemory,
}

impl IpcObject {
    fn suffix(self) -> &'static str {
        match self {
            IpcObject::Semaphore => "_sem_object",
            IpcObject::SharedMemory => "_shm_object",
        }
    }
}

/// Shape of the generated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyStyle {
    /// `/` followed by hex digits.
    Posix,
    /// Hex digits only.
    Windows,
}

impl KeyStyle {
    #[cfg(windows)]
    pub const NATIVE: KeyStyle = KeyStyle::Windows;
    #[cfg(not(windows))]
    pub const NATIVE: KeyStyle = KeyStyle::Posix;
}

/// Key for `name` in this platform's style, hashed with the runtime's digest.
pub fn platform_key(name: &str, object: IpcObject) -> Result<String> {
    platform_key_with(
        name,
        object,
        runtime::capabilities().key_digest,
        KeyStyle::NATIVE,
    )
}

/// Key for `name` with an explicit digest and style.
pub fn platform_key_with(
    name: &str,
    object: IpcObject,
    digest: DigestKind,
    style: KeyStyle,
) -> Result<String> {
    if name.is_empty() {
        return Err(Error::invalid_argument("IPC object name is empty"));
    }

    let bytes = digest.compute(format!("{name}{}", object.suffix()).as_bytes());
    if bytes.is_empty() {
        return Err(Error::no_resources("digest engine produced no output"));
    }
    let hex = to_hex(&bytes);

    let key = match style {
        KeyStyle::Posix => {
            let take = hex.len().min(PLATFORM_KEY_MAX - 1);
            format!("/{}", &hex[..take])
        }
        KeyStyle::Windows => {
            let take = hex.len().min(PLATFORM_KEY_MAX);
            hex[..take].to_string()
        }
    };
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic() {
        let a = platform_key_with("foo", IpcObject::Semaphore, DigestKind::Blake3, KeyStyle::Posix)
            .unwrap();
        let b = platform_key_with("foo", IpcObject::Semaphore, DigestKind::Blake3, KeyStyle::Posix)
            .unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with('/'));
        assert!(a.len() <= PLATFORM_KEY_MAX);
        assert!(a[1..].bytes().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn key_is_hex_digest_of_name_and_suffix() {
        let k = platform_key_with("foo", IpcObject::SharedMemory, DigestKind::Blake3, KeyStyle::Posix)
            .unwrap();
        let full = blake3::hash(b"foo_shm_object").to_hex().to_string();
        let take = full.len().min(PLATFORM_KEY_MAX - 1);
        assert_eq!(k, format!("/{}", &full[..take]));
    }

    #[test]
    fn object_kinds_do_not_collide() {
        let sem = platform_key_with("x", IpcObject::Semaphore, DigestKind::Blake3, KeyStyle::Posix)
            .unwrap();
        let shm =
            platform_key_with("x", IpcObject::SharedMemory, DigestKind::Blake3, KeyStyle::Posix)
                .unwrap();
        assert_ne!(sem, shm);
    }

    #[test]
    fn long_names_are_bounded() {
        let long = "n".repeat(4096);
        for style in [KeyStyle::Posix, KeyStyle::Windows] {
            let k = platform_key_with(&long, IpcObject::SharedMemory, DigestKind::Blake3, style)
                .unwrap();
            assert!(k.len() <= PLATFORM_KEY_MAX);
        }
    }

    #[test]
    fn fnv_keys_use_full_digest() {
        let k = platform_key_with("foo", IpcObject::Semaphore, DigestKind::Fnv1a64, KeyStyle::Windows)
            .unwrap();
        assert_eq!(k.len(), 16);
    }

    #[test]
    fn empty_name_rejected() {
        let e = platform_key("", IpcObject::Semaphore).unwrap_err();
        assert_eq!(e.kind(), crate::ErrorKind::InvalidArgument);
    }
}
