// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Process-wide capability registry.
// `init` resolves the backend choices once; primitives read them through
// `capabilities()`. `shutdown` clears the registry so a later `init` can
// pick again; objects created earlier keep the backend they were built with.

use log::{debug, warn};
use parking_lot::RwLock;

use crate::atomic;
use crate::condition::CondvarBackend;
use crate::digest::DigestKind;

/// Environment variable overriding the condition variable backend at `init`.
pub const CONDVAR_ENV: &str = "LIBSYSPRIM_CONDVAR";

/// Backend choices for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Backend used by [`CondVar::new`](crate::CondVar::new).
    pub condvar: CondvarBackend,
    /// Digest used to derive platform keys for named IPC objects.
    pub key_digest: DigestKind,
}

impl Capabilities {
    /// Build-time defaults, before environment overrides.
    pub const fn defaults() -> Self {
        Self {
            condvar: if cfg!(feature = "emulated-condvar") {
                CondvarBackend::Emulated
            } else {
                CondvarBackend::Native
            },
            key_digest: DigestKind::Blake3,
        }
    }

    /// Build-time defaults with `LIBSYSPRIM_CONDVAR` applied.
    pub fn detect() -> Self {
        let mut caps = Self::defaults();
        if let Ok(v) = std::env::var(CONDVAR_ENV) {
            match v.to_ascii_lowercase().as_str() {
                "native" => caps.condvar = CondvarBackend::Native,
                "emulated" => caps.condvar = CondvarBackend::Emulated,
                other => warn!("{CONDVAR_ENV}={other:?} not recognised, keeping {:?}", caps.condvar),
            }
        }
        caps
    }

    /// Whether the build-selected atomic backend is lock-free.
    pub fn atomics_lock_free(&self) -> bool {
        atomic::is_lock_free()
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::defaults()
    }
}

static REGISTRY: RwLock<Option<Capabilities>> = parking_lot::const_rwlock(None);

/// Initialise the registry from build defaults and the environment.
/// Returns the active capabilities; a no-op if already initialised.
pub fn init() -> Capabilities {
    if let Some(caps) = *REGISTRY.read() {
        return caps;
    }
    let mut reg = REGISTRY.write();
    *reg.get_or_insert_with(|| {
        let caps = Capabilities::detect();
        debug!("runtime init: {caps:?}");
        caps
    })
}

/// Initialise the registry with explicit choices.
/// Returns `false` (and changes nothing) if it was already initialised.
pub fn init_with(caps: Capabilities) -> bool {
    let mut reg = REGISTRY.write();
    if reg.is_some() {
        return false;
    }
    debug!("runtime init: {caps:?}");
    *reg = Some(caps);
    true
}

/// Active capabilities, initialising on first use.
pub fn capabilities() -> Capabilities {
    init()
}

/// Whether `init`/`init_with` has run since the last `shutdown`.
pub fn is_initialized() -> bool {
    REGISTRY.read().is_some()
}

/// Clear the registry.
pub fn shutdown() {
    if REGISTRY.write().take().is_some() {
        debug!("runtime shutdown");
    }
}
