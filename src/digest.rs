// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Digest engines consumed by platform-key derivation.
// The hash transforms themselves come from `blake3` and a small FNV-1a.

/// A streaming message digest.
///
/// `update` after `finish` is ignored until the engine is `reset`.
pub trait DigestEngine: Send {
    fn reset(&mut self);
    fn update(&mut self, data: &[u8]);
    fn finish(&mut self);
    /// The finished digest, or `None` if `finish` has not been called.
    fn digest(&self) -> Option<Vec<u8>>;
    /// Digest length in bytes.
    fn digest_len(&self) -> usize;
}

/// Selects a digest engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestKind {
    /// 32-byte BLAKE3.
    Blake3,
    /// 8-byte FNV-1a 64.
    Fnv1a64,
}

impl DigestKind {
    pub fn engine(self) -> Box<dyn DigestEngine> {
        match self {
            DigestKind::Blake3 => Box::new(Blake3Digest::new()),
            DigestKind::Fnv1a64 => Box::new(Fnv1aDigest::new()),
        }
    }

    /// One-shot digest of `data`.
    pub fn compute(self, data: &[u8]) -> Vec<u8> {
        let mut e = self.engine();
        e.update(data);
        e.finish();
        e.digest().unwrap_or_default()
    }
}

pub struct Blake3Digest {
    hasher: blake3::Hasher,
    out: Option<blake3::Hash>,
}

impl Blake3Digest {
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
            out: None,
        }
    }
}

impl Default for Blake3Digest {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestEngine for Blake3Digest {
    fn reset(&mut self) {
        self.hasher.reset();
        self.out = None;
    }

    fn update(&mut self, data: &[u8]) {
        if self.out.is_none() {
            self.hasher.update(data);
        }
    }

    fn finish(&mut self) {
        if self.out.is_none() {
            self.out = Some(self.hasher.finalize());
        }
    }

    fn digest(&self) -> Option<Vec<u8>> {
        self.out.map(|h| h.as_bytes().to_vec())
    }

    fn digest_len(&self) -> usize {
        blake3::OUT_LEN
    }
}

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// FNV-1a 64-bit, digest emitted big-endian.
pub struct Fnv1aDigest {
    state: u64,
    finished: bool,
}

impl Fnv1aDigest {
    pub fn new() -> Self {
        Self {
            state: FNV_OFFSET,
            finished: false,
        }
    }

    /// Current hash value.
    pub fn value(&self) -> u64 {
        self.state
    }
}

impl Default for Fnv1aDigest {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestEngine for Fnv1aDigest {
    fn reset(&mut self) {
        self.state = FNV_OFFSET;
        self.finished = false;
    }

    fn update(&mut self, data: &[u8]) {
        if self.finished {
            return;
        }
        for &b in data {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }

    fn digest(&self) -> Option<Vec<u8>> {
        self.finished.then(|| self.state.to_be_bytes().to_vec())
    }

    fn digest_len(&self) -> usize {
        8
    }
}

/// Lowercase hex encoding.
pub fn to_hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut s = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        s.push(DIGITS[(b >> 4) as usize] as char);
        s.push(DIGITS[(b & 0xf) as usize] as char);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_known_values() {
        let mut e = Fnv1aDigest::new();
        assert_eq!(e.value(), 0xcbf29ce484222325);
        e.update(b"a");
        assert_eq!(e.value(), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn digest_only_after_finish() {
        let mut e = DigestKind::Blake3.engine();
        e.update(b"abc");
        assert!(e.digest().is_none());
        e.finish();
        let d = e.digest().unwrap();
        assert_eq!(d.len(), e.digest_len());
        assert_eq!(d, blake3::hash(b"abc").as_bytes().to_vec());
    }

    #[test]
    fn update_after_finish_is_ignored() {
        let mut e = Fnv1aDigest::new();
        e.update(b"x");
        e.finish();
        let before = e.digest();
        e.update(b"y");
        assert_eq!(e.digest(), before);
        e.reset();
        assert!(e.digest().is_none());
    }

    #[test]
    fn hex_encoding() {
        assert_eq!(to_hex(&[0x01, 0xab, 0xff]), "01abff");
        assert_eq!(to_hex(&0x0123456789abcdefu64.to_be_bytes()), "0123456789abcdef");
    }
}
