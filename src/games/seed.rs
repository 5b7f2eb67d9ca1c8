//! Seed triples and the HMAC-SHA256 byte stream derived from them.
//!
//! Block `b` of a stream is `HMAC-SHA256(server_seed, "{client_seed}:{nonce}:{label}:{b}")`.
//! Blocks are concatenated, so a stream never runs dry and identical inputs always
//! produce identical bytes.

use hmac::{Hmac, Mac};
use rand::RngCore;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

const BLOCK_LEN: usize = 32;

/// SHA-256 commitment of a seed, hex encoded
pub fn hash_seed(seed: &str) -> String {
    hex::encode(Sha256::digest(seed.as_bytes()))
}

/// Random hex string of `bytes` bytes
pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Server secret. Hex text, used verbatim as the HMAC key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerSeed(String);

impl ServerSeed {
    pub fn generate(bytes: usize) -> Self {
        Self(random_hex(bytes))
    }

    pub fn new(seed: impl Into<String>) -> Self {
        Self(seed.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn commitment(&self) -> String {
        hash_seed(&self.0)
    }
}

// Keeps secrets out of logs and panic messages.
impl fmt::Debug for ServerSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerSeed(<redacted>)")
    }
}

/// Public half of a seed triple, shown to the player before play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedCommitment {
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
}

/// (server seed, client seed, nonce) driving all randomness of one game instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedTriple {
    server_seed: ServerSeed,
    server_seed_hash: String,
    client_seed: String,
    nonce: u64,
}

impl SeedTriple {
    /// Build a triple; the commitment is computed here and never again.
    pub fn new(server_seed: ServerSeed, client_seed: impl Into<String>, nonce: u64) -> Self {
        let server_seed_hash = server_seed.commitment();
        Self {
            server_seed,
            server_seed_hash,
            client_seed: client_seed.into(),
            nonce,
        }
    }

    /// Fresh server seed, caller-supplied or random client seed
    pub fn generate(
        server_seed_bytes: usize,
        client_seed: Option<String>,
        client_seed_bytes: usize,
        nonce: u64,
    ) -> Self {
        let client_seed = client_seed
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| random_hex(client_seed_bytes));
        Self::new(ServerSeed::generate(server_seed_bytes), client_seed, nonce)
    }

    pub fn server_seed_hash(&self) -> &str {
        &self.server_seed_hash
    }

    pub fn client_seed(&self) -> &str {
        &self.client_seed
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The secret itself. Callers must only hand this out once the game is final.
    pub fn reveal(&self) -> &ServerSeed {
        &self.server_seed
    }

    pub fn public(&self) -> SeedCommitment {
        SeedCommitment {
            server_seed_hash: self.server_seed_hash.clone(),
            client_seed: self.client_seed.clone(),
            nonce: self.nonce,
        }
    }

    pub fn commitment_holds(&self) -> bool {
        self.server_seed.commitment() == self.server_seed_hash
    }

    pub fn stream(&self, label: &str) -> RandomStream {
        RandomStream::derive(&self.server_seed, &self.client_seed, self.nonce, label)
    }
}

/// Anything that can hand out bytes one at a time
pub trait ByteSource {
    fn next_byte(&mut self) -> u8;

    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        for b in buf.iter_mut() {
            *b = self.next_byte();
        }
        u32::from_be_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        for b in buf.iter_mut() {
            *b = self.next_byte();
        }
        u64::from_be_bytes(buf)
    }
}

/// Deterministic keyed byte stream
#[derive(Clone)]
pub struct RandomStream {
    mac: HmacSha256,
    prefix: String,
    block: u64,
    buffer: [u8; BLOCK_LEN],
    pos: usize,
}

impl RandomStream {
    pub fn derive(server_seed: &ServerSeed, client_seed: &str, nonce: u64, label: &str) -> Self {
        let mac = HmacSha256::new_from_slice(server_seed.as_str().as_bytes())
            .expect("HMAC accepts keys of any length");
        let mut stream = Self {
            mac,
            prefix: format!("{}:{}:{}", client_seed, nonce, label),
            block: 0,
            buffer: [0u8; BLOCK_LEN],
            pos: 0,
        };
        stream.refill();
        stream
    }

    fn refill(&mut self) {
        let mut mac = self.mac.clone();
        mac.update(self.prefix.as_bytes());
        mac.update(b":");
        mac.update(self.block.to_string().as_bytes());
        self.buffer.copy_from_slice(&mac.finalize().into_bytes());
        self.block += 1;
        self.pos = 0;
    }

    /// Number of HMAC blocks computed so far
    pub fn blocks_used(&self) -> u64 {
        self.block
    }
}

impl ByteSource for RandomStream {
    fn next_byte(&mut self) -> u8 {
        if self.pos == BLOCK_LEN {
            self.refill();
        }
        let byte = self.buffer[self.pos];
        self.pos += 1;
        byte
    }
}

impl Iterator for RandomStream {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        Some(self.next_byte())
    }
}

impl fmt::Debug for RandomStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomStream")
            .field("prefix", &self.prefix)
            .field("block", &self.block)
            .field("pos", &self.pos)
            .finish()
    }
}
