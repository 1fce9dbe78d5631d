//! Random string generation with a tiered fallback chain.
//!
//! Sources are tried in priority order:
//! 1. The operating system CSPRNG, accepted only when it reports success
//! 2. A system entropy device (`/dev/urandom` by default)
//! 3. A seeded, non-cryptographic PRNG sampling `[0-9a-z]`
//!
//! The third tier is only reached when every stronger source has failed.

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Characters used by the weak fallback.
const FALLBACK_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Default entropy device.
pub const DEFAULT_ENTROPY_DEVICE: &str = "/dev/urandom";

/// A source of strong randomness.
///
/// Implementations return `None` when they cannot vouch for the quality of
/// their output, which moves generation on to the next tier.
pub trait EntropySource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns `len` random bytes, or `None` if the source is unavailable.
    fn fill(&self, len: usize) -> Option<Vec<u8>>;
}

/// Operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn name(&self) -> &'static str {
        "os_rng"
    }

    fn fill(&self, len: usize) -> Option<Vec<u8>> {
        let mut buf = vec![0u8; len];
        OsRng.try_fill_bytes(&mut buf).ok()?;
        Some(buf)
    }
}

/// Reads bytes from an entropy device file.
#[derive(Debug, Clone)]
pub struct DeviceEntropy {
    path: PathBuf,
}

impl DeviceEntropy {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for DeviceEntropy {
    fn default() -> Self {
        Self::new(DEFAULT_ENTROPY_DEVICE)
    }
}

impl EntropySource for DeviceEntropy {
    fn name(&self) -> &'static str {
        "entropy_device"
    }

    fn fill(&self, len: usize) -> Option<Vec<u8>> {
        let mut file = File::open(&self.path).ok()?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf).ok()?;
        Some(buf)
    }
}

/// Generates random strings from an ordered list of entropy sources.
pub struct RandomGenerator {
    sources: Vec<Box<dyn EntropySource>>,
}

impl RandomGenerator {
    /// Creates a generator over the given strong sources, highest priority first.
    pub fn with_sources(sources: Vec<Box<dyn EntropySource>>) -> Self {
        Self { sources }
    }

    /// Returns a string of exactly `len` characters.
    ///
    /// Bytes from a strong source are hex-encoded and truncated. When no strong
    /// source produces output the weak alphabet sampler is used.
    pub fn generate(&self, len: usize) -> String {
        for source in &self.sources {
            if let Some(bytes) = source.fill(len) {
                let mut encoded = hex::encode(bytes);
                encoded.truncate(len);
                return encoded;
            }
        }

        weak_random_string(len)
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::with_sources(vec![
            Box::new(OsEntropy),
            Box::new(DeviceEntropy::default()),
        ])
    }
}

impl std::fmt::Debug for RandomGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("RandomGenerator")
            .field("sources", &names)
            .finish()
    }
}

/// Last-resort generator. Not suitable for secrets on its own.
fn weak_random_string(len: usize) -> String {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
        ^ u64::from(std::process::id());
    let mut rng = StdRng::seed_from_u64(seed);

    (0..len)
        .map(|_| FALLBACK_ALPHABET[rng.gen_range(0..FALLBACK_ALPHABET.len())] as char)
        .collect()
}
