//! Process-wide CSPRNG
//!
//! A single `StdRng` (ChaCha-based) seeded from the operating system, created
//! once behind a `OnceLock` and shared by every thread. All entry points call
//! [`ensure_initialized`] themselves, so callers never need to run [`init`]
//! first. A process that forks reseeds on first use in the child.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

use crate::error::{CryptoError, CryptoResult};
use crate::primitives;
use crate::SEED_BYTES;

struct Csprng {
    state: Mutex<RngState>,
}

struct RngState {
    rng: StdRng,
    pid: u32,
}

impl RngState {
    fn seed() -> Self {
        let rng = match StdRng::from_rng(OsRng) {
            Ok(rng) => rng,
            Err(e) => {
                tracing::error!("system entropy source unavailable, aborting: {e}");
                std::process::abort();
            }
        };
        let pid = std::process::id();
        tracing::debug!(pid, "CSPRNG seeded from OS entropy");
        Self { rng, pid }
    }

    /// Reseed if this state was seeded in a process other than `pid`.
    ///
    /// Returns whether a reseed happened.
    fn reseed_if_forked(&mut self, pid: u32) -> bool {
        if self.pid == pid {
            return false;
        }
        tracing::debug!(old_pid = self.pid, pid, "process id changed, reseeding CSPRNG");
        *self = Self::seed();
        true
    }
}

static CSPRNG: OnceLock<Csprng> = OnceLock::new();

/// Seed the global generator if that has not happened yet.
pub fn ensure_initialized() {
    csprng();
}

fn csprng() -> &'static Csprng {
    CSPRNG.get_or_init(|| Csprng {
        state: Mutex::new(RngState::seed()),
    })
}

impl Csprng {
    /// Lock the generator, reseeding first if we are in a forked child.
    fn lock(&self) -> MutexGuard<'_, RngState> {
        // RNG state stays valid across a panic, so poisoning is ignored
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.reseed_if_forked(std::process::id());
        state
    }
}

/// Initialize the CSPRNG. Idempotent and safe to call from any thread.
///
/// Always returns `true`; failure to obtain entropy aborts the process.
pub fn init() -> bool {
    ensure_initialized();
    true
}

/// A uniformly distributed 32-bit value.
pub fn random_u32() -> u32 {
    csprng().lock().rng.next_u32()
}

/// A uniformly distributed value in `[0, upper_bound)` without modulo bias.
///
/// Values below `2^32 mod upper_bound` are rejected so the remaining range is
/// an exact multiple of `upper_bound`.
pub fn random_uniform(upper_bound: u32) -> CryptoResult<u32> {
    if upper_bound == 0 {
        return Err(CryptoError::ZeroUpperBound);
    }
    if upper_bound == 1 {
        return Ok(0);
    }

    let min = upper_bound.wrapping_neg() % upper_bound;
    let mut state = csprng().lock();
    loop {
        let r = state.rng.next_u32();
        if r >= min {
            return Ok(r % upper_bound);
        }
    }
}

/// Fill `out` with CSPRNG output.
pub fn random_buf(out: &mut [u8]) {
    csprng().lock().rng.fill_bytes(out);
}

/// Fill `out` with a reproducible stream derived from `seed`.
///
/// Identical seeds always give identical output, across processes and
/// versions; this does not touch the global generator.
pub fn random_buf_deterministic(out: &mut [u8], seed: &[u8; SEED_BYTES]) {
    primitives::keyed_hash(seed, &[b"hydrobox-random-deterministic".as_slice()], out);
}

/// Discard the current generator state and reseed from the OS.
pub fn random_reseed() {
    *csprng().lock() = RngState::seed();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        assert!(init());
        assert!(init());
        assert!(init());
    }

    #[test]
    fn test_consecutive_u32_differ() {
        let mut repeats = 0;
        for _ in 0..1000 {
            if random_u32() == random_u32() {
                repeats += 1;
            }
        }
        // 1000 draws from 2^32 values: a single collision is already unlikely
        assert!(repeats <= 1, "too many repeated values: {repeats}");
    }

    #[test]
    fn test_uniform_respects_bounds() {
        for _ in 0..1000 {
            let r = random_uniform(2).unwrap();
            assert!(r < 2);
        }
        for bound in [1, 3, 7, 1000, u32::MAX] {
            assert!(random_uniform(bound).unwrap() < bound);
        }
    }

    #[test]
    fn test_uniform_zero_bound_is_caller_error() {
        assert_eq!(random_uniform(0), Err(CryptoError::ZeroUpperBound));
    }

    #[test]
    fn test_uniform_covers_range_without_bias() {
        const BOUND: u32 = 10;
        const SAMPLES: usize = 100_000;

        let mut counts = [0usize; BOUND as usize];
        for _ in 0..SAMPLES {
            counts[random_uniform(BOUND).unwrap() as usize] += 1;
        }

        // Expected 10_000 per bucket, sigma ~95; 8 sigma keeps this from flaking
        let expected = SAMPLES / BOUND as usize;
        for (value, &count) in counts.iter().enumerate() {
            assert!(
                count.abs_diff(expected) < 800,
                "value {value} drawn {count} times (expected ~{expected})"
            );
        }
    }

    #[test]
    fn test_random_buf_fills() {
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        random_buf(&mut a);
        random_buf(&mut b);
        assert_ne!(a, [0u8; 64]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_deterministic_buf_is_reproducible() {
        let mut a = [0u8; 100];
        let mut b = [0u8; 100];
        let mut c = [0u8; 100];
        random_buf_deterministic(&mut a, &[1u8; SEED_BYTES]);
        random_buf_deterministic(&mut b, &[1u8; SEED_BYTES]);
        random_buf_deterministic(&mut c, &[2u8; SEED_BYTES]);
        assert_eq!(a, b, "same seed must give same output");
        assert_ne!(a, c, "different seeds must give different output");
    }

    #[test]
    fn test_deterministic_buf_prefix_stable() {
        let mut short = [0u8; 16];
        let mut long = [0u8; 64];
        random_buf_deterministic(&mut short, &[9u8; SEED_BYTES]);
        random_buf_deterministic(&mut long, &[9u8; SEED_BYTES]);
        assert_eq!(short, long[..16]);
    }

    #[test]
    fn test_reseed_keeps_generator_usable() {
        random_reseed();
        let mut buf = [0u8; 32];
        random_buf(&mut buf);
        assert_ne!(buf, [0u8; 32]);
    }

    #[test]
    fn test_reseed_on_pid_change() {
        let pid = std::process::id();
        let mut state = RngState::seed();
        assert!(!state.reseed_if_forked(pid), "same process must not reseed");

        // state inherited from a parent process
        state.pid = pid.wrapping_add(1);
        let mut parent = [0u8; 32];
        state.rng.clone().fill_bytes(&mut parent);

        assert!(state.reseed_if_forked(pid));
        assert_eq!(state.pid, pid);

        let mut child = [0u8; 32];
        state.rng.fill_bytes(&mut child);
        assert_ne!(parent, child, "child must not replay the parent's stream");
    }

    #[test]
    fn test_concurrent_first_use() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| (init(), random_u32())))
            .collect();
        for handle in handles {
            let (ok, _) = handle.join().unwrap();
            assert!(ok);
        }
    }
}
