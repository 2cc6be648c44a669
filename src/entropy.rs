use crate::error::{Error, Result};
use crate::sample;
use chacha20::ChaCha20;
use chacha20::cipher::{KeyIvInit, StreamCipher};
use std::fmt;
use std::sync::Mutex;
use zeroize::Zeroizing;

pub const KEY_LEN: usize = 32;

const BUFFER_LEN: usize = 512;
const DRAW_LEN: usize = 8;
const SPAN: u128 = 1 << 64;

/// A source of uniformly distributed random draws.
///
/// Implementations must be safe to share between threads: stream state
/// lives behind interior locking so concurrent draws never reuse bytes.
pub trait EntropySource: Send + Sync {
    /// Returns an integer drawn uniformly from `[0, bound)`.
    fn below(&self, bound: u64) -> Result<u64>;

    /// Permutes `items` in place, every ordering equally likely.
    fn shuffle(&self, items: &mut [usize]) -> Result<()> {
        sample::shuffle(self, items)
    }
}

/// Number of 64-bit values that map onto `[0, bound)` without bias.
/// Draws at or above it are rejected.
fn rejection_threshold(bound: u64) -> u128 {
    SPAN - SPAN % bound as u128
}

// With the `zeroize` feature the cipher wipes its key state on drop.
struct Keystream {
    cipher: ChaCha20,
    buffer: Zeroizing<[u8; BUFFER_LEN]>,
    pos: usize,
}

impl Keystream {
    fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: ChaCha20::new(key.into(), &[0u8; 12].into()),
            buffer: Zeroizing::new([0u8; BUFFER_LEN]),
            pos: BUFFER_LEN,
        }
    }

    fn refill(&mut self) -> Result<()> {
        self.buffer.fill(0);
        self.cipher
            .try_apply_keystream(&mut self.buffer[..])
            .map_err(|_| Error::EntropySourceFailure("ChaCha20 keystream exhausted".into()))?;
        self.pos = 0;
        Ok(())
    }

    fn next_u64(&mut self) -> Result<u64> {
        if self.pos + DRAW_LEN > BUFFER_LEN {
            self.refill()?;
        }

        let mut bytes = [0u8; DRAW_LEN];
        bytes.copy_from_slice(&self.buffer[self.pos..self.pos + DRAW_LEN]);
        self.pos += DRAW_LEN;

        Ok(u64::from_le_bytes(bytes))
    }

    fn below(&mut self, bound: u64) -> Result<u64> {
        if bound == 0 {
            return Err(Error::InvalidArgument(
                "upper bound of a random draw must be positive".into(),
            ));
        }

        let threshold = rejection_threshold(bound);

        loop {
            let value = self.next_u64()?;
            if (value as u128) < threshold {
                return Ok(value % bound);
            }
        }
    }
}

/// The default secure source: a ChaCha20 keystream keyed once from the
/// operating system's random source.
pub struct ChaChaSource {
    stream: Mutex<Keystream>,
}

impl ChaChaSource {
    /// Keys a fresh stream with 32 bytes from the OS. There is no fallback:
    /// if the OS cannot supply randomness, construction fails.
    pub fn from_os() -> Result<Self> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        getrandom::fill(&mut key[..])?;
        log::debug!("Seeded ChaCha20 keystream from the OS random source");
        Ok(Self::from_key(&key))
    }

    /// Keys the stream with a caller-supplied key. The same key always
    /// yields the same sequence of draws.
    pub fn from_key(key: &[u8; KEY_LEN]) -> Self {
        Self {
            stream: Mutex::new(Keystream::new(key)),
        }
    }
}

impl fmt::Debug for ChaChaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChaChaSource").finish_non_exhaustive()
    }
}

impl EntropySource for ChaChaSource {
    fn below(&self, bound: u64) -> Result<u64> {
        let mut stream = self
            .stream
            .lock()
            .map_err(|_| Error::EntropySourceFailure("keystream lock poisoned".into()))?;
        stream.below(bound)
    }
}

/// Replays a fixed queue of draws. Fails once the queue runs dry or when a
/// scripted value does not fit the requested bound.
#[cfg(test)]
pub(crate) struct ScriptedSource {
    draws: Mutex<std::collections::VecDeque<u64>>,
}

#[cfg(test)]
impl ScriptedSource {
    pub(crate) fn new(draws: impl IntoIterator<Item = u64>) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.draws.lock().map(|d| d.len()).unwrap_or(0)
    }
}

#[cfg(test)]
impl EntropySource for ScriptedSource {
    fn below(&self, bound: u64) -> Result<u64> {
        if bound == 0 {
            return Err(Error::InvalidArgument(
                "upper bound of a random draw must be positive".into(),
            ));
        }

        let mut draws = self
            .draws
            .lock()
            .map_err(|_| Error::EntropySourceFailure("script lock poisoned".into()))?;
        let value = draws
            .pop_front()
            .ok_or_else(|| Error::EntropySourceFailure("script exhausted".into()))?;

        if value >= bound {
            return Err(Error::EntropySourceFailure(format!(
                "scripted draw {} outside [0, {})",
                value, bound
            )));
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_rejection_threshold() {
        assert_eq!(rejection_threshold(1), SPAN);
        assert_eq!(rejection_threshold(2), SPAN);
        assert_eq!(rejection_threshold(1 << 32), SPAN);
        assert_eq!(rejection_threshold(3), SPAN - 1);
        assert_eq!(rejection_threshold(10), SPAN - 6);
        assert_eq!(rejection_threshold(2048), SPAN);
        assert_eq!(rejection_threshold(u64::MAX), SPAN - 1);

        for bound in [3u64, 6, 7, 10, 100, 7776, 1_000_000_007] {
            let threshold = rejection_threshold(bound);
            assert_eq!(
                threshold % bound as u128,
                0,
                "Threshold for bound {} must be a multiple of the bound",
                bound
            );
            assert!(SPAN - threshold < bound as u128);
        }
    }

    #[test]
    fn test_keyed_source_deterministic() {
        let key = [42u8; 32];
        let a = ChaChaSource::from_key(&key);
        let b = ChaChaSource::from_key(&key);

        for bound in [2u64, 3, 10, 2048, 7776, u64::MAX] {
            assert_eq!(a.below(bound).unwrap(), b.below(bound).unwrap());
        }
    }

    #[test]
    fn test_different_keys_different_draws() {
        let a = ChaChaSource::from_key(&[1u8; 32]);
        let b = ChaChaSource::from_key(&[2u8; 32]);

        let draws_a: Vec<u64> = (0..16).map(|_| a.below(u64::MAX).unwrap()).collect();
        let draws_b: Vec<u64> = (0..16).map(|_| b.below(u64::MAX).unwrap()).collect();

        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn test_keystream_regression() {
        let source = ChaChaSource::from_key(&[42u8; 32]);
        let draws: Vec<u64> = (0..4).map(|_| source.below(1000).unwrap()).collect();

        assert_eq!(draws, vec![632, 788, 86, 878]);
    }

    #[test]
    fn test_draws_cross_buffer_boundary() {
        let source = ChaChaSource::from_key(&[7u8; 32]);

        for _ in 0..(BUFFER_LEN / DRAW_LEN) * 3 + 5 {
            let value = source.below(37).unwrap();
            assert!(value < 37, "Draw {} escaped bound 37", value);
        }
    }

    #[test]
    fn test_zero_bound_rejected() {
        let source = ChaChaSource::from_key(&[0u8; 32]);
        assert!(matches!(source.below(0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_unit_bound_always_zero() {
        let source = ChaChaSource::from_key(&[9u8; 32]);
        for _ in 0..100 {
            assert_eq!(source.below(1).unwrap(), 0);
        }
    }

    #[test]
    fn test_os_sources_are_independent() {
        let a = ChaChaSource::from_os().unwrap();
        let b = ChaChaSource::from_os().unwrap();

        let draws_a: Vec<u64> = (0..8).map(|_| a.below(u64::MAX).unwrap()).collect();
        let draws_b: Vec<u64> = (0..8).map(|_| b.below(u64::MAX).unwrap()).collect();

        assert_ne!(draws_a, draws_b, "Two OS-seeded sources produced the same stream");
    }

    #[test]
    fn test_uniform_small_bound() {
        let source = ChaChaSource::from_os().unwrap();
        let trials = 60_000;
        let mut counts = [0usize; 6];

        for _ in 0..trials {
            counts[source.below(6).unwrap() as usize] += 1;
        }

        let expected = trials / 6;
        for (face, &count) in counts.iter().enumerate() {
            println!("Face {}: {}", face, count);
            assert!(
                count.abs_diff(expected) < expected / 10,
                "Face {} drawn {} times, expected about {}",
                face,
                count,
                expected
            );
        }
    }

    #[test]
    fn test_shared_across_threads() {
        let source: Arc<dyn EntropySource> = Arc::new(ChaChaSource::from_os().unwrap());

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let source = Arc::clone(&source);
                scope.spawn(move || {
                    for _ in 0..1000 {
                        assert!(source.below(10).unwrap() < 10);
                    }
                });
            }
        });
    }

    #[test]
    fn test_keystream_state_wiped_on_drop() {
        fn assert_zeroize_on_drop<T: zeroize::ZeroizeOnDrop>() {}

        assert_zeroize_on_drop::<ChaCha20>();
        assert_zeroize_on_drop::<Zeroizing<[u8; BUFFER_LEN]>>();
    }

    #[test]
    fn test_debug_hides_key() {
        let source = ChaChaSource::from_key(&[0xAB; 32]);
        let rendered = format!("{:?}", source);

        assert_eq!(rendered, "ChaChaSource { .. }");
    }

    #[test]
    fn test_scripted_source_replays_and_exhausts() {
        let source = ScriptedSource::new([3, 0, 1]);

        assert_eq!(source.below(4).unwrap(), 3);
        assert_eq!(source.below(1).unwrap(), 0);
        assert_eq!(source.remaining(), 1);
        assert!(matches!(source.below(1), Err(Error::EntropySourceFailure(_))));
        assert!(matches!(source.below(5), Err(Error::EntropySourceFailure(_))));
    }
}
