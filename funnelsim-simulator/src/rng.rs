//! # Seeded random stream
//!
//! One `SimRng` is created per run and passed by `&mut` through every user
//! and every stage. Output is reproducible from the seed alone as long as
//! callers consume draws in the same order.
//!
//! The stream is MT19937 seeded through `init_by_array`, and every draw is
//! built from 32-bit words the way CPython's `random` module builds it:
//! integers by rejection on the top `k` bits, floats from two words with
//! 53 bits of precision. A seed therefore yields the same funnel here as in
//! runs recorded by the Python tooling.

use rand_mt::Mt;

/// Words of fresh randomness behind each event id.
const EVENT_ID_WORDS: usize = 4;

#[derive(Debug, Clone)]
pub struct SimRng {
    inner: Mt,
}

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        // Little-endian 32-bit chunks with high zero chunks dropped.
        let lo = seed as u32;
        let hi = (seed >> 32) as u32;
        let inner = if hi == 0 {
            Mt::new_with_key([lo])
        } else {
            Mt::new_with_key([lo, hi])
        };
        Self { inner }
    }

    fn word(&mut self) -> u32 {
        self.inner.next_u32()
    }

    /// Top `k` bits of the stream, `k <= 64`. Zero bits draw nothing.
    fn bits(&mut self, k: u32) -> u64 {
        match k {
            0 => 0,
            1..=32 => u64::from(self.word() >> (32 - k)),
            _ => {
                let low = u64::from(self.word());
                let high = u64::from(self.word() >> (64 - k));
                low | (high << 32)
            }
        }
    }

    /// Uniform integer in `[0, n)` by rejection; `n` must be non-zero.
    fn below(&mut self, n: u64) -> u64 {
        let k = u64::BITS - n.leading_zeros();
        loop {
            let r = self.bits(k);
            if r < n {
                return r;
            }
        }
    }

    /// Uniform integer in `[lo, hi]`, both inclusive.
    ///
    /// An inverted range returns `lo` without consuming a draw.
    pub fn int_between(&mut self, lo: u64, hi: u64) -> u64 {
        if lo > hi {
            return lo;
        }
        match (hi - lo).checked_add(1) {
            Some(span) => lo + self.below(span),
            None => self.bits(64),
        }
    }

    /// Uniform float in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        let a = f64::from(self.word() >> 5);
        let b = f64::from(self.word() >> 6);
        (a * 67_108_864.0 + b) / 9_007_199_254_740_992.0
    }

    /// Bernoulli gate: true with probability `p`.
    pub fn passes(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// Uniform choice. `None` only for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.below(items.len() as u64) as usize;
        items.get(idx)
    }

    /// Weighted choice over `items` using a single `unit()` draw scaled by
    /// the weight total and a cumulative walk.
    pub fn weighted_pick<'a, T, F>(&mut self, items: &'a [T], weight: F) -> Option<&'a T>
    where
        F: Fn(&T) -> f64,
    {
        if items.is_empty() {
            return None;
        }
        let total: f64 = items.iter().map(&weight).sum();
        let target = self.unit() * total;

        let mut cumulative = 0.0;
        for item in items {
            cumulative += weight(item);
            if target < cumulative {
                return Some(item);
            }
        }
        items.last()
    }

    /// Event id: BLAKE3 of freshly drawn bytes, first 128 bits as hex.
    pub fn event_id(&mut self) -> String {
        let mut entropy = [0u8; EVENT_ID_WORDS * 4];
        for chunk in entropy.chunks_exact_mut(4) {
            chunk.copy_from_slice(&self.word().to_le_bytes());
        }
        let hash = blake3::hash(&entropy);
        hex::encode(&hash.as_bytes()[..16])
    }
}
