// Minimal PRNG (no external crates).
//
// This is NOT cryptographically secure.
// It is used only for topology generation, weight draws, and stimulation
// target picks, so that runs are reproducible from a single seed.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // Avoid a zero state.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        // Marsaglia / Vigna family. Simple, fast, decent for simulation noise.
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    #[inline]
    pub fn next_f32_01(&mut self) -> f32 {
        // Convert to [0,1).
        let x = self.next_u32();
        (x as f32) / (u32::MAX as f32 + 1.0)
    }

    #[inline]
    pub fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.next_f32_01()
    }

    #[inline]
    pub fn gen_range_usize(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        let span = (high - low) as u32;
        let v = self.next_u32() % span;
        low + v as usize
    }

    /// Bernoulli draw. `p >= 1.0` always hits, `p <= 0.0` never does.
    #[inline]
    pub fn gen_bool(&mut self, p: f32) -> bool {
        self.next_f32_01() < p
    }

    /// Pick `k` distinct indices from `0..n` (all of them when `k >= n`).
    ///
    /// Partial Fisher-Yates over an index scratch; order of the result is
    /// the shuffle order, not ascending.
    pub fn pick_distinct(&mut self, n: usize, k: usize) -> Vec<usize> {
        let mut scratch: Vec<usize> = (0..n).collect();
        let take = k.min(n);
        for i in 0..take {
            let j = self.gen_range_usize(i, n);
            scratch.swap(i, j);
        }
        scratch.truncate(take);
        scratch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Prng::new(42);
        let mut b = Prng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn zero_seed_is_remapped() {
        let mut a = Prng::new(0);
        let mut b = Prng::new(0x9E3779B97F4A7C15);
        assert_eq!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn unit_floats_stay_in_range() {
        let mut rng = Prng::new(7);
        for _ in 0..1000 {
            let v = rng.next_f32_01();
            // The division can round the very top of the u32 range up to 1.0.
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn bool_extremes() {
        let mut rng = Prng::new(3);
        for _ in 0..100 {
            assert!(!rng.gen_bool(0.0));
            assert!(rng.gen_bool(1.0));
        }
    }

    #[test]
    fn pick_distinct_is_distinct_and_bounded() {
        let mut rng = Prng::new(11);
        let picked = rng.pick_distinct(10, 5);
        assert_eq!(picked.len(), 5);
        for (i, &a) in picked.iter().enumerate() {
            assert!(a < 10);
            for &b in &picked[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(rng.pick_distinct(3, 50).len(), 3);
    }
}
