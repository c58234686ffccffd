//! Seedable pseudo-random generators and Gaussian sampling for path simulation.
//!
//! Generators are explicit values owned by the caller; nothing here touches
//! process-global random state, so concurrent valuations never interfere.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::math::fast_norm::acklam_inv_cdf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FastRngKind {
    #[default]
    Xoshiro256PlusPlus,
    Pcg64,
    StdRng,
    /// NumPy's legacy `RandomState` stream: MT19937 seeded with a 32-bit
    /// integer, Gaussians by the Marsaglia polar method.
    NumpyLegacy,
}

impl FastRngKind {
    /// `true` when one generator must serve a whole run in order, so pairs
    /// cannot be given independent sub-streams.
    #[inline]
    pub fn is_single_stream(self) -> bool {
        matches!(self, Self::NumpyLegacy)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xoshiro256PlusPlus => "xoshiro256_plus_plus",
            Self::Pcg64 => "pcg64",
            Self::StdRng => "std_rng",
            Self::NumpyLegacy => "numpy_legacy",
        }
    }
}

impl std::str::FromStr for FastRngKind {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        [
            Self::Xoshiro256PlusPlus,
            Self::Pcg64,
            Self::StdRng,
            Self::NumpyLegacy,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == name)
        .ok_or_else(|| format!("unknown rng kind `{name}`"))
    }
}

#[derive(Debug, Clone)]
pub struct Xoshiro256PlusPlus {
    state: [u64; 4],
}

impl Xoshiro256PlusPlus {
    #[inline]
    pub fn seed_from_u64(seed: u64) -> Self {
        let mut sm = SplitMix64::new(seed);
        let mut state = [0_u64; 4];
        for item in &mut state {
            *item = sm.next_u64();
        }

        if state.iter().all(|&x| x == 0) {
            state[0] = 1;
        }

        Self { state }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.state[0].wrapping_add(self.state[3]))
            .rotate_left(23)
            .wrapping_add(self.state[0]);

        let t = self.state[1] << 17;

        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];

        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);

        result
    }

    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        unit_f64(self.next_u64())
    }
}

#[derive(Debug, Clone)]
pub struct Pcg64 {
    state: u128,
    inc: u128,
}

impl Pcg64 {
    const MULTIPLIER: u128 = 47026247687942121848144207491837523525;

    #[inline]
    pub fn seed_from_u64(seed: u64) -> Self {
        let mut sm = SplitMix64::new(seed);
        let state_hi = sm.next_u64() as u128;
        let state_lo = sm.next_u64() as u128;
        let stream = sm.next_u64() as u128;

        let mut rng = Self {
            state: (state_hi << 64) | state_lo,
            inc: (stream << 1) | 1,
        };
        let _ = rng.next_u64();
        rng
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let oldstate = self.state;
        self.state = oldstate
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(self.inc);

        // XSL-RR 128/64 output permutation.
        let xorshifted = ((oldstate >> 64) ^ oldstate) as u64;
        let rot = (oldstate >> 122) as u32;
        xorshifted.rotate_right(rot)
    }

    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        unit_f64(self.next_u64())
    }
}

/// MT19937 with NumPy's legacy seeding (`init_genrand`) and 53-bit doubles.
#[derive(Debug, Clone)]
pub struct Mt19937 {
    state: [u32; Self::N],
    pos: usize,
}

impl Mt19937 {
    const N: usize = 624;
    const M: usize = 397;
    const MATRIX_A: u32 = 0x9908_b0df;
    const UPPER_MASK: u32 = 0x8000_0000;
    const LOWER_MASK: u32 = 0x7fff_ffff;

    pub fn seed_from_u32(seed: u32) -> Self {
        let mut state = [0_u32; Self::N];
        state[0] = seed;
        for i in 1..Self::N {
            let prev = state[i - 1];
            state[i] = 1_812_433_253_u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        Self {
            state,
            pos: Self::N,
        }
    }

    fn twist(&mut self) {
        for i in 0..Self::N {
            let y = (self.state[i] & Self::UPPER_MASK)
                | (self.state[(i + 1) % Self::N] & Self::LOWER_MASK);
            let mut next = self.state[(i + Self::M) % Self::N] ^ (y >> 1);
            if y & 1 != 0 {
                next ^= Self::MATRIX_A;
            }
            self.state[i] = next;
        }
        self.pos = 0;
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        if self.pos >= Self::N {
            self.twist();
        }
        let mut y = self.state[self.pos];
        self.pos += 1;

        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^ (y >> 18)
    }

    /// `[0, 1)` from two outputs: 27 high bits then 26, as NumPy's `random_sample`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        let a = (self.next_u32() >> 5) as f64;
        let b = (self.next_u32() >> 6) as f64;
        (a * 67_108_864.0 + b) / 9_007_199_254_740_992.0
    }
}

/// MT19937 plus the spare polar-method Gaussian, matching NumPy's
/// `RandomState.normal` draw for draw.
#[derive(Debug)]
pub struct NumpyLegacyRng {
    mt: Mt19937,
    spare: Option<f64>,
}

impl NumpyLegacyRng {
    pub fn seed_from_u32(seed: u32) -> Self {
        Self {
            mt: Mt19937::seed_from_u32(seed),
            spare: None,
        }
    }

    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.mt.next_f64()
    }

    pub fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        loop {
            let x1 = 2.0 * self.mt.next_f64() - 1.0;
            let x2 = 2.0 * self.mt.next_f64() - 1.0;
            let r2 = x1 * x1 + x2 * x2;
            if r2 < 1.0 && r2 != 0.0 {
                let f = (-2.0 * r2.ln() / r2).sqrt();
                self.spare = Some(f * x1);
                return f * x2;
            }
        }
    }
}

/// 53 high bits mapped onto `[0, 1)`.
#[inline(always)]
fn unit_f64(x: u64) -> f64 {
    (x >> 11) as f64 * (1.0 / ((1_u64 << 53) as f64))
}

#[derive(Debug)]
pub enum FastRng {
    Xoshiro256PlusPlus(Xoshiro256PlusPlus),
    Pcg64(Pcg64),
    StdRng(StdRng),
    NumpyLegacy(NumpyLegacyRng),
}

impl FastRng {
    /// Generator of `kind` seeded with `seed`.
    ///
    /// `NumpyLegacy` keeps only the low 32 bits of the seed, as NumPy accepts
    /// seeds in `0..2^32`; [`WarrantMcConfig`](crate::engines::monte_carlo::WarrantMcConfig)
    /// rejects wider seeds for that kind before a run starts.
    #[inline]
    pub fn from_seed(kind: FastRngKind, seed: u64) -> Self {
        match kind {
            FastRngKind::Xoshiro256PlusPlus => {
                Self::Xoshiro256PlusPlus(Xoshiro256PlusPlus::seed_from_u64(seed))
            }
            FastRngKind::Pcg64 => Self::Pcg64(Pcg64::seed_from_u64(seed)),
            FastRngKind::StdRng => Self::StdRng(StdRng::seed_from_u64(seed)),
            FastRngKind::NumpyLegacy => {
                Self::NumpyLegacy(NumpyLegacyRng::seed_from_u32(seed as u32))
            }
        }
    }

    #[inline]
    pub fn random_f64(&mut self) -> f64 {
        match self {
            Self::Xoshiro256PlusPlus(rng) => rng.next_f64(),
            Self::Pcg64(rng) => rng.next_f64(),
            Self::StdRng(rng) => rng.random::<f64>(),
            Self::NumpyLegacy(rng) => rng.next_f64(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    #[inline]
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

/// Seed of sub-stream `stream_index` derived from a run's base seed.
///
/// Each antithetic pair draws from its own sub-stream, so the draws a pair sees
/// do not depend on how pairs are scheduled across threads.
#[inline]
pub fn stream_seed(base_seed: u64, stream_index: usize) -> u64 {
    base_seed.wrapping_add((stream_index as u64).wrapping_mul(7_919))
}

/// Maps [0, 1) to (ε, 1−ε) so the inverse CDF stays finite.
#[inline(always)]
pub fn uniform_open01(u: f64) -> f64 {
    u.max(f64::EPSILON).min(1.0 - f64::EPSILON)
}

/// One standard normal draw.
///
/// Sub-stream generators invert exactly one uniform; `NumpyLegacy` uses the
/// polar method so its draws match NumPy's.
#[inline(always)]
pub fn sample_standard_normal(rng: &mut FastRng) -> f64 {
    match rng {
        FastRng::NumpyLegacy(legacy) => legacy.standard_normal(),
        other => acklam_inv_cdf(uniform_open01(other.random_f64())),
    }
}
