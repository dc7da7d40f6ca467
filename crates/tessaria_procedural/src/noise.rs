//! # Simplex Noise
//!
//! Deterministic 2D coherent noise for every generated field: the biome
//! raster, surface heights, caves and the per-ore fields.
//!
//! ## Determinism Guarantee
//!
//! Given the same [`WorldSeed`], every sampler here produces exactly the same
//! values on any platform. Each field derives its own sub-seed so that, for
//! example, adding an ore never shifts the cave layout.
//!
//! ## Sampling Convention
//!
//! Fields are sampled at `((x + offset) * frequency, (y + offset) * frequency)`
//! where `offset` is derived from the field's seed, and mapped from `[-1, 1]`
//! to `[0, 1]`.

use tessaria_core::Grid;

/// Sub-seed purposes. Every random stream in the world derives from one of these.
pub mod purpose {
    /// Biome raster noise.
    pub const BIOME: u64 = 1;
    /// Surface height noise.
    pub const TERRAIN: u64 = 2;
    /// Cave noise.
    pub const CAVE: u64 = 3;
    /// Flora, tree and cactus placement.
    pub const FEATURES: u64 = 4;
    /// Interior sprite variety.
    pub const SPRITES: u64 = 5;
    /// Base for ore fields; ore `i` uses `ORE_BASE + i`.
    pub const ORE_BASE: u64 = 64;
}

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives an independent sub-seed for a specific purpose.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }

    /// Sampling offset for fields built from this seed, in `[0, 10000)`.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> f64 {
        (self.0 % 10_000) as f64
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

/// Permutation and gradient tables, built once per seed.
struct PermutationTable {
    /// 256 entries, doubled to avoid index wrapping.
    perm: [u8; 512],
}

/// The 12 gradient directions of 2D simplex noise.
const GRADIENTS: [[i8; 2]; 12] = [
    [1, 0],
    [1, 1],
    [0, 1],
    [-1, 1],
    [-1, 0],
    [-1, -1],
    [0, -1],
    [1, -1],
    [1, 0],
    [0, 1],
    [-1, 0],
    [0, -1],
];

impl PermutationTable {
    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates with xorshift64; a zero state would never advance.
        let mut state = seed.value() | 1;
        for i in (1..256).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let j = (state as usize) % (i + 1);
            perm.swap(i, j);
        }
        let (low, high) = perm.split_at_mut(256);
        high.copy_from_slice(low);

        Self { perm }
    }

    #[inline]
    fn get(&self, index: usize) -> u8 {
        self.perm[index & 511]
    }
}

/// 2D Simplex noise generator.
///
/// Produces smooth, continuous noise values in the range [-1, 1].
///
/// # Example
///
/// ```rust,ignore
/// let noise = SimplexNoise::new(WorldSeed::new(42));
/// let value = noise.sample(100.5, 200.3);
/// assert!((-1.0..=1.0).contains(&value));
/// ```
pub struct SimplexNoise {
    perm_table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor, `(sqrt(3) - 1) / 2`.
    const F2: f64 = 0.366_025_403_784_439;
    /// Unskewing factor, `(3 - sqrt(3)) / 6`.
    const G2: f64 = 0.211_324_865_405_187;

    /// Creates a new simplex noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples 2D simplex noise in `[-1, 1]`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let skew = (x + y) * Self::F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        let unskew = f64::from(i + j) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        // Upper or lower triangle of the skewed cell.
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + Self::G2;
        let y1 = y0 - j1 as f64 + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let table = &self.perm_table;
        let gi0 = table.get(ii + table.get(jj) as usize);
        let gi1 = table.get(ii + i1 + table.get(jj + j1) as usize);
        let gi2 = table.get(ii + 1 + table.get(jj + 1) as usize);

        let n0 = corner(x0, y0, gi0);
        let n1 = corner(x1, y1, gi1);
        let n2 = corner(x2, y2, gi2);

        // 70 normalizes the sum to [-1, 1]; the clamp absorbs rounding.
        (70.0 * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }

    /// Samples noise mapped to `[0, 1]`.
    #[inline]
    #[must_use]
    pub fn sample01(&self, x: f64, y: f64) -> f64 {
        (self.sample(x, y) + 1.0) * 0.5
    }

    /// Octaved (fractal) noise, normalized to `[-1, 1]`.
    ///
    /// # Arguments
    ///
    /// * `octaves` - Number of layers
    /// * `persistence` - Amplitude decay per octave
    /// * `lacunarity` - Frequency growth per octave
    #[must_use]
    pub fn octaved(&self, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves.max(1) {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / max_amplitude
    }
}

/// Contribution of one simplex corner.
#[inline]
fn corner(x: f64, y: f64, hash: u8) -> f64 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        0.0
    } else {
        let grad = GRADIENTS[(hash % 12) as usize];
        let t2 = t * t;
        t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]))
    }
}

#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) {
        xi - 1
    } else {
        xi
    }
}

/// A seeded noise source bound to its sampling offset.
pub struct NoiseSampler {
    noise: SimplexNoise,
    offset: f64,
}

impl NoiseSampler {
    /// Creates a sampler for `seed`.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            noise: SimplexNoise::new(seed),
            offset: seed.offset(),
        }
    }

    /// The sampling offset.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> f64 {
        self.offset
    }

    /// `[0, 1]` noise at cell `(x, y)` for `frequency`.
    #[inline]
    #[must_use]
    pub fn at(&self, x: f64, y: f64, frequency: f64) -> f64 {
        self.noise
            .sample01((x + self.offset) * frequency, (y + self.offset) * frequency)
    }

    /// `[0, 1]` noise along a row at height zero of the offset plane,
    /// `((x + offset) * frequency, offset * frequency)`.
    #[inline]
    #[must_use]
    pub fn along(&self, x: f64, frequency: f64) -> f64 {
        self.noise
            .sample01((x + self.offset) * frequency, self.offset * frequency)
    }

    /// Builds a `size x size` field of `[0, 1]` samples.
    #[must_use]
    pub fn field(&self, size: usize, frequency: f64) -> Grid<f32> {
        Grid::from_fn(size, size, |x, y| {
            self.at(x as f64, y as f64, frequency) as f32
        })
    }
}
