//! Seed handling and the deterministic random source.
//!
//! The host hands the sketch a 64-character hexadecimal hash once at load
//! time. [`Sfc32`] turns that hash into a stream of `f64` values in `[0, 1)`;
//! the same hash always yields the same stream.

use std::fmt;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Number of hexadecimal digits in a seed.
pub const SEED_LEN: usize = 64;

/// A validated 64-digit hexadecimal seed.
#[derive(Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct SeedHash(String);

impl SeedHash {
    /// Validate and wrap a seed string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSeed`] unless `hash` is exactly 64 ASCII hex
    /// digits.
    pub fn parse(hash: impl Into<String>) -> Result<Self> {
        let hash = hash.into();
        if hash.len() != SEED_LEN {
            return Err(Error::invalid_seed(format!(
                "expected {SEED_LEN} hex digits, got {}",
                hash.len()
            )));
        }
        if let Some(bad) = hash.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(Error::invalid_seed(format!("non-hex character {bad:?}")));
        }
        Ok(Self(hash))
    }

    /// The seed as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fold the seed into four 32-bit words.
    ///
    /// Each quarter of the hash (16 hex digits) is read as a `u64` and its
    /// halves are xor-ed together.
    #[must_use]
    pub fn words(&self) -> [u32; 4] {
        let mut words = [0u32; 4];
        for (word, chunk) in words.iter_mut().zip(self.0.as_bytes().chunks(SEED_LEN / 4)) {
            let value = chunk.iter().fold(0u64, |acc, &b| {
                // Validated in `parse`, so every byte is a hex digit.
                let digit = char::from(b).to_digit(16).unwrap_or(0);
                (acc << 4) | u64::from(digit)
            });
            #[expect(clippy::cast_possible_truncation)]
            {
                *word = ((value >> 32) ^ value) as u32;
            }
        }
        words
    }
}

impl TryFrom<String> for SeedHash {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl fmt::Debug for SeedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeedHash({})", self.0)
    }
}

impl fmt::Display for SeedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stream of uniformly distributed floats in `[0, 1)`.
///
/// Any `FnMut() -> f64` closure is a random source, so hosts can inject their
/// own generator.
pub trait RandomSource {
    /// Draw the next value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;
}

impl<F> RandomSource for F
where
    F: FnMut() -> f64,
{
    fn next_f64(&mut self) -> f64 {
        self()
    }
}

/// The sfc32 "small fast counting" generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sfc32 {
    a: u32,
    b: u32,
    c: u32,
    d: u32,
}

impl Sfc32 {
    /// Build a generator from raw state words.
    #[must_use]
    pub fn new([a, b, c, d]: [u32; 4]) -> Self {
        Self { a, b, c, d }
    }

    /// Build a generator seeded from a hash.
    #[must_use]
    pub fn from_seed(seed: &SeedHash) -> Self {
        Self::new(seed.words())
    }

    /// Advance the state and return the next raw 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        let t = self.a.wrapping_add(self.b).wrapping_add(self.d);
        self.d = self.d.wrapping_add(1);
        self.a = self.b ^ (self.b >> 9);
        self.b = self.c.wrapping_add(self.c << 3);
        self.c = self.c.rotate_left(21);
        self.c = self.c.wrapping_add(t);
        t
    }
}

impl RandomSource for Sfc32 {
    fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}
