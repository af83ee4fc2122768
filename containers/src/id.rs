use crate::error::ContainerErrors;
use std::fmt;
use std::str::FromStr;

/// A 64-bit segmentation id.
///
/// Ids are plain values: they are copied, never shared, so an id captured for an
/// asynchronous request cannot change underneath it.
#[repr(transparent)]
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    bytemuck::Pod,
    bytemuck::Zeroable,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Uint64(pub u64);

/// Leaf (or arbitrary level) id of the segmentation
pub type SegmentId = Uint64;
/// Id a segment currently resolves to at the top of the merge hierarchy
pub type RootId = Uint64;

impl Uint64 {
    pub const ZERO: Uint64 = Uint64(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Build an id from its low and high 32-bit words
    pub const fn from_halves(low: u32, high: u32) -> Self {
        Self(((high as u64) << 32) | low as u64)
    }

    pub const fn low(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }

    pub const fn high(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Decodes an array of ids packed as pairs of little-endian 32-bit words (low word first)
    pub fn decode_packed(bytes: &[u8]) -> Result<Vec<Uint64>, ContainerErrors> {
        if bytes.len() % 8 != 0 {
            return Err(ContainerErrors::PackedLength(bytes.len()));
        }
        Ok(bytes
            .chunks_exact(8)
            .map(|word| {
                let low = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
                let high = u32::from_le_bytes([word[4], word[5], word[6], word[7]]);
                Uint64::from_halves(low, high)
            })
            .collect())
    }

    /// Inverse of [`Uint64::decode_packed`]
    pub fn encode_packed(ids: &[Uint64]) -> Vec<u8> {
        let mut out = Vec::with_capacity(ids.len() * 8);
        for id in ids {
            out.extend_from_slice(&id.low().to_le_bytes());
            out.extend_from_slice(&id.high().to_le_bytes());
        }
        out
    }
}

impl From<u64> for Uint64 {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Uint64> for u64 {
    fn from(value: Uint64) -> Self {
        value.0
    }
}

impl fmt::Display for Uint64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Uint64 {
    type Err = ContainerErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Uint64)
            .map_err(|_| ContainerErrors::InvalidId(s.to_string()))
    }
}
