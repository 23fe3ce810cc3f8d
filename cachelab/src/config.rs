use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The geometry of a set-associative cache
///
/// A geometry is the triple (s, E, b): `set_bits` selects one of `2^s` sets,
/// `associativity` is the number of lines per set, and `block_bits` gives a
/// block size of `2^b` bytes
///
/// The geometry also owns address decomposition: the low `b` bits of an
/// address are the block offset, the next `s` bits are the set index, and
/// everything above is the tag. Two addresses map to the same line iff they
/// share both tag and set index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheGeometry {
    pub set_bits: u32,
    pub associativity: u32,
    pub block_bits: u32,
}

impl CacheGeometry {
    /// Creates a validated geometry
    ///
    /// # Arguments
    ///
    /// * `set_bits`: number of set index bits, `S = 2^s` sets
    /// * `associativity`: lines per set, must be at least 1
    /// * `block_bits`: number of block offset bits, `B = 2^b` bytes per block
    ///
    /// returns: Result<CacheGeometry, Error>
    pub fn new(set_bits: u32, associativity: u32, block_bits: u32) -> Result<Self, Error> {
        let geometry = Self {
            set_bits,
            associativity,
            block_bits,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Checks the geometry invariants: E >= 1, and s + b small enough that
    /// the tag shift on a 64-bit address is well defined
    pub fn validate(&self) -> Result<(), Error> {
        if self.associativity == 0 {
            return Err(Error::Config(
                "associativity must be at least 1".to_string(),
            ));
        }
        if self.set_bits.saturating_add(self.block_bits) >= u64::BITS {
            return Err(Error::Config(format!(
                "set bits ({}) plus block bits ({}) must be below {}",
                self.set_bits,
                self.block_bits,
                u64::BITS
            )));
        }
        Ok(())
    }

    /// The number of sets, `S = 2^s`
    pub fn num_sets(&self) -> u64 {
        1u64 << self.set_bits
    }

    /// The block size in bytes, `B = 2^b`
    pub fn block_size(&self) -> u64 {
        1u64 << self.block_bits
    }

    /// The total number of lines across all sets, if that many lines are
    /// representable at all. A valid geometry can still describe a cache
    /// far larger than addressable memory
    pub fn total_lines(&self) -> Option<usize> {
        let lines = self.num_sets().checked_mul(u64::from(self.associativity))?;
        usize::try_from(lines).ok()
    }

    /// The set an address maps to, taken from the low address bits
    /// immediately above the block offset
    pub fn set_index(&self, address: u64) -> u64 {
        (address >> self.block_bits) & (self.num_sets() - 1)
    }

    /// The tag of an address, everything above the set index bits. Not
    /// re-aligned as this isn't required
    pub fn tag(&self, address: u64) -> u64 {
        address >> (self.set_bits + self.block_bits)
    }

    /// Converts an address into a set index and a tag
    ///
    /// The set index is aligned such that it can be used as an index into a
    /// collection of sets
    pub fn decompose(&self, address: u64) -> (u64, u64) {
        (self.set_index(address), self.tag(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_associativity() {
        assert!(matches!(CacheGeometry::new(4, 0, 4), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_oversized_index_bits() {
        assert!(matches!(CacheGeometry::new(32, 1, 32), Err(Error::Config(_))));
        assert!(CacheGeometry::new(31, 1, 32).is_ok());
    }

    #[test]
    fn unrepresentable_line_counts_are_detected() {
        // Valid geometry (s + b < 64), but 2^62 sets of 8 lines overflow
        let geometry = CacheGeometry::new(62, 8, 0).unwrap();
        assert_eq!(geometry.total_lines(), None);
        assert_eq!(CacheGeometry::new(4, 8, 6).unwrap().total_lines(), Some(128));
    }

    #[test]
    fn decomposes_between_offset_and_tag() {
        // 4 byte blocks, 8 sets: offset bits 0..2, set bits 2..5, tag above
        let geometry = CacheGeometry::new(3, 2, 2).unwrap();
        let address = 0b1011_101_11u64;
        assert_eq!(geometry.set_index(address), 0b101);
        assert_eq!(geometry.tag(address), 0b1011);
        assert_eq!(geometry.decompose(address), (0b101, 0b1011));
    }

    #[test]
    fn same_line_iff_same_set_and_tag() {
        let geometry = CacheGeometry::new(2, 1, 4).unwrap();
        // Same block, different offsets
        assert_eq!(geometry.decompose(0x103), geometry.decompose(0x10f));
        // Same set, different tags
        let (set_a, tag_a) = geometry.decompose(0x100);
        let (set_b, tag_b) = geometry.decompose(0x140);
        assert_eq!(set_a, set_b);
        assert_ne!(tag_a, tag_b);
    }

    #[test]
    fn degenerate_geometry_decomposes() {
        // One set, one byte blocks: the whole address is the tag
        let geometry = CacheGeometry::new(0, 1, 0).unwrap();
        assert_eq!(geometry.decompose(0xdead_beef), (0, 0xdead_beef));
    }
}
