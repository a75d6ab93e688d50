//! Fixed-width packed bit vectors and the store that holds one per entity.
//!
//! A `BitVector` packs membership flags into `u64` words so that set algebra
//! (intersection, union, population count) runs a word at a time. The
//! `BitVectorStore` preallocates one vector per entity, all with the same
//! width, and never grows: setting a bit outside the configured bounds is an
//! error rather than a silent truncation.

use crate::error::{IndexKind, JxError, Result};

pub type Word = u64;

const WORD_BITS: usize = Word::BITS as usize;

/// Number of words needed to hold `len` bits.
#[inline]
pub fn words_for(len: usize) -> usize {
    len.div_ceil(WORD_BITS)
}

/// Allocate a zeroed word buffer, reporting failure instead of aborting.
fn zeroed_words(num_words: usize) -> Result<Vec<Word>> {
    let mut words = Vec::new();
    words
        .try_reserve_exact(num_words)
        .map_err(|_| JxError::Allocation {
            bytes: num_words * std::mem::size_of::<Word>(),
        })?;
    words.resize(num_words, 0);

    Ok(words)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitVector {
    words: Vec<Word>,
    len: usize,
}

impl BitVector {
    /// Create an all-zero vector of `len` bits.
    pub fn zeros(len: usize) -> Result<Self> {
        Ok(BitVector {
            words: zeroed_words(words_for(len))?,
            len,
        })
    }

    /// Create a vector of `len` bits with the given positions set.
    pub fn from_indices(len: usize, indices: &[usize]) -> Result<Self> {
        let mut bv = BitVector::zeros(len)?;
        for &i in indices {
            bv.set(i)?;
        }

        Ok(bv)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Set bit `i`.
    pub fn set(&mut self, i: usize) -> Result<()> {
        if i >= self.len {
            return Err(JxError::IndexOutOfRange {
                kind: IndexKind::Bit,
                index: i,
                bound: self.len,
            });
        }
        self.words[i / WORD_BITS] |= 1 << (i % WORD_BITS);

        Ok(())
    }

    /// Return true if bit `i` is set. Positions past the end read as unset.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        if i >= self.len {
            return false;
        }
        (self.words[i / WORD_BITS] >> (i % WORD_BITS)) & 1 == 1
    }

    /// Reset every bit to zero, keeping the allocation.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Number of positions set in both vectors.
    #[inline]
    pub fn intersection_count(&self, other: &BitVector) -> usize {
        debug_assert_eq!(self.len, other.len);
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Number of positions set in either vector.
    #[inline]
    pub fn union_count(&self, other: &BitVector) -> usize {
        debug_assert_eq!(self.len, other.len);
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a | b).count_ones() as usize)
            .sum()
    }

    /// Number of positions set in exactly one of the vectors.
    pub fn symmetric_difference_count(&self, other: &BitVector) -> usize {
        debug_assert_eq!(self.len, other.len);
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum()
    }

    /// Iterate over the positions of set bits in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| {
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let bit = w.trailing_zeros() as usize;
                w &= w - 1;
                Some(wi * WORD_BITS + bit)
            })
        })
    }
}

/// Population-width bit vectors keyed by ingestion order.
#[derive(Clone, Debug)]
pub struct BitVectorStore {
    vectors: Vec<BitVector>,
    width: usize,
}

impl BitVectorStore {
    /// Bytes of packed storage needed for `entities` vectors of `width` bits.
    pub fn bytes_required(entities: usize, width: usize) -> usize {
        entities * words_for(width) * std::mem::size_of::<Word>()
    }

    /// Preallocate `entities` zeroed vectors of `width` bits each.
    pub fn new(entities: usize, width: usize) -> Result<Self> {
        let mut vectors = Vec::new();
        vectors
            .try_reserve_exact(entities)
            .map_err(|_| JxError::Allocation {
                bytes: BitVectorStore::bytes_required(entities, width),
            })?;
        for _ in 0..entities {
            vectors.push(BitVector::zeros(width)?);
        }

        Ok(BitVectorStore { vectors, width })
    }

    /// Build a store from existing vectors, which must share a width.
    pub fn from_vectors(width: usize, vectors: Vec<BitVector>) -> Result<Self> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != width) {
            return Err(JxError::IndexOutOfRange {
                kind: IndexKind::Bit,
                index: bad.len(),
                bound: width,
            });
        }

        Ok(BitVectorStore { vectors, width })
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Width in bits of every vector.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Mark `bit_position` present in the vector at `index`.
    pub fn set(&mut self, index: usize, bit_position: usize) -> Result<()> {
        let entities = self.vectors.len();
        let vector = self
            .vectors
            .get_mut(index)
            .ok_or(JxError::IndexOutOfRange {
                kind: IndexKind::Entity,
                index,
                bound: entities,
            })?;

        vector.set(bit_position)
    }

    /// Read-only access to the vector at `index`.
    pub fn vector_at(&self, index: usize) -> Result<&BitVector> {
        self.vectors.get(index).ok_or(JxError::IndexOutOfRange {
            kind: IndexKind::Entity,
            index,
            bound: self.vectors.len(),
        })
    }

    /// Number of set bits in the vector at `index`.
    ///
    /// Panics if `index` is out of range.
    pub fn cardinality(&self, index: usize) -> usize {
        self.vectors[index].count_ones()
    }

    /// Size of the intersection of vectors `a` and `b`.
    ///
    /// Panics if either index is out of range.
    #[inline]
    pub fn intersection_count(&self, a: usize, b: usize) -> usize {
        self.vectors[a].intersection_count(&self.vectors[b])
    }

    /// Size of the union of vectors `a` and `b`.
    ///
    /// Panics if either index is out of range.
    #[inline]
    pub fn union_count(&self, a: usize, b: usize) -> usize {
        self.vectors[a].union_count(&self.vectors[b])
    }
}
