use serde::{Serialize, ser::SerializeSeq as _};

const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-universe bit set packed into 64-bit words.
///
/// Used both for sets of cases (one bit per row) and sets of items (one bit per
/// catalog entry). All binary operations require both operands to share the
/// same universe size.
///
/// # Bit Layout
///
/// Element `i` lives in word `i / 64`, bit `i % 64` (LSB first). Bits past
/// `len` in the last word are always zero, so word-wise equality and popcounts
/// never see garbage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    len: usize,
    words: Vec<u64>,
}

/// Set of case (row) indices.
pub type CaseSet = BitSet;

/// Set of item ids.
pub type ItemSet = BitSet;

impl Serialize for BitSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Format: [3, 17, 42] (member indices, ascending)
        let mut seq = serializer.serialize_seq(Some(self.count()))?;
        for i in self.iter() {
            seq.serialize_element(&i)?;
        }
        seq.end()
    }
}

impl BitSet {
    /// Creates an empty set over a universe of `len` elements.
    #[must_use]
    pub fn empty(len: usize) -> Self {
        Self {
            len,
            words: vec![0; len.div_ceil(WORD_BITS)],
        }
    }

    /// Creates a set containing every element of a universe of `len` elements.
    #[must_use]
    pub fn full(len: usize) -> Self {
        let mut set = Self {
            len,
            words: vec![u64::MAX; len.div_ceil(WORD_BITS)],
        };
        set.clear_tail();
        set
    }

    /// Creates a set from member indices.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of the universe.
    #[must_use]
    pub fn from_indices<I>(len: usize, indices: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut set = Self::empty(len);
        for i in indices {
            set.insert(i);
        }
        set
    }

    #[inline]
    fn clear_tail(&mut self) {
        let rem = self.len % WORD_BITS;
        if rem == 0 {
            return;
        }
        if let Some(last) = self.words.last_mut() {
            *last &= (1 << rem) - 1;
        }
    }

    /// Universe size.
    #[inline]
    #[must_use]
    pub fn universe(&self) -> usize {
        self.len
    }

    /// Number of members.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, i: usize) -> bool {
        i < self.len && (self.words[i / WORD_BITS] >> (i % WORD_BITS)) & 1 != 0
    }

    /// Adds `i` to the set.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of the universe.
    #[inline]
    pub fn insert(&mut self, i: usize) {
        assert!(i < self.len, "index {i} out of universe {}", self.len);
        self.words[i / WORD_BITS] |= 1 << (i % WORD_BITS);
    }

    #[inline]
    pub fn remove(&mut self, i: usize) {
        if i < self.len {
            self.words[i / WORD_BITS] &= !(1 << (i % WORD_BITS));
        }
    }

    #[inline]
    fn assert_same_universe(&self, other: &Self) {
        assert_eq!(self.len, other.len, "bit sets over different universes");
    }

    pub fn intersect_with(&mut self, other: &Self) {
        self.assert_same_universe(other);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= *b;
        }
    }

    pub fn union_with(&mut self, other: &Self) {
        self.assert_same_universe(other);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= *b;
        }
    }

    pub fn difference_with(&mut self, other: &Self) {
        self.assert_same_universe(other);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= !*b;
        }
    }

    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut set = self.clone();
        set.intersect_with(other);
        set
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut set = self.clone();
        set.union_with(other);
        set
    }

    /// Members of the universe that are not in this set.
    #[must_use]
    pub fn complement(&self) -> Self {
        let mut set = Self {
            len: self.len,
            words: self.words.iter().map(|w| !w).collect(),
        };
        set.clear_tail();
        set
    }

    /// Size of the intersection, without allocating it.
    #[must_use]
    pub fn intersection_count(&self, other: &Self) -> usize {
        self.assert_same_universe(other);
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Size of the union, without allocating it.
    #[must_use]
    pub fn union_count(&self, other: &Self) -> usize {
        self.assert_same_universe(other);
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a | b).count_ones() as usize)
            .sum()
    }

    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.assert_same_universe(other);
        self.words.iter().zip(&other.words).all(|(a, b)| a & !b == 0)
    }

    /// Iterates over member indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let tz = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(wi * WORD_BITS + tz)
            })
        })
    }
}
