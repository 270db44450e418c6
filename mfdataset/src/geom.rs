use std::fmt;

/// A half-open range of indices along one dimension of a shard.
///
/// `stop` of `None` reads through to the end of the dimension, whatever its length happens to be
/// in the shard being read.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadRange {
    pub start: usize,
    pub stop: Option<usize>,
}

impl ReadRange {
    pub fn new(start: usize, stop: Option<usize>) -> Self {
        Self { start, stop }
    }

    /// The whole dimension
    pub fn full() -> Self {
        Self::new(0, None)
    }

    /// Convert an inclusive pair of indices into a read range.
    ///
    /// A missing `lower` means the first index of the dimension, a missing `upper` the last one.
    ///
    pub fn inclusive(lower: Option<usize>, upper: Option<usize>) -> Self {
        Self::new(lower.unwrap_or(0), upper.map(|upper| upper + 1))
    }

    /// Resolve against the length of the dimension being read.
    ///
    /// Returns `None` if the range doesn't fit inside a dimension of that length.
    ///
    pub fn bounded(&self, len: usize) -> Option<(usize, usize)> {
        let stop = self.stop.unwrap_or(len);
        if self.start <= stop && stop <= len {
            Some((self.start, stop))
        } else {
            None
        }
    }

    /// Number of elements read from a dimension of length `len`
    pub fn len_within(&self, len: usize) -> Option<usize> {
        self.bounded(len).map(|(start, stop)| stop - start)
    }
}

impl fmt::Display for ReadRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stop {
            Some(stop) => write!(f, "{}..{}", self.start, stop),
            None => write!(f, "{}..", self.start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_counts_both_ends() {
        for lower in 0..10 {
            for upper in lower..10 {
                let range = ReadRange::inclusive(Some(lower), Some(upper));
                assert_eq!(range.len_within(10), Some(upper - lower + 1));
            }
        }
    }

    #[test]
    fn test_open_ends() {
        assert_eq!(ReadRange::inclusive(Some(3), None), ReadRange::new(3, None));
        assert_eq!(ReadRange::inclusive(None, Some(2)), ReadRange::new(0, Some(3)));
        assert_eq!(ReadRange::inclusive(None, None), ReadRange::full());

        assert_eq!(ReadRange::new(3, None).len_within(5), Some(2));
        assert_eq!(ReadRange::full().len_within(0), Some(0));
    }

    #[test]
    fn test_out_of_bounds() {
        assert_eq!(ReadRange::new(4, Some(6)).bounded(5), None);
        assert_eq!(ReadRange::new(6, None).bounded(5), None);
        assert_eq!(ReadRange::new(5, None).bounded(5), Some((5, 5)));
    }

    #[test]
    fn test_display() {
        assert_eq!(ReadRange::new(2, Some(4)).to_string(), "2..4");
        assert_eq!(ReadRange::new(2, None).to_string(), "2..");
    }
}
