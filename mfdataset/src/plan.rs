//! Mapping a global range of the time dimension onto the shards that hold it.
//!
use crate::{
    errors::{Error, Result},
    geom::ReadRange,
};

/// What to read from one shard.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilePlan {
    /// The shard holds none of the requested range
    Skip,

    /// The whole shard lies inside the requested range
    Full,

    /// Inclusive local bounds. `None` for `start` means from the shard's first entry, `None` for
    /// `stop` means through its last entry.
    Partial {
        start: Option<usize>,
        stop: Option<usize>,
    },
}

impl FilePlan {
    pub fn participates(&self) -> bool {
        !matches!(self, Self::Skip)
    }

    /// Local inclusive bounds, `None` if the shard doesn't participate
    pub fn bounds(&self) -> Option<(Option<usize>, Option<usize>)> {
        match *self {
            Self::Skip => None,
            Self::Full => Some((None, None)),
            Self::Partial { start, stop } => Some((start, stop)),
        }
    }

    /// Read range along the time dimension of this shard
    pub fn read_range(&self) -> Option<ReadRange> {
        self.bounds()
            .map(|(start, stop)| ReadRange::inclusive(start, stop))
    }
}

/// Plan the reads for global inclusive range `start..=stop`, given each shard's entry count.
///
/// The shards holding `start` and `stop` get explicit local bounds, shards strictly between
/// them are read in full and every other shard is skipped. Callers validate the range against
/// the total count first, so failing to place either end is an internal error.
///
pub fn plan(start: usize, stop: usize, counts: &[usize]) -> Result<Vec<FilePlan>> {
    if start > stop {
        return Err(Error::internal(format!(
            "planned range ({start}, {stop}) is reversed"
        )));
    }
    let (first, lower) = find_shard(start, counts).ok_or_else(|| not_found(start, counts))?;
    let (last, upper) = find_shard(stop, counts).ok_or_else(|| not_found(stop, counts))?;

    let mut plans = vec![FilePlan::Skip; counts.len()];
    match last - first {
        0 => {
            plans[first] = FilePlan::Partial {
                start: Some(lower),
                stop: Some(upper),
            };
        }
        1 => {
            plans[first] = FilePlan::Partial {
                start: Some(lower),
                stop: None,
            };
            plans[last] = FilePlan::Partial {
                start: None,
                stop: Some(upper),
            };
        }
        _ => {
            plans[first] = FilePlan::Partial {
                start: Some(lower),
                stop: None,
            };
            for shard in first + 1..last {
                if counts[shard] > 0 {
                    plans[shard] = FilePlan::Full;
                }
            }
            plans[last] = FilePlan::Partial {
                start: None,
                stop: Some(upper),
            };
        }
    }

    Ok(plans)
}

/// Shard and local index of global index `index`. Empty shards never hold an index.
fn find_shard(index: usize, counts: &[usize]) -> Option<(usize, usize)> {
    let mut offset = 0;
    for (shard, &count) in counts.iter().enumerate() {
        if index < offset + count {
            return Some((shard, index - offset));
        }
        offset += count;
    }

    None
}

fn not_found(index: usize, counts: &[usize]) -> Error {
    Error::internal(format!(
        "global index {index} not in any shard (total {})",
        counts.iter().sum::<usize>()
    ))
}

#[cfg(test)]
mod tests {
    use paste::paste;

    use super::*;

    /// Global indices a set of plans would read
    fn covered(plans: &[FilePlan], counts: &[usize]) -> Vec<usize> {
        let mut indices = vec![];
        let mut offset = 0;
        for (plan, &count) in plans.iter().zip(counts) {
            if let Some((start, stop)) = plan.read_range().and_then(|range| range.bounded(count)) {
                indices.extend(offset + start..offset + stop);
            }
            offset += count;
        }

        indices
    }

    #[test]
    fn test_range_across_two_shards() -> Result<()> {
        let plans = plan(3, 7, &[5, 5, 5])?;
        assert_eq!(
            plans,
            vec![
                FilePlan::Partial {
                    start: Some(3),
                    stop: None
                },
                FilePlan::Partial {
                    start: None,
                    stop: Some(2)
                },
                FilePlan::Skip,
            ]
        );
        assert_eq!(plans[0].read_range(), Some(ReadRange::new(3, None)));
        assert_eq!(plans[1].read_range(), Some(ReadRange::new(0, Some(3))));
        assert_eq!(plans[2].read_range(), None);

        Ok(())
    }

    #[test]
    fn test_range_inside_one_shard() -> Result<()> {
        let plans = plan(6, 8, &[5, 5, 5])?;
        assert_eq!(
            plans,
            vec![
                FilePlan::Skip,
                FilePlan::Partial {
                    start: Some(1),
                    stop: Some(3)
                },
                FilePlan::Skip,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_range_with_middle_shards() -> Result<()> {
        let plans = plan(4, 16, &[5, 5, 0, 5, 5])?;
        assert_eq!(
            plans,
            vec![
                FilePlan::Partial {
                    start: Some(4),
                    stop: None
                },
                FilePlan::Full,
                FilePlan::Skip,
                FilePlan::Full,
                FilePlan::Partial {
                    start: None,
                    stop: Some(1)
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn test_adjacent_shards_at_boundary() -> Result<()> {
        // last entry of one shard through first entry of the next
        let plans = plan(4, 5, &[5, 5, 5])?;
        assert_eq!(plans[2], FilePlan::Skip);
        assert_eq!(covered(&plans, &[5, 5, 5]), vec![4, 5]);

        Ok(())
    }

    #[test]
    fn test_reversed_range() {
        assert!(plan(7, 3, &[5, 5, 5]).unwrap_err().is_internal());
    }

    macro_rules! plan_tests {
        ($name:ident, $counts:expr) => {
            paste! {
                #[test]
                fn [<test_ $name _covers_requested_range>]() -> Result<()> {
                    let counts: &[usize] = &$counts;
                    let total: usize = counts.iter().sum();
                    for start in 0..total {
                        for stop in start..total {
                            let plans = plan(start, stop, counts)?;
                            assert_eq!(covered(&plans, counts), (start..=stop).collect::<Vec<_>>());
                        }
                    }

                    Ok(())
                }

                #[test]
                fn [<test_ $name _at_most_two_partial>]() -> Result<()> {
                    let counts: &[usize] = &$counts;
                    let total: usize = counts.iter().sum();
                    for start in 0..total {
                        for stop in start..total {
                            let plans = plan(start, stop, counts)?;
                            let partial = plans
                                .iter()
                                .filter(|plan| matches!(plan, FilePlan::Partial { .. }))
                                .count();
                            assert!((1..=2).contains(&partial));
                        }
                    }

                    Ok(())
                }

                #[test]
                fn [<test_ $name _out_of_range>]() {
                    let counts: &[usize] = &$counts;
                    let total: usize = counts.iter().sum();
                    assert!(plan(0, total, counts).unwrap_err().is_internal());
                    assert!(plan(total, total + 3, counts).unwrap_err().is_internal());
                }
            }
        };
    }

    plan_tests!(even, [5, 5, 5]);
    plan_tests!(ragged, [1, 7, 2, 4]);
    plan_tests!(empty_shards, [3, 0, 4, 0, 0, 2]);
    plan_tests!(single_shard, [9]);
    plan_tests!(singletons, [1, 1, 1, 1]);
}
