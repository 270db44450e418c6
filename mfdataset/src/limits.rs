//! Per-dimension limits: what callers ask for (`Limit`) and what it resolves to (`IndexLimit`).
//!
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::{
    axis::TimeAxis,
    errors::{Error, Result},
    geom::ReadRange,
};

/// One end of a limit: an index, or a timestamp to be looked up in the time axis.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Index(i128),
    Time(DateTime<Utc>),
}

/// A caller's constraint on one dimension.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Limit {
    /// The whole dimension
    #[default]
    Default,

    /// A single point, which is dropped from the extracted array
    Index(Bound),

    /// An inclusive range, taken as given
    Range(Bound, Bound),
}

impl Limit {
    fn endpoints(&self) -> Option<(Bound, Bound)> {
        match *self {
            Self::Default => None,
            Self::Index(at) => Some((at, at)),
            Self::Range(lower, upper) => Some((lower, upper)),
        }
    }
}

impl From<DateTime<Utc>> for Bound {
    fn from(time: DateTime<Utc>) -> Self {
        Self::Time(time)
    }
}

/// Naive timestamps are taken to be in UTC
impl From<NaiveDateTime> for Bound {
    fn from(time: NaiveDateTime) -> Self {
        Self::Time(Utc.from_utc_datetime(&time))
    }
}

impl From<Bound> for Limit {
    fn from(at: Bound) -> Self {
        Self::Index(at)
    }
}

impl From<(Bound, Bound)> for Limit {
    fn from((lower, upper): (Bound, Bound)) -> Self {
        Self::Range(lower, upper)
    }
}

macro_rules! index_bound {
    ($($type:ty),*) => {
        $(
            impl From<$type> for Bound {
                fn from(index: $type) -> Self {
                    Self::Index(index as i128)
                }
            }
        )*
    };
}

index_bound!(i32, i64, u32, u64, usize);

macro_rules! limit_from {
    ($($type:ty),*) => {
        $(
            impl From<$type> for Limit {
                fn from(at: $type) -> Self {
                    Self::Index(at.into())
                }
            }

            impl From<($type, $type)> for Limit {
                fn from((lower, upper): ($type, $type)) -> Self {
                    Self::Range(lower.into(), upper.into())
                }
            }
        )*
    };
}

limit_from!(i32, i64, u32, u64, usize, DateTime<Utc>, NaiveDateTime);

/// Limits keyed by dimension name. Dimensions left out default to their whole range.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    limits: BTreeMap<String, Limit>,
}

impl Limits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, dimension: impl Into<String>, limit: impl Into<Limit>) -> Self {
        self.insert(dimension, limit);
        self
    }

    pub fn index(self, dimension: impl Into<String>, at: impl Into<Bound>) -> Self {
        self.set(dimension, Limit::Index(at.into()))
    }

    pub fn range(
        self,
        dimension: impl Into<String>,
        lower: impl Into<Bound>,
        upper: impl Into<Bound>,
    ) -> Self {
        self.set(dimension, Limit::Range(lower.into(), upper.into()))
    }

    pub fn insert(&mut self, dimension: impl Into<String>, limit: impl Into<Limit>) {
        self.limits.insert(dimension.into(), limit.into());
    }

    pub fn get(&self, dimension: &str) -> Option<&Limit> {
        self.limits.get(dimension)
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.limits.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Limit)> {
        self.limits.iter().map(|(name, limit)| (name.as_str(), limit))
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Only the limits for the given dimensions
    pub fn retain_dimensions<S: AsRef<str>>(&self, dimensions: &[S]) -> Self {
        Self {
            limits: self
                .limits
                .iter()
                .filter(|(name, _)| dimensions.iter().any(|d| d.as_ref() == name.as_str()))
                .map(|(name, limit)| (name.clone(), *limit))
                .collect(),
        }
    }
}

impl<K, L> FromIterator<(K, L)> for Limits
where
    K: Into<String>,
    L: Into<Limit>,
{
    fn from_iter<I: IntoIterator<Item = (K, L)>>(iter: I) -> Self {
        Self {
            limits: iter
                .into_iter()
                .map(|(name, limit)| (name.into(), limit.into()))
                .collect(),
        }
    }
}

/// A limit resolved to indices.
///
/// `Default` stays distinct from an explicit range over the whole dimension.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexLimit {
    Default,
    Inclusive(usize, usize),
}

impl IndexLimit {
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Whether the limit collapsed to a single index
    pub fn is_point(&self) -> bool {
        matches!(self, Self::Inclusive(lower, upper) if lower == upper)
    }

    pub fn lower(&self) -> Option<usize> {
        match self {
            Self::Default => None,
            Self::Inclusive(lower, _) => Some(*lower),
        }
    }

    pub fn upper(&self) -> Option<usize> {
        match self {
            Self::Default => None,
            Self::Inclusive(_, upper) => Some(*upper),
        }
    }

    /// Number of indices covered in a dimension of length `bound`. An inverted range covers none.
    pub fn count(&self, bound: usize) -> usize {
        match self {
            Self::Default => bound,
            Self::Inclusive(lower, upper) => upper.checked_sub(*lower).map_or(0, |gap| gap + 1),
        }
    }

    pub fn read_range(&self) -> ReadRange {
        ReadRange::inclusive(self.lower(), self.upper())
    }
}

impl fmt::Display for IndexLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "all"),
            Self::Inclusive(lower, upper) if lower == upper => write!(f, "{lower}"),
            Self::Inclusive(lower, upper) => write!(f, "({lower}, {upper})"),
        }
    }
}

/// Put the caller's limits into the variable's dimension order.
///
/// Fails if a limit names a dimension the variable doesn't have, before any limit is looked at.
///
pub(crate) fn order(variable: &str, dimensions: &[String], limits: &Limits) -> Result<Vec<Limit>> {
    if let Some(unknown) = limits
        .dimensions()
        .find(|name| !dimensions.iter().any(|d| d == name))
    {
        return Err(Error::schema(format!(
            "Variable {variable} has no dimension {unknown}"
        )));
    }

    Ok(dimensions
        .iter()
        .map(|name| limits.get(name).copied().unwrap_or_default())
        .collect())
}

/// Checks that can be made without reading any shard.
///
/// `bounds` is `None` where the length of a dimension isn't known yet, which is the case for the
/// time dimension until the time axis has been built. `time` is the position of the time
/// dimension among `dimensions`.
///
pub(crate) fn check(
    dimensions: &[String],
    limits: &[Limit],
    bounds: &[Option<usize>],
    time: Option<usize>,
) -> Result<()> {
    for (i, limit) in limits.iter().enumerate() {
        let dimension = &dimensions[i];
        if let Some((lower, upper)) = limit.endpoints() {
            check_types(dimension, &lower, &upper, time == Some(i))?;
            if let (Bound::Index(lower), Bound::Index(upper)) = (lower, upper) {
                check_range(dimension, lower, upper, bounds[i])?;
            }
        }
    }

    Ok(())
}

/// Resolve limits to indices and validate them against the dimension lengths in `bounds`.
///
/// Timestamps are looked up in `time`'s axis. The time dimension's default resolves to its whole
/// explicit range, every other default stays `IndexLimit::Default`.
///
pub(crate) fn resolve(
    dimensions: &[String],
    limits: &[Limit],
    bounds: &[usize],
    time: Option<(usize, &TimeAxis)>,
) -> Result<Vec<IndexLimit>> {
    let time_index = time.map(|(i, _)| i);
    limits
        .iter()
        .enumerate()
        .map(|(i, limit)| {
            let dimension = &dimensions[i];
            let is_time = time_index == Some(i);
            let (lower, upper) = match limit.endpoints() {
                Some(endpoints) => endpoints,
                None if is_time => {
                    if bounds[i] == 0 {
                        return Err(Error::limit_range(format!("{dimension} has no entries")));
                    }
                    return Ok(IndexLimit::Inclusive(0, bounds[i] - 1));
                }
                None => return Ok(IndexLimit::Default),
            };

            check_types(dimension, &lower, &upper, is_time)?;
            let axis = time.filter(|_| is_time).map(|(_, axis)| axis);
            let lower = endpoint(dimension, lower, axis)?;
            let upper = endpoint(dimension, upper, axis)?;
            let (lower, upper) = check_range(dimension, lower, upper, Some(bounds[i]))?;

            Ok(IndexLimit::Inclusive(lower, upper))
        })
        .collect()
}

fn endpoint(dimension: &str, bound: Bound, axis: Option<&TimeAxis>) -> Result<i128> {
    match (bound, axis) {
        (Bound::Index(index), _) => Ok(index),
        (Bound::Time(time), Some(axis)) => {
            Ok(axis.index_of(&time)? as i128)
        }
        (Bound::Time(_), None) => Err(Error::limit_type(format!(
            "timestamp given for {dimension}, which isn't the time dimension"
        ))),
    }
}

fn check_types(dimension: &str, lower: &Bound, upper: &Bound, is_time: bool) -> Result<()> {
    match (lower, upper) {
        (Bound::Index(_), Bound::Index(_)) => Ok(()),
        (Bound::Time(_), Bound::Time(_)) if is_time => Ok(()),
        (Bound::Time(_), Bound::Time(_)) => Err(Error::limit_type(format!(
            "timestamps given for {dimension}, which isn't the time dimension"
        ))),
        _ => Err(Error::limit_type(format!(
            "Invalid limits {lower:?}, {upper:?} for {dimension} (mixed index and timestamp)"
        ))),
    }
}

fn check_range(
    dimension: &str,
    lower: i128,
    upper: i128,
    bound: Option<usize>,
) -> Result<(usize, usize)> {
    let within = |index: i128| {
        usize::try_from(index).map_or(false, |index| bound.map_or(true, |bound| index < bound))
    };
    if !within(lower) || !within(upper) {
        let extent = bound.map_or_else(|| String::from("?"), |bound| bound.to_string());
        return Err(Error::limit_range(format!(
            "Index limits ({lower}, {upper}) are outside (0, {extent}) for {dimension}"
        )));
    }
    if upper < lower {
        return Err(Error::limit_range(format!(
            "Lower index {lower} larger than upper {upper} for {dimension}"
        )));
    }

    Ok((lower as usize, upper as usize))
}
