//! The storage seam.
//!
//! The core never touches a file format. A `Backend` opens shards by path and a `Shard` answers
//! metadata questions and reads hyper-rectangles. See `memory` for the stores shipped with this
//! crate, and the `mfdataset-netcdf` crate for real netCDF files.
//!
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use ndarray::ArrayD;
use num_traits::{cast, NumCast};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{Error, Result},
    geom::ReadRange,
};

/// A dimension of a shard
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub len: usize,

    /// Whether this is the growable ("unlimited") dimension
    #[serde(default)]
    pub unlimited: bool,
}

impl Dimension {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
            unlimited: false,
        }
    }

    pub fn unlimited(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
            unlimited: true,
        }
    }
}

/// Metadata for one variable of a shard
#[derive(Clone, Debug, PartialEq)]
pub struct VariableInfo {
    pub name: String,

    /// Dimension names, in the variable's own order
    pub dimensions: Vec<String>,

    /// Length of each dimension in this shard
    pub shape: Vec<usize>,

    /// String valued attributes, e.g. "units" or "long_name"
    pub attributes: BTreeMap<String, String>,
}

/// A store of shards, addressed by path.
///
pub trait Backend {
    type Shard: Shard;

    /// Open a shard for reading. The shard is released when the returned value is dropped.
    ///
    fn open(&self, path: &Path) -> Result<Self::Shard>;

    /// Whether a shard exists at `path`
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// Expand a glob pattern into the paths of existing shards, sorted lexicographically.
    ///
    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let entries = glob::glob(pattern)
            .map_err(|err| Error::path(format!("bad pattern {pattern}: {err}")))?;
        let mut paths = entries
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| Error::path(format!("can't expand {pattern}: {err}")))?;
        sort_paths(&mut paths);

        Ok(paths)
    }
}

/// Sort paths as plain strings. `PathBuf`'s own order compares component by component, which
/// puts `a/f.nc` before `a-b/f.nc`.
pub(crate) fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
}

/// An opened shard.
///
pub trait Shard {
    /// All dimensions of the shard, in the shard's order
    fn dimensions(&self) -> Result<Vec<Dimension>>;

    /// All variables of the shard
    fn variables(&self) -> Result<Vec<VariableInfo>>;

    /// Metadata for a single variable, `None` if the shard has no such variable
    fn variable(&self, name: &str) -> Result<Option<VariableInfo>> {
        Ok(self
            .variables()?
            .into_iter()
            .find(|variable| variable.name == name))
    }

    /// Read the hyper-rectangle given by one range per dimension of `variable`.
    ///
    /// Must fail, not panic, if a range doesn't fit the variable's extent.
    ///
    fn read(&self, variable: &str, ranges: &[ReadRange]) -> Result<ArrayD<f64>>;
}

/// Numeric types an extracted array can be cast to
pub trait Element: NumCast + Copy + Debug + 'static {}

impl<N> Element for N where N: NumCast + Copy + Debug + 'static {}

/// Cast a freshly read array into the caller's element type.
///
pub(crate) fn cast_array<N: Element>(array: ArrayD<f64>) -> Result<ArrayD<N>> {
    let shape = array.raw_dim();
    let values = array
        .into_iter()
        .map(|value| {
            cast::<f64, N>(value).ok_or_else(|| {
                Error::backend(format!(
                    "value {value} can't be represented as {}",
                    std::any::type_name::<N>()
                ))
            })
        })
        .collect::<Result<Vec<N>>>()?;

    Ok(ArrayD::from_shape_vec(shape, values)?)
}

/// Check `ranges` against `shape` and turn them into concrete (start, stop) pairs.
///
/// Shared by backends so that out-of-extent reads fail the same way everywhere.
///
pub fn bound_ranges(
    variable: &str,
    shape: &[usize],
    ranges: &[ReadRange],
) -> Result<Vec<(usize, usize)>> {
    if shape.len() != ranges.len() {
        return Err(Error::backend(format!(
            "{variable} has {} dimensions, got {} read ranges",
            shape.len(),
            ranges.len()
        )));
    }

    shape
        .iter()
        .zip(ranges)
        .map(|(&len, range)| {
            range.bounded(len).ok_or_else(|| {
                Error::backend(format!(
                    "read range {range} outside dimension of length {len} for {variable}"
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use ndarray::{array, IxDyn};

    use super::*;

    #[test]
    fn test_cast_array() -> Result<()> {
        let array = array![[1.0, 2.0], [3.0, 4.0]].into_dyn();
        let cast: ArrayD<i32> = cast_array(array)?;
        assert_eq!(cast, array![[1, 2], [3, 4]].into_dyn());

        Ok(())
    }

    #[test]
    fn test_cast_array_unrepresentable() {
        let array = ArrayD::from_elem(IxDyn(&[2]), f64::NAN);
        let err = cast_array::<i64>(array).unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
    }

    #[test]
    fn test_bound_ranges() -> Result<()> {
        let ranges = [ReadRange::new(1, Some(3)), ReadRange::full()];
        assert_eq!(bound_ranges("h", &[4, 5], &ranges)?, vec![(1, 3), (0, 5)]);

        let ranges = [ReadRange::new(1, Some(6)), ReadRange::full()];
        assert!(bound_ranges("h", &[4, 5], &ranges).is_err());
        assert!(bound_ranges("h", &[4], &ranges).is_err());

        Ok(())
    }
}
