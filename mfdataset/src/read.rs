//! Reading planned hyper-rectangles and stitching them together.
//!
use std::path::{Path, PathBuf};

use ndarray::{ArrayD, Axis};

use crate::{
    backend::{Backend, Shard},
    errors::{Error, Result},
    geom::ReadRange,
    limits::IndexLimit,
    plan::FilePlan,
};

/// Read `variable` from every participating shard and concatenate along the time axis.
///
/// `limits` are the resolved limits in the variable's dimension order. The limit at `time` is
/// replaced by each shard's local bounds from `plans`.
///
pub(crate) fn read_planned<B: Backend>(
    backend: &B,
    files: &[PathBuf],
    plans: &[FilePlan],
    variable: &str,
    limits: &[IndexLimit],
    time: usize,
) -> Result<ArrayD<f64>> {
    let mut parts = vec![];
    for (path, plan) in files.iter().zip(plans) {
        let local = match plan.read_range() {
            Some(local) => local,
            None => continue,
        };
        let ranges: Vec<ReadRange> = limits
            .iter()
            .enumerate()
            .map(|(i, limit)| if i == time { local } else { limit.read_range() })
            .collect();

        tracing::debug!(file = %path.display(), ranges = %show(&ranges), "reading shard");
        let shard = backend.open(path)?;
        parts.push(shard.read(variable, &ranges)?);
    }

    if parts.is_empty() {
        return Err(Error::internal(format!("no shard planned for {variable}")));
    }
    let views: Vec<_> = parts.iter().map(|part| part.view()).collect();
    let array = ndarray::concatenate(Axis(time), &views)?;

    if let IndexLimit::Inclusive(start, stop) = limits[time] {
        let expected = stop - start + 1;
        if array.shape()[time] != expected {
            return Err(Error::backend(format!(
                "shards returned {} entries along the time axis, expected {expected}",
                array.shape()[time]
            )));
        }
    }

    Ok(array)
}

/// Read `variable` from a single shard.
///
pub(crate) fn read_one<B: Backend>(
    backend: &B,
    path: &Path,
    variable: &str,
    limits: &[IndexLimit],
) -> Result<ArrayD<f64>> {
    let ranges: Vec<ReadRange> = limits.iter().map(IndexLimit::read_range).collect();
    tracing::debug!(file = %path.display(), ranges = %show(&ranges), "reading shard");
    let shard = backend.open(path)?;

    shard.read(variable, &ranges)
}

/// Drop every axis whose limit collapsed to a single index.
///
pub(crate) fn squeeze<N>(mut array: ArrayD<N>, limits: &[IndexLimit]) -> ArrayD<N> {
    // Highest axis first, so lower axis numbers stay put
    for (axis, limit) in limits.iter().enumerate().rev() {
        if limit.is_point() {
            array = array.index_axis_move(Axis(axis), 0);
        }
    }

    array
}

fn show(ranges: &[ReadRange]) -> String {
    ranges
        .iter()
        .map(ReadRange::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
