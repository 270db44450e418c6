use std::path::PathBuf;

use chrono::{DateTime, Utc};
use ndarray::Array1;

use crate::{
    backend::{Backend, Shard},
    config::Options,
    errors::{Error, Result},
    geom::ReadRange,
    time::{Calendar, TimeUnits},
};

/// The time axis of a whole file set.
///
/// Decoded timestamps of every shard, concatenated in file order. Global index `i` is the entry
/// at offset `i - offset(shard)` of the shard that holds it, where `offset(shard)` is the number
/// of entries in all preceding shards.
///
#[derive(Clone, Debug, PartialEq)]
pub struct TimeAxis {
    dimension: String,
    times: Vec<DateTime<Utc>>,
    counts: Vec<usize>,
    offsets: Vec<usize>,
}

impl TimeAxis {
    /// Assemble from each shard's decoded timestamps, in file order.
    ///
    pub fn from_shards(dimension: impl Into<String>, shards: Vec<Vec<DateTime<Utc>>>) -> Self {
        let mut times = vec![];
        let mut counts = Vec::with_capacity(shards.len());
        let mut offsets = Vec::with_capacity(shards.len());
        for shard in shards {
            offsets.push(times.len());
            counts.push(shard.len());
            times.extend(shard);
        }

        Self {
            dimension: dimension.into(),
            times,
            counts,
            offsets,
        }
    }

    /// Read and decode the time coordinate of every shard.
    ///
    /// Each shard is decoded with its own units and calendar. Differing units are logged but
    /// not reconciled.
    ///
    pub(crate) fn build<B: Backend>(
        backend: &B,
        files: &[PathBuf],
        dimension: &str,
        options: &Options,
    ) -> Result<Self> {
        let mut shards = Vec::with_capacity(files.len());
        let mut first: Option<(String, Calendar)> = None;
        for path in files {
            let shard = backend.open(path)?;
            let variable = shard.variable(dimension)?.ok_or_else(|| {
                Error::schema(format!(
                    "{} has no coordinate variable for time dimension {dimension}",
                    path.display()
                ))
            })?;
            if variable.dimensions != [dimension] {
                return Err(Error::schema(format!(
                    "time coordinate {dimension} in {} must only have dimension {dimension}, has \
                     {:?}",
                    path.display(),
                    variable.dimensions
                )));
            }

            let units = variable
                .attributes
                .get(&options.units_attribute)
                .ok_or_else(|| {
                    Error::units(format!(
                        "time coordinate {dimension} in {} has no {} attribute",
                        path.display(),
                        options.units_attribute
                    ))
                })?;
            let calendar = match variable.attributes.get(&options.calendar_attribute) {
                Some(calendar) => calendar.parse()?,
                None => options.default_calendar,
            };

            match &first {
                None => first = Some((units.clone(), calendar)),
                Some((first_units, first_calendar))
                    if first_units != units || *first_calendar != calendar =>
                {
                    tracing::warn!(
                        file = %path.display(),
                        units = %units,
                        %calendar,
                        first_units = %first_units,
                        first_calendar = %first_calendar,
                        "time units differ from the first shard, decoding with this shard's own"
                    );
                }
                Some(_) => {}
            }

            let decoder = TimeUnits::parse(units, calendar)?;
            let raw = shard.read(dimension, &[ReadRange::full()])?;
            let times = raw
                .iter()
                .map(|&value| decoder.decode(value))
                .collect::<Result<Vec<_>>>()?;
            shards.push(times);
        }

        let axis = Self::from_shards(dimension, shards);
        tracing::debug!(
            dimension,
            entries = axis.len(),
            shards = axis.counts.len(),
            "built time axis"
        );

        Ok(axis)
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    /// Total number of entries across all shards
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// Number of entries in each shard
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Global index of a shard's first entry
    pub fn offset(&self, shard: usize) -> Option<usize> {
        self.offsets.get(shard).copied()
    }

    /// Shard and local index holding global index `index`.
    ///
    pub fn locate(&self, index: usize) -> Option<(usize, usize)> {
        // Empty shards share an offset with their successor, so take the last candidate
        let shard = self.offsets.partition_point(|&offset| offset <= index);
        let shard = shard.checked_sub(1)?;
        let local = index - self.offsets[shard];
        if local < self.counts[shard] {
            Some((shard, local))
        } else {
            None
        }
    }

    /// Global index of the first entry exactly equal to `time`
    pub fn position(&self, time: &DateTime<Utc>) -> Option<usize> {
        self.times.iter().position(|t| t == time)
    }

    /// Like `position`, but a missing timestamp is an error
    pub fn index_of(&self, time: &DateTime<Utc>) -> Result<usize> {
        self.position(time).ok_or_else(|| Error::TimeNotFound {
            time: *time,
            dimension: self.dimension.clone(),
        })
    }

    /// Timestamps from `start` through `stop`, inclusive
    pub fn slice(&self, start: usize, stop: usize) -> Result<Array1<DateTime<Utc>>> {
        if start > stop || stop >= self.len() {
            return Err(Error::internal(format!(
                "time slice ({start}, {stop}) outside axis of length {}",
                self.len()
            )));
        }

        Ok(Array1::from(self.times[start..=stop].to_vec()))
    }
}
