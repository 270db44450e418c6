use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ndarray::{Array1, ArrayD};

use crate::{
    errors::{Error, Result},
    limits::IndexLimit,
};

/// A variable extracted from a dataset.
///
/// `dimensions`, `limits` and `bounds` describe the variable before axes with single index limits
/// were squeezed out of `data`, so callers can tell which axes were dropped.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Subset<N> {
    name: String,
    dimensions: Vec<String>,
    limits: Vec<IndexLimit>,
    bounds: Vec<usize>,
    data: ArrayD<N>,
    time: Option<Array1<DateTime<Utc>>>,
    time_dimension: Option<String>,
    attributes: BTreeMap<String, String>,
}

impl<N> Subset<N> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        dimensions: Vec<String>,
        limits: Vec<IndexLimit>,
        bounds: Vec<usize>,
        data: ArrayD<N>,
        time: Option<Array1<DateTime<Utc>>>,
        time_dimension: Option<String>,
        attributes: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name,
            dimensions,
            limits,
            bounds,
            data,
            time,
            time_dimension,
            attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn limits(&self) -> &[IndexLimit] {
        &self.limits
    }

    /// Length of each dimension. For the time dimension, the total over all shards.
    pub fn bounds(&self) -> &[usize] {
        &self.bounds
    }

    pub fn data(&self) -> &ArrayD<N> {
        &self.data
    }

    pub fn into_data(self) -> ArrayD<N> {
        self.data
    }

    /// Timestamps aligned with the time axis of `data`, if the variable has the time dimension
    pub fn time(&self) -> Option<&Array1<DateTime<Utc>>> {
        self.time.as_ref()
    }

    pub fn time_dimension(&self) -> Option<&str> {
        self.time_dimension.as_deref()
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn limit(&self, dimension: &str) -> Result<IndexLimit> {
        Ok(self.limits[self.position(dimension)?])
    }

    pub fn bound(&self, dimension: &str) -> Result<usize> {
        Ok(self.bounds[self.position(dimension)?])
    }

    /// The first of `candidates`, in the order given, that is one of the variable's dimensions.
    ///
    pub fn identify_dim<S: AsRef<str>>(&self, candidates: &[S]) -> Result<&str> {
        candidates
            .iter()
            .find_map(|candidate| {
                self.dimensions
                    .iter()
                    .find(|name| name.as_str() == candidate.as_ref())
            })
            .map(String::as_str)
            .ok_or_else(|| {
                Error::schema(format!(
                    "No dimension of {} is among the candidates",
                    self.name
                ))
            })
    }

    /// Dimensions whose limits span more than one index
    pub fn range_dims(&self) -> Vec<&str> {
        self.dimensions
            .iter()
            .zip(self.limits.iter().zip(&self.bounds))
            .filter(|(_, (limit, bound))| match limit {
                IndexLimit::Default => **bound > 1,
                IndexLimit::Inclusive(lower, upper) => upper > lower,
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Like `range_dims`, but there must be exactly `expected` of them.
    ///
    pub fn expect_range_dims(&self, expected: usize) -> Result<Vec<&str>> {
        let dims = self.range_dims();
        if dims.len() != expected {
            return Err(Error::RangeDimCount {
                expected,
                actual: dims.len(),
            });
        }

        Ok(dims)
    }

    /// Render limits for a label, e.g. `(ocean_time: (3, 7), s_rho: 41, xi_rho: all)`.
    ///
    pub fn limits_to_string<S: AsRef<str>>(&self, exclude: &[S]) -> String {
        let parts: Vec<String> = self
            .dimensions
            .iter()
            .zip(&self.limits)
            .filter(|(name, _)| !exclude.iter().any(|e| e.as_ref() == name.as_str()))
            .map(|(name, limit)| format!("{name}: {limit}"))
            .collect();

        format!("({})", parts.join(", "))
    }

    /// The first non-empty attribute among `candidates`, capitalized, or "N/A".
    ///
    pub fn attribute_string<S: AsRef<str>>(&self, candidates: &[S]) -> String {
        candidates
            .iter()
            .filter_map(|name| self.attributes.get(name.as_ref()))
            .find(|value| !value.is_empty())
            .map(|value| capitalize(value))
            .unwrap_or_else(|| String::from("N/A"))
    }

    fn position(&self, dimension: &str) -> Result<usize> {
        self.dimensions
            .iter()
            .position(|name| name == dimension)
            .ok_or_else(|| {
                Error::schema(format!("{dimension} is not a dimension of {}", self.name))
            })
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
