use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    axis::TimeAxis,
    backend::{cast_array, Backend, Dimension, Element},
    config::Options,
    errors::{Error, Result},
    fileset::{self, PathSpec},
    limits::{self, IndexLimit, Limits},
    plan, read,
    record::Subset,
    schema::Schema,
};

/// One logical dataset, sharded along its time dimension.
///
/// The schema is probed from the first shard when the dataset is opened. The time axis is built
/// the first time it's needed and kept for the life of the handle.
///
pub struct Dataset<B: Backend> {
    backend: B,
    files: Vec<PathBuf>,
    schema: Schema,
    options: Options,
    time: Mutex<Option<Arc<TimeAxis>>>,
}

impl<B: Backend> Dataset<B> {
    pub fn open(backend: B, spec: impl Into<PathSpec>) -> Result<Self> {
        Self::open_with(backend, spec, Options::default())
    }

    pub fn open_with(backend: B, spec: impl Into<PathSpec>, options: Options) -> Result<Self> {
        options.validate()?;
        let files = fileset::resolve(&spec.into(), &backend)?;
        let schema = Schema::probe(&backend.open(&files[0])?)?;

        if let Some(name) = &options.time_dimension {
            if schema.dimension(name).is_none() {
                return Err(Error::config(format!(
                    "time_dimension {name} is not a dimension of {}",
                    files[0].display()
                )));
            }
        }

        let dataset = Self {
            backend,
            files,
            schema,
            options,
            time: Mutex::new(None),
        };
        tracing::debug!(
            files = dataset.files.len(),
            time_dimension = dataset.time_dimension(),
            "opened dataset"
        );

        Ok(dataset)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Names of all variables, in the first shard's order
    pub fn variables(&self) -> Vec<&str> {
        self.schema
            .variables()
            .iter()
            .map(|variable| variable.name.as_str())
            .collect()
    }

    /// Dimensions of the first shard
    pub fn dimensions(&self) -> &[Dimension] {
        self.schema.dimensions()
    }

    /// The growable dimension, if the dataset has one
    pub fn time_dimension(&self) -> Option<&str> {
        self.options
            .time_dimension
            .as_deref()
            .or_else(|| self.schema.unlimited())
    }

    /// The time axis over all shards, built on first call.
    ///
    pub fn time_axis(&self) -> Result<Arc<TimeAxis>> {
        let dimension = self
            .time_dimension()
            .ok_or_else(|| Error::schema("Dataset has no time dimension"))?;

        let mut cached = self.time.lock();
        if let Some(axis) = cached.as_ref() {
            return Ok(Arc::clone(axis));
        }
        let axis = Arc::new(TimeAxis::build(
            &self.backend,
            &self.files,
            dimension,
            &self.options,
        )?);
        *cached = Some(Arc::clone(&axis));

        Ok(axis)
    }

    /// Number of time steps over all shards
    pub fn num_time_entries(&self) -> Result<usize> {
        Ok(self.time_axis()?.len())
    }

    /// Only those of `limits` that apply to `variable`.
    ///
    /// Lets one set of limits be reused for variables of differing dimensionality.
    ///
    pub fn limits_for(&self, variable: &str, limits: &Limits) -> Result<Limits> {
        let variable = self.schema.variable(variable)?;

        Ok(limits.retain_dimensions(&variable.dimensions))
    }

    /// Extract the hyper-rectangle of `name` given by `limits`.
    ///
    /// Dimensions missing from `limits` are read in full. Dimensions limited to a single index
    /// are dropped from the returned array, but not from the returned record's dimensions,
    /// limits and bounds.
    ///
    /// Variables without the time dimension are read from the first shard only.
    ///
    pub fn get_var<N: Element>(&self, name: &str, limits: &Limits) -> Result<Subset<N>> {
        let span = tracing::debug_span!("get_var", variable = name);
        let _guard = span.enter();

        let variable = self.schema.variable(name)?;
        let dimensions = &variable.dimensions;
        let ordered = limits::order(name, dimensions, limits)?;

        let time = self
            .time_dimension()
            .and_then(|time| dimensions.iter().position(|dimension| dimension == time));
        let known: Vec<Option<usize>> = variable
            .shape
            .iter()
            .enumerate()
            .map(|(i, &len)| if Some(i) == time { None } else { Some(len) })
            .collect();
        limits::check(dimensions, &ordered, &known, time)?;

        let mut bounds = variable.shape.clone();
        let (resolved, data, times) = match time {
            Some(time) => {
                let axis = self.time_axis()?;
                bounds[time] = axis.len();
                let resolved =
                    limits::resolve(dimensions, &ordered, &bounds, Some((time, &*axis)))?;
                let (start, stop) = match resolved[time] {
                    IndexLimit::Inclusive(start, stop) => (start, stop),
                    IndexLimit::Default => {
                        return Err(Error::internal("time dimension resolved to default"))
                    }
                };

                let plans = plan::plan(start, stop, axis.counts())?;
                tracing::debug!(?resolved, ?plans, "planned reads");
                let data =
                    read::read_planned(&self.backend, &self.files, &plans, name, &resolved, time)?;

                (resolved, data, Some(axis.slice(start, stop)?))
            }
            None => {
                let resolved = limits::resolve(dimensions, &ordered, &bounds, None)?;
                tracing::debug!(?resolved, "reading first shard only");
                let data = read::read_one(&self.backend, &self.files[0], name, &resolved)?;

                (resolved, data, None)
            }
        };

        let data = read::squeeze(cast_array::<N>(data)?, &resolved);

        Ok(Subset::new(
            name.to_string(),
            dimensions.clone(),
            resolved,
            bounds,
            data,
            times,
            self.time_dimension().map(String::from),
            variable.attributes.clone(),
        ))
    }
}
