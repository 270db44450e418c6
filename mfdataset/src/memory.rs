//! Shard stores that ship with the core: shards held in RAM, and shards stored as JSON files.
//!
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::{ArrayD, ArrayViewD, IxDyn, Slice};
use serde::{Deserialize, Serialize};

use crate::{
    backend::{bound_ranges, sort_paths, Backend, Dimension, Shard, VariableInfo},
    errors::{Error, Result},
    geom::ReadRange,
};

/// A complete, self describing shard.
///
/// Values are stored flat, in row-major order over the variable's dimensions.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardData {
    pub dimensions: Vec<Dimension>,
    pub variables: Vec<VariableData>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableData {
    pub name: String,
    pub dimensions: Vec<String>,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    pub values: Vec<f64>,
}

impl ShardData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn with_variable<S: AsRef<str>>(
        mut self,
        name: impl Into<String>,
        dimensions: &[S],
        values: Vec<f64>,
    ) -> Self {
        self.variables.push(VariableData {
            name: name.into(),
            dimensions: dimensions.iter().map(|d| d.as_ref().to_string()).collect(),
            attributes: BTreeMap::new(),
            values,
        });
        self
    }

    /// Add a variable from an array, whose shape must agree with the named dimensions.
    ///
    pub fn with_array<S: AsRef<str>>(
        self,
        name: impl Into<String>,
        dimensions: &[S],
        array: ArrayD<f64>,
    ) -> Self {
        let values = array.iter().copied().collect();
        self.with_variable(name, dimensions, values)
    }

    /// Set a string attribute on an already added variable. Unknown variables are ignored.
    ///
    pub fn with_attribute(
        mut self,
        variable: &str,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        if let Some(var) = self.variables.iter_mut().find(|v| v.name == variable) {
            var.attributes.insert(name.into(), value.into());
        }
        self
    }

    fn shape_of(&self, variable: &VariableData) -> Result<Vec<usize>> {
        variable
            .dimensions
            .iter()
            .map(|name| {
                self.dimensions
                    .iter()
                    .find(|dim| &dim.name == name)
                    .map(|dim| dim.len)
                    .ok_or_else(|| {
                        Error::backend(format!(
                            "variable {} uses undeclared dimension {name}",
                            variable.name
                        ))
                    })
            })
            .collect()
    }
}

/// A shard opened from a `MemoryBackend` or `JsonBackend`
#[derive(Clone, Debug)]
pub struct MemoryShard(Arc<ShardData>);

impl From<ShardData> for MemoryShard {
    fn from(data: ShardData) -> Self {
        Self(Arc::new(data))
    }
}

impl Shard for MemoryShard {
    fn dimensions(&self) -> Result<Vec<Dimension>> {
        Ok(self.0.dimensions.clone())
    }

    fn variables(&self) -> Result<Vec<VariableInfo>> {
        self.0
            .variables
            .iter()
            .map(|variable| {
                Ok(VariableInfo {
                    name: variable.name.clone(),
                    dimensions: variable.dimensions.clone(),
                    shape: self.0.shape_of(variable)?,
                    attributes: variable.attributes.clone(),
                })
            })
            .collect()
    }

    fn read(&self, variable: &str, ranges: &[ReadRange]) -> Result<ArrayD<f64>> {
        let data = self
            .0
            .variables
            .iter()
            .find(|v| v.name == variable)
            .ok_or_else(|| Error::backend(format!("no variable {variable} in shard")))?;
        let shape = self.0.shape_of(data)?;
        let bounds = bound_ranges(variable, &shape, ranges)?;
        let view = ArrayViewD::from_shape(IxDyn(&shape), data.values.as_slice())?;
        let window = view.slice_each_axis(|axis| {
            let (start, stop) = bounds[axis.axis.index()];
            Slice::from(start..stop)
        });

        Ok(window.to_owned())
    }
}

/// Shards kept in RAM, keyed by path.
///
/// Counts how many times a shard has been opened, which lets callers check that a request was
/// turned down before any shard was touched.
///
#[derive(Debug, Default)]
pub struct MemoryBackend {
    shards: BTreeMap<PathBuf, Arc<ShardData>>,
    opens: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, shard: ShardData) {
        self.shards.insert(path.into(), Arc::new(shard));
    }

    pub fn with_shard(mut self, path: impl Into<PathBuf>, shard: ShardData) -> Self {
        self.insert(path, shard);
        self
    }

    /// Number of `open` calls made so far
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl Backend for MemoryBackend {
    type Shard = MemoryShard;

    fn open(&self, path: &Path) -> Result<MemoryShard> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let shard = self
            .shards
            .get(path)
            .ok_or_else(|| Error::path(format!("no shard at {}", path.display())))?;

        Ok(MemoryShard(Arc::clone(shard)))
    }

    fn exists(&self, path: &Path) -> bool {
        self.shards.contains_key(path)
    }

    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let pattern = glob::Pattern::new(pattern)
            .map_err(|err| Error::path(format!("bad pattern {pattern}: {err}")))?;

        let mut paths: Vec<PathBuf> = self
            .shards
            .keys()
            .filter(|path| pattern.matches_path(path))
            .cloned()
            .collect();
        sort_paths(&mut paths);

        Ok(paths)
    }
}

/// Shards stored on disk as JSON serialized `ShardData`
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonBackend;

impl JsonBackend {
    pub fn write_shard(path: impl AsRef<Path>, shard: &ShardData) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, shard)?;
        writer.flush()?;

        Ok(())
    }
}

impl Backend for JsonBackend {
    type Shard = MemoryShard;

    fn open(&self, path: &Path) -> Result<MemoryShard> {
        let file = File::open(path)?;
        let shard: ShardData = serde_json::from_reader(BufReader::new(file))?;

        Ok(MemoryShard(Arc::new(shard)))
    }
}
