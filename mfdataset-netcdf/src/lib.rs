//! A concrete implementation of the `mfdataset::Backend` interface for netCDF files.
//!
//! Reads go through libnetcdf, so only the requested hyper-rectangle is pulled from disk.
//!
use std::collections::BTreeMap;
use std::path::Path;

use ndarray::ArrayD;

use mfdataset::{Dimension, Error, ReadRange, Result, VariableInfo};

/// Opens shards as netCDF files on the local filesystem
#[derive(Clone, Copy, Debug, Default)]
pub struct NetcdfBackend;

impl mfdataset::Backend for NetcdfBackend {
    type Shard = NetcdfShard;

    fn open(&self, path: &Path) -> Result<NetcdfShard> {
        let file = netcdf::open(path).map_err(|err| backend_error(path, err))?;
        tracing::trace!(file = %path.display(), "opened netCDF file");

        Ok(NetcdfShard { file })
    }
}

/// An open netCDF file. The file is closed when this is dropped.
pub struct NetcdfShard {
    file: netcdf::File,
}

impl mfdataset::Shard for NetcdfShard {
    fn dimensions(&self) -> Result<Vec<Dimension>> {
        Ok(self
            .file
            .dimensions()
            .map(|dimension| Dimension {
                name: dimension.name(),
                len: dimension.len(),
                unlimited: dimension.is_unlimited(),
            })
            .collect())
    }

    fn variables(&self) -> Result<Vec<VariableInfo>> {
        self.file.variables().map(|variable| info(&variable)).collect()
    }

    fn variable(&self, name: &str) -> Result<Option<VariableInfo>> {
        self.file
            .variable(name)
            .map(|variable| info(&variable))
            .transpose()
    }

    fn read(&self, variable: &str, ranges: &[ReadRange]) -> Result<ArrayD<f64>> {
        let var = self
            .file
            .variable(variable)
            .ok_or_else(|| Error::backend(format!("no variable {variable} in file")))?;
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let bounds = mfdataset::bound_ranges(variable, &shape, ranges)?;

        let start: Vec<usize> = bounds.iter().map(|&(start, _)| start).collect();
        let count: Vec<usize> = bounds.iter().map(|&(start, stop)| stop - start).collect();
        var.values_arr::<f64, _>((start.as_slice(), count.as_slice()))
            .map_err(|err| Error::backend(format!("reading {variable}: {err}")))
    }
}

fn info(variable: &netcdf::Variable) -> Result<VariableInfo> {
    let mut attributes = BTreeMap::new();
    for attribute in variable.attributes() {
        let value = attribute
            .value()
            .map_err(|err| Error::backend(format!("attribute {}: {err}", attribute.name())))?;

        // Only text attributes are kept
        if let netcdf::AttrValue::Str(value) = value {
            attributes.insert(attribute.name().to_string(), value);
        }
    }

    Ok(VariableInfo {
        name: variable.name(),
        dimensions: variable.dimensions().iter().map(|d| d.name()).collect(),
        shape: variable.dimensions().iter().map(|d| d.len()).collect(),
        attributes,
    })
}

fn backend_error(path: &Path, err: netcdf::error::Error) -> Error {
    Error::backend(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::{TimeZone, Utc};
    use mfdataset::{Dataset, IndexLimit, Limits};

    use super::*;

    /// Two files of a (ocean_time, eta_rho) = (3 + 2, 4) variable, `zeta[t, e] = 10 t + e`
    fn write_history(dir: &Path) -> std::result::Result<Vec<PathBuf>, netcdf::error::Error> {
        let mut paths = vec![];
        let mut offset = 0;
        for (i, count) in [3_usize, 2].into_iter().enumerate() {
            let path = dir.join(format!("ocean_his_{:04}.nc", i + 1));
            let mut file = netcdf::create(&path)?;
            file.add_unlimited_dimension("ocean_time")?;
            file.add_dimension("eta_rho", 4)?;

            let mut time = file.add_variable::<f64>("ocean_time", &["ocean_time"])?;
            time.add_attribute("units", "hours since 2019-03-07 00:00:00")?;
            let hours: Vec<f64> = (offset..offset + count).map(|t| t as f64).collect();
            time.put_values(&hours, ([0], [count]))?;

            let mut zeta = file.add_variable::<f64>("zeta", &["ocean_time", "eta_rho"])?;
            zeta.add_attribute("long_name", "free-surface")?;
            zeta.add_attribute("scale_factor", 1.0_f64)?;
            let values: Vec<f64> = (offset..offset + count)
                .flat_map(|t| (0..4).map(move |e| (10 * t + e) as f64))
                .collect();
            zeta.put_values(&values, ([0, 0], [count, 4]))?;

            paths.push(path);
            offset += count;
        }

        Ok(paths)
    }

    #[test]
    fn test_get_var_across_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let paths = write_history(dir.path()).map_err(|err| Error::backend(err.to_string()))?;
        let dataset = Dataset::open(NetcdfBackend, paths)?;
        assert_eq!(dataset.time_dimension(), Some("ocean_time"));

        let start = Utc.with_ymd_and_hms(2019, 3, 7, 1, 0, 0).unwrap();
        let stop = Utc.with_ymd_and_hms(2019, 3, 7, 3, 0, 0).unwrap();
        let limits = Limits::new()
            .range("ocean_time", start, stop)
            .index("eta_rho", 2);
        let zeta = dataset.get_var::<f64>("zeta", &limits)?;

        assert_eq!(zeta.limit("ocean_time")?, IndexLimit::Inclusive(1, 3));
        assert_eq!(zeta.data().as_slice(), Some(&[12.0, 22.0, 32.0][..]));
        assert_eq!(zeta.attribute_string(&["long_name"]), "Free-surface");
        assert!(!zeta.attributes().contains_key("scale_factor"));

        Ok(())
    }
}
