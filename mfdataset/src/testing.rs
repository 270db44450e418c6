use std::path::PathBuf;

use chrono::{DateTime, Duration, TimeZone, Utc};
use ndarray::{Array, ArrayD, Axis, IxDyn, Slice};

use crate::{
    backend::Dimension,
    memory::{MemoryBackend, ShardData},
};

pub(crate) const S_RHO: usize = 3;
pub(crate) const ETA_RHO: usize = 4;
pub(crate) const XI_RHO: usize = 5;

/// `h` hours after the first entry of every fixture
pub(crate) fn hour(h: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 3, 7, 0, 0, 0).unwrap() + Duration::hours(h)
}

/// An ocean model history output, both whole and cut into shards along `ocean_time`
pub(crate) struct Fixture {
    pub temp: ArrayD<f64>,
    pub zeta: ArrayD<f64>,
    pub times: Vec<DateTime<Utc>>,
    pub shards: Vec<(PathBuf, ShardData)>,
}

impl Fixture {
    pub fn backend(&self) -> MemoryBackend {
        let mut backend = MemoryBackend::new();
        for (path, shard) in &self.shards {
            backend.insert(path.clone(), shard.clone());
        }

        backend
    }

    /// `h` as stored in shard `shard`. Static fields differ between shards.
    pub fn h(&self, shard: usize) -> ArrayD<f64> {
        bathymetry() + 100.0 * shard as f64
    }
}

/// Shards `his/ocean_his_0001.nc`, ... holding `counts[i]` hourly time steps each.
///
pub(crate) fn history(counts: &[usize]) -> Fixture {
    let total: usize = counts.iter().sum();
    let temp = Array::range(0.0, (total * S_RHO * ETA_RHO * XI_RHO) as f64, 1.0)
        .into_shape(IxDyn(&[total, S_RHO, ETA_RHO, XI_RHO]))
        .unwrap();
    let zeta = Array::range(0.0, (total * ETA_RHO * XI_RHO) as f64, 1.0)
        .into_shape(IxDyn(&[total, ETA_RHO, XI_RHO]))
        .unwrap()
        * 0.5;
    let times = (0..total as i64).map(hour).collect();

    let mut shards = vec![];
    let mut offset = 0;
    for (i, &count) in counts.iter().enumerate() {
        let window = Slice::from(offset..offset + count);
        let shard = ShardData::new()
            .with_dimension(Dimension::unlimited("ocean_time", count))
            .with_dimension(Dimension::new("s_rho", S_RHO))
            .with_dimension(Dimension::new("eta_rho", ETA_RHO))
            .with_dimension(Dimension::new("xi_rho", XI_RHO))
            .with_variable(
                "ocean_time",
                &["ocean_time"],
                (offset..offset + count).map(|i| i as f64).collect(),
            )
            .with_attribute("ocean_time", "units", "hours since 2019-03-07 00:00:00")
            .with_attribute("ocean_time", "calendar", "gregorian")
            .with_array(
                "temp",
                &["ocean_time", "s_rho", "eta_rho", "xi_rho"],
                temp.slice_axis(Axis(0), window).to_owned(),
            )
            .with_attribute("temp", "long_name", "potential temperature")
            .with_attribute("temp", "units", "Celsius")
            .with_array(
                "zeta",
                &["ocean_time", "eta_rho", "xi_rho"],
                zeta.slice_axis(Axis(0), window).to_owned(),
            )
            .with_attribute("zeta", "long_name", "free-surface")
            .with_array(
                "h",
                &["eta_rho", "xi_rho"],
                bathymetry() + 100.0 * i as f64,
            );

        shards.push((PathBuf::from(format!("his/ocean_his_{:04}.nc", i + 1)), shard));
        offset += count;
    }

    Fixture {
        temp,
        zeta,
        times,
        shards,
    }
}

/// A grid file without any unlimited dimension
pub(crate) fn grid() -> ShardData {
    ShardData::new()
        .with_dimension(Dimension::new("eta_rho", ETA_RHO))
        .with_dimension(Dimension::new("xi_rho", XI_RHO))
        .with_array("h", &["eta_rho", "xi_rho"], bathymetry())
        .with_attribute("h", "long_name", "bathymetry at RHO-points")
        .with_array(
            "mask_rho",
            &["eta_rho", "xi_rho"],
            ArrayD::ones(IxDyn(&[ETA_RHO, XI_RHO])),
        )
}

fn bathymetry() -> ArrayD<f64> {
    Array::range(10.0, 10.0 + (ETA_RHO * XI_RHO) as f64, 1.0)
        .into_shape(IxDyn(&[ETA_RHO, XI_RHO]))
        .unwrap()
}
