mod axis;
mod backend;
mod config;
mod dataset;
mod errors;
mod fileset;
mod geom;
mod limits;
mod memory;
mod plan;
mod read;
mod record;
mod schema;
mod time;

#[cfg(test)]
mod testing;

pub use axis::TimeAxis;

pub use backend::bound_ranges;
pub use backend::Backend;
pub use backend::Dimension;
pub use backend::Element;
pub use backend::Shard;
pub use backend::VariableInfo;

pub use config::Options;

pub use dataset::Dataset;

pub use errors::Error;
pub use errors::Result;

pub use fileset::PathSpec;

pub use geom::ReadRange;

pub use limits::Bound;
pub use limits::IndexLimit;
pub use limits::Limit;
pub use limits::Limits;

pub use memory::JsonBackend;
pub use memory::MemoryBackend;
pub use memory::MemoryShard;
pub use memory::ShardData;
pub use memory::VariableData;

pub use plan::plan;
pub use plan::FilePlan;

pub use record::Subset;

pub use schema::Schema;

pub use time::Calendar;
pub use time::TimeUnits;
