use crate::{
    backend::{Dimension, Shard, VariableInfo},
    errors::{Error, Result},
};

/// Dimensions and variables of a dataset, as found in its first shard.
///
/// The growable dimension is the first dimension flagged unlimited. Lengths of every other
/// dimension are taken to be the same in all shards.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    dimensions: Vec<Dimension>,
    variables: Vec<VariableInfo>,
    unlimited: Option<String>,
}

impl Schema {
    pub(crate) fn probe<S: Shard>(shard: &S) -> Result<Self> {
        let dimensions = shard.dimensions()?;
        let variables = shard.variables()?;
        let unlimited = dimensions
            .iter()
            .find(|dimension| dimension.unlimited)
            .map(|dimension| dimension.name.clone());

        Ok(Self {
            dimensions,
            variables,
            unlimited,
        })
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|dimension| dimension.name == name)
    }

    pub fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Result<&VariableInfo> {
        self.variables
            .iter()
            .find(|variable| variable.name == name)
            .ok_or_else(|| Error::schema(format!("No variable {name} in dataset")))
    }

    /// Name of the first unlimited dimension, if there is one
    pub fn unlimited(&self) -> Option<&str> {
        self.unlimited.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryShard, ShardData};

    fn probe(data: ShardData) -> Result<Schema> {
        Schema::probe(&MemoryShard::from(data))
    }

    #[test]
    fn test_probe() -> Result<()> {
        let schema = probe(
            ShardData::new()
                .with_dimension(Dimension::new("eta_rho", 2))
                .with_dimension(Dimension::unlimited("ocean_time", 1))
                .with_dimension(Dimension::unlimited("other_time", 1))
                .with_variable("zeta", &["ocean_time", "eta_rho"], vec![1.0, 2.0]),
        )?;

        assert_eq!(schema.unlimited(), Some("ocean_time"));
        assert_eq!(schema.variable("zeta")?.shape, vec![1, 2]);
        assert_eq!(schema.dimension("eta_rho").map(|d| d.len), Some(2));
        assert!(schema.dimension("xi_rho").is_none());

        Ok(())
    }

    #[test]
    fn test_no_unlimited_dimension() -> Result<()> {
        let schema = probe(
            ShardData::new()
                .with_dimension(Dimension::new("eta_rho", 2))
                .with_variable("h", &["eta_rho"], vec![10.0, 20.0]),
        )?;
        assert_eq!(schema.unlimited(), None);

        let err = schema.variable("temp").unwrap_err();
        assert!(matches!(err, Error::Schema(_)));

        Ok(())
    }
}
