//! Options for opening a dataset.
//!
use serde::{Deserialize, Serialize};

use crate::{
    errors::{Error, Result},
    time::Calendar,
};

/// Options for a `Dataset`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Options {
    /// Use this dimension as the growable one instead of the first unlimited dimension
    pub time_dimension: Option<String>,

    /// Name of the time coordinate attribute holding `<unit> since <reference>`
    pub units_attribute: String,

    /// Name of the time coordinate attribute holding the calendar
    pub calendar_attribute: String,

    /// Calendar assumed when a shard's time coordinate doesn't name one
    pub default_calendar: Calendar,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            time_dimension: None,
            units_attribute: String::from("units"),
            calendar_attribute: String::from("calendar"),
            default_calendar: Calendar::Standard,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_dimension(mut self, name: impl Into<String>) -> Self {
        self.time_dimension = Some(name.into());
        self
    }

    pub fn with_units_attribute(mut self, name: impl Into<String>) -> Self {
        self.units_attribute = name.into();
        self
    }

    pub fn with_calendar_attribute(mut self, name: impl Into<String>) -> Self {
        self.calendar_attribute = name.into();
        self
    }

    pub fn with_default_calendar(mut self, calendar: Calendar) -> Self {
        self.default_calendar = calendar;
        self
    }

    /// Parse options from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;

        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if matches!(&self.time_dimension, Some(name) if name.trim().is_empty()) {
            return Err(Error::config("time_dimension must not be empty"));
        }
        if self.units_attribute.trim().is_empty() {
            return Err(Error::config("units_attribute must not be empty"));
        }
        if self.calendar_attribute.trim().is_empty() {
            return Err(Error::config("calendar_attribute must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.time_dimension, None);
        assert_eq!(options.units_attribute, "units");
        assert_eq!(options.calendar_attribute, "calendar");
        assert_eq!(options.default_calendar, Calendar::Standard);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_json() -> Result<()> {
        let options = Options::from_json(
            r#"{"time_dimension": "ocean_time", "default_calendar": "proleptic_gregorian"}"#,
        )?;
        assert_eq!(options.time_dimension.as_deref(), Some("ocean_time"));
        assert_eq!(options.default_calendar, Calendar::ProlepticGregorian);
        assert_eq!(options.units_attribute, "units");

        Ok(())
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            Options::from_json(r#"{"units_attribute": " "}"#),
            Err(Error::Config(_))
        ));
        assert!(Options::new().with_time_dimension("").validate().is_err());
        assert!(matches!(
            Options::from_json(r#"{"default_calendar": "noleap"}"#),
            Err(Error::Json(_))
        ));
    }
}
