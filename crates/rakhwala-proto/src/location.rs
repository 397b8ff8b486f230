//! Location samples and their stored form.

use serde::{Deserialize, Serialize};

use crate::{
    ProtocolError,
    schema::{SCHEMA_VERSION, check_version, legacy_version},
};

/// A single position fix in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Latitude in degrees, `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub longitude: f64,
}

impl LocationSample {
    /// Create a validated sample.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidCoordinate`] for non-finite or
    /// out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ProtocolError> {
        let sample = Self { latitude, longitude };
        sample.validate()?;
        Ok(sample)
    }

    /// Check that the coordinate is finite and in range.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidCoordinate`] if it is not.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let valid = self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude);

        if valid {
            Ok(())
        } else {
            Err(ProtocolError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    /// Web map link pointing at this position.
    ///
    /// ```
    /// # use rakhwala_proto::LocationSample;
    /// let sample = LocationSample::new(12.34, 56.78).unwrap();
    /// assert_eq!(sample.maps_url(), "https://www.google.com/maps?q=12.34,56.78");
    /// ```
    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps?q={},{}",
            format_degrees(self.latitude),
            format_degrees(self.longitude)
        )
    }
}

/// Render a coordinate the way the device location APIs print doubles:
/// shortest round-trip digits, always with a fractional part (`18.0`),
/// never in exponent form.
pub fn format_degrees(value: f64) -> String {
    let mut text = value.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}

/// On-store representation of the latest sample under `locations/<code>`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Schema version the record was written with.
    #[serde(default = "legacy_version")]
    pub schema_version: u32,
}

impl LocationRecord {
    /// Validate the record and extract the sample.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::UnsupportedSchema`] for records from a newer schema
    /// - [`ProtocolError::InvalidCoordinate`] for impossible coordinates
    pub fn into_sample(self) -> Result<LocationSample, ProtocolError> {
        check_version(self.schema_version)?;
        LocationSample::new(self.latitude, self.longitude)
    }
}

impl From<LocationSample> for LocationRecord {
    fn from(sample: LocationSample) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            schema_version: SCHEMA_VERSION,
        }
    }
}
