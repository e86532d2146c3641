// This file is part of ts_face_controller.
//
// See the COPYRIGHT file at the top-level directory of this distribution
// for details of code ownership.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::enums::{Axis, LandmarkName};
use crate::error::ConfigError;

/// Servo mapping as written in the configuration file and the commands.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ServoMappingDescriptor {
    // Name of the measured landmark.
    #[serde(rename = "idx")]
    pub point: String,
    // Name of the reference landmark.
    #[serde(rename = "ref")]
    pub reference: String,
    pub axis: Axis,
    pub pin: u32,
    // Angle in degree when the normalized delta is at the domain minimum.
    pub closed: i32,
    // Angle in degree when the normalized delta is at the domain maximum.
    pub open: i32,
    #[serde(rename = "dMin")]
    pub domain_min: f64,
    #[serde(rename = "dMax")]
    pub domain_max: f64,
    // Channel class of the receiver, e.g. 'U' (upper face) or 'F' (mouth and
    // cheek).
    pub prefix: char,
}

/// Physical servo channel on the receiver.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ServoChannel {
    pub prefix: char,
    pub pin: u32,
}

impl ServoChannel {
    /// Format the command to move the servo.
    ///
    /// # Arguments
    /// * `angle` - Target angle in degree.
    ///
    /// # Returns
    /// Command in the format of "<prefix>:<pin>,<angle>".
    pub fn command(&self, angle: i32) -> String {
        format!("{}:{},{}", self.prefix, self.pin, angle)
    }
}

impl fmt::Display for ServoChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.pin)
    }
}

/// Servo mapping with the landmark names resolved to the snapshot indices.
#[derive(Clone, PartialEq, Debug)]
pub struct ServoMapping {
    pub point: usize,
    pub reference: usize,
    pub axis: Axis,
    pub channel: ServoChannel,
    pub closed: i32,
    pub open: i32,
    pub domain_min: f64,
    pub domain_max: f64,
}

impl ServoMapping {
    /// Resolve and validate the descriptor.
    ///
    /// # Arguments
    /// * `entry` - 0-based position of the descriptor in the table. This is
    /// only used in the error.
    /// * `descriptor` - Servo mapping descriptor.
    ///
    /// # Returns
    /// Resolved servo mapping.
    ///
    /// # Errors
    /// If the landmark name is unknown, the prefix is not an ASCII letter, or
    /// the domain is empty or its bounds or span are not finite.
    pub fn from_descriptor(
        entry: usize,
        descriptor: &ServoMappingDescriptor,
    ) -> Result<Self, ConfigError> {
        let point = Self::resolve_landmark(entry, &descriptor.point)?;
        let reference = Self::resolve_landmark(entry, &descriptor.reference)?;

        if !descriptor.prefix.is_ascii_alphabetic() {
            return Err(ConfigError::InvalidPrefix {
                entry,
                prefix: descriptor.prefix,
            });
        }

        let (min, max) = (descriptor.domain_min, descriptor.domain_max);
        if !min.is_finite() || !max.is_finite() || !(max - min).is_finite() || (min == max) {
            return Err(ConfigError::InvalidDomain { entry, min, max });
        }

        Ok(Self {
            point: point.index(),
            reference: reference.index(),
            axis: descriptor.axis,
            channel: ServoChannel {
                prefix: descriptor.prefix,
                pin: descriptor.pin,
            },
            closed: descriptor.closed,
            open: descriptor.open,
            domain_min: min,
            domain_max: max,
        })
    }

    fn resolve_landmark(entry: usize, name: &str) -> Result<LandmarkName, ConfigError> {
        LandmarkName::from_str(name).map_err(|_| ConfigError::UnknownLandmark {
            entry,
            name: name.to_string(),
        })
    }
}

/// Ordered servo mappings. The order is the emission order in a dispatch
/// cycle.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct MappingTable {
    _descriptors: Vec<ServoMappingDescriptor>,
    _mappings: Vec<ServoMapping>,
}

impl MappingTable {
    /// Create a new mapping table. The whole table is rejected if any
    /// descriptor is invalid.
    ///
    /// # Arguments
    /// * `descriptors` - Servo mapping descriptors.
    ///
    /// # Returns
    /// A new mapping table.
    ///
    /// # Errors
    /// The first invalid descriptor.
    pub fn new(descriptors: Vec<ServoMappingDescriptor>) -> Result<Self, ConfigError> {
        let mappings = descriptors
            .iter()
            .enumerate()
            .map(|(entry, descriptor)| ServoMapping::from_descriptor(entry, descriptor))
            .collect::<Result<Vec<ServoMapping>, ConfigError>>()?;

        Ok(Self {
            _descriptors: descriptors,
            _mappings: mappings,
        })
    }

    /// Create the mapping table from the JSON array of descriptors.
    ///
    /// # Arguments
    /// * `value` - JSON array.
    ///
    /// # Returns
    /// A new mapping table.
    pub fn from_json(value: &Value) -> Result<Self, ConfigError> {
        let descriptors: Vec<ServoMappingDescriptor> = serde_json::from_value(value.clone())
            .map_err(|error| ConfigError::Parse(error.to_string()))?;

        Self::new(descriptors)
    }

    /// Read the mapping table from the JSON file.
    ///
    /// # Arguments
    /// * `filepath` - Path to the servo mapping file.
    ///
    /// # Returns
    /// A new mapping table.
    pub fn from_file(filepath: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(filepath).map_err(|error| ConfigError::ReadFile {
            path: filepath.display().to_string(),
            message: error.to_string(),
        })?;

        let descriptors: Vec<ServoMappingDescriptor> = serde_json::from_str(&content)
            .map_err(|error| ConfigError::Parse(error.to_string()))?;

        Self::new(descriptors)
    }

    /// Descriptors to read back the table.
    pub fn descriptors(&self) -> &[ServoMappingDescriptor] {
        &self._descriptors
    }

    /// Resolved mappings in the emission order.
    pub fn mappings(&self) -> &[ServoMapping] {
        &self._mappings
    }

    /// The table has the channel or not.
    pub fn has_channel(&self, channel: &ServoChannel) -> bool {
        self._mappings
            .iter()
            .any(|mapping| mapping.channel == *channel)
    }

    /// Descriptors in JSON.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self._descriptors).unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize {
        self._mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self._mappings.is_empty()
    }
}
