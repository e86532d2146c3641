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
use std::path::{Path, PathBuf};

use crate::constants::MAX_DELAY_MS;
use crate::utility::get_parameter;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Config {
    // Configuration filename.
    pub filename: String,
    // Host of the TCP/IP server.
    pub host: String,
    // Port of the TCP/IP server for the vision pipeline.
    pub port_vision: u16,
    // Timeout of the TCP/IP server in milliseconds.
    pub timeout: u64,
    // Number of digits after the decimal point in the telemetry.
    pub telemetry_digit: i32,
    // Serial device of the servo receiver.
    pub serial_device: PathBuf,
    // Waiting time after each servo command in milliseconds.
    pub delay_ms: u64,
    // Minimum time between two accepted landmark frames in milliseconds.
    pub min_frame_interval_ms: u64,
    // Servo mapping table file.
    pub servo_mapping: PathBuf,
    // Frame rate of the synthetic face in Hz.
    pub simulation_frame_rate: f64,
}

impl Config {
    /// Create a new config object.
    ///
    /// # Arguments
    /// * `filepath` - The path to the application parameters file.
    ///
    /// # Returns
    /// A new config object.
    ///
    /// # Panics
    /// If any parameter is missing or not valid.
    pub fn new(filepath: &Path) -> Self {
        let config = Self {
            filename: filepath.display().to_string(),

            host: get_parameter(filepath, "host"),
            port_vision: get_parameter(filepath, "port_vision"),
            timeout: get_parameter(filepath, "timeout"),
            telemetry_digit: get_parameter(filepath, "telemetry_digit"),

            serial_device: PathBuf::from(get_parameter::<String>(filepath, "serial_device")),

            delay_ms: get_parameter(filepath, "delay_ms"),
            min_frame_interval_ms: get_parameter(filepath, "min_frame_interval_ms"),

            servo_mapping: PathBuf::from(get_parameter::<String>(filepath, "servo_mapping")),

            simulation_frame_rate: get_parameter(filepath, "simulation_frame_rate"),
        };

        if config.delay_ms > MAX_DELAY_MS {
            panic!(
                "delay_ms should be <= {MAX_DELAY_MS} in the {}",
                config.filename
            );
        }

        if !(config.simulation_frame_rate.is_finite() && (config.simulation_frame_rate > 0.0)) {
            panic!(
                "simulation_frame_rate should be positive in the {}",
                config.filename
            );
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::read_to_string;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    #[test]
    fn test_new() {
        let config = Config::new(Path::new("config/parameters_app.yaml"));

        assert_eq!(config.filename, "config/parameters_app.yaml");

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port_vision, 50020);
        assert_eq!(config.timeout, 20);
        assert_eq!(config.telemetry_digit, 7);

        assert_eq!(config.serial_device, PathBuf::from("/dev/ttyUSB0"));

        assert_eq!(config.delay_ms, 1);
        assert_eq!(config.min_frame_interval_ms, 15);

        assert_eq!(
            config.servo_mapping,
            PathBuf::from("config/servo_mapping.json")
        );
        assert_eq!(config.simulation_frame_rate, 30.0);
    }

    fn write_parameters(key: &str, value: &str) -> NamedTempFile {
        let parameters = read_to_string("config/parameters_app.yaml").unwrap();
        let replaced: Vec<String> = parameters
            .lines()
            .map(|line| {
                if line.starts_with(&format!("{key}:")) {
                    format!("{key}: {value}")
                } else {
                    line.to_string()
                }
            })
            .collect();

        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(replaced.join("\n").as_bytes()).unwrap();
        file.flush().unwrap();

        file
    }

    #[test]
    #[should_panic(expected = "delay_ms should be <= 1000")]
    fn test_new_delay_too_long() {
        let file = write_parameters("delay_ms", "5000");

        Config::new(file.path());
    }

    #[test]
    #[should_panic(expected = "simulation_frame_rate should be positive")]
    fn test_new_frame_rate_zero() {
        let file = write_parameters("simulation_frame_rate", "0.0");

        Config::new(file.path());
    }
}
