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

use log::{error, info};
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    flag::register,
};
use std::path::Path;
use std::sync::atomic::Ordering;

use crate::config::Config;
use crate::model::Model;

/// Run the application.
///
/// # Arguments
/// * `port` - Port of the vision server. Put 0 to use the configuration file.
/// * `delay` - Waiting time after each servo command in milliseconds. Put
/// None to use the configuration file.
/// * `is_simulation_mode` - Is the simulation mode or not.
pub fn run(port: u16, delay: Option<u64>, is_simulation_mode: bool) {
    // Log the running mode
    let mode = if is_simulation_mode {
        "simulation mode"
    } else {
        "hardware mode"
    };
    info!("Run the face controller in {mode}.");

    let config = get_final_config(
        Config::new(Path::new("config/parameters_app.yaml")),
        port,
        delay,
    );
    info!(
        "Vision server is on {}:{} and the dispatch delay is {} ms.",
        config.host, config.port_vision, config.delay_ms
    );

    // Create the model
    let mut model = Model::new(config, is_simulation_mode);

    // Register the signals that stop the application
    for signal in [SIGTERM, SIGINT].iter() {
        let _ = register(*signal, model.stop.clone());
    }

    // Run the processes
    if let Err(error) = model.run_processes() {
        error!("Failed to start the face controller: {error}.");
        return;
    }

    // Run the main loop
    while !model.stop.load(Ordering::Relaxed) {
        model.step();
    }

    info!("Stopping the face controller...");

    // Stop the processes and wait for all the threads
    model.stop();

    info!("Face controller is stopped.");
}

/// Get the final configuration with the command line overrides.
///
/// # Arguments
/// * `config` - Configuration from the file.
/// * `port` - Port of the vision server. If the value is 0, the port in the
/// configuration file is used.
/// * `delay` - Waiting time after each servo command in milliseconds. If the
/// value is None, the delay in the configuration file is used.
///
/// # Returns
/// Final configuration.
fn get_final_config(mut config: Config, port: u16, delay: Option<u64>) -> Config {
    if port != 0 {
        config.port_vision = port;
    }

    if let Some(delay_ms) = delay {
        config.delay_ms = delay_ms;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_final_config() {
        let config_file = Path::new("config/parameters_app.yaml");

        let config = get_final_config(Config::new(config_file), 0, None);

        assert_eq!(config.port_vision, 50020);
        assert_eq!(config.delay_ms, 1);

        let config = get_final_config(Config::new(config_file), 10, Some(0));

        assert_eq!(config.port_vision, 10);
        assert_eq!(config.delay_ms, 0);
    }
}
