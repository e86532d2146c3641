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
use serde_json::Value;

use crate::command::command_schema::Command;
use crate::constants::MAX_DELAY_MS;
use crate::face::dispatch_scheduler::DispatchScheduler;
use crate::face::mapping::MappingTable;
use crate::telemetry::event::Event;

/// Command to read back the servo mapping table.
pub struct CommandGetServoConfig;
impl Command for CommandGetServoConfig {
    fn name(&self) -> &str {
        "cmd_getServoConfig"
    }

    fn execute(&self, _message: &Value, scheduler: &mut DispatchScheduler) -> Option<()> {
        let event = Event::get_message_servo_config(scheduler.get_mapping_table());
        scheduler.add_event(event);

        Some(())
    }
}

/// Command to replace the servo mapping table as a whole.
pub struct CommandSetServoConfig;
impl Command for CommandSetServoConfig {
    fn name(&self) -> &str {
        "cmd_setServoConfig"
    }

    fn execute(&self, message: &Value, scheduler: &mut DispatchScheduler) -> Option<()> {
        match MappingTable::from_json(&message["config"]) {
            Ok(mapping_table) => {
                info!(
                    "Replace the servo mapping table with {} mappings.",
                    mapping_table.len()
                );

                scheduler.replace_mapping_table(mapping_table);

                let event = Event::get_message_servo_config(scheduler.get_mapping_table());
                scheduler.add_event(event);

                Some(())
            }
            Err(err) => {
                error!("Reject the servo mapping table: {err}");

                scheduler.add_event(Event::get_message_servo_config_rejected(&err.to_string()));

                None
            }
        }
    }
}

/// Command to read the waiting time after each servo command.
pub struct CommandGetDispatchDelay;
impl Command for CommandGetDispatchDelay {
    fn name(&self) -> &str {
        "cmd_getDispatchDelay"
    }

    fn execute(&self, _message: &Value, scheduler: &mut DispatchScheduler) -> Option<()> {
        scheduler.add_event(Event::get_message_dispatch_delay(scheduler.get_delay()));

        Some(())
    }
}

/// Command to set the waiting time after each servo command.
pub struct CommandSetDispatchDelay;
impl Command for CommandSetDispatchDelay {
    fn name(&self) -> &str {
        "cmd_setDispatchDelay"
    }

    fn execute(&self, message: &Value, scheduler: &mut DispatchScheduler) -> Option<()> {
        let delay_ms = message["delayMs"].as_u64()?;
        if delay_ms > MAX_DELAY_MS {
            error!("Dispatch delay {delay_ms} ms is over the maximum {MAX_DELAY_MS} ms.");

            return None;
        }

        scheduler.set_delay(delay_ms);
        scheduler.add_event(Event::get_message_dispatch_delay(delay_ms));

        Some(())
    }
}

/// Command to forget the last sent angles. The next accepted frame sends the
/// commands to all the channels.
pub struct CommandResetDispatchState;
impl Command for CommandResetDispatchState {
    fn name(&self) -> &str {
        "cmd_resetDispatchState"
    }

    fn execute(&self, _message: &Value, scheduler: &mut DispatchScheduler) -> Option<()> {
        scheduler.reset();

        Some(())
    }
}
