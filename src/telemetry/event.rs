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

use serde_json::{json, Value};

use crate::face::mapping::MappingTable;

pub struct Event;
impl Event {
    /// Get the message of the servo mapping table.
    ///
    /// # Arguments
    /// * `mapping_table` - Servo mapping table in use.
    ///
    /// # Returns
    /// The message of the servo mapping table.
    pub fn get_message_servo_config(mapping_table: &MappingTable) -> Value {
        json!({
            "id": "servoConfig",
            "config": mapping_table.to_json(),
        })
    }

    /// Get the message that the new servo mapping table is rejected.
    ///
    /// # Arguments
    /// * `reason` - Reason of the rejection.
    ///
    /// # Returns
    /// The message that the new servo mapping table is rejected.
    pub fn get_message_servo_config_rejected(reason: &str) -> Value {
        json!({
            "id": "servoConfigRejected",
            "reason": reason,
        })
    }

    /// Get the message of the waiting time after each servo command.
    ///
    /// # Arguments
    /// * `delay_ms` - Delay in milliseconds.
    ///
    /// # Returns
    /// The message of the dispatch delay.
    pub fn get_message_dispatch_delay(delay_ms: u64) -> Value {
        json!({
            "id": "dispatchDelay",
            "delayMs": delay_ms,
        })
    }
}
