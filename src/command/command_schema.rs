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

use log::error;
use serde_json::Value;

use crate::enums::CommandStatus;
use crate::face::dispatch_scheduler::DispatchScheduler;
use crate::utility::{acknowledge_command, get_message_name, get_message_sequence_id};

pub trait Command {
    /// Get the name of the command.
    ///
    /// # Returns
    /// Command name.
    fn name(&self) -> &str;

    /// Execute the command.
    ///
    /// # Arguments
    /// * `message` - Command message to execute.
    /// * `scheduler` - Dispatch scheduler to execute the command.
    ///
    /// # Returns
    /// Command execution result.
    fn execute(&self, message: &Value, scheduler: &mut DispatchScheduler) -> Option<()>;
}

pub struct CommandSchema {
    // List of commands.
    pub commands: Vec<Box<dyn Command + Send>>,
}

impl CommandSchema {
    /// Create a new command schema.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Add a command to the schema.
    pub fn add_command(&mut self, command: Box<dyn Command + Send>) {
        self.commands.push(command);
    }

    /// Names of the commands in the schema.
    pub fn command_names(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|command| command.name().to_string())
            .collect()
    }

    /// Execute a command.
    ///
    /// # Arguments
    /// * `message` - Command message to execute.
    /// * `scheduler` - Dispatch scheduler to execute the command.
    ///
    /// # Returns
    /// Command execution result.
    pub fn execute(&self, message: &Value, scheduler: &mut DispatchScheduler) -> Value {
        let name = get_message_name(message);
        let sequence_id = get_message_sequence_id(message);

        let command_status = match self.commands.iter().find(|cmd| cmd.name() == name) {
            Some(cmd) => match cmd.execute(message, scheduler) {
                Some(()) => CommandStatus::Success,
                None => {
                    error!("Command execution failed: {message}");

                    CommandStatus::Fail
                }
            },
            None => {
                error!("Unknown command: {message}");

                CommandStatus::Fail
            }
        };

        acknowledge_command(command_status, sequence_id)
    }

    /// Get the number of commands.
    ///
    /// # Returns
    /// Number of commands.
    pub fn number_of_commands(&self) -> usize {
        self.commands.len()
    }
}
