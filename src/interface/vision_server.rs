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

use log::{info, trace};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread::sleep;
use std::time::Duration;

use crate::constants::BOUND_SYNC_CHANNEL;
use crate::enums::CommandStatus;
use crate::face::dispatch_process::DispatchInput;
use crate::face::landmark::{LandmarkPoint, LandmarkSnapshot};
use crate::interface::tcp_server::TcpServer;
use crate::utility::{acknowledge_command, get_message_name, get_message_sequence_id, is_command};

// Name of the message that carries the landmark points of a frame.
const NAME_LANDMARKS: &str = "landmarks";

pub struct VisionServer {
    // Sender of the messages to the TCP/IP.
    _sender_to_tcp: SyncSender<Vec<Value>>,
    // Receiver of the messages to the TCP/IP.
    pub receiver_to_tcp: Receiver<Vec<Value>>,
    // Sender of the snapshots and commands to the dispatch process.
    pub sender_to_dispatch: SyncSender<DispatchInput>,
    // List of the registered commands.
    _commands: Vec<String>,
    // Last sequence ID.
    _last_sequence_id: i64,
}

impl VisionServer {
    /// Create a new vision server instance.
    ///
    /// # Arguments
    /// * `sender_to_dispatch` - Sender to the dispatch process.
    ///
    /// # Returns
    /// Vision server.
    pub fn new(sender_to_dispatch: &SyncSender<DispatchInput>) -> Self {
        let (sender_to_tcp, receiver_to_tcp) = sync_channel(BOUND_SYNC_CHANNEL);

        Self {
            _sender_to_tcp: sender_to_tcp,
            receiver_to_tcp: receiver_to_tcp,

            sender_to_dispatch: sender_to_dispatch.clone(),

            _commands: Vec::new(),

            _last_sequence_id: -1,
        }
    }

    /// Get the sender to the TCP/IP.
    ///
    /// # Returns
    /// Sender.
    pub fn get_sender_to_tcp(&self) -> SyncSender<Vec<Value>> {
        self._sender_to_tcp.clone()
    }

    /// Register the commands.
    ///
    /// # Arguments
    /// * `commands` - Command names. Each name should begin with "cmd_".
    pub fn register_commands(&mut self, commands: &[String]) {
        self._commands = commands.to_vec();
    }

    /// Check if the command is registered or not.
    ///
    /// # Arguments
    /// * `command` - Command that begins with "cmd_".
    ///
    /// # Returns
    /// True if the command is registered, false otherwise.
    pub fn is_registered_command(&self, command: &str) -> bool {
        self._commands.iter().any(|registered| registered == command)
    }

    /// Reset the sequence ID.
    pub fn reset_sequence_id(&mut self) {
        self._last_sequence_id = -1;
    }

    /// Check the sequence ID.
    ///
    /// # Arguments
    /// * `sequence_id` - Sequence ID, which should be >= 0.
    ///
    /// # Returns
    /// Lost sequence IDs.
    pub fn check_sequence_id(&mut self, sequence_id: i64) -> Vec<i64> {
        if self._last_sequence_id == -1 {
            self._last_sequence_id = sequence_id;
            return Vec::new();
        }

        let expected_sequence_id = self._last_sequence_id + 1;

        let mut lost_sequence_ids = Vec::new();
        if sequence_id > expected_sequence_id {
            lost_sequence_ids = (expected_sequence_id..sequence_id).collect();
        }

        self._last_sequence_id = sequence_id;

        lost_sequence_ids
    }

    /// Parse the landmark message.
    ///
    /// # Arguments
    /// * `message` - Message with the "points" field.
    ///
    /// # Returns
    /// Landmark snapshot. None if there is no usable point list.
    pub fn parse_snapshot(message: &Value) -> Option<LandmarkSnapshot> {
        Vec::<LandmarkPoint>::deserialize(&message["points"])
            .ok()
            .map(LandmarkSnapshot::new)
    }

    /// Process the message.
    ///
    /// # Arguments
    /// * `tcp_server` - TCP server.
    /// * `vision_server` - Vision server.
    pub fn process_message(tcp_server: &mut TcpServer, vision_server: &mut VisionServer) {
        let mut is_processed = false;

        // Check the landmarks/command from the TCP/IP and send to the
        // dispatch process.
        if let Some(message_received) = tcp_server.read_json() {
            let name = get_message_name(&message_received);

            if name == NAME_LANDMARKS {
                let snapshot = Self::parse_snapshot(&message_received);

                // The dispatch process is busy if the channel is full.
                if vision_server
                    .sender_to_dispatch
                    .try_send(DispatchInput::Snapshot(snapshot))
                    .is_err()
                {
                    trace!("Drop the landmark frame.");
                }
            } else if is_command(&name) {
                Self::process_command(tcp_server, vision_server, &name, message_received);
            } else {
                info!("Invalid message: {message_received}.");
            }

            is_processed = true;
        }

        // Check the command result, event, or telemetry, and send to the
        // TCP/IP.
        if let Ok(message_send) = vision_server.receiver_to_tcp.try_recv() {
            tcp_server.write_jsons(&message_send);

            is_processed = true;
        }

        // Sleep for a while to avoid busy waiting if nothing is received or
        // sent.
        if !is_processed {
            sleep(Duration::from_millis(tcp_server.timeout));
        }
    }

    /// Acknowledge the command and send it to the dispatch process.
    ///
    /// # Arguments
    /// * `tcp_server` - TCP server.
    /// * `vision_server` - Vision server.
    /// * `name` - Command name.
    /// * `message` - Command message.
    fn process_command(
        tcp_server: &mut TcpServer,
        vision_server: &mut VisionServer,
        name: &str,
        message: Value,
    ) {
        let sequence_id = get_message_sequence_id(&message);

        if !vision_server.is_registered_command(name) {
            tcp_server.write_json(&acknowledge_command(CommandStatus::NoAck, sequence_id));
            return;
        }

        // Check the sequence ID if any. For the lost ones, send a NoAck.
        if sequence_id >= 0 {
            for lost_sequence_id in vision_server.check_sequence_id(sequence_id) {
                tcp_server.write_json(&acknowledge_command(
                    CommandStatus::NoAck,
                    lost_sequence_id,
                ));
            }
        }

        tcp_server.write_json(&acknowledge_command(CommandStatus::Ack, sequence_id));

        if vision_server
            .sender_to_dispatch
            .try_send(DispatchInput::Command(message))
            .is_err()
        {
            tcp_server.write_json(&acknowledge_command(CommandStatus::Fail, sequence_id));
        }
    }

    /// Process the first connection. The current configuration is sent to
    /// the new client.
    ///
    /// # Arguments
    /// * `tcp_server` - TCP server.
    /// * `vision_server` - Vision server.
    pub fn process_first_connection(
        _tcp_server: &mut TcpServer,
        vision_server: &mut VisionServer,
    ) {
        vision_server.reset_sequence_id();

        for name in ["cmd_getServoConfig", "cmd_getDispatchDelay"] {
            let _ = vision_server
                .sender_to_dispatch
                .try_send(DispatchInput::InternalCommand(json!({"id": name})));
        }
    }
}
