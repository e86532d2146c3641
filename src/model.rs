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

use log::{debug, error, info};
use serde_json::Value;
use std::{
    io::sink,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender},
        Arc,
    },
    thread::{sleep, spawn, JoinHandle},
    time::Duration,
};

use crate::config::Config;
use crate::constants::{BOUND_SYNC_CHANNEL, TERMINATOR};
use crate::error::StartupError;
use crate::face::{
    dispatch_process::{DispatchInput, DispatchProcess},
    dispatch_scheduler::DispatchScheduler,
    mapping::MappingTable,
};
use crate::interface::{
    serial_transport::{CommandTransport, SerialTransport},
    tcp_server::TcpServer,
    vision_server::VisionServer,
};
use crate::mock::mock_vision::MockVision;
use crate::telemetry::{
    telemetry::Telemetry, telemetry_default::TelemetryDefault,
    telemetry_dispatch::TelemetryDispatch,
};

pub struct Model {
    // Application configuration.
    _config: Config,
    // Is the simulation mode or not.
    _is_simulation_mode: bool,
    // Port of the vision server. This is available after the processes run.
    _port: Option<u16>,
    // Receiver of the telemetry to the model.
    _receiver_to_model: Receiver<Telemetry>,
    // Sender of the telemetry to the model. This is handed over to the
    // dispatch process when the processes run.
    _sender_to_model: Option<SyncSender<Telemetry>>,
    // Sender of the messages to the TCP/IP.
    _sender_to_tcp: Option<SyncSender<Vec<Value>>>,
    // Connection status of the vision server.
    _is_connected: Arc<AtomicBool>,
    // Last telemetry of the dispatch process.
    pub last_telemetry_dispatch: Option<TelemetryDispatch>,
    // Stop the threads.
    pub stop: Arc<AtomicBool>,
    // Handles of the threads.
    _handles: Vec<JoinHandle<()>>,
}

impl Model {
    /// Create a new model.
    ///
    /// # Arguments
    /// * `config` - Application configuration.
    /// * `is_simulation_mode` - Is the simulation mode or not. In the
    /// simulation mode, the synthetic face drives the dispatch process and
    /// the servo commands are discarded.
    ///
    /// # Returns
    /// A new model.
    pub fn new(config: Config, is_simulation_mode: bool) -> Self {
        let (sender_to_model, receiver_to_model) = sync_channel(BOUND_SYNC_CHANNEL);

        Self {
            _config: config,
            _is_simulation_mode: is_simulation_mode,
            _port: None,

            _receiver_to_model: receiver_to_model,
            _sender_to_model: Some(sender_to_model),
            _sender_to_tcp: None,
            _is_connected: Arc::new(AtomicBool::new(false)),

            last_telemetry_dispatch: None,

            stop: Arc::new(AtomicBool::new(false)),
            _handles: Vec::new(),
        }
    }

    /// Get the port of the vision server.
    ///
    /// # Returns
    /// Port number. None if the processes are not running.
    pub fn get_port(&self) -> Option<u16> {
        self._port
    }

    /// Stop the threads.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);

        for handle in self._handles.drain(..) {
            if handle.join().is_err() {
                error!("A process panicked before stopping.");
            }
        }
    }

    /// Run the processes.
    ///
    /// # Errors
    /// If the servo mapping is invalid, the serial device can not be opened,
    /// or the vision server can not bind to the port. No process is left
    /// running in this case.
    pub fn run_processes(&mut self) -> Result<(), StartupError> {
        let sender_to_model = match &self._sender_to_model {
            Some(sender) => sender.clone(),
            None => return Err(StartupError::AlreadyRunning),
        };

        let mapping_table = MappingTable::from_file(&self._config.servo_mapping)?;
        info!(
            "{} servo mappings are loaded from {}.",
            mapping_table.len(),
            self._config.servo_mapping.display()
        );

        let tcp_server = TcpServer::new(
            "Vision server",
            &self._config.host,
            self._config.port_vision,
            self._config.timeout,
            TERMINATOR,
            &self.stop,
        )?;
        self._port = tcp_server.get_port();

        let transport = self.create_transport()?;

        let sender_to_dispatch =
            self.run_dispatch_process(mapping_table, transport, &sender_to_model);

        self.run_vision_server(tcp_server, &sender_to_dispatch);

        if self._is_simulation_mode {
            self.run_mock_vision(sender_to_dispatch);
        }

        // Drop the internal sender to the model. This is to let the
        // self.step() know when all the senders are dropped once we stop the
        // application.
        self._sender_to_model = None;

        Ok(())
    }

    /// Create the transport of the servo commands.
    ///
    /// # Returns
    /// Transport. The commands are discarded in the simulation mode.
    ///
    /// # Errors
    /// If the serial device can not be opened.
    fn create_transport(&self) -> Result<Box<dyn CommandTransport + Send>, StartupError> {
        if self._is_simulation_mode {
            info!("Servo commands are discarded in the simulation mode.");

            return Ok(Box::new(SerialTransport::new(sink())));
        }

        Ok(Box::new(SerialTransport::open(&self._config.serial_device)?))
    }

    /// Run the dispatch process.
    ///
    /// # Arguments
    /// * `mapping_table` - Servo mapping table.
    /// * `transport` - Transport of the servo commands.
    /// * `sender_to_model` - Sender to the model.
    ///
    /// # Returns
    /// Sender to the dispatch process.
    fn run_dispatch_process(
        &mut self,
        mapping_table: MappingTable,
        transport: Box<dyn CommandTransport + Send>,
        sender_to_model: &SyncSender<Telemetry>,
    ) -> SyncSender<DispatchInput> {
        let mut scheduler = DispatchScheduler::new(mapping_table, self._config.delay_ms);
        scheduler.set_min_frame_interval(Duration::from_millis(
            self._config.min_frame_interval_ms,
        ));

        let mut dispatch_process = DispatchProcess::new(
            scheduler,
            transport,
            self._config.timeout,
            sender_to_model,
            &self.stop,
        );

        let sender_to_dispatch = dispatch_process.get_sender_to_dispatch();

        let handle = spawn(move || {
            dispatch_process.run();
        });

        self._handles.push(handle);

        sender_to_dispatch
    }

    /// Run the vision server.
    ///
    /// # Arguments
    /// * `tcp_server` - TCP server.
    /// * `sender_to_dispatch` - Sender to the dispatch process.
    fn run_vision_server(
        &mut self,
        mut tcp_server: TcpServer,
        sender_to_dispatch: &SyncSender<DispatchInput>,
    ) {
        let mut vision_server = VisionServer::new(sender_to_dispatch);
        vision_server.register_commands(&DispatchProcess::create_command_schema().command_names());

        self._sender_to_tcp = Some(vision_server.get_sender_to_tcp());
        self._is_connected = tcp_server.get_connection_status_reference();

        let handle = spawn(move || {
            tcp_server.run(
                VisionServer::process_message,
                Some(VisionServer::process_first_connection),
                &mut vision_server,
            );
        });

        self._handles.push(handle);
    }

    /// Run the mock vision pipeline.
    ///
    /// # Arguments
    /// * `sender_to_dispatch` - Sender to the dispatch process.
    fn run_mock_vision(&mut self, sender_to_dispatch: SyncSender<DispatchInput>) {
        let mut mock_vision = MockVision::new(self._config.simulation_frame_rate, &self.stop);

        let handle = spawn(move || {
            mock_vision.run(sender_to_dispatch);
        });

        self._handles.push(handle);
    }

    /// Step the model. This function waits for the new telemetry until the
    /// timeout.
    pub fn step(&mut self) {
        match self
            ._receiver_to_model
            .recv_timeout(Duration::from_millis(self._config.timeout))
        {
            Ok(telemetry) => self.process_telemetry(telemetry),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("All senders to the model are dropped.");

                sleep(Duration::from_millis(self._config.timeout));
            }
        }
    }

    /// Process the telemetry and publish it to the TCP/IP.
    ///
    /// # Arguments
    /// * `telemetry` - Telemetry from the dispatch process.
    fn process_telemetry(&mut self, telemetry: Telemetry) {
        let mut messages = Vec::new();

        if let Some(command_result) = telemetry.command_result {
            messages.push(command_result);
        }

        if let Some(mut events) = telemetry.events {
            messages.append(&mut events);
        }

        if let Some(telemetry_dispatch) = telemetry.dispatch {
            messages.append(&mut telemetry_dispatch.get_messages(self._config.telemetry_digit));

            self.last_telemetry_dispatch = Some(telemetry_dispatch);
        }

        self.publish_messages(messages);
    }

    /// Publish the messages to the TCP/IP.
    ///
    /// # Arguments
    /// * `messages` - Messages to publish.
    ///
    /// # Returns
    /// Did the publishment or not.
    fn publish_messages(&self, messages: Vec<Value>) -> bool {
        // No connection, return immediately
        if messages.is_empty() || !self.is_connected() {
            return false;
        }

        match &self._sender_to_tcp {
            Some(sender) => sender.try_send(messages).is_ok(),
            None => false,
        }
    }

    /// Check there is a connection or not.
    ///
    /// # Returns
    /// Is connected or not.
    pub fn is_connected(&self) -> bool {
        self._is_connected.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use std::net::TcpStream;
    use std::path::{Path, PathBuf};

    use crate::constants::LOCAL_HOST;
    use crate::utility::{client_read_specific_json, client_write_and_sleep};

    const MAX_STEP: i32 = 30;
    const SLEEP_TIME: u64 = 100;

    fn create_config() -> Config {
        let mut config = Config::new(Path::new("config/parameters_app.yaml"));
        config.host = LOCAL_HOST.to_string();
        config.port_vision = 0;

        config
    }

    fn create_tcp_client(model: &Model) -> TcpStream {
        TcpStream::connect(format!("{}:{}", LOCAL_HOST, model.get_port().unwrap()))
            .expect("Tcp stream should connect.")
    }

    fn step(model: &mut Model, times: i32) {
        for _ in 0..times {
            model.step();
        }
    }

    fn wait_for_connection(model: &mut Model) {
        for _ in 0..MAX_STEP {
            model.step();
            if model.is_connected() {
                break;
            }
        }
    }

    #[test]
    fn test_new() {
        let model = Model::new(create_config(), true);

        assert_eq!(model.get_port(), None);
        assert!(!model.is_connected());
        assert!(model._sender_to_model.is_some());
    }

    #[test]
    fn test_run_processes_fail_mapping() {
        let mut config = create_config();
        config.servo_mapping = PathBuf::from("config/wrong.json");

        let mut model = Model::new(config, true);

        assert!(matches!(
            model.run_processes(),
            Err(StartupError::Config(_))
        ));
        assert!(model._handles.is_empty());
    }

    #[test]
    fn test_run_processes_fail_serial_device() {
        let mut config = create_config();
        config.serial_device = PathBuf::from("/wrong/serial_device");

        let mut model = Model::new(config, false);

        assert!(matches!(
            model.run_processes(),
            Err(StartupError::Transport(_))
        ));
        assert!(model._handles.is_empty());
    }

    #[test]
    fn test_run_processes_twice() {
        let mut model = Model::new(create_config(), true);

        assert!(model.run_processes().is_ok());
        assert!(matches!(
            model.run_processes(),
            Err(StartupError::AlreadyRunning)
        ));

        model.stop();
    }

    #[test]
    fn test_step_simulation() {
        let mut model = Model::new(create_config(), true);
        model.run_processes().unwrap();

        assert_ne!(model.get_port(), Some(0));

        step(&mut model, MAX_STEP);

        let telemetry = model.last_telemetry_dispatch.clone().unwrap();

        assert!(telemetry.frames_dispatched > 0);
        assert!(telemetry.commands_sent >= 19);
        assert_eq!(telemetry.transport_failures, 0);

        model.stop();
    }

    #[test]
    fn test_welcome_messages() {
        let mut model = Model::new(create_config(), true);
        model.run_processes().unwrap();

        let mut client = create_tcp_client(&model);
        wait_for_connection(&mut model);
        step(&mut model, MAX_STEP);

        let message = client_read_specific_json(&mut client, TERMINATOR, "servoConfig");

        assert_eq!(message["config"].as_array().unwrap().len(), 19);

        assert_eq!(
            client_read_specific_json(&mut client, TERMINATOR, "dispatchDelay"),
            json!({"id": "dispatchDelay", "delayMs": 1})
        );

        let telemetry = client_read_specific_json(&mut client, TERMINATOR, "tel_dispatch");

        assert!(telemetry["framesReceived"].as_u64().unwrap() > 0);

        model.stop();
    }

    #[test]
    fn test_command() {
        let mut model = Model::new(create_config(), true);
        model.run_processes().unwrap();

        let mut client = create_tcp_client(&model);
        wait_for_connection(&mut model);
        step(&mut model, MAX_STEP);

        // Consume the welcome message.
        client_read_specific_json(&mut client, TERMINATOR, "dispatchDelay");

        client_write_and_sleep(
            &mut client,
            "{\"id\":\"cmd_setDispatchDelay\",\"sequence_id\":1,\"delayMs\":2}\r\n",
            SLEEP_TIME,
        );
        step(&mut model, MAX_STEP);

        assert_eq!(
            client_read_specific_json(&mut client, TERMINATOR, "ack"),
            json!({"id": "ack", "sequence_id": 1})
        );
        assert_eq!(
            client_read_specific_json(&mut client, TERMINATOR, "success"),
            json!({"id": "success", "sequence_id": 1})
        );
        assert_eq!(
            client_read_specific_json(&mut client, TERMINATOR, "dispatchDelay"),
            json!({"id": "dispatchDelay", "delayMs": 2})
        );

        // Invalid configuration
        client_write_and_sleep(
            &mut client,
            "{\"id\":\"cmd_setServoConfig\",\"sequence_id\":2,\"config\":[{\"idx\":\"chin\"}]}\r\n",
            SLEEP_TIME,
        );
        step(&mut model, MAX_STEP);

        assert_eq!(
            client_read_specific_json(&mut client, TERMINATOR, "fail"),
            json!({"id": "fail", "sequence_id": 2})
        );
        assert!(
            client_read_specific_json(&mut client, TERMINATOR, "servoConfigRejected")["reason"]
                .is_string()
        );

        // No sequence ID
        client_write_and_sleep(
            &mut client,
            "{\"id\":\"cmd_getDispatchDelay\"}\r\n",
            SLEEP_TIME,
        );
        step(&mut model, MAX_STEP);

        assert_eq!(
            client_read_specific_json(&mut client, TERMINATOR, "success"),
            json!({"id": "success", "sequence_id": -1})
        );

        model.stop();
    }
}
