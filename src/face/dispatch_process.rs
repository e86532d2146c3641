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
use serde_json::Value;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender},
    Arc,
};
use std::time::{Duration, Instant};

use crate::command::{
    command_dispatch::{
        CommandGetDispatchDelay, CommandGetServoConfig, CommandResetDispatchState,
        CommandSetDispatchDelay, CommandSetServoConfig,
    },
    command_schema::CommandSchema,
};
use crate::constants::BOUND_SYNC_CHANNEL;
use crate::face::dispatch_scheduler::DispatchScheduler;
use crate::face::landmark::LandmarkSnapshot;
use crate::interface::serial_transport::CommandTransport;
use crate::telemetry::telemetry::Telemetry;

/// Input of the dispatch process.
pub enum DispatchInput {
    // Landmark snapshot. None if there is no usable face in the frame.
    Snapshot(Option<LandmarkSnapshot>),
    // Configuration command from the client.
    Command(Value),
    // Configuration command issued by the controller itself. Only its events
    // are reported.
    InternalCommand(Value),
}

pub struct DispatchProcess {
    // Dispatch scheduler
    pub scheduler: DispatchScheduler,
    // Transport of the servo commands.
    _transport: Box<dyn CommandTransport + Send>,
    // Command schema
    _command_schema: CommandSchema,
    // Sender of the telemetry to the model.
    _sender_to_model: SyncSender<Telemetry>,
    // Sender of the input to the dispatch process.
    _sender_to_dispatch: SyncSender<DispatchInput>,
    // Receiver of the input to the dispatch process.
    _receiver_to_dispatch: Receiver<DispatchInput>,
    // Time to wait for the input before checking the stop flag.
    _timeout: Duration,
    // Stop the loop.
    _stop: Arc<AtomicBool>,
}

impl DispatchProcess {
    /// Create a new instance of the dispatch process.
    ///
    /// # Arguments
    /// * `scheduler` - Dispatch scheduler.
    /// * `transport` - Transport of the servo commands.
    /// * `timeout` - Timeout in milliseconds to wait for the input.
    /// * `sender_to_model` - The sender to the model.
    /// * `stop` - An Arc instance that holds the AtomicBool instance to stop
    /// the loop.
    ///
    /// # Returns
    /// New instance of the dispatch process.
    pub fn new(
        scheduler: DispatchScheduler,
        transport: Box<dyn CommandTransport + Send>,
        timeout: u64,
        sender_to_model: &SyncSender<Telemetry>,
        stop: &Arc<AtomicBool>,
    ) -> Self {
        let (sender_to_dispatch, receiver_to_dispatch) = sync_channel(BOUND_SYNC_CHANNEL);

        Self {
            scheduler: scheduler,
            _transport: transport,

            _command_schema: Self::create_command_schema(),

            _sender_to_model: sender_to_model.clone(),

            _sender_to_dispatch: sender_to_dispatch,
            _receiver_to_dispatch: receiver_to_dispatch,

            _timeout: Duration::from_millis(timeout),
            _stop: stop.clone(),
        }
    }

    /// Create the command schema.
    ///
    /// # Returns
    /// Command schema.
    pub fn create_command_schema() -> CommandSchema {
        let mut command_schema = CommandSchema::new();
        command_schema.add_command(Box::new(CommandGetServoConfig));
        command_schema.add_command(Box::new(CommandSetServoConfig));
        command_schema.add_command(Box::new(CommandGetDispatchDelay));
        command_schema.add_command(Box::new(CommandSetDispatchDelay));
        command_schema.add_command(Box::new(CommandResetDispatchState));

        command_schema
    }

    /// Get the sender to the dispatch process.
    ///
    /// # Returns
    /// The sender to the dispatch process.
    pub fn get_sender_to_dispatch(&self) -> SyncSender<DispatchInput> {
        self._sender_to_dispatch.clone()
    }

    /// Run the dispatch process. Only one dispatch cycle runs at a time and
    /// the configuration commands are executed between the cycles.
    pub fn run(&mut self) {
        info!("Dispatch process is running.");

        while !self._stop.load(Ordering::Relaxed) {
            match self._receiver_to_dispatch.recv_timeout(self._timeout) {
                Ok(input) => self.process(input),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!("Dispatch process is stopped.");
    }

    /// Process the input. For a snapshot, the queued inputs are drained first:
    /// the commands are executed in order and only the newest snapshot is
    /// dispatched.
    ///
    /// # Arguments
    /// * `input` - Received input.
    fn process(&mut self, input: DispatchInput) {
        let mut snapshot = match input {
            DispatchInput::Command(message) => {
                self.execute_command(&message, false);
                return;
            }
            DispatchInput::InternalCommand(message) => {
                self.execute_command(&message, true);
                return;
            }
            DispatchInput::Snapshot(snapshot) => snapshot,
        };

        while let Ok(input) = self._receiver_to_dispatch.try_recv() {
            match input {
                DispatchInput::Command(message) => self.execute_command(&message, false),
                DispatchInput::InternalCommand(message) => self.execute_command(&message, true),
                DispatchInput::Snapshot(newer) => {
                    trace!("Drop the superseded snapshot.");

                    snapshot = newer;
                }
            }
        }

        self.dispatch(snapshot.as_ref());
    }

    /// Execute the command and send the result to the model.
    ///
    /// # Arguments
    /// * `message` - Command message.
    /// * `is_internal` - The command is issued by the controller itself. The
    /// result is not sent but the events are.
    fn execute_command(&mut self, message: &Value, is_internal: bool) {
        let command_result = self._command_schema.execute(message, &mut self.scheduler);

        // Ignore the error if the model is not listening.
        let _ = self._sender_to_model.try_send(Telemetry::new(
            None,
            (!is_internal).then_some(command_result),
            self.scheduler.take_events(),
        ));
    }

    /// Run a dispatch cycle and send the telemetry to the model if the
    /// snapshot is accepted.
    ///
    /// # Arguments
    /// * `snapshot` - Landmark snapshot.
    fn dispatch(&mut self, snapshot: Option<&LandmarkSnapshot>) {
        let now = Instant::now();

        let result = self
            .scheduler
            .process_snapshot(snapshot, self._transport.as_mut());

        if result.is_ok() {
            self.scheduler.telemetry.cycle_time = now.elapsed().as_secs_f64();

            let _ = self._sender_to_model.try_send(Telemetry::new(
                Some(self.scheduler.telemetry.clone()),
                None,
                self.scheduler.take_events(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use std::sync::Mutex;
    use std::thread::{sleep, spawn};

    use crate::constants::NUM_LANDMARK;
    use crate::enums::LandmarkName;
    use crate::error::TransportError;
    use crate::face::landmark::LandmarkPoint;
    use crate::face::mapping::MappingTable;

    const TIMEOUT: u64 = 20;

    // Transport that shares the sent commands with the test.
    struct SharedTransport {
        commands: Arc<Mutex<Vec<String>>>,
    }

    impl CommandTransport for SharedTransport {
        fn send_command(&mut self, command: &str) -> Result<(), TransportError> {
            self.commands
                .lock()
                .map_err(|_| TransportError::Disconnected)?
                .push(command.to_string());

            Ok(())
        }
    }

    fn create_dispatch_process() -> (
        DispatchProcess,
        Receiver<Telemetry>,
        Arc<Mutex<Vec<String>>>,
    ) {
        let mapping_table = MappingTable::from_json(&json!([
            {"idx": "upperLip", "ref": "lowerLip", "axis": "x", "pin": 0,
             "closed": 0, "open": 180, "dMin": 0.2, "dMax": 0.8, "prefix": "F"},
        ]))
        .unwrap();

        let commands = Arc::new(Mutex::new(Vec::new()));
        let transport = SharedTransport {
            commands: commands.clone(),
        };

        let stop = Arc::new(AtomicBool::new(false));
        let (sender_to_model, receiver_to_model) = sync_channel(BOUND_SYNC_CHANNEL);

        (
            DispatchProcess::new(
                DispatchScheduler::new(mapping_table, 0),
                Box::new(transport),
                TIMEOUT,
                &sender_to_model,
                &stop,
            ),
            receiver_to_model,
            commands,
        )
    }

    // Eye corners at (0, 0) and (1, 0) with no roll.
    fn create_snapshot(upper_lip_x: f64) -> LandmarkSnapshot {
        let mut points = vec![LandmarkPoint::default(); NUM_LANDMARK];
        points[LandmarkName::LeftEyeOuter.index()] = LandmarkPoint::new(0.0, 0.0, 0.0);
        points[LandmarkName::RightEyeOuter.index()] = LandmarkPoint::new(1.0, 0.0, 0.0);
        points[LandmarkName::NoseTip.index()] = LandmarkPoint::new(0.5, 0.5, 0.0);
        points[LandmarkName::UpperLip.index()] = LandmarkPoint::new(upper_lip_x, 0.5, 0.0);
        points[LandmarkName::LowerLip.index()] = LandmarkPoint::new(0.0, 0.5, 0.0);

        LandmarkSnapshot::new(points)
    }

    #[test]
    fn test_new() {
        let dispatch_process = create_dispatch_process().0;

        assert_eq!(dispatch_process._command_schema.number_of_commands(), 5);
    }

    #[test]
    fn test_process_command() {
        let (mut dispatch_process, receiver_to_model, _) = create_dispatch_process();

        dispatch_process.process(DispatchInput::Command(json!({
            "id": "cmd_setDispatchDelay",
            "sequence_id": 3,
            "delayMs": 2,
        })));

        let telemetry = receiver_to_model.try_recv().unwrap();

        assert!(telemetry.dispatch.is_none());
        assert_eq!(
            telemetry.command_result.unwrap(),
            json!({"id": "success", "sequence_id": 3})
        );
        assert_eq!(
            telemetry.events.unwrap(),
            vec![json!({"id": "dispatchDelay", "delayMs": 2})]
        );
        assert_eq!(dispatch_process.scheduler.get_delay(), 2);
    }

    #[test]
    fn test_process_command_without_sequence_id() {
        let (mut dispatch_process, receiver_to_model, _) = create_dispatch_process();

        dispatch_process.process(DispatchInput::Command(json!({
            "id": "cmd_getDispatchDelay",
        })));

        let telemetry = receiver_to_model.try_recv().unwrap();

        assert_eq!(
            telemetry.command_result.unwrap(),
            json!({"id": "success", "sequence_id": -1})
        );
    }

    #[test]
    fn test_process_internal_command() {
        let (mut dispatch_process, receiver_to_model, _) = create_dispatch_process();

        dispatch_process.process(DispatchInput::InternalCommand(json!({
            "id": "cmd_getDispatchDelay",
        })));

        let telemetry = receiver_to_model.try_recv().unwrap();

        assert!(telemetry.command_result.is_none());
        assert_eq!(
            telemetry.events.unwrap(),
            vec![json!({"id": "dispatchDelay", "delayMs": 0})]
        );
    }

    #[test]
    fn test_process_snapshot_not_ready() {
        let (mut dispatch_process, receiver_to_model, commands) = create_dispatch_process();

        dispatch_process.process(DispatchInput::Snapshot(None));

        // No telemetry for the skipped snapshot
        assert!(receiver_to_model.try_recv().is_err());
        assert!(commands.lock().unwrap().is_empty());
        assert_eq!(dispatch_process.scheduler.telemetry.frames_not_ready, 1);
    }

    #[test]
    fn test_process_coalesced() {
        let (mut dispatch_process, receiver_to_model, commands) = create_dispatch_process();
        let sender = dispatch_process.get_sender_to_dispatch();

        // 0.3 + 0.102 => 60.6, 0.5 + 0.102 => 120.6
        sender
            .try_send(DispatchInput::Snapshot(Some(create_snapshot(0.3))))
            .unwrap();
        sender
            .try_send(DispatchInput::Command(json!({
                "id": "cmd_getDispatchDelay",
                "sequence_id": 1,
            })))
            .unwrap();
        sender
            .try_send(DispatchInput::Snapshot(Some(create_snapshot(0.5))))
            .unwrap();

        let input = dispatch_process._receiver_to_dispatch.recv().unwrap();
        dispatch_process.process(input);

        // Command is executed before the cycle
        let telemetry = receiver_to_model.try_recv().unwrap();

        assert_eq!(
            telemetry.command_result.unwrap(),
            json!({"id": "success", "sequence_id": 1})
        );

        // Only the newest snapshot is dispatched
        let telemetry = receiver_to_model.try_recv().unwrap();
        let telemetry_dispatch = telemetry.dispatch.unwrap();

        assert_eq!(telemetry_dispatch.frames_received, 1);
        assert_eq!(telemetry_dispatch.commands_sent, 1);
        assert_eq!(*commands.lock().unwrap(), vec!["F:0,121"]);

        assert!(receiver_to_model.try_recv().is_err());
    }

    #[test]
    fn test_run() {
        let (mut dispatch_process, receiver_to_model, commands) = create_dispatch_process();
        let stop = dispatch_process._stop.clone();

        let sender_to_dispatch = dispatch_process.get_sender_to_dispatch();

        let handle = spawn(move || {
            dispatch_process.run();
        });

        sender_to_dispatch
            .try_send(DispatchInput::Snapshot(Some(create_snapshot(0.5))))
            .unwrap();

        let telemetry = receiver_to_model
            .recv_timeout(Duration::from_millis(1000))
            .unwrap();

        assert_eq!(telemetry.dispatch.unwrap().frames_dispatched, 1);
        assert_eq!(*commands.lock().unwrap(), vec!["F:0,121"]);

        // Reset and send again after the minimum frame interval
        sender_to_dispatch
            .try_send(DispatchInput::Command(json!({
                "id": "cmd_resetDispatchState",
                "sequence_id": 2,
            })))
            .unwrap();

        let telemetry = receiver_to_model
            .recv_timeout(Duration::from_millis(1000))
            .unwrap();

        assert_eq!(
            telemetry.command_result.unwrap(),
            json!({"id": "success", "sequence_id": 2})
        );

        sleep(Duration::from_millis(TIMEOUT));

        sender_to_dispatch
            .try_send(DispatchInput::Snapshot(Some(create_snapshot(0.5))))
            .unwrap();

        let telemetry = receiver_to_model
            .recv_timeout(Duration::from_millis(1000))
            .unwrap();

        assert_eq!(telemetry.dispatch.unwrap().commands_sent, 2);
        assert_eq!(*commands.lock().unwrap(), vec!["F:0,121", "F:0,121"]);

        // Stop the process
        stop.store(true, Ordering::Relaxed);

        assert!(handle.join().is_ok());
    }
}
