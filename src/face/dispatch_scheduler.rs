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

use log::{debug, trace, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::mem;
use std::thread::sleep;
use std::time::{Duration, Instant};

use crate::constants::MIN_FRAME_INTERVAL_MS;
use crate::enums::SkipReason;
use crate::face::frame_normalizer::FrameNormalizer;
use crate::face::landmark::LandmarkSnapshot;
use crate::face::mapping::{MappingTable, ServoChannel};
use crate::face::servo_resolver::ServoResolver;
use crate::interface::serial_transport::CommandTransport;
use crate::telemetry::telemetry_dispatch::TelemetryDispatch;

pub struct DispatchScheduler {
    // Servo mapping table.
    _mapping_table: MappingTable,
    // Servo resolver.
    _resolver: ServoResolver,
    // Last sent angle of each channel. The absent channel is unset.
    _last_angles: HashMap<ServoChannel, i32>,
    // Time of the last accepted frame.
    _last_dispatch: Option<Instant>,
    // Minimum time between two accepted frames.
    _min_frame_interval: Duration,
    // Waiting time after each sent command in milliseconds.
    _delay_ms: u64,
    // Events to publish.
    _events: Vec<Value>,
    // Telemetry data.
    pub telemetry: TelemetryDispatch,
}

impl DispatchScheduler {
    /// Create a new dispatch scheduler.
    ///
    /// # Arguments
    /// * `mapping_table` - Servo mapping table.
    /// * `delay_ms` - Waiting time after each sent command in milliseconds.
    ///
    /// # Returns
    /// A new dispatch scheduler.
    pub fn new(mapping_table: MappingTable, delay_ms: u64) -> Self {
        Self {
            _mapping_table: mapping_table,
            _resolver: ServoResolver::default(),

            _last_angles: HashMap::new(),
            _last_dispatch: None,

            _min_frame_interval: Duration::from_millis(MIN_FRAME_INTERVAL_MS),
            _delay_ms: delay_ms,

            _events: Vec::new(),
            telemetry: TelemetryDispatch::default(),
        }
    }

    /// Get the mapping table.
    pub fn get_mapping_table(&self) -> &MappingTable {
        &self._mapping_table
    }

    /// Replace the mapping table as a whole. The history of the channels that
    /// are not in the new table is dropped, so a channel added back later
    /// starts from unset.
    ///
    /// # Arguments
    /// * `mapping_table` - New servo mapping table.
    pub fn replace_mapping_table(&mut self, mapping_table: MappingTable) {
        self._last_angles
            .retain(|channel, _| mapping_table.has_channel(channel));

        self._mapping_table = mapping_table;
    }

    /// Get the waiting time after each sent command.
    ///
    /// # Returns
    /// Delay in milliseconds.
    pub fn get_delay(&self) -> u64 {
        self._delay_ms
    }

    /// Set the waiting time after each sent command.
    ///
    /// # Arguments
    /// * `delay_ms` - Delay in milliseconds. Put 0 to send the commands
    /// back-to-back.
    pub fn set_delay(&mut self, delay_ms: u64) {
        self._delay_ms = delay_ms;
    }

    /// Get the minimum time between two accepted frames.
    pub fn get_min_frame_interval(&self) -> Duration {
        self._min_frame_interval
    }

    /// Set the minimum time between two accepted frames.
    ///
    /// # Arguments
    /// * `interval` - Minimum frame interval.
    pub fn set_min_frame_interval(&mut self, interval: Duration) {
        self._min_frame_interval = interval;
    }

    /// Get the last sent angle of the channel.
    ///
    /// # Arguments
    /// * `channel` - Servo channel.
    ///
    /// # Returns
    /// Angle in degree. None if nothing was sent to the channel yet.
    pub fn get_last_angle(&self, channel: &ServoChannel) -> Option<i32> {
        self._last_angles.get(channel).copied()
    }

    /// Forget the last sent angles and the last frame time. The next accepted
    /// frame sends the commands to all the channels.
    pub fn reset(&mut self) {
        self._last_angles.clear();
        self._last_dispatch = None;
    }

    /// Add an event to publish.
    pub fn add_event(&mut self, event: Value) {
        self._events.push(event);
    }

    /// Take the events to publish.
    ///
    /// # Returns
    /// Events in the order they were added. None if there is no event.
    pub fn take_events(&mut self) -> Option<Vec<Value>> {
        if self._events.is_empty() {
            return None;
        }

        Some(mem::take(&mut self._events))
    }

    /// Process the landmark snapshot now.
    ///
    /// # Arguments
    /// * `snapshot` - Landmark snapshot. None if there is no face.
    /// * `transport` - Transport of the servo commands.
    ///
    /// # Returns
    /// Number of the sent commands.
    ///
    /// # Errors
    /// The reason that the whole snapshot is skipped.
    pub fn process_snapshot(
        &mut self,
        snapshot: Option<&LandmarkSnapshot>,
        transport: &mut dyn CommandTransport,
    ) -> Result<usize, SkipReason> {
        self.process_snapshot_at(snapshot, Instant::now(), transport)
    }

    /// Process the landmark snapshot at the specific time.
    ///
    /// # Notes
    /// The mappings are resolved in the table order. A command is sent only
    /// when the angle differs from the last sent one of the same channel, and
    /// the scheduler waits for the delay after each sent command.
    ///
    /// # Arguments
    /// * `snapshot` - Landmark snapshot. None if there is no face.
    /// * `now` - Time of the frame.
    /// * `transport` - Transport of the servo commands.
    ///
    /// # Returns
    /// Number of the sent commands.
    ///
    /// # Errors
    /// The reason that the whole snapshot is skipped.
    pub fn process_snapshot_at(
        &mut self,
        snapshot: Option<&LandmarkSnapshot>,
        now: Instant,
        transport: &mut dyn CommandTransport,
    ) -> Result<usize, SkipReason> {
        self.telemetry.frames_received += 1;

        let result = self.dispatch(snapshot, now, transport);
        match result {
            Ok(_) => self.telemetry.frames_dispatched += 1,
            Err(reason) => {
                trace!("Skip the snapshot: {}.", reason.as_ref());
                self.telemetry.record_skip(reason);
            }
        }

        result
    }

    fn dispatch(
        &mut self,
        snapshot: Option<&LandmarkSnapshot>,
        now: Instant,
        transport: &mut dyn CommandTransport,
    ) -> Result<usize, SkipReason> {
        let snapshot = snapshot.ok_or(SkipReason::NotReady)?;
        let frame = FrameNormalizer::new(snapshot)?;

        if let Some(last_dispatch) = self._last_dispatch {
            if now.saturating_duration_since(last_dispatch) < self._min_frame_interval {
                return Err(SkipReason::RateLimited);
            }
        }
        self._last_dispatch = Some(now);

        let mut num_command = 0;
        for mapping in self._mapping_table.mappings() {
            let angle = match self._resolver.resolve(mapping, snapshot, &frame) {
                Some(angle) => angle,
                None => {
                    trace!("Missing landmark of the servo {}.", mapping.channel);
                    continue;
                }
            };

            if self._last_angles.get(&mapping.channel) == Some(&angle) {
                continue;
            }

            let command = mapping.channel.command(angle);
            match transport.send_command(&command) {
                Ok(()) => {
                    debug!("Send the servo command: {command}.");

                    self._last_angles.insert(mapping.channel, angle);
                    self.telemetry.commands_sent += 1;
                    num_command += 1;

                    if self._delay_ms > 0 {
                        sleep(Duration::from_millis(self._delay_ms));
                    }
                }
                Err(error) => {
                    warn!("{error}");

                    self.telemetry.transport_failures += 1;
                }
            }
        }

        Ok(num_command)
    }
}
