use serde_json::{json, Value};

use crate::enums::SkipReason;
use crate::telemetry::telemetry_default::TelemetryDefault;

#[derive(Clone, PartialEq, Debug, Default)]
pub struct TelemetryDispatch {
    // Cumulative counters of the snapshots.
    pub frames_received: u64,
    pub frames_dispatched: u64,
    pub frames_not_ready: u64,
    pub frames_rate_limited: u64,
    pub frames_degenerate: u64,
    // Cumulative counters of the servo commands.
    pub commands_sent: u64,
    pub transport_failures: u64,
    // Time of the last dispatch cycle in second.
    pub cycle_time: f64,
}

impl TelemetryDefault for TelemetryDispatch {
    fn get_messages(&self, digit: i32) -> Vec<Value> {
        vec![self.get_message_dispatch(digit)]
    }
}

impl TelemetryDispatch {
    /// Count the skipped snapshot.
    ///
    /// # Arguments
    /// * `reason` - Reason of the skip.
    pub fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::NotReady => self.frames_not_ready += 1,
            SkipReason::RateLimited => self.frames_rate_limited += 1,
            SkipReason::DegenerateGeometry => self.frames_degenerate += 1,
        }
    }

    /// Get the message of the dispatch counters.
    ///
    /// # Arguments
    /// * `digit` - The number of digits after the decimal point.
    ///
    /// # Returns
    /// The message of the dispatch counters.
    fn get_message_dispatch(&self, digit: i32) -> Value {
        json!({
            "id": "tel_dispatch",
            "framesReceived": self.frames_received,
            "framesDispatched": self.frames_dispatched,
            "framesNotReady": self.frames_not_ready,
            "framesRateLimited": self.frames_rate_limited,
            "framesDegenerate": self.frames_degenerate,
            "commandsSent": self.commands_sent,
            "transportFailures": self.transport_failures,
            "cycleTime": self.round(self.cycle_time, digit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_skip() {
        let mut telemetry = TelemetryDispatch::default();

        telemetry.record_skip(SkipReason::NotReady);
        telemetry.record_skip(SkipReason::NotReady);
        telemetry.record_skip(SkipReason::RateLimited);
        telemetry.record_skip(SkipReason::DegenerateGeometry);

        assert_eq!(telemetry.frames_not_ready, 2);
        assert_eq!(telemetry.frames_rate_limited, 1);
        assert_eq!(telemetry.frames_degenerate, 1);
    }

    #[test]
    fn test_get_messages() {
        let telemetry = TelemetryDispatch {
            frames_received: 10,
            frames_dispatched: 6,
            commands_sent: 40,
            transport_failures: 1,
            cycle_time: 0.02345,
            ..Default::default()
        };

        let messages = telemetry.get_messages(3);

        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0],
            json!({
                "id": "tel_dispatch",
                "framesReceived": 10,
                "framesDispatched": 6,
                "framesNotReady": 0,
                "framesRateLimited": 0,
                "framesDegenerate": 0,
                "commandsSent": 40,
                "transportFailures": 1,
                "cycleTime": 0.023,
            })
        );
    }
}
