use serde_json::Value;

use crate::telemetry::telemetry_dispatch::TelemetryDispatch;

pub struct Telemetry {
    // Telemetry of the dispatch scheduler.
    pub dispatch: Option<TelemetryDispatch>,
    // Command execution result.
    pub command_result: Option<Value>,
    // Events to publish.
    pub events: Option<Vec<Value>>,
}

impl Telemetry {
    /// Create a new telemetry object.
    ///
    /// # Arguments
    /// * `dispatch` - Telemetry of the dispatch scheduler.
    /// * `command_result` - Command execution result.
    /// * `events` - Events to publish.
    ///
    /// # Returns
    /// A new telemetry object.
    pub fn new(
        dispatch: Option<TelemetryDispatch>,
        command_result: Option<Value>,
        events: Option<Vec<Value>>,
    ) -> Self {
        Self {
            dispatch,
            command_result,
            events,
        }
    }
}
