pub mod event;
pub mod telemetry;
pub mod telemetry_default;
pub mod telemetry_dispatch;
