// Face landmarks from the vision pipeline. A snapshot with fewer points is
// not ready yet.
pub const NUM_LANDMARK: usize = 478;

// Minimum time between two accepted frames in milliseconds.
pub const MIN_FRAME_INTERVAL_MS: u64 = 15;

// Default waiting time after each servo command in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 1;
// Upper bound of the waiting time after each servo command in milliseconds.
pub const MAX_DELAY_MS: u64 = 1000;

// Linear correction of the normalized delta against the head roll:
// corrected = delta - slope * roll + intercept
pub const ROLL_CORRECTION_SLOPE: f64 = 0.001;
pub const ROLL_CORRECTION_INTERCEPT: f64 = 0.102;

pub const LOCAL_HOST: &str = "127.0.0.1";
pub const ALL_HOST: &str = "0.0.0.0";
pub const TERMINATOR: &[u8; 2] = b"\r\n";
// Maximum size of a message from the TCP/IP client in bytes.
pub const MAX_MESSAGE_SIZE: usize = 65536;
pub const TERMINATOR_SERIAL: &[u8; 1] = b"\n";

pub const BOUND_SYNC_CHANNEL: usize = 100;
