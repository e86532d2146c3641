pub mod serial_transport;
pub mod tcp_server;
pub mod vision_server;
