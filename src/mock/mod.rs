pub mod mock_transport;
pub mod mock_vision;
