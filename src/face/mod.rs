pub mod dispatch_process;
pub mod dispatch_scheduler;
pub mod frame_normalizer;
pub mod geometry;
pub mod landmark;
pub mod mapping;
pub mod servo_resolver;
