pub mod command_dispatch;
pub mod command_schema;
