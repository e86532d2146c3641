use config::Config;
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use crate::enums::CommandStatus;

pub trait ConfigValue {
    /// Parse the value from the string in the configuration file.
    ///
    /// # Parameters
    /// * `s` - String to parse.
    ///
    /// # Returns
    /// The parsed configuration value.
    fn parse_value(s: &str) -> Self;
}

impl ConfigValue for String {
    fn parse_value(s: &str) -> Self {
        s.to_string()
    }
}

impl ConfigValue for f64 {
    fn parse_value(s: &str) -> Self {
        s.parse::<f64>()
            .unwrap_or_else(|_| panic!("{s} should parse as f64"))
    }
}

impl ConfigValue for i32 {
    fn parse_value(s: &str) -> Self {
        s.parse::<i32>()
            .unwrap_or_else(|_| panic!("{s} should parse as i32"))
    }
}

impl ConfigValue for u16 {
    fn parse_value(s: &str) -> Self {
        s.parse::<u16>()
            .unwrap_or_else(|_| panic!("{s} should parse as u16"))
    }
}

impl ConfigValue for u64 {
    fn parse_value(s: &str) -> Self {
        s.parse::<u64>()
            .unwrap_or_else(|_| panic!("{s} should parse as u64"))
    }
}

/// Get the configuation from the file.
///
/// # Parameters
/// * `filepath` - Path to the config file.
///
/// # Returns
/// The configuration.
///
/// # Panics
/// If the file does not exist or is not a valid configuration.
pub fn get_config(filepath: &Path) -> Config {
    let name = filepath
        .to_str()
        .unwrap_or_else(|| panic!("Should have the file name in the {:?}", filepath));

    Config::builder()
        .add_source(config::File::with_name(name))
        .build()
        .unwrap_or_else(|_| panic!("Should be able to read the {name}"))
}

/// Get the parameter from the file.
///
/// # Parameters
/// * `filepath` - Path to the config file.
/// * `key` - Key to find the parameter in the config file.
///
/// # Returns
/// The parameter.
pub fn get_parameter<T: ConfigValue>(filepath: &Path, key: &str) -> T {
    get_config(filepath)
        .get_string(key)
        .map(|value| T::parse_value(&value))
        .unwrap_or_else(|_| panic!("Should find the {key} in the {:?}", filepath))
}

/// Check if the message is a command.
///
/// # Arguments
/// * `name` - Name of the message.
///
/// # Returns
/// True if the message is a command, false otherwise.
pub fn is_command(name: &str) -> bool {
    name.starts_with("cmd_")
}

/// Acknowledge the command.
///
/// # Arguments
/// * `command_status` - Command status.
/// * `sequence_id` - Sequence ID.
///
/// # Returns
/// Acknowledged command.
pub fn acknowledge_command(command_status: CommandStatus, sequence_id: i64) -> Value {
    json!({"id": command_status.as_ref().to_lowercase(), "sequence_id": sequence_id})
}

/// Get the message name.
///
/// # Arguments
/// * `message` - Message that should have the "id" field.
///
/// # Returns
/// Message name. Empty if there is no name.
pub fn get_message_name(message: &Value) -> String {
    message["id"].as_str().unwrap_or_default().to_string()
}

/// Get the message sequence ID.
///
/// # Arguments
/// * `message` - Message.
///
/// # Returns
/// Message sequence ID. -1 if there is no sequence ID.
pub fn get_message_sequence_id(message: &Value) -> i64 {
    message["sequence_id"].as_i64().unwrap_or(-1)
}

/// TCP/IP client writes the message and sleep. This is for the tests.
///
/// # Arguments
/// * `client` - TCP/IP client.
/// * `message` - Message to write.
/// * `sleep_time` - Sleep time in milliseconds.
///
/// # Panics
/// If the TCP stream of the client cannot write or flush.
pub fn client_write_and_sleep(client: &mut TcpStream, message: &str, sleep_time: u64) {
    client
        .write_all(message.as_bytes())
        .expect("Tcp stream should write.");
    client.flush().expect("Tcp stream should flush.");

    sleep(Duration::from_millis(sleep_time));
}

/// TCP/IP client reads a JSON message. This is for the tests.
///
/// # Arguments
/// * `client` - TCP/IP client.
/// * `terminator` - Terminator of the message.
///
/// # Returns
/// JSON message.
///
/// # Panics
/// If the TCP stream cannot read or the message is not JSON.
pub fn client_read_json(client: &mut TcpStream, terminator: &[u8]) -> Value {
    let mut buffer = Vec::new();
    while !buffer.ends_with(terminator) {
        let mut byte = [0; 1];
        client
            .read_exact(&mut byte)
            .expect("Tcp stream of the client should read.");

        buffer.push(byte[0]);
    }

    serde_json::from_slice(&buffer[..(buffer.len() - terminator.len())])
        .expect("Should be able to convert to JSON.")
}

/// TCP/IP client reads until the JSON message with the specific name. This is
/// for the tests.
///
/// # Arguments
/// * `client` - TCP/IP client.
/// * `terminator` - Terminator of the message.
/// * `name` - Name of the message.
///
/// # Returns
/// JSON message.
pub fn client_read_specific_json(client: &mut TcpStream, terminator: &[u8], name: &str) -> Value {
    loop {
        let message = client_read_json(client, terminator);
        if get_message_name(&message) == name {
            return message;
        }
    }
}
