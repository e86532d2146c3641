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

use log::info;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::constants::TERMINATOR_SERIAL;
use crate::error::TransportError;

pub trait CommandTransport {
    /// Send the servo command. Nothing is read back from the receiver.
    ///
    /// # Arguments
    /// * `command` - Command in the format of "<prefix>:<pin>,<angle>".
    ///
    /// # Errors
    /// If the command can not be delivered to the link.
    fn send_command(&mut self, command: &str) -> Result<(), TransportError>;
}

pub struct SerialTransport<W: Write> {
    // Writer of the serial link.
    _writer: W,
}

impl SerialTransport<File> {
    /// Open the serial device. The line settings (baud rate, etc.) are
    /// configured outside of this application.
    ///
    /// # Arguments
    /// * `path` - Path of the serial device.
    ///
    /// # Returns
    /// Serial transport of the device.
    ///
    /// # Errors
    /// If the device can not be opened to write.
    pub fn open(path: &Path) -> Result<Self, TransportError> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|error| TransportError::Open {
                path: path.display().to_string(),
                source: error,
            })?;

        info!("Serial device {} is opened.", path.display());

        Ok(Self::new(file))
    }
}

impl<W: Write> SerialTransport<W> {
    /// Create a new serial transport.
    ///
    /// # Arguments
    /// * `writer` - Writer of the serial link.
    ///
    /// # Returns
    /// A new serial transport.
    pub fn new(writer: W) -> Self {
        Self { _writer: writer }
    }

    /// Get the writer.
    pub fn get_ref(&self) -> &W {
        &self._writer
    }
}

impl<W: Write> CommandTransport for SerialTransport<W> {
    fn send_command(&mut self, command: &str) -> Result<(), TransportError> {
        let mut line = Vec::with_capacity(command.len() + TERMINATOR_SERIAL.len());
        line.extend_from_slice(command.as_bytes());
        line.extend_from_slice(TERMINATOR_SERIAL);

        self._writer
            .write_all(&line)
            .and_then(|_| self._writer.flush())
            .map_err(|error| TransportError::Write {
                command: command.to_string(),
                source: error,
            })
    }
}
