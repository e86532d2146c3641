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

use log::{debug, info, warn};
use serde_json::Value;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::sleep;
use std::time::Duration;

use crate::constants::MAX_MESSAGE_SIZE;

pub struct TcpServer {
    _name: String,
    _listener: TcpListener,
    _reader: Option<BufReader<TcpStream>>,
    _writer: Option<BufWriter<TcpStream>>,
    // Timeout in milliseconds.
    pub timeout: u64,
    // Received bytes of the message that is not terminated yet. A landmark
    // frame may arrive in several reads.
    _buffer: Vec<u8>,
    // Terminator of the message.
    _terminator: Vec<u8>,
    // Stop the server.
    _stop: Arc<AtomicBool>,
    // The server is connected or not.
    _is_connected: Arc<AtomicBool>,
}

impl TcpServer {
    /// Create a new TcpServer instance.
    ///
    /// # Arguments
    /// * `name` - Name of ther server.
    /// * `host` - Hostname or IP address.
    /// * `port` - Port number. Put 0 to let the OS choose the port number.
    /// * `timeout` - Timeout in milliseconds.
    /// * `terminator` - Terminator of the message.
    /// * `stop` - An Arc instance that holds the AtomicBool instance to stop
    /// the server.
    ///
    /// # Returns
    /// A TcpServer instance.
    ///
    /// # Errors
    /// If the listener can not bind to the address.
    pub fn new(
        name: &str,
        host: &str,
        port: u16,
        timeout: u64,
        terminator: &[u8],
        stop: &Arc<AtomicBool>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(format!("{host}:{port}"))?;
        listener.set_nonblocking(true)?;

        const DEFAULT_BUFFER_SIZE: usize = 32768;

        Ok(Self {
            _name: String::from(name),

            _listener: listener,
            _reader: None,
            _writer: None,
            timeout: timeout,

            _buffer: Vec::with_capacity(DEFAULT_BUFFER_SIZE),
            _terminator: terminator.to_vec(),

            _stop: stop.clone(),
            _is_connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get the port number.
    ///
    /// # Returns
    /// Port number. None if the listener has no local address.
    pub fn get_port(&self) -> Option<u16> {
        self._listener.local_addr().ok().map(|addr| addr.port())
    }

    /// Accept a connection.
    ///
    /// # Returns
    /// True if a new connection is accepted.
    fn accept(&mut self) -> bool {
        let stream = match self._listener.accept() {
            Ok((stream, _)) => stream,
            Err(_) => return false,
        };

        let reader = stream
            .set_nodelay(true)
            .and_then(|_| stream.set_nonblocking(true))
            .and_then(|_| stream.try_clone());
        match reader {
            Ok(reader) => {
                if let Ok(peer_addr) = stream.peer_addr() {
                    info!("{} is connected from {}.", self._name, peer_addr);
                }

                self._buffer.clear();
                self._reader = Some(BufReader::new(reader));
                self._writer = Some(BufWriter::new(stream));

                self._is_connected.store(true, Ordering::Relaxed);

                true
            }
            Err(error) => {
                warn!("{} fails to set up the connection: {error}.", self._name);

                false
            }
        }
    }

    /// The server is connected or not.
    fn is_connected(&self) -> bool {
        self._reader.is_some() && self._writer.is_some()
    }

    /// Get the reference to the connection status. This is useful to check the
    /// connection status in a separate thread.
    ///
    /// # Returns
    /// An Arc instance to check the connection status.
    pub fn get_connection_status_reference(&self) -> Arc<AtomicBool> {
        self._is_connected.clone()
    }

    /// Read a JSON message.
    ///
    /// # Returns
    /// JSON message. None if there is no complete message yet or the message
    /// is not JSON.
    pub fn read_json(&mut self) -> Option<Value> {
        let data = self.read_string()?;
        match serde_json::from_str(&data) {
            Ok(value) => Some(value),
            Err(_) => {
                info!("{} receives non-JSON message: {}.", self._name, data);

                None
            }
        }
    }

    /// Read a string message.
    ///
    /// # Returns
    /// Message without the terminator. None if there is no complete message
    /// yet, or the received bytes reach the maximum message size before the
    /// terminator.
    fn read_string(&mut self) -> Option<String> {
        let stream = self._reader.as_mut()?;

        let mut byte = [0; 1];
        loop {
            match stream.read(&mut byte) {
                Ok(0) => {
                    debug!(
                        "{} is disconnected from the client when reading.",
                        self._name
                    );
                    self.close_stream();

                    return None;
                }

                Ok(_) => {
                    self._buffer.push(byte[0]);
                    if self._buffer.ends_with(&self._terminator) {
                        break;
                    }

                    if self._buffer.len() >= MAX_MESSAGE_SIZE {
                        warn!(
                            "{} drops the message over {} bytes without the terminator.",
                            self._name, MAX_MESSAGE_SIZE
                        );
                        self._buffer.clear();

                        return None;
                    }
                }

                Err(error) if error.kind() == ErrorKind::Interrupted => {}

                Err(_) => return None,
            }
        }

        let length = self._buffer.len() - self._terminator.len();
        let message = String::from_utf8(self._buffer[..length].to_vec()).ok();
        self._buffer.clear();

        if let Some(message) = message.as_ref() {
            debug!("{} receives {} bytes.", self._name, message.len());
        }

        message
    }

    /// Write the JSON message.
    ///
    /// # Arguments
    /// * `item` - JSON message.
    pub fn write_json(&mut self, item: &Value) {
        self.write_string(&item.to_string());
        self.flush();
    }

    /// Write the JSON messages.
    ///
    /// # Arguments
    /// * `items` - JSON messages.
    pub fn write_jsons(&mut self, items: &[Value]) {
        for item in items {
            self.write_string(&item.to_string());
        }
        self.flush();
    }

    /// Write the string data to buffer with the terminator.
    ///
    /// # Arguments
    /// * `data` - Data to write.
    fn write_string(&mut self, data: &str) {
        if let Some(stream) = self._writer.as_mut() {
            // Ignore the possible error. It shows up when flushing.
            let _ = stream
                .write_all(data.as_bytes())
                .and_then(|_| stream.write_all(&self._terminator));
        }
    }

    /// Flush the stream.
    fn flush(&mut self) {
        if let Some(stream) = self._writer.as_mut() {
            if let Err(error) = stream.flush() {
                if error.kind() != ErrorKind::WouldBlock {
                    debug!(
                        "{} fails to flush the stream: {}. Disconnecting...",
                        self._name, error
                    );
                    self.close_stream();
                }
            }
        }
    }

    /// Close the stream.
    fn close_stream(&mut self) {
        info!("{} is disconnected.", self._name);

        if let Some(stream) = self._writer.as_mut() {
            let _ = stream.flush();
        }

        if let Some(stream) = self._reader.as_ref() {
            let _ = stream.get_ref().shutdown(Shutdown::Both);
        }

        self._reader = None;
        self._writer = None;
        self._buffer.clear();

        self._is_connected.store(false, Ordering::Relaxed);
    }

    /// Run the server. Only one client is served at a time.
    ///
    /// # Arguments
    /// * `callback_periodic` - A periodic callback function that is called
    /// when the server is connected.
    /// * `callback_first_time` - An optional callback function that is called
    /// once for each new connection.
    /// * `other` - Other data that is used in the callback functions.
    pub fn run<F1, F2, T>(
        &mut self,
        mut callback_periodic: F1,
        mut callback_first_time: Option<F2>,
        other: &mut T,
    ) where
        F1: FnMut(&mut TcpServer, &mut T),
        F2: FnMut(&mut TcpServer, &mut T),
    {
        info!("{} is running.", self._name);
        while !self._stop.load(Ordering::Relaxed) {
            if self.is_connected() {
                callback_periodic(self, other);
            } else if self.accept() {
                if let Some(ref mut callback) = callback_first_time {
                    callback(self, other);
                }
            } else {
                sleep(Duration::from_millis(self.timeout));
            }
        }

        info!("{} is stopped.", self._name);
    }
}
