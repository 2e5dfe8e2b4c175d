//! We use this mocking module in unit tests to emulate a serial port.

const BUFFER_LEN: usize = 1024;

/// Our mock type used to emulate a serial port.
pub struct MockSerial {
    /// Buffer to store data written to the mock serial port
    write_buffer: heapless::Vec<u8, BUFFER_LEN>,
    /// Buffer containing pre-configured response data to be read
    read_buffer: heapless::Vec<u8, BUFFER_LEN>,
    /// Current position in the read buffer
    read_position: usize,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
    /// Report end of stream with `Ok(0)` instead of a timeout once drained
    eof_when_empty: bool,
}

#[derive(Debug)]
pub enum MockSerialError {
    /// Nothing left to read, as a real port reports when its read timeout expires
    Timeout,
    /// Simulated buffer overflow
    BufferOverflow,
    /// Generic simulated error for testing
    SimulatedError,
}

impl core::fmt::Display for MockSerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl core::error::Error for MockSerialError {}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::Timeout => embedded_io::ErrorKind::TimedOut,
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        if self.read_position >= self.read_buffer.len() {
            if self.eof_when_empty {
                return Ok(0);
            }
            return Err(MockSerialError::Timeout);
        }

        let available_bytes = self.read_buffer.len() - self.read_position;
        let bytes_to_read = core::cmp::min(buf.len(), available_bytes);

        buf[..bytes_to_read].copy_from_slice(
            &self.read_buffer[self.read_position..self.read_position + bytes_to_read],
        );

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            should_error_on_write: false,
            should_error_on_read: false,
            eof_when_empty: false,
        }
    }

    /// Replace the data that will be returned when read() is called
    pub fn set_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer.clear();
        self.read_position = 0;
        self.read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Append one reply line, the terminator is added for you
    pub fn queue_reply(&mut self, line: &str) -> Result<(), MockSerialError> {
        self.read_buffer
            .extend_from_slice(line.as_bytes())
            .map_err(|_| MockSerialError::BufferOverflow)?;
        self.read_buffer
            .push(b'\n')
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Queue the replies of a successful connection handshake
    pub fn queue_handshake(
        &mut self,
        identity: &str,
        self_test: &str,
        limits: [&str; 4],
    ) -> Result<(), MockSerialError> {
        self.queue_reply(identity)?;
        self.queue_reply(self_test)?;
        for limit in limits {
            self.queue_reply(limit)?;
        }
        Ok(())
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Written data split into command lines, terminators removed
    pub fn written_lines(&self) -> Vec<&str> {
        core::str::from_utf8(&self.write_buffer)
            .expect("commands are ASCII")
            .lines()
            .collect()
    }

    /// Clear the write buffer
    pub fn clear_written_data(&mut self) {
        self.write_buffer.clear();
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    /// Configure whether a drained read buffer reads as end of stream
    pub fn set_eof_when_empty(&mut self, eof: bool) {
        self.eof_when_empty = eof;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, Write};

    #[test]
    fn test_write_multiple_times() {
        let mut mock = MockSerial::new();
        mock.write_all(b":DISP ON\n").unwrap();
        mock.write_all(b"*IDN?\n").unwrap();

        assert_eq!(mock.written_data(), b":DISP ON\n*IDN?\n");
        assert_eq!(mock.written_lines(), vec![":DISP ON", "*IDN?"]);
    }

    #[test]
    fn test_queued_replies_are_read_in_order() {
        let mut mock = MockSerial::new();
        mock.queue_reply("ON").unwrap();
        mock.queue_reply("12.5").unwrap();

        let mut buffer = [0u8; 16];
        let read = mock.read(&mut buffer).unwrap();
        assert_eq!(&buffer[..read], b"ON\n12.5\n");
    }

    #[test]
    fn test_read_timeout_after_data_exhausted() {
        let mut mock = MockSerial::new();
        mock.queue_reply("Hi").unwrap();

        let mut buffer = [0u8; 10];
        assert!(mock.read(&mut buffer).is_ok());

        let result = mock.read(&mut buffer);
        assert!(matches!(result, Err(MockSerialError::Timeout)));
    }

    #[test]
    fn test_read_end_of_stream_after_data_exhausted() {
        let mut mock = MockSerial::new();
        mock.queue_reply("Hi").unwrap();
        mock.set_eof_when_empty(true);

        let mut buffer = [0u8; 10];
        assert_eq!(mock.read(&mut buffer).unwrap(), 3);
        assert_eq!(mock.read(&mut buffer).unwrap(), 0);
    }

    #[test]
    fn test_write_error_simulation() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);

        let result = mock.write(b"test");
        assert!(matches!(result, Err(MockSerialError::SimulatedError)));
        assert_eq!(mock.written_data().len(), 0);
    }

    #[test]
    fn test_write_buffer_overflow() {
        let mut mock = MockSerial::new();
        let large_data = vec![0u8; BUFFER_LEN + 1];

        let result = mock.write(&large_data);
        assert!(matches!(result, Err(MockSerialError::BufferOverflow)));
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            MockSerialError::Timeout.kind(),
            embedded_io::ErrorKind::TimedOut
        ));
        assert!(matches!(
            MockSerialError::SimulatedError.kind(),
            embedded_io::ErrorKind::Other
        ));
    }

    #[test]
    fn test_clear_written_data() {
        let mut mock = MockSerial::new();
        mock.write(b"test data").unwrap();
        assert!(!mock.written_data().is_empty());

        mock.clear_written_data();
        assert!(mock.written_data().is_empty());
    }
}
