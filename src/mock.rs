//! In-memory transport for exercising drivers without hardware.
//!
//! ```
//! use rustrument::{instruments::Messenger, mock::MockIO};
//! use rustrument::instruments::hmp4040::HMP4040;
//!
//! let mut psu = Messenger::new(MockIO::new().with_reply("12.000")).bind(HMP4040);
//! assert_eq!(psu.voltage().unwrap(), 12.0);
//! assert_eq!(psu.io().written(), vec!["VOLT?"]);
//! ```

use std::io::{Cursor, Read, Write};

/// Replays scripted replies and records everything written. Reading past the
/// end of the script fails with `TimedOut`, like an instrument that never answers.
#[derive(Debug, Default)]
pub struct MockIO {
    input: Cursor<Vec<u8>>,
    output: Vec<u8>,
}

impl MockIO {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `reply` followed by a newline.
    pub fn with_reply<S: AsRef<str>>(self, reply: S) -> Self {
        let mut line = reply.as_ref().as_bytes().to_vec();
        line.push(b'\n');
        self.with_raw(&line)
    }

    /// Queues `bytes` verbatim.
    pub fn with_raw(mut self, bytes: &[u8]) -> Self {
        self.input.get_mut().extend_from_slice(bytes);
        self
    }

    pub fn written_bytes(&self) -> &[u8] {
        &self.output
    }

    /// Written messages, split at newlines.
    pub fn written(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.output)
            .split_terminator('\n')
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect()
    }

    /// Number of scripted bytes not consumed yet.
    pub fn unread(&self) -> usize {
        self.input.get_ref().len() - self.input.position() as usize
    }
}

impl Read for MockIO {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.unread() == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "no scripted reply left",
            ));
        }
        self.input.read(buf)
    }
}

impl Write for MockIO {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
