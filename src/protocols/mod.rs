use std::time::Duration;

pub mod protocol_error;
pub mod serial;
pub mod tcp;

pub use self::serial::Serial;
pub use self::tcp::Tcp;
use protocol_error::ProtocolError;

/// A way of reaching an instrument: turns an address into a blocking byte stream.
pub trait Protocol {
    type Address: ToString;
    type IO: std::io::Read + std::io::Write;
    fn connect(self, address: Self::Address, time_out: Duration) -> Result<Self::IO, ProtocolError>;
}
