//! Connection descriptions read from TOML.
//!
//! ```toml
//! transport = "serial"
//! address = "/dev/ttyUSB0"
//! baud_rate = 9600
//! timeout_ms = 2000
//! ```

use std::{
    io::{Read, Write},
    net::{SocketAddr, TcpStream},
    path::Path,
    time::Duration,
};

use serde::Deserialize;
use serial::SystemPort;

use crate::{
    error::Result,
    instruments::{Instrument, Messenger, Model},
    protocols::{protocol_error::ProtocolError, Protocol, Serial, Tcp},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Tcp,
    Serial,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    pub transport: Transport,
    /// `host:port` for TCP, the port name for serial links.
    pub address: String,
    /// Serial links only; 9600 if unset.
    #[serde(default)]
    pub baud_rate: Option<usize>,
    /// Overrides the model's read timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl ConnectionConfig {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Opens the described link.
    pub fn open(&self, default_timeout: Duration) -> Result<Link> {
        let timeout = self.timeout().unwrap_or(default_timeout);
        match self.transport {
            Transport::Tcp => {
                let address: SocketAddr = self
                    .address
                    .parse()
                    .map_err(|_| ProtocolError::InvalidAddress(self.address.clone()))?;
                Ok(Link::Tcp(Tcp.connect(address, timeout)?))
            }
            Transport::Serial => {
                let serial = match self.baud_rate {
                    Some(baud_rate) => Serial::default().with_baud_rate(baud_rate),
                    None => Serial::default(),
                };
                Ok(Link::Serial(serial.connect(self.address.clone(), timeout)?))
            }
        }
    }

    pub fn connect<M: Model>(&self, model: M) -> Result<Instrument<Link, M>> {
        log::info!("connecting to {} at {}", M::DESCRIPTION, self.address);
        Ok(Messenger::new(self.open(M::TIMEOUT)?).bind(model))
    }
}

/// Either kind of transport, chosen at run time.
pub enum Link {
    Tcp(TcpStream),
    Serial(SystemPort),
}

impl Read for Link {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Link::Tcp(io) => io.read(buf),
            Link::Serial(io) => io.read(buf),
        }
    }
}

impl Write for Link {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Link::Tcp(io) => io.write(buf),
            Link::Serial(io) => io.write(buf),
        }
    }
    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Link::Tcp(io) => io.flush(),
            Link::Serial(io) => io.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn tcp_config() {
        let config = ConnectionConfig::parse(
            r#"
            transport = "tcp"
            address = "192.168.1.20:5025"
            timeout_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.transport, Transport::Tcp);
        assert_eq!(config.address, "192.168.1.20:5025");
        assert_eq!(config.baud_rate, None);
        assert_eq!(config.timeout(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn serial_config() {
        let config = ConnectionConfig::parse(
            "transport = \"serial\"\naddress = \"/dev/ttyUSB0\"\nbaud_rate = 115200\n",
        )
        .unwrap();
        assert_eq!(config.transport, Transport::Serial);
        assert_eq!(config.baud_rate, Some(115200));
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn bad_configs_are_rejected() {
        for text in [
            "transport = \"gpib\"\naddress = \"GPIB0::1\"",
            "address = \"10.0.0.1:5025\"",
            "transport = \"tcp\"\naddress = \"10.0.0.1:5025\"\nport = 5025",
        ] {
            assert!(matches!(ConnectionConfig::parse(text), Err(Error::ConfigError(_))));
        }
    }

    #[test]
    fn malformed_tcp_address_fails_before_connecting() {
        let config = ConnectionConfig::parse("transport = \"tcp\"\naddress = \"not an address\"").unwrap();
        assert!(matches!(
            config.open(Duration::from_millis(10)),
            Err(Error::ProtocolError(ProtocolError::InvalidAddress(_)))
        ));
    }
}
