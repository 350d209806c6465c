//! SCPI drivers for laboratory instruments: frequency counters, power
//! supplies, oscilloscopes, spectrum analyzers and function generators.
//!
//! A driver is a [`Model`] bound to a connected transport. Reading a setting
//! sends a query and parses the reply, writing one formats and sends a
//! command. Channels, markers and modes borrow their instrument and prefix
//! its commands.
//!
//! ```no_run
//! use rustrument::{instruments::hmp4040::HMP4040, DefaultConfig};
//!
//! let mut psu = HMP4040::default_connect("/dev/ttyUSB0".to_string())?;
//! psu.select_channel(1)?;
//! psu.set_voltage(5.0)?;
//! psu.turn_output_on()?;
//! # Ok::<(), rustrument::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod instruments;
pub mod mock;
pub mod protocols;
pub mod scpi;
pub mod validators;

pub use error::{Error, Result};
pub use instruments::{Instrument, Messenger, Model};
pub use protocols::{Protocol, Serial, Tcp};
pub use scpi::Scpi;

/// The transport an instrument ships configured for.
pub trait DefaultConfig: Model + Default {
    type DefaultProtocol: Protocol;
    const DEFAULT_PROTOCOL: Self::DefaultProtocol;

    fn default_connect(
        address: <Self::DefaultProtocol as Protocol>::Address,
    ) -> Result<Instrument<<Self::DefaultProtocol as Protocol>::IO, Self>> {
        instruments::connect(Self::DEFAULT_PROTOCOL, address, Self::default())
    }
}
