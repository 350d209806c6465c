//! Teledyne LeCroy T3DSO1204 oscilloscope.

use std::io::{Read, Write};

use super::{Instrument, Model};
use crate::{
    error::Result,
    protocols::{Protocol, Tcp},
    scpi::scpi_enum,
    DefaultConfig,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct T3DSO1204;

impl Model for T3DSO1204 {
    const DESCRIPTION: &'static str = "Teledyne T3DSO1204";
}

impl DefaultConfig for T3DSO1204 {
    type DefaultProtocol = Tcp;
    const DEFAULT_PROTOCOL: Tcp = Tcp;

    fn default_connect(
        address: <Self::DefaultProtocol as Protocol>::Address,
    ) -> Result<Instrument<<Self::DefaultProtocol as Protocol>::IO, Self>> {
        connect(Self::DEFAULT_PROTOCOL, address)
    }
}

scpi_enum! {
    /// How replies to queries are prefixed.
    pub enum CommHeader {
        Off => "OFF",
        Short => "SHORT",
        Long => "LONG",
    }
}

/// Connects and switches the reply header off, so replies are bare values.
pub fn connect<P: Protocol>(protocol: P, address: P::Address) -> Result<Instrument<P::IO, T3DSO1204>> {
    let mut scope = super::connect(protocol, address, T3DSO1204)?;
    scope.set_comm_header(CommHeader::Off)?;
    Ok(scope)
}

impl<IO: Read + Write> Instrument<IO, T3DSO1204> {
    pub fn comm_header(&mut self) -> Result<CommHeader> {
        Ok(self.ask("CHDR?")?.parse()?)
    }
    pub fn set_comm_header(&mut self, header: CommHeader) -> Result<()> {
        self.write(format!("CHDR {}", header))
    }
}
