//! Rohde & Schwarz RTE oscilloscope.

use std::io::{Read, Write};

use super::{Instrument, Model, Scoped};
use crate::{
    error::{Error, Result},
    protocols::Tcp,
    scpi::{self, scpi_enum},
    validators, DefaultConfig,
};

pub const CHANNELS: [u8; 4] = [1, 2, 3, 4];

#[derive(Debug, Default, Clone, Copy)]
pub struct RTE;

impl Model for RTE {
    const DESCRIPTION: &'static str = "Rohde&Schwarz RTE";
}

impl DefaultConfig for RTE {
    type DefaultProtocol = Tcp;
    const DEFAULT_PROTOCOL: Tcp = Tcp;
}

scpi_enum! {
    /// Encoding of transferred data.
    pub enum DataFormat {
        Ascii => "ASCII",
        Real32 => "REAL,32",
        Int8 => "INT,8",
        Int16 => "INT,16",
    }
}

impl<IO: Read + Write> Instrument<IO, RTE> {
    /// The reply names the type and length separately, e.g. `ASC,0` or `INT,8`.
    pub fn data_format(&mut self) -> Result<DataFormat> {
        let command = "FORMat:DATA?";
        let reply = self.ask(command)?;
        let items = scpi::split_list(&reply);
        let format = match items
            .iter()
            .map(|s| s.to_ascii_uppercase())
            .collect::<Vec<_>>()
            .as_slice()
        {
            [kind, ..] if kind.starts_with("ASC") => Some(DataFormat::Ascii),
            [kind, len, ..] if kind.starts_with("REAL") && len == "32" => Some(DataFormat::Real32),
            [kind, len, ..] if kind.starts_with("INT") && len == "8" => Some(DataFormat::Int8),
            [kind, len, ..] if kind.starts_with("INT") && len == "16" => Some(DataFormat::Int16),
            _ => None,
        };
        format.ok_or_else(|| Error::invalid_response(command, reply))
    }
    pub fn set_data_format(&mut self, format: DataFormat) -> Result<()> {
        self.write(format!("FORMat:DATA {}", format))
    }

    /// Time per horizontal division in s.
    pub fn time_scale(&mut self) -> Result<f64> {
        self.ask_as("TIMebase:SCALe?")
    }
    pub fn set_time_scale(&mut self, seconds: f64) -> Result<()> {
        self.write(format!("TIMebase:SCALe {}", seconds))
    }

    pub fn time_divisions(&mut self) -> Result<f64> {
        self.ask_as("TIMebase:DIVisions?")
    }

    /// Reference point position in % of the screen.
    pub fn time_reference(&mut self) -> Result<f64> {
        self.ask_as("TIMebase:REFerence?")
    }
    pub fn set_time_reference(&mut self, percent: f64) -> Result<()> {
        let percent = validators::truncated_range(percent, 1.0, 100.0);
        self.write(format!("TIMebase:REFerence {}", percent))
    }

    pub fn channel(&mut self, number: u8) -> Result<Channel<'_, IO>> {
        let number = validators::strict_discrete_set(number, &CHANNELS)?;
        Ok(Channel {
            scope: self.scoped(format!("CHANnel{}:", number)),
            number,
        })
    }
}

/// Analog input channel, commands under `CHANnel<n>:`.
pub struct Channel<'a, IO: Read + Write> {
    scope: Scoped<'a, IO, RTE>,
    number: u8,
}

impl<'a, IO: Read + Write> Channel<'a, IO> {
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Waveform points of this channel, optionally starting at `offset` and
    /// limited to `length` points. Only ASCII transfers are supported.
    pub fn get_waveform(&mut self, offset: Option<usize>, length: Option<usize>) -> Result<Vec<f64>> {
        let format = self.scope.instrument().data_format()?;
        if format != DataFormat::Ascii {
            return Err(Error::Unsupported(format!(
                "waveform transfer in {} format, switch to ASCII first",
                format
            )));
        }
        let mut query = "DATA?".to_string();
        if let Some(offset) = offset {
            query.push_str(&format!(" {}", offset));
        }
        if let Some(length) = length {
            query.push_str(&format!(" {}", length));
        }
        self.scope.values(query)
    }
}
