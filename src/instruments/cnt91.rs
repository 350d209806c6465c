//! Pendulum CNT-91 frequency counter.
//!
//! Frequency time series are taken with the counter's internal buffer: the
//! measurement is armed, polled until `*OPC?` reports completion, and the
//! buffer is then fetched in batches of at most [`CNT91::batch_size`] values.

use std::{
    io::{Read, Write},
    str::FromStr,
    thread,
    time::Duration,
};

use super::{Instrument, Model};
use crate::{
    error::{Error, Result},
    protocols::Tcp,
    scpi::{self, Scpi},
    validators::{self, ValidationError},
    DefaultConfig,
};

/// Largest number of samples a single time series may request.
pub const MAX_N_SAMPLES: usize = 100_000;
/// Interval between two `*OPC?` polls while a measurement runs.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
pub struct CNT91 {
    batch_size: Option<usize>,
}

impl Model for CNT91 {
    const DESCRIPTION: &'static str = "Pendulum CNT-91";
    // long acquisitions block the reply to *OPC? and :FETC:ARR?
    const TIMEOUT: Duration = Duration::from_secs(120);
}

impl DefaultConfig for CNT91 {
    type DefaultProtocol = Tcp;
    const DEFAULT_PROTOCOL: Tcp = Tcp;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A,
    B,
    C,
    Rear,
    IntRef,
}

impl Channel {
    pub const ALL: [Channel; 5] = [Channel::A, Channel::B, Channel::C, Channel::Rear, Channel::IntRef];

    pub fn number(&self) -> u8 {
        match self {
            Channel::A => 1,
            Channel::B => 2,
            Channel::C => 3,
            Channel::Rear => 4,
            Channel::IntRef => 6,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Channel::A => "A",
            Channel::B => "B",
            Channel::C => "C",
            Channel::Rear => "REAR",
            Channel::IntRef => "INTREF",
        }
    }
}

impl FromStr for Channel {
    type Err = ValidationError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotInSet {
                value: s.to_string(),
                allowed: Channel::ALL.iter().map(|c| c.name().to_string()).collect(),
            })
    }
}

/// Inputs that can arm a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    A,
    B,
    Rear,
}

impl TriggerSource {
    pub const ALL: [TriggerSource; 3] = [TriggerSource::A, TriggerSource::B, TriggerSource::Rear];

    pub fn token(&self) -> &'static str {
        match self {
            TriggerSource::A => "EXT1",
            TriggerSource::B => "EXT2",
            TriggerSource::Rear => "EXT4",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TriggerSource::A => "A",
            TriggerSource::B => "B",
            TriggerSource::Rear => "REAR",
        }
    }
}

impl FromStr for TriggerSource {
    type Err = ValidationError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        TriggerSource::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotInSet {
                value: s.to_string(),
                allowed: TriggerSource::ALL.iter().map(|t| t.name().to_string()).collect(),
            })
    }
}

impl<IO: Read + Write> Instrument<IO, CNT91> {
    /// How many buffer entries one `:FETC:ARR? MAX` returns at most. Queried once
    /// and cached.
    pub fn batch_size(&mut self) -> Result<usize> {
        if let Some(n) = self.model().batch_size {
            return Ok(n);
        }
        let command = "FORM:SMAX?";
        let n: usize = self.ask_as(command)?;
        if n == 0 {
            return Err(Error::invalid_response(command, "0"));
        }
        self.model_mut().batch_size = Some(n);
        Ok(n)
    }

    /// Reads out the entire measurement buffer.
    pub fn read_buffer(&mut self) -> Result<Vec<f64>> {
        let batch_size = self.batch_size()?;
        let mut data = Vec::new();
        loop {
            let batch = self.values(":FETC:ARR? MAX")?;
            let n = batch.len();
            data.extend(batch);
            if n < batch_size {
                break;
            }
        }
        log::debug!("read {} values from the buffer", data.len());
        Ok(data)
    }

    /// Records `n_samples` frequency readings of `channel` at `sample_rate` (Hz)
    /// and returns them. With a trigger source the acquisition starts on its
    /// rising edge, otherwise immediately.
    pub fn time_series(
        &mut self,
        channel: Channel,
        n_samples: usize,
        sample_rate: f64,
        trigger_source: Option<TriggerSource>,
    ) -> Result<Vec<f64>> {
        let n_samples = validators::strict_range(n_samples, 1, MAX_N_SAMPLES)?;
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ValidationError::Invalid(format!(
                "sample rate must be positive, got {}",
                sample_rate
            ))
            .into());
        }
        let measurement_time = 1.0 / sample_rate;

        self.clear()?;
        self.write(scpi::join([
            "FORM ASC".to_string(),
            format!(":CONF:ARR:FREQ {},(@{})", n_samples, channel.number()),
            ":INIT:CONT OFF".to_string(),
            format!(":ACQ:APER {}", measurement_time),
        ]))?;
        if let Some(source) = trigger_source {
            self.write(scpi::join([format!("ARM:SOUR {}", source.token()).as_str(), "ARM:SLOP POS"]))?;
        }
        self.write(":INIT")?;
        self.wait_and_return()
    }

    /// Blocks until the running measurement completes, then reads the buffer.
    pub fn wait_and_return(&mut self) -> Result<Vec<f64>> {
        while !self.operation_complete()? {
            thread::sleep(POLL_INTERVAL);
        }
        self.read_buffer()
    }
}
