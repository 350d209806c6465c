use std::{
    io::{BufRead, BufReader, Read, Write},
    str::FromStr,
    time::Duration,
};

use crate::{
    error::{Error, Result},
    protocols::Protocol,
    scpi::{self, block, Scpi},
};

pub mod afg3100;
pub mod cnt91;
pub mod fs_series;
pub mod hmp4040;
pub mod rte;
pub mod t3dso1204;

pub trait Model {
    const DESCRIPTION: &'static str;
    /// Appended to every outgoing message.
    const TERMINATOR: &'static str = "\n";
    /// Last byte of every reply.
    const END_BYTE: u8 = b'\n';
    /// Transport read timeout used when connecting.
    const TIMEOUT: Duration = Duration::from_secs(10);
    /// Largest binary block payload accepted from the instrument, in bytes.
    const MAX_BLOCK_LEN: usize = 1 << 20;
}

/// A connected transport, not yet tied to a model.
pub struct Messenger<IO: Write + Read> {
    io: IO,
}

impl<IO: Write + Read> Write for Messenger<IO> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        log::trace!("write {:?}", String::from_utf8_lossy(buf));
        self.io.write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.io.flush()
    }
}

impl<IO: Write + Read> Read for Messenger<IO> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.io.read(buf)?;
        log::trace!("read {} bytes", n);
        Ok(n)
    }
}

impl<IO: Write + Read> Messenger<IO> {
    pub fn new(io: IO) -> Self {
        Self { io }
    }
    pub fn bind<M: Model>(self, model: M) -> Instrument<IO, M> {
        Instrument {
            messenger: BufReader::new(self),
            model,
            buf: Vec::new(),
        }
    }
}

/// Opens `address` through `protocol` with the model's timeout and binds the model.
pub fn connect<P: Protocol, M: Model>(
    protocol: P,
    address: P::Address,
    model: M,
) -> Result<Instrument<P::IO, M>> {
    log::info!("connecting to {} at {}", M::DESCRIPTION, address.to_string());
    let io = protocol.connect(address, M::TIMEOUT)?;
    Ok(Messenger::new(io).bind(model))
}

/// Request/response core shared by every driver. Per-model accessors are
/// inherent impls on `Instrument<IO, Model>`.
pub struct Instrument<IO: Write + Read, M: Model> {
    messenger: BufReader<Messenger<IO>>,
    model: M,
    buf: Vec<u8>,
}

impl<IO: Write + Read, M: Model> Instrument<IO, M> {
    pub fn model(&self) -> &M {
        &self.model
    }
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }
    pub fn io(&self) -> &IO {
        &self.messenger.get_ref().io
    }
    pub fn into_inner(self) -> IO {
        self.messenger.into_inner().io
    }

    pub fn write<C: AsRef<str>>(&mut self, command: C) -> Result<()> {
        let command = command.as_ref();
        log::debug!("{} <- {}", M::DESCRIPTION, command);
        let io = self.messenger.get_mut();
        io.write_all(command.as_bytes())?;
        io.write_all(M::TERMINATOR.as_bytes())?;
        io.flush()?;
        Ok(())
    }

    pub fn read(&mut self) -> Result<String> {
        self.buf.clear();
        let n = self.messenger.read_until(M::END_BYTE, &mut self.buf)?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before a reply arrived",
            )
            .into());
        }
        let reply = String::from_utf8_lossy(&self.buf)
            .trim_end_matches(|c| c == '\n' || c == '\r')
            .to_string();
        log::debug!("{} -> {}", M::DESCRIPTION, reply);
        Ok(reply)
    }

    pub fn ask<C: AsRef<str>>(&mut self, command: C) -> Result<String> {
        self.write(&command)?;
        self.read()
    }

    /// Asks and parses the trimmed reply.
    pub fn ask_as<T: FromStr, C: AsRef<str>>(&mut self, command: C) -> Result<T> {
        let reply = self.ask(&command)?;
        reply
            .trim()
            .parse()
            .map_err(|_| Error::invalid_response(command, reply))
    }

    pub fn ask_bool<C: AsRef<str>>(&mut self, command: C) -> Result<bool> {
        let reply = self.ask(&command)?;
        scpi::parse_bool(&reply).ok_or_else(|| Error::invalid_response(command, reply))
    }

    /// Asks and parses a comma separated list of numbers; empty items are skipped.
    pub fn values<C: AsRef<str>>(&mut self, command: C) -> Result<Vec<f64>> {
        let reply = self.ask(&command)?;
        parse_values(&reply).ok_or_else(|| Error::invalid_response(command, reply))
    }

    /// First number of a list reply.
    pub fn value<C: AsRef<str>>(&mut self, command: C) -> Result<f64> {
        let reply = self.ask(&command)?;
        parse_values(&reply)
            .and_then(|v| v.first().copied())
            .ok_or_else(|| Error::invalid_response(command, reply))
    }

    /// Sends `header` directly followed by `values` as a big-endian block.
    pub fn write_binary_values<C: AsRef<str>>(&mut self, header: C, values: &[u16]) -> Result<()> {
        let header = header.as_ref();
        log::debug!(
            "{} <- {}<{} values>",
            M::DESCRIPTION,
            header,
            values.len()
        );
        let block = block::encode_u16_block(values);
        let io = self.messenger.get_mut();
        io.write_all(header.as_bytes())?;
        io.write_all(&block)?;
        io.write_all(M::TERMINATOR.as_bytes())?;
        io.flush()?;
        Ok(())
    }

    pub fn query_binary_values<C: AsRef<str>>(&mut self, command: C) -> Result<Vec<u16>> {
        self.write(command)?;
        let payload = block::read_block(&mut self.messenger, M::MAX_BLOCK_LEN)?;
        self.buf.clear();
        self.messenger.read_until(M::END_BYTE, &mut self.buf)?;
        let values = block::decode_u16_payload(payload)?;
        log::debug!("{} -> <{} values>", M::DESCRIPTION, values.len());
        Ok(values)
    }

    /// A view of this instrument that prefixes every command with `prefix`.
    pub fn scoped<S: Into<String>>(&mut self, prefix: S) -> Scoped<'_, IO, M> {
        Scoped {
            instrument: self,
            prefix: prefix.into(),
        }
    }
}

impl<IO: Write + Read, M: Model> Scpi for Instrument<IO, M> {
    fn scpi_send<C: AsRef<str>>(&mut self, command: C) -> Result<()> {
        self.write(command)
    }
    fn scpi_read(&mut self) -> Result<String> {
        self.read()
    }
}

pub(crate) fn parse_values(reply: &str) -> Option<Vec<f64>> {
    reply
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

/// Channel, marker or mode of an instrument: the parent's primitives under a
/// command prefix.
pub struct Scoped<'a, IO: Write + Read, M: Model> {
    instrument: &'a mut Instrument<IO, M>,
    prefix: String,
}

impl<'a, IO: Write + Read, M: Model> Scoped<'a, IO, M> {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
    /// The unprefixed parent.
    pub fn instrument(&mut self) -> &mut Instrument<IO, M> {
        &mut *self.instrument
    }
    /// A nested scope; `extra` is appended to this scope's prefix.
    pub fn sub(&mut self, extra: &str) -> Scoped<'_, IO, M> {
        Scoped {
            instrument: &mut *self.instrument,
            prefix: format!("{}{}", self.prefix, extra),
        }
    }
    fn full<C: AsRef<str>>(&self, command: C) -> String {
        format!("{}{}", self.prefix, command.as_ref())
    }
    pub fn write<C: AsRef<str>>(&mut self, command: C) -> Result<()> {
        let command = self.full(command);
        self.instrument.write(command)
    }
    pub fn ask<C: AsRef<str>>(&mut self, command: C) -> Result<String> {
        let command = self.full(command);
        self.instrument.ask(command)
    }
    pub fn ask_as<T: FromStr, C: AsRef<str>>(&mut self, command: C) -> Result<T> {
        let command = self.full(command);
        self.instrument.ask_as(command)
    }
    pub fn ask_bool<C: AsRef<str>>(&mut self, command: C) -> Result<bool> {
        let command = self.full(command);
        self.instrument.ask_bool(command)
    }
    pub fn values<C: AsRef<str>>(&mut self, command: C) -> Result<Vec<f64>> {
        let command = self.full(command);
        self.instrument.values(command)
    }
    pub fn value<C: AsRef<str>>(&mut self, command: C) -> Result<f64> {
        let command = self.full(command);
        self.instrument.value(command)
    }
}
