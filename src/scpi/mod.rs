use std::fmt::Display;

use crate::error::{Error, Result};

pub mod block;
pub mod com_cmd;
pub mod scpi_error;

/// IEEE 488.2 common commands and status registers, on top of a raw send/read pair.
pub trait Scpi {
    fn scpi_send<C: AsRef<str>>(&mut self, command: C) -> Result<()>;
    fn scpi_read(&mut self) -> Result<String>;
    fn scpi_ask<C: AsRef<str>>(&mut self, command: C) -> Result<String> {
        self.scpi_send(command)?;
        self.scpi_read()
    }

    fn identify(&mut self) -> Result<Identity> {
        let command = com_cmd::IDN.to_command().query();
        let reply = self.scpi_ask(&command)?;
        Identity::parse(&reply).ok_or_else(|| Error::invalid_response(command, reply))
    }
    fn reset(&mut self) -> Result<()> {
        self.scpi_send(com_cmd::RST)
    }
    fn clear(&mut self) -> Result<()> {
        self.scpi_send(com_cmd::CLS)
    }
    fn wait(&mut self) -> Result<()> {
        self.scpi_send(com_cmd::WAI)
    }
    fn set_operation_complete(&mut self) -> Result<()> {
        self.scpi_send(com_cmd::OPC)
    }
    fn operation_complete(&mut self) -> Result<bool> {
        Ok(self.scpi_ask(com_cmd::OPC.to_command().query())?.trim() == "1")
    }
    fn self_test(&mut self) -> Result<i32> {
        let command = com_cmd::TST.to_command().query();
        let reply = self.scpi_ask(&command)?;
        reply
            .trim()
            .parse()
            .map_err(|_| Error::invalid_response(command, reply))
    }
    fn get_event_byte(&mut self) -> Result<EventStatusByte> {
        let command = com_cmd::ESR.to_command().query();
        let reply = self.scpi_ask(&command)?;
        parse_register(&reply)
            .map(EventStatusByte::new)
            .ok_or_else(|| Error::invalid_response(command, reply))
    }
    fn get_status_byte(&mut self) -> Result<StatusByte> {
        let command = com_cmd::STB.to_command().query();
        let reply = self.scpi_ask(&command)?;
        parse_register(&reply)
            .map(StatusByte::new)
            .ok_or_else(|| Error::invalid_response(command, reply))
    }
    fn set_event_mask(&mut self, byte: EventStatusByte) -> Result<()> {
        self.scpi_send(com_cmd::ESE.to_command().para(byte.to_string()))
    }
    fn set_service_mask(&mut self, byte: StatusByte) -> Result<()> {
        self.scpi_send(com_cmd::SRE.to_command().para(byte.to_string()))
    }
    /// Reads (and thereby clears) the event status register, failing on any error bit.
    fn check_errors(&mut self) -> Result<()> {
        let byte = self.get_event_byte()?;
        match scpi_error::ScpiError::from_event_byte(&byte) {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

// Registers are sent as decimal text; some instruments answer "+0".
fn parse_register(reply: &str) -> Option<u8> {
    let reply = reply.trim();
    reply.strip_prefix('+').unwrap_or(reply).parse().ok()
}

/// Fields of an `*IDN?` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub firmware: String,
}

impl Identity {
    pub fn parse(reply: &str) -> Option<Self> {
        let mut fields = reply.trim().splitn(4, ',').map(|f| f.trim().to_string());
        Some(Self {
            manufacturer: fields.next()?,
            model: fields.next()?,
            serial_number: fields.next()?,
            firmware: fields.next()?,
        })
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} (s/n {}, fw {})",
            self.manufacturer, self.model, self.serial_number, self.firmware
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command(String);

impl Command {
    pub fn new<S: ToString>(s: S) -> Self {
        Self(s.to_string())
    }
    pub fn query(mut self) -> Self {
        self.0.push('?');
        self
    }
    pub fn para<P: AsRef<str>>(mut self, para: P) -> Self {
        self.0.push(' ');
        self.0.push_str(para.as_ref());
        self
    }
    /// Appends further parameters separated by `,`.
    pub fn and<P: AsRef<str>>(mut self, para: P) -> Self {
        self.0.push(',');
        self.0.push_str(para.as_ref());
        self
    }
    pub fn into_inner(self) -> String {
        self.0
    }
}
impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait ToCommand {
    fn to_command(&self) -> Command;
}
impl<T> ToCommand for T
where
    T: ToString + ?Sized,
{
    fn to_command(&self) -> Command {
        Command(self.to_string())
    }
}

/// Joins several program messages into one line.
pub fn join<I, S>(commands: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    commands
        .into_iter()
        .map(|c| c.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// A numeric setting that also accepts the `MIN`/`MAX` keywords.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Level {
    Value(f64),
    Min,
    Max,
}

impl From<f64> for Level {
    fn from(v: f64) -> Self {
        Level::Value(v)
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Value(v) => write!(f, "{}", v),
            Level::Min => f.write_str("MIN"),
            Level::Max => f.write_str("MAX"),
        }
    }
}

/// A numeric setting that can be handed back to the instrument's automatic coupling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberOrAuto {
    Number(f64),
    Auto,
}

impl From<f64> for NumberOrAuto {
    fn from(v: f64) -> Self {
        NumberOrAuto::Number(v)
    }
}

impl NumberOrAuto {
    /// `<header>:AUTO ON` or `<header> <value>`.
    pub fn command(&self, header: &str) -> Command {
        match self {
            NumberOrAuto::Number(v) => header.to_command().para(v.to_string()),
            NumberOrAuto::Auto => format!("{}:AUTO", header).to_command().para("ON"),
        }
    }
}

pub fn bool_token(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

pub fn parse_bool(reply: &str) -> Option<bool> {
    match reply.trim().to_ascii_uppercase().as_str() {
        "1" | "ON" => Some(true),
        "0" | "OFF" => Some(false),
        _ => None,
    }
}

/// Splits a list reply into its items, dropping quotes and empty entries.
pub fn split_list(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(|s| s.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Defines a closed set of SCPI keywords with their wire spelling.
macro_rules! scpi_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn token(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.token())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::validators::ValidationError;
            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.token().eq_ignore_ascii_case(s))
                    .ok_or_else(|| $crate::validators::ValidationError::NotInSet {
                        value: s.to_string(),
                        allowed: Self::ALL.iter().map(|v| v.token().to_string()).collect(),
                    })
            }
        }
    };
}
pub(crate) use scpi_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusByte(u8);
impl StatusByte {
    pub fn new(b: u8) -> Self {
        Self(b)
    }
    pub fn byte(&self) -> u8 {
        self.0
    }
    pub fn is_error_queue_not_empty(&self) -> bool {
        self.0 & (1 << 2) != 0
    }
    pub fn error_queue_not_empty(mut self) -> Self {
        self.0 |= 1 << 2;
        self
    }
    pub fn is_message_available(&self) -> bool {
        self.0 & (1 << 4) != 0
    }
    pub fn message_available(mut self) -> Self {
        self.0 |= 1 << 4;
        self
    }
    pub fn is_event_happened(&self) -> bool {
        self.0 & (1 << 5) != 0
    }
    pub fn event_happened(mut self) -> Self {
        self.0 |= 1 << 5;
        self
    }
    pub fn is_requesting_service(&self) -> bool {
        self.0 & (1 << 6) != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventStatusByte(u8);
impl EventStatusByte {
    pub fn new(b: u8) -> Self {
        Self(b)
    }
    pub fn byte(&self) -> u8 {
        self.0
    }
    pub fn is_command_err(&self) -> bool {
        self.0 & (1 << 5) != 0
    }
    pub fn command_err(mut self) -> Self {
        self.0 |= 1 << 5;
        self
    }
    pub fn is_execution_err(&self) -> bool {
        self.0 & (1 << 4) != 0
    }
    pub fn execution_err(mut self) -> Self {
        self.0 |= 1 << 4;
        self
    }
    pub fn is_device_dep_err(&self) -> bool {
        self.0 & (1 << 3) != 0
    }
    pub fn device_dep_err(mut self) -> Self {
        self.0 |= 1 << 3;
        self
    }
    pub fn is_query_err(&self) -> bool {
        self.0 & (1 << 2) != 0
    }
    pub fn query_err(mut self) -> Self {
        self.0 |= 1 << 2;
        self
    }
    pub fn is_opera_complete(&self) -> bool {
        self.0 & 1 != 0
    }
    pub fn opera_complete(mut self) -> Self {
        self.0 |= 1;
        self
    }
}
impl Display for StatusByte {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl Display for EventStatusByte {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    scpi_enum! {
        enum Coupling {
            Ac => "AC",
            Dc => "DC",
        }
    }

    #[test]
    fn command_builder() {
        assert_eq!(Command::new("VOLT").query().para("MIN").into_inner(), "VOLT? MIN");
        assert_eq!(Command::new("APPL").para("1").and(" 2").into_inner(), "APPL 1, 2");
        assert_eq!(com_cmd::OPC.to_command().query().to_string(), "*OPC?");
    }

    #[test]
    fn number_or_auto_commands() {
        assert_eq!(NumberOrAuto::Auto.command("BAND:RES").into_inner(), "BAND:RES:AUTO ON");
        assert_eq!(NumberOrAuto::from(1000.0).command("BAND:RES").into_inner(), "BAND:RES 1000");
    }

    #[test]
    fn list_replies_are_unquoted() {
        assert_eq!(
            split_list("'SAN','Spectrum', 'PNO','Phase Noise',"),
            vec!["SAN", "Spectrum", "PNO", "Phase Noise"]
        );
    }

    #[test]
    fn keywords_parse_case_insensitively() {
        assert_eq!("ac".parse::<Coupling>().unwrap(), Coupling::Ac);
        assert_eq!(Coupling::Dc.to_string(), "DC");
        assert!("GND".parse::<Coupling>().is_err());
        assert_eq!(parse_bool(" ON"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn identity_fields() {
        let id = Identity::parse("Rohde&Schwarz,HMP4040,103781,HW50020001/SW2.51\n").unwrap();
        assert_eq!(id.manufacturer, "Rohde&Schwarz");
        assert_eq!(id.model, "HMP4040");
        assert_eq!(id.firmware, "HW50020001/SW2.51");
        assert!(Identity::parse("garbage").is_none());
    }

    #[test]
    fn event_status_bits() {
        let byte = EventStatusByte::new(0).query_err().opera_complete();
        assert_eq!(byte.byte(), 0b101);
        assert!(byte.is_query_err());
        assert!(!byte.is_command_err());
        assert_eq!(
            scpi_error::ScpiError::from_event_byte(&byte),
            Some(scpi_error::ScpiError::QueryError)
        );
        assert_eq!(scpi_error::ScpiError::from_event_byte(&EventStatusByte::new(1)), None);
        assert_eq!(parse_register("+32"), Some(32));
    }
}
