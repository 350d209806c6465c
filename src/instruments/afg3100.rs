//! Tektronix AFG3000 series arbitrary function generators.
//!
//! All models share one command set and differ in the highest output
//! frequency, see [`Afg3100Series::MAX_FREQUENCY`].
//!
//! ```
//! use rustrument::{instruments::Messenger, mock::MockIO};
//! use rustrument::instruments::afg3100::{AmplitudeUnit, AFG3102};
//!
//! let mut afg = Messenger::new(MockIO::new()).bind(AFG3102);
//! let mut ch1 = afg.channel(1).unwrap();
//! ch1.set_frequency(1e3).unwrap();
//! ch1.set_amplitude(0.5, Some(AmplitudeUnit::Vpp)).unwrap();
//! ch1.enable().unwrap();
//! assert_eq!(
//!     afg.io().written(),
//!     vec!["SOUR1:FREQ:FIX 1.000000E3", "SOUR1:VOLT:AMPL 0.5VPP", "OUTP1:STAT ON"]
//! );
//! ```

use std::{
    fmt::Display,
    io::{Read, Write},
    str::FromStr,
};

use super::{Instrument, Model, Scoped};
use crate::{
    error::Result,
    protocols::Tcp,
    scpi::{self, scpi_enum, Command, Level},
    validators::{self, ValidationError},
    DefaultConfig,
};

pub const CHANNELS: [u8; 2] = [1, 2];
pub const USER_SLOTS: [u8; 4] = [1, 2, 3, 4];
/// Vertical resolution of the edit memory, 14 bit.
pub const SHAPE_RESOLUTION: u16 = 16383;
pub const SHAPE_LENGTH: (usize, usize) = (2, 131_072);
pub const MIN_FREQUENCY: f64 = 1e-6;
pub const MAX_BURST_CYCLES: u32 = 1_000_000;
/// Amplitudes are truncated onto this grid, in the selected unit.
pub const AMPLITUDE_STEP: f64 = 1e-4;
/// What the instrument reports for an infinite burst count.
const INFINITY_THRESHOLD: f64 = 9.9e37;

pub trait Afg3100Series: Model {
    const MAX_FREQUENCY: f64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AFG3102;

impl Model for AFG3102 {
    const DESCRIPTION: &'static str = "Tektronix AFG3102";
    const MAX_BLOCK_LEN: usize = 2 * SHAPE_LENGTH.1;
}

impl Afg3100Series for AFG3102 {
    const MAX_FREQUENCY: f64 = 100e6;
}

impl DefaultConfig for AFG3102 {
    type DefaultProtocol = Tcp;
    const DEFAULT_PROTOCOL: Tcp = Tcp;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AFG3152C;

impl Model for AFG3152C {
    const DESCRIPTION: &'static str = "Tektronix AFG3152C";
    const MAX_BLOCK_LEN: usize = 2 * SHAPE_LENGTH.1;
}

impl Afg3100Series for AFG3152C {
    const MAX_FREQUENCY: f64 = 150e6;
}

impl DefaultConfig for AFG3152C {
    type DefaultProtocol = Tcp;
    const DEFAULT_PROTOCOL: Tcp = Tcp;
}

scpi_enum! {
    pub enum TriggerSource {
        Timer => "TIM",
        External => "EXT",
    }
}

scpi_enum! {
    pub enum AmplitudeUnit {
        Vpp => "VPP",
        Vrms => "VRMS",
        Dbm => "DBM",
    }
}

impl AmplitudeUnit {
    /// Settable amplitude range in this unit.
    pub fn range(&self) -> (f64, f64) {
        match self {
            AmplitudeUnit::Vpp => (20e-3, 10.0),
            AmplitudeUnit::Vrms => (7.1e-3, 3.536),
            AmplitudeUnit::Dbm => (-30.0, 23.98),
        }
    }
}

scpi_enum! {
    pub enum BurstKind {
        Triggered => "TRIG",
        Gated => "GAT",
    }
}

scpi_enum! {
    pub enum SweepKind {
        Auto => "AUTO",
        Manual => "MAN",
    }
}

scpi_enum! {
    pub enum Spacing {
        Linear => "LIN",
        Logarithmic => "LOG",
    }
}

/// Output function of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Sine,
    Square,
    Pulse,
    Ramp,
    Noise,
    Dc,
    Sinc,
    Gaussian,
    Lorentz,
    ExponentialRise,
    ExponentialDecay,
    Haversine,
    /// One of the user memory slots 1 to 4.
    User(u8),
    EditMemory,
}

impl Shape {
    const BUILT_IN: [Shape; 12] = [
        Shape::Sine,
        Shape::Square,
        Shape::Pulse,
        Shape::Ramp,
        Shape::Noise,
        Shape::Dc,
        Shape::Sinc,
        Shape::Gaussian,
        Shape::Lorentz,
        Shape::ExponentialRise,
        Shape::ExponentialDecay,
        Shape::Haversine,
    ];
}

impl Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = match self {
            Shape::Sine => "SIN",
            Shape::Square => "SQU",
            Shape::Pulse => "PULS",
            Shape::Ramp => "RAMP",
            Shape::Noise => "PRN",
            Shape::Dc => "DC",
            Shape::Sinc => "SINC",
            Shape::Gaussian => "GAUS",
            Shape::Lorentz => "LOR",
            Shape::ExponentialRise => "ERIS",
            Shape::ExponentialDecay => "EDEC",
            Shape::Haversine => "HAV",
            Shape::User(n) => return write!(f, "USER{}", n),
            Shape::EditMemory => "EMEM",
        };
        f.write_str(token)
    }
}

impl FromStr for Shape {
    type Err = ValidationError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().to_ascii_uppercase();
        if s == "EMEM" {
            return Ok(Shape::EditMemory);
        }
        if let Some(slot) = s.strip_prefix("USER").and_then(|n| n.parse::<u8>().ok()) {
            return Ok(Shape::User(validators::strict_discrete_set(slot, &USER_SLOTS)?));
        }
        Shape::BUILT_IN
            .iter()
            .copied()
            .find(|shape| shape.to_string() == s)
            .ok_or_else(|| ValidationError::NotInSet {
                value: s.clone(),
                allowed: Shape::BUILT_IN
                    .iter()
                    .map(ToString::to_string)
                    .chain(USER_SLOTS.iter().map(|n| format!("USER{}", n)))
                    .chain(std::iter::once("EMEM".to_string()))
                    .collect(),
            })
    }
}

/// Burst count: a number of cycles, endless, or one of the limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycles {
    Count(u32),
    Infinite,
    Min,
    Max,
}

impl Display for Cycles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cycles::Count(n) => write!(f, "{}", n),
            Cycles::Infinite => f.write_str("INF"),
            Cycles::Min => f.write_str("MIN"),
            Cycles::Max => f.write_str("MAX"),
        }
    }
}

/// Number of points of the edit memory shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Points {
    Count(usize),
    Min,
    Max,
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Points::Count(n) => write!(f, "{}", n),
            Points::Min => f.write_str("MIN"),
            Points::Max => f.write_str("MAX"),
        }
    }
}

/// Everything needed to put a waveform on a channel. Without an amplitude
/// the current one is kept; without a unit the channel's unit is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waveform {
    pub shape: Shape,
    pub frequency: f64,
    pub amplitude: Option<f64>,
    pub unit: Option<AmplitudeUnit>,
    pub offset: f64,
}

impl Default for Waveform {
    fn default() -> Self {
        Self {
            shape: Shape::Sine,
            frequency: 1e6,
            amplitude: None,
            unit: None,
            offset: 0.0,
        }
    }
}

impl<IO: Read + Write, M: Afg3100Series> Instrument<IO, M> {
    pub fn beep(&mut self) -> Result<()> {
        self.write("SYST:BEEP")
    }

    pub fn force_trigger(&mut self) -> Result<()> {
        self.write("TRIG")
    }

    pub fn trigger_source(&mut self) -> Result<TriggerSource> {
        Ok(self.ask("TRIG:SOUR?")?.parse()?)
    }
    pub fn set_trigger_source(&mut self, source: TriggerSource) -> Result<()> {
        self.write(format!("TRIG:SOUR {}", source))
    }

    /// Names of the user memories and the edit memory.
    pub fn waveform_catalog(&mut self) -> Result<Vec<String>> {
        Ok(scpi::split_list(&self.ask("DATA:CAT?")?))
    }

    pub fn channel(&mut self, number: u8) -> Result<Channel<'_, IO, M>> {
        let number = validators::strict_discrete_set(number, &CHANNELS)?;
        Ok(Channel {
            scope: self.scoped(format!("SOUR{}:", number)),
            number,
        })
    }

    pub fn edit_memory(&mut self) -> EditMemory<'_, IO, M> {
        EditMemory {
            scope: self.scoped(""),
        }
    }
}

/// One output, commands under `SOUR<n>:`.
pub struct Channel<'a, IO: Read + Write, M: Afg3100Series> {
    scope: Scoped<'a, IO, M>,
    number: u8,
}

impl<'a, IO: Read + Write, M: Afg3100Series> Channel<'a, IO, M> {
    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn enable(&mut self) -> Result<()> {
        let command = format!("OUTP{}:STAT ON", self.number);
        self.scope.instrument().write(command)
    }
    pub fn disable(&mut self) -> Result<()> {
        let command = format!("OUTP{}:STAT OFF", self.number);
        self.scope.instrument().write(command)
    }

    pub fn shape(&mut self) -> Result<Shape> {
        Ok(self.scope.ask("FUNC:SHAP?")?.parse()?)
    }
    pub fn set_shape(&mut self, shape: Shape) -> Result<()> {
        if let Shape::User(slot) = shape {
            validators::strict_discrete_set(slot, &USER_SLOTS)?;
        }
        self.scope.write(format!("FUNC:SHAP {}", shape))
    }

    pub fn unit(&mut self) -> Result<AmplitudeUnit> {
        Ok(self.scope.ask("VOLT:UNIT?")?.parse()?)
    }
    pub fn set_unit(&mut self, unit: AmplitudeUnit) -> Result<()> {
        self.scope.write(format!("VOLT:UNIT {}", unit))
    }

    /// Amplitude in the channel's current unit.
    pub fn amplitude(&mut self) -> Result<f64> {
        self.scope.value("VOLT:AMPL?")
    }
    /// Sets the amplitude in `unit`, or in the channel's current unit if none
    /// is given. The value is truncated onto the unit's range and resolution.
    pub fn set_amplitude(&mut self, amplitude: f64, unit: Option<AmplitudeUnit>) -> Result<()> {
        let unit = match unit {
            Some(unit) => unit,
            None => self.unit()?,
        };
        let (min, max) = unit.range();
        let amplitude = validators::truncated_step(amplitude, min, max, AMPLITUDE_STEP);
        self.scope.write(format!("VOLT:AMPL {}{}", amplitude, unit))
    }

    /// Offset in V.
    pub fn offset(&mut self) -> Result<f64> {
        self.scope.value("VOLT:OFFS?")
    }
    pub fn set_offset(&mut self, volts: f64) -> Result<()> {
        self.scope.write(format!("VOLT:OFFS {:e}", volts))
    }

    pub fn frequency(&mut self) -> Result<f64> {
        self.scope.value("FREQ:FIX?")
    }
    pub fn set_frequency(&mut self, hz: f64) -> Result<()> {
        let hz = validators::strict_range(hz, MIN_FREQUENCY, M::MAX_FREQUENCY)?;
        self.scope.write(format!("FREQ:FIX {:.6E}", hz))
    }

    /// Load impedance in ohm.
    pub fn impedance(&mut self) -> Result<u32> {
        let command = format!("OUTP{}:IMP?", self.number);
        Ok(self.scope.instrument().value(command)?.round() as u32)
    }
    pub fn set_impedance(&mut self, ohms: u32) -> Result<()> {
        let ohms = validators::strict_range(ohms, 1, 10_000)?;
        let command = format!("OUTP{}:IMP {}", self.number, ohms);
        self.scope.instrument().write(command)
    }

    /// Shape, frequency, amplitude and offset in one go.
    pub fn waveform(&mut self, waveform: Waveform) -> Result<()> {
        self.set_shape(waveform.shape)?;
        self.set_frequency(waveform.frequency)?;
        if let Some(amplitude) = waveform.amplitude {
            self.set_amplitude(amplitude, waveform.unit)?;
        }
        self.set_offset(waveform.offset)
    }

    pub fn burst_mode(&mut self) -> BurstMode<'_, IO, M> {
        BurstMode {
            scope: self.scope.sub("BURS:"),
        }
    }

    pub fn pulse_mode(&mut self) -> PulseMode<'_, IO, M> {
        PulseMode {
            scope: self.scope.sub("PULS:"),
        }
    }

    pub fn sweep_mode(&mut self) -> SweepMode<'_, IO, M> {
        SweepMode {
            scope: self.scope.sub(""),
        }
    }
}

pub struct BurstMode<'a, IO: Read + Write, M: Afg3100Series> {
    scope: Scoped<'a, IO, M>,
}

impl<'a, IO: Read + Write, M: Afg3100Series> BurstMode<'a, IO, M> {
    pub fn enabled(&mut self) -> Result<bool> {
        self.scope.ask_bool("STAT?")
    }
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.scope.write(format!("STAT {}", scpi::bool_token(enabled)))
    }

    pub fn mode(&mut self) -> Result<BurstKind> {
        Ok(self.scope.ask("MODE?")?.parse()?)
    }
    pub fn set_mode(&mut self, mode: BurstKind) -> Result<()> {
        self.scope.write(format!("MODE {}", mode))
    }

    pub fn n_cycles(&mut self) -> Result<Cycles> {
        let n = self.scope.value("NCYC?")?;
        if n >= INFINITY_THRESHOLD {
            Ok(Cycles::Infinite)
        } else {
            Ok(Cycles::Count(n.round() as u32))
        }
    }
    pub fn set_n_cycles(&mut self, cycles: Cycles) -> Result<()> {
        if let Cycles::Count(n) = cycles {
            validators::strict_range(n, 1, MAX_BURST_CYCLES)?;
        }
        self.scope.write(format!("NCYC {}", cycles))
    }
}

pub struct PulseMode<'a, IO: Read + Write, M: Afg3100Series> {
    scope: Scoped<'a, IO, M>,
}

impl<'a, IO: Read + Write, M: Afg3100Series> PulseMode<'a, IO, M> {
    /// Duty cycle in %.
    pub fn duty_cycle(&mut self) -> Result<f64> {
        self.scope.value("DCYC?")
    }
    pub fn set_duty_cycle(&mut self, percent: f64) -> Result<()> {
        let percent = validators::strict_range(percent, 0.001, 99.999)?;
        self.scope.write(format!("DCYC {:.3}", percent))
    }
}

/// Frequency sweep. Ranges depend on the selected shape; the instrument
/// rejects what it cannot do.
pub struct SweepMode<'a, IO: Read + Write, M: Afg3100Series> {
    scope: Scoped<'a, IO, M>,
}

impl<'a, IO: Read + Write, M: Afg3100Series> SweepMode<'a, IO, M> {
    pub fn mode(&mut self) -> Result<SweepKind> {
        Ok(self.scope.ask("SWE:MODE?")?.parse()?)
    }
    pub fn set_mode(&mut self, mode: SweepKind) -> Result<()> {
        self.scope.write(format!("SWE:MODE {}", mode))
    }

    pub fn frequency_center(&mut self) -> Result<f64> {
        self.scope.value("FREQ:CENT?")
    }
    pub fn set_frequency_center<L: Into<Level>>(&mut self, hz: L) -> Result<()> {
        self.scope.write(format!("FREQ:CENT {}", hz.into()))
    }
    pub fn frequency_span(&mut self) -> Result<f64> {
        self.scope.value("FREQ:SPAN?")
    }
    pub fn set_frequency_span<L: Into<Level>>(&mut self, hz: L) -> Result<()> {
        self.scope.write(format!("FREQ:SPAN {}", hz.into()))
    }
    pub fn frequency_start(&mut self) -> Result<f64> {
        self.scope.value("FREQ:STAR?")
    }
    pub fn set_frequency_start<L: Into<Level>>(&mut self, hz: L) -> Result<()> {
        self.scope.write(format!("FREQ:STAR {}", hz.into()))
    }
    pub fn frequency_stop(&mut self) -> Result<f64> {
        self.scope.value("FREQ:STOP?")
    }
    pub fn set_frequency_stop<L: Into<Level>>(&mut self, hz: L) -> Result<()> {
        self.scope.write(format!("FREQ:STOP {}", hz.into()))
    }

    /// Time the frequency stays at the stop frequency, in s.
    pub fn hold_time(&mut self) -> Result<f64> {
        self.scope.value("SWE:HTIM?")
    }
    pub fn set_hold_time<L: Into<Level>>(&mut self, seconds: L) -> Result<()> {
        self.scope.write(format!("SWE:HTIM {}", seconds.into()))
    }
    pub fn min_hold_time(&mut self) -> Result<f64> {
        self.scope.value("SWE:HTIM? MIN")
    }
    pub fn max_hold_time(&mut self) -> Result<f64> {
        self.scope.value("SWE:HTIM? MAX")
    }

    /// Time from the stop back to the start frequency, hold time excluded.
    pub fn return_time(&mut self) -> Result<f64> {
        self.scope.value("SWE:RTIM?")
    }
    pub fn set_return_time<L: Into<Level>>(&mut self, seconds: L) -> Result<()> {
        self.scope.write(format!("SWE:RTIM {}", seconds.into()))
    }
    pub fn min_return_time(&mut self) -> Result<f64> {
        self.scope.value("SWE:RTIM? MIN")
    }
    pub fn max_return_time(&mut self) -> Result<f64> {
        self.scope.value("SWE:RTIM? MAX")
    }

    pub fn spacing(&mut self) -> Result<Spacing> {
        Ok(self.scope.ask("SWE:SPAC?")?.parse()?)
    }
    pub fn set_spacing(&mut self, spacing: Spacing) -> Result<()> {
        self.scope.write(format!("SWE:SPAC {}", spacing))
    }

    /// Sweep duration in s (1 ms to 300 s), hold and return time excluded.
    pub fn time(&mut self) -> Result<f64> {
        self.scope.value("SWE:TIME?")
    }
    pub fn set_time<L: Into<Level>>(&mut self, seconds: L) -> Result<()> {
        let seconds = seconds.into();
        if let Level::Value(v) = seconds {
            validators::strict_range(v, 1e-3, 300.0)?;
        }
        self.scope.write(format!("SWE:TIME {}", seconds))
    }
}

/// The editable waveform memory.
pub struct EditMemory<'a, IO: Read + Write, M: Afg3100Series> {
    scope: Scoped<'a, IO, M>,
}

impl<'a, IO: Read + Write, M: Afg3100Series> EditMemory<'a, IO, M> {
    pub fn shape_length(&mut self) -> Result<usize> {
        Ok(self.scope.value("DATA:POIN? EMEM")?.round() as usize)
    }
    pub fn set_shape_length(&mut self, points: Points) -> Result<()> {
        if let Points::Count(n) = points {
            validators::strict_range(n, SHAPE_LENGTH.0, SHAPE_LENGTH.1)?;
        }
        self.scope.write(format!("DATA:POIN EMEM, {}", points))
    }
    pub fn min_shape_length(&mut self) -> Result<usize> {
        Ok(self.scope.value("DATA:POIN? EMEM, MIN")?.round() as usize)
    }
    pub fn max_shape_length(&mut self) -> Result<usize> {
        Ok(self.scope.value("DATA:POIN? EMEM, MAX")?.round() as usize)
    }

    pub fn shape(&mut self) -> Result<Vec<u16>> {
        self.scope.instrument().query_binary_values("DATA:DATA? EMEM")
    }
    /// Uploads `shape`; points range from 0 to [`SHAPE_RESOLUTION`].
    pub fn set_shape(&mut self, shape: &[u16]) -> Result<()> {
        validators::strict_range(shape.len(), SHAPE_LENGTH.0, SHAPE_LENGTH.1)?;
        for point in shape {
            validators::strict_range(*point, 0, SHAPE_RESOLUTION)?;
        }
        self.scope
            .instrument()
            .write_binary_values("DATA:DATA EMEM,", shape)
    }

    /// Copies user memory `slot` into the edit memory.
    pub fn load_shape(&mut self, slot: u8) -> Result<()> {
        let slot = validators::strict_discrete_set(slot, &USER_SLOTS)?;
        self.scope
            .write(Command::new("DATA:COPY").para("EMEM").and(format!("USER{}", slot)))
    }
    /// Copies the edit memory into user memory `slot`.
    pub fn save_shape(&mut self, slot: u8) -> Result<()> {
        let slot = validators::strict_discrete_set(slot, &USER_SLOTS)?;
        self.scope
            .write(Command::new("DATA:COPY").para(format!("USER{}", slot)).and("EMEM"))
    }
}

/// Scales `shape` onto the full vertical resolution, minimum to 0 and maximum
/// to [`SHAPE_RESOLUTION`]. A flat shape maps to all zeros.
pub fn normalize_shape(shape: &[f64]) -> Vec<u16> {
    let min = shape.iter().copied().fold(f64::INFINITY, f64::min);
    let max = shape.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if !(span.is_finite() && span > 0.0) {
        return vec![0; shape.len()];
    }
    shape
        .iter()
        .map(|v| ((v - min) / span * SHAPE_RESOLUTION as f64) as u16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{instruments::Messenger, mock::MockIO};

    fn afg(io: MockIO) -> Instrument<MockIO, AFG3102> {
        Messenger::new(io).bind(AFG3102)
    }

    #[test]
    fn instrument_commands() {
        let mut afg = afg(MockIO::new().with_reply("EXT").with_reply("\"USER1\",\"EMEM\""));
        afg.beep().unwrap();
        afg.force_trigger().unwrap();
        assert_eq!(afg.trigger_source().unwrap(), TriggerSource::External);
        afg.set_trigger_source(TriggerSource::Timer).unwrap();
        assert_eq!(afg.waveform_catalog().unwrap(), vec!["USER1", "EMEM"]);
        assert_eq!(
            afg.io().written(),
            vec!["SYST:BEEP", "TRIG", "TRIG:SOUR?", "TRIG:SOUR TIM", "DATA:CAT?"]
        );
    }

    #[test]
    fn amplitude_is_truncated_in_its_unit() {
        let mut afg = afg(MockIO::new().with_reply("VPP"));
        {
            let mut ch = afg.channel(2).unwrap();
            ch.set_amplitude(0.001, None).unwrap();
            ch.set_amplitude(-40.0, Some(AmplitudeUnit::Dbm)).unwrap();
            ch.set_amplitude(12.0, Some(AmplitudeUnit::Vpp)).unwrap();
        }
        assert_eq!(
            afg.io().written(),
            vec![
                "SOUR2:VOLT:UNIT?",
                "SOUR2:VOLT:AMPL 0.02VPP",
                "SOUR2:VOLT:AMPL -30DBM",
                "SOUR2:VOLT:AMPL 10VPP",
            ]
        );
    }

    #[test]
    fn frequency_limit_depends_on_model() {
        let mut afg3102 = afg(MockIO::new());
        assert!(afg3102.channel(1).unwrap().set_frequency(120e6).is_err());
        assert!(afg3102.io().written().is_empty());

        let mut afg3152 = Messenger::new(MockIO::new()).bind(AFG3152C);
        afg3152.channel(1).unwrap().set_frequency(120e6).unwrap();
        assert_eq!(afg3152.io().written(), vec!["SOUR1:FREQ:FIX 1.200000E8"]);
        assert!(afg3152.channel(3).is_err());
    }

    #[test]
    fn output_and_impedance_use_the_output_subsystem() {
        let mut afg = afg(MockIO::new().with_reply("5.0000E+01"));
        {
            let mut ch = afg.channel(2).unwrap();
            ch.enable().unwrap();
            ch.disable().unwrap();
            assert_eq!(ch.impedance().unwrap(), 50);
            ch.set_impedance(10_000).unwrap();
            assert!(ch.set_impedance(0).is_err());
        }
        assert_eq!(
            afg.io().written(),
            vec!["OUTP2:STAT ON", "OUTP2:STAT OFF", "OUTP2:IMP?", "OUTP2:IMP 10000"]
        );
    }

    #[test]
    fn shapes() {
        assert_eq!("sin".parse::<Shape>().unwrap(), Shape::Sine);
        assert_eq!("USER3".parse::<Shape>().unwrap(), Shape::User(3));
        assert_eq!("EMEM".parse::<Shape>().unwrap(), Shape::EditMemory);
        assert!("USER5".parse::<Shape>().is_err());
        assert!("TRI".parse::<Shape>().is_err());

        let mut afg = afg(MockIO::new().with_reply("GAUS"));
        {
            let mut ch = afg.channel(1).unwrap();
            assert_eq!(ch.shape().unwrap(), Shape::Gaussian);
            ch.set_shape(Shape::User(2)).unwrap();
            assert!(ch.set_shape(Shape::User(7)).is_err());
        }
        assert_eq!(afg.io().written(), vec!["SOUR1:FUNC:SHAP?", "SOUR1:FUNC:SHAP USER2"]);
    }

    #[test]
    fn waveform_setup() {
        let mut afg = afg(MockIO::new());
        afg.channel(1)
            .unwrap()
            .waveform(Waveform {
                shape: Shape::Square,
                frequency: 2e3,
                amplitude: Some(1.0),
                unit: Some(AmplitudeUnit::Vrms),
                offset: 0.5,
            })
            .unwrap();
        assert_eq!(
            afg.io().written(),
            vec![
                "SOUR1:FUNC:SHAP SQU",
                "SOUR1:FREQ:FIX 2.000000E3",
                "SOUR1:VOLT:AMPL 1VRMS",
                "SOUR1:VOLT:OFFS 5e-1",
            ]
        );
    }

    #[test]
    fn burst_mode() {
        let mut afg = afg(MockIO::new().with_reply("1").with_reply("9.9E+37").with_reply("5"));
        {
            let mut ch = afg.channel(1).unwrap();
            let mut burst = ch.burst_mode();
            assert!(burst.enabled().unwrap());
            burst.set_mode(BurstKind::Gated).unwrap();
            assert_eq!(burst.n_cycles().unwrap(), Cycles::Infinite);
            assert_eq!(burst.n_cycles().unwrap(), Cycles::Count(5));
            burst.set_n_cycles(Cycles::Infinite).unwrap();
            burst.set_n_cycles(Cycles::Count(100)).unwrap();
            assert!(burst.set_n_cycles(Cycles::Count(0)).is_err());
        }
        assert_eq!(
            afg.io().written(),
            vec![
                "SOUR1:BURS:STAT?",
                "SOUR1:BURS:MODE GAT",
                "SOUR1:BURS:NCYC?",
                "SOUR1:BURS:NCYC?",
                "SOUR1:BURS:NCYC INF",
                "SOUR1:BURS:NCYC 100",
            ]
        );
    }

    #[test]
    fn pulse_and_sweep_modes() {
        let mut afg = afg(MockIO::new().with_reply("LOG").with_reply("1.0E-3"));
        {
            let mut ch = afg.channel(2).unwrap();
            ch.pulse_mode().set_duty_cycle(25.0).unwrap();
            assert!(ch.pulse_mode().set_duty_cycle(100.0).is_err());
            let mut sweep = ch.sweep_mode();
            sweep.set_mode(SweepKind::Manual).unwrap();
            sweep.set_frequency_start(1e3).unwrap();
            sweep.set_frequency_stop(Level::Max).unwrap();
            assert_eq!(sweep.spacing().unwrap(), Spacing::Logarithmic);
            assert_eq!(sweep.min_hold_time().unwrap(), 1e-3);
            sweep.set_time(0.5).unwrap();
            assert!(sweep.set_time(400.0).is_err());
        }
        assert_eq!(
            afg.io().written(),
            vec![
                "SOUR2:PULS:DCYC 25.000",
                "SOUR2:SWE:MODE MAN",
                "SOUR2:FREQ:STAR 1000",
                "SOUR2:FREQ:STOP MAX",
                "SOUR2:SWE:SPAC?",
                "SOUR2:SWE:HTIM? MIN",
                "SOUR2:SWE:TIME 0.5",
            ]
        );
    }

    #[test]
    fn edit_memory_transfers_blocks() {
        let mut afg = afg(MockIO::new().with_reply("1000").with_raw(b"#16\x00\x00\x20\x00\x3f\xff\n"));
        {
            let mut mem = afg.edit_memory();
            assert_eq!(mem.shape_length().unwrap(), 1000);
            mem.set_shape_length(Points::Max).unwrap();
            assert!(mem.set_shape_length(Points::Count(1)).is_err());
            assert_eq!(mem.shape().unwrap(), vec![0, 0x2000, 0x3fff]);
            mem.load_shape(2).unwrap();
            mem.save_shape(4).unwrap();
            assert!(mem.save_shape(5).is_err());
            assert!(mem.set_shape(&[0]).is_err());
            assert!(mem.set_shape(&[0, 20000]).is_err());
        }
        assert_eq!(
            afg.io().written(),
            vec![
                "DATA:POIN? EMEM",
                "DATA:POIN EMEM, MAX",
                "DATA:DATA? EMEM",
                "DATA:COPY EMEM,USER2",
                "DATA:COPY USER4,EMEM",
            ]
        );
    }

    #[test]
    fn shape_upload_is_a_binary_block() {
        let mut afg = afg(MockIO::new());
        afg.edit_memory().set_shape(&[0, SHAPE_RESOLUTION]).unwrap();
        assert_eq!(afg.io().written_bytes(), &b"DATA:DATA EMEM,#14\x00\x00\x3f\xff\n"[..]);
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_shape(&[-1.0, 0.0, 1.0]), vec![0, 8191, 16383]);
        assert_eq!(normalize_shape(&[2.0, 2.0]), vec![0, 0]);
        assert!(normalize_shape(&[]).is_empty());
    }
}
