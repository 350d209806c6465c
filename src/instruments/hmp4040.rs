//! Rohde & Schwarz HMP4040 four channel power supply.
//!
//! Voltage, current and output settings act on the selected channel; pick it
//! with [`Instrument::select_channel`] first.

use std::io::{Read, Write};

use super::{Instrument, Model};
use crate::{
    error::{Error, Result},
    protocols::Serial,
    scpi::{self, scpi_enum},
    validators::{self, ValidationError},
    DefaultConfig,
};

pub const CHANNELS: [u8; 4] = [1, 2, 3, 4];
pub const SEQUENCE_SLOTS: [u8; 3] = [1, 2, 3];
pub const MAX_VOLTAGE_STEP: f64 = 32.050;
pub const MAX_REPETITIONS: u32 = 255;
/// Dwell time limits of one sequence point, in seconds.
pub const DWELL_TIME_RANGE: (f64, f64) = (0.06, 10.0);

#[derive(Debug, Default, Clone, Copy)]
pub struct HMP4040;

impl Model for HMP4040 {
    const DESCRIPTION: &'static str = "Rohde&Schwarz HMP4040";
}

impl DefaultConfig for HMP4040 {
    type DefaultProtocol = Serial;
    const DEFAULT_PROTOCOL: Serial = Serial {
        baud_rate: serial::Baud9600,
        data_bits: serial::Bits8,
        parity: serial::ParityNone,
        stop_bits: serial::Stop1,
        flow_control: serial::FlowNone,
    };
}

scpi_enum! {
    /// Who may operate the front panel.
    pub enum Control {
        Local => "LOC",
        Remote => "REM",
        Mixed => "MIX",
        RemoteWithLock => "RWL",
    }
}

/// Checks and formats sequence data: flat triplets of voltage (V), current (A)
/// and dwell time (s), e.g. `[1.0, 0.5, 1.0, 2.0, 0.5, 1.0]`.
pub fn process_sequence(sequence: &[f64]) -> std::result::Result<String, ValidationError> {
    if sequence.len() % 3 != 0 {
        return Err(ValidationError::Invalid(
            "sequence must contain a multiple of 3 values".to_string(),
        ));
    }
    let (min, max) = DWELL_TIME_RANGE;
    if sequence.iter().skip(2).step_by(3).any(|t| !(min..=max).contains(t)) {
        return Err(ValidationError::Invalid(format!(
            "dwell times must be between {} and {} s",
            min, max
        )));
    }
    Ok(sequence
        .iter()
        .map(|v| format!("{:?}", v))
        .collect::<Vec<_>>()
        .join(","))
}

impl<IO: Read + Write> Instrument<IO, HMP4040> {
    // System settings

    pub fn beep(&mut self) -> Result<()> {
        self.write("SYST:BEEP")
    }

    pub fn set_control(&mut self, control: Control) -> Result<()> {
        self.write(format!("SYST:{}", control))
    }

    /// SCPI version the command set complies with.
    pub fn version(&mut self) -> Result<String> {
        self.ask("SYST:VERS?")
    }

    // Channel selection

    pub fn selected_channel(&mut self) -> Result<u8> {
        self.ask_as("INST:NSEL?")
    }

    pub fn set_selected_channel(&mut self, channel: u8) -> Result<()> {
        let channel = validators::strict_discrete_set(channel, &CHANNELS)?;
        self.write(format!("INST:NSEL {}", channel))
    }

    pub fn select_channel(&mut self, channel: u8) -> Result<()> {
        self.set_selected_channel(channel)
    }

    // Voltage

    /// Output voltage in V, 1 mV resolution.
    pub fn voltage(&mut self) -> Result<f64> {
        self.ask_as("VOLT?")
    }
    pub fn set_voltage(&mut self, volts: f64) -> Result<()> {
        self.write(format!("VOLT {}", volts))
    }
    pub fn min_voltage(&mut self) -> Result<f64> {
        self.ask_as("VOLT? MIN")
    }
    pub fn max_voltage(&mut self) -> Result<f64> {
        self.ask_as("VOLT? MAX")
    }
    pub fn voltage_to_min(&mut self) -> Result<()> {
        self.write("VOLT MIN")
    }
    pub fn voltage_to_max(&mut self) -> Result<()> {
        self.write("VOLT MAX")
    }
    pub fn voltage_step(&mut self) -> Result<f64> {
        self.ask_as("VOLT:STEP?")
    }
    /// Step size used by `step_voltage_up`/`step_voltage_down`, clamped to 0..=32.05 V.
    pub fn set_voltage_step(&mut self, volts: f64) -> Result<()> {
        let volts = validators::truncated_range(volts, 0.0, MAX_VOLTAGE_STEP);
        self.write(format!("VOLT:STEP {}", volts))
    }
    pub fn step_voltage_up(&mut self) -> Result<()> {
        self.write("VOLT UP")
    }
    pub fn step_voltage_down(&mut self) -> Result<()> {
        self.write("VOLT DOWN")
    }

    // Current

    /// Output current limit in A.
    pub fn current(&mut self) -> Result<f64> {
        self.ask_as("CURR?")
    }
    pub fn set_current(&mut self, amps: f64) -> Result<()> {
        self.write(format!("CURR {}", amps))
    }
    pub fn min_current(&mut self) -> Result<f64> {
        self.ask_as("CURR? MIN")
    }
    pub fn max_current(&mut self) -> Result<f64> {
        self.ask_as("CURR? MAX")
    }
    pub fn current_to_min(&mut self) -> Result<()> {
        self.write("CURR MIN")
    }
    pub fn current_to_max(&mut self) -> Result<()> {
        self.write("CURR MAX")
    }
    pub fn current_step(&mut self) -> Result<f64> {
        self.ask_as("CURR:STEP?")
    }
    pub fn set_current_step(&mut self, amps: f64) -> Result<()> {
        self.write(format!("CURR:STEP {}", amps))
    }
    pub fn step_current_up(&mut self) -> Result<()> {
        self.write("CURR UP")
    }
    pub fn step_current_down(&mut self) -> Result<()> {
        self.write("CURR DOWN")
    }

    /// `(volts, amps)` of the selected channel.
    pub fn voltage_and_current(&mut self) -> Result<(f64, f64)> {
        let command = "APPL?";
        let reply = self.ask(command)?;
        match super::parse_values(&reply).as_deref() {
            Some([volts, amps]) => Ok((*volts, *amps)),
            _ => Err(Error::invalid_response(command, reply)),
        }
    }
    pub fn set_voltage_and_current(&mut self, volts: f64, amps: f64) -> Result<()> {
        self.write(format!("APPL {}, {}", volts, amps))
    }

    // Outputs

    pub fn selected_channel_active(&mut self) -> Result<bool> {
        self.ask_bool("OUTP:SEL?")
    }
    pub fn set_selected_channel_active(&mut self, active: bool) -> Result<()> {
        self.write(format!("OUTPUT:SEL {}", scpi::bool_token(active)))
    }

    /// Master output switch.
    pub fn output_enabled(&mut self) -> Result<bool> {
        self.ask_bool("OUTP:GEN?")
    }
    pub fn set_output_enabled(&mut self, enabled: bool) -> Result<()> {
        self.write(format!("OUTP:GEN {}", scpi::bool_token(enabled)))
    }
    pub fn turn_output_on(&mut self) -> Result<()> {
        self.set_output_enabled(true)
    }
    pub fn turn_output_off(&mut self) -> Result<()> {
        self.set_output_enabled(false)
    }

    /// Activates or deactivates `channel` without changing the selected channel.
    pub fn set_channel_state(&mut self, channel: u8, active: bool) -> Result<()> {
        let channel = validators::strict_discrete_set(channel, &CHANNELS)?;
        let selected = self.selected_channel()?;
        self.set_selected_channel(channel)?;
        self.set_selected_channel_active(active)?;
        self.set_selected_channel(selected)
    }
    pub fn activate_channel(&mut self, channel: u8) -> Result<()> {
        self.set_channel_state(channel, true)
    }
    pub fn deactivate_channel(&mut self, channel: u8) -> Result<()> {
        self.set_channel_state(channel, false)
    }

    // Measurements

    pub fn measured_voltage(&mut self) -> Result<f64> {
        self.ask_as("MEAS:VOLT?")
    }
    pub fn measured_current(&mut self) -> Result<f64> {
        self.ask_as("MEAS:CURR?")
    }

    // Arbitrary sequences

    /// Defines the sequence, see [`process_sequence`].
    pub fn set_sequence(&mut self, sequence: &[f64]) -> Result<()> {
        let data = process_sequence(sequence)?;
        self.write(format!("ARB:DATA {}", data))
    }

    /// Number of repetitions, 0 meaning endless.
    pub fn repetitions(&mut self) -> Result<u32> {
        self.ask_as("ARB:REP?")
    }
    pub fn set_repetitions(&mut self, repetitions: u32) -> Result<()> {
        let repetitions = validators::strict_range(repetitions, 0, MAX_REPETITIONS)?;
        self.write(format!("ARB:REP {}", repetitions))
    }

    pub fn clear_sequence(&mut self, channel: u8) -> Result<()> {
        self.channel_command("ARB:CLEAR", channel)
    }
    pub fn start_sequence(&mut self, channel: u8) -> Result<()> {
        self.channel_command("ARB:START", channel)
    }
    pub fn stop_sequence(&mut self, channel: u8) -> Result<()> {
        self.channel_command("ARB:STOP", channel)
    }
    /// Hands the defined sequence to `channel`.
    pub fn transfer_sequence(&mut self, channel: u8) -> Result<()> {
        self.channel_command("ARB:TRAN", channel)
    }

    /// Restores a sequence from internal memory slot 1, 2 or 3.
    pub fn load_sequence(&mut self, slot: u8) -> Result<()> {
        let slot = validators::strict_discrete_set(slot, &SEQUENCE_SLOTS)?;
        self.write(format!("ARB:REST {}", slot))
    }
    pub fn save_sequence(&mut self, slot: u8) -> Result<()> {
        let slot = validators::strict_discrete_set(slot, &SEQUENCE_SLOTS)?;
        self.write(format!("ARB:SAVE {}", slot))
    }

    fn channel_command(&mut self, header: &str, channel: u8) -> Result<()> {
        let channel = validators::strict_discrete_set(channel, &CHANNELS)?;
        self.write(format!("{} {}", header, channel))
    }
}
