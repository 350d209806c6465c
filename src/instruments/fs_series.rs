//! Rohde & Schwarz FS series spectrum analyzers (FSL, FSW).
//!
//! Physical values are in base units (Hz, dB, dBm, s).

use std::{
    collections::BTreeMap,
    io::{Read, Write},
};

use serde::Serialize;

use super::{Instrument, Model, Scoped};
use crate::{
    error::{Error, Result},
    protocols::Tcp,
    scpi::{self, scpi_enum, NumberOrAuto},
    validators::{self, ValidationError},
    DefaultConfig,
};

pub const TRACES: (i64, i64) = (1, 6);
pub const MARKERS: (u8, u8) = (1, 4);

#[derive(Debug, Default, Clone, Copy)]
pub struct FSSeries;

pub type FSL = FSSeries;
pub type FSW = FSSeries;

impl Model for FSSeries {
    const DESCRIPTION: &'static str = "Rohde&Schwarz FS series";
}

impl DefaultConfig for FSSeries {
    type DefaultProtocol = Tcp;
    const DEFAULT_PROTOCOL: Tcp = Tcp;
}

scpi_enum! {
    pub enum TraceMode {
        ClearWrite => "WRIT",
        MaxHold => "MAXH",
        MinHold => "MINH",
        Average => "AVER",
        View => "VIEW",
    }
}

scpi_enum! {
    /// Measurement application of a channel.
    pub enum ChannelType {
        PhaseNoise => "PNOISE",
        SpectrumAnalyzer => "SANALYZER",
    }
}

scpi_enum! {
    pub enum Direction {
        Left => "LEFT",
        Right => "RIGHT",
    }
}

/// One trace as x (frequency or offset) and y (level) axes of equal length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// `INST:LIST?` answers `'<type>','<name>',...`; maps names to types.
fn channel_list_to_map(reply: &str) -> BTreeMap<String, String> {
    let items = scpi::split_list(reply);
    items
        .chunks_exact(2)
        .map(|pair| (pair[1].clone(), pair[0].clone()))
        .collect()
}

impl<IO: Read + Write> Instrument<IO, FSSeries> {
    // Frequency

    pub fn freq_span(&mut self) -> Result<f64> {
        self.ask_as("FREQ:SPAN?")
    }
    pub fn set_freq_span(&mut self, hz: f64) -> Result<()> {
        self.write(format!("FREQ:SPAN {}", hz))
    }
    pub fn freq_center(&mut self) -> Result<f64> {
        self.ask_as("FREQ:CENT?")
    }
    pub fn set_freq_center(&mut self, hz: f64) -> Result<()> {
        self.write(format!("FREQ:CENT {}", hz))
    }
    pub fn freq_start(&mut self) -> Result<f64> {
        self.ask_as("FREQ:STAR?")
    }
    pub fn set_freq_start(&mut self, hz: f64) -> Result<()> {
        self.write(format!("FREQ:STAR {}", hz))
    }
    pub fn freq_stop(&mut self) -> Result<f64> {
        self.ask_as("FREQ:STOP?")
    }
    pub fn set_freq_stop(&mut self, hz: f64) -> Result<()> {
        self.write(format!("FREQ:STOP {}", hz))
    }

    pub fn attenuation(&mut self) -> Result<f64> {
        self.ask_as("INP:ATT?")
    }
    pub fn set_attenuation(&mut self, db: f64) -> Result<()> {
        self.write(format!("INP:ATT {}", db))
    }

    pub fn res_bandwidth(&mut self) -> Result<f64> {
        self.ask_as("BAND:RES?")
    }
    pub fn set_res_bandwidth<V: Into<NumberOrAuto>>(&mut self, hz: V) -> Result<()> {
        self.write(hz.into().command("BAND:RES"))
    }
    pub fn video_bandwidth(&mut self) -> Result<f64> {
        self.ask_as("BAND:VID?")
    }
    pub fn set_video_bandwidth<V: Into<NumberOrAuto>>(&mut self, hz: V) -> Result<()> {
        self.write(hz.into().command("BAND:VID"))
    }

    // Sweeping

    pub fn sweep_time(&mut self) -> Result<f64> {
        self.ask_as("SWE:TIME?")
    }
    pub fn set_sweep_time<V: Into<NumberOrAuto>>(&mut self, seconds: V) -> Result<()> {
        self.write(seconds.into().command("SWE:TIME"))
    }

    /// Continuous (true) or single (false) sweep.
    pub fn continuous_sweep(&mut self) -> Result<bool> {
        self.ask_bool("INIT:CONT?")
    }
    pub fn set_continuous_sweep(&mut self, continuous: bool) -> Result<()> {
        self.write(format!("INIT:CONT {}", scpi::bool_token(continuous)))
    }
    pub fn single_sweep(&mut self) -> Result<()> {
        self.write("INIT; *WAI")
    }
    pub fn continue_single_sweep(&mut self) -> Result<()> {
        self.write("INIT:CONM; *WAI")
    }

    // Traces

    /// Number of open measurement channels. Analyzers without the channel
    /// option never answer `INST:LIST?`; a timeout counts as zero.
    pub fn instrument_channels(&mut self) -> Result<usize> {
        match self.ask("INST:LIST?") {
            Ok(reply) => Ok(scpi::split_list(&reply).len() / 2),
            Err(e) if e.is_timeout() => {
                log::warn!("INST:LIST? timed out, assuming a single channel analyzer");
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    /// Reads trace `n_trace` (1..=6) of the active channel. Phase noise traces
    /// carry interleaved offset/level pairs, spectrum traces are mapped onto
    /// the start..stop frequency axis.
    pub fn read_trace(&mut self, n_trace: u8) -> Result<Trace> {
        let n_trace = validators::strict_discrete_range(n_trace as i64, TRACES.0, TRACES.1, 1)?;
        let data = self.values(format!("TRAC? TRACE{}", n_trace))?;

        if self.instrument_channels()? > 1 {
            let active = self.active_channel()?;
            let is_phase_noise = matches!(active.as_str(), "PNO" | "PNOISE")
                || matches!(
                    self.available_channels()?.get(&active).map(String::as_str),
                    Some("PNO") | Some("PNOISE")
                );
            if is_phase_noise {
                let x = data.iter().step_by(2).copied().collect();
                let y = data.iter().skip(1).step_by(2).copied().collect();
                return Ok(Trace { x, y });
            }
        }
        let start = self.freq_start()?;
        let stop = self.freq_stop()?;
        Ok(Trace {
            x: linspace(start, stop, data.len()),
            y: data,
        })
    }

    pub fn trace_mode(&mut self) -> Result<TraceMode> {
        self.ask_as("DISP:TRAC:MODE?")
    }
    pub fn set_trace_mode(&mut self, mode: TraceMode) -> Result<()> {
        self.write(format!("DISP:TRAC:MODE {}", mode))
    }

    // Markers

    /// Creates and activates marker `num` (1..=4). Delta markers start at 2.
    pub fn create_marker(&mut self, num: u8, is_delta_marker: bool) -> Result<Marker<'_, IO>> {
        let num = validators::strict_range(num, MARKERS.0, MARKERS.1)?;
        let name = if is_delta_marker {
            format!("DELT{}", num.max(2))
        } else if num > 1 {
            format!("MARK{}", num)
        } else {
            "MARK".to_string()
        };
        let mut marker = Marker {
            scope: self.scoped(format!("CALC:{}:", name)),
            name,
        };
        marker.activate()?;
        Ok(marker)
    }

    // Channels

    pub fn create_channel(&mut self, channel_type: ChannelType, channel_name: &str) -> Result<()> {
        self.write(format!("INST:CRE:NEW {}, '{}'", channel_type, channel_name))
    }

    /// Open channels as name -> type.
    pub fn available_channels(&mut self) -> Result<BTreeMap<String, String>> {
        let reply = self.ask("INST:LIST?")?;
        Ok(channel_list_to_map(&reply))
    }

    pub fn delete_channel(&mut self, channel_name: &str) -> Result<()> {
        let name = self.existing_channel(channel_name)?;
        self.write(format!("INST:DEL '{}'", name))
    }

    pub fn select_channel(&mut self, channel_name: &str) -> Result<()> {
        self.write(format!("INST:SEL '{}'", channel_name))
    }

    pub fn active_channel(&mut self) -> Result<String> {
        let command = "INST?";
        let reply = self.ask(command)?;
        scpi::split_list(&reply)
            .into_iter()
            .next()
            .ok_or_else(|| Error::invalid_response(command, reply))
    }

    pub fn set_active_channel(&mut self, channel_name: &str) -> Result<()> {
        let name = self.existing_channel(channel_name)?;
        self.write(format!("INST '{}'", name))
    }

    pub fn rename_channel(&mut self, current_name: &str, new_name: &str) -> Result<()> {
        let current = self.existing_channel(current_name)?;
        self.write(format!("INST:REN '{}', '{}'", current, new_name))
    }

    /// Split view (true) or single channel view (false).
    pub fn split_view(&mut self) -> Result<bool> {
        let command = "DISP:FORM?";
        let reply = self.ask(command)?;
        match reply.trim() {
            "SPL" => Ok(true),
            "SING" => Ok(false),
            _ => Err(Error::invalid_response(command, reply)),
        }
    }
    pub fn set_split_view(&mut self, split: bool) -> Result<()> {
        self.write(format!("DISP:FORM {}", if split { "SPL" } else { "SING" }))
    }

    // Phase noise limit lines

    pub fn phase_noise_trace(&mut self, trace: u8) -> Result<()> {
        let trace = validators::strict_discrete_range(trace as i64, TRACES.0, TRACES.1, 1)?;
        self.write(format!("CALC:PNL:TRAC {}", trace))
    }

    pub fn select_trace(&mut self, trace: u8) -> Result<()> {
        let trace = validators::strict_discrete_range(trace as i64, TRACES.0, TRACES.1, 1)?;
        self.write(format!("DISP:TRAC:SEL {}", trace))
    }

    /// Reference level in dBm.
    pub fn nominal_level(&mut self) -> Result<f64> {
        self.ask_as("POW:RLEV?")
    }
    pub fn set_nominal_level(&mut self, dbm: f64) -> Result<()> {
        self.write(format!("POW:RLEV {}", dbm))
    }

    fn existing_channel(&mut self, channel_name: &str) -> Result<String> {
        let names: Vec<String> = self.available_channels()?.into_keys().collect();
        Ok(validators::strict_discrete_set(channel_name.to_string(), &names)?)
    }
}

/// Marker or delta marker, commands under `CALC:<name>:`.
pub struct Marker<'a, IO: Read + Write> {
    scope: Scoped<'a, IO, FSSeries>,
    name: String,
}

impl<'a, IO: Read + Write> Marker<'a, IO> {
    /// `MARK`, `MARK<n>` or `DELT<n>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn activate(&mut self) -> Result<()> {
        self.scope.write("STAT ON")
    }
    pub fn disable(&mut self) -> Result<()> {
        self.scope.write("STAT OFF")
    }

    /// Position on the frequency axis in Hz.
    pub fn x(&mut self) -> Result<f64> {
        self.scope.ask_as("X?")
    }
    pub fn set_x(&mut self, hz: f64) -> Result<()> {
        self.scope.write(format!("X {}", hz))
    }
    /// Amplitude at the marker position in dBm.
    pub fn y(&mut self) -> Result<f64> {
        self.scope.ask_as("Y?")
    }
    pub fn set_y(&mut self, dbm: f64) -> Result<()> {
        self.scope.write(format!("Y {}", dbm))
    }
    pub fn peak_excursion(&mut self) -> Result<f64> {
        self.scope.ask_as("PEXC?")
    }
    pub fn set_peak_excursion(&mut self, db: f64) -> Result<()> {
        self.scope.write(format!("PEXC {}", db))
    }

    pub fn to_trace(&mut self, n_trace: u8) -> Result<()> {
        let n_trace = validators::strict_discrete_range(n_trace as i64, TRACES.0, TRACES.1, 1)?;
        self.scope.write(format!("TRAC {}", n_trace))
    }
    /// Highest peak within the span.
    pub fn to_peak(&mut self) -> Result<()> {
        self.scope.write("MAX")
    }
    pub fn to_next_peak(&mut self, direction: Direction) -> Result<()> {
        self.scope.write(format!("MAX:{}", direction))
    }
    /// Zooms around the marker by `factor`.
    pub fn zoom(&mut self, factor: f64) -> Result<()> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ValidationError::Invalid(format!("invalid zoom factor {}", factor)).into());
        }
        self.scope.write(format!("FUNC:ZOOM {}; *WAI", factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{instruments::Messenger, mock::MockIO};

    fn analyzer(io: MockIO) -> Instrument<MockIO, FSSeries> {
        Messenger::new(io).bind(FSSeries)
    }

    #[test]
    fn bandwidth_accepts_auto() {
        let mut fs = analyzer(MockIO::new());
        fs.set_res_bandwidth(NumberOrAuto::Auto).unwrap();
        fs.set_video_bandwidth(1e3).unwrap();
        fs.set_sweep_time(NumberOrAuto::Auto).unwrap();
        fs.set_continuous_sweep(false).unwrap();
        fs.single_sweep().unwrap();
        assert_eq!(
            fs.io().written(),
            vec!["BAND:RES:AUTO ON", "BAND:VID 1000", "SWE:TIME:AUTO ON", "INIT:CONT 0", "INIT; *WAI"]
        );
    }

    #[test]
    fn single_channel_trace_gets_frequency_axis() {
        let mut fs = analyzer(
            MockIO::new()
                .with_reply("-80.1,-75.2,-90.0")
                .with_reply("'SAN','Spectrum'")
                .with_reply("1e6")
                .with_reply("3e6"),
        );
        let trace = fs.read_trace(1).unwrap();
        assert_eq!(trace.x, vec![1e6, 2e6, 3e6]);
        assert_eq!(trace.y, vec![-80.1, -75.2, -90.0]);
    }

    #[test]
    fn unanswered_channel_list_counts_as_single_channel() {
        let mut fs = analyzer(MockIO::new());
        assert_eq!(fs.instrument_channels().unwrap(), 0);
    }

    /// Accepts writes and fails every read with `kind`.
    struct Unanswered(std::io::ErrorKind);

    impl Read for Unanswered {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(self.0.into())
        }
    }

    impl Write for Unanswered {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn socket_read_timeout_counts_as_single_channel() {
        let mut fs = Messenger::new(Unanswered(std::io::ErrorKind::WouldBlock)).bind(FSSeries);
        assert_eq!(fs.instrument_channels().unwrap(), 0);
    }

    #[test]
    fn other_transport_errors_are_passed_on() {
        let mut fs = Messenger::new(Unanswered(std::io::ErrorKind::ConnectionReset)).bind(FSSeries);
        match fs.instrument_channels() {
            Err(Error::IOError(e)) => assert_eq!(e.kind(), std::io::ErrorKind::ConnectionReset),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn spectrum_channel_of_multi_channel_analyzer_gets_frequency_axis() {
        let mut fs = analyzer(
            MockIO::new()
                .with_reply("-70,-60")
                .with_reply("'SAN','Spectrum','PNO','Phase Noise'")
                .with_reply("'Spectrum'")
                .with_reply("'SAN','Spectrum','PNO','Phase Noise'")
                .with_reply("2e9")
                .with_reply("4e9"),
        );
        let trace = fs.read_trace(1).unwrap();
        assert_eq!(trace.x, vec![2e9, 4e9]);
        assert_eq!(trace.y, vec![-70.0, -60.0]);
        assert_eq!(
            fs.io().written(),
            vec!["TRAC? TRACE1", "INST:LIST?", "INST?", "INST:LIST?", "FREQ:STAR?", "FREQ:STOP?"]
        );
        assert_eq!(fs.io().unread(), 0);
    }

    #[test]
    fn phase_noise_trace_is_deinterleaved() {
        let mut fs = analyzer(
            MockIO::new()
                .with_reply("10,-100,100,-110,1000,-120")
                .with_reply("'SAN','Spectrum','PNO','Phase Noise'")
                .with_reply("'Phase Noise'")
                .with_reply("'SAN','Spectrum','PNO','Phase Noise'"),
        );
        let trace = fs.read_trace(2).unwrap();
        assert_eq!(trace.x, vec![10.0, 100.0, 1000.0]);
        assert_eq!(trace.y, vec![-100.0, -110.0, -120.0]);
        assert_eq!(
            fs.io().written(),
            vec!["TRAC? TRACE2", "INST:LIST?", "INST?", "INST:LIST?"]
        );
    }

    #[test]
    fn channel_management_validates_names() {
        let list = "'SAN','Spectrum','PNO','Phase Noise'";
        let mut fs = analyzer(MockIO::new().with_reply(list).with_reply(list).with_reply(list));
        let channels = fs.available_channels().unwrap();
        assert_eq!(channels.get("Phase Noise").map(String::as_str), Some("PNO"));
        fs.rename_channel("Spectrum", "Main").unwrap();
        assert!(matches!(
            fs.delete_channel("Missing"),
            Err(Error::ValidationError(_))
        ));
        fs.create_channel(ChannelType::PhaseNoise, "PN").unwrap();
        assert_eq!(
            fs.io().written(),
            vec![
                "INST:LIST?",
                "INST:LIST?",
                "INST:REN 'Spectrum', 'Main'",
                "INST:LIST?",
                "INST:CRE:NEW PNOISE, 'PN'",
            ]
        );
    }

    #[test]
    fn unknown_channel_is_rejected_before_sending() {
        let mut fs = analyzer(MockIO::new().with_reply("'SAN','Spectrum'"));
        assert!(matches!(
            fs.set_active_channel("Phase Noise"),
            Err(Error::ValidationError(ValidationError::NotInSet { .. }))
        ));
        assert_eq!(fs.io().written(), vec!["INST:LIST?"]);
    }

    #[test]
    fn markers_are_named_and_scoped() {
        let mut fs = analyzer(MockIO::new().with_reply("1.5E9"));
        {
            let mut m = fs.create_marker(1, false).unwrap();
            assert_eq!(m.name(), "MARK");
            m.to_peak().unwrap();
            assert_eq!(m.x().unwrap(), 1.5e9);
        }
        {
            let mut d = fs.create_marker(1, true).unwrap();
            assert_eq!(d.name(), "DELT2");
            d.to_next_peak(Direction::Left).unwrap();
            d.zoom(4.0).unwrap();
        }
        assert_eq!(fs.create_marker(3, false).unwrap().name(), "MARK3");
        assert!(fs.create_marker(5, false).is_err());
        assert_eq!(
            fs.io().written(),
            vec![
                "CALC:MARK:STAT ON",
                "CALC:MARK:MAX",
                "CALC:MARK:X?",
                "CALC:DELT2:STAT ON",
                "CALC:DELT2:MAX:LEFT",
                "CALC:DELT2:FUNC:ZOOM 4; *WAI",
                "CALC:MARK3:STAT ON",
            ]
        );
    }

    #[test]
    fn trace_mode_and_split_view() {
        let mut fs = analyzer(MockIO::new().with_reply("MAXH").with_reply("SPL"));
        assert_eq!(fs.trace_mode().unwrap(), TraceMode::MaxHold);
        assert!(fs.split_view().unwrap());
        fs.set_split_view(false).unwrap();
        assert!(fs.select_trace(7).is_err());
        fs.phase_noise_trace(3).unwrap();
        assert_eq!(
            fs.io().written(),
            vec!["DISP:TRAC:MODE?", "DISP:FORM?", "DISP:FORM SING", "CALC:PNL:TRAC 3"]
        );
    }

    #[test]
    fn linear_axis() {
        assert_eq!(linspace(0.0, 1.0, 0), Vec::<f64>::new());
        assert_eq!(linspace(5.0, 9.0, 1), vec![5.0]);
        assert_eq!(linspace(0.0, 4.0, 5), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }
}
