use std::time::Duration;

use super::{protocol_error::ProtocolError, Protocol};
use serial::{SerialPort, SystemPort};

/// Line settings of a serial link. Defaults to 9600 baud, 8N1, no flow control.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Serial {
    pub baud_rate: serial::BaudRate,
    pub data_bits: serial::CharSize,
    pub parity: serial::Parity,
    pub stop_bits: serial::StopBits,
    pub flow_control: serial::FlowControl,
}

impl Default for Serial {
    fn default() -> Self {
        Self {
            baud_rate: serial::Baud9600,
            data_bits: serial::Bits8,
            parity: serial::ParityNone,
            stop_bits: serial::Stop1,
            flow_control: serial::FlowNone,
        }
    }
}

impl Serial {
    pub fn with_baud_rate(self, baud_rate: usize) -> Self {
        Self {
            baud_rate: serial::BaudRate::from_speed(baud_rate),
            ..self
        }
    }
}

fn config_serial<T: SerialPort>(port: &mut T, config: Serial) -> serial::Result<()> {
    port.reconfigure(&|settings| {
        settings.set_baud_rate(config.baud_rate)?;
        settings.set_char_size(config.data_bits);
        settings.set_parity(config.parity);
        settings.set_stop_bits(config.stop_bits);
        settings.set_flow_control(config.flow_control);
        Ok(())
    })
}

impl Protocol for Serial {
    /// Port name, e.g. `/dev/ttyUSB0` or `COM3`.
    type Address = String;
    type IO = SystemPort;
    fn connect(self, address: Self::Address, time_out: Duration) -> Result<Self::IO, ProtocolError> {
        log::info!("opening serial port {} at {:?}", address, self.baud_rate);
        let mut port = serial::open(&address)?;
        config_serial(&mut port, self)?;
        port.set_timeout(time_out)?;
        Ok(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_line_settings_are_9600_8n1() {
        let s = Serial::default();
        assert_eq!(s.baud_rate, serial::Baud9600);
        assert_eq!(s.data_bits, serial::Bits8);
        assert_eq!(s.parity, serial::ParityNone);
        assert_eq!(s.stop_bits, serial::Stop1);
        assert_eq!(s.flow_control, serial::FlowNone);
    }

    #[test]
    fn baud_rate_override_keeps_framing() {
        let s = Serial::default().with_baud_rate(115200);
        assert_eq!(s.baud_rate, serial::Baud115200);
        assert_eq!(s.parity, serial::ParityNone);
    }
}
