//! Host serial port exposed through the link's transport traits.

use std::{fmt, io, time::Duration};

use embedded_hal_nb::serial;
use serialport::{DataBits, Parity, SerialPort, StopBits};

pub const DEFAULT_PORT: &str = "/dev/ttyACM0";
/// Fixed UART rate of the framed firmware
pub const FRAMED_BAUD: u32 = 9600;
/// The legacy firmware is a USB CDC device and ignores the rate, but the OS
/// still wants one.
pub const DEFAULT_BAUD: u32 = FRAMED_BAUD;

const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("could not open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },
    #[error(transparent)]
    Serial(#[from] serialport::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl embedded_io::Error for PortError {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind;
        let PortError::Io(e) = self else {
            return ErrorKind::Other;
        };
        match e.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            io::ErrorKind::BrokenPipe => ErrorKind::BrokenPipe,
            io::ErrorKind::InvalidInput => ErrorKind::InvalidInput,
            io::ErrorKind::InvalidData => ErrorKind::InvalidData,
            io::ErrorKind::TimedOut => ErrorKind::TimedOut,
            io::ErrorKind::Interrupted => ErrorKind::Interrupted,
            _ => ErrorKind::Other,
        }
    }
}

impl serial::Error for PortError {
    fn kind(&self) -> serial::ErrorKind {
        serial::ErrorKind::Other
    }
}

/// One handle on an open serial device. [`Port::open`] hands out two, one for
/// each direction; the device closes when both are dropped.
pub struct Port {
    inner: Box<dyn SerialPort>,
}

impl Port {
    /// Opens `path` at `baud`, 8N1, no flow control.
    pub fn open(path: &str, baud: u32) -> Result<(Port, Port), PortError> {
        let inner = serialport::new(path, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|source| PortError::Open {
                path: path.into(),
                source,
            })?;
        let rx = inner.try_clone()?;
        log::info!("opened {path} at {baud} baud");
        Ok((Port { inner }, Port { inner: rx }))
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port").field("name", &self.inner.name()).finish()
    }
}

impl embedded_io::ErrorType for Port {
    type Error = PortError;
}

impl embedded_io::Write for Port {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(io::Write::write(&mut self.inner, buf)?)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(io::Write::flush(&mut self.inner)?)
    }
}

impl serial::ErrorType for Port {
    type Error = PortError;
}

impl serial::Read for Port {
    /// Only reads bytes the driver already holds, so this never waits on the device.
    fn read(&mut self) -> nb::Result<u8, PortError> {
        if self.inner.bytes_to_read().map_err(PortError::from)? == 0 {
            return Err(nb::Error::WouldBlock);
        }
        let mut byte = [0; 1];
        match io::Read::read(&mut self.inner, &mut byte) {
            Ok(0) => Err(nb::Error::WouldBlock),
            Ok(_) => Ok(byte[0]),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Err(nb::Error::WouldBlock)
            }
            Err(e) => Err(nb::Error::Other(e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_kinds_carry_over() {
        let timed_out = PortError::Io(io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(embedded_io::Error::kind(&timed_out), embedded_io::ErrorKind::TimedOut);

        let gone = PortError::Serial(serialport::Error::new(serialport::ErrorKind::NoDevice, "unplugged"));
        assert_eq!(embedded_io::Error::kind(&gone), embedded_io::ErrorKind::Other);
        assert_eq!(serial::Error::kind(&gone), serial::ErrorKind::Other);
    }

    #[test]
    fn open_missing_device_names_path() {
        let err = Port::open("/dev/umx-does-not-exist", DEFAULT_BAUD).unwrap_err();
        assert!(matches!(err, PortError::Open { .. }));
        assert!(err.to_string().contains("/dev/umx-does-not-exist"));
    }
}
