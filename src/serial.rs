use alloc::{collections::VecDeque, vec::Vec};
use embedded_hal_nb::serial::Read;
use embedded_io::Write;

use crate::{
    command::Command,
    frame::{self, FrameError, MAX_FRAME_SIZE, Profile},
};

/// Upper bound on bytes drained per [`Link::read_available`] so a chatty
/// device cannot keep the shell reading forever.
pub const READ_LIMIT: usize = 4 * MAX_FRAME_SIZE;

#[derive(Debug)]
pub struct BufferedRx<Rx: Read> {
    rx: Rx,
    buf: VecDeque<u8>,
}

impl<Rx: Read> BufferedRx<Rx> {
    pub fn new(rx: Rx) -> BufferedRx<Rx> {
        BufferedRx {
            rx,
            buf: VecDeque::new(),
        }
    }

    /// Load from rx into the internal buf until rx would block or `limit`
    /// bytes are held.
    pub fn buffer(&mut self, limit: usize) -> nb::Result<(), Rx::Error> {
        while self.buf.len() < limit {
            let c = self.rx.read()?;
            self.buf.push_back(c);
        }
        Ok(())
    }

    /// Removes elements from the front of the VecDeque from 0 to the
    /// specified amount.
    pub fn drain(&mut self, amount: usize) -> alloc::collections::vec_deque::Drain<'_, u8> {
        self.buf.drain(0..amount.min(self.buf.len()))
    }

    fn len(&self) -> usize {
        self.buf.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LinkError<WriteError, ReadError> {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("serial write failed: {0}")]
    Write(WriteError),
    #[error("serial read failed: {0}")]
    Read(ReadError),
}

/// Owns both halves of a connection to the display and speaks one profile on it.
///
/// Dropping the link drops the halves, which closes the underlying port.
#[derive(Debug)]
pub struct Link<Tx: Write, Rx: Read> {
    tx: Tx,
    rx: BufferedRx<Rx>,
    profile: Profile,
}

impl<Tx: Write, Rx: Read> Link<Tx, Rx> {
    pub fn new(tx: Tx, rx: Rx, profile: Profile) -> Link<Tx, Rx> {
        Link {
            tx,
            rx: BufferedRx::new(rx),
            profile,
        }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Encodes `command` and writes the whole frame, returning its length.
    pub fn send(&mut self, command: &Command) -> Result<usize, LinkError<Tx::Error, Rx::Error>> {
        let frame = frame::encode(command, self.profile)?;
        self.write_raw(&frame)?;
        Ok(frame.len())
    }

    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), LinkError<Tx::Error, Rx::Error>> {
        log::debug!("tx {} bytes: {:02X?}", bytes.len(), bytes);
        self.tx.write_all(bytes).map_err(LinkError::Write)?;
        self.tx.flush().map_err(LinkError::Write)
    }

    /// Takes whatever the device has sent so far without waiting for more.
    pub fn read_available(&mut self) -> Result<Vec<u8>, LinkError<Tx::Error, Rx::Error>> {
        match self.rx.buffer(READ_LIMIT) {
            Ok(()) => log::warn!("stopped reading after {} bytes", READ_LIMIT),
            Err(nb::Error::WouldBlock) => {}
            Err(nb::Error::Other(e)) => return Err(LinkError::Read(e)),
        }
        let len = self.rx.len();
        let bytes: Vec<u8> = self.rx.drain(len).collect();
        log::debug!("rx {} bytes", bytes.len());
        Ok(bytes)
    }

    pub fn into_inner(self) -> (Tx, Rx) {
        (self.tx, self.rx.rx)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use alloc::{collections::VecDeque, rc::Rc, vec::Vec};
    use core::{cell::Cell, convert::Infallible};

    use embedded_hal_nb::serial::{self, Read};
    use embedded_io::{ErrorKind, ErrorType, Write};

    #[derive(Debug, Default)]
    pub struct TxBuffer(pub Vec<u8>);

    impl ErrorType for TxBuffer {
        type Error = Infallible;
    }

    impl Write for TxBuffer {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    pub struct ReadBuffer(pub VecDeque<u8>);

    impl ReadBuffer {
        pub fn from_slice(data: &[u8]) -> ReadBuffer {
            ReadBuffer(data.iter().copied().collect())
        }
    }

    impl serial::ErrorType for ReadBuffer {
        type Error = Infallible;
    }

    impl Read for ReadBuffer {
        fn read(&mut self) -> nb::Result<u8, Self::Error> {
            self.0.pop_front().ok_or(nb::Error::WouldBlock)
        }
    }

    /// Never runs dry
    #[derive(Debug, Default)]
    pub struct Chatter;

    impl serial::ErrorType for Chatter {
        type Error = Infallible;
    }

    impl Read for Chatter {
        fn read(&mut self) -> nb::Result<u8, Self::Error> {
            Ok(b'.')
        }
    }

    #[derive(Debug)]
    pub struct Unplugged;

    impl embedded_io::Error for Unplugged {
        fn kind(&self) -> ErrorKind {
            ErrorKind::NotConnected
        }
    }

    /// Fails every write
    #[derive(Debug, Default)]
    pub struct DeadTx;

    impl ErrorType for DeadTx {
        type Error = Unplugged;
    }

    impl Write for DeadTx {
        fn write(&mut self, _: &[u8]) -> Result<usize, Self::Error> {
            Err(Unplugged)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Err(Unplugged)
        }
    }

    /// Wraps one half of a connection and counts how often it is dropped.
    #[derive(Debug)]
    pub struct Closing<T> {
        inner: T,
        closed: Rc<Cell<usize>>,
    }

    impl<T> Closing<T> {
        pub fn new(inner: T, closed: &Rc<Cell<usize>>) -> Closing<T> {
            Closing {
                inner,
                closed: Rc::clone(closed),
            }
        }
    }

    impl<T> Drop for Closing<T> {
        fn drop(&mut self) {
            self.closed.set(self.closed.get() + 1);
        }
    }

    impl<T: ErrorType> ErrorType for Closing<T> {
        type Error = T::Error;
    }

    impl<T: Write> Write for Closing<T> {
        fn write(&mut self, buf: &[u8]) -> Result<usize, T::Error> {
            self.inner.write(buf)
        }

        fn flush(&mut self) -> Result<(), T::Error> {
            self.inner.flush()
        }
    }

    impl<T: serial::ErrorType> serial::ErrorType for Closing<T> {
        type Error = T::Error;
    }

    impl<T: Read> Read for Closing<T> {
        fn read(&mut self) -> nb::Result<u8, T::Error> {
            self.inner.read()
        }
    }
}
