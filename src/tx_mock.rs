use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, pubsub::PubSubChannel};
use embedded_io::ErrorType;
use heapless::Vec;

pub type TxChannel = PubSubChannel<CriticalSectionRawMutex, Vec<u8, 512>, 4, 1, 1>;
pub type TxPublisher<'a> =
    embassy_sync::pubsub::Publisher<'a, CriticalSectionRawMutex, Vec<u8, 512>, 4, 1, 1>;

/// Test transport: buffers written bytes and publishes one message per
/// flush, i.e. one message per command the client sends.
pub struct TxMock<'a> {
    buf: Vec<u8, 512>,
    publisher: TxPublisher<'a>,
}

#[derive(Debug)]
pub struct IoError;

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

impl<'a> TxMock<'a> {
    pub fn new(publisher: TxPublisher<'a>) -> Self {
        TxMock {
            buf: Vec::new(),
            publisher,
        }
    }
}

impl ErrorType for TxMock<'_> {
    type Error = IoError;
}

impl embedded_io_async::Write for TxMock<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.buf.extend_from_slice(buf).map_err(|_| IoError)?;
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.publisher.publish(self.buf.clone()).await;
        self.buf.clear();
        Ok(())
    }
}
