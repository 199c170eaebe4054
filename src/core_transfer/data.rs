use crate::core_network::BoxedIo;
use log::debug;

/// The data connection slot of a session.
///
/// Sockets are opened elsewhere and handed in through [`attach`]; a transfer
/// command takes the stream out for the duration of one transfer.
///
/// [`attach`]: DataChannel::attach
#[derive(Default)]
pub struct DataChannel {
    stream: Option<BoxedIo>,
    /// `PROT P` was requested.
    protected: bool,
    /// Value of the last `PBSZ`, if any.
    pbsz: Option<u64>,
}

impl DataChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, stream: BoxedIo) {
        if self.stream.replace(stream).is_some() {
            debug!("Replaced an unused data connection");
        }
    }

    pub fn take(&mut self) -> Option<BoxedIo> {
        self.stream.take()
    }

    pub fn is_ready(&self) -> bool {
        self.stream.is_some()
    }

    pub fn set_protected(&mut self, protected: bool) {
        self.protected = protected;
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    pub fn set_pbsz(&mut self, size: u64) {
        self.pbsz = Some(size);
    }

    pub fn pbsz(&self) -> Option<u64> {
        self.pbsz
    }
}
