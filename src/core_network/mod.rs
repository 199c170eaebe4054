pub mod network;
pub mod registry;

use tokio::io::{AsyncRead, AsyncWrite};

/// Any bidirectional byte stream a session can run over: a plain socket, a
/// TLS stream wrapping one, or an in-memory pipe.
pub trait SocketIo: AsyncRead + AsyncWrite + Unpin + Send + Sync {}

impl<T> SocketIo for T where T: AsyncRead + AsyncWrite + Unpin + Send + Sync {}

pub type BoxedIo = Box<dyn SocketIo>;

pub use registry::{ClientRegistry, ClientSummary};
