pub mod control;
pub mod error;
pub mod reply;
pub mod signal;

pub use control::ControlChannel;
pub use error::ControlError;
pub use reply::ReplyCode;
pub use signal::{CancelReason, CancellationSignal};
