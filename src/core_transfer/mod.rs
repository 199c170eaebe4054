pub mod ascii;
pub mod copy;
pub mod data;
pub mod state;

pub use ascii::{AsciiTranscoder, LineEnding};
pub use copy::{copy_paced, CopyOptions};
pub use data::DataChannel;
pub use state::{effective_speed_limit, pace_delay_for, Direction, TransferState};
