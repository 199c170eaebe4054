pub mod error;
pub mod listing;
pub mod path;
pub mod vfs;

pub use error::FsError;
pub use listing::{format_long, DirEntry};
pub use path::VirtualPath;
pub use vfs::{Capability, PathRule, Vfs};
