pub mod error;
pub mod ipmask;
pub mod users;
pub mod wildcard;

pub use error::AclError;
pub use ipmask::IpMaskCache;
pub use users::{User, UserCache};
pub use wildcard::wildcard_match;
