// src/constants.rs

pub const USERNAME_REGEX: &str = r"^[a-zA-Z0-9_\-]{1,32}$";
pub const SERVER_NAME: &str = "oxftpd";

/// Longest command line accepted on the control channel, terminator included.
pub const MAX_COMMAND_LENGTH: usize = 512;
/// Leading command-line bytes above this value are telnet negotiation noise.
pub const TELNET_STRIP_THRESHOLD: u8 = 240;
pub const CONTROL_READ_CHUNK: usize = 1024;

pub const DEFAULT_UPLOAD_BUFFER_SIZE: usize = 256 * 1024;
pub const DEFAULT_DOWNLOAD_BUFFER_SIZE: usize = 128 * 1024;

pub const UNIQUE_FILENAME_LENGTH: usize = 10;
pub const SITEOP_FLAG: char = '1';
pub const MAX_ADDIP_IPS: usize = 10;

pub const USERS_CONTAINER: &str = "users";
pub const IPMASKS_CONTAINER: &str = "ipmasks";

pub const DEFAULT_CONFIG_PATH: &str = if cfg!(target_os = "windows") {
    "C:\\oxftpd\\etc\\oxftpd.conf"
} else {
    "/etc/oxftpd.conf"
};
