use std::fmt;

/// A three-digit FTP reply code.
///
/// `NO_CODE` is the sentinel for raw lines that carry no code at all. The
/// "no outstanding sequence" state is modelled by the control channel holding
/// `None` rather than by a second sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    pub const NO_CODE: ReplyCode = ReplyCode(0);

    pub const FILE_STATUS_OKAY: ReplyCode = ReplyCode(150);

    pub const COMMAND_OKAY: ReplyCode = ReplyCode(200);
    pub const COMMAND_SUPERFLUOUS: ReplyCode = ReplyCode(202);
    pub const SYSTEM_STATUS: ReplyCode = ReplyCode(211);
    pub const FILE_STATUS: ReplyCode = ReplyCode(213);
    pub const NAME_SYSTEM_TYPE: ReplyCode = ReplyCode(215);
    pub const SERVICE_READY: ReplyCode = ReplyCode(220);
    pub const CLOSING_CONTROL: ReplyCode = ReplyCode(221);
    pub const TRANSFER_COMPLETE: ReplyCode = ReplyCode(226);
    pub const USER_LOGGED_IN: ReplyCode = ReplyCode(230);
    pub const AUTH_OKAY: ReplyCode = ReplyCode(234);
    pub const FILE_ACTION_OKAY: ReplyCode = ReplyCode(250);
    pub const PATHNAME_CREATED: ReplyCode = ReplyCode(257);

    pub const NEED_PASSWORD: ReplyCode = ReplyCode(331);
    pub const PENDING_MORE_INFO: ReplyCode = ReplyCode(350);

    pub const SERVICE_UNAVAILABLE: ReplyCode = ReplyCode(421);
    pub const CANT_OPEN_DATA_CONNECTION: ReplyCode = ReplyCode(425);
    pub const DATA_CLOSED_ABORTED: ReplyCode = ReplyCode(426);
    pub const ACTION_ABORTED_LOCAL_ERROR: ReplyCode = ReplyCode(451);

    pub const SYNTAX_ERROR: ReplyCode = ReplyCode(500);
    pub const SYNTAX_ERROR_ARGUMENTS: ReplyCode = ReplyCode(501);
    pub const NOT_IMPLEMENTED: ReplyCode = ReplyCode(502);
    pub const BAD_COMMAND_SEQUENCE: ReplyCode = ReplyCode(503);
    pub const PARAMETER_NOT_IMPLEMENTED: ReplyCode = ReplyCode(504);
    pub const NOT_LOGGED_IN: ReplyCode = ReplyCode(530);
    pub const ACTION_NOT_OKAY: ReplyCode = ReplyCode(550);
    pub const ACTION_ABORTED_STORAGE: ReplyCode = ReplyCode(552);
    pub const FILENAME_NOT_ALLOWED: ReplyCode = ReplyCode(553);

    pub const fn new(code: u16) -> Self {
        ReplyCode(code)
    }

    pub const fn value(self) -> u16 {
        self.0
    }

    pub fn is_no_code(self) -> bool {
        self == Self::NO_CODE
    }

    /// Preliminary (1xx) replies do not terminate a command.
    pub fn is_preliminary(self) -> bool {
        (100..200).contains(&self.0)
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// Formats one reply line, terminator included.
pub fn format_reply_line(code: ReplyCode, partial: bool, message: &str) -> String {
    if code.is_no_code() {
        format!("{}\r\n", message)
    } else {
        format!("{}{}{}\r\n", code, if partial { '-' } else { ' ' }, message)
    }
}

/// Splits a message on embedded line breaks, dropping a trailing `\r` from
/// each piece. Always yields at least one line.
pub fn split_message(message: &str) -> Vec<&str> {
    message
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_reply_line() {
        assert_eq!(
            format_reply_line(ReplyCode::SERVICE_READY, true, "hello"),
            "220-hello\r\n"
        );
        assert_eq!(
            format_reply_line(ReplyCode::SERVICE_READY, false, "ready"),
            "220 ready\r\n"
        );
        assert_eq!(format_reply_line(ReplyCode::NO_CODE, true, "raw"), "raw\r\n");
        assert_eq!(format_reply_line(ReplyCode::new(7), false, "x"), "007 x\r\n");
    }

    #[test]
    fn test_split_message() {
        assert_eq!(split_message("a\r\nb\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_message(""), vec![""]);
        assert_eq!(split_message("trailing\n"), vec!["trailing", ""]);
    }
}
