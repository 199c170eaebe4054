use crate::core_control::ControlError;
use crate::session::Client;
use async_trait::async_trait;

/// The parsed command line handed to a command factory.
#[derive(Debug, Clone, Default)]
pub struct CommandArgs {
    /// Upper-cased verb.
    pub verb: String,
    /// Everything after the verb, untokenised.
    pub arg_str: String,
    /// Whitespace-separated tokens, verb first.
    pub args: Vec<String>,
}

impl CommandArgs {
    /// Splits `line` into verb and argument string.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_start();
        let (verb, rest) = match line.find(char::is_whitespace) {
            Some(pos) => (&line[..pos], &line[pos..]),
            None => (line, ""),
        };
        let verb = verb.to_ascii_uppercase();
        // A single separator is dropped; filenames may begin or end with spaces.
        let arg_str = rest.strip_prefix(' ').unwrap_or(rest.trim_start()).to_string();

        let mut args = vec![verb.clone()];
        args.extend(arg_str.split_whitespace().map(str::to_string));

        Self {
            verb,
            arg_str,
            args,
        }
    }

    /// Number of tokens after the verb.
    pub fn param_count(&self) -> usize {
        self.args.len().saturating_sub(1)
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.args.get(index + 1).map(String::as_str)
    }
}

/// How a command finished. Reply lines have already been sent either way.
///
/// Post-command hooks run for every outcome except `SkipPostScript`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Okay,
    /// A logical failure, already answered.
    Failed,
    /// The reply covers everything; post-command hooks must not run.
    SkipPostScript,
}

/// One invocation of an FTP verb.
///
/// Built fresh for every command line and consumed by `execute`. Logical
/// failures are answered with a reply and reported through the outcome; an
/// `Err` ends the session.
#[async_trait]
pub trait Command: Send {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError>;
}

pub type CommandFactory = fn(CommandArgs) -> Box<dyn Command>;
