use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandFactory, CommandOutcome};
use crate::core_ftpcommand::hooks::run_post_hooks;
use crate::session::Client;
use log::{debug, error, warn};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Command already registered: {0}")]
    Duplicate(String),

    #[error("Unknown command: {0}")]
    Unknown(String),
}

/// Everything the dispatcher needs to know about a verb before building it.
#[derive(Clone, Copy)]
pub struct CommandDef {
    pub factory: CommandFactory,
    pub min_params: usize,
    /// `None` for no upper bound.
    pub max_params: Option<usize>,
    pub requires_login: bool,
    pub syntax: &'static str,
}

impl CommandDef {
    pub fn new(factory: CommandFactory) -> Self {
        Self {
            factory,
            min_params: 0,
            max_params: None,
            requires_login: true,
            syntax: "",
        }
    }

    pub fn params(mut self, min: usize, max: Option<usize>) -> Self {
        self.min_params = min;
        self.max_params = max;
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.requires_login = false;
        self
    }

    pub fn syntax(mut self, syntax: &'static str) -> Self {
        self.syntax = syntax;
        self
    }

    fn accepts(&self, count: usize) -> bool {
        count >= self.min_params && self.max_params.map_or(true, |max| count <= max)
    }
}

/// What happened to a dispatched line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Executed(CommandOutcome),
    /// Unknown verb, answered with 500.
    Unknown,
    /// Refused before construction (login or argument count).
    Rejected,
}

/// Verb table and dispatcher. The server keeps one for FTP verbs and one for
/// `SITE` sub-commands.
pub struct CommandRegistry {
    /// Prefix for hook lookup and logging, e.g. `SITE `.
    prefix: &'static str,
    commands: HashMap<String, CommandDef>,
}

impl CommandRegistry {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            commands: HashMap::new(),
        }
    }

    pub fn register(&mut self, verb: &str, factory: CommandFactory) -> Result<(), RegistryError> {
        self.register_def(verb, CommandDef::new(factory))
    }

    pub fn register_def(&mut self, verb: &str, def: CommandDef) -> Result<(), RegistryError> {
        let verb = verb.to_ascii_uppercase();
        if self.commands.contains_key(&verb) {
            return Err(RegistryError::Duplicate(verb));
        }
        self.commands.insert(verb, def);
        Ok(())
    }

    pub fn lookup(&self, verb: &str) -> Result<&CommandDef, RegistryError> {
        self.commands
            .get(&verb.to_ascii_uppercase())
            .ok_or_else(|| RegistryError::Unknown(verb.to_string()))
    }

    pub fn verbs(&self) -> Vec<&str> {
        let mut verbs: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        verbs.sort_unstable();
        verbs
    }

    /// Resolves, checks, builds and runs one command line.
    ///
    /// Guarantees a closing reply for every line unless the channel failed.
    pub async fn dispatch(
        &self,
        client: &mut Client,
        line: &str,
    ) -> Result<DispatchOutcome, ControlError> {
        let args = CommandArgs::parse(line);

        let def = match self.lookup(&args.verb) {
            Ok(def) => *def,
            Err(_) => {
                debug!("Unknown command: {}{}", self.prefix, args.verb);
                client
                    .control
                    .reply(ReplyCode::SYNTAX_ERROR, "Command not understood.")
                    .await?;
                return Ok(DispatchOutcome::Unknown);
            }
        };

        if def.requires_login && !client.is_logged_in() {
            client
                .control
                .reply(ReplyCode::NOT_LOGGED_IN, "Please login with USER and PASS.")
                .await?;
            return Ok(DispatchOutcome::Rejected);
        }

        if !def.accepts(args.param_count()) {
            let message = if def.syntax.is_empty() {
                "Syntax error in parameters or arguments.".to_string()
            } else {
                format!("Syntax: {}", def.syntax)
            };
            client
                .control
                .reply(ReplyCode::SYNTAX_ERROR_ARGUMENTS, &message)
                .await?;
            return Ok(DispatchOutcome::Rejected);
        }

        let verb = format!("{}{}", self.prefix, args.verb);
        let arg_str = args.arg_str.clone();
        let command: Box<dyn Command> = (def.factory)(args);

        let replies_before = client.control.final_replies();
        let outcome = command.execute(client).await?;

        if client.control.final_replies() == replies_before {
            error!("{} finished without a reply", verb);
            if client.control.open_sequence().is_some() {
                warn!("{} left a reply sequence open", verb);
            }
            client
                .control
                .reply(
                    ReplyCode::ACTION_ABORTED_LOCAL_ERROR,
                    "Requested action aborted. Local error in processing.",
                )
                .await?;
        }

        if outcome != CommandOutcome::SkipPostScript {
            let context = client.context.clone();
            run_post_hooks(&context.config.post_hooks, &verb, &arg_str, client.username()).await;
        }

        Ok(DispatchOutcome::Executed(outcome))
    }
}
