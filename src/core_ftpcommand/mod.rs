pub mod command;
pub mod handlers;
pub mod hooks;
pub mod registry;
pub mod site;
pub mod utils;

// One module per FTP verb.
pub mod allo;
pub mod auth;
pub mod cdup;
pub mod cwd;
pub mod dele;
pub mod feat;
pub mod list;
pub mod mdtm;
pub mod mkd;
pub mod noop;
pub mod pass;
pub mod pbsz;
pub mod prot;
pub mod pwd;
pub mod quit;
pub mod retr;
pub mod rmd;
pub mod rnfr;
pub mod rnto;
pub mod size;
pub mod stor;
pub mod stou;
pub mod syst;
pub mod type_;
pub mod user;

pub use command::{Command, CommandArgs, CommandFactory, CommandOutcome};
pub use registry::{CommandDef, CommandRegistry, DispatchOutcome, RegistryError};
