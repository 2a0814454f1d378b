//! A small line-oriented command shell.
//!
//! Input lines are split into sub-commands chained with `;`, `&&` and `||`. Each
//! sub-command goes through alias and `$VAR` substitution, then either runs as one of
//! the builtins (`cd`, `exit`, `env`, `setenv`, `unsetenv`, `alias`, `history`, `help`)
//! or is resolved on `PATH` and run as a child process.
//!
//! The main entry point is [`Interpreter`], which drives the loop over a terminal or
//! any buffered reader. The public modules [`command`], [`env`] and [`error`] expose
//! the command model, the environment store and the error taxonomy.

mod alias;
mod builtin;
mod chain;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
mod external;
mod history;
mod interpreter;
mod io_adapters;
mod resolve;
mod session;
mod substitute;

pub use config::{Args, ShellConfig};
pub use env::Environment;
pub use error::ShellError;
/// Just a convenient re-export of the command loop.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
pub use io_adapters::MemWriter;
pub use session::Session;
