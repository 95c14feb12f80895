//! A tiny, embeddable line-script runner.
//!
//! This crate executes blocks of newline-separated text: each non-empty,
//! non-comment line is one command, dispatched either to an in-process
//! handler registered under that name or to an external OS process. Across
//! the lines of a run the engine maintains a directory stack and a table of
//! named string variables used for `${NAME}` substitution.
//!
//! The main entry points are the [`run`] convenience function and the
//! [`Script`] engine, which accepts a custom [`Registry`] of handlers and an
//! injectable failure policy. See [`register!`] for hooking your own
//! functions up to script commands.
//!
//! ```no_run
//! rosh::run("
//!     # variables and builtins run in-process
//!     set place = scripts
//!     mkdir /tmp/${place}
//!     cd /tmp/${place}
//!     getwd
//!
//!     // anything unregistered becomes an external process
//!     git status
//! ");
//! ```

mod builtin;
pub mod calls;
pub mod env;
mod external;
mod interpreter;
mod lexer;

pub use calls::{Call, Handler, IntoHandler, Registry};
pub use env::{DirStack, Environment};
pub use interpreter::{run, CommandError, FailureHandler, Flow, Script};
