//! Fallback execution of command lines as external OS processes.
//!
//! Any line whose first word matches no registered call lands here: the line
//! is split into words, the program is resolved against the script's own
//! `PATH` variable, and the child runs with the directory-stack head as its
//! working directory and the variable table as its entire environment.

use crate::env::Environment;
use crate::lexer;
use anyhow::{bail, Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Execute one already-expanded command line as an external process.
///
/// Standard input, output and error are inherited from the host process; the
/// call blocks until the child exits. A program that cannot be resolved,
/// fails to start, or exits non-zero all surface as a plain error — the
/// distinction is not interesting to the interpreter.
pub(crate) fn exec_line(env: &Environment, line: &str) -> Result<()> {
    let words = lexer::split_words(line);
    let Some((program, args)) = words.split_first() else {
        bail!("empty command line");
    };

    let search_paths = env.get_var("PATH").unwrap_or("");
    let Some(executable) = find_command_path(search_paths, env.cwd(), Path::new(program)) else {
        bail!("command not found: {program}");
    };

    let status = Command::new(&executable)
        .args(args)
        .current_dir(env.cwd())
        .env_clear()
        .envs(env.vars())
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("can't start {}", executable.display()))?;

    if !status.success() {
        bail!("'{program}' failed: {status}");
    }
    Ok(())
}

/// Resolve a command path the way a typical shell would, except that relative
/// paths are taken against `cwd` (the directory-stack head) rather than the
/// host process working directory.
///
/// Behavior:
/// - Absolute path: returned if it exists.
/// - Path with multiple components (e.g. `bin/sh`) or a `./` prefix: joined
///   against `cwd` and returned if it exists.
/// - Single component: search each directory in `search_paths` (PATH) and
///   return the first existing match.
/// - Empty path: `None`.
pub(crate) fn find_command_path(search_paths: &str, cwd: &Path, path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }
    if path.is_absolute() {
        return find_by_path(path.to_path_buf());
    }

    let mut components = path.components();
    let single_component = components.next().is_some() && components.next().is_none();
    if single_component && !path.starts_with("./") {
        find_in_path(search_paths, path.as_os_str())
    } else {
        find_by_path(cwd.join(path))
    }
}

fn find_in_path(search_paths: &str, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find_map(find_by_path)
}

fn find_by_path(path: PathBuf) -> Option<PathBuf> {
    if path.exists() { Some(path) } else { None }
}
