//! Built-in commands known to the interpreter at compile time.
//!
//! Builtins are plain functions in one of the four [`Handler`] shapes and run
//! in-process, without spawning a child. Filesystem paths always resolve
//! against the head of the directory stack, not the host process working
//! directory.
//!
//! [`Handler`]: crate::Handler

use crate::calls::Registry;
use crate::env::Environment;
use anyhow::{bail, Context, Result};
use std::fs;

/// Register the default catalog.
///
/// Display names are capitalized so the commands show up in usage listings;
/// lookup is case-insensitive, so scripts write `cd`, `mkdir`, and so on.
pub(crate) fn install(registry: &mut Registry) {
    registry
        .register("Cd", cd)
        .register("MkDir", mkdir)
        .register("Pushd", pushd)
        .register("Popd", popd)
        .register("Rm", rm)
        .register("RmDir", rmdir)
        .register("Set", set)
        .register("Echo", echo)
        .register("Getwd", getwd);
}

/// Change the current directory by joining the argument against the stack
/// head. The path is not checked against the filesystem.
fn cd(env: &mut Environment, dir: &str) -> Result<()> {
    env.cd(dir);
    Ok(())
}

/// Create a directory, including missing parents.
fn mkdir(env: &mut Environment, dir: &str) -> Result<()> {
    let path = env.resolve(dir);
    fs::create_dir_all(&path).with_context(|| format!("mkdir: can't create {}", path.display()))
}

/// Push a new current directory, keeping the previous one beneath it.
fn pushd(env: &mut Environment, dir: &str) -> Result<()> {
    env.pushd(dir);
    Ok(())
}

/// Return to the previous directory. Popping the last entry is a no-op.
fn popd(env: &mut Environment, _args: &str) -> Result<()> {
    env.popd();
    Ok(())
}

/// Remove a file.
fn rm(env: &mut Environment, file: &str) -> Result<()> {
    let path = env.resolve(file);
    fs::remove_file(&path).with_context(|| format!("rm: can't remove {}", path.display()))
}

/// Remove a directory and everything beneath it.
fn rmdir(env: &mut Environment, dir: &str) -> Result<()> {
    let path = env.resolve(dir);
    fs::remove_dir_all(&path).with_context(|| format!("rmdir: can't remove {}", path.display()))
}

/// Set a variable from a `name = value` pair; both sides are trimmed.
fn set(env: &mut Environment, pair: &str) -> Result<()> {
    let Some((name, value)) = pair.split_once('=') else {
        bail!("set: expected name = value, got '{pair}'");
    };
    env.set_var(name.trim(), value.trim());
    Ok(())
}

/// Write the raw argument text and a newline to standard output.
fn echo(text: &str) -> Result<()> {
    println!("{text}");
    Ok(())
}

/// The current directory, for the interpreter to print.
fn getwd(env: &Environment) -> String {
    env.cwd().display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn temp_base(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("builtin_tests_{}_{}", std::process::id(), tag))
    }

    fn env_at(dir: &Path) -> Environment {
        let mut env = Environment::new();
        env.cd(dir);
        env
    }

    #[test]
    fn set_splits_on_first_equals_and_trims() {
        let mut env = Environment::new();
        set(&mut env, "name = go=sh ").unwrap();
        assert_eq!(env.get_var("name"), Some("go=sh"));
    }

    #[test]
    fn set_without_equals_is_an_error() {
        let mut env = Environment::new();
        assert!(set(&mut env, "just-a-word").is_err());
    }

    #[test]
    fn cd_joins_without_touching_filesystem() {
        let mut env = env_at(Path::new("/definitely/not/real"));
        cd(&mut env, "deeper").unwrap();
        assert_eq!(env.cwd(), Path::new("/definitely/not/real/deeper"));
    }

    #[test]
    fn mkdir_and_rmdir_resolve_against_stack_head() {
        let base = temp_base("mkdir");
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).expect("create temp base");

        let mut env = env_at(&base);
        mkdir(&mut env, "a/b").unwrap();
        assert!(base.join("a/b").is_dir());

        rmdir(&mut env, "a").unwrap();
        assert!(!base.join("a").exists());

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn rm_reports_missing_file() {
        let mut env = env_at(Path::new("/tmp"));
        let err = rm(&mut env, "no_such_file_for_builtin_tests").unwrap_err();
        assert!(err.to_string().contains("rm: can't remove"));
    }

    #[test]
    fn getwd_reports_head() {
        let mut env = Environment::new();
        env.pushd("/somewhere");
        assert_eq!(getwd(&env), "/somewhere");
    }
}
