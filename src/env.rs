use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Matches `${name}` (anything up to the closing brace) or a bare `$name`
/// (leading letter or underscore, then letters, digits and underscores).
static VAR_RE: OnceLock<Regex> = OnceLock::new();

fn var_re() -> &'static Regex {
    VAR_RE.get_or_init(|| {
        Regex::new(r"\$\{([^}]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .unwrap_or_else(|e| panic!("invalid variable pattern: {e}"))
    })
}

/// Ordered list of working directories; the head is the effective current
/// directory for external processes and filesystem commands.
///
/// The stack is never empty: it is created with one entry and [`DirStack::popd`]
/// refuses to remove the last one.
#[derive(Debug, Clone)]
pub struct DirStack {
    dirs: Vec<PathBuf>,
}

impl DirStack {
    /// Create a stack whose only entry is `initial`.
    pub fn new(initial: PathBuf) -> Self {
        Self {
            dirs: vec![initial],
        }
    }

    /// The current working directory.
    pub fn head(&self) -> &Path {
        // Invariant: `dirs` is never empty.
        self.dirs
            .last()
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new("."))
    }

    /// Replace the head with `head.join(path)`.
    ///
    /// Joining an absolute path replaces the head wholesale, so `cd /tmp`
    /// behaves like a shell would.
    pub fn cd(&mut self, path: impl AsRef<Path>) {
        let next = self.head().join(path);
        if let Some(head) = self.dirs.last_mut() {
            *head = next;
        }
    }

    /// Push `head.join(path)` as the new head, leaving the previous head
    /// reachable beneath it.
    pub fn pushd(&mut self, path: impl AsRef<Path>) {
        let next = self.head().join(path);
        self.dirs.push(next);
    }

    /// Remove the head, exposing the directory beneath it. Popping the last
    /// remaining entry is a no-op.
    pub fn popd(&mut self) {
        if self.dirs.len() > 1 {
            self.dirs.pop();
        }
    }

    /// Number of entries currently on the stack.
    pub fn depth(&self) -> usize {
        self.dirs.len()
    }
}

/// Mutable, user-level view of the process environment threaded through one
/// script run.
///
/// The environment contains:
/// - `vars`: named string variables, seeded from the host process environment,
///   visible to spawned commands and used for `${NAME}` substitution.
/// - `dirs`: the directory stack; its head is the working directory for
///   command execution.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
    dirs: DirStack,
}

impl Environment {
    /// Capture the current process state into a new `Environment`.
    ///
    /// Variables are copied from `std::env::vars()` and the directory stack
    /// starts at `std::env::current_dir()`.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let cwd = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            dirs: DirStack::new(cwd),
        }
    }

    /// Get the value of a variable.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override a variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Iterate over all variables, e.g. to build a child process environment.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The current working directory (head of the directory stack).
    pub fn cwd(&self) -> &Path {
        self.dirs.head()
    }

    /// Resolve `path` against the current working directory. Absolute paths
    /// are returned unchanged.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.cwd().join(path)
    }

    /// Replace the head of the directory stack with `head.join(path)`.
    pub fn cd(&mut self, path: impl AsRef<Path>) {
        self.dirs.cd(path);
    }

    /// Push a new working directory on the stack.
    pub fn pushd(&mut self, path: impl AsRef<Path>) {
        self.dirs.pushd(path);
    }

    /// Pop the current working directory; no-op when only one remains.
    pub fn popd(&mut self) {
        self.dirs.popd();
    }

    /// Depth of the directory stack.
    pub fn dir_depth(&self) -> usize {
        self.dirs.depth()
    }

    /// Replace every `${name}` or `$name` in `line` with the variable's
    /// value, or the empty string when the name is unset.
    ///
    /// A single left-to-right pass; substituted text is not re-scanned, and
    /// expansion never fails. Lines without references are returned borrowed.
    pub fn expand<'a>(&self, line: &'a str) -> Cow<'a, str> {
        var_re().replace_all(line, |caps: &regex::Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or("");
            self.get_var(name).unwrap_or("").to_string()
        })
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
