use crate::calls::{Handler, Registry};
use crate::env::Environment;
use crate::external;
use std::fmt;

/// What the failure handler wants the engine to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep executing the remaining lines of the current run.
    Continue,
    /// Abandon the remaining lines of the current run.
    Stop,
}

/// A command failure, wrapped with its position in the script.
///
/// `line` is 1-based within the script as split on newlines; `text` is the
/// trimmed line as written, before variable expansion.
#[derive(Debug)]
pub struct CommandError {
    line: usize,
    text: String,
    source: anyhow::Error,
}

impl CommandError {
    /// 1-based line number within the script.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The trimmed, pre-expansion text of the failing line.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The underlying handler or process failure.
    pub fn source(&self) -> &anyhow::Error {
        &self.source
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} [{}]: {:#}", self.line, self.text, self.source)
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Strategy invoked on every wrapped command failure.
pub type FailureHandler = Box<dyn FnMut(CommandError) -> Flow>;

/// The default failure policy: report and terminate the host process.
fn fail_fast(err: CommandError) -> Flow {
    eprintln!("FAIL: {err}");
    std::process::exit(1);
}

/// A line-oriented script engine.
///
/// Each non-empty, non-comment line of a script is one command: after
/// variable expansion its first word is looked up (case-insensitively) in the
/// [`Registry`], and a miss falls through to external process execution. The
/// engine owns the mutable state shared by the lines of a run — the variable
/// table and the directory stack — and survives across [`Script::run`] calls,
/// so `set x = 1` in one run is visible in the next.
///
/// Failures are wrapped with their line number and text and handed to the
/// failure handler, which alone decides whether execution continues. The
/// default handler prints the failure and exits the process; embedding code
/// can install a non-terminating one with [`Script::set_failure_handler`].
///
/// Example
/// ```
/// use rosh::{register, Registry, Script};
///
/// fn shout(text: &str) -> anyhow::Result<()> {
///     println!("{}!", text.to_uppercase());
///     Ok(())
/// }
///
/// let mut registry = Registry::with_builtins();
/// register!(registry, shout);
///
/// let mut script = Script::new(registry);
/// script.run("
///     set who = world
///     shout hello ${who}
/// ");
/// ```
pub struct Script {
    env: Environment,
    registry: Registry,
    on_fail: FailureHandler,
}

impl Script {
    /// Create an engine over `registry` with a fresh [`Environment`] and the
    /// fail-fast default policy.
    pub fn new(registry: Registry) -> Self {
        Self {
            env: Environment::new(),
            registry,
            on_fail: Box::new(fail_fast),
        }
    }

    /// Replace the failure policy.
    ///
    /// The handler receives every wrapped failure and returns a [`Flow`]
    /// telling the engine whether to keep going with the remaining lines.
    pub fn set_failure_handler(&mut self, handler: impl FnMut(CommandError) -> Flow + 'static) {
        self.on_fail = Box::new(handler);
    }

    /// The engine's environment, e.g. to seed variables before a run.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Mutable access to the engine's environment.
    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// The engine's command registry, e.g. for a usage listing.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Execute every command line in `text`.
    ///
    /// Lines are processed strictly in order, one at a time; a line that is
    /// empty after trimming or starts with `//` or `#` is skipped. The call
    /// returns when all lines are consumed or the failure handler said
    /// [`Flow::Stop`].
    pub fn run(&mut self, text: &str) {
        for (num, raw) in text.trim_matches('\n').split('\n').enumerate() {
            let line = raw.replace('\t', " ");
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
                continue;
            }

            let expanded = self.env.expand(line);
            let (first, rest) = split_first_word(&expanded);

            let outcome = match self.registry.lookup_mut(first) {
                Some(call) => match &mut call.handler {
                    Handler::Nullary(f) => {
                        f();
                        Ok(())
                    }
                    Handler::Text(f) => f(rest),
                    Handler::Scoped(f) => f(&mut self.env, rest),
                    Handler::Query(f) => {
                        println!("{}", f(&self.env));
                        Ok(())
                    }
                },
                None => external::exec_line(&self.env, &expanded),
            };

            if let Err(source) = outcome {
                let err = CommandError {
                    line: num + 1,
                    text: line.to_string(),
                    source,
                };
                if (self.on_fail)(err) == Flow::Stop {
                    return;
                }
            }
        }
    }
}

impl Default for Script {
    /// An engine over [`Registry::with_builtins`].
    fn default() -> Self {
        Self::new(Registry::with_builtins())
    }
}

/// Run a script with the built-in commands and the fail-fast default policy.
///
/// Equivalent to `Script::default().run(text)`; the convenient entry point
/// for one-shot scripts.
pub fn run(text: &str) {
    Script::default().run(text);
}

/// Split a line into its first word and the raw remainder after the first
/// space (which may be empty).
fn split_first_word(line: &str) -> (&str, &str) {
    match line.split_once(' ') {
        Some((first, rest)) => (first, rest),
        None => (line, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::cell::RefCell;
    use std::rc::Rc;

    type SeenLog = Rc<RefCell<Vec<String>>>;
    type FailureLog = Rc<RefCell<Vec<(usize, String)>>>;

    /// A script with a `note` recorder, a `boom` failer, and a stopping,
    /// non-exiting failure policy.
    fn recording_script() -> (Script, SeenLog, FailureLog) {
        let seen: SeenLog = Rc::new(RefCell::new(Vec::new()));
        let failures: FailureLog = Rc::new(RefCell::new(Vec::new()));

        let mut registry = Registry::new();
        let log = seen.clone();
        registry.insert(
            "note",
            Handler::text(move |args| {
                log.borrow_mut().push(args.to_string());
                Ok(())
            }),
        );
        registry.insert("boom", Handler::text(|_args| bail!("kaboom")));

        let mut script = Script::new(registry);
        let fail_log = failures.clone();
        script.set_failure_handler(move |err| {
            fail_log.borrow_mut().push((err.line(), err.text().to_string()));
            Flow::Stop
        });

        (script, seen, failures)
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        let (mut script, seen, failures) = recording_script();
        script.run("\n\n   \n\t\n# note comment\n// note comment\nnote real\n");
        assert_eq!(*seen.borrow(), ["real"]);
        assert!(failures.borrow().is_empty());
    }

    #[test]
    fn dispatch_is_case_insensitive() {
        let (mut script, seen, _) = recording_script();
        script.run("NOTE a\nNote b\nnote c");
        assert_eq!(*seen.borrow(), ["a", "b", "c"]);
    }

    #[test]
    fn variables_expand_before_dispatch() {
        let (mut script, seen, _) = recording_script();
        script.env_mut().set_var("name", "world");
        // The command name itself comes out of a variable.
        script.env_mut().set_var("cmd", "note");
        script.run("${cmd} Hello ${name}");
        assert_eq!(*seen.borrow(), ["Hello world"]);
    }

    #[test]
    fn set_then_use_within_one_run() {
        let (mut script, seen, _) = recording_script();
        crate::builtin::install(&mut script.registry);
        script.run("set greeting = hi\nnote ${greeting} there");
        assert_eq!(*seen.borrow(), ["hi there"]);
    }

    #[test]
    fn state_survives_across_runs() {
        let (mut script, seen, _) = recording_script();
        script.env_mut().set_var("x", "carried");
        script.run("note first");
        script.run("note ${x}");
        assert_eq!(*seen.borrow(), ["first", "carried"]);
    }

    #[test]
    fn failing_line_stops_the_rest_under_a_stop_policy() {
        let (mut script, seen, failures) = recording_script();
        script.run("note one\nboom now\nnote never");

        assert_eq!(*seen.borrow(), ["one"]);
        let failures = failures.borrow();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0], (2, "boom now".to_string()));
    }

    #[test]
    fn continue_policy_runs_every_line() {
        let (mut script, seen, _) = recording_script();
        let count = Rc::new(RefCell::new(0));
        let seen_failures = count.clone();
        script.set_failure_handler(move |_err| {
            *seen_failures.borrow_mut() += 1;
            Flow::Continue
        });

        script.run("boom a\nnote b\nboom c\nnote d");
        assert_eq!(*seen.borrow(), ["b", "d"]);
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn error_carries_pre_expansion_text() {
        let (mut script, _, failures) = recording_script();
        script.env_mut().set_var("what", "now");
        script.run("boom ${what}");
        assert_eq!(failures.borrow()[0], (1, "boom ${what}".to_string()));
    }

    #[test]
    fn error_display_names_line_and_text() {
        let err = CommandError {
            line: 2,
            text: "cd /nope".to_string(),
            source: anyhow::anyhow!("no such directory"),
        };
        assert_eq!(err.to_string(), "line 2 [cd /nope]: no such directory");
    }

    #[test]
    fn nullary_and_query_shapes_dispatch() {
        let ticks = Rc::new(RefCell::new(0));
        let tick_count = ticks.clone();

        let mut registry = Registry::new();
        registry.insert(
            "tick",
            Handler::nullary(move || {
                *tick_count.borrow_mut() += 1;
            }),
        );
        registry.insert("where", Handler::query(|env| env.cwd().display().to_string()));

        let mut script = Script::new(registry);
        script.set_failure_handler(|_err| Flow::Stop);
        script.run("tick\nTick\nwhere");
        assert_eq!(*ticks.borrow(), 2);
    }

    #[test]
    fn scoped_handlers_mutate_the_environment() {
        let mut script = Script::default();
        script.set_failure_handler(|_err| Flow::Stop);
        script.run("pushd /a\npushd b\npopd");
        assert_eq!(script.env().cwd(), std::path::Path::new("/a"));
    }

    #[test]
    #[cfg(unix)]
    fn unregistered_word_falls_through_to_a_process() {
        let (mut script, _, failures) = recording_script();
        script.env_mut().set_var("PATH", "/bin:/usr/bin");

        script.run("true");
        assert!(failures.borrow().is_empty());

        script.run("false");
        assert_eq!(failures.borrow().len(), 1);
    }

    #[test]
    fn tabs_normalize_and_trim() {
        let (mut script, seen, _) = recording_script();
        script.run("\t note  indented ");
        assert_eq!(*seen.borrow(), [" indented"]);
    }
}
