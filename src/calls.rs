//! The command registry: named, in-process handlers a script can invoke.
//!
//! Handlers come in four shapes, fixed at registration time. Each shape is a
//! variant of [`Handler`], so dispatch in the interpreter is a plain `match`
//! with no runtime signature probing.

use crate::env::Environment;
use anyhow::Result;
use std::collections::HashMap;

/// A callable registered under a command name.
///
/// The shape is chosen once, when the handler is registered; see
/// [`Registry::register`].
pub enum Handler {
    /// No context, no argument, no result.
    Nullary(Box<dyn FnMut()>),
    /// Receives the raw argument text; may fail.
    Text(Box<dyn FnMut(&str) -> Result<()>>),
    /// Receives the script environment and the raw argument text; may fail.
    Scoped(Box<dyn FnMut(&mut Environment, &str) -> Result<()>>),
    /// Read-only query against the environment; the returned string is
    /// printed by the interpreter.
    Query(Box<dyn FnMut(&Environment) -> String>),
}

impl Handler {
    /// Wrap a no-context, no-argument callable.
    pub fn nullary(f: impl FnMut() + 'static) -> Self {
        Handler::Nullary(Box::new(f))
    }

    /// Wrap a callable taking the raw argument text.
    pub fn text(f: impl FnMut(&str) -> Result<()> + 'static) -> Self {
        Handler::Text(Box::new(f))
    }

    /// Wrap a callable taking the environment and the raw argument text.
    pub fn scoped(f: impl FnMut(&mut Environment, &str) -> Result<()> + 'static) -> Self {
        Handler::Scoped(Box::new(f))
    }

    /// Wrap a read-only query returning a string for the interpreter to print.
    pub fn query(f: impl FnMut(&Environment) -> String + 'static) -> Self {
        Handler::Query(Box::new(f))
    }

    /// Human-readable parameter hint, used by the usage listing.
    pub fn params(&self) -> &'static str {
        match self {
            Handler::Nullary(_) => "",
            Handler::Text(_) => "[text]",
            Handler::Scoped(_) => "[text]",
            Handler::Query(_) => "",
        }
    }

    /// Number of parameters the handler declares, counting the environment.
    pub fn arity(&self) -> usize {
        match self {
            Handler::Nullary(_) => 0,
            Handler::Text(_) => 1,
            Handler::Scoped(_) => 2,
            Handler::Query(_) => 1,
        }
    }
}

/// Conversion of a plain function or closure into a [`Handler`].
///
/// The marker parameter `M` exists only to keep the four blanket impls
/// coherent; callers never name it. Any function whose signature matches one
/// of the four shapes converts implicitly at the [`Registry::register`] call
/// site.
pub trait IntoHandler<M> {
    fn into_handler(self) -> Handler;
}

/// Shape markers for [`IntoHandler`].
pub mod shape {
    pub struct Nullary;
    pub struct Text;
    pub struct Scoped;
    pub struct Query;
}

impl<F> IntoHandler<shape::Nullary> for F
where
    F: FnMut() + 'static,
{
    fn into_handler(self) -> Handler {
        Handler::Nullary(Box::new(self))
    }
}

impl<F> IntoHandler<shape::Text> for F
where
    F: FnMut(&str) -> Result<()> + 'static,
{
    fn into_handler(self) -> Handler {
        Handler::Text(Box::new(self))
    }
}

impl<F> IntoHandler<shape::Scoped> for F
where
    F: FnMut(&mut Environment, &str) -> Result<()> + 'static,
{
    fn into_handler(self) -> Handler {
        Handler::Scoped(Box::new(self))
    }
}

impl<F> IntoHandler<shape::Query> for F
where
    F: FnMut(&Environment) -> String + 'static,
{
    fn into_handler(self) -> Handler {
        Handler::Query(Box::new(self))
    }
}

/// A registry entry: the declared name, the handler, and whether the command
/// shows up in usage listings.
pub struct Call {
    name: String,
    pub(crate) handler: Handler,
    exported: bool,
}

impl Call {
    /// The case-preserved name the handler was declared under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the declared name begins with an uppercase letter. Only the
    /// usage listing cares; dispatch never does.
    pub fn exported(&self) -> bool {
        self.exported
    }

    /// Parameter hint for the usage listing.
    pub fn params(&self) -> &'static str {
        self.handler.params()
    }
}

/// Maps case-folded command names to handlers.
///
/// Lookup is case-insensitive: `Cd`, `cd` and `CD` all resolve to the same
/// entry. A name may be registered exactly once; a second registration under
/// the same folded name is a defect in the embedding program and panics
/// immediately rather than silently shadowing a command.
#[derive(Default)]
pub struct Registry {
    calls: HashMap<String, Call>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the built-in commands
    /// (`cd`, `mkdir`, `pushd`, `popd`, `rm`, `rmdir`, `set`, `echo`, `getwd`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtin::install(&mut registry);
        registry
    }

    /// Register `handler` under `name`.
    ///
    /// The shape is inferred from the handler's signature. Returns `&mut Self`
    /// so registrations chain.
    ///
    /// # Panics
    ///
    /// Panics if a handler is already registered under a name that
    /// case-folds to the same value.
    pub fn register<M>(&mut self, name: impl Into<String>, handler: impl IntoHandler<M>) -> &mut Self {
        self.insert(name, handler.into_handler())
    }

    /// Register an already-wrapped [`Handler`] under `name`.
    ///
    /// Useful for ad-hoc closures built with the [`Handler`] shape
    /// constructors; `register` is the more convenient form for plain
    /// functions.
    ///
    /// # Panics
    ///
    /// Panics on a case-folded name collision, like [`Registry::register`].
    pub fn insert(&mut self, name: impl Into<String>, handler: Handler) -> &mut Self {
        let name = name.into();
        let key = name.to_lowercase();
        if self.calls.contains_key(&key) {
            panic!("cannot register more than one call named '{name}'");
        }
        let exported = name.chars().next().is_some_and(|c| c.is_uppercase());
        self.calls.insert(key, Call { name, handler, exported });
        self
    }

    /// Look up a call by name, case-insensitively.
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Call> {
        self.calls.get_mut(&name.to_lowercase())
    }

    /// True when a call is registered under `name` (case-insensitively).
    pub fn contains(&self, name: &str) -> bool {
        self.calls.contains_key(&name.to_lowercase())
    }

    /// Iterate over all registered calls, e.g. for a usage listing.
    pub fn calls(&self) -> impl Iterator<Item = &Call> {
        self.calls.values()
    }

    /// Number of registered calls.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Register top-level functions under their own identifiers.
///
/// ```
/// use rosh::{register, Registry};
///
/// fn greet(text: &str) -> anyhow::Result<()> {
///     println!("hello {text}");
///     Ok(())
/// }
///
/// let mut registry = Registry::new();
/// register!(registry, greet);
/// assert!(registry.contains("GREET"));
/// ```
#[macro_export]
macro_rules! register {
    ($registry:expr, $($func:ident),+ $(,)?) => {
        $( $registry.register(stringify!($func), $func); )+
    };
}
