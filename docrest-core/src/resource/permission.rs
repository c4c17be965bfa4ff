//! Permission hooks.
//!
//! A hook is any callable that inspects the incoming request and either lets it
//! through or returns a [`PermissionDenied`] with its own status and message. Hooks
//! run before a behavior reads or writes anything. Object hooks run after the
//! targeted record is loaded and before it is returned, rewritten or removed.

use bson::Document;
use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    error::PermissionDenied,
    request::{RequestArgs, Verb},
};

/// What a hook gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    /// Name of the resource (its collection).
    pub resource: &'a str,
    pub verb: Verb,
    pub args: &'a RequestArgs,
}

pub type Hook = Arc<dyn Fn(&HookContext<'_>) -> Result<(), PermissionDenied> + Send + Sync>;

/// A hook that also sees the stored record a request targets.
pub type ObjectHook = Arc<dyn Fn(&HookContext<'_>, &Document) -> Result<(), PermissionDenied> + Send + Sync>;

/// Permission hooks configured on a resource.
///
/// # Example
///
/// ```ignore
/// use docrest::resource::permission::Permissions;
/// use docrest::request::Verb;
/// use docrest::error::PermissionDenied;
///
/// let permissions = Permissions::per_verb()
///     .on(Verb::Delete, |ctx| match ctx.args.query_values("token").next() {
///         Some("admin") => Ok(()),
///         _ => Err(PermissionDenied::forbidden("admins only")),
///     });
/// ```
#[derive(Clone, Default)]
pub enum Permissions {
    /// Every request is allowed.
    #[default]
    None,
    /// One hook for every verb.
    Single(Hook),
    /// Hooks for every verb, run in order; all must pass.
    All(Vec<Hook>),
    /// Hooks per verb, run in order; verbs without hooks are allowed.
    PerVerb(HashMap<Verb, Vec<Hook>>),
}

impl Permissions {
    pub fn single<F>(hook: F) -> Self
    where
        F: Fn(&HookContext<'_>) -> Result<(), PermissionDenied> + Send + Sync + 'static,
    {
        Permissions::Single(Arc::new(hook))
    }

    pub fn all(hooks: impl IntoIterator<Item = Hook>) -> Self {
        Permissions::All(hooks.into_iter().collect())
    }

    pub fn per_verb() -> Self {
        Permissions::PerVerb(HashMap::new())
    }

    /// Appends a hook for `verb`.
    ///
    /// Hooks already configured for every verb are kept and run first.
    pub fn on<F>(self, verb: Verb, hook: F) -> Self
    where
        F: Fn(&HookContext<'_>) -> Result<(), PermissionDenied> + Send + Sync + 'static,
    {
        let hook: Hook = Arc::new(hook);

        let mut by_verb = match self {
            Permissions::PerVerb(map) => map,
            Permissions::None => HashMap::new(),
            Permissions::Single(shared) => Self::spread(vec![shared]),
            Permissions::All(shared) => Self::spread(shared),
        };
        by_verb.entry(verb).or_default().push(hook);

        Permissions::PerVerb(by_verb)
    }

    fn spread(shared: Vec<Hook>) -> HashMap<Verb, Vec<Hook>> {
        [Verb::Get, Verb::Post, Verb::Put, Verb::Patch, Verb::Delete]
            .into_iter()
            .map(|verb| (verb, shared.clone()))
            .collect()
    }

    /// Runs the hooks that apply to `ctx.verb`, stopping at the first denial.
    pub fn check(&self, ctx: &HookContext<'_>) -> Result<(), PermissionDenied> {
        let hooks: &[Hook] = match self {
            Permissions::None => &[],
            Permissions::Single(hook) => std::slice::from_ref(hook),
            Permissions::All(hooks) => hooks,
            Permissions::PerVerb(by_verb) => by_verb
                .get(&ctx.verb)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        };

        hooks
            .iter()
            .try_for_each(|hook| hook(ctx))
    }
}

/// Record-aware hooks, run in order; all must pass.
#[derive(Clone, Default)]
pub struct ObjectPermissions {
    hooks: Vec<ObjectHook>,
}

impl ObjectPermissions {
    pub fn push<F>(&mut self, hook: F)
    where
        F: Fn(&HookContext<'_>, &Document) -> Result<(), PermissionDenied> + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
    }

    pub fn check(&self, ctx: &HookContext<'_>, record: &Document) -> Result<(), PermissionDenied> {
        self.hooks
            .iter()
            .try_for_each(|hook| hook(ctx, record))
    }
}

impl fmt::Debug for ObjectPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectPermissions({} hooks)", self.hooks.len())
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permissions::None => f.write_str("None"),
            Permissions::Single(_) => f.write_str("Single(..)"),
            Permissions::All(hooks) => write!(f, "All({} hooks)", hooks.len()),
            Permissions::PerVerb(by_verb) => f
                .debug_map()
                .entries(by_verb.iter().map(|(verb, hooks)| (verb, hooks.len())))
                .finish(),
        }
    }
}
