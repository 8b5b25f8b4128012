// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The Action tree: named, priority-ordered units of work.
//!
//! Running an [`Action`] evaluates its lambdas, calls its function with the
//! merged arguments, then runs every child in ascending priority order with
//! the same arguments. A node without a function only sequences its children.
//!
//! Priorities are resolved when a child is registered. Ties keep insertion
//! order. An Action has at most one parent; moving it requires an explicit
//! [`Action::detach`] first.

use crate::args::{ArgValue, Args};
use crate::error::{ActionError, TreeError};
use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
};

/// The work bound to an Action.
pub type ActionFn = Arc<dyn Fn(&Args) -> anyhow::Result<()> + Send + Sync>;

/// A zero-argument argument provider, evaluated on every run.
pub type Provider = Arc<dyn Fn() -> ArgValue + Send + Sync>;

/// Named argument that enables the call-tree trace.
pub const CALLTREE_FLAG: &str = "calltree";

const CALLTREE_TARGET: &str = "cadence::calltree";

static NEXT_ACTION_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(u64);

impl ActionId {
    fn next() -> Self {
        Self(NEXT_ACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The object an Action belongs to, as reported in traces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerInfo {
    /// Name of the owning object.
    pub name: String,
    /// Type of the owning object, such as `Environment`.
    pub kind: String,
}

struct ChildEntry {
    key: String,
    seq: u64,
    priority: i32,
    action: Action,
}

struct Node {
    name: String,
    key: String,
    function: Option<ActionFn>,
    parameters: BTreeMap<String, ArgValue>,
    lambdas: Vec<(String, Provider)>,
    owner: Option<OwnerInfo>,
    parent: Option<Weak<ActionInner>>,
    children: Vec<ChildEntry>,
    next_seq: u64,
    priority: i32,
    frequency: u32,
    invocations: u64,
}

impl Node {
    fn sort_children(&mut self) {
        self.children.sort_by_key(|c| (c.priority, c.seq));
    }
}

struct ActionInner {
    id: ActionId,
    node: Mutex<Node>,
}

/// A node of the scheduling tree.
///
/// `Action` is a shared handle: clones refer to the same node. Locks are
/// never held while a function or a child runs.
#[derive(Clone)]
pub struct Action {
    inner: Arc<ActionInner>,
}

impl Action {
    /// Default priority of a new Action.
    pub const DEFAULT_PRIORITY: i32 = 1;

    /// Creates a detached Action without a function.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(ActionId::next(), name.into())
    }

    /// Creates an Action named `action_<id>`.
    pub fn unnamed() -> Self {
        let id = ActionId::next();
        Self::with_id(id, format!("action_{id}"))
    }

    /// Creates a grouping node without a function.
    pub fn phase(name: impl Into<String>) -> Self {
        Self::new(name)
    }

    fn with_id(id: ActionId, name: String) -> Self {
        Self {
            inner: Arc::new(ActionInner {
                id,
                node: Mutex::new(Node {
                    key: name.clone(),
                    name,
                    function: None,
                    parameters: BTreeMap::new(),
                    lambdas: Vec::new(),
                    owner: None,
                    parent: None,
                    children: Vec::new(),
                    next_seq: 0,
                    priority: Self::DEFAULT_PRIORITY,
                    frequency: 1,
                    invocations: 0,
                }),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Node> {
        self.inner
            .node
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds the function run on every invocation.
    pub fn with_function<F>(self, function: F) -> Self
    where
        F: Fn(&Args) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.set_function(function);
        self
    }

    /// Adds a default named argument, overridden by the caller.
    pub fn with_parameter(self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.set_parameter(key, value);
        self
    }

    /// Adds a named argument computed by `provider` on every run.
    /// Lambda results override both defaults and caller arguments.
    pub fn with_lambda<P>(self, key: impl Into<String>, provider: P) -> Self
    where
        P: Fn() -> ArgValue + Send + Sync + 'static,
    {
        self.set_lambda(key, provider);
        self
    }

    /// Sets the priority; lower values run first.
    pub fn with_priority(self, priority: i32) -> Self {
        self.set_priority(priority);
        self
    }

    /// Runs only on every `frequency`-th invocation. Zero counts as one.
    pub fn with_frequency(self, frequency: u32) -> Self {
        self.lock().frequency = frequency.max(1);
        self
    }

    /// Records the object this Action belongs to.
    pub fn with_owner(self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.lock().owner = Some(OwnerInfo {
            name: name.into(),
            kind: kind.into(),
        });
        self
    }

    /// Registers the new Action under `parent`.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`Action::register`].
    pub fn with_parent(self, parent: &Action) -> Self {
        parent.register(&self);
        self
    }

    /// Replaces the bound function.
    pub fn set_function<F>(&self, function: F)
    where
        F: Fn(&Args) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.lock().function = Some(Arc::new(function));
    }

    /// Sets a default named argument.
    pub fn set_parameter(&self, key: impl Into<String>, value: impl Into<ArgValue>) {
        self.lock().parameters.insert(key.into(), value.into());
    }

    /// Binds a provider whose result overrides every other argument of the
    /// same name.
    pub fn set_lambda<P>(&self, key: impl Into<String>, provider: P)
    where
        P: Fn() -> ArgValue + Send + Sync + 'static,
    {
        let key = key.into();
        let provider: Provider = Arc::new(provider);
        let mut node = self.lock();
        match node.lambdas.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = provider,
            None => node.lambdas.push((key, provider)),
        }
    }

    /// Changes the priority, re-sorting the parent's children if attached.
    pub fn set_priority(&self, priority: i32) {
        let parent = {
            let mut node = self.lock();
            node.priority = priority;
            node.parent.as_ref().and_then(Weak::upgrade)
        };
        if let Some(parent) = parent {
            let mut parent = parent.node.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = parent
                .children
                .iter_mut()
                .find(|c| c.action.inner.id == self.inner.id)
            {
                entry.priority = priority;
            }
            parent.sort_children();
        }
    }

    pub(crate) fn set_owner(&self, owner: OwnerInfo) -> Result<(), TreeError> {
        let mut node = self.lock();
        match &node.owner {
            Some(existing) if *existing != owner => Err(TreeError::AlreadyOwned {
                action: node.name.clone(),
                owner: existing.name.clone(),
            }),
            _ => {
                node.owner = Some(owner);
                Ok(())
            }
        }
    }

    /// The Action's identity.
    pub fn id(&self) -> ActionId {
        self.inner.id
    }

    /// The name the Action was created with.
    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    /// The name under which the parent indexes this Action. Differs from
    /// [`name`](Action::name) when a sibling already used the name.
    pub fn key(&self) -> String {
        self.lock().key.clone()
    }

    /// Position among siblings; lower runs first.
    pub fn priority(&self) -> i32 {
        self.lock().priority
    }

    /// Runs once every `frequency` invocations.
    pub fn frequency(&self) -> u32 {
        self.lock().frequency
    }

    /// The owning object, if any.
    pub fn owner(&self) -> Option<OwnerInfo> {
        self.lock().owner.clone()
    }

    /// The parent, if attached and still alive.
    pub fn parent(&self) -> Option<Action> {
        self.lock()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Action { inner })
    }

    /// Returns `true` while the Action has a live parent.
    pub fn is_attached(&self) -> bool {
        self.parent().is_some()
    }

    /// Returns `true` if a function is bound.
    pub fn has_function(&self) -> bool {
        self.lock().function.is_some()
    }

    /// Children in execution order.
    pub fn children(&self) -> Vec<Action> {
        self.lock()
            .children
            .iter()
            .map(|c| c.action.clone())
            .collect()
    }

    /// Child keys in execution order.
    pub fn child_keys(&self) -> Vec<String> {
        self.lock().children.iter().map(|c| c.key.clone()).collect()
    }

    /// The child registered under `key`.
    pub fn child(&self, key: &str) -> Option<Action> {
        self.lock()
            .children
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.action.clone())
    }

    /// How many times the Action was invoked, including skipped invocations.
    pub fn invocations(&self) -> u64 {
        self.lock().invocations
    }

    /// Attaches `child` below this Action.
    ///
    /// # Panics
    ///
    /// Panics if `child` already has a parent or if the registration would
    /// create a cycle. Use [`try_register`](Action::try_register) to get the
    /// error instead.
    pub fn register(&self, child: &Action) {
        if let Err(e) = self.try_register(child) {
            panic!("{e}");
        }
    }

    /// Attaches every Action of `children`, in order.
    pub fn register_all(&self, children: &[Action]) {
        for child in children {
            self.register(child);
        }
    }

    /// Attaches `child`, returning an error instead of panicking.
    pub fn try_register(&self, child: &Action) -> Result<(), TreeError> {
        if self.is_self_or_descendant_of(child) {
            return Err(TreeError::Cycle {
                child: child.name(),
                parent: self.name(),
            });
        }

        let (name, priority) = {
            let mut node = child.lock();
            if let Some(parent) = node.parent.as_ref().and_then(Weak::upgrade) {
                let parent = Action { inner: parent };
                return Err(TreeError::AlreadyAttached {
                    child: node.name.clone(),
                    parent: parent.name(),
                });
            }
            node.parent = Some(Arc::downgrade(&self.inner));
            (node.name.clone(), node.priority)
        };

        let key = {
            let mut node = self.lock();
            let key = if node.children.iter().any(|c| c.key == name) {
                format!("{name}_{}", child.id())
            } else {
                name
            };
            let seq = node.next_seq;
            node.next_seq += 1;
            node.children.push(ChildEntry {
                key: key.clone(),
                seq,
                priority,
                action: child.clone(),
            });
            node.sort_children();
            log::debug!(
                "Action '{}': registered '{}' (priority={}).",
                node.name,
                key,
                priority
            );
            key
        };
        child.lock().key = key;
        Ok(())
    }

    /// Detaches `child` from this Action.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not registered here.
    pub fn remove(&self, child: &Action) {
        if let Err(e) = self.try_remove(child) {
            panic!("{e}");
        }
    }

    /// Removes every Action of `children`.
    ///
    /// # Panics
    ///
    /// Panics if one of them is not a child.
    pub fn remove_all(&self, children: &[Action]) {
        for child in children {
            self.remove(child);
        }
    }

    /// Detaches `child`, returning an error if it is not a child.
    pub fn try_remove(&self, child: &Action) -> Result<(), TreeError> {
        let removed = {
            let mut node = self.lock();
            let position = node
                .children
                .iter()
                .position(|c| c.action.inner.id == child.inner.id);
            match position {
                Some(position) => {
                    let entry = node.children.remove(position);
                    node.sort_children();
                    log::debug!("Action '{}': removed '{}'.", node.name, entry.key);
                    true
                }
                None => false,
            }
        };
        if !removed {
            return Err(TreeError::NotRegistered {
                child: child.name(),
                parent: self.name(),
            });
        }

        let mut node = child.lock();
        node.parent = None;
        node.key = node.name.clone();
        Ok(())
    }

    /// Detaches this Action from its parent.
    pub fn detach(&self) -> Result<(), TreeError> {
        match self.parent() {
            Some(parent) => parent.try_remove(self),
            None => Err(TreeError::Detached { child: self.name() }),
        }
    }

    fn is_self_or_descendant_of(&self, ancestor: &Action) -> bool {
        let mut current = Some(self.clone());
        while let Some(action) = current {
            if action == *ancestor {
                return true;
            }
            current = action.parent();
        }
        false
    }

    /// Runs the Action with no arguments.
    pub fn call(&self) -> Result<(), ActionError> {
        self.run(&Args::default())
    }

    /// Runs the function, then every child in priority order.
    ///
    /// The first failing function aborts the run; siblings that already ran
    /// are not rolled back.
    pub fn run(&self, args: &Args) -> Result<(), ActionError> {
        let (name, owner, function, parameters, lambdas, children) = {
            let mut node = self.lock();
            let invocation = node.invocations;
            node.invocations += 1;
            if invocation % u64::from(node.frequency) != 0 {
                return Ok(());
            }
            (
                node.name.clone(),
                node.owner.clone(),
                node.function.clone(),
                node.parameters.clone(),
                node.lambdas.clone(),
                node.children
                    .iter()
                    .map(|c| c.action.clone())
                    .collect::<Vec<_>>(),
            )
        };

        let merged = if parameters.is_empty() && lambdas.is_empty() {
            Cow::Borrowed(args)
        } else {
            let evaluated = lambdas.iter().map(|(k, p)| (k.clone(), p())).collect();
            Cow::Owned(args.merged(&parameters, evaluated))
        };
        let merged: &Args = &merged;

        if merged.flag(CALLTREE_FLAG) {
            match &owner {
                Some(owner) => log::info!(
                    target: CALLTREE_TARGET,
                    "Action: \"{}\" Object: \"{}\": {}",
                    name,
                    owner.name,
                    owner.kind
                ),
                None => log::info!(target: CALLTREE_TARGET, "Action: \"{name}\" Object: None"),
            }
        }

        if let Some(function) = function {
            function(merged).map_err(|source| ActionError::Failed {
                action: name.clone(),
                source,
            })?;
        }

        for child in &children {
            child.run(merged)?;
        }
        Ok(())
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Action {}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.lock();
        f.debug_struct("Action")
            .field("id", &self.inner.id)
            .field("name", &node.name)
            .field("priority", &node.priority)
            .field("children", &node.children.len())
            .finish()
    }
}
