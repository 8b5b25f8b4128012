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

//! Entities owning an Action namespace and the standard lifecycle actions.

use crate::action::{Action, ActionId, OwnerInfo};
use crate::clock::SimClock;
use crate::error::TreeError;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// The lifecycle actions every scheduled object carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// `_entry`, runs before anything else in a tick.
    Entry,
    /// `_exit`, runs after everything else in a tick.
    Exit,
    /// `_start`, runs once when a run begins.
    Start,
    /// `_pause`, runs when the run is paused.
    Pause,
    /// `_stop`, runs when the run ends.
    Stop,
    /// `_init`, resets the object to its initial conditions.
    Init,
}

impl Lifecycle {
    /// All lifecycle actions in declaration order.
    pub const ALL: [Lifecycle; 6] = [
        Lifecycle::Entry,
        Lifecycle::Exit,
        Lifecycle::Start,
        Lifecycle::Pause,
        Lifecycle::Stop,
        Lifecycle::Init,
    ];

    /// The action name used in the object's namespace.
    pub fn name(self) -> &'static str {
        match self {
            Lifecycle::Entry => "_entry",
            Lifecycle::Exit => "_exit",
            Lifecycle::Start => "_start",
            Lifecycle::Pause => "_pause",
            Lifecycle::Stop => "_stop",
            Lifecycle::Init => "_init",
        }
    }

    /// Looks up a lifecycle action by its `_`-prefixed name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Scheduling state embedded in every [`ScheduledObject`].
#[derive(Debug)]
pub struct SchedulingData {
    name: String,
    kind: String,
    actions: Vec<(String, Action)>,
    lifecycle: [Action; 6],
    ticks: Arc<AtomicU64>,
    clock: SimClock,
    children: Vec<(String, ActionId)>,
}

impl SchedulingData {
    /// Creates the namespace with the six lifecycle actions, owned by an
    /// object called `name` of type `kind`.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        let name = name.into();
        let kind = kind.into();
        let lifecycle = Lifecycle::ALL.map(|l| Action::new(l.name()).with_owner(&name, &kind));
        let actions = Lifecycle::ALL
            .iter()
            .map(|l| (l.name().to_string(), lifecycle[l.index()].clone()))
            .collect();
        Self {
            name,
            kind,
            actions,
            lifecycle,
            ticks: Arc::new(AtomicU64::new(0)),
            clock: SimClock::default(),
            children: Vec::new(),
        }
    }

    /// The object name, used as owner of its actions.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The object type, shown in calltree traces.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The clock this object and its actions read.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Replaces the object's own clock. Children attached later follow it.
    pub fn set_clock(&mut self, clock: SimClock) {
        self.clock = clock;
    }

    /// The local tick counter, shared so actions can advance it.
    pub fn tick_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.ticks)
    }

    /// Current value of the local tick counter.
    pub fn tick(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// One of the six lifecycle actions.
    pub fn lifecycle(&self, which: Lifecycle) -> &Action {
        &self.lifecycle[which.index()]
    }

    /// Looks up a registered action by name.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    /// The namespace in registration order.
    pub fn actions(&self) -> impl Iterator<Item = (&str, &Action)> + '_ {
        self.actions.iter().map(|(n, a)| (n.as_str(), a))
    }

    /// Names of the registered child objects.
    pub fn children(&self) -> impl Iterator<Item = &str> + '_ {
        self.children.iter().map(|(n, _)| n.as_str())
    }

    /// Binds `action` into the namespace and makes this object its owner.
    ///
    /// Fails if the name is taken or the action already has an owner.
    pub fn try_register_action(&mut self, action: Action) -> Result<Action, TreeError> {
        let name = action.name();
        if self.action(&name).is_some() {
            return Err(TreeError::DuplicateName {
                object: self.name.clone(),
                name,
            });
        }
        action.set_owner(OwnerInfo {
            name: self.name.clone(),
            kind: self.kind.clone(),
        })?;
        log::debug!("Object '{}': registered action '{}'.", self.name, name);
        self.actions.push((name, action.clone()));
        Ok(action)
    }
}

/// An entity owning a local Action sub-tree.
///
/// Implementors embed a [`SchedulingData`] and expose it; everything else is
/// provided.
pub trait ScheduledObject {
    /// The embedded scheduling state.
    fn scheduling(&self) -> &SchedulingData;

    /// Mutable access to the embedded scheduling state.
    fn scheduling_mut(&mut self) -> &mut SchedulingData;

    /// Name of the object.
    fn name(&self) -> &str {
        self.scheduling().name()
    }

    /// Binds `action` into the namespace under its name.
    ///
    /// # Panics
    ///
    /// Panics if the name is taken or the action belongs to another object.
    fn register_action(&mut self, action: Action) -> Action {
        match self.scheduling_mut().try_register_action(action) {
            Ok(action) => action,
            Err(e) => panic!("{e}"),
        }
    }

    /// Looks up a registered action by name.
    fn action(&self, name: &str) -> Option<Action> {
        self.scheduling().action(name).cloned()
    }

    /// One of the six lifecycle actions.
    fn lifecycle(&self, which: Lifecycle) -> Action {
        self.scheduling().lifecycle(which).clone()
    }

    /// Hangs the child's lifecycle actions below the matching ones of this
    /// object and makes the child follow this object's clock.
    ///
    /// # Panics
    ///
    /// Panics if the child is already registered somewhere.
    fn register_child(&mut self, child: &mut dyn ScheduledObject) {
        if let Err(e) = self.try_register_child(child) {
            panic!("{e}");
        }
    }

    /// Fallible form of [`register_child`](Self::register_child). Nothing stays
    /// attached when it fails.
    fn try_register_child(&mut self, child: &mut dyn ScheduledObject) -> Result<(), TreeError> {
        let mut attached = Vec::with_capacity(Lifecycle::ALL.len());
        for which in Lifecycle::ALL {
            let parent_action = self.lifecycle(which);
            let child_action = child.lifecycle(which);
            if let Err(e) = parent_action.try_register(&child_action) {
                for (p, c) in attached {
                    let _ = Action::try_remove(&p, &c);
                }
                return Err(e);
            }
            attached.push((parent_action, child_action));
        }

        child
            .scheduling()
            .clock()
            .attach_to(self.scheduling().clock());
        let id = child.lifecycle(Lifecycle::Init).id();
        let child_name = child.name().to_string();
        log::debug!("Object '{}': registered child '{}'.", self.name(), child_name);
        self.scheduling_mut().children.push((child_name, id));
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `child` is not a child of this object.
    fn deregister_child(&mut self, child: &mut dyn ScheduledObject) {
        if let Err(e) = self.try_deregister_child(child) {
            panic!("{e}");
        }
    }

    /// Fallible form of [`deregister_child`](Self::deregister_child).
    fn try_deregister_child(&mut self, child: &mut dyn ScheduledObject) -> Result<(), TreeError> {
        let id = child.lifecycle(Lifecycle::Init).id();
        let Some(position) = self
            .scheduling()
            .children
            .iter()
            .position(|(_, child_id)| *child_id == id)
        else {
            return Err(TreeError::NotAChild {
                child: child.name().to_string(),
                parent: self.name().to_string(),
            });
        };

        for which in Lifecycle::ALL {
            self.lifecycle(which).try_remove(&child.lifecycle(which))?;
        }
        child.scheduling().clock().detach();
        self.scheduling_mut().children.remove(position);
        log::debug!(
            "Object '{}': deregistered child '{}'.",
            self.name(),
            child.name()
        );
        Ok(())
    }

    /// The local tick.
    fn tick(&self) -> u64 {
        self.scheduling().tick()
    }

    /// The tick of the root of the object tree.
    fn tick_global(&self) -> u64 {
        self.scheduling().clock().tick()
    }

    /// Simulated time in seconds, from the global tick.
    fn time(&self) -> f64 {
        self.scheduling().clock().time_secs()
    }
}

/// Attaches every non-lifecycle action of `object` that has no parent yet
/// below `parent`, in namespace order.
pub fn register_actions_into(
    object: &dyn ScheduledObject,
    parent: &Action,
) -> Result<(), TreeError> {
    for (name, action) in object.scheduling().actions() {
        if Lifecycle::from_name(name).is_some() || action.is_attached() {
            continue;
        }
        parent.try_register(action)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Rover {
        scheduling: SchedulingData,
    }

    impl Rover {
        fn new(name: &str) -> Self {
            Self {
                scheduling: SchedulingData::new(name, "Rover"),
            }
        }
    }

    impl ScheduledObject for Rover {
        fn scheduling(&self) -> &SchedulingData {
            &self.scheduling
        }

        fn scheduling_mut(&mut self) -> &mut SchedulingData {
            &mut self.scheduling
        }
    }

    #[test]
    fn lifecycle_actions_exist_and_are_owned() {
        let rover = Rover::new("rover");
        for which in Lifecycle::ALL {
            let action = rover.lifecycle(which);
            assert_eq!(action.name(), which.name());
            assert_eq!(rover.action(which.name()), Some(action.clone()));
            assert_eq!(action.owner().map(|o| o.kind), Some("Rover".to_string()));
        }
    }

    #[test]
    fn namespace_rejects_duplicates_and_foreign_actions() {
        let mut a = Rover::new("a");
        let mut b = Rover::new("b");
        let update = a.register_action(Action::new("update"));
        assert!(matches!(
            a.scheduling_mut().try_register_action(Action::new("update")),
            Err(TreeError::DuplicateName { .. })
        ));
        assert!(matches!(
            b.scheduling_mut().try_register_action(update),
            Err(TreeError::AlreadyOwned { .. })
        ));
    }

    #[test]
    fn child_lifecycle_runs_with_parent() {
        let log: Arc<Mutex<Vec<String>>> = Arc::default();
        let mut parent = Rover::new("parent");
        let mut child = Rover::new("child");
        for (object, label) in [(&parent, "parent"), (&child, "child")] {
            let log = Arc::clone(&log);
            object
                .lifecycle(Lifecycle::Entry)
                .set_function(move |_| {
                    log.lock().unwrap().push(label.to_string());
                    Ok(())
                });
        }

        parent.register_child(&mut child);
        assert_eq!(parent.scheduling().children().collect::<Vec<_>>(), ["child"]);
        parent.lifecycle(Lifecycle::Entry).call().unwrap();
        assert_eq!(*log.lock().unwrap(), ["parent", "child"]);

        parent.deregister_child(&mut child);
        assert!(!child.lifecycle(Lifecycle::Entry).is_attached());
        parent.lifecycle(Lifecycle::Entry).call().unwrap();
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn child_follows_parent_clock() {
        let mut root = Rover::new("root");
        let mut mid = Rover::new("mid");
        let mut leaf = Rover::new("leaf");
        mid.register_child(&mut leaf);
        root.register_child(&mut mid);

        root.scheduling().clock().set_tick(42);
        assert_eq!(leaf.tick_global(), 42);
        assert_eq!(leaf.tick(), 0);

        root.deregister_child(&mut mid);
        assert_eq!(leaf.tick_global(), 0);
    }

    #[test]
    fn registering_a_child_twice_fails_cleanly() {
        let mut a = Rover::new("a");
        let mut b = Rover::new("b");
        let mut child = Rover::new("child");
        a.register_child(&mut child);
        assert!(matches!(
            b.try_register_child(&mut child),
            Err(TreeError::AlreadyAttached { .. })
        ));
        assert!(b.lifecycle(Lifecycle::Entry).children().is_empty());
        assert!(matches!(
            b.try_deregister_child(&mut child),
            Err(TreeError::NotAChild { .. })
        ));
    }

    #[test]
    fn actions_attach_below_a_phase() {
        let mut rover = Rover::new("rover");
        rover.register_action(Action::new("sense").with_priority(2));
        rover.register_action(Action::new("act").with_priority(1));
        let phase = Action::phase("controller");
        register_actions_into(&rover, &phase).unwrap();
        assert_eq!(phase.child_keys(), ["act", "sense"]);
        register_actions_into(&rover, &phase).unwrap();
        assert_eq!(phase.children().len(), 2);
    }
}
