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

//! Error types of the scheduling kernel.

use crate::scheduler::SchedulerState;
use thiserror::Error;

/// A failure raised while running an Action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The bound function of `action` returned an error. The rest of the
    /// tick was skipped.
    #[error("action '{action}' failed: {source}")]
    Failed {
        /// Name of the innermost failing Action.
        action: String,
        /// The error returned by its function.
        #[source]
        source: anyhow::Error,
    },
}

impl ActionError {
    /// Name of the Action that failed.
    pub fn action(&self) -> &str {
        match self {
            ActionError::Failed { action, .. } => action,
        }
    }
}

/// A violation of the Action tree or object namespace structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The child already has a parent; detach it first.
    #[error("action '{child}' is already attached to '{parent}'")]
    AlreadyAttached {
        /// The Action being registered.
        child: String,
        /// Its current parent.
        parent: String,
    },

    /// The child is not among the parent's children.
    #[error("action '{child}' is not registered under '{parent}'")]
    NotRegistered {
        /// The Action being removed.
        child: String,
        /// The Action it was removed from.
        parent: String,
    },

    /// The parent is the child itself or one of its descendants.
    #[error("registering '{child}' under '{parent}' would create a cycle")]
    Cycle {
        /// The Action being registered.
        child: String,
        /// The would-be parent.
        parent: String,
    },

    /// The Action has no parent to detach from.
    #[error("action '{child}' has no parent")]
    Detached {
        /// The detached Action.
        child: String,
    },

    /// The object's namespace already holds an Action of that name.
    #[error("object '{object}' already has an action named '{name}'")]
    DuplicateName {
        /// The owning object.
        object: String,
        /// The clashing name.
        name: String,
    },

    /// The Action belongs to another object.
    #[error("action '{action}' is already owned by '{owner}'")]
    AlreadyOwned {
        /// The Action being registered.
        action: String,
        /// Its current owner.
        owner: String,
    },

    /// A named lookup in an object's namespace found nothing.
    #[error("object '{object}' has no action named '{name}'")]
    UnknownAction {
        /// The object searched.
        object: String,
        /// The missing name.
        name: String,
    },

    /// The object was never registered as a child of this parent.
    #[error("object '{child}' is not a child of '{parent}'")]
    NotAChild {
        /// The object being deregistered.
        child: String,
        /// The object it was deregistered from.
        parent: String,
    },
}

/// A failure of the [`Scheduler`](crate::Scheduler).
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The operation is not allowed in the current state.
    #[error("cannot {operation} while the scheduler is {state:?}")]
    InvalidState {
        /// The refused operation.
        operation: &'static str,
        /// The state it was refused in.
        state: SchedulerState,
    },

    /// The init action failed.
    #[error("init action failed: {0}")]
    Init(#[source] ActionError),

    /// An Action failed during a tick; the scheduler halted.
    #[error("tick {tick} aborted: {source}")]
    Tick {
        /// The failing tick, counted from 1.
        tick: u64,
        /// The Action failure.
        #[source]
        source: ActionError,
    },

    /// The worker thread running the scheduler panicked.
    #[error("scheduler worker thread panicked")]
    WorkerPanicked,
}
