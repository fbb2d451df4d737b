//! Connection state machines, one per role.
//!
//! Each role is a pure transition function over a tagged event enum:
//!
//! ```text
//!   (state, event) ──step──▶ Transition { next, actions[] }
//! ```
//!
//! The function never touches hardware.  It returns the ordered list of
//! side effects the service must perform, which keeps every ordering
//! guarantee (disarm before re-advertise, teardown before rescan)
//! checkable in a plain unit test.

pub mod central;
pub mod peripheral;

use heapless::Vec;

/// Upper bound on side effects emitted by a single transition.
pub const MAX_ACTIONS: usize = 6;

/// Result of feeding one event to a transition function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<S, A> {
    pub from: S,
    pub next: S,
    /// Side effects, to be executed in order.
    pub actions: Vec<A, MAX_ACTIONS>,
}

impl<S: Copy + PartialEq, A> Transition<S, A> {
    /// The event was not legal in `state`; nothing happens.
    pub fn ignored(state: S) -> Self {
        Self {
            from: state,
            next: state,
            actions: Vec::new(),
        }
    }

    pub fn to(from: S, next: S) -> Self {
        Self {
            from,
            next,
            actions: Vec::new(),
        }
    }

    /// Append a side effect.
    pub fn then(mut self, action: A) -> Self {
        // MAX_ACTIONS covers the longest sequence any role emits.
        let _ = self.actions.push(action);
        self
    }

    pub fn changed(&self) -> bool {
        self.from != self.next
    }
}
