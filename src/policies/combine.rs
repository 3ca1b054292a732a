//! # Sequenced policies.
//!
//! [`Combine`] runs a list of [`Continuable`] policies one after another: every
//! delay of element `k` is handed out before element `k + 1` becomes active.
//! The sequence always starts with a one-shot initial delay.
//!
//! ```text
//!  cursor ─► [ once(initial) | p0 | p1 | ... | pN ]
//!             1 delay          until exhausted, then advance
//! ```
//!
//! The cursor only moves forward. [`Resettable::reset`] moves it back to the
//! initial delay and resets every element that is resettable (or wraps
//! something resettable), not only the active one.

use std::time::Duration;

use parking_lot::RwLock;

use crate::policies::capability::{Backoff, Continuable, Resettable, as_resettable};

/// Fires its delay once, then reports exhaustion until reset.
#[derive(Debug)]
struct Once {
    delay: Duration,
    used: RwLock<bool>,
}

impl Once {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            used: RwLock::new(false),
        }
    }
}

impl Backoff for Once {
    fn next_delay(&self) -> Duration {
        *self.used.write() = true;
        self.delay
    }

    fn continuable(&self) -> Option<&dyn Continuable> {
        Some(self)
    }

    fn resettable(&self) -> Option<&dyn Resettable> {
        Some(self)
    }
}

impl Continuable for Once {
    fn can_continue(&self) -> bool {
        !*self.used.read()
    }
}

impl Resettable for Once {
    fn reset(&self) {
        *self.used.write() = false;
    }
}

#[derive(Debug)]
struct State {
    cursor: usize,
    last_delay: Duration,
}

/// Sequence of policies exhausted in order.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tinybackoff::{Backoff, Combine, Constant, Continuable, Linear, WithMaxAttempts};
///
/// let ms = Duration::from_millis;
/// let policy = Combine::new(
///     ms(0),
///     vec![
///         Box::new(WithMaxAttempts::new(Constant::new(ms(10)), 2)),
///         Box::new(Linear::new(ms(100), 1, 1)),
///     ],
/// );
///
/// let mut delays = Vec::new();
/// while policy.can_continue() {
///     delays.push(policy.next_delay());
/// }
/// assert_eq!(delays, [ms(0), ms(10), ms(10), ms(100)]);
/// ```
pub struct Combine {
    elements: Vec<Box<dyn Continuable>>,
    state: RwLock<State>,
}

impl Combine {
    /// Builds a sequence starting with a single `initial_delay`, followed by `policies`.
    pub fn new(initial_delay: Duration, policies: Vec<Box<dyn Continuable>>) -> Self {
        let mut elements: Vec<Box<dyn Continuable>> = Vec::with_capacity(policies.len() + 1);
        elements.push(Box::new(Once::new(initial_delay)));
        elements.extend(policies);

        Self {
            elements,
            state: RwLock::new(State {
                cursor: 0,
                last_delay: Duration::ZERO,
            }),
        }
    }

    /// Number of sequenced policies, not counting the initial delay.
    pub fn len(&self) -> usize {
        self.elements.len() - 1
    }

    /// Returns `true` when only the initial delay is sequenced.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn continues_at(&self, cursor: usize) -> bool {
        self.elements[cursor..].iter().any(|element| element.can_continue())
    }
}

impl std::fmt::Debug for Combine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Combine")
            .field("len", &self.len())
            .field("cursor", &state.cursor)
            .field("last_delay", &state.last_delay)
            .finish()
    }
}

impl Backoff for Combine {
    fn next_delay(&self) -> Duration {
        let mut state = self.state.write();
        if !self.continues_at(state.cursor) {
            return state.last_delay;
        }

        let last = self.elements.len() - 1;
        while state.cursor < last && !self.elements[state.cursor].can_continue() {
            state.cursor += 1;
        }

        state.last_delay = self.elements[state.cursor].next_delay();
        state.last_delay
    }

    fn inner(&self) -> Option<&dyn Backoff> {
        let cursor = self.state.read().cursor;
        Some(&self.elements[cursor])
    }

    fn continuable(&self) -> Option<&dyn Continuable> {
        Some(self)
    }

    fn resettable(&self) -> Option<&dyn Resettable> {
        Some(self)
    }
}

impl Continuable for Combine {
    fn can_continue(&self) -> bool {
        let state = self.state.read();
        self.continues_at(state.cursor)
    }
}

impl Resettable for Combine {
    fn reset(&self) {
        let mut state = self.state.write();
        state.cursor = 0;

        for element in &self.elements {
            if let Some(resettable) = as_resettable(element) {
                resettable.reset();
            }
        }
    }
}
