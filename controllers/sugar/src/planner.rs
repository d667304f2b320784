//! Broker planning.
//!
//! Pure decision function mapping (selector match, observed broker state) to
//! the action the reconciler must execute. The only action this controller
//! ever takes is creating the default broker: an existing broker is
//! authoritative however it got there, and a namespace that stops matching
//! keeps its broker. Retraction is deliberately out of scope.

/// Action to execute for a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do
    Noop,
    /// Create the default broker
    Create,
}

/// Compute the required action.
///
/// Creates only when the namespace matches and no broker is observed; every
/// other combination is a no-op. Never compares or overwrites an existing
/// broker's fields.
pub fn plan(matches: bool, broker_exists: bool) -> Action {
    if matches && !broker_exists {
        Action::Create
    } else {
        Action::Noop
    }
}
