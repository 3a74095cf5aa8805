//! Contracts of the external symbolic exploration engine.
//!
//! The driver does not interpret code itself. Everything it needs from an engine is
//! captured by the [`Explorer`] trait:
//!
//! - resolving a [`MethodHandle`] to an engine-internal [`MethodIdentifier`],
//! - exploring an ordinary method,
//! - interpreting the program entry point,
//! - rendering a final symbolic state as text,
//! - accepting a solver backend.
//!
//! Both exploration operations take a [`Continuation`]. It is a hook point for the
//! engine; the driver always passes [`identity`].

use std::fmt::{Display, Formatter};

use crate::image::MethodHandle;

/// Engine-internal method identifier, produced by [`Explorer::make_method_identifier`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MethodIdentifier(u64);

impl MethodIdentifier {
    pub const fn new(token: u64) -> Self {
        Self(token)
    }

    /// Return the raw metadata token.
    pub const fn token(self) -> u64 {
        self.0
    }
}

impl Display for MethodIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Result of exploring one method: the symbolic result value and the final symbolic state.
///
/// Summaries are immutable once produced by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary<T, S> {
    result: T,
    state: S,
}

impl<T, S> Summary<T, S> {
    pub fn new(result: T, state: S) -> Self {
        Self { result, state }
    }

    pub fn result(&self) -> &T {
        &self.result
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

/// Summary type produced by the explorer `E`.
pub type SummaryOf<E> = Summary<<E as Explorer>::Term, <E as Explorer>::State>;

/// Continuation passed to the engine's exploration operations.
pub type Continuation<'a, E> = &'a dyn Fn(SummaryOf<E>) -> SummaryOf<E>;

/// Identity continuation.
pub fn identity<T>(x: T) -> T {
    x
}

/// Symbolic exploration engine, analyzing one method at a time.
pub trait Explorer {
    /// Symbolic term type, used for method results.
    type Term: Display;
    /// Symbolic program state.
    type State;
    /// Constraint solver backend accepted by [`configure_solver`][Explorer::configure_solver].
    type Solver;
    /// Failure raised while analyzing a method.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Resolve a method handle, or return `None` if the engine has no metadata for it.
    fn make_method_identifier(&self, method: &MethodHandle) -> Option<MethodIdentifier>;

    /// Explore an arbitrary method.
    fn explore(&mut self, id: MethodIdentifier, k: Continuation<'_, Self>) -> Result<SummaryOf<Self>, Self::Error>;

    /// Interpret the program entry point. Must only be called on a static method.
    fn interpret_entry_point(&mut self, id: MethodIdentifier, k: Continuation<'_, Self>) -> Result<SummaryOf<Self>, Self::Error>;

    /// Render a symbolic state as a human-readable heap dump.
    fn dump(&self, state: &Self::State) -> String;

    /// Install the solver backend used for path constraints.
    fn configure_solver(&mut self, solver: Self::Solver);
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_identifier_display() {
        let id = MethodIdentifier::new(0x0600_0001);
        assert_eq!(id.token(), 0x0600_0001);
        assert_eq!(id.to_string(), "0x06000001");
    }

    #[test]
    fn test_identity() {
        let s = Summary::new(42, "heap");
        assert_eq!(identity(s.clone()), s);
        assert_eq!(*s.result(), 42);
        assert_eq!(*s.state(), "heap");
    }
}
