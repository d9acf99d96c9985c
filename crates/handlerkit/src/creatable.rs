//! Tagged factory/constructor duality for collaborator construction.
//!
//! Call sites that accept "something that can build a collaborator" take a
//! [`Creatable`]: either a boxed factory closure or a plain constructor
//! function reference. Dispatch is on the variant tag, never on probing
//! the callee's shape.

/// A value that can construct a `T` from arguments `A`.
pub enum Creatable<A, T> {
    /// A factory closure, possibly capturing configuration.
    Factory(Box<dyn Fn(A) -> T + Send + Sync>),
    /// A constructor reference, e.g. an associated `new` function.
    Constructor(fn(A) -> T),
}

impl<A, T> Creatable<A, T> {
    /// Wrap a factory closure.
    pub fn factory(f: impl Fn(A) -> T + Send + Sync + 'static) -> Self {
        Creatable::Factory(Box::new(f))
    }

    /// Wrap a constructor function reference.
    pub fn constructor(f: fn(A) -> T) -> Self {
        Creatable::Constructor(f)
    }

    /// Build a `T`, dispatching on the variant tag.
    pub fn create(&self, args: A) -> T {
        match self {
            Creatable::Factory(f) => f(args),
            Creatable::Constructor(f) => f(args),
        }
    }
}

impl<A, T> std::fmt::Debug for Creatable<A, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Creatable::Factory(_) => f.write_str("Creatable::Factory"),
            Creatable::Constructor(_) => f.write_str("Creatable::Constructor"),
        }
    }
}
