//! Generic memoized thunk. A `LazyEval` pairs a pure function of an
//! argument tuple with a cache keyed by that tuple; the function runs at
//! most once per distinct argument tuple for the lifetime of the node.
//! Nodes are composed by one node's function calling another node — nothing
//! is computed until the outermost query fires.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Wraps an `f64` so it can serve as a `LazyEval` cache key. Equality and
/// hashing go through the bit pattern rather than `PartialEq`/float
/// comparison, which is fine here since keys always come from the same
/// handful of call sites (never from independently-rounded computations).
#[derive(Debug, Clone, Copy)]
pub struct FloatKey(pub f64);

impl PartialEq for FloatKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatKey {}

impl Hash for FloatKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f64> for FloatKey {
    fn from(value: f64) -> Self {
        FloatKey(value)
    }
}

pub struct LazyEval<A, R> {
    f: Box<dyn Fn(&A) -> R>,
    cache: RefCell<HashMap<A, R>>,
}

impl<A, R> LazyEval<A, R>
where
    A: Eq + Hash + Clone,
    R: Clone,
{
    pub fn new(f: impl Fn(&A) -> R + 'static) -> Self {
        Self {
            f: Box::new(f),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the memoized result for `args`, computing it on first use.
    pub fn call(&self, args: A) -> R {
        if let Some(cached) = self.cache.borrow().get(&args) {
            return cached.clone();
        }
        let result = (self.f)(&args);
        self.cache.borrow_mut().insert(args, result.clone());
        result
    }

    /// Number of distinct argument tuples evaluated so far.
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn computes_once_per_argument_tuple() {
        let calls = Rc::new(Cell::new(0));
        let calls_inner = Rc::clone(&calls);
        let node = LazyEval::new(move |x: &i32| {
            calls_inner.set(calls_inner.get() + 1);
            x * 2
        });

        assert_eq!(node.call(3), 6);
        assert_eq!(node.call(3), 6);
        assert_eq!(node.call(4), 8);

        assert_eq!(calls.get(), 2);
        assert_eq!(node.len(), 2);
    }
}
