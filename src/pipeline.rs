//! Result-threading function composition
//!
//! A [`Pipeline`] runs an ordered list of steps against the same input.
//! Every step sees the original input plus whatever the earlier steps
//! produced so far, so a chain like "build config → log → persist → restart"
//! can mix value-producing steps with pure side effects:
//!
//! ```
//! use typofix::pipeline::{Pipeline, Step};
//! use std::convert::Infallible;
//!
//! let mut pipeline = Pipeline::<i32, i32, Infallible>::new()
//!     .then(|_, x| Ok(Step::Emit(x + 1)))
//!     .then(|_, _| Ok(Step::Skip))
//!     .then(|prev, x| Ok(Step::Emit(prev.value().copied().unwrap_or(0) + x)));
//!
//! assert_eq!(pipeline.run(&10).unwrap().into_value(), Some(21));
//! ```
//!
//! Errors are not handled here: the first failing step aborts the run and
//! its error is returned to the caller.

use std::convert::Infallible;

/// What a single step contributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    /// Nothing to contribute; the previously recorded result is kept
    Skip,
    /// The step computed a meaningful empty result, replacing any previous one
    Empty,
    /// A new result that later steps will receive
    Emit(T),
}

/// The result threaded between steps
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Carry<T> {
    /// No step has produced anything yet
    #[default]
    Pending,
    /// A step explicitly produced an empty result
    Empty,
    /// The latest value produced
    Value(T),
}

impl<T> Carry<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Carry::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Carry::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Carry::Pending)
    }
}

type StepFn<'a, A, T, E> = Box<dyn FnMut(&Carry<T>, &A) -> Result<Step<T>, E> + 'a>;

/// Ordered composition of steps sharing one input
pub struct Pipeline<'a, A: ?Sized, T, E = Infallible> {
    steps: Vec<StepFn<'a, A, T, E>>,
}

impl<'a, A: ?Sized, T, E> Pipeline<'a, A, T, E> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step
    pub fn then<F>(mut self, step: F) -> Self
    where
        F: FnMut(&Carry<T>, &A) -> Result<Step<T>, E> + 'a,
    {
        self.steps.push(Box::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order against `input`
    ///
    /// The first step always sees [`Carry::Pending`]. The returned carry is
    /// the last non-skipped contribution, or `Pending` when every step
    /// skipped (including the empty pipeline).
    pub fn run(&mut self, input: &A) -> Result<Carry<T>, E> {
        let mut carry = Carry::Pending;
        for step in &mut self.steps {
            match step(&carry, input)? {
                Step::Skip => {}
                Step::Empty => carry = Carry::Empty,
                Step::Emit(value) => carry = Carry::Value(value),
            }
        }
        Ok(carry)
    }
}

impl<A: ?Sized, T, E> Default for Pipeline<'_, A, T, E> {
    fn default() -> Self {
        Self::new()
    }
}
