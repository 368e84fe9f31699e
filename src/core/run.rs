//! Run functions executed by pool workers

use crate::core::error::Result;
use std::fmt;
use std::sync::Arc;

/// Result of one run function invocation.
///
/// Workers log and count failures but otherwise discard the value.
pub type RunOutcome = Result<()>;

/// A function every live worker invokes repeatedly with the pool's shared argument
pub type RunFunction<A> = Arc<dyn Fn(&A) -> RunOutcome + Send + Sync>;

/// Wrap a closure as a [`RunFunction`]
pub fn run_function<A, F>(f: F) -> RunFunction<A>
where
    F: Fn(&A) -> RunOutcome + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The function/argument pair handed to workers on each loop iteration
pub(crate) struct Runner<A> {
    pub(crate) function: RunFunction<A>,
    pub(crate) arg: Arc<A>,
}

impl<A> Clone for Runner<A> {
    fn clone(&self) -> Self {
        Self {
            function: Arc::clone(&self.function),
            arg: Arc::clone(&self.arg),
        }
    }
}

impl<A> Runner<A> {
    pub(crate) fn invoke(&self) -> RunOutcome {
        (self.function)(&self.arg)
    }
}

impl<A> fmt::Debug for Runner<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("function", &"<run function>")
            .finish()
    }
}
