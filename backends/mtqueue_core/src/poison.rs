//! A poisoned lock means some thread panicked mid-mutation, so the shared
//! state can no longer be verified. We log and abort instead of recovering.

use std::sync::{Condvar, LockResult, Mutex, MutexGuard};

#[cold]
pub(crate) fn abort_poisoned(operation: &'static str) -> ! {
    mtqueue_logs::error!(operation = operation, "synchronization primitive poisoned, aborting process");
    std::process::abort()
}

fn unwrap_or_abort<G>(result: LockResult<G>, operation: &'static str) -> G {
    match result {
        Ok(guard) => guard,
        Err(_) => abort_poisoned(operation),
    }
}

pub(crate) fn lock<'a, T>(mutex: &'a Mutex<T>, operation: &'static str) -> MutexGuard<'a, T> {
    unwrap_or_abort(mutex.lock(), operation)
}

pub(crate) fn wait<'a, T>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
    operation: &'static str,
) -> MutexGuard<'a, T> {
    unwrap_or_abort(condvar.wait(guard), operation)
}
