//! Thread-scoped security context.
//!
//! Two pieces of state follow the calling thread:
//!
//! - the current [`Subject`], pushed with [`Security::with_subject`]
//! - the privileged depth, raised only by [`PrivilegedScope`], which is
//!   crate-private and entered exclusively by the privilege gate
//!
//! Both are released by guards, so a panic inside a scope cannot leave the
//! thread elevated or running as another subject.

use super::authz::Subject;
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;

thread_local! {
    static PRIVILEGED_DEPTH: Cell<usize> = const { Cell::new(0) };
    static SUBJECTS: RefCell<Vec<Subject>> = const { RefCell::new(Vec::new()) };
}

/// Access to the thread's security context.
pub struct Security;

impl Security {
    /// Check if the current thread runs inside a privileged scope.
    pub fn is_privileged() -> bool {
        PRIVILEGED_DEPTH.with(|depth| depth.get() > 0)
    }

    /// The innermost subject bound to this thread.
    pub fn current_subject() -> Option<Subject> {
        SUBJECTS.with(|subjects| subjects.borrow().last().cloned())
    }

    /// Run `f` with `subject` as the thread's current subject.
    pub fn with_subject<R>(subject: Subject, f: impl FnOnce() -> R) -> R {
        let _scope = SubjectScope::push(subject);
        f()
    }
}

struct SubjectScope {
    _not_send: PhantomData<*const ()>,
}

impl SubjectScope {
    fn push(subject: Subject) -> Self {
        SUBJECTS.with(|subjects| subjects.borrow_mut().push(subject));
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Drop for SubjectScope {
    fn drop(&mut self) {
        SUBJECTS.with(|subjects| {
            subjects.borrow_mut().pop();
        });
    }
}

/// Elevation held for the lifetime of the guard. Not `Send`: elevation never
/// leaves the thread that acquired it.
pub(crate) struct PrivilegedScope {
    _not_send: PhantomData<*const ()>,
}

impl PrivilegedScope {
    pub(crate) fn enter() -> Self {
        PRIVILEGED_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Drop for PrivilegedScope {
    fn drop(&mut self) {
        PRIVILEGED_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}
