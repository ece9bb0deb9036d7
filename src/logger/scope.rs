//! Per-context scope stack (spec.md §4.9, §9 "Scope stack across threads").
//!
//! Backed by a thread-local, in the spirit of the ambient task-local
//! storage used elsewhere in this codebase for request-scoped state rather
//! than a value threaded explicitly through every call. Scopes captured
//! when a record is built reflect only the calling thread's stack;
//! cross-thread propagation is not attempted.

use std::cell::RefCell;

thread_local! {
    static SCOPES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Disposable handle returned by [`begin_scope`]. Popping happens on drop,
/// so scopes nest correctly even if the caller returns early or panics.
#[must_use = "dropping this immediately ends the scope"]
pub struct ScopeGuard {
    _private: (),
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPES.with(|scopes| {
            scopes.borrow_mut().pop();
        });
    }
}

/// Push `state` onto the current thread's scope stack. The returned guard
/// pops it when dropped.
pub fn begin_scope(state: impl Into<String>) -> ScopeGuard {
    SCOPES.with(|scopes| scopes.borrow_mut().push(state.into()));
    ScopeGuard { _private: () }
}

/// Render the current stack as the `"[Scopes: S1 | S2 | …] "` prefix, or an
/// empty string when no scope is active.
pub fn capture_prefix() -> String {
    SCOPES.with(|scopes| {
        let scopes = scopes.borrow();
        if scopes.is_empty() {
            String::new()
        } else {
            format!("[Scopes: {}] ", scopes.join(" | "))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_scope_is_empty_prefix() {
        assert_eq!(capture_prefix(), "");
    }

    #[test]
    fn s3_nested_scopes_render_in_order() {
        let outer = begin_scope("Scope 1");
        let inner = begin_scope("Scope 2");
        assert_eq!(capture_prefix(), "[Scopes: Scope 1 | Scope 2] ");
        drop(inner);
        assert_eq!(capture_prefix(), "[Scopes: Scope 1] ");
        drop(outer);
        assert_eq!(capture_prefix(), "");
    }
}
