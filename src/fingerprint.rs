//! Stable content hash of an exception used as a dedup key (spec.md §4.3).

use sha2::{Digest, Sha256};

use crate::event::SerializedException;

/// Computes a stable hex digest over an exception's fully-qualified type,
/// message, and normalized stack frames (`Type.Method`, no paths or line
/// numbers), so logically-equivalent exceptions from different processes
/// collide intentionally.
pub struct ExceptionFingerprint;

impl ExceptionFingerprint {
    /// Digest of an exception. Absent stack trace is permitted; the digest
    /// is still returned, computed over just type and message.
    pub fn compute(exception: &SerializedException) -> String {
        let mut hasher = Sha256::new();
        hasher.update(exception.type_name.as_bytes());
        hasher.update(b"\0");
        hasher.update(exception.message.as_bytes());
        for frame in exception.normalized_frames() {
            hasher.update(b"\0");
            hasher.update(frame.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Digest of a plain message body, used as `LogEvent::id` when no
    /// exception is present (spec.md §3 invariant (b)).
    pub fn compute_body(body: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(body.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_logical_exceptions_collide() {
        let a = SerializedException::new("System.InvalidOperationException", "boom")
            .with_stack_trace("at MyApp.Service.DoWork(Int32 x) in /a/service.cs:line 10");
        let b = SerializedException::new("System.InvalidOperationException", "boom")
            .with_stack_trace("at MyApp.Service.DoWork(Int32 y) in /b/service.cs:line 99");
        assert_eq!(
            ExceptionFingerprint::compute(&a),
            ExceptionFingerprint::compute(&b)
        );
    }

    #[test]
    fn different_message_changes_digest() {
        let a = SerializedException::new("T", "one");
        let b = SerializedException::new("T", "two");
        assert_ne!(
            ExceptionFingerprint::compute(&a),
            ExceptionFingerprint::compute(&b)
        );
    }

    #[test]
    fn different_type_changes_digest() {
        let a = SerializedException::new("TypeA", "msg");
        let b = SerializedException::new("TypeB", "msg");
        assert_ne!(
            ExceptionFingerprint::compute(&a),
            ExceptionFingerprint::compute(&b)
        );
    }

    #[test]
    fn absent_stack_trace_still_produces_digest() {
        let exc = SerializedException::new("T", "m");
        let digest = ExceptionFingerprint::compute(&exc);
        assert_eq!(digest.len(), 64);
    }
}
