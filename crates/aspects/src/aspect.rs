//! The `Aspect` trait: one cross-cutting guard over reads and writes

use crate::access::Access;

/// A cross-cutting policy applied to every read and write of a data item
///
/// Hooks come in pairs. For each access the chain calls the `before_*`
/// hooks in order until one refuses; afterwards it calls the matching
/// `after_*` hook, in reverse order, on every aspect whose `before_*` hook
/// returned `true`. The `after_*` hook receives the overall decision.
///
/// An aspect that refuses in `before_*` gets no `after_*` call, so it must
/// not hold anything acquired for that access when it returns `false`.
///
/// Aspects are shared by every access to their item, possibly from several
/// threads at once, and keep their own state thread-safe.
pub trait Aspect: Send + Sync {
    /// Short name, used in diagnostics
    fn name(&self) -> &str;

    /// Decide whether the candidate in `access` may be stored
    fn before_write(&self, _access: &Access<'_>) -> bool {
        true
    }

    /// Cleanup after a write attempt
    fn after_write(&self, _permitted: bool, _access: &Access<'_>) {}

    /// Decide whether the stored value in `access` may be read
    fn before_read(&self, _access: &Access<'_>) -> bool {
        true
    }

    /// Cleanup after a read attempt
    fn after_read(&self, _permitted: bool, _access: &Access<'_>) {}
}
