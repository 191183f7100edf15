//! Read model trait for query-side views.

/// A view that can be asked how many rows it holds.
///
/// `count` must not block: implementations report 0 while a writer holds the
/// lock rather than waiting for it.
pub trait ReadModel: Send + Sync {
    fn name(&self) -> &'static str;

    fn count(&self) -> usize;
}
