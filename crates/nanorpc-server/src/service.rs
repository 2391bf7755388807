use std::sync::Arc;

use crate::method_table::MethodDescriptor;

/// A receiver that exposes a group of endpoints at once.
///
/// Implementors list their endpoints, usually by binding their own
/// methods with [`MethodDescriptor::method`] and
/// [`MethodDescriptor::method_by_ref`]. Names starting with `_` are treated
/// as non-public and skipped by [`MethodTable::register_all`].
///
/// [`MethodTable::register_all`]: crate::MethodTable::register_all
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use nanorpc_server::{MethodDescriptor, Server, Service};
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// impl Greeter {
///     fn greet(&self, name: String) -> Result<String, String> {
///         Ok(format!("{} {}", self.greeting, name))
///     }
/// }
///
/// impl Service for Greeter {
///     fn endpoints(self: Arc<Self>) -> Vec<MethodDescriptor> {
///         vec![MethodDescriptor::method(self, "greet", Greeter::greet)]
///     }
/// }
///
/// let server = Server::new();
/// let registered = server.register_all(Arc::new(Greeter { greeting: "hi".into() }));
/// assert_eq!(registered, 1);
/// ```
pub trait Service: Send + Sync + 'static {
    fn endpoints(self: Arc<Self>) -> Vec<MethodDescriptor>;
}
