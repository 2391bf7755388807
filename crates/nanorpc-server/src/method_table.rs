//! Endpoint registration and lookup.
//!
//! A [`MethodTable`] maps endpoint names to validated [`MethodDescriptor`]s.
//! The shape of a callable (one argument, a `Result` whose error half can be
//! displayed) is enforced by the trait bounds of the registration functions;
//! the only check left for runtime is the endpoint name itself.

use std::any::type_name;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use nanorpc_common::{Codec, DispatchError, RegistrationError};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::service::Service;

type Handler = Box<dyn Fn(&Codec, &[u8]) -> Result<Vec<u8>, DispatchError> + Send + Sync>;

/// How the decoded argument is handed to the callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgPassing {
    /// The callable takes ownership of the decoded value.
    ByValue,
    /// The callable receives `&mut` to the decoded value.
    ByReference,
}

/// Validated metadata and invocation handle of one endpoint.
///
/// Descriptors are immutable once built. The handle performs
/// decode, call and encode in one step.
pub struct MethodDescriptor {
    name: String,
    arg_type: &'static str,
    result_type: &'static str,
    passing: ArgPassing,
    handler: Handler,
}

impl MethodDescriptor {
    /// Describe a callable taking its argument by value.
    pub fn by_value<A, R, E, F>(name: impl Into<String>, callable: F) -> Self
    where
        A: DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: fmt::Display + 'static,
        F: Fn(A) -> Result<R, E> + Send + Sync + 'static,
    {
        let handler = move |codec: &Codec, argument: &[u8]| {
            let value: A = codec
                .decode(argument)
                .map_err(|e| DispatchError::BadArgument(e.to_string()))?;
            let result = callable(value).map_err(|e| DispatchError::Remote(e.to_string()))?;
            codec
                .encode(&result)
                .map_err(|e| DispatchError::Encoding(e.to_string()))
        };
        Self::build::<A, R>(name.into(), ArgPassing::ByValue, Box::new(handler))
    }

    /// Describe a callable taking `&mut` to its decoded argument.
    ///
    /// Changes the callable makes to the argument are visible to it for
    /// the rest of the call; the response is still its return value.
    pub fn by_reference<A, R, E, F>(name: impl Into<String>, callable: F) -> Self
    where
        A: DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: fmt::Display + 'static,
        F: Fn(&mut A) -> Result<R, E> + Send + Sync + 'static,
    {
        let handler = move |codec: &Codec, argument: &[u8]| {
            let mut value: A = codec
                .decode(argument)
                .map_err(|e| DispatchError::BadArgument(e.to_string()))?;
            let result = callable(&mut value).map_err(|e| DispatchError::Remote(e.to_string()))?;
            codec
                .encode(&result)
                .map_err(|e| DispatchError::Encoding(e.to_string()))
        };
        Self::build::<A, R>(name.into(), ArgPassing::ByReference, Box::new(handler))
    }

    /// Bind a by-value method of a shared receiver.
    pub fn method<S, A, R, E, F>(receiver: Arc<S>, name: impl Into<String>, method: F) -> Self
    where
        S: Send + Sync + 'static,
        A: DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: fmt::Display + 'static,
        F: Fn(&S, A) -> Result<R, E> + Send + Sync + 'static,
    {
        Self::by_value(name, move |arg: A| method(&receiver, arg))
    }

    /// Bind a by-reference method of a shared receiver.
    pub fn method_by_ref<S, A, R, E, F>(receiver: Arc<S>, name: impl Into<String>, method: F) -> Self
    where
        S: Send + Sync + 'static,
        A: DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: fmt::Display + 'static,
        F: Fn(&S, &mut A) -> Result<R, E> + Send + Sync + 'static,
    {
        Self::by_reference(name, move |arg: &mut A| method(&receiver, arg))
    }

    fn build<A, R>(name: String, passing: ArgPassing, handler: Handler) -> Self {
        Self {
            name,
            arg_type: type_name::<A>(),
            result_type: type_name::<R>(),
            passing,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rust type name of the decode target.
    pub fn arg_type(&self) -> &'static str {
        self.arg_type
    }

    pub fn result_type(&self) -> &'static str {
        self.result_type
    }

    pub fn passing(&self) -> ArgPassing {
        self.passing
    }

    /// Decode `argument`, run the callable and encode its result.
    pub fn call(&self, codec: &Codec, argument: &[u8]) -> Result<Vec<u8>, DispatchError> {
        (self.handler)(codec, argument)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("arg_type", &self.arg_type)
            .field("result_type", &self.result_type)
            .field("passing", &self.passing)
            .finish_non_exhaustive()
    }
}

/// Check that `name` can be sent verbatim as a single URL path segment.
///
/// Allowed are ASCII letters, digits and the unescaped path characters
/// `- . _ ~ ! $ & ' ( ) * + , ; = : @`. Anything that would need
/// percent-encoding, `%` included, is rejected.
pub fn validate_name(name: &str) -> Result<(), RegistrationError> {
    if name.is_empty() {
        return Err(RegistrationError::EmptyName);
    }
    if !name.chars().all(is_segment_char) {
        return Err(RegistrationError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-._~!$&'()*+,;=:@".contains(c)
}

/// Concurrent map from endpoint name to descriptor.
///
/// Registration takes the write lock, lookups share the read lock.
/// Entries are only ever replaced whole, so a poisoned lock is recovered
/// rather than propagated.
#[derive(Default)]
pub struct MethodTable {
    methods: RwLock<HashMap<String, Arc<MethodDescriptor>>>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<MethodDescriptor>>> {
        self.methods.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<MethodDescriptor>>> {
        self.methods.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a descriptor, replacing any endpoint of the same name.
    pub fn insert(&self, descriptor: MethodDescriptor) -> Result<(), RegistrationError> {
        validate_name(descriptor.name())?;
        tracing::debug!(
            endpoint = descriptor.name(),
            arg = descriptor.arg_type(),
            result = descriptor.result_type(),
            passing = ?descriptor.passing(),
            "registered endpoint"
        );
        let name = descriptor.name().to_string();
        self.write().insert(name, Arc::new(descriptor));
        Ok(())
    }

    /// Register a callable that takes its argument by value.
    pub fn register<A, R, E, F>(&self, name: &str, callable: F) -> Result<(), RegistrationError>
    where
        A: DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: fmt::Display + 'static,
        F: Fn(A) -> Result<R, E> + Send + Sync + 'static,
    {
        self.insert(MethodDescriptor::by_value(name, callable))
    }

    /// Register a callable that takes `&mut` to its argument.
    pub fn register_by_ref<A, R, E, F>(
        &self,
        name: &str,
        callable: F,
    ) -> Result<(), RegistrationError>
    where
        A: DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: fmt::Display + 'static,
        F: Fn(&mut A) -> Result<R, E> + Send + Sync + 'static,
    {
        self.insert(MethodDescriptor::by_reference(name, callable))
    }

    /// Register every public endpoint a service exposes.
    ///
    /// Endpoints whose names start with `_` or fail validation are
    /// skipped. Returns how many were registered.
    pub fn register_all<S: Service>(&self, service: Arc<S>) -> usize {
        let mut registered = 0;
        for descriptor in service.endpoints() {
            if descriptor.name().starts_with('_') {
                tracing::debug!(endpoint = descriptor.name(), "skipping non-public endpoint");
                continue;
            }
            let name = descriptor.name().to_string();
            match self.insert(descriptor) {
                Ok(()) => registered += 1,
                Err(e) => tracing::debug!(endpoint = %name, "skipping endpoint: {}", e),
            }
        }
        registered
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<MethodDescriptor>> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Snapshot of the registered names, sorted.
    pub fn names(&self) -> BTreeSet<String> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("names", &self.names())
            .finish()
    }
}
