//! Per-call dispatch: lookup, decode, invoke, encode.

use std::sync::Arc;
use std::time::Instant;

use nanorpc_common::{Codec, DispatchError};

use crate::method_table::{MethodDescriptor, MethodTable};

/// Runs single calls against a shared [`MethodTable`].
///
/// Dispatch is synchronous and never retries; the table is only read.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: Arc<MethodTable>,
    codec: Codec,
}

impl Dispatcher {
    pub fn new(table: Arc<MethodTable>, codec: Codec) -> Self {
        Self { table, codec }
    }

    pub fn table(&self) -> &Arc<MethodTable> {
        &self.table
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Dispatch one call by endpoint name.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::NotFound`] if no endpoint has that name
    /// - [`DispatchError::BadArgument`] if the argument does not decode;
    ///   the callable is not run
    /// - [`DispatchError::Remote`] if the callable returned an error
    /// - [`DispatchError::Encoding`] if the result does not encode
    pub fn dispatch(&self, name: &str, argument: &[u8]) -> Result<Vec<u8>, DispatchError> {
        let descriptor = self
            .table
            .lookup(name)
            .ok_or_else(|| DispatchError::NotFound(name.to_string()))?;
        self.invoke(&descriptor, argument)
    }

    /// Run an already looked-up descriptor.
    pub fn invoke(
        &self,
        descriptor: &MethodDescriptor,
        argument: &[u8],
    ) -> Result<Vec<u8>, DispatchError> {
        let start = Instant::now();
        let result = descriptor.call(&self.codec, argument);
        match &result {
            Ok(encoded) => tracing::debug!(
                endpoint = descriptor.name(),
                bytes = encoded.len(),
                elapsed_us = start.elapsed().as_micros() as u64,
                "call succeeded"
            ),
            Err(e) => tracing::debug!(
                endpoint = descriptor.name(),
                elapsed_us = start.elapsed().as_micros() as u64,
                "call failed: {}",
                e
            ),
        }
        result
    }
}
