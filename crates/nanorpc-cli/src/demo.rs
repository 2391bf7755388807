// Copyright 2025 nanorpc Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Demo endpoints served by `nanorpc serve`.
//!
//! | endpoint    | argument          | result                      |
//! |-------------|-------------------|-----------------------------|
//! | `hello`     | `"name"`          | `"hello name"`              |
//! | `hello_ref` | `"  name "`       | `"hello name"` (trimmed)    |
//! | `add`       | `{"a": 1, "b": 2}`| `3`                         |
//! | `fail`      | `"message"`       | always a 500 with `message` |
//! | `greet`     | `"name"`          | `"<greeting>, name!"`       |
//! | `greeted`   | `null`            | number of `greet` calls     |

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nanorpc_common::RegistrationError;
use nanorpc_server::{MethodDescriptor, Server, ServerConfig, Service};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemoError {
    #[error("integer overflow adding {0} and {1}")]
    Overflow(i64, i64),

    #[error("{0}")]
    Requested(String),

    #[error("name must not be empty")]
    EmptyName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddArgs {
    pub a: i64,
    pub b: i64,
}

pub fn hello(name: String) -> Result<String, DemoError> {
    Ok(format!("hello {}", name))
}

/// Normalizes the name in place before greeting.
pub fn hello_ref(name: &mut String) -> Result<String, DemoError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DemoError::EmptyName);
    }
    *name = trimmed.to_string();
    Ok(format!("hello {}", name))
}

pub fn add(args: AddArgs) -> Result<i64, DemoError> {
    args.a
        .checked_add(args.b)
        .ok_or(DemoError::Overflow(args.a, args.b))
}

pub fn fail(message: String) -> Result<(), DemoError> {
    Err(DemoError::Requested(message))
}

/// Greeter service with a call counter.
pub struct Greeter {
    greeting: String,
    greeted: AtomicU64,
}

impl Greeter {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            greeting: greeting.into(),
            greeted: AtomicU64::new(0),
        }
    }

    fn greet(&self, name: String) -> Result<String, DemoError> {
        if name.is_empty() {
            return Err(DemoError::EmptyName);
        }
        self.greeted.fetch_add(1, Ordering::Relaxed);
        Ok(format!("{}, {}!", self.greeting, name))
    }

    fn greeted(&self, _: ()) -> Result<u64, DemoError> {
        Ok(self.greeted.load(Ordering::Relaxed))
    }

    fn reset(&self, _: ()) -> Result<u64, DemoError> {
        Ok(self.greeted.swap(0, Ordering::Relaxed))
    }
}

impl Service for Greeter {
    fn endpoints(self: Arc<Self>) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::method(self.clone(), "greet", Greeter::greet),
            MethodDescriptor::method(self.clone(), "greeted", Greeter::greeted),
            // not exposed over HTTP
            MethodDescriptor::method(self, "_reset", Greeter::reset),
        ]
    }
}

/// Server with every demo endpoint registered.
pub fn demo_server(config: ServerConfig) -> Result<Server, RegistrationError> {
    let server = Server::with_config(config);
    server.register("hello", hello)?;
    server.register_by_ref("hello_ref", hello_ref)?;
    server.register("add", add)?;
    server.register("fail", fail)?;
    server.register_all(Arc::new(Greeter::new("Hello")));
    Ok(server)
}
