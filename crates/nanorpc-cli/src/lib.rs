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

//! # nanorpc CLI
//!
//! Command-line interface for nanorpc.
//!
//! ## Key Commands
//!
//! - `nanorpc serve`: Serve the built-in demo endpoints until Ctrl-C
//! - `nanorpc call`: Invoke one endpoint and print the raw JSON result
//!
//! ## Architecture
//!
//! The CLI uses the `argh` crate for argument parsing and dispatches to
//! `nanorpc-server` and `nanorpc-client`.

pub mod demo;

use anyhow::Result;

/// Validates that a URL string starts with `http://`.
///
/// # Errors
///
/// Returns an error naming `description` if the prefix is missing.
pub fn validate_http_url(url: &str, description: &str) -> Result<()> {
    if url.starts_with("http://") {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Invalid {}: '{}' must start with http://",
            description,
            url
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("http://127.0.0.1:8080", "server address").is_ok());

        let err = validate_http_url("127.0.0.1:8080", "server address").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid server address: '127.0.0.1:8080' must start with http://"
        );
        assert!(validate_http_url("https://example.com", "server address").is_err());
    }
}
