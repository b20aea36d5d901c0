/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Codec provider registry.
//!
//! A provider bundles the three codec surfaces for one wire encoding: the
//! request-builder factory, the response-view factory, and the
//! session-control framer. Providers register themselves at process init
//! and are selected by literal encoding name.

use crate::error::ProviderError;
use crate::message::{RequestMessageFactory, ResponseMessageFactory, SessionMessenger};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use tradewire_buffer::BufferPool;

/// A message codec provider for one wire encoding.
pub trait MessageProvider: Send + Sync {
    /// Encoding name used for selection (e.g. `"SBE"`).
    fn name(&self) -> &'static str;

    /// Returns the request-builder factory, drawing regions from `pool`.
    fn request_factory(&self, pool: BufferPool) -> Box<dyn RequestMessageFactory>;

    /// Returns the response-view factory.
    fn response_factory(&self) -> Box<dyn ResponseMessageFactory>;

    /// Returns the session-control framer.
    fn session_messenger(&self) -> Box<dyn SessionMessenger>;
}

impl std::fmt::Debug for dyn MessageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageProvider").field("name", &self.name()).finish()
    }
}

static REGISTRY: Lazy<RwLock<Vec<Arc<dyn MessageProvider>>>> = Lazy::new(|| RwLock::new(Vec::new()));

/// Registers a provider.
///
/// Registering a second provider under an already-registered name is a
/// no-op, so init-time registration is idempotent.
pub fn register_provider(provider: Arc<dyn MessageProvider>) {
    let mut registry = REGISTRY.write();
    if registry.iter().any(|p| p.name() == provider.name()) {
        return;
    }
    registry.push(provider);
}

/// Looks up a provider by encoding name.
///
/// # Errors
/// Returns [`ProviderError::NoSuchProvider`] if no registered provider
/// matches.
pub fn find_provider(name: &str) -> Result<Arc<dyn MessageProvider>, ProviderError> {
    REGISTRY
        .read()
        .iter()
        .find(|p| p.name() == name)
        .cloned()
        .ok_or_else(|| ProviderError::NoSuchProvider {
            name: name.to_string(),
        })
}
