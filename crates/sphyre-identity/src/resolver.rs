use std::sync::Arc;

use sphyre_crypto::SigningPublicKey;

use crate::did::DidDirectory;
use crate::document::DidDocument;
use crate::error::IdentityError;

/// Resolves DIDs to their documents.
///
/// Registry instances hold one of these as their identity-resolution backend.
pub trait IdentityResolver: Send + Sync {
    /// Resolve a DID URI to its DID Document.
    fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError>;

    /// Resolve a DID straight to its primary verification key.
    fn public_key(&self, did: &str) -> Result<SigningPublicKey, IdentityError> {
        self.resolve(did)?.primary_public_key()
    }
}

/// Resolves DIDs from an in-memory [`DidDirectory`].
pub struct LocalResolver {
    directory: Arc<DidDirectory>,
}

impl LocalResolver {
    pub fn new(directory: Arc<DidDirectory>) -> Self {
        Self { directory }
    }

    /// The directory this resolver reads from.
    pub fn directory(&self) -> &Arc<DidDirectory> {
        &self.directory
    }
}

impl IdentityResolver for LocalResolver {
    fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        self.directory
            .resolve(did)
            .ok_or_else(|| IdentityError::DidNotFound(did.to_string()))
    }
}

/// Composite resolver that tries multiple resolvers in order.
///
/// Returns the first successful resolution, or the last error.
pub struct CompositeResolver {
    resolvers: Vec<Arc<dyn IdentityResolver>>,
}

impl CompositeResolver {
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Add a resolver to the end of the chain.
    pub fn add_resolver(&mut self, resolver: Arc<dyn IdentityResolver>) {
        self.resolvers.push(resolver);
    }

    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }
}

impl Default for CompositeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver for CompositeResolver {
    fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        let mut last_error = IdentityError::DidResolution("no resolvers configured".into());

        for resolver in &self.resolvers {
            match resolver.resolve(did) {
                Ok(doc) => return Ok(doc),
                Err(e) => {
                    tracing::debug!(did = did, error = %e, "resolver failed, trying next");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}
