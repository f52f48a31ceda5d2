//! Sphyre Identity Layer
//!
//! The identity-resolution backend shared by registry instances:
//! - `did:sphyre` identifiers derived from Dilithium public keys
//! - DID Documents carrying the verification key
//! - an in-memory DID directory
//! - synchronous resolvers (local and composite)

pub mod did;
pub mod document;
pub mod error;
pub mod resolver;

pub use did::{did_from_public_key, validate_did, DidDirectory, DID_PREFIX};
pub use document::{DidDocument, Service, VerificationMethod};
pub use error::IdentityError;
pub use resolver::{CompositeResolver, IdentityResolver, LocalResolver};
