//! Sphyre Registry: role-gated credential, schema, and consent ledgers
//! composed into per-tenant registry instances.
//!
//! A [`RegistryFactory`] hands out isolated [`RegistryFacade`]s. Each facade
//! owns an [`AccessControl`] directory, a [`CredentialLedger`], a
//! [`SchemaLedger`], and a [`ConsentLedger`], all reading time from one
//! injected clock and appending to one event log. Facades also verify
//! holder [`Presentation`]s against their ledgers and consent records.

pub mod access;
pub mod consent;
pub mod context;
pub mod credential;
pub mod error;
pub mod facade;
pub mod factory;
pub mod presentation;
pub mod schema;
pub mod status;

pub use access::AccessControl;
pub use consent::{consent_key, ConsentGrant, ConsentLedger, ConsentRecord};
pub use context::LedgerContext;
pub use credential::{credential_key, CredentialLedger, CredentialRecord};
pub use error::RegistryError;
pub use facade::{RegistryFacade, RegistryMetadata};
pub use factory::RegistryFactory;
pub use presentation::{
    CredentialCheck, CredentialProof, Presentation, PresentationVerification, PresentedCredential,
};
pub use schema::{SchemaLedger, SchemaRecord};
pub use status::{FactoryStatus, RegistryStatus};
