use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use sphyre_core::{
    Clock, EventLog, Identity, RegistryConfig, RegistryEvent, Role, SchemaRevision,
};
use sphyre_crypto::Signature;
use sphyre_identity::{DidDocument, IdentityResolver};

use crate::access::AccessControl;
use crate::consent::{ConsentGrant, ConsentLedger, ConsentRecord};
use crate::context::LedgerContext;
use crate::credential::{CredentialLedger, CredentialRecord};
use crate::error::{require_non_empty, RegistryError};
use crate::presentation::{CredentialCheck, Presentation, PresentationVerification};
use crate::schema::{SchemaLedger, SchemaRecord};
use crate::status::RegistryStatus;

/// Descriptive metadata of a registry instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    pub name: String,
    pub description: String,
}

/// One tenant registry: access control, the three ledgers, metadata, and a
/// bound identity-resolution backend.
///
/// Every write takes the caller identity explicitly and is checked against
/// the registry's own access directory.
pub struct RegistryFacade {
    address: Identity,
    config: RegistryConfig,
    metadata: RwLock<RegistryMetadata>,
    ctx: LedgerContext,
    credentials: CredentialLedger,
    schemas: SchemaLedger,
    consents: ConsentLedger,
    resolver: Arc<dyn IdentityResolver>,
}

impl RegistryFacade {
    /// Deploy a registry. `deployer` becomes owner and Verifier.
    pub fn new(
        deployer: Identity,
        address: Identity,
        metadata: RegistryMetadata,
        config: RegistryConfig,
        clock: Arc<dyn Clock>,
        resolver: Arc<dyn IdentityResolver>,
    ) -> Result<Self, RegistryError> {
        require_non_empty("name", &metadata.name)?;
        config.validate()?;
        let ctx = LedgerContext::new(deployer, clock)?;

        tracing::info!(
            address = %address,
            deployer = %deployer,
            name = %metadata.name,
            version = %config.registry_version,
            "registry deployed"
        );
        Ok(Self {
            address,
            config,
            metadata: RwLock::new(metadata),
            credentials: CredentialLedger::new(ctx.clone()),
            schemas: SchemaLedger::new(ctx.clone()),
            consents: ConsentLedger::new(ctx.clone()),
            ctx,
            resolver,
        })
    }

    pub fn address(&self) -> Identity {
        self.address
    }

    /// Versioned identifier of this registry implementation.
    pub fn version(&self) -> &str {
        &self.config.registry_version
    }

    pub fn network_id(&self) -> u64 {
        self.config.network_id
    }

    pub fn metadata(&self) -> RegistryMetadata {
        self.metadata
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace name and description. Owner only.
    pub fn update_metadata(
        &self,
        caller: &Identity,
        name: &str,
        description: &str,
    ) -> Result<(), RegistryError> {
        self.ctx.access.require_owner(caller, "update metadata")?;
        require_non_empty("name", name)?;

        let mut metadata = self.metadata.write().unwrap_or_else(PoisonError::into_inner);
        metadata.name = name.to_string();
        metadata.description = description.to_string();
        self.ctx.emit(
            self.ctx.now(),
            RegistryEvent::MetadataUpdated {
                name: name.to_string(),
                description: description.to_string(),
                actor: *caller,
            },
        );
        tracing::info!(registry = %self.address, name, "metadata updated");
        Ok(())
    }

    // --- access control -------------------------------------------------

    pub fn access(&self) -> &AccessControl {
        &self.ctx.access
    }

    pub fn owner(&self) -> Identity {
        self.ctx.access.owner()
    }

    pub fn transfer_ownership(
        &self,
        caller: &Identity,
        new_owner: &Identity,
    ) -> Result<(), RegistryError> {
        self.ctx.access.transfer_ownership(caller, new_owner)
    }

    pub fn has_role(&self, role: Role, account: &Identity) -> bool {
        self.ctx.access.has_role(role, account)
    }

    pub fn is_issuer(&self, account: &Identity) -> bool {
        self.has_role(Role::Issuer, account)
    }

    pub fn is_verifier(&self, account: &Identity) -> bool {
        self.has_role(Role::Verifier, account)
    }

    pub fn add_issuer(&self, caller: &Identity, account: &Identity) -> Result<bool, RegistryError> {
        self.ctx.access.grant_role(caller, Role::Issuer, account)
    }

    pub fn remove_issuer(&self, caller: &Identity, account: &Identity) -> Result<bool, RegistryError> {
        self.ctx.access.revoke_role(caller, Role::Issuer, account)
    }

    pub fn add_verifier(&self, caller: &Identity, account: &Identity) -> Result<bool, RegistryError> {
        self.ctx.access.grant_role(caller, Role::Verifier, account)
    }

    pub fn remove_verifier(
        &self,
        caller: &Identity,
        account: &Identity,
    ) -> Result<bool, RegistryError> {
        self.ctx.access.revoke_role(caller, Role::Verifier, account)
    }

    // --- ledgers ----------------------------------------------------------

    pub fn credentials(&self) -> &CredentialLedger {
        &self.credentials
    }

    pub fn schemas(&self) -> &SchemaLedger {
        &self.schemas
    }

    pub fn consents(&self) -> &ConsentLedger {
        &self.consents
    }

    pub fn register_credential(
        &self,
        caller: &Identity,
        subject_did: &str,
        credential_hash: &str,
        metadata_uri: &str,
    ) -> Result<String, RegistryError> {
        self.credentials
            .register(caller, subject_did, credential_hash, metadata_uri)
    }

    pub fn revoke_credential(
        &self,
        caller: &Identity,
        subject_did: &str,
        credential_hash: &str,
    ) -> Result<(), RegistryError> {
        self.credentials.revoke(caller, subject_did, credential_hash)
    }

    pub fn is_credential_valid(&self, subject_did: &str, credential_hash: &str) -> bool {
        self.credentials.is_valid(subject_did, credential_hash)
    }

    pub fn credential_info(
        &self,
        subject_did: &str,
        credential_hash: &str,
    ) -> Option<CredentialRecord> {
        self.credentials.info(subject_did, credential_hash)
    }

    pub fn register_schema(
        &self,
        caller: &Identity,
        schema_id: &str,
        schema_uri: &str,
    ) -> Result<u32, RegistryError> {
        self.schemas.register(caller, schema_id, schema_uri)
    }

    pub fn schema_uri(&self, schema_id: &str) -> Result<String, RegistryError> {
        self.schemas.schema_uri(schema_id)
    }

    pub fn schema_info(&self, schema_id: &str) -> Option<SchemaRecord> {
        self.schemas.info(schema_id)
    }

    pub fn is_schema_registered(&self, schema_id: &str) -> bool {
        self.schemas.is_registered(schema_id)
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.count()
    }

    pub fn schema_id_at(&self, index: usize) -> Result<String, RegistryError> {
        self.schemas.id_at(index)
    }

    pub fn schema_history(&self, schema_id: &str) -> Vec<SchemaRevision> {
        self.schemas.history(schema_id)
    }

    pub fn grant_consent(
        &self,
        caller: &Identity,
        grant: ConsentGrant<'_>,
    ) -> Result<String, RegistryError> {
        self.consents.grant(caller, grant)
    }

    pub fn revoke_consent(
        &self,
        caller: &Identity,
        subject_did: &str,
        party_did: &str,
        purpose: &str,
    ) -> Result<(), RegistryError> {
        self.consents.revoke(caller, subject_did, party_did, purpose)
    }

    pub fn is_consent_valid(&self, subject_did: &str, party_did: &str, purpose: &str) -> bool {
        self.consents.is_valid(subject_did, party_did, purpose)
    }

    pub fn consent_info(
        &self,
        subject_did: &str,
        party_did: &str,
        purpose: &str,
    ) -> Option<ConsentRecord> {
        self.consents.info(subject_did, party_did, purpose)
    }

    pub fn events(&self) -> &EventLog {
        &self.ctx.events
    }

    // --- identity resolution ---------------------------------------------

    pub fn resolver(&self) -> &Arc<dyn IdentityResolver> {
        &self.resolver
    }

    pub fn resolve_did(&self, did: &str) -> Result<DidDocument, RegistryError> {
        Ok(self.resolver.resolve(did)?)
    }

    /// Check an issuer's Dilithium signature over a credential payload.
    ///
    /// The issuer key comes from the bound resolver. Malformed signatures
    /// are errors; a well-formed signature that does not match is `Ok(false)`.
    pub fn verify_credential_signature(
        &self,
        issuer_did: &str,
        payload: &[u8],
        signature: &[u8],
    ) -> Result<bool, RegistryError> {
        let public_key = self.resolver.public_key(issuer_did)?;
        let signature = Signature::from_bytes(signature)?;
        let valid = sphyre_crypto::verify_credential(payload, &signature, &public_key);
        tracing::debug!(issuer = issuer_did, valid, "credential signature checked");
        Ok(valid)
    }

    /// Whether `party_did` currently holds `subject_did`'s consent for
    /// `purpose`. The relying party's view of the consent ledger.
    pub fn check_consent(&self, party_did: &str, subject_did: &str, purpose: &str) -> bool {
        let valid = self.consents.is_valid(subject_did, party_did, purpose);
        tracing::debug!(party = party_did, subject = subject_did, purpose, valid, "consent checked");
        valid
    }

    /// Verify a holder's presentation end to end.
    ///
    /// Checks the holder signature, the holder's consent for the verifier and
    /// purpose, then each credential's issuer signature, disclosure, and
    /// ledger status under the holder DID. Failed checks are collected in
    /// `errors`; unresolvable DIDs and malformed signatures or roots are
    /// returned as errors.
    pub fn verify_presentation(
        &self,
        presentation: &Presentation,
    ) -> Result<PresentationVerification, RegistryError> {
        require_non_empty("holder_did", &presentation.holder_did)?;
        require_non_empty("verifier_did", &presentation.verifier_did)?;
        require_non_empty("purpose", &presentation.purpose)?;
        let holder = presentation.holder_did.as_str();
        let mut errors = Vec::new();

        let digest = presentation.digest()?;
        let holder_signature_valid =
            self.verify_credential_signature(holder, &digest, &presentation.signature)?;
        if !holder_signature_valid {
            errors.push(format!("presentation signature does not match {}", holder));
        }

        let consent_valid =
            self.check_consent(&presentation.verifier_did, holder, &presentation.purpose);
        if !consent_valid {
            errors.push(format!(
                "no valid consent from {} to {} for '{}'",
                holder, presentation.verifier_did, presentation.purpose
            ));
        }

        let mut credentials = Vec::with_capacity(presentation.credentials.len());
        for (index, credential) in presentation.credentials.iter().enumerate() {
            let signed = credential.proof.signed_bytes()?;
            let credential_hash = credential.proof.credential_hash()?;
            let check = CredentialCheck {
                issuer_did: credential.issuer_did.clone(),
                signature_valid: self.verify_credential_signature(
                    &credential.issuer_did,
                    &signed,
                    &credential.signature,
                )?,
                disclosure_valid: credential.proof.disclosure_valid(),
                ledger_valid: self.is_credential_valid(holder, &credential_hash),
                credential_hash,
                disclosed: credential.proof.disclosed_claims(),
            };
            if !check.signature_valid {
                errors.push(format!(
                    "credential {}: signature does not match issuer {}",
                    index, credential.issuer_did
                ));
            }
            if !check.disclosure_valid {
                errors.push(format!(
                    "credential {}: disclosed claims do not match the signed root",
                    index
                ));
            }
            if !check.ledger_valid {
                errors.push(format!(
                    "credential {}: {} is not registered or has been revoked",
                    index, check.credential_hash
                ));
            }
            credentials.push(check);
        }

        let is_valid = errors.is_empty();
        tracing::info!(
            registry = %self.address,
            holder,
            verifier = %presentation.verifier_did,
            purpose = %presentation.purpose,
            credentials = credentials.len(),
            is_valid,
            "presentation verified"
        );
        Ok(PresentationVerification {
            is_valid,
            errors,
            holder_did: presentation.holder_did.clone(),
            verifier_did: presentation.verifier_did.clone(),
            purpose: presentation.purpose.clone(),
            holder_signature_valid,
            consent_valid,
            credentials,
        })
    }

    // --- introspection ----------------------------------------------------

    pub fn status(&self) -> RegistryStatus {
        let accessible = self.ctx.events.is_healthy()
            && self.ctx.access.is_healthy()
            && self.schemas.is_healthy()
            && !self.metadata.is_poisoned();
        RegistryStatus {
            registry_address: self.address.to_hex(),
            registry_accessible: accessible,
            network_id: self.config.network_id,
            network_name: self.config.network_name.clone(),
            version: self.config.registry_version.clone(),
            owner: self.owner().to_hex(),
            event_count: self.ctx.events.len(),
        }
    }
}
