//! World ID verification and World Chain profiles.

mod profile;
mod verifier;

pub use profile::{is_evm_address, ProfileFetcher};
pub use verifier::{hash_to_field, IdentityVerifier, ProofPayload, VerifyOutcome, VerifyRequest};
