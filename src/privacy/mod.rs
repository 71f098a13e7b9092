//! Privacy layer: salted one-way identity tokens and the consent gate
//! that sits in front of every submission.

pub mod consent;
pub mod identity;

pub use consent::{requires_consent, ConsentDecision, CONSENT_MESSAGE};
pub use identity::{ephemeral_identifier, hash_identifier, token_for, IdentityToken};
