//! Consent gate.
//!
//! There is no consent table: an identity that already has a finalized
//! submission has consented. First-time identities must opt in explicitly
//! with the current request.

use serde::Serialize;

use super::identity::IdentityToken;

/// Prompt returned to first-time submitters who have not opted in.
pub const CONSENT_MESSAGE: &str = "Welcome to EduPulse!\n\n\
To give you classroom support, we need your consent to use your query \
(anonymized) to improve our services.\n\n\
Reply with 'YES' to opt-in, or resend with consent_given=true to continue.\n\n\
Your phone number is never stored - only a secure one-way hash is used.";

/// Outcome of the gate for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentDecision {
    /// Stop: return the consent prompt, classify nothing, persist nothing.
    Prompt,
    /// Continue. `first_time` is true when this request carries the opt-in.
    Proceed { first_time: bool },
}

impl ConsentDecision {
    /// Combine the history check with the caller's consent flag.
    ///
    /// Returning identities are never re-prompted, whatever the flag says.
    pub fn evaluate(consent_required: bool, consent_flag: bool) -> Self {
        match (consent_required, consent_flag) {
            (true, false) => ConsentDecision::Prompt,
            (true, true) => ConsentDecision::Proceed { first_time: true },
            (false, _) => ConsentDecision::Proceed { first_time: false },
        }
    }
}

/// True iff the lookup reports no prior record for `token`.
///
/// Lookup failures propagate unchanged: an unavailable store must never be
/// read as "consent required" or as "already consented".
pub fn requires_consent<F, E>(token: &IdentityToken, history_lookup: F) -> Result<bool, E>
where
    F: FnOnce(&IdentityToken) -> Result<bool, E>,
{
    let seen_before = history_lookup(token)?;
    Ok(!seen_before)
}
