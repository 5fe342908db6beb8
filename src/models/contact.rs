//! Record of the `portfolio_contactform` collection.

use serde::{Deserialize, Serialize};

/// A stored contact-form submission.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ContactSubmission {
    /// PocketBase record id.
    pub id: String,

    /// Creation timestamp, verbatim from PocketBase.
    pub created: String,

    /// Full name ("First Last") as submitted.
    pub name: String,

    /// Normalized (trimmed, lowercased) email address.
    pub email: String,

    pub phone: String,

    pub message: String,

    /// Client IP recorded for the 24h resubmission throttle.
    pub ip_address: String,
}
