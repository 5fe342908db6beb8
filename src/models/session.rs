//! Records of the `everspass_sessions` and `everspass_photos` collections.

use serde::{Deserialize, Serialize};

/// A photo-sharing session scoped to one device.
///
/// `photo_count` and `total_bytes` are denormalized totals maintained by the
/// photo create/delete handlers; they are never allowed below zero.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PassSession {
    /// PocketBase record id.
    pub id: String,

    /// Creation timestamp, verbatim from PocketBase.
    pub created: String,

    /// Last-update timestamp, verbatim from PocketBase.
    pub updated: String,

    /// Opaque device identifier the session belongs to.
    pub device_id: String,

    /// User-chosen session name.
    pub name: String,

    /// When the session stops accepting photos (48h after creation).
    pub expires_at: String,

    /// Lifecycle status, currently always "active" at creation.
    pub status: String,

    /// Number of photos currently in the session.
    #[serde(default)]
    pub photo_count: i64,

    /// Sum of the photo payload sizes, in bytes.
    #[serde(default)]
    pub total_bytes: i64,
}

/// A single uploaded photo, stored as a PocketBase file field.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PassPhoto {
    /// PocketBase record id.
    pub id: String,

    /// Creation timestamp, verbatim from PocketBase.
    pub created: String,

    /// Parent session id.
    pub session_id: String,

    /// Stored filename of the image; combined with the record id to build
    /// the public file URL.
    pub image_url: String,

    /// Payload size in bytes, recorded at upload time for the session
    /// counters.
    #[serde(default)]
    pub size_bytes: i64,
}
