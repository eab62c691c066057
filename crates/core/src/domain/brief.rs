use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ae::AeId;
use crate::domain::booking::{BookingId, BriefStatus};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrepBriefId(pub String);

/// The four text sections an AE reads before a demo.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefContent {
    pub insights: String,
    pub pain_points_summary: String,
    pub relevant_features: String,
    pub pitch_suggestions: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepBrief {
    pub booking_id: BookingId,
    pub ae_id: AeId,
    pub content: BriefContent,
    pub status: BriefStatus,
}

/// A brief as persisted, with store-assigned identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepBriefRecord {
    pub id: PrepBriefId,
    pub brief: PrepBrief,
    pub created_at: DateTime<Utc>,
}

impl PrepBrief {
    pub fn generated(booking_id: BookingId, ae_id: AeId, content: BriefContent) -> Self {
        Self { booking_id, ae_id, content, status: BriefStatus::Generated }
    }
}
