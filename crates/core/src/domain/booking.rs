use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ae::AeId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BriefStatus {
    #[default]
    Pending,
    Generated,
}

impl BriefStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Generated => "Generated",
        }
    }

    /// Unknown values read back as `Pending` so a brief can be regenerated.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "generated" => Self::Generated,
            _ => Self::Pending,
        }
    }
}

/// Everything the merchant typed into the booking form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantProfile {
    pub merchant_name: String,
    pub address: String,
    pub contact_number: String,
    pub email: String,
    pub restaurant_category: String,
    pub number_of_outlets: String,
    pub products_interested: Vec<String>,
    pub current_pain_points: String,
    pub special_notes: Option<String>,
    pub website_links: Option<String>,
    pub social_media: Option<String>,
}

/// The AE and the confirmed time are only ever set together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub ae_id: AeId,
    pub scheduled_time: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub merchant: MerchantProfile,
    pub preferred_time: NaiveDateTime,
    pub assignment: Option<SlotAssignment>,
    pub meeting_link: Option<String>,
    pub brief_status: BriefStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub merchant: MerchantProfile,
    pub preferred_time: NaiveDateTime,
    pub assignment: Option<SlotAssignment>,
    pub meeting_link: Option<String>,
}

impl Booking {
    pub fn assigned_ae(&self) -> Option<&AeId> {
        self.assignment.as_ref().map(|assignment| &assignment.ae_id)
    }

    pub fn scheduled_time(&self) -> Option<NaiveDateTime> {
        self.assignment.as_ref().map(|assignment| assignment.scheduled_time)
    }
}
