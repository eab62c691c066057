pub mod briefing;
pub mod config;
pub mod domain;
pub mod errors;
pub mod scheduling;

pub use briefing::{compose_fallback, parse_completion, BriefPayload, ParseFailure};
pub use domain::ae::{AccountExecutive, AeId, NewAccountExecutive};
pub use domain::booking::{
    Booking, BookingId, BriefStatus, MerchantProfile, NewBooking, SlotAssignment,
};
pub use domain::brief::{BriefContent, PrepBrief, PrepBriefId, PrepBriefRecord};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use scheduling::{parse_requested_time, Scheduler};
