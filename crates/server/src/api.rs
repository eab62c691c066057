use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, warn};
use uuid::Uuid;

use demogenie_core::domain::booking::{BookingId, BriefStatus, MerchantProfile};
use demogenie_core::domain::brief::PrepBriefRecord;
use demogenie_core::errors::{ApplicationError, InterfaceError};
use demogenie_core::parse_requested_time;

use crate::booking::{BookingService, BookingView, PLACEHOLDER_MEETING_LINK};

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Clone)]
pub struct ApiState {
    service: Arc<BookingService>,
}

/// Booking form body. Field names follow the web form; the snake_case
/// aliases are what older clients send.
#[derive(Clone, Debug, Deserialize)]
pub struct BookDemoRequest {
    #[serde(rename = "merchantName", alias = "merchant_name")]
    pub merchant_name: String,
    pub address: String,
    #[serde(rename = "contactNumber", alias = "contact_number")]
    pub contact_number: String,
    pub email: String,
    #[serde(rename = "productsInterested", alias = "products_interested", default)]
    pub products_interested: Vec<String>,
    #[serde(rename = "preferredDateTime", alias = "preferred_time")]
    pub preferred_time: String,
    #[serde(rename = "website", alias = "website_links", default)]
    pub website_links: Option<String>,
    #[serde(rename = "socialMedia", alias = "social_media", default)]
    pub social_media: Option<String>,
    #[serde(rename = "category", alias = "restaurant_category")]
    pub restaurant_category: String,
    #[serde(rename = "outlets", alias = "number_of_outlets")]
    pub number_of_outlets: String,
    #[serde(rename = "painPoints", alias = "current_pain_points", default)]
    pub current_pain_points: String,
    #[serde(rename = "specialNotes", alias = "special_notes", default)]
    pub special_notes: Option<String>,
}

impl BookDemoRequest {
    fn into_profile(self) -> (MerchantProfile, String) {
        let profile = MerchantProfile {
            merchant_name: self.merchant_name,
            address: self.address,
            contact_number: self.contact_number,
            email: self.email,
            restaurant_category: self.restaurant_category,
            number_of_outlets: self.number_of_outlets,
            products_interested: self.products_interested,
            current_pain_points: self.current_pain_points,
            special_notes: non_blank(self.special_notes),
            website_links: non_blank(self.website_links),
            social_media: non_blank(self.social_media),
        };
        (profile, self.preferred_time)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationCard {
    pub merchant_name: String,
    pub ae_name: String,
    pub scheduled_date_time: String,
    pub meeting_link: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoCard {
    pub id: String,
    pub merchant_name: String,
    pub category: String,
    pub scheduled_date_time: String,
    pub ae_name: String,
    pub status: &'static str,
    pub meeting_link: String,
    pub address: String,
    pub contact_number: String,
    pub email: String,
    pub website: Option<String>,
    pub social_media: Option<String>,
    pub products_interested: String,
    pub outlets: String,
    pub pain_points: String,
    pub special_notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrepBriefResponse {
    pub id: String,
    pub merchant_id: String,
    pub ae_id: String,
    pub insights: String,
    pub pain_points_summary: String,
    pub relevant_features: String,
    pub pitch_suggestions: String,
    pub status: &'static str,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CalendarAe {
    pub id: String,
    pub name: String,
    pub booked_slots: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CalendarEvents {
    pub aes: Vec<CalendarAe>,
}

#[derive(Clone, Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Error response in `{"detail": ...}` form.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    fn from_application(error: ApplicationError, correlation_id: &str) -> Self {
        Self(error.into_interface(correlation_id))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(
                event_name = "api.request.failed",
                correlation_id = %self.0.correlation_id(),
                error = %self.0,
                "request failed"
            );
        }

        (status, Json(ErrorBody { detail: self.0.user_message().to_string() })).into_response()
    }
}

pub fn router(service: Arc<BookingService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/book-demo", post(book_demo))
        .route("/merchant/{id}", get(merchant))
        .route("/demos", get(demos))
        .route("/generate-brief/{id}", post(generate_brief))
        .route("/prep-brief/{id}", get(prep_brief))
        .route("/calendar-events", get(calendar_events))
        .with_state(ApiState { service })
}

/// Origins that fail to parse as header values are skipped with a warning.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(
                    event_name = "system.cors.invalid_origin",
                    correlation_id = "bootstrap",
                    origin = %origin,
                    "ignoring unparseable CORS origin"
                );
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn book_demo(
    State(state): State<ApiState>,
    Json(request): Json<BookDemoRequest>,
) -> Result<Json<ConfirmationCard>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let (merchant, raw_time) = request.into_profile();

    let preferred_time = parse_requested_time(&raw_time)
        .map_err(|error| ApiError::from_application(error.into(), &correlation_id))?;

    let view = state
        .service
        .book_demo(merchant, preferred_time)
        .await
        .map_err(|error| ApiError::from_application(error, &correlation_id))?;

    Ok(Json(confirmation_card(&view)))
}

async fn merchant(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ConfirmationCard>, ApiError> {
    let view = state
        .service
        .booking(&BookingId(id.clone()))
        .await
        .map_err(|error| ApiError::from_application(error, &id))?;

    Ok(Json(confirmation_card(&view)))
}

async fn demos(State(state): State<ApiState>) -> Result<Json<Vec<DemoCard>>, ApiError> {
    let views = state
        .service
        .list_demos()
        .await
        .map_err(|error| ApiError::from_application(error, "demos"))?;

    Ok(Json(views.iter().map(demo_card).collect()))
}

async fn generate_brief(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<PrepBriefResponse>, ApiError> {
    let record = state
        .service
        .generate_brief(&BookingId(id.clone()))
        .await
        .map_err(|error| ApiError::from_application(error, &id))?;

    Ok(Json(brief_response(record)))
}

async fn prep_brief(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<PrepBriefResponse>, ApiError> {
    let record = state
        .service
        .latest_brief(&BookingId(id.clone()))
        .await
        .map_err(|error| ApiError::from_application(error, &id))?;

    Ok(Json(brief_response(record)))
}

async fn calendar_events(State(state): State<ApiState>) -> Result<Json<CalendarEvents>, ApiError> {
    let roster = state
        .service
        .roster()
        .await
        .map_err(|error| ApiError::from_application(error, "calendar"))?;

    let aes = roster
        .into_iter()
        .map(|ae| CalendarAe {
            id: ae.id.0,
            name: ae.name,
            booked_slots: ae.booked_slots.iter().map(|slot| iso(*slot)).collect(),
        })
        .collect();

    Ok(Json(CalendarEvents { aes }))
}

fn confirmation_card(view: &BookingView) -> ConfirmationCard {
    ConfirmationCard {
        merchant_name: view.booking.merchant.merchant_name.clone(),
        ae_name: view.ae.as_ref().map(|ae| ae.name.clone()).unwrap_or_default(),
        scheduled_date_time: view.booking.scheduled_time().map(iso).unwrap_or_default(),
        meeting_link: view.booking.meeting_link.clone().unwrap_or_default(),
    }
}

fn demo_card(view: &BookingView) -> DemoCard {
    let booking = &view.booking;
    let merchant = &booking.merchant;
    let when = booking.scheduled_time().unwrap_or(booking.preferred_time);

    DemoCard {
        id: booking.id.0.clone(),
        merchant_name: merchant.merchant_name.clone(),
        category: merchant.restaurant_category.clone(),
        scheduled_date_time: iso(when),
        ae_name: view.ae.as_ref().map(|ae| ae.name.clone()).unwrap_or_default(),
        status: match booking.brief_status {
            BriefStatus::Generated => "upcoming",
            BriefStatus::Pending => "prep-needed",
        },
        meeting_link: booking
            .meeting_link
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_MEETING_LINK.to_string()),
        address: merchant.address.clone(),
        contact_number: merchant.contact_number.clone(),
        email: merchant.email.clone(),
        website: merchant.website_links.clone(),
        social_media: merchant.social_media.clone(),
        products_interested: merchant.products_interested.join(", "),
        outlets: merchant.number_of_outlets.clone(),
        pain_points: merchant.current_pain_points.clone(),
        special_notes: merchant.special_notes.clone(),
    }
}

fn brief_response(record: PrepBriefRecord) -> PrepBriefResponse {
    let brief = record.brief;
    PrepBriefResponse {
        id: record.id.0,
        merchant_id: brief.booking_id.0,
        ae_id: brief.ae_id.0,
        insights: brief.content.insights,
        pain_points_summary: brief.content.pain_points_summary,
        relevant_features: brief.content.relevant_features,
        pitch_suggestions: brief.content.pitch_suggestions,
        status: brief.status.as_str(),
        created_at: record.created_at.to_rfc3339(),
    }
}

fn iso(at: NaiveDateTime) -> String {
    at.format(ISO_FORMAT).to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
