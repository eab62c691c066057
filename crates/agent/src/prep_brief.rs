use std::sync::Arc;

use tera::{Context, Tera};
use thiserror::Error;

use demogenie_core::briefing::{compose_fallback, parse_completion, ParseFailure};
use demogenie_core::config::LlmConfig;
use demogenie_core::domain::ae::AccountExecutive;
use demogenie_core::domain::booking::{Booking, MerchantProfile};
use demogenie_core::domain::brief::{BriefContent, PrepBrief};

use crate::llm::{CompletionRequest, LlmClient, LlmError};

pub const SYSTEM_INSTRUCTION: &str = "You are an expert sales preparation assistant for restaurant \
technology demos. Generate structured, actionable insights for Account Executives.";

const PROMPT_TEMPLATE: &str = r#"Generate a comprehensive demo preparation brief for the following restaurant:

**Merchant Information:**
- Name: {{ name }}
- Category: {{ category }}
- Number of Outlets: {{ outlets }}
- Products Interested: {{ products | join(sep=", ") }}
- Current Pain Points: {{ pain_points }}
- Special Notes: {{ special_notes }}
- Website: {{ website }}
- Social Media: {{ social_media }}
- Address: {{ address }}
- Contact: {{ contact }}
- Email: {{ email }}

**Required Output Format (JSON):**
{
    "insights": "2-3 sentences about the business context, growth potential, and key characteristics",
    "pain_points_summary": "Summarized version of their current challenges",
    "relevant_features": "Specific product features that address their needs, separated by semicolons",
    "pitch_suggestions": "3-4 specific strategies for the demo, including ROI focus areas and key talking points"
}

**Guidelines:**
- Be specific and actionable
- Focus on restaurant industry context
- Include quantifiable benefits where possible
- Tailor suggestions to their specific pain points
- Consider their scale (single vs multi-location)
- Reference their product interests

Return only valid JSON without any additional text.
"#;

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&LlmConfig> for GenerationSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Debug, Error)]
pub enum BriefGenerationError {
    #[error("no completion credential is configured")]
    MissingCredential,
    #[error("prompt rendering failed: {0}")]
    Prompt(#[from] tera::Error),
    #[error(transparent)]
    Completion(#[from] LlmError),
    #[error("completion could not be parsed: {0}")]
    Parse(#[from] ParseFailure),
}

impl BriefGenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::Prompt(_) => "prompt",
            Self::Completion(error) => error.kind.as_str(),
            Self::Parse(_) => "parse",
        }
    }
}

/// Produces prep briefs. The AI path is attempted only when a client is
/// present; every failure on that path degrades to the template brief, so
/// [`PrepBriefGenerator::generate`] always returns a `Generated` brief.
pub struct PrepBriefGenerator {
    client: Option<Arc<dyn LlmClient>>,
    settings: GenerationSettings,
}

impl PrepBriefGenerator {
    pub fn new(client: Option<Arc<dyn LlmClient>>, settings: GenerationSettings) -> Self {
        Self { client, settings }
    }

    pub fn template_only(settings: GenerationSettings) -> Self {
        Self::new(None, settings)
    }

    pub fn uses_completion(&self) -> bool {
        self.client.is_some()
    }

    pub async fn generate(&self, booking: &Booking, ae: &AccountExecutive) -> PrepBrief {
        let content = match self.try_generate(booking).await {
            Ok(content) => content,
            Err(BriefGenerationError::MissingCredential) => {
                tracing::debug!(
                    event_name = "brief.generation.template",
                    correlation_id = %booking.id.0,
                    "no completion client configured; using template brief"
                );
                compose_fallback(&booking.merchant)
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "brief.generation.fallback",
                    correlation_id = %booking.id.0,
                    error_kind = error.kind(),
                    error = %error,
                    "AI brief generation failed; using template brief"
                );
                compose_fallback(&booking.merchant)
            }
        };

        PrepBrief::generated(booking.id.clone(), ae.id.clone(), content)
    }

    async fn try_generate(&self, booking: &Booking) -> Result<BriefContent, BriefGenerationError> {
        let client = self.client.as_ref().ok_or(BriefGenerationError::MissingCredential)?;

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            system: SYSTEM_INSTRUCTION.to_string(),
            prompt: render_prompt(&booking.merchant)?,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let raw = client.complete(&request).await?;
        let payload = parse_completion(&raw)?;
        Ok(payload.into_content(&booking.merchant.current_pain_points))
    }
}

pub fn render_prompt(merchant: &MerchantProfile) -> Result<String, tera::Error> {
    let or_none = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or("None")
            .to_string()
    };

    let mut context = Context::new();
    context.insert("name", &merchant.merchant_name);
    context.insert("category", &merchant.restaurant_category);
    context.insert("outlets", &merchant.number_of_outlets);
    context.insert("products", &merchant.products_interested);
    context.insert("pain_points", &merchant.current_pain_points);
    context.insert("special_notes", &or_none(&merchant.special_notes));
    context.insert("website", &or_none(&merchant.website_links));
    context.insert("social_media", &or_none(&merchant.social_media));
    context.insert("address", &merchant.address);
    context.insert("contact", &merchant.contact_number);
    context.insert("email", &merchant.email);

    Tera::one_off(PROMPT_TEMPLATE, &context, false)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime, Utc};

    use demogenie_core::briefing::compose_fallback;
    use demogenie_core::domain::ae::{AccountExecutive, AeId};
    use demogenie_core::domain::booking::{
        Booking, BookingId, BriefStatus, MerchantProfile, SlotAssignment,
    };

    use super::{render_prompt, GenerationSettings, PrepBriefGenerator, SYSTEM_INSTRUCTION};
    use crate::llm::{CompletionRequest, LlmClient, LlmError, LlmErrorKind};

    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<String, LlmError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().expect("requests lock").clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            self.requests.lock().expect("requests lock").push(request.clone());
            self.responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::new(LlmErrorKind::Unknown, "script exhausted")))
        }
    }

    fn settings() -> GenerationSettings {
        GenerationSettings { model: "gpt-4".to_string(), temperature: 0.7, max_tokens: 1000 }
    }

    fn ae() -> AccountExecutive {
        AccountExecutive {
            id: AeId("ae-sarah".to_string()),
            name: "Sarah Johnson".to_string(),
            email: "sarah@example.com".to_string(),
            working_start: NaiveTime::from_hms_opt(9, 0, 0).expect("time"),
            working_end: NaiveTime::from_hms_opt(17, 0, 0).expect("time"),
            booked_slots: Vec::new(),
        }
    }

    fn booking() -> Booking {
        let scheduled_time = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|date| date.and_hms_opt(14, 0, 0))
            .expect("valid datetime");
        Booking {
            id: BookingId("booking-bella".to_string()),
            merchant: MerchantProfile {
                merchant_name: "Bella Vista Restaurant".to_string(),
                address: "123 Main St, Downtown".to_string(),
                contact_number: "+1 (555) 123-4567".to_string(),
                email: "owner@bellavista.com".to_string(),
                restaurant_category: "Fine Dining".to_string(),
                number_of_outlets: "2-5 Locations".to_string(),
                products_interested: vec!["POS".to_string(), "Inventory Management".to_string()],
                current_pain_points: "Struggling with inventory management across multiple locations"
                    .to_string(),
                special_notes: None,
                website_links: Some("https://bellavista.com".to_string()),
                social_media: None,
            },
            preferred_time: scheduled_time,
            assignment: Some(SlotAssignment { ae_id: AeId("ae-sarah".to_string()), scheduled_time }),
            meeting_link: None,
            brief_status: BriefStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn without_client_the_template_brief_is_used() {
        let generator = PrepBriefGenerator::template_only(settings());
        let booking = booking();

        let brief = generator.generate(&booking, &ae()).await;

        assert!(!generator.uses_completion());
        assert_eq!(brief.content, compose_fallback(&booking.merchant));
        assert_eq!(brief.status, BriefStatus::Generated);
        assert_eq!(brief.booking_id, booking.id);
        assert_eq!(brief.ae_id, AeId("ae-sarah".to_string()));
    }

    #[tokio::test]
    async fn completion_failure_matches_template_brief_exactly() {
        let booking = booking();
        for kind in [LlmErrorKind::Auth, LlmErrorKind::RateLimit, LlmErrorKind::Timeout] {
            let client = ScriptedClient::new(vec![Err(LlmError::new(kind, "simulated"))]);
            let generator = PrepBriefGenerator::new(Some(client), settings());

            let brief = generator.generate(&booking, &ae()).await;
            assert_eq!(brief.content, compose_fallback(&booking.merchant));
            assert_eq!(brief.status, BriefStatus::Generated);
        }
    }

    #[tokio::test]
    async fn unrecognizable_completion_falls_back() {
        let booking = booking();
        let client = ScriptedClient::new(vec![Ok("I am unable to help today.".to_string())]);
        let generator = PrepBriefGenerator::new(Some(client), settings());

        let brief = generator.generate(&booking, &ae()).await;
        assert_eq!(brief.content, compose_fallback(&booking.merchant));
    }

    #[tokio::test]
    async fn list_fields_from_completion_are_bulleted() {
        let completion = r#"```json
{"insights": "Upscale group.", "relevant_features": ["Central inventory", "Recipe costing"], "pitch_suggestions": ["Lead with waste"]}
```"#;
        let client = ScriptedClient::new(vec![Ok(completion.to_string())]);
        let generator = PrepBriefGenerator::new(Some(client.clone()), settings());
        let booking = booking();

        let brief = generator.generate(&booking, &ae()).await;

        assert_eq!(brief.content.insights, "Upscale group.");
        assert_eq!(brief.content.relevant_features, "• Central inventory\n• Recipe costing");
        assert_eq!(brief.content.pitch_suggestions, "• Lead with waste");
        assert_eq!(
            brief.content.pain_points_summary,
            "Struggling with inventory management across multiple locations"
        );

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4");
        assert_eq!(requests[0].system, SYSTEM_INSTRUCTION);
        assert_eq!(requests[0].max_tokens, 1000);
        assert!(requests[0].prompt.contains("Bella Vista Restaurant"));
    }

    #[tokio::test]
    async fn template_path_is_idempotent() {
        let generator = PrepBriefGenerator::template_only(settings());
        let booking = booking();

        let first = generator.generate(&booking, &ae()).await;
        let second = generator.generate(&booking, &ae()).await;
        assert_eq!(first, second);
    }

    #[test]
    fn prompt_embeds_merchant_fields() {
        let prompt = render_prompt(&booking().merchant).expect("render prompt");

        assert!(prompt.contains("- Name: Bella Vista Restaurant"));
        assert!(prompt.contains("- Products Interested: POS, Inventory Management"));
        assert!(prompt.contains("- Special Notes: None"));
        assert!(prompt.contains("- Website: https://bellavista.com"));
        assert!(prompt.contains("\"pitch_suggestions\""));
    }
}
