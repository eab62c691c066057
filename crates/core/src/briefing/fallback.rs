use crate::briefing::{pain_points_or_placeholder, render_bullets, NO_SPECIFIC_PAIN_POINTS};
use crate::domain::booking::MerchantProfile;
use crate::domain::brief::BriefContent;

const CATEGORY_INSIGHTS: &[(&str, &str)] = &[
    (
        "fast casual",
        "Fast-casual segment shows high growth potential with increasing demand for convenience and quality.",
    ),
    (
        "fine dining",
        "Fine dining establishments typically have higher average order values and longer customer lifetime value.",
    ),
    (
        "quick service",
        "Quick service restaurants prioritize speed and efficiency, perfect for POS optimization.",
    ),
    ("cafe", "Cafes often have diverse revenue streams including food, beverages, and merchandise."),
    (
        "food truck",
        "Food trucks benefit from mobile POS solutions and location-based marketing features.",
    ),
    ("other", "Diverse restaurant category with potential for customized solutions."),
];
const GENERIC_CATEGORY_INSIGHT: &str = "Restaurant business with growth potential.";

const OUTLET_INSIGHTS: &[(&str, &str)] = &[
    ("1", "Single location focus allows for detailed optimization and personalized service."),
    ("2-5", "Multi-location setup indicates growth trajectory and need for centralized management."),
    (
        "6-10",
        "Established multi-location business requiring robust reporting and inventory management.",
    ),
    ("11+", "Large-scale operation needing enterprise-level solutions and advanced analytics."),
];
const GENERIC_OUTLET_INSIGHT: &str = "Business with multiple operational considerations.";

const ONLINE_PRESENCE_INSIGHT: &str =
    "Strong online presence suggests tech-savvy management and potential for digital integration.";
const INVENTORY_INSIGHT: &str =
    "Current inventory challenges indicate need for automated tracking and forecasting.";

const PRODUCT_FEATURES: &[(&str, &str)] = &[
    ("POS", "Point-of-sale system with real-time reporting and inventory integration"),
    ("KIOSK", "Self-service kiosk solution for order automation and queue management"),
    ("MERCHANT WEB", "Merchant web portal for business management and analytics"),
    ("WEBSTORE", "Online ordering platform with integrated payment processing"),
    ("MOBILE APP", "Mobile application for order management and customer engagement"),
];
const GENERIC_FEATURES: &[&str] = &[
    "Inventory management",
    "Multi-location reporting",
    "Online ordering",
    "Accounting integrations",
];

const PITCH_OPENER: &str =
    "Start with understanding their current challenges, then demonstrate specific solutions.";
const PITCH_STRATEGIES: &[(&[&str], &str)] = &[
    (
        &["inventory"],
        "Lead with ROI calculations showing 15-25% reduction in food waste through automated inventory tracking.",
    ),
    (
        &["online", "ordering"],
        "Emphasize 30-40% increase in order volume through integrated online ordering and delivery management.",
    ),
    (
        &["reporting"],
        "Highlight real-time analytics across all locations for data-driven decision making.",
    ),
    (
        &["efficiency"],
        "Focus on time savings of 2-3 hours daily through automated processes and streamlined workflows.",
    ),
];
const GENERIC_PITCH: &str =
    "Lead with operational efficiency gains and cost savings through automation.";
const PITCH_CLOSER: &str = "Show live demo of key features relevant to their specific needs.";

/// Builds the template brief used whenever the AI path is skipped or fails.
/// Output depends only on `merchant`, so repeated calls are byte-identical.
pub fn compose_fallback(merchant: &MerchantProfile) -> BriefContent {
    BriefContent {
        insights: insights(merchant),
        pain_points_summary: pain_points_or_placeholder(
            &merchant.current_pain_points,
            NO_SPECIFIC_PAIN_POINTS,
        ),
        relevant_features: render_bullets(relevant_features(&merchant.products_interested)),
        pitch_suggestions: render_bullets(pitch_suggestions(&merchant.current_pain_points)),
    }
}

fn insights(merchant: &MerchantProfile) -> String {
    let category = normalize_category(&merchant.restaurant_category);
    let band = outlet_band(&merchant.number_of_outlets);

    let category_insight = lookup(CATEGORY_INSIGHTS, &category).unwrap_or(GENERIC_CATEGORY_INSIGHT);
    let outlet_insight = lookup(OUTLET_INSIGHTS, &band).unwrap_or(GENERIC_OUTLET_INSIGHT);

    let mut sentences = vec![
        opening_sentence(
            &merchant.merchant_name,
            &merchant.restaurant_category,
            &band,
            &merchant.number_of_outlets,
        ),
        category_insight.to_string(),
        outlet_insight.to_string(),
    ];

    let has_website =
        merchant.website_links.as_deref().map(|link| !link.trim().is_empty()).unwrap_or(false);
    if has_website {
        sentences.push(ONLINE_PRESENCE_INSIGHT.to_string());
    }
    if merchant.current_pain_points.to_lowercase().contains("inventory") {
        sentences.push(INVENTORY_INSIGHT.to_string());
    }

    sentences.join(" ")
}

/// The category is printed as the merchant wrote it; only lookups normalize.
fn opening_sentence(name: &str, raw_category: &str, band: &str, raw_outlets: &str) -> String {
    let name = match name.trim() {
        "" => "This merchant",
        trimmed => trimmed,
    };
    let category = raw_category.trim();
    let kind = if category.is_empty() {
        "a restaurant".to_string()
    } else {
        format!("a {category} restaurant")
    };
    let outlets = match band {
        "1" => "1 location".to_string(),
        "" => "an unspecified number of locations".to_string(),
        known if lookup(OUTLET_INSIGHTS, known).is_some() => format!("{known} locations"),
        _ => raw_outlets.trim().to_lowercase(),
    };

    format!("{name} is {kind} with {outlets}.")
}

fn relevant_features(products: &[String]) -> Vec<&'static str> {
    let mut features: Vec<&'static str> = Vec::new();
    for product in products {
        let key = normalize_product(product);
        if let Some(feature) = lookup(PRODUCT_FEATURES, &key) {
            if !features.contains(&feature) {
                features.push(feature);
            }
        }
    }

    if features.is_empty() {
        GENERIC_FEATURES.to_vec()
    } else {
        features
    }
}

fn pitch_suggestions(pain_points: &str) -> Vec<&'static str> {
    let haystack = pain_points.to_lowercase();
    let matched = PITCH_STRATEGIES
        .iter()
        .filter(|(triggers, _)| triggers.iter().any(|trigger| haystack.contains(trigger)))
        .map(|(_, strategy)| *strategy)
        .collect::<Vec<_>>();

    let mut pitch = vec![PITCH_OPENER];
    if matched.is_empty() {
        pitch.push(GENERIC_PITCH);
    } else {
        pitch.extend(matched);
    }
    pitch.push(PITCH_CLOSER);
    pitch
}

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(candidate, _)| *candidate == key).map(|(_, value)| *value)
}

/// `"Fine Dining"`, `"fine-dining"` and `"FINE_DINING"` all become
/// `"fine dining"`.
fn normalize_category(raw: &str) -> String {
    raw.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Leading token of the outlet field: `"2-5 Locations"` → `"2-5"`.
fn outlet_band(raw: &str) -> String {
    raw.split_whitespace().next().unwrap_or_default().to_lowercase()
}

fn normalize_product(raw: &str) -> String {
    raw.to_uppercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
