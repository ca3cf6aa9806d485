//! Keyword lookup from a symptom description to canned recommendations

use once_cell::sync::Lazy;

use crate::models::Recommendation;

/// Upper bound on recommendations returned for one description
pub const MAX_RECOMMENDATIONS: usize = 2;

pub static NITROGEN: Lazy<Recommendation> = Lazy::new(|| Recommendation {
    fertilizer_name: "Urea (46% N)".to_string(),
    application_method: "Top-dress or band-apply during active vegetative growth; 50-100 kg/ha depending on crop and soil test.".to_string(),
    reasoning: "Provides fast-available nitrogen to correct deficiency symptoms like yellowing leaves and poor growth.".to_string(),
    precautions: "Avoid over-application; apply when soil moisture is adequate. Wear gloves and avoid contact with eyes.".to_string(),
});

pub static PHOSPHORUS: Lazy<Recommendation> = Lazy::new(|| Recommendation {
    fertilizer_name: "Single Super Phosphate (SSP)".to_string(),
    application_method: "Broadcast and incorporate into soil before sowing or as a side placement near roots.".to_string(),
    reasoning: "Supplies phosphorus for root development and early establishment; useful when phosphorus deficiency suspected.".to_string(),
    precautions: "Acidic soils can fix P; follow soil-test recommendations.".to_string(),
});

/// Match a free-text description against the recommendation table.
///
/// Nitrogen is listed first when mentioned. Phosphorus is listed when
/// mentioned, and is also the answer whenever nothing else matched, so the
/// result is never empty: blank or unrelated text ("rust spots") yields
/// phosphorus alone.
pub fn recommend(description: &str) -> Vec<Recommendation> {
    let lower = description.to_lowercase();
    let mut results = Vec::with_capacity(MAX_RECOMMENDATIONS);

    if lower.contains("nitrogen") {
        results.push(Recommendation::clone(&NITROGEN));
    }
    if lower.contains("phosphorus") || results.is_empty() {
        results.push(Recommendation::clone(&PHOSPHORUS));
    }

    results.truncate(MAX_RECOMMENDATIONS);
    results
}
