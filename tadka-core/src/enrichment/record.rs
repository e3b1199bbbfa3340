//! Validated enrichment output.
//!
//! Validation is deserialization: a payload whose score fields fall outside
//! their vocabulary, or whose minute counts are negative, does not produce a
//! record.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Step name to estimated minutes (or whatever shape the model chose).
pub type TimeBreakdown = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthinessScore {
    #[serde(rename = "Very Healthy")]
    VeryHealthy,
    Healthy,
    Moderate,
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
}

impl HealthinessScore {
    pub const ALL: &'static [HealthinessScore] = &[
        HealthinessScore::VeryHealthy,
        HealthinessScore::Healthy,
        HealthinessScore::Moderate,
        HealthinessScore::Unhealthy,
        HealthinessScore::VeryUnhealthy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthinessScore::VeryHealthy => "Very Healthy",
            HealthinessScore::Healthy => "Healthy",
            HealthinessScore::Moderate => "Moderate",
            HealthinessScore::Unhealthy => "Unhealthy",
            HealthinessScore::VeryUnhealthy => "Very Unhealthy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EaseOfCooking {
    #[serde(rename = "Very Easy")]
    VeryEasy,
    Easy,
    Moderate,
    Difficult,
    #[serde(rename = "Very Difficult")]
    VeryDifficult,
}

impl EaseOfCooking {
    pub const ALL: &'static [EaseOfCooking] = &[
        EaseOfCooking::VeryEasy,
        EaseOfCooking::Easy,
        EaseOfCooking::Moderate,
        EaseOfCooking::Difficult,
        EaseOfCooking::VeryDifficult,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EaseOfCooking::VeryEasy => "Very Easy",
            EaseOfCooking::Easy => "Easy",
            EaseOfCooking::Moderate => "Moderate",
            EaseOfCooking::Difficult => "Difficult",
            EaseOfCooking::VeryDifficult => "Very Difficult",
        }
    }
}

/// How easily the ingredients can be bought in India.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IngredientAvailability {
    #[serde(rename = "Very High")]
    VeryHigh,
    High,
    Moderate,
    Low,
    #[serde(rename = "Very Low")]
    VeryLow,
}

impl IngredientAvailability {
    pub const ALL: &'static [IngredientAvailability] = &[
        IngredientAvailability::VeryHigh,
        IngredientAvailability::High,
        IngredientAvailability::Moderate,
        IngredientAvailability::Low,
        IngredientAvailability::VeryLow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientAvailability::VeryHigh => "Very High",
            IngredientAvailability::High => "High",
            IngredientAvailability::Moderate => "Moderate",
            IngredientAvailability::Low => "Low",
            IngredientAvailability::VeryLow => "Very Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProteinLevel {
    High,
    Medium,
    Low,
}

impl ProteinLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProteinLevel::High => "High",
            ProteinLevel::Medium => "Medium",
            ProteinLevel::Low => "Low",
        }
    }
}

impl fmt::Display for HealthinessScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EaseOfCooking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for IngredientAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ProteinLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category buckets assigned by the model.
///
/// The four named buckets are always present on output. Models sometimes send
/// a bare string instead of a list; both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Categories {
    #[serde(default, deserialize_with = "one_or_many")]
    pub meal_type: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub dish_type: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub cooking_method: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub region: Vec<String>,
    /// Any additional buckets, kept as returned.
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// Advice for preparing parts of the dish ahead of time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPrepGuidance {
    #[serde(default)]
    pub components_to_prep: Vec<String>,
    /// Component name to how it should be prepared.
    #[serde(default)]
    pub prep_instructions: BTreeMap<String, Value>,
    /// Component name to how long and where it keeps.
    #[serde(default)]
    pub storage_info: BTreeMap<String, Value>,
    #[serde(default)]
    pub final_assembly: String,
    #[serde(default)]
    pub time_saving_tips: Vec<String>,
}

/// Structured culinary metadata for one recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub title: String,
    pub generated_summary: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub healthiness_score: HealthinessScore,
    pub ease_of_cooking_score: EaseOfCooking,
    pub indian_ingredient_availability_score: IngredientAvailability,
    pub prep_time_minutes: u32,
    pub prep_time_breakdown: TimeBreakdown,
    #[serde(default)]
    pub prep_notes: Option<String>,
    pub total_cooking_time_minutes: u32,
    pub cooking_time_breakdown: TimeBreakdown,
    #[serde(default)]
    pub soaking_required: bool,
    #[serde(default)]
    pub soaking_time_minutes: Option<u32>,
    pub protein_level: ProteinLevel,
    pub meal_type_suitability: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub categories: Categories,
    #[serde(default)]
    pub original_categories: Vec<String>,
    #[serde(default)]
    pub meal_prep_guidance: Option<MealPrepGuidance>,
    #[serde(default)]
    pub recipe_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub additional_images: Vec<String>,
}

impl EnrichmentRecord {
    /// Validate a repaired payload into a record.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(payload.clone()))
    }

    /// Validate a stored payload (e.g. a cache entry) into a record.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Missing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
        OneOrMany::Missing(()) => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_payload() -> Value {
        json!({
            "title": "Idli",
            "generated_summary": "Soft steamed rice cakes.",
            "ingredients": ["2 cups rice"],
            "instructions": ["Steam 10 min"],
            "healthiness_score": "Healthy",
            "ease_of_cooking_score": "Easy",
            "indian_ingredient_availability_score": "Very High",
            "prep_time_minutes": 20,
            "prep_time_breakdown": {"grinding": 15, "greasing_moulds": 5},
            "total_cooking_time_minutes": 10,
            "cooking_time_breakdown": {"steaming": 10},
            "protein_level": "Medium",
            "meal_type_suitability": ["Breakfast"],
            "dietary_restrictions": ["Vegetarian"],
            "categories": {
                "meal_type": ["Breakfast"],
                "dish_type": ["Snack"],
                "cooking_method": ["Steaming"],
                "region": ["South Indian"]
            }
        })
    }

    #[test]
    fn test_complete_payload_validates() {
        let record = EnrichmentRecord::from_value(complete_payload()).unwrap();
        assert_eq!(record.healthiness_score, HealthinessScore::Healthy);
        assert_eq!(
            record.indian_ingredient_availability_score,
            IngredientAvailability::VeryHigh
        );
        assert!(!record.soaking_required);
        assert!(record.meal_prep_guidance.is_none());
        assert!(record.additional_images.is_empty());
    }

    #[test]
    fn test_enum_outside_vocabulary_rejected() {
        let mut payload = complete_payload();
        payload["healthiness_score"] = json!("Super Healthy");
        assert!(EnrichmentRecord::from_value(payload).is_err());

        let mut payload = complete_payload();
        payload["protein_level"] = json!("medium");
        assert!(EnrichmentRecord::from_value(payload).is_err());
    }

    #[test]
    fn test_negative_minutes_rejected() {
        let mut payload = complete_payload();
        payload["prep_time_minutes"] = json!(-5);
        assert!(EnrichmentRecord::from_value(payload).is_err());
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let mut payload = complete_payload();
        payload.as_object_mut().unwrap().remove("categories");
        assert!(EnrichmentRecord::from_value(payload).is_err());
    }

    #[test]
    fn test_categories_accept_single_string_and_extra_buckets() {
        let mut payload = complete_payload();
        payload["categories"] = json!({
            "meal_type": "Breakfast",
            "occasion": ["Festival"]
        });

        let record = EnrichmentRecord::from_value(payload).unwrap();
        assert_eq!(record.categories.meal_type, vec!["Breakfast"]);
        assert!(record.categories.region.is_empty());
        assert_eq!(record.categories.other["occasion"], json!(["Festival"]));
    }

    #[test]
    fn test_score_strings_match_serde_names() {
        for score in HealthinessScore::ALL {
            assert_eq!(serde_json::to_value(score).unwrap(), json!(score.as_str()));
        }
        for score in EaseOfCooking::ALL {
            assert_eq!(serde_json::to_value(score).unwrap(), json!(score.as_str()));
        }
        for score in IngredientAvailability::ALL {
            assert_eq!(serde_json::to_value(score).unwrap(), json!(score.as_str()));
        }
    }
}
