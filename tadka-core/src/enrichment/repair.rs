//! Repair steps applied to a parsed model payload before validation.
//!
//! Each step is a stateless struct implementing [`RepairStep`]. Steps run in
//! [`REPAIR_PIPELINE`] order and never fail: whatever they cannot fix is left
//! for validation to reject.

use serde_json::{json, Map, Value};

use crate::recipe::Recipe;

pub type Payload = Map<String, Value>;

/// One in-place fix over a model payload.
pub trait RepairStep: Send + Sync + std::fmt::Debug {
    /// Identifier used in logs (e.g., "backfill_urls").
    fn name(&self) -> &'static str;

    /// Apply the fix. `recipe` is the source the payload was generated from.
    fn apply(&self, payload: &mut Payload, recipe: &Recipe);
}

/// All repair steps, in the order they run.
pub static REPAIR_PIPELINE: &[&dyn RepairStep] = &[
    &UnescapeFractions,
    &BackfillUrls,
    &PreserveCategories,
    &DefaultMealPrep,
    &BackfillRequired,
];

/// Run every step of [`REPAIR_PIPELINE`] over the payload.
pub fn repair(payload: &mut Payload, recipe: &Recipe) {
    for step in REPAIR_PIPELINE {
        tracing::trace!(step = step.name(), recipe = %recipe.title, "Applying repair step");
        step.apply(payload, recipe);
    }
}

/// Unicode code points of fractions that some providers leave escaped.
const FRACTIONS: &[(&str, &str)] = &[
    ("00bd", "½"),
    ("00bc", "¼"),
    ("00be", "¾"),
    ("2153", "⅓"),
    ("2154", "⅔"),
    ("215b", "⅛"),
];

/// Replace literal fraction escapes, with or without the leading backslash,
/// in top-level string and string-list fields.
#[derive(Debug)]
pub struct UnescapeFractions;

/// Replace a backslash-less escape only where it stands alone as a quantity,
/// so URLs and identifiers that happen to contain the sequence survive.
fn replace_bare(text: &str, needle: &str, glyph: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(needle) {
        let (before, after) = (&rest[..pos], &rest[pos + needle.len()..]);
        let preceding = before.chars().last().or_else(|| out.chars().last());
        let starts_token =
            preceding.map_or(true, |c| c.is_whitespace() || c.is_ascii_digit() || c == '(');
        let ends_token = after.chars().next().map_or(true, |c| !c.is_alphanumeric());

        out.push_str(before);
        out.push_str(if starts_token && ends_token { glyph } else { needle });
        rest = after;
    }

    out.push_str(rest);
    out
}

impl UnescapeFractions {
    fn unescape(text: &str) -> Option<String> {
        let mut out = text.to_string();
        for (code, glyph) in FRACTIONS {
            let escaped = format!("{}u{}", '\\', code);
            out = out.replace(&escaped, glyph);
            out = replace_bare(&out, &format!("u{}", code), glyph);
        }
        (out != text).then_some(out)
    }

    fn unescape_in_place(value: &mut Value) {
        if let Value::String(text) = value {
            if let Some(fixed) = Self::unescape(text) {
                *text = fixed;
            }
        }
    }
}

impl RepairStep for UnescapeFractions {
    fn name(&self) -> &'static str {
        "unescape_fractions"
    }

    fn apply(&self, payload: &mut Payload, _recipe: &Recipe) {
        for value in payload.values_mut() {
            match value {
                Value::String(_) => Self::unescape_in_place(value),
                Value::Array(items) => items.iter_mut().for_each(Self::unescape_in_place),
                _ => {}
            }
        }
    }
}

/// Attach source URL and media fields from the recipe.
#[derive(Debug)]
pub struct BackfillUrls;

impl RepairStep for BackfillUrls {
    fn name(&self) -> &'static str {
        "backfill_urls"
    }

    fn apply(&self, payload: &mut Payload, recipe: &Recipe) {
        if let Some(url) = &recipe.url {
            payload.insert("recipe_url".to_string(), json!(url));
        }

        let first_image = recipe.images.first().filter(|image| !image.is_empty());
        let primary = [recipe.image.as_ref(), recipe.meta_image.as_ref()]
            .into_iter()
            .flatten()
            .find(|image| !image.is_empty());

        let image_url = primary.or(first_image);
        if let Some(image_url) = image_url {
            payload.insert("image_url".to_string(), json!(image_url));
        }

        if let Some(video) = recipe.movies.first() {
            payload.insert("video_url".to_string(), json!(video));
        }

        let repeats_first_image = image_url.is_some() && image_url == recipe.images.first();
        let additional = if repeats_first_image && recipe.images.len() > 1 {
            &recipe.images[1..]
        } else {
            &recipe.images[..]
        };
        payload.insert("additional_images".to_string(), json!(additional));
    }
}

/// Keep the recipe's own category list next to the model's categorisation.
#[derive(Debug)]
pub struct PreserveCategories;

impl RepairStep for PreserveCategories {
    fn name(&self) -> &'static str {
        "preserve_categories"
    }

    fn apply(&self, payload: &mut Payload, recipe: &Recipe) {
        let categories = recipe.categories.clone().unwrap_or_default();
        payload.insert("original_categories".to_string(), json!(categories));
    }
}

/// Insert a minimal `meal_prep_guidance` when the model left it out.
#[derive(Debug)]
pub struct DefaultMealPrep;

impl DefaultMealPrep {
    pub fn default_guidance() -> Value {
        json!({
            "components_to_prep": [],
            "prep_instructions": {},
            "storage_info": {},
            "final_assembly": "Follow the recipe instructions to cook and assemble the dish.",
            "time_saving_tips": ["Measure and prepare all ingredients before you start cooking."]
        })
    }
}

impl RepairStep for DefaultMealPrep {
    fn name(&self) -> &'static str {
        "default_meal_prep"
    }

    fn apply(&self, payload: &mut Payload, _recipe: &Recipe) {
        if is_missing(payload, "meal_prep_guidance") {
            payload.insert("meal_prep_guidance".to_string(), Self::default_guidance());
        }
    }
}

/// Minutes assumed when the model gives no time estimate.
const DEFAULT_MINUTES: u32 = 30;

/// Fill missing or null required fields with deterministic defaults.
#[derive(Debug)]
pub struct BackfillRequired;

impl BackfillRequired {
    fn default_for(field: &str, recipe: &Recipe) -> Option<Value> {
        let value = match field {
            "title" => json!(recipe.title),
            "generated_summary" => json!(format!("A recipe for {}", recipe.title)),
            "ingredients" => json!(recipe.ingredients),
            "instructions" => json!(recipe.instructions),
            "meal_type_suitability" | "dietary_restrictions" => json!([]),
            "healthiness_score" | "ease_of_cooking_score" | "indian_ingredient_availability_score" => {
                json!("Moderate")
            }
            "protein_level" => json!("Medium"),
            "prep_time_minutes" | "total_cooking_time_minutes" => json!(DEFAULT_MINUTES),
            "prep_time_breakdown" | "cooking_time_breakdown" => {
                json!({ "estimated": DEFAULT_MINUTES })
            }
            "categories" => json!({ "meal_type": ["Uncategorized"] }),
            "soaking_time_minutes" => json!(0),
            _ => return None,
        };
        Some(value)
    }
}

/// Fields back-filled by [`BackfillRequired`], in the order they are checked.
pub const BACKFILLED_FIELDS: &[&str] = &[
    "title",
    "generated_summary",
    "ingredients",
    "instructions",
    "healthiness_score",
    "ease_of_cooking_score",
    "indian_ingredient_availability_score",
    "protein_level",
    "prep_time_minutes",
    "prep_time_breakdown",
    "total_cooking_time_minutes",
    "cooking_time_breakdown",
    "meal_type_suitability",
    "dietary_restrictions",
    "categories",
    "soaking_time_minutes",
];

impl RepairStep for BackfillRequired {
    fn name(&self) -> &'static str {
        "backfill_required"
    }

    fn apply(&self, payload: &mut Payload, recipe: &Recipe) {
        for field in BACKFILLED_FIELDS {
            if !is_missing(payload, field) {
                continue;
            }
            if let Some(value) = Self::default_for(field, recipe) {
                tracing::warn!(
                    recipe = %recipe.title,
                    field = *field,
                    default = %value,
                    "Model omitted required field, using default"
                );
                payload.insert(field.to_string(), value);
            }
        }
    }
}

fn is_missing(payload: &Payload, field: &str) -> bool {
    payload.get(field).map_or(true, Value::is_null)
}
