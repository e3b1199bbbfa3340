//! Prompts for recipe enrichment.

use crate::recipe::Recipe;

/// Placeholder for absent optional recipe fields.
const NOT_PROVIDED: &str = "Not provided";

/// Fixed system message sent with every enrichment request.
pub const SYSTEM_PROMPT: &str = r#"You are a culinary expert specialising in Indian home cooking. You analyse a recipe and return enrichment data as a single JSON object.

Rules:
1. Respond with the JSON object only. No markdown, no commentary.
2. Copy the ingredients and instructions exactly as given. Do not reword, reorder or clean them.
3. Write the summary yourself: two or three sentences that make the dish sound appealing and describe it accurately.
4. All minute values are non-negative integers. Booleans are lowercase true/false.

Use exactly one of these values for each score:
- healthiness_score: "Very Healthy", "Healthy", "Moderate", "Unhealthy", "Very Unhealthy"
- ease_of_cooking_score: "Very Easy", "Easy", "Moderate", "Difficult", "Very Difficult"
- indian_ingredient_availability_score: "Very High", "High", "Moderate", "Low", "Very Low"
- protein_level: "High", "Medium", "Low"

Fields:
- title (string)
- generated_summary (string)
- ingredients (array of strings)
- instructions (array of strings)
- healthiness_score, ease_of_cooking_score, indian_ingredient_availability_score, protein_level (strings, see above)
- prep_time_minutes (integer) and prep_time_breakdown (object of step name to minutes)
- prep_notes (string or null)
- total_cooking_time_minutes (integer) and cooking_time_breakdown (object of step name to minutes)
- soaking_required (boolean) and soaking_time_minutes (integer or null)
- meal_type_suitability (array of strings, e.g. "Breakfast", "Lunch", "Dinner", "Snack")
- dietary_restrictions (array of strings, e.g. "Vegetarian", "Vegan", "Gluten-Free")
- categories (object with arrays "meal_type", "dish_type", "cooking_method", "region")
- meal_prep_guidance (object):
  - components_to_prep (array of components that can be made ahead)
  - prep_instructions (object of component to how to prepare it ahead)
  - storage_info (object of component to how and how long to store it)
  - final_assembly (string: how to finish the dish from prepped components)
  - time_saving_tips (array of strings)

Example:
{"title": "Masala Dosa", "generated_summary": "Crisp fermented rice crepes wrapped around a mildly spiced potato filling. A South Indian breakfast favourite that is as satisfying as it is light.", "ingredients": ["3 cups dosa batter", "4 potatoes, boiled"], "instructions": ["Spread batter thin on a hot tawa", "Fill with potato masala and fold"], "healthiness_score": "Healthy", "ease_of_cooking_score": "Moderate", "indian_ingredient_availability_score": "Very High", "prep_time_minutes": 25, "prep_time_breakdown": {"boiling_potatoes": 15, "chopping": 10}, "prep_notes": "Batter should be fermented overnight", "total_cooking_time_minutes": 30, "cooking_time_breakdown": {"potato_masala": 15, "making_dosas": 15}, "soaking_required": false, "soaking_time_minutes": null, "protein_level": "Medium", "meal_type_suitability": ["Breakfast", "Dinner"], "dietary_restrictions": ["Vegetarian", "Vegan"], "categories": {"meal_type": ["Breakfast"], "dish_type": ["Main Course"], "cooking_method": ["Pan Frying"], "region": ["South Indian"]}, "meal_prep_guidance": {"components_to_prep": ["potato masala"], "prep_instructions": {"potato masala": "Cook and cool the filling"}, "storage_info": {"potato masala": "Refrigerate up to 2 days"}, "final_assembly": "Reheat the filling and make dosas fresh", "time_saving_tips": ["Boil potatoes the night before"]}}"#;

/// Render the user message for one recipe.
pub fn render_user_prompt(recipe: &Recipe) -> String {
    format!(
        r#"Analyse this recipe and respond with the enrichment JSON object only.
Use the ingredients and instructions exactly as provided.

Title: {title}
Summary: {summary}
Keywords: {keywords}
Tags: {tags}
Categories: {categories}

Full Recipe Text:
{text}

Ingredients:
{ingredients}

Instructions:
{instructions}"#,
        title = recipe.title,
        summary = recipe.summary.as_deref().unwrap_or(NOT_PROVIDED),
        keywords = join_or_placeholder(recipe.keywords.as_deref()),
        tags = join_or_placeholder(recipe.tags.as_deref()),
        categories = join_or_placeholder(recipe.categories.as_deref()),
        text = recipe.text,
        ingredients = recipe.ingredients.join("\n"),
        instructions = recipe.instructions.join("\n"),
    )
}

fn join_or_placeholder(values: Option<&[String]>) -> String {
    match values {
        Some(values) if !values.is_empty() => values.join(", "),
        _ => NOT_PROVIDED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prompt() {
        let mut recipe = Recipe::with_sections(
            "Poha",
            "Flattened rice with peanuts",
            vec!["2 cups poha".to_string(), "1/4 cup peanuts".to_string()],
            vec!["Rinse poha".to_string(), "Temper and toss".to_string()],
        );
        recipe.summary = Some("Quick breakfast".to_string());
        recipe.tags = Some(vec!["breakfast".to_string(), "quick".to_string()]);

        let prompt = render_user_prompt(&recipe);

        assert!(prompt.contains("Title: Poha"));
        assert!(prompt.contains("Summary: Quick breakfast"));
        assert!(prompt.contains("Tags: breakfast, quick"));
        assert!(prompt.contains("Keywords: Not provided"));
        assert!(prompt.contains("Flattened rice with peanuts"));
        assert!(prompt.contains("2 cups poha\n1/4 cup peanuts"));
        assert!(prompt.contains("Rinse poha\nTemper and toss"));
    }

    #[test]
    fn test_empty_lists_use_placeholder() {
        let mut recipe = Recipe::new("Chai", "");
        recipe.categories = Some(Vec::new());

        let prompt = render_user_prompt(&recipe);
        assert!(prompt.contains("Summary: Not provided"));
        assert!(prompt.contains("Categories: Not provided"));
    }

    #[test]
    fn test_system_prompt_lists_vocabularies() {
        assert!(SYSTEM_PROMPT.contains("\"Very Unhealthy\""));
        assert!(SYSTEM_PROMPT.contains("\"Very Difficult\""));
        assert!(SYSTEM_PROMPT.contains("\"Very Low\""));
        assert!(SYSTEM_PROMPT.contains("meal_prep_guidance"));
    }
}
