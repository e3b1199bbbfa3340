//! Scraped recipe records and section extraction from raw page text.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::enrichment::EnrichmentRecord;

/// Marker that opens the ingredient section of scraped text.
const INGREDIENTS_MARKER: &str = "Ingredients";

/// Markers that open the instruction section, tried in order.
const INSTRUCTION_MARKERS: &[&str] = &["How to make", "Instructions"];

/// Headings that end a section when they appear after its marker.
const SECTION_TERMINATORS: &[&str] = &[
    "How to make",
    "Suggestion",
    "For",
    "Time",
    "Video",
    "Tags",
    "Categories",
];

/// One dish as scraped.
///
/// Ingredient and instruction lists left empty by the source are derived from
/// `text` when the recipe is constructed, either with [`Recipe::new`] or by
/// deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecipeDocument")]
pub struct Recipe {
    pub url: Option<String>,
    pub title: String,
    pub summary: Option<String>,
    /// Full scraped body.
    pub text: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub keywords: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub meta_description: Option<String>,
    /// Primary image for the page.
    pub image: Option<String>,
    pub meta_image: Option<String>,
    pub images: Vec<String>,
    /// Video links found on the page.
    pub movies: Vec<String>,
    pub enrichment: Option<EnrichmentRecord>,
}

impl Recipe {
    /// Create a recipe from its title and raw text, deriving sections from the text.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        RecipeDocument {
            title: title.into(),
            text: text.into(),
            ..Default::default()
        }
        .into()
    }

    /// Create a recipe with explicit ingredient and instruction lists.
    ///
    /// Lists that are empty are still derived from `text`.
    pub fn with_sections(
        title: impl Into<String>,
        text: impl Into<String>,
        ingredients: Vec<String>,
        instructions: Vec<String>,
    ) -> Self {
        RecipeDocument {
            title: title.into(),
            text: text.into(),
            ingredients,
            instructions,
            ..Default::default()
        }
        .into()
    }

    /// Fill empty ingredient and instruction lists from the raw text.
    fn derive_sections(&mut self) {
        if self.ingredients.is_empty() {
            self.ingredients = extract_section(&self.text, INGREDIENTS_MARKER);
        }

        if self.instructions.is_empty() {
            self.instructions = INSTRUCTION_MARKERS
                .iter()
                .map(|marker| extract_section(&self.text, marker))
                .find(|items| !items.is_empty())
                .unwrap_or_default();
        }
    }
}

/// Persisted shape of a recipe, before sections are derived.
#[derive(Debug, Default, Deserialize)]
struct RecipeDocument {
    #[serde(default)]
    url: Option<String>,
    title: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    ingredients: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    instructions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    publish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    keywords: Option<Vec<String>>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    categories: Option<Vec<String>>,
    #[serde(default)]
    meta_description: Option<String>,
    #[serde(default, alias = "top_image")]
    image: Option<String>,
    #[serde(default, alias = "meta_img")]
    meta_image: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    images: Vec<String>,
    #[serde(default, alias = "videos", deserialize_with = "null_as_empty")]
    movies: Vec<String>,
    #[serde(default)]
    enrichment: Option<EnrichmentRecord>,
}

impl From<RecipeDocument> for Recipe {
    fn from(doc: RecipeDocument) -> Self {
        let mut recipe = Recipe {
            url: doc.url,
            title: doc.title,
            summary: doc.summary,
            text: doc.text,
            ingredients: doc.ingredients,
            instructions: doc.instructions,
            publish_date: doc.publish_date,
            keywords: doc.keywords,
            tags: doc.tags,
            categories: doc.categories,
            meta_description: doc.meta_description,
            image: doc.image,
            meta_image: doc.meta_image,
            images: doc.images,
            movies: doc.movies,
            enrichment: doc.enrichment,
        };
        recipe.derive_sections();
        recipe
    }
}

/// Accept RFC 3339 or naive ISO timestamps; anything else becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Scrapers write `null` for lists they found nothing for.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Extract the lines of a section that starts at `marker`.
///
/// The section runs until the first terminator heading after the marker, or the
/// end of the text. Bullets and `N.` numbering are stripped from each line.
pub fn extract_section(text: &str, marker: &str) -> Vec<String> {
    let Some(start) = text.find(marker) else {
        return Vec::new();
    };

    let body = text[start + marker.len()..]
        .trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '-');

    let end = SECTION_TERMINATORS
        .iter()
        .filter_map(|heading| body.find(heading))
        .min()
        .unwrap_or(body.len());

    body[..end].lines().filter_map(clean_line).collect()
}

fn clean_line(line: &str) -> Option<String> {
    let item = strip_list_prefix(line.trim()).trim();
    if item.is_empty() {
        None
    } else {
        Some(item.to_string())
    }
}

fn strip_list_prefix(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix('•').or_else(|| line.strip_prefix('-')) {
        return rest;
    }

    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix('.') {
            return rest;
        }
    }

    line
}
