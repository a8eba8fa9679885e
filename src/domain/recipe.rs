//! Recipe records produced by the extraction pipeline.
//!
//! A [`RecipeRecord`] is the persisted, returned entity. Its JSON form
//! (camelCase field names, absent optionals omitted) is the durable
//! contract other systems read from the store.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-derived recipe identifier (hex SHA-256 of the source link)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(String);

impl RecipeId {
    /// Derive the identifier for a source link.
    ///
    /// Hashes the exact bytes of the link; no case folding, trailing-slash
    /// or query normalization is applied.
    pub fn derive(source_link: &str) -> Self {
        let digest = Sha256::digest(source_link.as_bytes());
        Self(hex::encode(digest))
    }

    /// Wrap an identifier read back from storage or the command line
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the recipe identifier for a source link
pub fn derive_id(source_link: &str) -> RecipeId {
    RecipeId::derive(source_link)
}

/// A structured recipe derived from a video's narration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRecord {
    /// Primary key, derived from `source_link`
    pub recipe_id: RecipeId,

    /// First non-blank transcript line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Platform label or link host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_handle: Option<String>,

    /// The link exactly as submitted
    pub source_link: String,

    /// Language reported by the transcriber
    pub lang: String,

    pub text: RecipeText,

    /// Ingredients in transcript order
    #[serde(default)]
    pub ingredients: Vec<IngredientEntry>,

    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<StepEntry>,
}

/// Transcript text carried on a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeText {
    /// Normalized transcript
    pub original: String,

    /// Reserved for a Romanian translation; never filled by extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ro: Option<String>,
}

impl RecipeText {
    pub fn original(text: impl Into<String>) -> Self {
        Self {
            original: text.into(),
            ro: None,
        }
    }
}

/// A single ingredient line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientEntry {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<f64>,

    /// Lower-cased unit token as spoken ("cups", "tbsp", "g")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    pub category: Category,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl IngredientEntry {
    /// An ingredient with a parsed quantity and unit
    pub fn measured(name: impl Into<String>, qty: f64, unit: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            category: Category::for_ingredient(&name),
            name,
            qty: Some(qty),
            unit: Some(unit.into()),
            notes: None,
        }
    }

    /// An ingredient known only by name
    pub fn bare(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            category: Category::for_ingredient(&name),
            name,
            qty: None,
            unit: None,
            notes: None,
        }
    }
}

/// A single cooking step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepEntry {
    /// 1-based position in the step list
    pub index: u32,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Grocery category assigned to every ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Pantry,

    #[serde(rename = "Meat & Seafood")]
    MeatAndSeafood,

    Vegetables,

    #[serde(rename = "Dairy & Eggs")]
    DairyAndEggs,

    #[serde(rename = "Condiments & Oils")]
    CondimentsAndOils,

    Other,
}

impl Category {
    /// Classify an ingredient name against the keyword buckets
    pub fn for_ingredient(name: &str) -> Self {
        crate::extract::categorize_ingredient(name)
    }

    /// Display label, identical to the serialized form
    pub fn label(&self) -> &'static str {
        match self {
            Category::Pantry => "Pantry",
            Category::MeatAndSeafood => "Meat & Seafood",
            Category::Vegetables => "Vegetables",
            Category::DairyAndEggs => "Dairy & Eggs",
            Category::CondimentsAndOils => "Condiments & Oils",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
