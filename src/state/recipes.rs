//! Recipe book with favorites and scaled views

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{settings::TemperatureUnit, Collaborators};
use crate::{
    error::{CompanionError, Result},
    services::StorageKey,
    utils::{
        conversions::{celsius_to_fahrenheit, fahrenheit_to_celsius},
        cups_to_grams, scale_recipe, Unit,
    },
};

pub type RecipeId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipeCategory {
    Cookies,
    Cakes,
    Bread,
    Pastries,
    Desserts,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
    pub unit: Unit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Oven temperature in both scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Temperature {
    pub celsius: i64,
    pub fahrenheit: i64,
}

impl Temperature {
    pub fn from_reading(value: f64, unit: TemperatureUnit) -> Self {
        match unit {
            TemperatureUnit::Celsius => Self {
                celsius: value.round() as i64,
                fahrenheit: celsius_to_fahrenheit(value),
            },
            TemperatureUnit::Fahrenheit => Self {
                celsius: fahrenheit_to_celsius(value),
                fahrenheit: value.round() as i64,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub category: RecipeCategory,
    #[serde(default)]
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<String>,
    /// Minutes
    pub prep_time: u32,
    /// Minutes
    pub bake_time: u32,
    pub temperature: Temperature,
    pub servings: u32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub last_baked: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Oven setting as entered by the user
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TemperatureReading {
    pub value: f64,
    pub unit: TemperatureUnit,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    pub title: String,
    pub category: RecipeCategory,
    #[serde(default)]
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub prep_time: u32,
    #[serde(default)]
    pub bake_time: u32,
    pub temperature: TemperatureReading,
    pub servings: u32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RecipeDraft {
    fn into_recipe(self, id: RecipeId) -> Result<Recipe> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(CompanionError::InvalidQuantity(
                "recipe title must not be empty".to_string(),
            ));
        }
        if self.servings == 0 {
            return Err(CompanionError::InvalidQuantity(
                "a recipe must make at least one serving".to_string(),
            ));
        }
        if let Some(bad) = self.ingredients.iter().find(|i| !(i.amount >= 0.0)) {
            return Err(CompanionError::InvalidQuantity(format!(
                "ingredient {} has amount {}",
                bad.name, bad.amount
            )));
        }

        Ok(Recipe {
            id,
            title,
            category: self.category,
            description: self.description,
            ingredients: self.ingredients,
            steps: self.steps,
            prep_time: self.prep_time,
            bake_time: self.bake_time,
            temperature: Temperature::from_reading(self.temperature.value, self.temperature.unit),
            servings: self.servings,
            notes: self.notes,
            is_favorite: false,
            last_baked: None,
            tags: self.tags.into_iter().map(|t| t.trim().to_lowercase()).collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledIngredient {
    pub name: String,
    pub amount: f64,
    pub unit: Unit,
    /// Weight estimate for cup measures of known ingredients
    pub grams: Option<i64>,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledRecipe {
    pub id: RecipeId,
    pub title: String,
    pub factor: f64,
    pub servings: u32,
    pub total_time: u32,
    pub ingredients: Vec<ScaledIngredient>,
}

#[derive(Debug)]
pub struct RecipeBook {
    recipes: IndexMap<RecipeId, Recipe>,
    collab: Collaborators,
}

impl RecipeBook {
    pub fn new(collab: Collaborators) -> Self {
        Self {
            recipes: IndexMap::new(),
            collab,
        }
    }

    pub fn load(collab: Collaborators) -> Self {
        let saved: Vec<Recipe> = collab.load(StorageKey::Recipes).unwrap_or_default();
        let mut book = Self::new(collab);
        book.recipes = saved.into_iter().map(|r| (r.id, r)).collect();
        info!("Loaded {} recipes", book.recipes.len());
        book
    }

    /// All recipes, optionally only favorites or those carrying `tag`
    pub fn list(&self, favorites_only: bool, tag: Option<&str>) -> Vec<Recipe> {
        let tag = tag.map(|t| t.trim().to_lowercase());
        self.recipes
            .values()
            .filter(|r| !favorites_only || r.is_favorite)
            .filter(|r| tag.as_ref().map_or(true, |t| r.tags.contains(t)))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: RecipeId) -> Result<&Recipe> {
        self.recipes
            .get(&id)
            .ok_or_else(|| CompanionError::not_found("recipe", id))
    }

    pub fn add(&mut self, draft: RecipeDraft) -> Result<Recipe> {
        let recipe = draft.into_recipe(Uuid::new_v4())?;
        info!("Added recipe {} ({})", recipe.id, recipe.title);
        Ok(self.insert(recipe))
    }

    pub fn update(&mut self, id: RecipeId, draft: RecipeDraft) -> Result<Recipe> {
        let existing = self.get(id)?;
        let (is_favorite, last_baked) = (existing.is_favorite, existing.last_baked);
        let mut recipe = draft.into_recipe(id)?;
        recipe.is_favorite = is_favorite;
        recipe.last_baked = last_baked;
        info!("Updated recipe {} ({})", id, recipe.title);
        Ok(self.insert(recipe))
    }

    pub fn delete(&mut self, id: RecipeId) -> Result<Recipe> {
        let recipe = self
            .recipes
            .shift_remove(&id)
            .ok_or_else(|| CompanionError::not_found("recipe", id))?;
        info!("Deleted recipe {} ({})", id, recipe.title);
        self.save();
        Ok(recipe)
    }

    pub fn toggle_favorite(&mut self, id: RecipeId) -> Result<Recipe> {
        self.modify(id, |r| r.is_favorite = !r.is_favorite)
    }

    pub fn mark_baked(&mut self, id: RecipeId, now: DateTime<Utc>) -> Result<Recipe> {
        self.modify(id, |r| r.last_baked = Some(now))
    }

    /// Ingredient amounts and servings multiplied by `factor`
    pub fn scaled(&self, id: RecipeId, factor: f64) -> Result<ScaledRecipe> {
        if !(factor > 0.0 && factor.is_finite()) {
            return Err(CompanionError::InvalidQuantity(format!(
                "scale factor must be positive, got {}",
                factor
            )));
        }
        let recipe = self.get(id)?;

        let ingredients = recipe
            .ingredients
            .iter()
            .map(|ingredient| {
                let amount = scale_recipe(ingredient.amount, factor);
                let (grams, notice) = match ingredient.unit {
                    Unit::Cup => match cups_to_grams(&ingredient.name, amount) {
                        Some(grams) => (Some(grams), None),
                        None => (None, Some(format!("scale manually: {}×", factor))),
                    },
                    _ => (None, None),
                };
                ScaledIngredient {
                    name: ingredient.name.clone(),
                    amount,
                    unit: ingredient.unit,
                    grams,
                    notice,
                }
            })
            .collect();

        Ok(ScaledRecipe {
            id,
            title: recipe.title.clone(),
            factor,
            servings: (recipe.servings as f64 * factor).round() as u32,
            total_time: recipe.prep_time + recipe.bake_time,
            ingredients,
        })
    }

    fn modify(&mut self, id: RecipeId, change: impl FnOnce(&mut Recipe)) -> Result<Recipe> {
        let recipe = self
            .recipes
            .get_mut(&id)
            .ok_or_else(|| CompanionError::not_found("recipe", id))?;
        change(recipe);
        let recipe = recipe.clone();
        self.save();
        Ok(recipe)
    }

    fn insert(&mut self, recipe: Recipe) -> Recipe {
        self.recipes.insert(recipe.id, recipe.clone());
        self.save();
        recipe
    }

    fn save(&self) {
        let snapshot: Vec<&Recipe> = self.recipes.values().collect();
        self.collab.persist(StorageKey::Recipes, &snapshot);
    }
}
