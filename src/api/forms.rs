//! Form and query payloads shared by the HTML endpoints

use serde::{Deserialize, Serialize};

use crate::api::middleware::ApiError;
use crate::models::{AppConfig, DishEntry, DishInput};

/// `?search=&view=` on the list pages
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: String,
    pub view: Option<String>,
}

/// How the home page lays out dishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Cards,
    Table,
}

impl ViewMode {
    /// Anything other than `table` falls back to cards
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("table") => ViewMode::Table,
            _ => ViewMode::Cards,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Cards => "cards",
            ViewMode::Table => "table",
        }
    }
}

/// Flash messages carried back to the admin page after a tag action
#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    pub tag_success: Option<String>,
    pub tag_error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminSettingsForm {
    #[serde(default)]
    pub dish_types_input: String,
    #[serde(default)]
    pub admin_networks_input: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TagForm {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub tag_category: String,
}

/// A submitted dish form.
///
/// Decoded from raw `key=value` pairs since `dietary_tags` repeats once per
/// checked box.
#[derive(Debug, Default)]
pub struct DishForm {
    pub contributor: String,
    pub dish_name: String,
    pub dish_type: String,
    pub allergens: Option<String>,
    pub notes: Option<String>,
    pub dietary_tags: Vec<String>,
}

impl DishForm {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = DishForm::default();
        for (key, value) in pairs {
            match key.as_str() {
                "contributor" => form.contributor = value,
                "dish_name" => form.dish_name = value,
                "dish_type" => form.dish_type = value,
                "allergens" => form.allergens = Some(value),
                "notes" => form.notes = Some(value),
                "dietary_tags" => form.dietary_tags.push(value),
                _ => {}
            }
        }
        form
    }

    /// Convert to service input. Tag ids must be integers.
    pub fn into_input(self) -> Result<DishInput, ApiError> {
        let tag_ids = self
            .dietary_tags
            .iter()
            .map(|raw| raw.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ApiError::validation_error("Unknown dietary tag selected"))?;

        Ok(DishInput {
            contributor: self.contributor,
            dish_name: self.dish_name,
            dish_type: self.dish_type,
            allergens: self.allergens,
            notes: self.notes,
            tag_ids,
        })
    }
}

/// Values used to pre-fill the dish form template
#[derive(Debug, Default, Serialize)]
pub struct DishFormValues {
    pub contributor: String,
    pub dish_name: String,
    pub dish_type: String,
    pub allergens: String,
    pub notes: String,
    pub tag_ids: Vec<i64>,
}

impl DishFormValues {
    /// Blank form with the first configured dish type preselected
    pub fn blank(config: &AppConfig) -> Self {
        Self {
            dish_type: config.dish_types.first().cloned().unwrap_or_default(),
            ..Self::default()
        }
    }
}

impl From<&DishEntry> for DishFormValues {
    fn from(dish: &DishEntry) -> Self {
        Self {
            contributor: dish.contributor.clone(),
            dish_name: dish.dish_name.clone(),
            dish_type: dish.dish_type.clone(),
            allergens: dish.allergens.join(", "),
            notes: dish.notes.clone().unwrap_or_default(),
            tag_ids: dish.tag_ids.clone(),
        }
    }
}
