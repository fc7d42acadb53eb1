//! Application config model
//!
//! The admin-editable settings: which dish types may be submitted and which
//! client networks may reach the admin panel.

use serde::{Deserialize, Serialize};

/// Admin-editable application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Allowed dish types, in display order
    #[serde(default = "default_dish_types")]
    pub dish_types: Vec<String>,
    /// CIDR networks allowed to use the admin panel
    #[serde(default = "default_admin_networks")]
    pub admin_networks: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dish_types: default_dish_types(),
            admin_networks: default_admin_networks(),
        }
    }
}

fn default_dish_types() -> Vec<String> {
    ["Main Dish", "Side Dish", "Dessert", "Beverage"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_admin_networks() -> Vec<String> {
    vec!["127.0.0.1/32".to_string()]
}

impl AppConfig {
    /// Whether `dish_type` is one of the configured types (exact match)
    pub fn allows_dish_type(&self, dish_type: &str) -> bool {
        self.dish_types.iter().any(|t| t == dish_type)
    }
}
