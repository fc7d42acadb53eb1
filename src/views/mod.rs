//! View engine
//!
//! Server-side HTML rendering with Tera. Templates ship inside the binary
//! (from `templates/`) and are loaded once at startup together with the
//! display filters used by the dish list:
//! - `dietary_badge_class` maps a dietary flag to badge CSS classes
//! - `format_dish_timestamp` renders a stored timestamp in local time

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use rust_embed::RustEmbed;
use std::collections::HashMap;
use std::error::Error as StdError;
use tera::{Context as TeraContext, Tera, Value};

use crate::models::parse_timestamp;

mod error;

pub use error::ViewError;

/// Bundled page templates
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct TemplateAssets;

const PLANT_BASED_FLAGS: [&str; 2] = ["vegan", "vegetarian"];
const ALLERGEN_FREE_FLAGS: [&str; 2] = ["gluten-free", "dairy-free"];

/// Display format for dish timestamps, e.g. `Nov 28, 2024 05:00 PM`
pub const DISH_TIMESTAMP_FORMAT: &str = "%b %d, %Y %I:%M %p";

/// Renders the bundled templates
pub struct ViewEngine {
    tera: Tera,
}

impl ViewEngine {
    /// Load every bundled template and register the custom filters
    pub fn new() -> Result<Self> {
        let mut templates = Vec::new();
        for name in TemplateAssets::iter() {
            let file = TemplateAssets::get(&name)
                .ok_or_else(|| ViewError::LoadError(format!("Missing template {}", name)))?;
            let content = std::str::from_utf8(&file.data)
                .map_err(|e| ViewError::LoadError(format!("{} is not UTF-8: {}", name, e)))?
                .to_string();
            templates.push((name.to_string(), content));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| ViewError::LoadError(error_chain(&e)))?;
        tera.register_filter("dietary_badge_class", dietary_badge_class_filter);
        tera.register_filter("format_dish_timestamp", format_dish_timestamp_filter);

        tracing::debug!("Loaded {} templates", tera.get_template_names().count());
        Ok(Self { tera })
    }

    /// Render a template by name
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            ViewError::TemplateError(format!("Failed to render '{}': {}", template, error_chain(&e)))
                .into()
        })
    }
}

fn error_chain(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

/// Badge classes for a dietary flag (trimmed, case-insensitive)
pub fn dietary_badge_class(flag: &str) -> &'static str {
    let normalized = flag.trim().to_lowercase();
    if PLANT_BASED_FLAGS.contains(&normalized.as_str()) {
        "bg-success-subtle text-success"
    } else if ALLERGEN_FREE_FLAGS.contains(&normalized.as_str()) {
        "bg-info-subtle text-info"
    } else {
        "bg-secondary-subtle text-secondary"
    }
}

/// Format `timestamp` in `tz` using [`DISH_TIMESTAMP_FORMAT`]
pub fn format_timestamp_in<Tz>(timestamp: DateTime<chrono::Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    timestamp
        .with_timezone(tz)
        .format(DISH_TIMESTAMP_FORMAT)
        .to_string()
}

fn dietary_badge_class_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let flag = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("dietary_badge_class expects a string"))?;
    Ok(Value::String(dietary_badge_class(flag).to_string()))
}

fn format_dish_timestamp_filter(
    value: &Value,
    _args: &HashMap<String, Value>,
) -> tera::Result<Value> {
    let raw = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("format_dish_timestamp expects a string"))?;
    let formatted = match parse_timestamp(raw) {
        Some(timestamp) => format_timestamp_in(timestamp, &Local),
        None => raw.to_string(),
    };
    Ok(Value::String(formatted))
}
