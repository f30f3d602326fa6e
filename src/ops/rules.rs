use crate::model::config::{MarkerConfig, VeilConfig};
use crate::model::style::Palette;
use crate::parse::{Selector, SelectorError};

/// Error type for validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field} selector {selector:?}: {source}")]
    InvalidSelector {
        field: String,
        selector: String,
        source: SelectorError,
    },
    #[error("marker {0} must not be empty")]
    EmptyMarker(&'static str),
    #[error("no task categories configured")]
    NoCategories,
}

/// A task list column and the selector for its list container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub container: Selector,
}

/// Validated, ready-to-use configuration: every selector parsed once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    pub tasks: Selector,
    pub title: Selector,
    pub description: Selector,
    pub icons: Selector,
    pub counters: Selector,
    pub vector_icons: Selector,
    pub categories: Vec<Category>,
    pub marker: MarkerConfig,
    pub palette: Palette,
}

fn compile_selector(field: &str, text: &str) -> Result<Selector, ConfigError> {
    Selector::parse(text).map_err(|source| ConfigError::InvalidSelector {
        field: field.to_string(),
        selector: text.to_string(),
        source,
    })
}

impl Rules {
    pub fn compile(config: &VeilConfig) -> Result<Self, ConfigError> {
        let s = &config.selectors;

        if config.marker.glyph.is_empty() {
            return Err(ConfigError::EmptyMarker("glyph"));
        }
        if config.marker.image_suffix.is_empty() {
            return Err(ConfigError::EmptyMarker("image_suffix"));
        }
        if config.categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }

        let categories = config
            .categories
            .iter()
            .map(|c| {
                Ok(Category {
                    name: c.name.clone(),
                    container: compile_selector(&format!("{} container", c.name), &c.container)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Rules {
            tasks: compile_selector("tasks", &s.tasks)?,
            title: compile_selector("title", &s.title)?,
            description: compile_selector("description", &s.description)?,
            icons: compile_selector("icons", &s.icons)?,
            counters: compile_selector("counters", &s.counters)?,
            vector_icons: compile_selector("vector_icons", &s.vector_icons)?,
            categories,
            marker: config.marker.clone(),
            palette: config.palette.clone(),
        })
    }

    /// Rules for Habitica's stock markup
    pub fn habitica() -> Result<Self, ConfigError> {
        Self::compile(&VeilConfig::default())
    }
}
