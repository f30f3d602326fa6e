use crate::model::style::Palette;

/// Everything that ties veil to one page's markup. The default describes
/// Habitica; embedders adjust fields before compiling to
/// [`Rules`](crate::ops::rules::Rules).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VeilConfig {
    pub selectors: SelectorConfig,
    pub categories: Vec<CategoryConfig>,
    pub marker: MarkerConfig,
    pub palette: Palette,
}

impl Default for VeilConfig {
    fn default() -> Self {
        VeilConfig {
            selectors: SelectorConfig::default(),
            categories: default_categories(),
            marker: MarkerConfig::default(),
            palette: Palette::default(),
        }
    }
}

/// Where things live inside the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Every rendered task content node
    pub tasks: String,
    /// Within a task
    pub title: String,
    /// Within a task; also the node inspected for secrecy
    pub description: String,
    /// Inline images (emoji) within a task or description
    pub icons: String,
    /// Counter and badge spans within a task
    pub counters: String,
    /// Vector icons within a task
    pub vector_icons: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig {
            tasks: ".task-wrapper > .type_habit .task-content, \
                    .task-wrapper > .type_daily .task-content"
                .to_string(),
            title: "h3 > p".to_string(),
            description: "div > p".to_string(),
            icons: "img".to_string(),
            counters: "span".to_string(),
            vector_icons: "svg".to_string(),
        }
    }
}

/// A task list column, identified by its list container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryConfig {
    pub name: String,
    pub container: String,
}

fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig {
            name: "habit".to_string(),
            container: ".habit .sortable-tasks".to_string(),
        },
        CategoryConfig {
            name: "daily".to_string(),
            container: ".daily .sortable-tasks".to_string(),
        },
    ]
}

/// How a description marks its task as secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerConfig {
    /// Leading glyph of the trimmed description text
    pub glyph: String,
    /// Suffix of the first embedded image's `src`
    pub image_suffix: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        MarkerConfig {
            glyph: "\u{3299}".to_string(),
            image_suffix: "secret.png".to_string(),
        }
    }
}
