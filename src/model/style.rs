/// CSS properties the applicator writes
pub const BACKGROUND: &str = "background";
pub const BACKGROUND_COLOR: &str = "background-color";
pub const COLOR: &str = "color";
pub const OPACITY: &str = "opacity";

const TRANSPARENT: &str = "transparent";
const DEFAULT_BACKGROUND: &str = "#fff";
const COUNTER_GREY: &str = "rgb(165, 161, 172)";

/// Diagonal red stripes over lavender, so the owner can tell a task is hidden
const CENSOR_STRIPES: &str =
    "repeating-linear-gradient( 45deg, #fd3030, #fd3030 5px, #e5e5f7 5px, #e5e5f7 25px )";

/// The full set of values one rendering of a task uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLook {
    pub background: String,
    pub background_color: String,
    pub title_color: String,
    pub description_color: String,
    pub icon_opacity: String,
    pub counter_color: String,
    pub vector_icon_color: String,
}

impl TaskLook {
    /// Habitica's own task colors
    pub fn standard() -> Self {
        TaskLook {
            background: DEFAULT_BACKGROUND.into(),
            background_color: DEFAULT_BACKGROUND.into(),
            title_color: "rgb(52, 49, 58)".into(),
            description_color: "rgb(104, 98, 116)".into(),
            icon_opacity: "1".into(),
            counter_color: COUNTER_GREY.into(),
            vector_icon_color: COUNTER_GREY.into(),
        }
    }

    /// Striped background, every text and icon layer invisible
    pub fn censored() -> Self {
        TaskLook {
            background: CENSOR_STRIPES.into(),
            background_color: "#d5c8ff".into(),
            title_color: TRANSPARENT.into(),
            description_color: TRANSPARENT.into(),
            icon_opacity: "0".into(),
            counter_color: TRANSPARENT.into(),
            vector_icon_color: TRANSPARENT.into(),
        }
    }
}

/// The two looks a task can have
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub standard: TaskLook,
    pub censored: TaskLook,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            standard: TaskLook::standard(),
            censored: TaskLook::censored(),
        }
    }
}
