pub mod config;
pub mod dom;
pub mod page;
pub mod style;

pub use config::*;
pub use dom::{Document, Notification};
pub use ego_tree::NodeId;
pub use page::*;
pub use style::{Palette, TaskLook};
