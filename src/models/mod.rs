//! 数据模型层

pub mod change;
pub mod edit_history;
pub mod project;

pub use change::{Change, ChangeRecord};
pub use edit_history::{EditHistory, EditHistoryCommit, EditHistoryConfig, EditHistoryStage};
pub use project::{Element, ElementDoc, ElementId, Project, ProjectDoc, ProjectError};
