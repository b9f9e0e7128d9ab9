//! Section handler implementations.

mod section;

pub use section::{DocumentsChangeHandler, PromptsChangeHandler, SectionChangeHandler, ToolsChangeHandler};
