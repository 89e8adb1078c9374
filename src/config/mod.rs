//! Client-side configuration: provider/model settings and the
//! persisted session context.

mod context;
mod provider;

pub use context::{ContextError, ContextStore, SessionContext, SidebarVisibility, Theme};
pub use provider::{ModelConfig, Provider, DEFAULT_TEMPERATURE, PENDING};
