//! Registry crate for model parameter templates.
//!
//! A template bundles default parameters and declarative validation rules
//! for one model family variant. Templates live in a flat
//! `<family>/<variant>` namespace assembled once at startup from the
//! built-in families in [`families`], and are read-only afterwards.

mod errors;
pub mod families;
mod models;
mod template;

pub use errors::{RegistryError, TemplateError};
pub use models::TemplateRegistry;
pub use template::Template;
