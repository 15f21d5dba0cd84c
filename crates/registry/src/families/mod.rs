//! Built-in template families.
//!
//! Each family contributes its variants under its own namespace prefix.

pub mod controlnet;
pub mod llama;
pub mod stable_diffusion;

use crate::{Template, errors::RegistryError};

/// Every built-in family, in registration order.
pub fn builtin() -> Result<Vec<Vec<Template>>, RegistryError> {
    Ok(vec![stable_diffusion::templates()?, llama::templates()?, controlnet::templates()?])
}
