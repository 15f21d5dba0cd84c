//! Diffusion image models (`sd/*`).

use serde_json::{Value, json};

use crate::{Template, errors::RegistryError};

const FAMILY: &str = "sd";
const SCHEDULERS: [&str; 3] = ["DDIM", "DPM_MULTISTEP", "K_EULER"];

fn prompt_properties() -> Value {
    json!({
        "prompt": { "type": "string", "description": "Text prompt for image generation" },
        "negative_prompt": { "type": "string", "description": "Text prompt for elements to avoid" },
        "num_inference_steps": { "type": "integer", "minimum": 1, "maximum": 100 },
        "guidance_scale": { "type": "number", "minimum": 1, "maximum": 20 },
        "scheduler": { "type": "string", "enum": SCHEDULERS },
        "num_outputs": { "type": "integer", "minimum": 1, "maximum": 4 },
        "seed": { "type": "integer", "description": "Random seed; omit for a random one" }
    })
}

fn dimension(minimum: u32, maximum: u32) -> Value {
    json!({ "type": "integer", "minimum": minimum, "maximum": maximum, "multipleOf": 8 })
}

fn sdxl() -> Result<Template, RegistryError> {
    let mut properties = prompt_properties();
    properties["width"] = dimension(512, 2048);
    properties["height"] = dimension(512, 2048);
    properties["prompt_strength"] = json!({ "type": "number", "minimum": 0, "maximum": 1 });
    properties["refine"] = json!({
        "type": "string",
        "enum": ["no_refiner", "expert_ensemble_refiner", "base_image_refiner"]
    });

    Template::define(
        FAMILY,
        "sdxl",
        json!({
            "name": "SDXL Base Parameters",
            "description": "Default parameters for SDXL models",
            "model_type": "stable-diffusion",
            "version": "1.0.0",
            "default_parameters": {
                "width": 1024,
                "height": 1024,
                "num_inference_steps": 50,
                "guidance_scale": 7.5,
                "prompt_strength": 1.0,
                "refine": "expert_ensemble_refiner",
                "scheduler": "K_EULER",
                "num_outputs": 1
            },
            "parameter_schema": { "type": "object", "properties": properties, "required": ["prompt"] }
        }),
    )
}

fn sd15() -> Result<Template, RegistryError> {
    let mut properties = prompt_properties();
    properties["width"] = dimension(256, 1024);
    properties["height"] = dimension(256, 1024);

    Template::define(
        FAMILY,
        "sd15",
        json!({
            "name": "Stable Diffusion 1.5 Parameters",
            "description": "Default parameters for SD 1.5 models",
            "model_type": "stable-diffusion",
            "version": "1.0.0",
            "default_parameters": {
                "width": 512,
                "height": 512,
                "num_inference_steps": 50,
                "guidance_scale": 7.5,
                "scheduler": "K_EULER",
                "num_outputs": 1
            },
            "parameter_schema": { "type": "object", "properties": properties, "required": ["prompt"] }
        }),
    )
}

pub fn templates() -> Result<Vec<Template>, RegistryError> {
    Ok(vec![sdxl()?, sd15()?])
}
