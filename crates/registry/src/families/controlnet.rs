//! Conditioning-control image models (`controlnet/*`).
//!
//! All variants share one base rule set and default bundle, then add the
//! preprocessor settings specific to their control type.

use serde_json::{Map, Value, json};

use crate::{Template, errors::RegistryError};

const FAMILY: &str = "controlnet";

fn base_defaults() -> Value {
    json!({
        "num_inference_steps": 30,
        "guidance_scale": 7.5,
        "controlnet_conditioning_scale": 1.0,
        "control_guidance_start": 0.0,
        "control_guidance_end": 1.0,
        "scheduler": "K_EULER"
    })
}

fn base_properties() -> Value {
    json!({
        "prompt": { "type": "string", "description": "Text prompt for image generation" },
        "negative_prompt": { "type": "string", "description": "Text prompt for elements to avoid" },
        "image": { "type": "string", "description": "Control image as a URL or base64 data URI" },
        "num_inference_steps": { "type": "integer", "minimum": 1, "maximum": 100 },
        "guidance_scale": { "type": "number", "minimum": 1, "maximum": 20 },
        "controlnet_conditioning_scale": { "type": "number", "minimum": 0.0, "maximum": 2.0 },
        "control_guidance_start": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
        "control_guidance_end": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
        "scheduler": { "type": "string", "enum": ["DDIM", "DPM_MULTISTEP", "K_EULER"] }
    })
}

fn extend(mut base: Value, extra: Value) -> Value {
    if let (Some(target), Value::Object(additions)) = (base.as_object_mut(), extra) {
        target.extend(additions);
    }
    base
}

fn variant(control_type: &str, name: &str, description: &str, defaults: Value, properties: Value) -> Result<Template, RegistryError> {
    let mut definition = Map::new();
    definition.insert("name".into(), json!(name));
    definition.insert("description".into(), json!(description));
    definition.insert("model_type".into(), json!("controlnet"));
    definition.insert("control_type".into(), json!(control_type));
    definition.insert("version".into(), json!("1.0.0"));
    definition.insert("default_parameters".into(), extend(base_defaults(), defaults));
    definition.insert(
        "parameter_schema".into(),
        json!({
            "type": "object",
            "properties": extend(base_properties(), properties),
            "required": ["prompt", "image"]
        }),
    );
    Template::define(FAMILY, control_type, Value::Object(definition))
}

fn detect_resolution() -> Value {
    json!({ "type": "integer", "minimum": 128, "maximum": 1024 })
}

pub fn templates() -> Result<Vec<Template>, RegistryError> {
    Ok(vec![
        variant(
            "canny",
            "ControlNet Canny Parameters",
            "Parameters for ControlNet Canny edge detection models",
            json!({ "low_threshold": 100, "high_threshold": 200 }),
            json!({
                "low_threshold": { "type": "integer", "minimum": 1, "maximum": 255 },
                "high_threshold": { "type": "integer", "minimum": 1, "maximum": 255 }
            }),
        )?,
        variant(
            "depth",
            "ControlNet Depth Parameters",
            "Parameters for ControlNet depth estimation models",
            json!({ "detect_resolution": 512, "boost": 1.0 }),
            json!({
                "detect_resolution": detect_resolution(),
                "boost": { "type": "number", "minimum": 0.0, "maximum": 2.0 }
            }),
        )?,
        variant(
            "pose",
            "ControlNet Pose Parameters",
            "Parameters for ControlNet pose detection models",
            json!({ "detect_resolution": 512, "include_hand_pose": true, "include_face_landmarks": true }),
            json!({
                "detect_resolution": detect_resolution(),
                "include_hand_pose": { "type": "boolean" },
                "include_face_landmarks": { "type": "boolean" }
            }),
        )?,
        variant(
            "segmentation",
            "ControlNet Segmentation Parameters",
            "Parameters for ControlNet segmentation models",
            json!({ "detect_resolution": 512, "output_type": "ade20k" }),
            json!({
                "detect_resolution": detect_resolution(),
                "output_type": { "type": "string", "enum": ["ade20k", "coco"] }
            }),
        )?,
    ])
}
