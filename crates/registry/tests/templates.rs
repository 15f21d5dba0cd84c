use replicate_mcp_registry::{RegistryError, Template, TemplateError, TemplateRegistry, families};
use replicate_mcp_util::Constraint;
use serde_json::{Map, Value, json};

fn registry() -> TemplateRegistry {
    TemplateRegistry::builtin().expect("built-in templates load")
}

fn params(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

/// Fills every required field with a plausible string so defaults can be checked on their own.
fn required_inputs(template: &Template) -> Map<String, Value> {
    template
        .parameter_schema
        .required
        .iter()
        .map(|field| (field.clone(), Value::String(format!("sample {field}"))))
        .collect()
}

#[test]
fn builtin_registry_exposes_every_family_variant() {
    let registry = registry();
    let ids: Vec<_> = registry.ids().collect();
    assert_eq!(
        ids,
        vec![
            "sd/sdxl",
            "sd/sd15",
            "llama/chat",
            "llama/code",
            "controlnet/canny",
            "controlnet/depth",
            "controlnet/pose",
            "controlnet/segmentation",
        ]
    );
    for template in registry.templates() {
        assert_eq!(template.version, "1.0.0", "{} version", template.id);
    }
}

#[test]
fn defaults_plus_required_inputs_pass_validation_unchanged() {
    for template in registry().templates() {
        let merged = template
            .validate(&required_inputs(template))
            .unwrap_or_else(|error| panic!("{} defaults rejected: {error}", template.id));
        for (field, value) in &template.default_parameters {
            assert_eq!(merged.get(field), Some(value), "{} default {field}", template.id);
        }
    }
}

#[test]
fn resolve_unknown_template_lists_alternatives() {
    let error = registry().resolve("sd/unknown").expect_err("missing template");
    match error {
        TemplateError::NotFound { template_id, available } => {
            assert_eq!(template_id, "sd/unknown");
            assert!(available.contains("sd/sdxl"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn explicit_parameters_override_defaults() {
    let merged = registry()
        .validate("sd/sdxl", &params(json!({ "prompt": "a lighthouse", "width": 768 })))
        .expect("valid parameters");
    assert_eq!(merged["width"], json!(768));
    assert_eq!(merged["height"], json!(1024));
    assert_eq!(merged["scheduler"], json!("K_EULER"));
    assert_eq!(merged["prompt"], json!("a lighthouse"));
}

#[test]
fn violations_name_the_template_and_field() {
    let error = registry()
        .validate("sd/sdxl", &params(json!({ "prompt": "x", "width": 100 })))
        .expect_err("width below minimum");
    assert_eq!(
        error,
        TemplateError::Validation {
            template_id: "sd/sdxl".into(),
            field: "width".into(),
            constraint: Constraint::Minimum(512.0),
        }
    );

    let error = registry()
        .validate("controlnet/segmentation", &params(json!({ "prompt": "x", "image": "y", "output_type": "voc" })))
        .expect_err("bad enum");
    assert_eq!(error.field(), Some("output_type"));
}

#[test]
fn missing_required_inputs_are_reported() {
    let error = registry()
        .validate("controlnet/canny", &params(json!({ "prompt": "edges" })))
        .expect_err("image missing");
    assert_eq!(error.field(), Some("image"));
    assert!(error.to_string().contains("is required"));
}

#[test]
fn open_templates_pass_unknown_fields_through() {
    let merged = registry()
        .validate("llama/chat", &params(json!({ "prompt": "hi", "custom_flag": true })))
        .expect("open schema");
    assert_eq!(merged["custom_flag"], json!(true));
}

#[test]
fn controlnet_variants_share_the_base_rules() {
    let registry = registry();
    for variant in ["canny", "depth", "pose", "segmentation"] {
        let template = registry.resolve(&format!("controlnet/{variant}")).expect("variant exists");
        assert_eq!(template.control_type.as_deref(), Some(variant));
        assert!(template.parameter_schema.properties.contains_key("controlnet_conditioning_scale"));
        assert_eq!(template.parameter_schema.required, vec!["prompt".to_string(), "image".to_string()]);
        assert_eq!(template.default_parameters["num_inference_steps"], json!(30));
    }
}

#[test]
fn duplicate_ids_are_a_startup_error() {
    let sd = families::stable_diffusion::templates().expect("family loads");
    let error = TemplateRegistry::from_families([sd.clone(), sd]).expect_err("collision");
    assert!(matches!(error, RegistryError::DuplicateTemplate { ref id } if id == "sd/sdxl"));
}

#[test]
fn templates_serialize_with_json_schema_rules() {
    let registry = registry();
    let template = registry.resolve("sd/sd15").expect("exists");
    let encoded = serde_json::to_value(template).expect("serializes");
    assert_eq!(encoded["id"], json!("sd/sd15"));
    assert_eq!(encoded["parameter_schema"]["type"], json!("object"));
    assert_eq!(encoded["parameter_schema"]["properties"]["width"]["multipleOf"], json!(8.0));
    assert!(encoded.get("control_type").is_none());
}
