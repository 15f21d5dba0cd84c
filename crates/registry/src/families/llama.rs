//! Language models (`llama/*`).

use serde_json::{Value, json};

use crate::{Template, errors::RegistryError};

const FAMILY: &str = "llama";

fn sampling_properties(max_tokens: u32) -> Value {
    json!({
        "prompt": { "type": "string", "description": "Prompt to complete" },
        "system_prompt": { "type": "string", "description": "Instructions that steer every response" },
        "max_new_tokens": { "type": "integer", "minimum": 1, "maximum": max_tokens },
        "min_new_tokens": { "type": "integer", "minimum": 0, "maximum": max_tokens },
        "temperature": { "type": "number", "minimum": 0.01, "maximum": 5 },
        "top_p": { "type": "number", "minimum": 0, "maximum": 1 },
        "top_k": { "type": "integer", "minimum": 0, "maximum": 1000 },
        "repetition_penalty": { "type": "number", "minimum": 0, "maximum": 2 },
        "stop_sequences": { "type": "string", "description": "Comma-separated sequences that end generation" },
        "seed": { "type": "integer" }
    })
}

fn chat() -> Result<Template, RegistryError> {
    Template::define(
        FAMILY,
        "chat",
        json!({
            "name": "LLaMA Chat Parameters",
            "description": "Conversational defaults for LLaMA chat models",
            "model_type": "llm",
            "version": "1.0.0",
            "default_parameters": {
                "system_prompt": "You are a helpful assistant.",
                "max_new_tokens": 512,
                "min_new_tokens": 0,
                "temperature": 0.7,
                "top_p": 0.9,
                "top_k": 50,
                "repetition_penalty": 1.15
            },
            "parameter_schema": {
                "type": "object",
                "properties": sampling_properties(4096),
                "required": ["prompt"]
            }
        }),
    )
}

fn code() -> Result<Template, RegistryError> {
    Template::define(
        FAMILY,
        "code",
        json!({
            "name": "Code LLaMA Parameters",
            "description": "Low-temperature defaults for code generation models",
            "model_type": "llm",
            "version": "1.0.0",
            "default_parameters": {
                "max_new_tokens": 1024,
                "min_new_tokens": 0,
                "temperature": 0.2,
                "top_p": 0.95,
                "top_k": 10,
                "repetition_penalty": 1.1
            },
            "parameter_schema": {
                "type": "object",
                "properties": sampling_properties(8192),
                "required": ["prompt"]
            }
        }),
    )
}

pub fn templates() -> Result<Vec<Template>, RegistryError> {
    Ok(vec![chat()?, code()?])
}
