//! # Parameter Schema Rules
//!
//! A small, data-driven interpreter for the JSON-schema subset used by tool
//! inputs and model parameter templates: `type`, `enum`, `minimum`, `maximum`,
//! `multipleOf`, `minLength`, `items`, `required`, and `additionalProperties`.
//!
//! Rules are plain data. Adding a template or a tool never requires new
//! validation code, only a new [`ParameterSchema`] value.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

const FLOAT_TOLERANCE: f64 = 1e-9;

/// Primitive JSON type a property must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Object => "object",
            ValueKind::Array => "array",
        }
    }

    /// Whether `value` satisfies this type. Integral floats such as `4.0` count as integers.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Integer => {
                value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|number| number.fract() == 0.0)
            }
            ValueKind::Number => value.is_number(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::Object => value.is_object(),
            ValueKind::Array => value.is_array(),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation rules for a single property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRule {
    #[serde(rename = "type")]
    pub kind: ValueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertyRule>>,
}

impl PropertyRule {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            description: None,
            enum_values: Vec::new(),
            minimum: None,
            maximum: None,
            multiple_of: None,
            min_length: None,
            items: None,
        }
    }

    pub fn string() -> Self {
        Self::new(ValueKind::String)
    }

    /// A string that must contain at least one character.
    pub fn non_empty_string() -> Self {
        Self::new(ValueKind::String).min_length(1)
    }

    pub fn integer() -> Self {
        Self::new(ValueKind::Integer)
    }

    pub fn boolean() -> Self {
        Self::new(ValueKind::Boolean)
    }

    pub fn object() -> Self {
        Self::new(ValueKind::Object)
    }

    pub fn array_of(items: PropertyRule) -> Self {
        let mut rule = Self::new(ValueKind::Array);
        rule.items = Some(Box::new(items));
        rule
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    pub fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    /// Checks `value` against this rule, reporting the first violated constraint.
    pub fn check(&self, field: &str, value: &Value) -> Result<(), SchemaViolation> {
        if !self.kind.matches(value) {
            return Err(SchemaViolation::new(field, Constraint::Type { expected: self.kind }));
        }

        if !self.enum_values.is_empty() && !self.enum_values.contains(value) {
            return Err(SchemaViolation::new(
                field,
                Constraint::Enum {
                    allowed: self.enum_values.clone(),
                },
            ));
        }

        if let Some(number) = value.as_f64() {
            if let Some(minimum) = self.minimum
                && number < minimum
            {
                return Err(SchemaViolation::new(field, Constraint::Minimum(minimum)));
            }
            if let Some(maximum) = self.maximum
                && number > maximum
            {
                return Err(SchemaViolation::new(field, Constraint::Maximum(maximum)));
            }
            if let Some(step) = self.multiple_of
                && step > 0.0
                && (number % step).abs() > FLOAT_TOLERANCE
            {
                return Err(SchemaViolation::new(field, Constraint::MultipleOf(step)));
            }
        }

        if let (Some(text), Some(length)) = (value.as_str(), self.min_length)
            && text.trim().chars().count() < length
        {
            return Err(SchemaViolation::new(field, Constraint::MinLength(length)));
        }

        if let (Some(elements), Some(item_rule)) = (value.as_array(), self.items.as_deref()) {
            for (index, element) in elements.iter().enumerate() {
                item_rule.check(&format!("{field}[{index}]"), element)?;
            }
        }

        Ok(())
    }
}

/// Rules for an object-shaped parameter bundle.
///
/// Deserializes from (and serializes to) the JSON-schema form
/// `{"type": "object", "properties": {...}, "required": [...], "additionalProperties": bool}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSchema {
    #[serde(default)]
    pub properties: IndexMap<String, PropertyRule>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default = "default_additional_properties")]
    pub additional_properties: bool,
}

fn default_additional_properties() -> bool {
    true
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self::object()
    }
}

impl ParameterSchema {
    /// An open object schema with no declared properties.
    pub fn object() -> Self {
        Self {
            properties: IndexMap::new(),
            required: Vec::new(),
            additional_properties: true,
        }
    }

    pub fn property(mut self, name: impl Into<String>, rule: PropertyRule) -> Self {
        self.properties.insert(name.into(), rule);
        self
    }

    pub fn required_property(mut self, name: impl Into<String>, rule: PropertyRule) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.properties.insert(name, rule);
        self
    }

    /// Rejects fields not declared in `properties`.
    pub fn closed(mut self) -> Self {
        self.additional_properties = false;
        self
    }

    pub fn is_closed(&self) -> bool {
        !self.additional_properties
    }

    /// Validates a parameter bundle.
    ///
    /// Required fields are checked first in declaration order, then declared
    /// properties in declaration order, then undeclared fields. `null` is
    /// treated as absent. Returns the first violation found.
    pub fn validate(&self, parameters: &Map<String, Value>) -> Result<(), SchemaViolation> {
        for field in &self.required {
            if parameters.get(field).is_none_or(Value::is_null) {
                return Err(SchemaViolation::new(field, Constraint::Required));
            }
        }

        for (field, rule) in &self.properties {
            match parameters.get(field) {
                None | Some(Value::Null) => continue,
                Some(value) => rule.check(field, value)?,
            }
        }

        if self.is_closed()
            && let Some(unknown) = parameters.keys().find(|key| !self.properties.contains_key(*key))
        {
            return Err(SchemaViolation::new(unknown, Constraint::UnknownField));
        }

        Ok(())
    }

    /// Rewrites integral floats (`1024.0`) in integer-typed properties as integers.
    ///
    /// Run after [`validate`](Self::validate); values that are not integral are left alone.
    pub fn normalize_integers(&self, parameters: &mut Map<String, Value>) {
        for (field, rule) in &self.properties {
            if rule.kind == ValueKind::Integer
                && let Some(value) = parameters.get_mut(field)
                && !value.is_i64()
                && !value.is_u64()
                && let Some(number) = value.as_f64()
                && number.fract() == 0.0
            {
                *value = Value::from(number as i64);
            }
        }
    }

    /// Renders the rules as a JSON-schema object for host introspection.
    pub fn to_json_schema(&self) -> Map<String, Value> {
        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::String("object".to_string()));
        let properties = self
            .properties
            .iter()
            .map(|(name, rule)| (name.clone(), serde_json::to_value(rule).unwrap_or(Value::Null)))
            .collect::<Map<String, Value>>();
        schema.insert("properties".to_string(), Value::Object(properties));
        if !self.required.is_empty() {
            schema.insert(
                "required".to_string(),
                Value::Array(self.required.iter().cloned().map(Value::String).collect()),
            );
        }
        if self.is_closed() {
            schema.insert("additionalProperties".to_string(), Value::Bool(false));
        }
        schema
    }
}

impl Serialize for ParameterSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_schema().serialize(serializer)
    }
}

/// Which rule a value broke.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Required,
    Type { expected: ValueKind },
    Enum { allowed: Vec<Value> },
    Minimum(f64),
    Maximum(f64),
    MultipleOf(f64),
    MinLength(usize),
    UnknownField,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Required => f.write_str("is required"),
            Constraint::Type { expected } => write!(f, "must be of type {expected}"),
            Constraint::Enum { allowed } => {
                let rendered = allowed.iter().map(Value::to_string).collect::<Vec<_>>().join(", ");
                write!(f, "must be one of: {rendered}")
            }
            Constraint::Minimum(minimum) => write!(f, "must be >= {minimum}"),
            Constraint::Maximum(maximum) => write!(f, "must be <= {maximum}"),
            Constraint::MultipleOf(step) => write!(f, "must be a multiple of {step}"),
            Constraint::MinLength(length) => write!(f, "must contain at least {length} character(s)"),
            Constraint::UnknownField => f.write_str("is not an accepted field"),
        }
    }
}

/// First rule violation found in a parameter bundle.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("field '{field}' {constraint}")]
pub struct SchemaViolation {
    pub field: String,
    pub constraint: Constraint,
}

impl SchemaViolation {
    pub fn new(field: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            field: field.into(),
            constraint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    fn image_schema() -> ParameterSchema {
        serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "prompt": { "type": "string" },
                "width": { "type": "integer", "minimum": 512, "maximum": 2048, "multipleOf": 8 },
                "guidance_scale": { "type": "number", "minimum": 1, "maximum": 20 },
                "scheduler": { "type": "string", "enum": ["DDIM", "K_EULER"] }
            },
            "required": ["prompt"]
        }))
        .expect("schema parses")
    }

    #[test]
    fn accepts_conforming_parameters() {
        let parameters = as_map(json!({ "prompt": "a fox", "width": 1024, "guidance_scale": 7.5, "scheduler": "DDIM" }));
        assert_eq!(image_schema().validate(&parameters), Ok(()));
    }

    #[test]
    fn reports_missing_required_field_first() {
        let parameters = as_map(json!({ "width": 3 }));
        let violation = image_schema().validate(&parameters).expect_err("prompt missing");
        assert_eq!(violation.field, "prompt");
        assert_eq!(violation.constraint, Constraint::Required);
    }

    #[test]
    fn null_counts_as_absent() {
        let violation = image_schema()
            .validate(&as_map(json!({ "prompt": null })))
            .expect_err("null prompt");
        assert_eq!(violation.constraint, Constraint::Required);

        let parameters = as_map(json!({ "prompt": "x", "width": null }));
        assert_eq!(image_schema().validate(&parameters), Ok(()));
    }

    #[test]
    fn enforces_numeric_constraints() {
        let schema = image_schema();
        let too_small = schema.validate(&as_map(json!({ "prompt": "x", "width": 256 }))).expect_err("minimum");
        assert_eq!(too_small.constraint, Constraint::Minimum(512.0));

        let misaligned = schema.validate(&as_map(json!({ "prompt": "x", "width": 1001 }))).expect_err("multipleOf");
        assert_eq!(misaligned.constraint, Constraint::MultipleOf(8.0));

        let too_large = schema
            .validate(&as_map(json!({ "prompt": "x", "guidance_scale": 25 })))
            .expect_err("maximum");
        assert_eq!(too_large.field, "guidance_scale");
    }

    #[test]
    fn enforces_type_and_enum() {
        let schema = image_schema();
        let wrong_type = schema.validate(&as_map(json!({ "prompt": 42 }))).expect_err("type");
        assert_eq!(
            wrong_type.constraint,
            Constraint::Type {
                expected: ValueKind::String
            }
        );

        let wrong_choice = schema
            .validate(&as_map(json!({ "prompt": "x", "scheduler": "PNDM" })))
            .expect_err("enum");
        assert!(wrong_choice.to_string().contains("must be one of"));
    }

    #[test]
    fn integral_floats_are_integers() {
        assert!(ValueKind::Integer.matches(&json!(4.0)));
        assert!(!ValueKind::Integer.matches(&json!(4.5)));
        assert!(ValueKind::Number.matches(&json!(4)));
    }

    #[test]
    fn normalizes_integral_floats_in_integer_fields_only() {
        let mut parameters = as_map(json!({ "prompt": "x", "width": 1024.0, "guidance_scale": 7.0 }));
        image_schema().normalize_integers(&mut parameters);
        assert!(parameters["width"].is_i64());
        assert_eq!(parameters["width"], json!(1024));
        assert!(parameters["guidance_scale"].is_f64());
    }

    #[test]
    fn closed_schema_rejects_unknown_fields() {
        let schema = ParameterSchema::object()
            .required_property("prediction_id", PropertyRule::non_empty_string())
            .closed();
        let violation = schema
            .validate(&as_map(json!({ "prediction_id": "abc", "extra": true })))
            .expect_err("unknown field");
        assert_eq!(violation.field, "extra");
        assert_eq!(violation.constraint, Constraint::UnknownField);

        assert_eq!(image_schema().validate(&as_map(json!({ "prompt": "x", "seed": 7 }))), Ok(()));
    }

    #[test]
    fn checks_array_items() {
        let schema = ParameterSchema::object().property(
            "events",
            PropertyRule::array_of(PropertyRule::string().one_of(["start", "completed"])),
        );
        let violation = schema
            .validate(&as_map(json!({ "events": ["start", "bogus"] })))
            .expect_err("bad item");
        assert_eq!(violation.field, "events[1]");
    }

    #[test]
    fn blank_strings_fail_min_length() {
        let schema = ParameterSchema::object().required_property("query", PropertyRule::non_empty_string());
        let violation = schema.validate(&as_map(json!({ "query": "   " }))).expect_err("blank");
        assert_eq!(violation.constraint, Constraint::MinLength(1));
    }

    #[test]
    fn renders_json_schema_for_introspection() {
        let schema = ParameterSchema::object()
            .required_property("model", PropertyRule::non_empty_string().describe("owner/name"))
            .property("version", PropertyRule::string())
            .closed();
        let rendered = Value::Object(schema.to_json_schema());
        assert_eq!(rendered["type"], json!("object"));
        assert_eq!(rendered["required"], json!(["model"]));
        assert_eq!(rendered["properties"]["model"]["minLength"], json!(1));
        assert_eq!(rendered["additionalProperties"], json!(false));

        let reparsed: ParameterSchema = serde_json::from_value(rendered).expect("round trips");
        assert_eq!(reparsed, schema);
    }
}
