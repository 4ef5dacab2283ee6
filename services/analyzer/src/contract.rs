//! Analysis contract
//!
//! One static description of the result shape drives both the
//! `responseSchema` sent to the service and the validation of what comes
//! back, so the two cannot drift apart. Validation is all-or-nothing: the
//! first violation rejects the whole response.

use serde_json::{json, Map, Value};

use crate::error::{AnalysisError, Result};

/// Shape of a JSON node in the contract. Every object field is required.
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    Number,
    /// Number in `0..=100`.
    Percentage,
    Text,
    Object(&'static [(&'static str, Shape)]),
    Array(&'static Shape),
}

const NAME_COUNT: Shape = Shape::Object(&[("name", Shape::Text), ("count", Shape::Number)]);

const NAME_VALUE: Shape = Shape::Object(&[("name", Shape::Text), ("value", Shape::Number)]);

const NAME_COUNT_PERCENT: Shape = Shape::Object(&[
    ("name", Shape::Text),
    ("count", Shape::Number),
    ("percentage", Shape::Percentage),
]);

const DATE_COUNT: Shape = Shape::Object(&[("date", Shape::Text), ("count", Shape::Number)]);

pub const ANALYSIS_CONTRACT: Shape = Shape::Object(&[
    (
        "summaryStats",
        Shape::Object(&[
            ("totalCalls", Shape::Number),
            ("totalDurationSec", Shape::Number),
            ("totalDurationFormatted", Shape::Text),
            ("uniqueImeis", Shape::Number),
            ("uniqueImsis", Shape::Number),
            ("roamingCalls", Shape::Number),
            ("dateRange", Shape::Text),
        ]),
    ),
    (
        "crimeAnalysis",
        Shape::Object(&[("topCrimes", Shape::Array(&NAME_COUNT_PERCENT))]),
    ),
    (
        "callAnalysis",
        Shape::Object(&[
            ("topBParties", Shape::Array(&NAME_COUNT)),
            ("callTypeDistribution", Shape::Array(&NAME_VALUE)),
            ("callsPerDay", Shape::Array(&DATE_COUNT)),
        ]),
    ),
    (
        "locationAnalysis",
        Shape::Object(&[("callsByCity", Shape::Array(&NAME_COUNT))]),
    ),
    (
        "deviceAnalysis",
        Shape::Object(&[
            ("topImeis", Shape::Array(&NAME_COUNT)),
            ("imeiManufacturerDistribution", Shape::Array(&NAME_VALUE)),
        ]),
    ),
]);

impl Shape {
    /// Render as a Gemini `responseSchema` document.
    pub fn to_response_schema(&self) -> Value {
        match self {
            Shape::Number | Shape::Percentage => json!({ "type": "NUMBER" }),
            Shape::Text => json!({ "type": "STRING" }),
            Shape::Array(items) => json!({ "type": "ARRAY", "items": items.to_response_schema() }),
            Shape::Object(fields) => {
                let properties: Map<String, Value> = fields
                    .iter()
                    .map(|(name, shape)| (name.to_string(), shape.to_response_schema()))
                    .collect();
                let required: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
                json!({ "type": "OBJECT", "properties": properties, "required": required })
            }
        }
    }

    /// Every required field path, e.g. `callAnalysis.callsPerDay`.
    /// Array element fields are not included.
    pub fn required_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        if let Shape::Object(fields) = self {
            for (name, shape) in fields.iter() {
                paths.push(name.to_string());
                paths.extend(
                    shape
                        .required_paths()
                        .into_iter()
                        .map(|child| format!("{name}.{child}")),
                );
            }
        }
        paths
    }

    /// Check `value` against this shape.
    pub fn validate(&self, value: &Value) -> Result<()> {
        self.check(value, "")
    }

    fn check(&self, value: &Value, path: &str) -> Result<()> {
        match self {
            Shape::Number => expect_number(value, path).map(|_| ()),
            Shape::Percentage => {
                let n = expect_number(value, path)?;
                if !(0.0..=100.0).contains(&n) {
                    return Err(violation(path, format!("percentage {n} outside 0-100")));
                }
                Ok(())
            }
            Shape::Text => match value {
                Value::String(_) => Ok(()),
                other => Err(violation(path, format!("expected string, found {}", type_name(other)))),
            },
            Shape::Array(items) => {
                let elements = value.as_array().ok_or_else(|| {
                    violation(path, format!("expected array, found {}", type_name(value)))
                })?;
                for (idx, element) in elements.iter().enumerate() {
                    items.check(element, &format!("{path}[{idx}]"))?;
                }
                Ok(())
            }
            Shape::Object(fields) => {
                let object = value.as_object().ok_or_else(|| {
                    violation(path, format!("expected object, found {}", type_name(value)))
                })?;
                for (name, shape) in fields.iter() {
                    let child = if path.is_empty() {
                        name.to_string()
                    } else {
                        format!("{path}.{name}")
                    };
                    match object.get(*name) {
                        Some(field) => shape.check(field, &child)?,
                        None => return Err(violation(&child, "missing required field".to_string())),
                    }
                }
                Ok(())
            }
        }
    }
}

fn expect_number(value: &Value, path: &str) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| violation(path, format!("expected number, found {}", type_name(value))))
}

fn violation(path: &str, reason: String) -> AnalysisError {
    AnalysisError::SchemaValidation {
        path: if path.is_empty() { "<root>".to_string() } else { path.to_string() },
        reason,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
