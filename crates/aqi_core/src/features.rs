//! Request parsing and feature encoding
//!
//! A request is mapped onto a zero vector shaped like the schema: the three
//! calendar columns receive the integer calendar values and the matching
//! `City_<name>` column receives a one.
use crate::errors::{AqiError, Result};
use crate::schema::{CalendarField, FeatureSchema};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Dense model input, one slot per schema column
pub type FeatureVector = Vec<f64>;

/// Calendar value as sent by clients: a JSON number, boolean or numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CalendarValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl CalendarValue {
    /// Interpret the value as an integer.
    ///
    /// Floats are truncated toward zero; strings must hold an integer
    /// literal.
    pub fn to_integer(&self, field: CalendarField) -> Result<i64> {
        match self {
            CalendarValue::Integer(value) => Ok(*value),
            CalendarValue::Float(value) => {
                let truncated = value.trunc();
                if truncated.is_finite()
                    && truncated >= i64::MIN as f64
                    && truncated <= i64::MAX as f64
                {
                    Ok(truncated as i64)
                } else {
                    Err(invalid(field, format!("{value} is not a finite integer")))
                }
            }
            CalendarValue::Bool(value) => Ok(i64::from(*value)),
            CalendarValue::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid(field, format!("'{text}' is not an integer"))),
        }
    }
}

impl From<i64> for CalendarValue {
    fn from(value: i64) -> Self {
        CalendarValue::Integer(value)
    }
}

fn invalid(field: CalendarField, reason: String) -> AqiError {
    AqiError::InvalidInput {
        field: field.as_str(),
        reason,
    }
}

/// Read `city` from any JSON scalar; null becomes the empty string.
fn city_from_json<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(city) => Ok(city),
        Value::Null => Ok(String::new()),
        Value::Bool(true) => Ok("True".to_string()),
        Value::Bool(false) => Ok("False".to_string()),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "city must be a string, got {other}"
        ))),
    }
}

/// Prediction request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(default, deserialize_with = "city_from_json")]
    pub city: String,
    #[serde(default)]
    pub month: Option<CalendarValue>,
    #[serde(default)]
    pub day: Option<CalendarValue>,
    #[serde(default)]
    pub year: Option<CalendarValue>,
}

impl PredictionRequest {
    pub fn new(city: impl Into<String>, month: i64, day: i64, year: i64) -> Self {
        Self {
            city: city.into(),
            month: Some(month.into()),
            day: Some(day.into()),
            year: Some(year.into()),
        }
    }

    fn calendar_value(&self, field: CalendarField) -> Option<&CalendarValue> {
        match field {
            CalendarField::Month => self.month.as_ref(),
            CalendarField::Day => self.day.as_ref(),
            CalendarField::Year => self.year.as_ref(),
        }
    }

    /// Integer value of a calendar field; a missing field is invalid input
    pub fn calendar(&self, field: CalendarField) -> Result<i64> {
        self.calendar_value(field)
            .ok_or_else(|| invalid(field, "field is missing".to_string()))?
            .to_integer(field)
    }
}

/// Encode a request against the schema.
///
/// Calendar values are always parsed; they are written only when the schema
/// has a column for them. The city must have a one-hot column.
pub fn encode(schema: &FeatureSchema, request: &PredictionRequest) -> Result<FeatureVector> {
    let mut calendar = [0i64; 3];
    for (slot, field) in calendar.iter_mut().zip(CalendarField::ALL) {
        *slot = request.calendar(field)?;
    }

    let city_idx = schema
        .cities()
        .get(&request.city)
        .ok_or_else(|| AqiError::UnsupportedCity {
            city: request.city.clone(),
        })?;

    let mut features = vec![0.0; schema.len()];
    for (value, field) in calendar.iter().zip(CalendarField::ALL) {
        if let Some(idx) = schema.calendar_slot(field) {
            features[idx] = *value as f64;
        }
    }
    features[city_idx] = 1.0;

    Ok(features)
}
