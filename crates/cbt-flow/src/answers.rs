use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::spec::question::QuestionKind;

/// Answers keyed by question id.
pub type Answers = BTreeMap<String, AnswerValue>;

/// Answer payload for a single question, tagged by the kind of widget that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    Choice(String),
    MultiChoice(Vec<String>),
    Scale(f64),
}

/// Raised when a loosely-typed payload cannot be read as an answer for a question kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerShapeError {
    #[error("{kind} questions expect {expected}")]
    Mismatch {
        kind: &'static str,
        expected: &'static str,
    },
    #[error("info questions do not take answers")]
    NotAnswerable,
}

impl AnswerValue {
    pub fn text(value: impl Into<String>) -> Self {
        AnswerValue::Text(value.into())
    }

    pub fn choice(value: impl Into<String>) -> Self {
        AnswerValue::Choice(value.into())
    }

    pub fn multi<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnswerValue::MultiChoice(values.into_iter().map(Into::into).collect())
    }

    /// Emptiness as seen by the required-answer gate.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => text.is_empty(),
            AnswerValue::MultiChoice(values) => values.is_empty(),
            AnswerValue::Scale(_) => false,
        }
    }

    /// String payload of text and single-choice answers.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => Some(text),
            _ => None,
        }
    }

    /// Reads an untyped JSON payload as the answer variant matching `kind`.
    pub fn from_json(kind: QuestionKind, value: &Value) -> Result<Self, AnswerShapeError> {
        let mismatch = |expected| AnswerShapeError::Mismatch {
            kind: kind.as_str(),
            expected,
        };
        match kind {
            QuestionKind::Text => value
                .as_str()
                .map(AnswerValue::text)
                .ok_or_else(|| mismatch("a string")),
            QuestionKind::SingleChoice => {
                scalar_text(value).map(AnswerValue::Choice).ok_or_else(|| mismatch("a string"))
            }
            QuestionKind::MultiChoice => {
                let items = value
                    .as_array()
                    .ok_or_else(|| mismatch("an array of strings"))?;
                items
                    .iter()
                    .map(scalar_text)
                    .collect::<Option<Vec<_>>>()
                    .map(AnswerValue::MultiChoice)
                    .ok_or_else(|| mismatch("an array of strings"))
            }
            QuestionKind::Scale => {
                let number = match value {
                    Value::Number(number) => number.as_f64(),
                    Value::String(text) => text.trim().parse::<f64>().ok(),
                    _ => None,
                };
                number
                    .filter(|number| number.is_finite())
                    .map(AnswerValue::Scale)
                    .ok_or_else(|| mismatch("a number"))
            }
            QuestionKind::Info => Err(AnswerShapeError::NotAnswerable),
        }
    }

    /// Untyped form: string, array of strings or number.
    pub fn to_json(&self) -> Value {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => Value::String(text.clone()),
            AnswerValue::MultiChoice(values) => {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            }
            AnswerValue::Scale(number) => scale_to_json(*number),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn scale_to_json(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Value::Number(Number::from(number as i64))
    } else {
        Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
