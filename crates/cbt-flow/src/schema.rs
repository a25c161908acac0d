use serde_json::{Map, Number, Value};

use crate::spec::question::{Question, QuestionKind};
use crate::spec::template::Template;

/// JSON Schema of the template document format.
pub fn template_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(Template)).unwrap_or(Value::Null)
}

/// JSON Schema of the untyped answers object accepted for `template`.
pub fn answers_schema(template: &Template) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for question in &template.questions {
        let Some(schema) = question_schema(question) else {
            continue;
        };
        properties.insert(question.id.clone(), schema);
        if question.required {
            required.push(Value::String(question.id.clone()));
        }
    }

    let mut root = Map::new();
    root.insert("type".into(), Value::String("object".into()));
    root.insert("title".into(), Value::String(template.title.clone()));
    root.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        root.insert("required".into(), Value::Array(required));
    }
    root.insert("additionalProperties".into(), Value::Bool(false));

    Value::Object(root)
}

fn question_schema(question: &Question) -> Option<Value> {
    let mut schema = Map::new();
    let option_values = || {
        Value::Array(
            question
                .options
                .iter()
                .map(|option| Value::String(option.value.clone()))
                .collect(),
        )
    };

    match question.kind {
        QuestionKind::Info => return None,
        QuestionKind::Text => {
            schema.insert("type".into(), Value::String("string".into()));
            if question.required {
                schema.insert("minLength".into(), Value::Number(1.into()));
            }
        }
        QuestionKind::SingleChoice => {
            schema.insert("type".into(), Value::String("string".into()));
            if !question.options.is_empty() {
                schema.insert("enum".into(), option_values());
            }
        }
        QuestionKind::MultiChoice => {
            schema.insert("type".into(), Value::String("array".into()));
            let mut items = Map::new();
            items.insert("type".into(), Value::String("string".into()));
            if !question.options.is_empty() {
                items.insert("enum".into(), option_values());
            }
            schema.insert("items".into(), Value::Object(items));
            schema.insert("uniqueItems".into(), Value::Bool(true));
            if question.required {
                schema.insert("minItems".into(), Value::Number(1.into()));
            }
        }
        QuestionKind::Scale => {
            schema.insert("type".into(), Value::String("number".into()));
            if let Some(range) = &question.range {
                if let Some(min) = Number::from_f64(range.min) {
                    schema.insert("minimum".into(), Value::Number(min));
                }
                if let Some(max) = Number::from_f64(range.max) {
                    schema.insert("maximum".into(), Value::Number(max));
                }
            }
        }
    }

    schema.insert("description".into(), Value::String(question.prompt.clone()));
    Some(Value::Object(schema))
}
