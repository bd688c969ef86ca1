//! Typed command parameters.

use chordex_common::ParseError;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Number,
    Boolean,
    String,
    /// Every remaining argument, as an array of strings.
    Rest,
}

/// Convert parsed arguments to a command's declared parameter types.
///
/// Arguments past the declared list are dropped; missing ones are simply
/// absent from the result.
pub fn convert_args(command: &str, params: &[ParamType], args: Vec<Value>) -> Result<Vec<Value>, ParseError> {
    let mut out = Vec::with_capacity(params.len());
    let mut args = args.into_iter();

    for (index, param) in params.iter().enumerate() {
        if *param == ParamType::Rest {
            out.push(Value::Array(args.by_ref().map(|v| Value::String(text(&v))).collect()));
            break;
        }
        let Some(arg) = args.next() else {
            break;
        };
        let converted = match param {
            ParamType::Number => number(&arg),
            ParamType::Boolean => boolean(&arg),
            ParamType::String => Some(Value::String(text(&arg))),
            ParamType::Rest => None,
        };
        out.push(converted.ok_or_else(|| ParseError::Argument {
            command: command.to_string(),
            reason: format!("argument {} ({arg}) is not a {param:?}", index + 1),
        })?);
    }
    Ok(out)
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => s
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        _ => None,
    }
}

fn boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value.clone()),
        Value::String(s) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}
