//! JSON interchange: `json/parse json/stringify`.
//!
//! Type mapping: map ↔ object, list ↔ array, number ↔ number, string ↔
//! string, boolean ↔ boolean, nil ↔ null. Functions, builtins, and
//! errors have no JSON representation and are rejected by `stringify`.

use crate::error::CoreError;
use crate::value::{OrderedMap, Value};
use lisp_macros::builtin;

fn value_to_json(value: &Value) -> Result<serde_json::Value, CoreError> {
    match value {
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .ok_or_else(|| {
                CoreError::runtime_error("json/stringify", format!("cannot convert {} to JSON", n))
            }),
        Value::String(s) => Ok(serde_json::Value::String(s.clone())),
        Value::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Nil => Ok(serde_json::Value::Null),
        Value::List(items) => Ok(serde_json::Value::Array(
            items.iter().map(value_to_json).collect::<Result<_, _>>()?,
        )),
        Value::Map(map) => {
            let mut object = serde_json::Map::new();
            for (key, val) in map.iter() {
                let key = match key {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                object.insert(key, value_to_json(val)?);
            }
            Ok(serde_json::Value::Object(object))
        }
        other => Err(CoreError::runtime_error(
            "json/stringify",
            format!("cannot convert a {} to JSON", other.type_name()),
        )),
    }
}

fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(object) => {
            let mut map = OrderedMap::new();
            for (key, val) in object {
                map.insert(Value::String(key.clone()), json_to_value(val));
            }
            Value::Map(map)
        }
    }
}

/// Parses a JSON string into a value.
///
/// # Examples
/// ```lisp
/// (json/parse "[1,2,3]") => (1 2 3)
/// ```
///
/// # See Also
/// json_stringify
#[builtin(name = "json/parse", category = "JSON", related(json_stringify))]
pub fn json_parse(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("json/parse", "1", args.len()));
    }
    let text = match &args[0] {
        Value::String(s) => s,
        other => return Err(CoreError::type_error("json/parse", "string", &other.type_name(), 1)),
    };
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| CoreError::runtime_error("json/parse", e.to_string()))?;
    Ok(json_to_value(&json))
}

/// Renders a value as a JSON string.
///
/// # Examples
/// ```lisp
/// (json/stringify (list 1 2 3)) => "[1,2,3]"
/// ```
///
/// # See Also
/// json_parse
#[builtin(name = "json/stringify", category = "JSON", related(json_parse))]
pub fn json_stringify(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("json/stringify", "1", args.len()));
    }
    let json = value_to_json(&args[0])?;
    let text = serde_json::to_string(&json)
        .map_err(|e| CoreError::runtime_error("json/stringify", e.to_string()))?;
    Ok(Value::String(text))
}

pub fn register(table: &mut std::collections::HashMap<String, crate::value::Value>) {
    register_json_parse(table);
    register_help_json_parse();
    register_json_stringify(table);
    register_help_json_stringify();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_array_of_numbers() {
        assert_eq!(
            json_parse(&[Value::String("[1,2,3]".into())]).unwrap(),
            Value::List(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)])
        );
    }

    #[test]
    fn stringifies_list_to_array() {
        let list = Value::List(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(json_stringify(&[list]).unwrap(), Value::String("[1.0,2.0]".into()));
    }

    #[test]
    fn object_roundtrips_through_map() {
        let mut map = OrderedMap::new();
        map.insert(Value::String("name".into()), Value::String("Alice".into()));
        let encoded = json_stringify(&[Value::Map(map)]).unwrap();
        let decoded = json_parse(&[encoded]).unwrap();
        assert_eq!(
            decoded,
            Value::Map({
                let mut m = OrderedMap::new();
                m.insert(Value::String("name".into()), Value::String("Alice".into()));
                m
            })
        );
    }

    #[test]
    fn stringify_rejects_functions() {
        assert!(json_stringify(&[Value::Builtin(json_stringify)]).is_err());
    }
}
