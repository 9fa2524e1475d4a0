use crate::callable::{Function, NativeFunction};
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub enum Value {
    Number(f64),
    Null,
    Boolean(bool),
    String(String),
    Object(Rc<Object>),
    Function(Rc<Function>),
    NativeFunction(NativeFunction),
}

/// Property bag built by an object literal. Keeps insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object {
    properties: Vec<(String, Value)>,
}

impl Object {
    pub fn new() -> Object {
        Object {
            properties: Vec::new(),
        }
    }
    /// A repeated key keeps its first position and takes the new value.
    pub fn insert(&mut self, key: &str, value: Value) {
        match self.properties.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((key.to_string(), value)),
        }
    }
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(k, _)| k.as_str())
    }
    pub fn len(&self) -> usize {
        self.properties.len()
    }
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::NativeFunction(_) => "nativeFn",
        }
    }
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            _ => false,
        }
    }
    /// Numbers, strings, booleans and null take part in comparison and logic.
    pub fn is_comparable(&self) -> bool {
        match self {
            Value::Number(_) | Value::Null | Value::Boolean(_) | Value::String(_) => true,
            _ => false,
        }
    }
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(x) => *x,
            Value::Number(x) => *x != 0.0 && !x.is_nan(),
            Value::String(x) => !x.is_empty(),
            Value::Object(_) | Value::Function(_) | Value::NativeFunction(_) => true,
        }
    }
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(x) => write!(f, "\"{}\"", x),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(x) => write!(f, "{}", x),
            Value::Number(x) => fmt_number(*x, f),
            Value::String(x) => write!(f, "{}", x),
            Value::Object(object) => {
                if object.is_empty() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{ ")?;
                for (i, (key, value)) in object.properties.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    value.fmt_nested(f)?;
                }
                write!(f, " }}")
            }
            Value::Function(function) => write!(f, "{}", function),
            Value::NativeFunction(native) => write!(f, "{}", native),
        }
    }
}

// Host number formatting: no negative zero, and exponent notation outside
// [1e-6, 1e21).
fn fmt_number(x: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if x == 0.0 {
        return write!(f, "0");
    }
    if x.is_nan() {
        return write!(f, "NaN");
    }
    if x.is_infinite() {
        return write!(f, "{}Infinity", if x < 0.0 { "-" } else { "" });
    }
    let magnitude = x.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let text = format!("{:e}", x);
        return match text.find('e') {
            Some(at) if !text[at + 1..].starts_with('-') => {
                write!(f, "{}e+{}", &text[..at], &text[at + 1..])
            }
            _ => write!(f, "{}", text),
        };
    }
    write!(f, "{}", x)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => l == r,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(l), Value::Boolean(r)) => l == r,
            (Value::String(l), Value::String(r)) => l == r,
            (Value::Object(l), Value::Object(r)) => l == r,
            (Value::Function(l), Value::Function(r)) => Rc::ptr_eq(l, r),
            (Value::NativeFunction(l), Value::NativeFunction(r)) => l.equals(r),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}
