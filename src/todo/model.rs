//! Todo item representation and request payload validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::routing::resource::{FieldErrors, Resource};

/// Longest title accepted, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";
const NOT_STRING: &str = "Not a valid string.";
const NOT_BOOLEAN: &str = "Must be a valid boolean.";

/// A stored todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub completed: bool,
}

impl Resource for Todo {
    fn id(&self) -> u64 {
        self.id
    }
}

/// Fields for a todo that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub completed: bool,
}

/// A set of field updates. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl TodoChanges {
    /// Validate a request body.
    ///
    /// With `partial` unset every writable field without a default must be
    /// present (create and PUT); with it set only the supplied fields are
    /// checked (PATCH). Unknown keys and `id` are ignored.
    pub fn from_json(body: &Value, partial: bool) -> Result<Self, FieldErrors> {
        let object = match body {
            Value::Object(object) => object,
            other => {
                let mut errors = FieldErrors::new();
                errors.insert(
                    "non_field_errors".to_string(),
                    vec![format!(
                        "Invalid data. Expected a dictionary, but got {}.",
                        json_type_name(other)
                    )],
                );
                return Err(errors);
            }
        };

        let mut errors = FieldErrors::new();
        let title = validate_title(object, partial, &mut errors);
        let completed = validate_completed(object, &mut errors);

        if errors.is_empty() {
            Ok(Self { title, completed })
        } else {
            Err(errors)
        }
    }

    /// Build the fields of a new item, applying defaults.
    ///
    /// Only meaningful on changes produced with `partial == false`.
    pub fn into_new(self) -> NewTodo {
        NewTodo {
            title: self.title.unwrap_or_default(),
            completed: self.completed.unwrap_or(false),
        }
    }

    /// Write the supplied fields onto an existing item.
    pub fn apply(&self, todo: &mut Todo) {
        if let Some(title) = &self.title {
            todo.title.clone_from(title);
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}

fn validate_title(
    object: &Map<String, Value>,
    partial: bool,
    errors: &mut FieldErrors,
) -> Option<String> {
    let message = match object.get("title") {
        None if partial => return None,
        None => REQUIRED.to_string(),
        Some(Value::Null) => NOT_NULL.to_string(),
        Some(Value::String(title)) => {
            // Surrounding whitespace is dropped before any other check.
            let title = title.trim();
            if title.is_empty() {
                NOT_BLANK.to_string()
            } else if title.chars().count() > MAX_TITLE_CHARS {
                format!(
                    "Ensure this field has no more than {} characters.",
                    MAX_TITLE_CHARS
                )
            } else {
                return Some(title.to_string());
            }
        }
        Some(_) => NOT_STRING.to_string(),
    };
    errors.insert("title".to_string(), vec![message]);
    None
}

fn validate_completed(object: &Map<String, Value>, errors: &mut FieldErrors) -> Option<bool> {
    match object.get("completed") {
        None => None,
        Some(Value::Bool(completed)) => Some(*completed),
        Some(Value::Null) => {
            errors.insert("completed".to_string(), vec![NOT_NULL.to_string()]);
            None
        }
        Some(_) => {
            errors.insert("completed".to_string(), vec![NOT_BOOLEAN.to_string()]);
            None
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
