//! Per-request user state supplied by the front end.
//!
//! The payload is untrusted: every field is coerced from raw JSON and
//! anything of the wrong shape is treated as absent instead of failing
//! the request.

use serde_json::{Map, Value};

/// Daily water goal (in cups) used when the client does not send one.
pub const DEFAULT_WATER_GOAL: f64 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Medication {
    pub name: String,
    /// Scheduled time as the client wrote it; rendered without one when absent.
    pub time: Option<String>,
    pub taken: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserContext {
    pub location: Option<String>,
    pub medications: Vec<Medication>,
    /// `(item, where it is)` pairs in the order the client listed them.
    pub item_locations: Vec<(String, String)>,
    pub water_intake: Option<f64>,
    pub water_goal: Option<f64>,
    pub emergency_contacts: Vec<EmergencyContact>,
}

impl UserContext {
    /// Coerce a raw `userData` value. Non-objects yield an empty context.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        Self {
            location: obj.get("location").and_then(text),
            medications: list(obj.get("medications"), |entry| {
                Some(Medication {
                    name: text_field(entry, "name")?,
                    time: text_field(entry, "time"),
                    taken: entry.get("taken").and_then(Value::as_bool).unwrap_or(false),
                })
            }),
            item_locations: obj
                .get("itemLocations")
                .and_then(Value::as_object)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|(item, place)| Some((single_line(item)?, text(place)?)))
                        .collect()
                })
                .unwrap_or_default(),
            water_intake: obj.get("waterIntake").and_then(number),
            water_goal: obj
                .get("waterGoal")
                .and_then(number)
                .filter(|goal| *goal > 0.0),
            emergency_contacts: list(obj.get("emergencyContacts"), |entry| {
                Some(EmergencyContact {
                    name: text_field(entry, "name")?,
                    phone: text_field(entry, "phone")?,
                })
            }),
        }
    }

    pub fn effective_water_goal(&self) -> f64 {
        self.water_goal.unwrap_or(DEFAULT_WATER_GOAL)
    }
}

/// Map every object in a JSON array through `parse`, dropping entries that
/// are not objects or fail to parse. Anything other than an array is empty.
fn list<T>(value: Option<&Value>, parse: impl Fn(&Map<String, Value>) -> Option<T>) -> Vec<T> {
    value
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_object)
                .filter_map(&parse)
                .collect()
        })
        .unwrap_or_default()
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(text)
}

/// Non-blank strings, and numbers rendered as text (phone numbers often arrive as numbers).
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => single_line(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Control characters (line breaks included) become spaces so a value can
/// never spill onto another line of the rendered context.
fn single_line(raw: &str) -> Option<String> {
    let flattened: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let trimmed = flattened.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| n.is_finite())
}
