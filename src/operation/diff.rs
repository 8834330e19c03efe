//! Edit scripts carried by update operations
//!
//! Every edit records the content it inserts or removes, so a script can be
//! checked against the value it is applied to and inverted without reading
//! any other state.

use crate::graph::{GraphError, GraphResult, PropertyValue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEdit {
    Insert { pos: usize, text: String },
    Delete { pos: usize, text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayEdit {
    Insert { pos: usize, value: PropertyValue },
    Delete { pos: usize, value: PropertyValue },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectEdit {
    Insert { key: String, value: PropertyValue },
    Delete { key: String, value: PropertyValue },
}

/// A type-specific edit script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "edits", rename_all = "lowercase")]
pub enum Diff {
    Text(Vec<TextEdit>),
    Array(Vec<ArrayEdit>),
    Object(Vec<ObjectEdit>),
}

impl Diff {
    pub fn kind(&self) -> &'static str {
        match self {
            Diff::Text(_) => "text",
            Diff::Array(_) => "array",
            Diff::Object(_) => "object",
        }
    }

    /// Apply the script to `value`.
    ///
    /// Text scripts edit the textual form of whatever value they are given;
    /// array and object scripts require a value of that shape.
    pub fn apply(&self, value: PropertyValue) -> GraphResult<PropertyValue> {
        match self {
            Diff::Text(edits) => {
                let mut chars: Vec<char> = value.to_text().chars().collect();
                for edit in edits {
                    apply_text_edit(&mut chars, edit)?;
                }
                Ok(PropertyValue::String(chars.into_iter().collect()))
            }
            Diff::Array(edits) => match value {
                PropertyValue::Array(mut items) => {
                    for edit in edits {
                        apply_array_edit(&mut items, edit)?;
                    }
                    Ok(PropertyValue::Array(items))
                }
                other => Err(shape_error("array", &other)),
            },
            Diff::Object(edits) => match value {
                PropertyValue::Object(mut map) => {
                    for edit in edits {
                        match edit {
                            ObjectEdit::Insert { key, value } => {
                                if map.contains_key(key) {
                                    return Err(GraphError::InvalidDiff(format!("key {:?} already present", key)));
                                }
                                map.insert(key.clone(), value.clone());
                            }
                            ObjectEdit::Delete { key, value } => match map.get(key) {
                                Some(current) if current == value => {
                                    map.shift_remove(key);
                                }
                                _ => {
                                    return Err(GraphError::InvalidDiff(format!(
                                        "key {:?} does not hold the value being deleted",
                                        key
                                    )))
                                }
                            },
                        }
                    }
                    Ok(PropertyValue::Object(map))
                }
                other => Err(shape_error("object", &other)),
            },
        }
    }

    /// Script that undoes this one
    pub fn invert(&self) -> Diff {
        match self {
            Diff::Text(edits) => Diff::Text(
                edits
                    .iter()
                    .rev()
                    .map(|edit| match edit {
                        TextEdit::Insert { pos, text } => TextEdit::Delete { pos: *pos, text: text.clone() },
                        TextEdit::Delete { pos, text } => TextEdit::Insert { pos: *pos, text: text.clone() },
                    })
                    .collect(),
            ),
            Diff::Array(edits) => Diff::Array(
                edits
                    .iter()
                    .rev()
                    .map(|edit| match edit {
                        ArrayEdit::Insert { pos, value } => ArrayEdit::Delete { pos: *pos, value: value.clone() },
                        ArrayEdit::Delete { pos, value } => ArrayEdit::Insert { pos: *pos, value: value.clone() },
                    })
                    .collect(),
            ),
            Diff::Object(edits) => Diff::Object(
                edits
                    .iter()
                    .rev()
                    .map(|edit| match edit {
                        ObjectEdit::Insert { key, value } => ObjectEdit::Delete { key: key.clone(), value: value.clone() },
                        ObjectEdit::Delete { key, value } => ObjectEdit::Insert { key: key.clone(), value: value.clone() },
                    })
                    .collect(),
            ),
        }
    }
}

fn apply_text_edit(chars: &mut Vec<char>, edit: &TextEdit) -> GraphResult<()> {
    match edit {
        TextEdit::Insert { pos, text } => {
            if *pos > chars.len() {
                return Err(GraphError::InvalidDiff(format!("text insert at {} beyond length {}", pos, chars.len())));
            }
            chars.splice(*pos..*pos, text.chars());
        }
        TextEdit::Delete { pos, text } => {
            let end = pos
                .checked_add(text.chars().count())
                .filter(|end| chars.get(*pos..*end).is_some_and(|found| found.iter().copied().eq(text.chars())))
                .ok_or_else(|| GraphError::InvalidDiff(format!("text at {} does not match {:?}", pos, text)))?;
            chars.drain(*pos..end);
        }
    }
    Ok(())
}

fn apply_array_edit(items: &mut Vec<PropertyValue>, edit: &ArrayEdit) -> GraphResult<()> {
    match edit {
        ArrayEdit::Insert { pos, value } => {
            if *pos > items.len() {
                return Err(GraphError::InvalidDiff(format!("array insert at {} beyond length {}", pos, items.len())));
            }
            items.insert(*pos, value.clone());
        }
        ArrayEdit::Delete { pos, value } => {
            if items.get(*pos) != Some(value) {
                return Err(GraphError::InvalidDiff(format!("array element {} does not match {}", pos, value)));
            }
            items.remove(*pos);
        }
    }
    Ok(())
}

fn shape_error(expected: &str, found: &PropertyValue) -> GraphError {
    GraphError::InvalidDiff(format!("{} edits applied to a {} value", expected, found.type_name()))
}
