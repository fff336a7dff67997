//! The custom-attribute table appended to an item's body.

use std::collections::BTreeMap;

use serde_yaml::Value;

use super::inline;

/// Renders one `key & value` row per attribute, in key order.
///
/// The table is glued directly under the body text, so the caller decides
/// where the surrounding blank lines go.
pub(super) fn table_lines(attributes: &BTreeMap<String, Value>) -> Vec<String> {
    let mut lines = vec![
        r"\begin{longtable}{|l|l|}".to_string(),
        r"Attribute & Value\\".to_string(),
        r"\hline".to_string(),
    ];
    lines.extend(attributes.iter().map(|(key, value)| {
        format!(
            "{} & {}",
            inline::escape(key),
            inline::escape(&scalar_text(value))
        )
    }));
    lines.push(r"\end{longtable}".to_string());
    lines
}

/// The table-cell text of an attribute value.
///
/// Booleans are capitalized. Nested values are flattened onto one line so
/// they cannot break the table.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => serde_yaml::to_string(other)
            .map_or_else(|_| String::new(), |text| text.trim_end().replace('\n', " ")),
    }
}
