use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One input datum of the chart.
///
/// `id`, `label`, `size`, `category` and `group` are the fields the layout
/// understands; everything else in the source object is kept in `fields` so
/// the chart can be regrouped by arbitrary attributes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub size: f32,
    #[serde(
        default,
        alias = "colorValue",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DataRecord {
    pub fn new(label: impl Into<String>, size: f32) -> Self {
        Self {
            label: label.into(),
            size,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Text value of a named field, looking at the known fields first.
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.id.clone(),
            "label" => (!self.label.is_empty()).then(|| self.label.clone()),
            "category" | "colorValue" => self.category.clone(),
            "group" => self.group.clone(),
            "size" => Some(self.size.to_string()),
            other => self.fields.get(other).and_then(value_text),
        }
    }

    /// Names of every field the record can be grouped by.
    pub fn field_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.fields.len() + 2);
        if self.category.is_some() {
            names.push("category".to_owned());
        }
        if self.group.is_some() {
            names.push("group".to_owned());
        }
        names.extend(self.fields.keys().cloned());
        names
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_known_and_extra_fields() {
        let record = DataRecord::new("Berlin", 3.6)
            .with_id("de-ber")
            .with_category("europe")
            .with_field("region", "west")
            .with_field("capital", true)
            .with_field("rank", 2);

        assert_eq!(record.field("id").as_deref(), Some("de-ber"));
        assert_eq!(record.field("label").as_deref(), Some("Berlin"));
        assert_eq!(record.field("category").as_deref(), Some("europe"));
        assert_eq!(record.field("colorValue").as_deref(), Some("europe"));
        assert_eq!(record.field("region").as_deref(), Some("west"));
        assert_eq!(record.field("capital").as_deref(), Some("true"));
        assert_eq!(record.field("rank").as_deref(), Some("2"));
        assert_eq!(record.field("group"), None);
        assert_eq!(record.field("missing"), None);
    }

    #[test]
    fn empty_label_is_not_a_field_value() {
        let record = DataRecord::new("", 1.0);
        assert_eq!(record.field("label"), None);
    }

    #[test]
    fn color_value_alias_maps_to_category() {
        let record: DataRecord =
            serde_json::from_str(r#"{"label":"a","size":4,"colorValue":"red","tier":"gold"}"#)
                .expect("record parses");

        assert_eq!(record.category.as_deref(), Some("red"));
        assert_eq!(record.field("tier").as_deref(), Some("gold"));
        assert_eq!(record.field_names(), vec!["category", "tier"]);
    }
}
