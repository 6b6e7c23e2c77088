//! Translation of free-form option strings into export parameters.

use serde::{Deserialize, Serialize};

use crate::bridge::{PropertyValue, PropertyValueKind};

/// Export parameters parsed from `Name=Value` and bare option strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptionSet {
    /// Named parameters, passed to the filter as `FilterData`.
    pub filter_data: Vec<PropertyValue>,
    /// Bare option strings in input order, each passed as `FilterOptions`.
    pub filter_options: Vec<String>,
}

impl ExportOptionSet {
    /// Parse option strings.
    ///
    /// `Name=Value` (split on the first `=`) becomes a named parameter whose
    /// value is coerced: `true`/`false` to booleans, all-digit strings to
    /// integers, anything else stays a string. A string without `=` is kept
    /// verbatim as a bare option.
    pub fn parse<S: AsRef<str>>(options: &[S]) -> Self {
        let mut set = Self::default();
        for option in options {
            let option = option.as_ref();
            match option.split_once('=') {
                Some((name, value)) => set
                    .filter_data
                    .push(PropertyValue::new(name, coerce_value(value))),
                None => set.filter_options.push(option.to_string()),
            }
        }
        set
    }

    /// Whether no options were given.
    pub fn is_empty(&self) -> bool {
        self.filter_data.is_empty() && self.filter_options.is_empty()
    }

    /// Full property sequence for a store call with `filter_name`.
    ///
    /// Always requests overwriting; named parameters are bundled under
    /// `FilterData`, bare options follow as separate `FilterOptions` entries.
    pub fn to_store_properties(&self, filter_name: &str) -> Vec<PropertyValue> {
        let mut properties = vec![
            PropertyValue::new("FilterName", filter_name),
            PropertyValue::new("Overwrite", true),
        ];

        if !self.filter_data.is_empty() {
            properties.push(PropertyValue::new(
                "FilterData",
                PropertyValueKind::Properties(self.filter_data.clone()),
            ));
        }

        properties.extend(
            self.filter_options
                .iter()
                .map(|option| PropertyValue::new("FilterOptions", option.as_str())),
        );

        properties
    }
}

fn coerce_value(value: &str) -> PropertyValueKind {
    match value {
        "true" => PropertyValueKind::Bool(true),
        "false" => PropertyValueKind::Bool(false),
        v if !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()) => v
            .parse::<i64>()
            .map(PropertyValueKind::Int)
            .unwrap_or_else(|_| PropertyValueKind::Str(v.to_string())),
        v => PropertyValueKind::Str(v.to_string()),
    }
}
