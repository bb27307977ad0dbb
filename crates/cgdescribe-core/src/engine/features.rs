use std::fmt;

/// A single cell of the result table.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    /// `NaN` marks a metric that could not be computed.
    Float(f64),
    Bool(bool),
    Text(String),
}

impl FeatureValue {
    pub fn nan() -> Self {
        FeatureValue::Float(f64::NAN)
    }

    pub fn count(n: usize) -> Self {
        FeatureValue::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, FeatureValue::Float(v) if v.is_nan())
    }

    /// CSV representation: missing values become empty fields.
    pub fn to_csv_field(&self) -> String {
        if self.is_nan() {
            String::new()
        } else {
            self.to_string()
        }
    }
}

fn format_float(value: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if value.is_nan() {
        f.write_str("NaN")
    } else if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        write!(f, "{:.1}", value)
    } else {
        write!(f, "{}", value)
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{}", v),
            FeatureValue::Float(v) => format_float(*v, f),
            FeatureValue::Bool(true) => f.write_str("True"),
            FeatureValue::Bool(false) => f.write_str("False"),
            FeatureValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Float(value)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Bool(value)
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Text(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

/// Ordered mapping from column name to value.
///
/// Setting an existing column replaces its value and keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    entries: Vec<(String, FeatureValue)>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FeatureValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FeatureValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &FeatureValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends every entry of `other`, replacing values of columns already present.
    pub fn merge(&mut self, other: FeatureRow) {
        for (key, value) in other.entries {
            self.set(key, value);
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(k, _)| keep(k));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_render_like_python_reprs() {
        assert_eq!(FeatureValue::Float(5.0).to_string(), "5.0");
        assert_eq!(FeatureValue::Float(0.25).to_string(), "0.25");
        assert_eq!(FeatureValue::nan().to_string(), "NaN");
        assert_eq!(FeatureValue::Bool(false).to_string(), "False");
    }

    #[test]
    fn nan_is_an_empty_csv_field() {
        assert_eq!(FeatureValue::nan().to_csv_field(), "");
        assert_eq!(FeatureValue::count(3).to_csv_field(), "3");
        assert_eq!(FeatureValue::Bool(true).to_csv_field(), "True");
    }

    #[test]
    fn set_replaces_in_place() {
        let mut row = FeatureRow::new();
        row.set("name", "x");
        row.set("nt_length", FeatureValue::count(10));
        row.set("name", "y");
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["name", "nt_length"]);
        assert_eq!(row.get("name"), Some(&FeatureValue::Text("y".into())));
    }

    #[test]
    fn merge_appends_new_columns_after_existing_ones() {
        let mut row = FeatureRow::new();
        row.set("name", "x");
        let mut features = FeatureRow::new();
        features.set("rog_fast", 1.5);
        features.set("name", "z");
        row.merge(features);
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["name", "rog_fast"]);
        assert_eq!(row.get("name").unwrap().to_string(), "z");
    }
}
