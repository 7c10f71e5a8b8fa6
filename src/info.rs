use rustc_hash::FxHashMap;
use std::fmt;

/// A single INFO value. Text parsed from a raw line is typed as an integer,
/// then a float, then left as a string; typed arrays only come from the
/// structured htslib reader where the header declares Number != 1.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue {
    Flag,
    Integer(i64),
    Float(f64),
    String(String),
    IntegerArray(Vec<i64>),
    FloatArray(Vec<f64>),
    StringArray(Vec<String>),
}

impl InfoValue {
    /// Type a raw `key=value` value. Comma lists stay as untyped strings.
    pub fn parse(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            InfoValue::Integer(i)
        } else if let (true, Ok(f)) = (
            raw.bytes().any(|b| b.is_ascii_digit()),
            raw.parse::<f64>(),
        ) {
            // the digit check keeps words like "inf" or "NaN" as text
            InfoValue::Float(f)
        } else {
            InfoValue::String(raw.to_string())
        }
    }
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, vals: &[T]) -> fmt::Result {
    for (i, v) in vals.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", v)?;
    }
    Ok(())
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Flag => write!(f, "true"),
            InfoValue::Integer(i) => write!(f, "{}", i),
            InfoValue::Float(v) => write!(f, "{}", v),
            InfoValue::String(s) => write!(f, "{}", s),
            InfoValue::IntegerArray(v) => join(f, v),
            InfoValue::FloatArray(v) => join(f, v),
            InfoValue::StringArray(v) => join(f, v),
        }
    }
}

/// A typed INFO value together with the text it was read from. Values
/// built from htslib fields carry the text htslib would print.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoField {
    pub value: InfoValue,
    raw: Option<String>,
}

impl InfoField {
    pub fn new(value: InfoValue) -> Self {
        InfoField { value, raw: None }
    }

    pub fn with_raw(value: InfoValue, raw: impl Into<String>) -> Self {
        InfoField {
            value,
            raw: Some(raw.into()),
        }
    }

    /// The original text, if any.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl fmt::Display for InfoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Some(raw) => write!(f, "{}", raw),
            None => write!(f, "{}", self.value),
        }
    }
}

/// Key/value view of an INFO column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info(FxHashMap<String, InfoField>);

impl Info {
    /// Parse a `key=value;key=value` string. Segments are split on the first
    /// `=`; segments without one become flags keyed by their text. Empty
    /// segments (`;;`) are skipped. An empty string or `.` yields an empty map.
    pub fn parse(info: &str) -> Self {
        let mut map = FxHashMap::default();
        if info.is_empty() || info == "." {
            return Info(map);
        }
        for item in info.split(';') {
            if item.is_empty() {
                continue;
            }
            match item.split_once('=') {
                Some((k, v)) => {
                    map.insert(k.to_string(), InfoField::with_raw(InfoValue::parse(v), v));
                }
                None => {
                    map.insert(item.to_string(), InfoField::new(InfoValue::Flag));
                }
            }
        }
        Info(map)
    }

    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.0.get(key).map(|f| &f.value)
    }

    pub fn field(&self, key: &str) -> Option<&InfoField> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, field: InfoField) {
        self.0.insert(key.into(), field);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The value of `key` as written in the INFO column, if present.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|f| f.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typed_values() {
        let info = Info::parse("DP=30;AF=0.5;DB;CLNDN=Breast_cancer");
        assert_eq!(info.get("DP"), Some(&InfoValue::Integer(30)));
        assert_eq!(info.get("AF"), Some(&InfoValue::Float(0.5)));
        assert_eq!(info.get("DB"), Some(&InfoValue::Flag));
        assert_eq!(
            info.get("CLNDN"),
            Some(&InfoValue::String("Breast_cancer".to_string()))
        );
        assert_eq!(info.len(), 4);
    }

    #[test]
    fn test_split_on_first_equals() {
        let info = Info::parse("EXPR=a=b;K=");
        assert_eq!(info.text("EXPR").as_deref(), Some("a=b"));
        assert_eq!(info.text("K").as_deref(), Some(""));
    }

    #[test]
    fn test_list_values_stay_text() {
        let info = Info::parse("AF=0.25,0.75");
        assert_eq!(
            info.get("AF"),
            Some(&InfoValue::String("0.25,0.75".to_string()))
        );
    }

    #[test]
    fn test_empty_and_missing() {
        assert!(Info::parse("").is_empty());
        assert!(Info::parse(".").is_empty());
        assert!(Info::parse(";;").is_empty());
    }

    #[test]
    fn test_text_is_kept_as_written() {
        let info = Info::parse("ALLELEID=0015;AF=0.50;X=1e-7;Y=1e-300;CLNSIG=+1;DP=030");
        assert_eq!(info.text("ALLELEID").as_deref(), Some("0015"));
        assert_eq!(info.text("AF").as_deref(), Some("0.50"));
        assert_eq!(info.text("X").as_deref(), Some("1e-7"));
        assert_eq!(info.text("Y").as_deref(), Some("1e-300"));
        assert_eq!(info.text("CLNSIG").as_deref(), Some("+1"));
        assert_eq!(info.text("DP").as_deref(), Some("030"));
        // the typed value is still available
        assert_eq!(info.get("DP"), Some(&InfoValue::Integer(30)));
        assert_eq!(info.get("AF"), Some(&InfoValue::Float(0.5)));
    }

    #[test]
    fn test_field_without_raw_uses_value() {
        let field = InfoField::new(InfoValue::IntegerArray(vec![1, 2]));
        assert_eq!(field.raw(), None);
        assert_eq!(field.to_string(), "1,2");
    }

    #[test]
    fn test_display_arrays() {
        assert_eq!(InfoValue::FloatArray(vec![0.5, 0.25]).to_string(), "0.5,0.25");
        assert_eq!(InfoValue::IntegerArray(vec![3]).to_string(), "3");
        assert_eq!(
            InfoValue::StringArray(vec!["a".into(), "b".into()]).to_string(),
            "a,b"
        );
    }
}
