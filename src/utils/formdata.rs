use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Folds flat multipart text fields into a nested JSON object, so that
/// `location[city]=Austin` and `budget[min]=50000` decode into structured
/// DTOs. Only one nesting level is supported, matching the form contract.
/// Leaf values that parse as JSON arrays or objects (e.g. a `requirements`
/// list submitted as `["a","b"]`) are expanded; everything else stays a
/// string and is coerced by the DTO's own deserializers.
pub fn nest_fields(fields: Vec<(String, String)>) -> Value {
    let mut root = Map::new();

    for (name, raw) in fields {
        let value = coerce_leaf(&raw);

        match split_bracket_key(&name) {
            Some((parent, child)) => {
                let entry = root
                    .entry(parent.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(map) = entry {
                    map.insert(child.to_string(), value);
                }
            }
            None => {
                root.insert(name, value);
            }
        }
    }

    Value::Object(root)
}

/// Splits `parent[child]` into its two parts; plain names return None.
fn split_bracket_key(name: &str) -> Option<(&str, &str)> {
    let open = name.find('[')?;
    let close = name.rfind(']')?;
    if close != name.len() - 1 || open == 0 || close <= open + 1 {
        return None;
    }
    Some((&name[..open], &name[open + 1..close]))
}

fn coerce_leaf(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
            return parsed;
        }
    }
    Value::String(raw.to_string())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    String(String),
}

/// Accepts either a JSON number or the string form multipart delivers.
pub fn de_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match NumberOrString::<f64>::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub fn de_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    match NumberOrString::<i32>::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub fn de_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<NumberOrString<f64>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

pub fn de_opt_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    match Option::<NumberOrString<i32>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

pub fn de_opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim() {
            "" => Ok(None),
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "invalid boolean value: {}",
                other
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nests_bracketed_fields_under_their_parent() {
        let fields = vec![
            ("title".to_string(), "Warehouse refit".to_string()),
            ("location[city]".to_string(), "Austin".to_string()),
            ("location[state]".to_string(), "TX".to_string()),
            ("budget[min]".to_string(), "50000".to_string()),
            ("budget[max]".to_string(), "120000".to_string()),
        ];

        let nested = nest_fields(fields);
        assert_eq!(nested["title"], json!("Warehouse refit"));
        assert_eq!(nested["location"]["city"], json!("Austin"));
        assert_eq!(nested["location"]["state"], json!("TX"));
        assert_eq!(nested["budget"]["min"], json!("50000"));
    }

    #[test]
    fn json_array_leaves_are_expanded() {
        let fields = vec![(
            "requirements".to_string(),
            r#"["permits","site survey"]"#.to_string(),
        )];

        let nested = nest_fields(fields);
        assert_eq!(nested["requirements"], json!(["permits", "site survey"]));
    }

    #[test]
    fn malformed_bracket_names_stay_flat() {
        let fields = vec![
            ("weird[".to_string(), "a".to_string()),
            ("[city]".to_string(), "b".to_string()),
        ];

        let nested = nest_fields(fields);
        assert_eq!(nested["weird["], json!("a"));
        assert_eq!(nested["[city]"], json!("b"));
    }

    #[test]
    fn numeric_strings_deserialize_into_typed_fields() {
        #[derive(Deserialize)]
        struct Budget {
            #[serde(deserialize_with = "de_f64")]
            min: f64,
            #[serde(deserialize_with = "de_opt_i32", default)]
            floors: Option<i32>,
        }

        let value = json!({"min": "50000.5", "floors": "3"});
        let budget: Budget = serde_json::from_value(value).unwrap();
        assert_eq!(budget.min, 50000.5);
        assert_eq!(budget.floors, Some(3));

        let value = json!({"min": 10.0});
        let budget: Budget = serde_json::from_value(value).unwrap();
        assert_eq!(budget.floors, None);
    }
}
