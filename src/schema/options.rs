use serde_json::Value;

pub type Options = serde_json::Map<String, Value>;

/// Keys this crate writes itself when deriving operations from live objects.
pub mod keys {
    pub const ONUPDATE: &str = "onupdate";
    pub const ONDELETE: &str = "ondelete";
    pub const DEFERRABLE: &str = "deferrable";
    pub const INITIALLY: &str = "initially";
    pub const USE_ALTER: &str = "use_alter";

    /// Read by the column factory when reconstructing a column.
    pub const NULLABLE: &str = "nullable";
    pub const SERVER_DEFAULT: &str = "server_default";
    pub const TYPE: &str = "type";
}

pub fn get_str<'a>(options: &'a Options, key: &str) -> Option<&'a str> {
    options.get(key).and_then(Value::as_str)
}

pub fn get_bool(options: &Options, key: &str) -> Option<bool> {
    options.get(key).and_then(Value::as_bool)
}

/// Insert `value` only when it is truthy, leaving the key absent otherwise.
pub(crate) fn insert_if_set(options: &mut Options, key: &str, value: Option<Value>) {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {}
        Some(Value::String(ref s)) if s.is_empty() => {}
        Some(value) => {
            options.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_values_are_not_inserted() {
        let mut options = Options::new();
        insert_if_set(&mut options, keys::DEFERRABLE, Some(json!(false)));
        insert_if_set(&mut options, keys::INITIALLY, Some(json!("")));
        insert_if_set(&mut options, keys::ONDELETE, None);

        assert!(options.is_empty());
    }

    #[test]
    fn truthy_values_are_inserted() {
        let mut options = Options::new();
        insert_if_set(&mut options, keys::DEFERRABLE, Some(json!(true)));
        insert_if_set(&mut options, keys::ONDELETE, Some(json!("CASCADE")));

        assert_eq!(get_bool(&options, keys::DEFERRABLE), Some(true));
        assert_eq!(get_str(&options, keys::ONDELETE), Some("CASCADE"));
    }
}
