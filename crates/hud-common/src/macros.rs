//! Macros for unwrapping D-Bus property values with a logged fallback.
//!
//! `zbus` hands back property maps as `HashMap<String, OwnedValue>`. These
//! macros pull a typed value out, warn and substitute a default when the
//! remote sent something of the wrong shape instead of failing the whole
//! fetch.

/// Extract a `String` property, defaulting to `String::new()` and warning on mismatch.
#[macro_export]
macro_rules! unwrap_string {
    ($map:expr, $key:expr) => {
        $crate::unwrap_string_or!($map, $key, String::new())
    };
}

/// Extract a `String` property with an explicit default.
#[macro_export]
macro_rules! unwrap_string_or {
    ($map:expr, $key:expr, $default:expr) => {
        match $map.get($key) {
            Some(value) => match <String>::try_from(value.clone()) {
                Ok(s) => s,
                Err(_) => {
                    ::tracing::warn!(key = $key, "property present but not a string");
                    $default
                }
            },
            None => $default,
        }
    };
}

/// Extract a `bool` property, defaulting to `false` and warning on mismatch.
#[macro_export]
macro_rules! unwrap_bool {
    ($map:expr, $key:expr) => {
        $crate::unwrap_bool_or!($map, $key, false)
    };
}

/// Extract a `bool` property with an explicit default.
#[macro_export]
macro_rules! unwrap_bool_or {
    ($map:expr, $key:expr, $default:expr) => {
        match $map.get($key) {
            Some(value) => match <bool>::try_from(value.clone()) {
                Ok(b) => b,
                Err(_) => {
                    ::tracing::warn!(key = $key, "property present but not a bool");
                    $default
                }
            },
            None => $default,
        }
    };
}

/// Extract a `u32` property with an explicit default.
#[macro_export]
macro_rules! unwrap_u32_or {
    ($map:expr, $key:expr, $default:expr) => {
        match $map.get($key) {
            Some(value) => match <u32>::try_from(value.clone()) {
                Ok(n) => n,
                Err(_) => {
                    ::tracing::warn!(key = $key, "property present but not a u32");
                    $default
                }
            },
            None => $default,
        }
    };
}

/// Extract an `i32` property with an explicit default.
#[macro_export]
macro_rules! unwrap_i32_or {
    ($map:expr, $key:expr, $default:expr) => {
        match $map.get($key) {
            Some(value) => match <i32>::try_from(value.clone()) {
                Ok(n) => n,
                Err(_) => {
                    ::tracing::warn!(key = $key, "property present but not an i32");
                    $default
                }
            },
            None => $default,
        }
    };
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use zbus::zvariant::OwnedValue;

    #[test]
    fn unwrap_string_returns_default_on_missing_key() {
        let map: HashMap<String, OwnedValue> = HashMap::new();
        let value = unwrap_string!(map, "label");
        assert_eq!(value, "");
    }

    #[test]
    fn unwrap_string_returns_value_when_present() {
        let mut map: HashMap<String, OwnedValue> = HashMap::new();
        map.insert("label".into(), OwnedValue::from("File"));
        let value = unwrap_string!(map, "label");
        assert_eq!(value, "File");
    }

    #[test]
    fn unwrap_bool_or_falls_back_on_type_mismatch() {
        let mut map: HashMap<String, OwnedValue> = HashMap::new();
        map.insert("enabled".into(), OwnedValue::from("not-a-bool"));
        let value = unwrap_bool_or!(map, "enabled", true);
        assert!(value);
    }
}
