//! Inbound command decoding
//!
//! The method channel delivers `(method, arguments)` pairs with untyped
//! arguments. This module is the only place those maps are inspected; the
//! rest of the bridge works with [`Command`].

use entrig_core::prelude::*;
use serde_json::{Map, Value};

/// `init` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitConfig {
    pub api_key: String,
    /// Let the SDK prompt for notification permission during init (default: true)
    pub handle_permission: bool,
    /// Show a system banner for notifications received in foreground (default: true)
    pub show_foreground_notification: bool,
}

impl InitConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            handle_permission: true,
            show_foreground_notification: true,
        }
    }
}

/// `register` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterArgs {
    pub user_id: String,
}

/// Typed inbound command, one variant per method name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Init(InitConfig),
    Register(RegisterArgs),
    RequestPermission,
    Unregister,
    GetInitialNotification,
}

impl Command {
    /// Decode a method call.
    ///
    /// Unknown method names yield [`Error::NotImplemented`]; argument problems
    /// yield [`Error::InvalidArgument`] or [`Error::InvalidApiKey`].
    pub fn decode(method: &str, arguments: &Value) -> Result<Self> {
        match method {
            "init" => decode_init(arguments).map(Command::Init),
            "register" => decode_register(arguments).map(Command::Register),
            "requestPermission" => Ok(Command::RequestPermission),
            "unregister" => Ok(Command::Unregister),
            "getInitialNotification" => Ok(Command::GetInitialNotification),
            other => Err(Error::not_implemented(other)),
        }
    }

    /// Method name on the channel
    pub fn method(&self) -> &'static str {
        match self {
            Command::Init(_) => "init",
            Command::Register(_) => "register",
            Command::RequestPermission => "requestPermission",
            Command::Unregister => "unregister",
            Command::GetInitialNotification => "getInitialNotification",
        }
    }
}

fn decode_init(arguments: &Value) -> Result<InitConfig> {
    let args = argument_map(arguments, "apiKey")?;

    let api_key = required_string(args, "apiKey")?;
    if api_key.is_empty() {
        return Err(Error::InvalidApiKey);
    }

    Ok(InitConfig {
        api_key,
        handle_permission: optional_bool(args, "handlePermission", true)?,
        show_foreground_notification: optional_bool(args, "showForegroundNotification", true)?,
    })
}

fn decode_register(arguments: &Value) -> Result<RegisterArgs> {
    let args = argument_map(arguments, "userId")?;
    let user_id = required_string(args, "userId")?;
    if user_id.is_empty() {
        return Err(Error::invalid_argument("userId", "userId cannot be empty"));
    }
    Ok(RegisterArgs { user_id })
}

/// Arguments must be a map; `field` names the required key for the error
fn argument_map<'a>(arguments: &'a Value, field: &str) -> Result<&'a Map<String, Value>> {
    arguments
        .as_object()
        .ok_or_else(|| Error::invalid_argument(field, format!("{} is required", field)))
}

fn required_string(args: &Map<String, Value>, field: &str) -> Result<String> {
    match args.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(Error::invalid_argument(
            field,
            format!("{} is required", field),
        )),
        Some(_) => Err(Error::invalid_argument(
            field,
            format!("{} must be a string", field),
        )),
    }
}

fn optional_bool(args: &Map<String, Value>, field: &str, default: bool) -> Result<bool> {
    match args.get(field) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Null) | None => Ok(default),
        Some(_) => Err(Error::invalid_argument(
            field,
            format!("{} must be a boolean", field),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_init_defaults() {
        let cmd = Command::decode("init", &json!({"apiKey": "k"})).unwrap();
        assert_eq!(cmd, Command::Init(InitConfig::new("k")));
    }

    #[test]
    fn test_decode_init_flags() {
        let cmd = Command::decode(
            "init",
            &json!({"apiKey": "k", "handlePermission": false, "showForegroundNotification": false}),
        )
        .unwrap();

        let Command::Init(config) = cmd else {
            panic!("expected init");
        };
        assert!(!config.handle_permission);
        assert!(!config.show_foreground_notification);
    }

    #[test]
    fn test_decode_init_null_flags_use_defaults() {
        let args = json!({"apiKey": "k", "handlePermission": null});
        let cmd = Command::decode("init", &args).unwrap();
        assert_eq!(cmd, Command::Init(InitConfig::new("k")));
    }

    #[test]
    fn test_decode_init_empty_api_key() {
        let err = Command::decode("init", &json!({"apiKey": ""})).unwrap_err();
        assert!(matches!(err, Error::InvalidApiKey));
    }

    #[test]
    fn test_decode_init_missing_api_key() {
        let err = Command::decode("init", &json!({})).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENTS");

        let err = Command::decode("init", &Value::Null).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENTS");
    }

    #[test]
    fn test_decode_init_wrong_types() {
        assert!(Command::decode("init", &json!({"apiKey": 5})).is_err());
        let err = Command::decode("init", &json!({"apiKey": "k", "handlePermission": "yes"}))
            .unwrap_err();
        assert!(err.to_string().contains("handlePermission"));
    }

    #[test]
    fn test_decode_register() {
        let cmd = Command::decode("register", &json!({"userId": "u-1"})).unwrap();
        assert_eq!(
            cmd,
            Command::Register(RegisterArgs {
                user_id: "u-1".to_string()
            })
        );
    }

    #[test]
    fn test_decode_register_invalid() {
        assert!(Command::decode("register", &json!({})).is_err());
        assert!(Command::decode("register", &json!({"userId": ""})).is_err());
    }

    #[test]
    fn test_decode_argumentless_commands_ignore_arguments() {
        assert_eq!(
            Command::decode("requestPermission", &Value::Null).unwrap(),
            Command::RequestPermission
        );
        assert_eq!(
            Command::decode("unregister", &json!({"extra": 1})).unwrap(),
            Command::Unregister
        );
        assert_eq!(
            Command::decode("getInitialNotification", &Value::Null).unwrap(),
            Command::GetInitialNotification
        );
    }

    #[test]
    fn test_decode_unknown_method() {
        let err = Command::decode("setBadge", &Value::Null).unwrap_err();
        assert!(matches!(err, Error::NotImplemented { ref method } if method == "setBadge"));
    }

    #[test]
    fn test_method_names_round_trip() {
        for cmd in [
            Command::Init(InitConfig::new("k")),
            Command::Register(RegisterArgs {
                user_id: "u".into(),
            }),
            Command::RequestPermission,
            Command::Unregister,
            Command::GetInitialNotification,
        ] {
            let args = json!({"apiKey": "k", "userId": "u"});
            assert_eq!(Command::decode(cmd.method(), &args).unwrap(), cmd);
        }
    }
}
