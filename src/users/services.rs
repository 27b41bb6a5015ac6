use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::error::FieldErrors;
use crate::users::repo_types::{NewUser, UserChanges};

pub const MAX_CHAR_LEN: usize = 20;
pub const MAX_EMAIL_LEN: usize = 254;

const READ_ONLY_FIELDS: [&str; 3] = ["id", "created", "updated"];

const MSG_REQUIRED: &str = "This field is required.";
const MSG_NULL: &str = "This field may not be null.";
const MSG_BLANK: &str = "This field may not be blank.";
const MSG_NOT_STRING: &str = "Not a valid string.";
const MSG_BAD_EMAIL: &str = "Enter a valid email address.";
const MSG_UNKNOWN: &str = "Unknown field.";

/// Outcome of a single field check: the cleaned value or the reason it failed.
pub type FieldResult = Result<String, String>;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        // domain: dot-separated labels, no empty label, no hyphen at either end
        static ref EMAIL_RE: Regex = Regex::new(
            r"^[^@\s]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$"
        )
        .unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Coerce to a trimmed, non-blank string. Numbers are accepted as their text.
fn string_value(value: &Value) -> FieldResult {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Null => return Err(MSG_NULL.into()),
        _ => return Err(MSG_NOT_STRING.into()),
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MSG_BLANK.into());
    }
    Ok(trimmed.to_string())
}

fn check_max_len(value: String, max: usize) -> FieldResult {
    if value.chars().count() > max {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            max
        ));
    }
    Ok(value)
}

pub fn validate_username(value: &Value) -> FieldResult {
    check_max_len(string_value(value)?, MAX_CHAR_LEN)
}

pub fn validate_password(value: &Value) -> FieldResult {
    check_max_len(string_value(value)?, MAX_CHAR_LEN)
}

pub fn validate_phone(value: &Value) -> FieldResult {
    check_max_len(string_value(value)?, MAX_CHAR_LEN)
}

pub fn validate_address(value: &Value) -> FieldResult {
    check_max_len(string_value(value)?, MAX_CHAR_LEN)
}

pub fn validate_email(value: &Value) -> FieldResult {
    let email = check_max_len(string_value(value)?, MAX_EMAIL_LEN)?;
    if !is_valid_email(&email) {
        return Err(MSG_BAD_EMAIL.into());
    }
    Ok(email)
}

/// Validate a JSON payload into the mutable-field subset it carries.
///
/// Every field is checked and all failures are reported together. Read-only
/// keys (`id`, `created`, `updated`) are ignored; anything else unknown is an
/// error on that key.
pub fn from_wire(payload: &Value) -> Result<UserChanges, FieldErrors> {
    let mut errors = FieldErrors::new();
    let Value::Object(map) = payload else {
        errors.add(
            "non_field_errors",
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type_name(payload)
            ),
        );
        return Err(errors);
    };

    let mut changes = UserChanges::default();
    for (key, value) in map {
        let (slot, result) = match key.as_str() {
            "username" => (&mut changes.username, validate_username(value)),
            "password" => (&mut changes.password, validate_password(value)),
            "email" => (&mut changes.email, validate_email(value)),
            "phone" => (&mut changes.phone, validate_phone(value)),
            "address" => (&mut changes.address, validate_address(value)),
            k if READ_ONLY_FIELDS.contains(&k) => continue,
            _ => {
                errors.add(key.as_str(), MSG_UNKNOWN);
                continue;
            }
        };
        match result {
            Ok(v) => *slot = Some(v),
            Err(msg) => errors.add(key.as_str(), msg),
        }
    }

    if errors.is_empty() {
        Ok(changes)
    } else {
        Err(errors)
    }
}

impl UserChanges {
    /// A create needs every mutable field.
    pub fn into_new_user(self) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut take = |name: &str, v: Option<String>| {
            if v.is_none() {
                errors.add(name, MSG_REQUIRED);
            }
            v.unwrap_or_default()
        };
        let new = NewUser {
            username: take("username", self.username),
            password: take("password", self.password),
            email: take("email", self.email),
            phone: take("phone", self.phone),
            address: take("address", self.address),
        };
        if errors.is_empty() {
            Ok(new)
        } else {
            Err(errors)
        }
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_regex() {
        assert!(is_valid_email("a@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@example.com."));
        assert!(!is_valid_email("a@-x..y"));
        assert!(!is_valid_email("a@example..com"));
        assert!(!is_valid_email("a@-example.com"));
        assert!(is_valid_email("a@my-host.example.co"));
    }

    #[test]
    fn char_fields_trim_and_limit() {
        assert_eq!(validate_username(&json!("  alice ")), Ok("alice".into()));
        assert_eq!(validate_phone(&json!(555)), Ok("555".into()));
        assert_eq!(validate_address(&json!("x".repeat(20))), Ok("x".repeat(20)));
        assert_eq!(
            validate_address(&json!("x".repeat(21))),
            Err("Ensure this field has no more than 20 characters.".into())
        );
        // characters, not bytes
        assert!(validate_username(&json!("é".repeat(20))).is_ok());
        assert_eq!(validate_password(&json!("   ")), Err(MSG_BLANK.into()));
        assert_eq!(validate_password(&Value::Null), Err(MSG_NULL.into()));
        assert_eq!(validate_password(&json!(true)), Err(MSG_NOT_STRING.into()));
    }

    #[test]
    fn valid_payload_round_trips_mutable_fields() {
        let payload = json!({
            "username": "alice",
            "password": "pw",
            "email": "a@example.com",
            "phone": "555",
            "address": "1 Main St",
        });
        let new = from_wire(&payload).unwrap().into_new_user().unwrap();
        assert_eq!(
            new,
            NewUser {
                username: "alice".into(),
                password: "pw".into(),
                email: "a@example.com".into(),
                phone: "555".into(),
                address: "1 Main St".into(),
            }
        );
    }

    #[test]
    fn partial_payload_keeps_absent_fields_empty() {
        let changes = from_wire(&json!({ "phone": "777" })).unwrap();
        assert_eq!(
            changes,
            UserChanges {
                phone: Some("777".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn read_only_fields_are_ignored() {
        let changes = from_wire(&json!({
            "id": 42,
            "created": "2020-01-01T00:00:00Z",
            "updated": "2020-01-01T00:00:00Z",
            "username": "bob",
        }))
        .unwrap();
        assert_eq!(changes.username.as_deref(), Some("bob"));
    }

    #[test]
    fn all_offending_fields_are_reported() {
        let errors = from_wire(&json!({
            "username": "u".repeat(21),
            "email": "not-an-email",
            "nickname": "al",
            "phone": "555",
        }))
        .unwrap_err();

        assert_eq!(errors.fields().collect::<Vec<_>>(), ["email", "nickname", "username"]);
        assert_eq!(errors.get("email").unwrap(), [MSG_BAD_EMAIL]);
        assert_eq!(errors.get("nickname").unwrap(), [MSG_UNKNOWN]);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let errors = from_wire(&json!(["alice"])).unwrap_err();
        assert_eq!(
            errors.get("non_field_errors").unwrap(),
            ["Invalid data. Expected a dictionary, but got list."]
        );
    }

    #[test]
    fn create_requires_every_field() {
        let errors = from_wire(&json!({ "username": "alice" }))
            .unwrap()
            .into_new_user()
            .unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            ["address", "email", "password", "phone"]
        );
        assert_eq!(errors.get("email").unwrap(), [MSG_REQUIRED]);
    }
}
