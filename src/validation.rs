//! JSON body parsing with field-level validation.
//!
//! Every request schema lists the keys it accepts and declares its field rules
//! with `validator`. [`ValidJson`] collects every problem with the body (keys
//! outside the schema, values of the wrong JSON type, failed rules) into one
//! `422` response instead of stopping at the first.

use std::marker::PhantomData;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

use tracing::debug;

use crate::errors::{ApiError, FieldErrors, SCHEMA_FIELD};

pub const MISSING_FIELD: &str = "Missing data for required field.";
pub const NULL_FIELD: &str = "Field may not be null.";
pub const UNKNOWN_FIELD: &str = "Unknown field.";
pub const INVALID_INPUT: &str = "Invalid input type.";

/// A request body schema.
///
/// All fields must be `Option`s at the serde level so that each key can be
/// type-checked on its own; required fields are enforced by `validator`.
pub trait Payload: DeserializeOwned + Validate {
    /// Keys accepted in the body. Anything else is rejected.
    const FIELDS: &'static [&'static str];
}

/// Extractor yielding a body that passed its schema.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: Payload,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        parse_payload(&body).map(ValidJson)
    }
}

/// Body read up front but parsed only on demand, for handlers that must
/// authorize against a stored record before looking at the payload.
#[derive(Debug)]
pub struct JsonBody<T> {
    body: Bytes,
    schema: PhantomData<T>,
}

impl<T: Payload> JsonBody<T> {
    pub fn parse(&self) -> Result<T, ApiError> {
        parse_payload(&self.body)
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: Payload,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Ok(JsonBody {
            body,
            schema: PhantomData,
        })
    }
}

/// Integer record id taken from the path. Anything that is not a valid id
/// cannot name a record, so it is reported as not found.
#[derive(Debug, Clone, Copy)]
pub struct RecordId(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                debug!(reason = %rejection.body_text(), "Rejected record id");
                ApiError::NotFound
            })?;
        Ok(RecordId(id))
    }
}

/// Parse and validate a raw body. An empty body or `null` counts as `{}`.
pub fn parse_payload<T: Payload>(body: &[u8]) -> Result<T, ApiError> {
    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {e}")))?
    };

    let object = match value {
        Value::Null => Map::new(),
        Value::Object(object) => object,
        _ => return Err(ApiError::invalid_field(SCHEMA_FIELD, INVALID_INPUT)),
    };

    let mut errors = FieldErrors::new();
    let mut accepted = Map::new();
    for (key, value) in object {
        if !T::FIELDS.contains(&key.as_str()) {
            errors.entry(key).or_default().push(UNKNOWN_FIELD.to_string());
            continue;
        }

        if value.is_null() {
            errors.entry(key).or_default().push(NULL_FIELD.to_string());
            continue;
        }

        let single = Value::Object(Map::from_iter([(key.clone(), value.clone())]));
        if let Err(e) = serde_json::from_value::<T>(single) {
            errors.entry(key).or_default().push(e.to_string());
            continue;
        }

        accepted.insert(key, value);
    }

    match serde_json::from_value::<T>(Value::Object(accepted)) {
        Ok(payload) => {
            if let Err(rule_errors) = payload.validate() {
                // Fields that already failed their type check keep only that message
                for (field, messages) in field_errors(&rule_errors) {
                    errors.entry(field).or_insert(messages);
                }
            }
            if errors.is_empty() {
                return Ok(payload);
            }
        }
        Err(e) => errors
            .entry(SCHEMA_FIELD.to_string())
            .or_default()
            .push(e.to_string()),
    }

    Err(ApiError::Validation(errors))
}

/// Flatten `validator` errors into the field map sent to clients.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => error.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Take a field the schema already declared as required.
pub fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::invalid_field(field, MISSING_FIELD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    const EMPTY_FIELD: &str = "Shorter than minimum length 1.";
    const INVALID_EMAIL: &str = "Not a valid email address.";

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(required(message = "Missing data for required field."), length(min = 1, message = "Shorter than minimum length 1."))]
        name: Option<String>,
        #[validate(email(message = "Not a valid email address."))]
        email: Option<String>,
    }

    impl Payload for Sample {
        const FIELDS: &'static [&'static str] = &["name", "email"];
    }

    fn details(result: Result<Sample, ApiError>) -> FieldErrors {
        match result {
            Err(ApiError::Validation(details)) => details,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_payload() {
        let sample: Sample = parse_payload(br#"{"name": "x", "email": "x@example.com"}"#).unwrap();

        assert_eq!(sample.name.as_deref(), Some("x"));
        assert_eq!(sample.email.as_deref(), Some("x@example.com"));
    }

    #[test]
    fn test_empty_body_is_an_empty_object() {
        let errors = details(parse_payload::<Sample>(b""));

        assert_eq!(errors["name"], vec![MISSING_FIELD.to_string()]);
        assert!(!errors.contains_key("email"));
        assert_eq!(details(parse_payload::<Sample>(b"null")), errors);
    }

    #[test]
    fn test_errors_are_aggregated() {
        let errors = details(parse_payload::<Sample>(br#"{"name": "", "email": "foo", "id": 5}"#));

        assert_eq!(errors.len(), 3);
        assert_eq!(errors["id"], vec![UNKNOWN_FIELD.to_string()]);
        assert_eq!(errors["name"], vec![EMPTY_FIELD.to_string()]);
        assert_eq!(errors["email"], vec![INVALID_EMAIL.to_string()]);
    }

    #[test]
    fn test_wrong_type_names_the_field() {
        let errors = details(parse_payload::<Sample>(br#"{"name": 5, "email": []}"#));

        assert_eq!(errors["name"].len(), 1);
        assert_ne!(errors["name"][0], MISSING_FIELD);
        assert!(errors.contains_key("email"));
    }

    #[test]
    fn test_null_field_is_rejected() {
        let errors = details(parse_payload::<Sample>(br#"{"name": null, "email": null}"#));

        // The null message wins over the missing-field rule
        assert_eq!(errors["name"], vec![NULL_FIELD.to_string()]);
        assert_eq!(errors["email"], vec![NULL_FIELD.to_string()]);
    }

    #[tokio::test]
    async fn test_body_is_parsed_on_demand() {
        let request = axum::http::Request::builder()
            .body(axum::body::Body::from(r#"{"id": 1}"#))
            .unwrap();
        let body = JsonBody::<Sample>::from_request(request, &()).await.unwrap();

        let errors = details(body.parse());
        assert_eq!(errors["id"], vec![UNKNOWN_FIELD.to_string()]);
    }

    #[test]
    fn test_non_object_body() {
        let errors = details(parse_payload::<Sample>(b"[1, 2]"));
        assert_eq!(errors[SCHEMA_FIELD], vec![INVALID_INPUT.to_string()]);

        assert!(matches!(
            parse_payload::<Sample>(b"{not json"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_required_helper() {
        assert_eq!(required(Some(1), "id").unwrap(), 1);
        assert!(matches!(required::<i32>(None, "id"), Err(ApiError::Validation(_))));
    }
}
