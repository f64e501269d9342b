//! Request body parsing.
//!
//! Runs after authentication and before the middleware stack, so hooks see
//! [`Request::data`](crate::Request::data) already decoded.

use bytes::Bytes;
use http::HeaderValue;
use serde::de::DeserializeOwned;

use crate::error::HttpError;

/// The parsed request body.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Data {
    /// No body was sent.
    #[default]
    Empty,
    /// `application/json` (or any `+json` media type).
    Json(serde_json::Value),
    /// Any other content type. The bytes are left untouched.
    Raw(Bytes),
}

impl Data {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Deserializes a JSON body into `T`. Fails with `400 Bad Request` when
    /// the body is not JSON or does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        let value = self
            .as_json()
            .ok_or_else(|| HttpError::bad_request("expected a JSON body"))?;
        T::deserialize(value).map_err(|e| HttpError::bad_request(e.to_string()))
    }
}

/// Parses `body` according to its `content-type`.
pub fn parse_body(content_type: Option<&HeaderValue>, body: &Bytes) -> Result<Data, HttpError> {
    if body.is_empty() {
        return Ok(Data::Empty);
    }

    if content_type.is_some_and(is_json) {
        return serde_json::from_slice(body)
            .map(Data::Json)
            .map_err(|e| HttpError::bad_request(format!("malformed JSON: {e}")));
    }

    Ok(Data::Raw(body.clone()))
}

fn is_json(content_type: &HeaderValue) -> bool {
    let Ok(value) = content_type.to_str() else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json")
        || essence.len() > 5 && essence[essence.len() - 5..].eq_ignore_ascii_case("+json")
}
