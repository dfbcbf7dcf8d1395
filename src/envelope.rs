//! # Result Envelope
//!
//! Every dispatch ends in a [`ResultEnvelope`]: a `{code, data, text}` triple
//! that serializes to the same JSON shape whether the handler succeeded,
//! reported a business error, or crashed.
//!
//! ```text
//! {"code":0,"data":null,"text":"success"}        fresh envelope
//! {"code":0,"data":"hi","text":"success"}        after set_data("hi")
//! {"code":409,"data":{},"text":"conflict"}       after set_error(409, ..)
//! ```
//!
//! The envelope is generic over the handler's declared output type. The
//! registry erases it to [`Envelope`] (`ResultEnvelope<serde_json::Value>`)
//! so that handlers with different outputs can share one dispatch path.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Code carried by a successful envelope
pub const SUCCESS_CODE: i32 = 0;

/// Text carried by a successful envelope
pub const SUCCESS_TEXT: &str = "success";

/// Returned by [`ResultEnvelope::json`] when serialization fails
pub const EMPTY_JSON: &str = "{}";

/// Type-erased envelope produced by the registry
pub type Envelope = ResultEnvelope<Value>;

/// Payload slot of an envelope.
///
/// `Unset` serializes as `null`, `Cleared` as `{}` (the state left behind by
/// [`ResultEnvelope::set_error`]).
#[derive(Debug, Clone, PartialEq)]
enum Payload<T> {
    Unset,
    Cleared,
    Value(T),
}

impl<T: Serialize> Serialize for Payload<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Payload::Unset => serializer.serialize_none(),
            Payload::Cleared => serializer.serialize_map(Some(0))?.end(),
            Payload::Value(value) => value.serialize(serializer),
        }
    }
}

/// Uniform success/error response of a dispatch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope<T = Value> {
    code: i32,
    data: Payload<T>,
    text: String,
}

impl<T> Default for ResultEnvelope<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResultEnvelope<T> {
    /// Create an empty success envelope
    #[must_use]
    pub fn new() -> Self {
        Self {
            code: SUCCESS_CODE,
            data: Payload::Unset,
            text: SUCCESS_TEXT.to_string(),
        }
    }

    /// Create a success envelope carrying `data`
    #[must_use]
    pub fn success(data: T) -> Self {
        let mut envelope = Self::new();
        envelope.set_data(data);
        envelope
    }

    /// Create a failed envelope
    #[must_use]
    pub fn failure<E: fmt::Display>(code: i32, err: E) -> Self {
        let mut envelope = Self::new();
        envelope.set_error(code, err);
        envelope
    }

    /// Set the success payload. Code and text are left untouched.
    pub fn set_data(&mut self, data: T) -> &mut Self {
        self.data = Payload::Value(data);
        self
    }

    /// Mark the envelope as failed.
    ///
    /// Clears the payload to an empty object and uses the error's `Display`
    /// output as `text`. Repeated calls keep the last call's values.
    pub fn set_error<E: fmt::Display>(&mut self, code: i32, err: E) -> &mut Self {
        self.code = code;
        self.data = Payload::Cleared;
        self.text = err.to_string();
        self
    }

    /// True iff `code == 0`
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    #[inline]
    #[must_use]
    pub fn code(&self) -> i32 {
        self.code
    }

    /// The payload, if one was set and not cleared by an error
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match &self.data {
            Payload::Value(value) => Some(value),
            Payload::Unset | Payload::Cleared => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl<T: Serialize> ResultEnvelope<T> {
    /// Serialize as `{"code":..,"data":..,"text":..}`.
    ///
    /// Never fails: a payload that cannot be serialized yields `{}`.
    #[must_use]
    pub fn json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| EMPTY_JSON.to_string())
    }

    /// Erase the payload type into a JSON value
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the payload cannot be represented as JSON.
    pub fn into_value(self) -> Result<Envelope, serde_json::Error> {
        let data = match self.data {
            Payload::Unset => Payload::Unset,
            Payload::Cleared => Payload::Cleared,
            Payload::Value(value) => Payload::Value(serde_json::to_value(value)?),
        };
        Ok(ResultEnvelope {
            code: self.code,
            data,
            text: self.text,
        })
    }
}

impl<T: Serialize> fmt::Display for ResultEnvelope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.json())
    }
}
