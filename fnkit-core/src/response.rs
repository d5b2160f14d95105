//! Response envelope built by handler logic
//!
//! A one-shot builder pairing a payload with HTTP-style headers and
//! an optional status code. `build` serializes deterministically and
//! hands the result to the runtime boundary; transmission is the
//! boundary's job, no I/O happens here.
//!
//! When the declared content type is `application/json` the output is
//! canonical: keys sorted lexicographically at every level, 4-space
//! indentation. Consumers compare this byte-for-byte, so the shape is
//! a compatibility contract.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::error::ResponseError;

const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Declarative result of one invocation, not yet serialized.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    payload: Value,
    headers: Vec<(String, String)>,
    status: Option<u16>,
}

/// Wire-ready response: body bytes, headers, status.
#[derive(Debug)]
pub struct SerializedResponse {
    pub body: Bytes,
    pub headers: HeaderMap,
    pub status: StatusCode,
}

impl ResponseEnvelope {
    /// Capture a serializable payload.
    ///
    /// An empty or null payload is perfectly valid; handlers on an
    /// error path hand in whatever placeholder they decided on.
    /// Non-finite floats are rejected here: `serde_json` would
    /// otherwise degrade them to `null` silently, and the caller is
    /// owed an error instead of surprise bytes.
    pub fn from_payload(payload: impl Serialize) -> Result<Self, ResponseError> {
        payload
            .serialize(finite_check::FiniteCheck)
            .map_err(|source| ResponseError::Payload { source })?;

        let payload = serde_json::to_value(payload)
            .map_err(|source| ResponseError::Payload { source })?;

        Ok(Self {
            payload,
            headers: Vec::new(),
            status: None,
        })
    }

    /// Set a response header. Setting the same name twice keeps the
    /// last value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Override the status code. Defaults to 200 when unset.
    pub fn status(mut self, code: u16) -> Self {
        self.status = Some(code);
        self
    }

    /// Serialize under the declared content type.
    ///
    /// The `Content-Type` header governs the encoding; absent one the
    /// payload is treated as `text/plain`.
    pub fn build(self) -> Result<SerializedResponse, ResponseError> {
        let status = match self.status {
            None => StatusCode::OK,
            Some(code) => {
                StatusCode::from_u16(code).map_err(|_| ResponseError::InvalidStatus(code))?
            }
        };

        let mut headers = HeaderMap::with_capacity(self.headers.len() + 1);
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ResponseError::InvalidHeader { name: name.clone() })?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| ResponseError::InvalidHeader { name: name.clone() })?;
            // insert, not append: unique keys, last write wins
            headers.insert(header_name, header_value);
        }

        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        }

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let body = if is_json(&content_type) {
            canonical_json(&self.payload).map_err(|source| ResponseError::Serialization {
                content_type: content_type.clone(),
                source,
            })?
        } else {
            match &self.payload {
                // Text content types carry string payloads verbatim
                Value::String(s) => s.clone().into_bytes(),
                other => {
                    serde_json::to_vec(other).map_err(|source| ResponseError::Serialization {
                        content_type: content_type.clone(),
                        source,
                    })?
                }
            }
        };

        Ok(SerializedResponse {
            body: Bytes::from(body),
            headers,
            status,
        })
    }
}

fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|t| t.eq_ignore_ascii_case("application/json"))
}

/// Canonical JSON: sorted keys, 4-space indent.
///
/// Key ordering falls out of `serde_json::Map` being a `BTreeMap`;
/// the workspace must not enable the `preserve_order` feature.
fn canonical_json(value: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::with_capacity(128);
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Pre-capture walk over a payload that errors on non-finite floats.
///
/// `serde_json` maps NaN and the infinities to `null` in both its
/// value and writer serializers, so by the time a payload is a
/// `Value` the defect is unobservable. This serializer inspects the
/// floats and ignores everything else.
mod finite_check {
    use serde::ser::{self, Serialize};

    pub(super) struct FiniteCheck;

    pub(super) struct Compound;

    fn non_finite() -> serde_json::Error {
        ser::Error::custom("non-finite float value")
    }

    impl ser::Serializer for FiniteCheck {
        type Ok = ();
        type Error = serde_json::Error;

        type SerializeSeq = Compound;
        type SerializeTuple = Compound;
        type SerializeTupleStruct = Compound;
        type SerializeTupleVariant = Compound;
        type SerializeMap = Compound;
        type SerializeStruct = Compound;
        type SerializeStructVariant = Compound;

        fn serialize_f32(self, v: f32) -> Result<(), Self::Error> {
            if v.is_finite() {
                Ok(())
            } else {
                Err(non_finite())
            }
        }

        fn serialize_f64(self, v: f64) -> Result<(), Self::Error> {
            if v.is_finite() {
                Ok(())
            } else {
                Err(non_finite())
            }
        }

        fn serialize_bool(self, _: bool) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_i8(self, _: i8) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_i16(self, _: i16) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_i32(self, _: i32) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_i64(self, _: i64) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_u8(self, _: u8) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_u16(self, _: u16) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_u32(self, _: u32) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_u64(self, _: u64) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_char(self, _: char) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_str(self, _: &str) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_bytes(self, _: &[u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_none(self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_unit(self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_unit_struct(self, _: &'static str) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_unit_variant(
            self,
            _: &'static str,
            _: u32,
            _: &'static str,
        ) -> Result<(), Self::Error> {
            Ok(())
        }

        fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), Self::Error> {
            value.serialize(FiniteCheck)
        }

        fn serialize_newtype_struct<T: ?Sized + Serialize>(
            self,
            _: &'static str,
            value: &T,
        ) -> Result<(), Self::Error> {
            value.serialize(FiniteCheck)
        }

        fn serialize_newtype_variant<T: ?Sized + Serialize>(
            self,
            _: &'static str,
            _: u32,
            _: &'static str,
            value: &T,
        ) -> Result<(), Self::Error> {
            value.serialize(FiniteCheck)
        }

        fn serialize_seq(self, _: Option<usize>) -> Result<Compound, Self::Error> {
            Ok(Compound)
        }

        fn serialize_tuple(self, _: usize) -> Result<Compound, Self::Error> {
            Ok(Compound)
        }

        fn serialize_tuple_struct(
            self,
            _: &'static str,
            _: usize,
        ) -> Result<Compound, Self::Error> {
            Ok(Compound)
        }

        fn serialize_tuple_variant(
            self,
            _: &'static str,
            _: u32,
            _: &'static str,
            _: usize,
        ) -> Result<Compound, Self::Error> {
            Ok(Compound)
        }

        fn serialize_map(self, _: Option<usize>) -> Result<Compound, Self::Error> {
            Ok(Compound)
        }

        fn serialize_struct(self, _: &'static str, _: usize) -> Result<Compound, Self::Error> {
            Ok(Compound)
        }

        fn serialize_struct_variant(
            self,
            _: &'static str,
            _: u32,
            _: &'static str,
            _: usize,
        ) -> Result<Compound, Self::Error> {
            Ok(Compound)
        }
    }

    impl ser::SerializeSeq for Compound {
        type Ok = ();
        type Error = serde_json::Error;

        fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
            value.serialize(FiniteCheck)
        }

        fn end(self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl ser::SerializeTuple for Compound {
        type Ok = ();
        type Error = serde_json::Error;

        fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
            value.serialize(FiniteCheck)
        }

        fn end(self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl ser::SerializeTupleStruct for Compound {
        type Ok = ();
        type Error = serde_json::Error;

        fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
            value.serialize(FiniteCheck)
        }

        fn end(self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl ser::SerializeTupleVariant for Compound {
        type Ok = ();
        type Error = serde_json::Error;

        fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
            value.serialize(FiniteCheck)
        }

        fn end(self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl ser::SerializeMap for Compound {
        type Ok = ();
        type Error = serde_json::Error;

        fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Self::Error> {
            key.serialize(FiniteCheck)
        }

        fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
            value.serialize(FiniteCheck)
        }

        fn end(self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl ser::SerializeStruct for Compound {
        type Ok = ();
        type Error = serde_json::Error;

        fn serialize_field<T: ?Sized + Serialize>(
            &mut self,
            _: &'static str,
            value: &T,
        ) -> Result<(), Self::Error> {
            value.serialize(FiniteCheck)
        }

        fn end(self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl ser::SerializeStructVariant for Compound {
        type Ok = ();
        type Error = serde_json::Error;

        fn serialize_field<T: ?Sized + Serialize>(
            &mut self,
            _: &'static str,
            value: &T,
        ) -> Result<(), Self::Error> {
            value.serialize(FiniteCheck)
        }

        fn end(self) -> Result<(), Self::Error> {
            Ok(())
        }
    }
}
