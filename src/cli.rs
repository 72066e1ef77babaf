//! Turning command line arguments into requests and response bodies into output.
//!
//! Request items follow a small syntax:
//!
//! - `name==value` adds a query parameter
//! - `Name:value` adds a header
//! - `name=value` adds a string field to a JSON body
//!
//! A raw JSON body can be given with `--data` instead of fields.

use crate::{auth::AUTHORIZATION, request::OutgoingRequest};
use reqwest::Method;
use serde_json::{Map, Value};
use std::io::{self, Write};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestItem {
    Query(String, String),
    Header(String, String),
    Field(String, String),
}

impl RequestItem {
    pub fn parse(item: &str) -> Result<Self, RequestArgError> {
        let Some(pos) = item.find(['=', ':']) else {
            return Err(RequestArgError::InvalidItem(item.to_string()));
        };
        let (name, rest) = item.split_at(pos);
        if name.is_empty() {
            return Err(RequestArgError::InvalidItem(item.to_string()));
        }

        let item = if let Some(value) = rest.strip_prefix("==") {
            RequestItem::Query(name.into(), value.into())
        } else if let Some(value) = rest.strip_prefix('=') {
            RequestItem::Field(name.into(), value.into())
        } else {
            RequestItem::Header(name.into(), rest[1..].trim_start().into())
        };
        Ok(item)
    }
}

/// Builds a request from the method, path and request items given on the command line.
pub fn build_request(
    method: &str,
    path: &str,
    items: &[String],
    data: Option<&str>,
) -> Result<OutgoingRequest, RequestArgError> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| RequestArgError::InvalidMethod(method.to_string()))?;
    let mut request = OutgoingRequest::new(method, path);

    let mut fields = Map::new();
    for item in items {
        match RequestItem::parse(item)? {
            RequestItem::Query(name, value) => request.query.append(name, value),
            RequestItem::Header(name, _) if name.eq_ignore_ascii_case(AUTHORIZATION) => {
                return Err(RequestArgError::ReservedHeader(name));
            }
            RequestItem::Header(name, value) => request.headers.append(name, value),
            RequestItem::Field(name, value) => {
                fields.insert(name, Value::String(value));
            }
        }
    }

    request.body = match (data, fields.is_empty()) {
        (Some(_), false) => return Err(RequestArgError::ConflictingBody),
        (Some(data), true) => {
            let json: Value = serde_json::from_str(data).map_err(RequestArgError::InvalidData)?;
            Some(serde_json::to_vec(&json).map_err(RequestArgError::InvalidData)?)
        }
        (None, false) => {
            Some(serde_json::to_vec(&Value::Object(fields)).map_err(RequestArgError::InvalidData)?)
        }
        (None, true) => None,
    };

    Ok(request)
}

/// Marks the request as a JSON exchange.
pub fn inject_json_headers(request: &mut OutgoingRequest) {
    request.headers.upsert("Accept", "application/json");
    if request.body.is_some() {
        request.headers.upsert("Content-Type", "application/json");
    }
}

/// Writes a response body, pretty-printed when it is JSON and verbatim otherwise.
pub fn print_response_body(body: &[u8], out: &mut impl Write) -> io::Result<()> {
    match serde_json::from_slice::<Value>(body) {
        Ok(json) => {
            serde_json::to_writer_pretty(&mut *out, &json)?;
            out.write_all(b"\n")
        }
        Err(_) => {
            out.write_all(body)?;
            if !body.ends_with(b"\n") {
                out.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}

#[derive(Error, Debug)]
pub enum RequestArgError {
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Invalid request item `{0}`; expected name==value, Name:value or name=value")]
    InvalidItem(String),

    #[error("The {0} header is managed by amapi and cannot be set")]
    ReservedHeader(String),

    #[error("--data cannot be combined with name=value body fields")]
    ConflictingBody,

    #[error("--data is not valid JSON: {0}")]
    InvalidData(#[source] serde_json::Error),
}
