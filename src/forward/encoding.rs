//! Outbound body re-encoding.
//!
//! The inbound `content-type` selects one [`BodyEncoding`]; each variant
//! reads the inbound body its own way and produces an [`OutboundBody`]
//! that knows how to attach itself to the outbound request.
//!
//! | content-type contains             | encoding |
//! |-----------------------------------|----------|
//! | `application/json`                | Json     |
//! | `application/text`, `text/html`   | Text     |
//! | `form`                            | Form     |
//! | anything else / absent            | Binary   |

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Multipart},
    http::{header::CONTENT_TYPE, HeaderValue, Method, Request},
};
use reqwest::multipart;

use crate::error::{ProxyError, ProxyResult};

/// Content type given to string bodies, as a browser fetch would.
pub const TEXT_PLAIN_UTF8: &str = "text/plain;charset=UTF-8";

/// How the inbound body is re-serialized for the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Json,
    Text,
    Form,
    Binary,
}

impl BodyEncoding {
    /// Select the encoding from an inbound `content-type` value.
    pub fn for_content_type(content_type: Option<&str>) -> Self {
        let ct = content_type.unwrap_or_default().to_ascii_lowercase();
        if ct.contains("application/json") {
            BodyEncoding::Json
        } else if ct.contains("application/text") || ct.contains("text/html") {
            BodyEncoding::Text
        } else if ct.contains("form") {
            BodyEncoding::Form
        } else {
            BodyEncoding::Binary
        }
    }

    /// Whether requests with this method get a body forwarded.
    pub fn method_carries_body(method: &Method) -> bool {
        matches!(
            *method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }

    /// Read the inbound request body and re-encode it.
    ///
    /// `limit` bounds how many bytes are buffered.
    pub async fn encode(self, request: Request<Body>, limit: usize) -> ProxyResult<OutboundBody> {
        let content_type = request.headers().get(CONTENT_TYPE).cloned();

        match self {
            BodyEncoding::Json => {
                let bytes = read_body(request, limit).await?;
                let mut value: serde_json::Value = serde_json::from_slice(&bytes)?;
                normalize_numbers(&mut value);
                Ok(OutboundBody::Text(serde_json::to_string(&value)?))
            }
            BodyEncoding::Text => {
                let bytes = read_body(request, limit).await?;
                Ok(OutboundBody::Text(String::from_utf8_lossy(&bytes).into_owned()))
            }
            BodyEncoding::Form => {
                let is_multipart = content_type
                    .as_ref()
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|ct| ct.to_ascii_lowercase().contains("multipart/form-data"));
                let fields = if is_multipart {
                    read_multipart(request).await?
                } else {
                    let bytes = read_body(request, limit).await?;
                    read_urlencoded(&bytes)
                };
                Ok(OutboundBody::Form(fields))
            }
            BodyEncoding::Binary => {
                let bytes = read_body(request, limit).await?;
                Ok(OutboundBody::Binary {
                    bytes,
                    content_type,
                })
            }
        }
    }
}

/// One entry of a parsed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: Option<String>,
        content_type: Option<String>,
        data: Bytes,
    },
}

/// A re-encoded body ready to be attached to the outbound request.
#[derive(Debug)]
pub enum OutboundBody {
    /// JSON or text, sent as a UTF-8 string.
    Text(String),
    /// Form entries, sent as `multipart/form-data`.
    Form(Vec<FormField>),
    /// Opaque bytes with the inbound content type, if one was declared.
    Binary {
        bytes: Bytes,
        content_type: Option<HeaderValue>,
    },
}

impl OutboundBody {
    /// Attach the body and its regenerated content type.
    pub fn apply(self, builder: reqwest::RequestBuilder) -> ProxyResult<reqwest::RequestBuilder> {
        match self {
            OutboundBody::Text(text) => Ok(builder
                .header(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF8))
                .body(text)),
            OutboundBody::Form(fields) => Ok(builder.multipart(build_form(fields)?)),
            OutboundBody::Binary {
                bytes,
                content_type,
            } => {
                let builder = match content_type {
                    Some(ct) if !ct.is_empty() => builder.header(CONTENT_TYPE, ct),
                    _ => builder,
                };
                Ok(builder.body(bytes))
            }
        }
    }
}

/// Write integral floats as integers (`1.0` becomes `1`), as a browser's
/// `JSON.stringify` does. Exponent formatting of very large or small
/// floats still differs from it.
fn normalize_numbers(value: &mut serde_json::Value) {
    use serde_json::Value;

    // Beyond 2^53 an f64 no longer holds every integer exactly
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;

    match value {
        Value::Number(n) => {
            if let Some(f) = n.as_f64().filter(|_| n.is_f64()) {
                if f.fract() == 0.0 && f.abs() <= MAX_SAFE {
                    *n = serde_json::Number::from(f as i64);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_numbers),
        Value::Object(map) => map.values_mut().for_each(normalize_numbers),
        _ => {}
    }
}

async fn read_body(request: Request<Body>, limit: usize) -> ProxyResult<Bytes> {
    Ok(axum::body::to_bytes(request.into_body(), limit).await?)
}

async fn read_multipart(request: Request<Body>) -> ProxyResult<Vec<FormField>> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ProxyError::Form(e.body_text()))?;

    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ProxyError::Form(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ProxyError::Form(e.body_text()))?;

        let value = if file_name.is_some() {
            FormValue::File {
                file_name,
                content_type,
                data,
            }
        } else {
            FormValue::Text(String::from_utf8_lossy(&data).into_owned())
        };
        fields.push(FormField { name, value });
    }
    Ok(fields)
}

fn read_urlencoded(bytes: &[u8]) -> Vec<FormField> {
    url::form_urlencoded::parse(bytes)
        .map(|(name, value)| FormField {
            name: name.into_owned(),
            value: FormValue::Text(value.into_owned()),
        })
        .collect()
}

fn build_form(fields: Vec<FormField>) -> ProxyResult<multipart::Form> {
    let mut form = multipart::Form::new();
    for field in fields {
        form = match field.value {
            FormValue::Text(text) => form.text(field.name, text),
            FormValue::File {
                file_name,
                content_type,
                data,
            } => {
                let len = data.len() as u64;
                let mut part = multipart::Part::stream_with_length(data, len);
                if let Some(file_name) = file_name {
                    part = part.file_name(file_name);
                }
                if let Some(content_type) = content_type {
                    part = part
                        .mime_str(&content_type)
                        .map_err(|e| ProxyError::Form(e.to_string()))?;
                }
                form.part(field.name, part)
            }
        };
    }
    Ok(form)
}
