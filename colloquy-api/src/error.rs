use serde_json::Value;

/// Reasons the backend rejected a request
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not found")]
    NotFound,

    #[error("Invalid value for {field}: {message}")]
    InvalidField { field: String, message: String },
}

impl Error {
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Unknown(_) => 500,
            Error::Unauthenticated => 401,
            Error::PermissionDenied => 403,
            Error::NotFound => 404,
            Error::InvalidField { .. } => 400,
        }
    }

    /// Builds the error for a non-success response
    ///
    /// Never fails: bodies that cannot be understood end up as `Unknown`.
    pub fn from_response(status: u16, body: &[u8]) -> Error {
        let data = serde_json::from_slice::<Value>(body).ok();
        match status {
            401 => Error::Unauthenticated,
            403 => Error::PermissionDenied,
            404 => Error::NotFound,
            400 => data
                .as_ref()
                .and_then(first_field_error)
                .unwrap_or_else(|| Error::Unknown(message_of(data.as_ref(), body, status))),
            _ => Error::Unknown(message_of(data.as_ref(), body, status)),
        }
    }
}

/// DRF reports validation errors as `{ "field": ["message", ...] }`
fn first_field_error(data: &Value) -> Option<Error> {
    data.as_object()?
        .iter()
        .filter(|(field, _)| *field != "detail" && *field != "message")
        .find_map(|(field, v)| {
            let message = match v {
                Value::String(s) => s.clone(),
                Value::Array(msgs) => msgs.iter().find_map(|m| m.as_str())?.to_string(),
                _ => return None,
            };
            Some(Error::InvalidField {
                field: field.clone(),
                message,
            })
        })
}

fn message_of(data: Option<&Value>, body: &[u8], status: u16) -> String {
    let from_json = data.and_then(|d| {
        d.get("detail")
            .or_else(|| d.get("message"))
            .and_then(|m| m.as_str())
            .map(String::from)
    });
    if let Some(msg) = from_json {
        return msg;
    }
    match std::str::from_utf8(body).map(str::trim) {
        Ok(text) if !text.is_empty() && data.is_none() => String::from(text),
        _ => format!("request failed with status {status}"),
    }
}
