use axum::http::HeaderMap;
use serde_json::Value;

pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// The originating address as carried by `X-Forwarded-For`.
///
/// A request that passed through several proxies carries a list; the first
/// entry is the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardedFor {
    Single(String),
    Chain(Vec<String>),
    /// Anything else. Holds a description for the log line.
    Unrecognized(String),
}

impl ForwardedFor {
    /// Read every `X-Forwarded-For` line. A single value without commas is
    /// `Single`; comma-separated values or repeated lines form a `Chain`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut raw = Vec::new();
        for value in headers.get_all(FORWARDED_FOR_HEADER) {
            match value.to_str() {
                Ok(s) => raw.push(s),
                Err(_) => return ForwardedFor::Unrecognized("non-UTF-8 header value".into()),
            }
        }
        if raw.is_empty() {
            return ForwardedFor::Unrecognized("header missing".into());
        }

        let hops: Vec<String> = raw
            .iter()
            .flat_map(|line| line.split(','))
            .map(str::trim)
            .filter(|hop| !hop.is_empty())
            .map(str::to_string)
            .collect();

        match hops.as_slice() {
            [] => ForwardedFor::Unrecognized("header empty".into()),
            [only] if raw.len() == 1 && !raw[0].contains(',') => ForwardedFor::Single(only.clone()),
            _ => ForwardedFor::Chain(hops),
        }
    }

    /// Interpret an already-decoded value: a string, or an array of strings.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => ForwardedFor::Single(s.clone()),
            Value::Array(items) => {
                let hops: Option<Vec<String>> = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect();
                match hops {
                    Some(hops) => ForwardedFor::Chain(hops),
                    None => ForwardedFor::Unrecognized(value.to_string()),
                }
            }
            other => ForwardedFor::Unrecognized(other.to_string()),
        }
    }
}
