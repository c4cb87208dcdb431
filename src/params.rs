//! `key=value&key=value` parameter sets carried in a URL fragment or query.
//!
//! Decoding never fails: missing values decode as empty strings and
//! undecodable escapes are kept verbatim.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMarker {
    /// `#` prefix
    Fragment,
    /// `?` prefix
    Query,
}

impl ParamMarker {
    pub fn as_char(&self) -> char {
        match self {
            ParamMarker::Fragment => '#',
            ParamMarker::Query => '?',
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, String>);

fn decode_component(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts an optional single leading `#` or `?`. Later duplicates win.
    pub fn decode(raw: &str) -> Self {
        let body = raw
            .strip_prefix('#')
            .or_else(|| raw.strip_prefix('?'))
            .unwrap_or(raw);

        let mut params = BTreeMap::new();
        for pair in body.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.insert(decode_component(key), decode_component(value));
        }
        Self(params)
    }

    pub fn encode(&self, marker: ParamMarker) -> String {
        let pairs: Vec<String> = self
            .0
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{}{}", marker.as_char(), pairs.join("&"))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Inserts or overwrites, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Upserts one key in a fragment string.
pub fn set_parameter(raw_hash: &str, key: &str, value: &str) -> String {
    let mut params = ParameterSet::decode(raw_hash);
    params.set(key, value);
    params.encode(ParamMarker::Fragment)
}

/// Upserts one key in a query string.
pub fn set_query_parameter(raw_query: &str, key: &str, value: &str) -> String {
    let mut params = ParameterSet::decode(raw_query);
    params.set(key, value);
    params.encode(ParamMarker::Query)
}
