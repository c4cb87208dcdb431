//! Immutable browser-style location plus the single side-effecting
//! navigation boundary.

use serde::Serialize;
use url::Url;

use crate::error::Result;
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::params::{ParamMarker, ParameterSet};
use crate::path::{parse_path, NavigationPath};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pathname: String,
    /// Raw query including the leading `?`, or empty.
    search: String,
    /// Raw fragment including the leading `#`, or empty.
    hash: String,
}

fn normalize(part: &str, marker: char) -> String {
    match part {
        "" => String::new(),
        p if p.len() == marker.len_utf8() && p.starts_with(marker) => String::new(),
        p if p.starts_with(marker) => p.to_string(),
        p => format!("{}{}", marker, p),
    }
}

impl Location {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            search: String::new(),
            hash: String::new(),
        }
    }

    /// Parses `path[?query][#fragment]`. Absolute URLs go through [`Location::from_url`].
    pub fn parse(href: &str) -> Self {
        if let Ok(url) = Url::parse(href) {
            return Self::from_url(&url);
        }
        let (rest, hash) = match href.find('#') {
            Some(i) => href.split_at(i),
            None => (href, ""),
        };
        let (pathname, search) = match rest.find('?') {
            Some(i) => rest.split_at(i),
            None => (rest, ""),
        };
        Self {
            pathname: pathname.to_string(),
            search: normalize(search, '?'),
            hash: normalize(hash, '#'),
        }
    }

    pub fn from_url(url: &Url) -> Self {
        Self {
            pathname: url.path().to_string(),
            search: normalize(url.query().unwrap_or_default(), '?'),
            hash: normalize(url.fragment().unwrap_or_default(), '#'),
        }
    }

    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn href(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }

    pub fn navigation_path(&self) -> Result<NavigationPath> {
        parse_path(&self.pathname)
    }

    pub fn query(&self) -> ParameterSet {
        ParameterSet::decode(&self.search)
    }

    pub fn hash_parameters(&self) -> ParameterSet {
        ParameterSet::decode(&self.hash)
    }

    pub fn with_pathname(&self, pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            ..self.clone()
        }
    }

    pub fn with_query(&self, query: &ParameterSet) -> Self {
        Self {
            search: normalize(&query.encode(ParamMarker::Query), '?'),
            ..self.clone()
        }
    }

    pub fn with_hash_parameters(&self, params: &ParameterSet) -> Self {
        Self {
            hash: normalize(&params.encode(ParamMarker::Fragment), '#'),
            ..self.clone()
        }
    }

    pub fn with_query_parameter(&self, key: &str, value: &str) -> Self {
        let mut query = self.query();
        query.set(key, value);
        self.with_query(&query)
    }
}

/// Owner of the current location. `navigate` is the only mutation.
pub trait Navigator {
    fn location(&self) -> &Location;
    fn navigate(&mut self, to: Location);
}

/// In-memory navigator with a back stack.
#[derive(Debug, Clone)]
pub struct HistoryNavigator {
    entries: Vec<Location>,
}

impl HistoryNavigator {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
        }
    }

    pub fn back(&mut self) -> Option<Location> {
        if self.entries.len() > 1 {
            self.entries.pop()
        } else {
            None
        }
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }
}

impl Navigator for HistoryNavigator {
    fn location(&self) -> &Location {
        // entries is never empty: new() seeds it and back() keeps the first
        &self.entries[self.entries.len() - 1]
    }

    fn navigate(&mut self, to: Location) {
        log(
            Level::Debug,
            Domain::Params,
            "navigate",
            obj(&[
                ("from", v_str(&self.location().href())),
                ("to", v_str(&to.href())),
            ]),
        );
        self.entries.push(to);
    }
}
