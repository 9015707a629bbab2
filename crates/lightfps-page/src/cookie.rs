//! `document.cookie` read/write semantics.
//!
//! Cookies are keyed by `(name, path, domain)`. Writing a cookie whose
//! expiry is in the past deletes the matching entry and nothing else, so an
//! overwrite at `path=/` leaves a same-named cookie at another path alone.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PageError, PageResult};

/// One stored cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: String,
    /// `None` for host-only cookies.
    pub domain: Option<String>,
    pub expires: Option<DateTime<Utc>>,
}

impl Cookie {
    fn same_key(&self, other: &Cookie) -> bool {
        self.name == other.name && self.path == other.path && self.domain == other.domain
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_none_or(|at| at > now)
    }
}

/// Cookie storage with its own clock.
#[derive(Debug, Clone)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
    now: DateTime<Utc>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// A jar whose clock reads `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            cookies: Vec::new(),
            now,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn set_now(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }

    /// The `document.cookie` getter: live cookies as `a=1; b=2`.
    pub fn cookie_string(&self) -> String {
        self.live()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Live cookies in insertion order.
    pub fn live(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter().filter(|c| c.is_live(self.now))
    }

    /// Value of the first live cookie named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.live()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `document.cookie` setter.
    pub fn set_cookie(&mut self, header: &str) -> PageResult<()> {
        let mut parts = header.split(';');
        let pair = parts.next().unwrap_or("").trim();
        let (name, value) = match pair.split_once('=') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => ("", pair),
        };
        if name.is_empty() && value.is_empty() {
            return Err(PageError::InvalidCookie(header.to_string()));
        }

        let mut cookie = Cookie {
            name: name.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
            domain: None,
            expires: None,
        };
        let mut max_age: Option<i64> = None;

        for attr in parts {
            let (key, val) = match attr.split_once('=') {
                Some((key, val)) => (key.trim(), val.trim()),
                None => (attr.trim(), ""),
            };
            match key.to_ascii_lowercase().as_str() {
                "expires" => {
                    if let Some(at) = parse_expires(val) {
                        cookie.expires = Some(at);
                    }
                }
                "max-age" => max_age = val.parse().ok(),
                "path" if val.starts_with('/') => cookie.path = val.to_string(),
                "domain" if !val.is_empty() => {
                    cookie.domain = Some(val.trim_start_matches('.').to_ascii_lowercase());
                }
                _ => {}
            }
        }
        if let Some(seconds) = max_age {
            cookie.expires = Some(self.now + Duration::seconds(seconds));
        }

        self.cookies.retain(|existing| !existing.same_key(&cookie));
        if cookie.is_live(self.now) {
            self.cookies.push(cookie);
        } else {
            debug!(name = %cookie.name, path = %cookie.path, "cookie expired by write");
        }
        Ok(())
    }
}

fn parse_expires(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw
        .trim()
        .trim_end_matches(" GMT")
        .trim_end_matches(" UTC");
    ["%a, %d %b %Y %H:%M:%S", "%a, %d-%b-%Y %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
}
