//! Request classification
//!
//! Routing is an ordered table of `(name, matcher, route)` rules evaluated
//! first-match-wins, with stale-while-revalidate as the fallback. The table
//! is data: it can be printed, tested and reordered without touching the
//! strategies.

use crate::http::{Destination, Method, Request};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Temporal caching strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CacheFirst => "cache-first",
            Self::NetworkFirst => "network-first",
            Self::StaleWhileRevalidate => "stale-while-revalidate",
        };
        write!(f, "{}", name)
    }
}

/// What the engine does with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    /// Not intercepted: the request goes to the network untouched
    PassThrough,
    /// Served by a strategy
    Strategy(Strategy),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PassThrough => write!(f, "pass-through"),
            Self::Strategy(s) => write!(f, "{}", s),
        }
    }
}

/// Request predicate
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Full URL contains any of the substrings
    UrlContainsAny(Vec<String>),
    /// Full URL is one of the listed (normalized) URLs
    ExactUrl(HashSet<String>),
    /// URL path ends with any of the suffixes
    PathSuffix(Vec<String>),
    /// Declared destination equals
    Destination(Destination),
    /// Method is anything but GET
    NonGetMethod,
    /// Any of the inner matchers
    AnyOf(Vec<Matcher>),
}

impl Matcher {
    pub fn matches(&self, request: &Request) -> bool {
        match self {
            Self::UrlContainsAny(needles) => {
                let url = request.url.as_str();
                needles.iter().any(|n| url.contains(n.as_str()))
            }
            Self::ExactUrl(urls) => urls.contains(request.url.as_str()),
            Self::PathSuffix(suffixes) => {
                let path = request.url.path();
                suffixes.iter().any(|s| path.ends_with(s.as_str()))
            }
            Self::Destination(d) => request.destination == *d,
            Self::NonGetMethod => request.method != Method::Get,
            Self::AnyOf(inner) => inner.iter().any(|m| m.matches(request)),
        }
    }
}

/// One routing rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: &'static str,
    pub matcher: Matcher,
    pub route: Route,
}

/// Outcome of classifying one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Name of the matching rule, `None` for the fallback
    pub rule: Option<&'static str>,
    pub route: Route,
}

/// Name reported when no rule matched
pub const FALLBACK_RULE: &str = "default";

/// Inputs for the standard rule table
#[derive(Debug, Clone, Default)]
pub struct RuleInputs {
    pub ignored_hosts: Vec<String>,
    pub static_assets: HashSet<String>,
    pub image_assets: HashSet<String>,
    pub font_assets: HashSet<String>,
    pub cache_first_suffixes: Vec<String>,
    pub network_first_patterns: Vec<String>,
}

/// Ordered rule table
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    fallback: Strategy,
}

impl RuleSet {
    /// Empty table that routes everything to `fallback`
    pub fn new(fallback: Strategy) -> Self {
        Self {
            rules: vec![],
            fallback,
        }
    }

    /// Append a rule (lower priority than every existing rule)
    pub fn push(mut self, name: &'static str, matcher: Matcher, route: Route) -> Self {
        self.rules.push(Rule {
            name,
            matcher,
            route,
        });
        self
    }

    /// The site's routing table
    pub fn standard(inputs: RuleInputs) -> Self {
        Self::new(Strategy::StaleWhileRevalidate)
            .push(
                "ignored-hosts",
                Matcher::UrlContainsAny(inputs.ignored_hosts),
                Route::PassThrough,
            )
            .push("uncacheable-method", Matcher::NonGetMethod, Route::PassThrough)
            .push(
                "static-assets",
                Matcher::AnyOf(vec![
                    Matcher::ExactUrl(inputs.static_assets),
                    Matcher::PathSuffix(inputs.cache_first_suffixes),
                ]),
                Route::Strategy(Strategy::CacheFirst),
            )
            .push(
                "images",
                Matcher::AnyOf(vec![
                    Matcher::Destination(Destination::Image),
                    Matcher::ExactUrl(inputs.image_assets),
                ]),
                Route::Strategy(Strategy::CacheFirst),
            )
            .push(
                "fonts",
                Matcher::AnyOf(vec![
                    Matcher::Destination(Destination::Font),
                    Matcher::ExactUrl(inputs.font_assets),
                ]),
                Route::Strategy(Strategy::CacheFirst),
            )
            .push(
                "dynamic-content",
                Matcher::UrlContainsAny(inputs.network_first_patterns),
                Route::Strategy(Strategy::NetworkFirst),
            )
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn fallback(&self) -> Strategy {
        self.fallback
    }

    /// Classify a request: first matching rule wins
    pub fn classify(&self, request: &Request) -> Classification {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(request))
            .map(|rule| Classification {
                rule: Some(rule.name),
                route: rule.route,
            })
            .unwrap_or(Classification {
                rule: None,
                route: Route::Strategy(self.fallback),
            })
    }
}
