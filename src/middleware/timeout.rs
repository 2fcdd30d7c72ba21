use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*` or `:name`: exactly one segment.
    Any,
    /// trailing `**`: zero or more segments.
    Rest,
}

#[derive(Debug, Clone)]
struct TimeoutRule {
    pattern: Vec<Segment>,
    limit: Duration,
}

/// Per route-pattern request deadlines; the first matching rule wins.
#[derive(Debug, Clone)]
pub struct TimeoutPolicy {
    rules: Vec<TimeoutRule>,
    default: Duration,
}

impl TimeoutPolicy {
    pub fn new(default: Duration) -> Self {
        Self {
            rules: Vec::new(),
            default,
        }
    }

    pub fn route(mut self, pattern: &str, limit: Duration) -> Self {
        self.rules.push(TimeoutRule {
            pattern: parse_pattern(pattern),
            limit,
        });
        self
    }

    pub fn timeout_for(&self, path: &str) -> Duration {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.rules
            .iter()
            .find(|rule| matches(&rule.pattern, &segments))
            .map(|rule| rule.limit)
            .unwrap_or(self.default)
    }
}

fn parse_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s {
            "**" => Segment::Rest,
            "*" => Segment::Any,
            s if s.starts_with(':') => Segment::Any,
            s => Segment::Literal(s.to_string()),
        })
        .collect()
}

fn matches(pattern: &[Segment], path: &[&str]) -> bool {
    match (pattern.first(), path.first()) {
        (None, None) => true,
        (Some(Segment::Rest), _) => true,
        (Some(Segment::Any), Some(_)) => matches(&pattern[1..], &path[1..]),
        (Some(Segment::Literal(lit)), Some(seg)) if lit == seg => matches(&pattern[1..], &path[1..]),
        _ => false,
    }
}

pub async fn timeout_middleware(
    State(policy): State<Arc<TimeoutPolicy>>,
    req: Request,
    next: Next,
) -> Response {
    let limit = policy.timeout_for(req.uri().path());
    let path = req.uri().path().to_string();
    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(path = %path, timeout_ms = limit.as_millis() as u64, "request timed out");
            Error::Timeout.into_response()
        }
    }
}
