//! Client identifier derivation
//!
//! Limiters treat identifiers as opaque strings. This module is where callers
//! turn request metadata into one: the client address, optionally suffixed with
//! a short user-agent prefix so clients sharing a NAT address are told apart.

use pinvault_kernel::ratelimit::ANONYMOUS_IDENTIFIER;

/// Number of user-agent characters appended to the address by default.
pub const DEFAULT_USER_AGENT_PREFIX_LEN: usize = 32;

/// Builds limiter identifiers from request metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientKeyExtractor {
    /// Characters of user agent to append; `0` keys on the address alone.
    user_agent_prefix_len: usize,
}

impl ClientKeyExtractor {
    /// Address plus the first [`DEFAULT_USER_AGENT_PREFIX_LEN`] user-agent characters.
    pub fn new() -> Self {
        Self::with_user_agent_prefix(DEFAULT_USER_AGENT_PREFIX_LEN)
    }

    /// Address only.
    pub fn ip_only() -> Self {
        Self::with_user_agent_prefix(0)
    }

    pub fn with_user_agent_prefix(len: usize) -> Self {
        Self {
            user_agent_prefix_len: len,
        }
    }

    /// Build the identifier for one request.
    ///
    /// A missing or blank address falls back to `"anonymous"`; a missing or
    /// blank user agent adds nothing.
    pub fn extract_key(&self, ip: Option<&str>, user_agent: Option<&str>) -> String {
        let ip = ip
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .unwrap_or(ANONYMOUS_IDENTIFIER);

        let agent = user_agent
            .map(str::trim)
            .filter(|ua| !ua.is_empty() && self.user_agent_prefix_len > 0);

        match agent {
            Some(ua) => format!("{}:{}", ip, truncate_chars(ua, self.user_agent_prefix_len)),
            None => ip.to_string(),
        }
    }
}

impl Default for ClientKeyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// The originating client in an `X-Forwarded-For` list (its first entry).
pub fn first_forwarded_for(header: &str) -> Option<&str> {
    header
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
