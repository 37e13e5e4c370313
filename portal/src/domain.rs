//! Logical front-ends and the roles each one admits.

use crate::models::Role;
use serde::Serialize;
use std::fmt;

/// One of the four front-ends served by this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Www,
    App,
    Admin,
    Ops,
}

impl Domain {
    pub const ALL: [Domain; 4] = [Domain::Www, Domain::App, Domain::Admin, Domain::Ops];

    /// Map a host name to its front-end by the first DNS label.
    ///
    /// Ports are ignored and matching is case-insensitive. Anything that is
    /// not `app.`, `admin.` or `ops.` is `www`; an unrecognized host is a
    /// policy default, not an error.
    pub fn from_host(host: &str) -> Domain {
        let host = strip_port(host.trim());
        let Some((first_label, _rest)) = host.split_once('.') else {
            return Domain::Www;
        };

        match first_label.to_ascii_lowercase().as_str() {
            "app" => Domain::App,
            "admin" => Domain::Admin,
            "ops" => Domain::Ops,
            _ => Domain::Www,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Www => "www",
            Domain::App => "app",
            Domain::Admin => "admin",
            Domain::Ops => "ops",
        }
    }

    pub fn allow_set(&self) -> AllowSet {
        match self {
            Domain::Www => AllowSet::Public,
            Domain::App => AllowSet::AnyRole,
            Domain::Admin => AllowSet::Roles(&[Role::Admin, Role::Owner]),
            Domain::Ops => AllowSet::Roles(&[Role::Ops]),
        }
    }

    /// Whether the edge gate demands a session cookie on this front-end.
    pub fn requires_session(&self) -> bool {
        !matches!(self.allow_set(), AllowSet::Public)
    }

    /// Human label used in page chrome.
    pub fn title(&self) -> &'static str {
        match self {
            Domain::Www => "Home",
            Domain::App => "App",
            Domain::Admin => "Admin",
            Domain::Ops => "Ops",
        }
    }
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literals never name a front-end.
    if host.starts_with('[') {
        return host;
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles admitted by a front-end's pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowSet {
    /// No session required.
    Public,
    /// Any role the caller holds in the selected organization.
    AnyRole,
    Roles(&'static [Role]),
}

impl AllowSet {
    pub fn permits(&self, role: Role) -> bool {
        match self {
            AllowSet::Public | AllowSet::AnyRole => true,
            AllowSet::Roles(roles) => roles.contains(&role),
        }
    }
}
