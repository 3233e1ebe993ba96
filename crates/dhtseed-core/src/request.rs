//! Announcement request validation.
//!
//! Turns the raw query parameters and transport metadata of one request
//! into a typed [`Command`], or a [`Rejection`] naming the first rule the
//! request broke. Validation is pure: nothing here touches the store.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;

use crate::peer::{clamp_user_agent, PeerId, MIN_DHT_PORT};

/// Decoded query parameters. Last value wins on duplicate keys.
pub type RequestParams = HashMap<String, String>;

pub const PARAM_IDENTIFIER: &str = "cid";
pub const PARAM_COMPRESSION: &str = "encryption";
pub const PARAM_UDP_PORT: &str = "u4";
pub const PARAM_LIVE: &str = "live";
pub const PARAM_STOP: &str = "stop";

/// Client builds known to flood the registry with broken announcements.
pub const DENIED_USER_AGENTS: &[&str] = &[
    "FlylinkDC++ r501 build 9474",
    "FlylinkDC++ r501-x64 build 9474",
    "FlylinkDC++ r502-beta7 build 9543",
];

/// What the transport knows about the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMeta {
    pub remote_addr: IpAddr,
    pub user_agent: Option<String>,
}

/// Registry operation selected by the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Register,
    LivenessRefresh,
    Deregister,
}

/// A validated announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Absent when the client sent no `cid` at all.
    pub identifier: Option<PeerId>,
    pub address: IpAddr,
    pub port: u16,
    pub compress: bool,
    pub user_agent: Option<String>,
    pub mode: Mode,
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Empty request")]
    MalformedRequest,

    #[error("Invalid CID")]
    InvalidIdentifier,

    #[error("You client is in passive mode")]
    MissingPort,

    #[error("UDP port must be >= 1024")]
    PortTooLow,

    #[error("UDP port must be <= 65535")]
    PortTooHigh,

    #[error("Invalid user agent - update FlylinkDC -> r502 http://www.flylinkdc.ru")]
    RejectedClient,
}

impl Rejection {
    /// HTTP status the request terminates with.
    pub fn status(&self) -> u16 {
        match self {
            Rejection::MalformedRequest => 500,
            _ => 400,
        }
    }
}

// ── Denylist ──────────────────────────────────────────────────────────────────

/// Exact-match set of rejected user-agent strings.
#[derive(Debug, Clone, Default)]
pub struct Denylist {
    extra: HashSet<String>,
}

impl Denylist {
    /// Built-in entries plus operator-supplied ones.
    pub fn with_extra<I>(extra: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            extra: extra.into_iter().collect(),
        }
    }

    pub fn contains(&self, user_agent: &str) -> bool {
        DENIED_USER_AGENTS.contains(&user_agent) || self.extra.contains(user_agent)
    }
}

// ── Validator ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RequestValidator {
    denylist: Denylist,
}

impl RequestValidator {
    pub fn new(denylist: Denylist) -> Self {
        Self { denylist }
    }

    /// Validate one request. Rules run in a fixed order; the first failure wins.
    pub fn validate(
        &self,
        params: Option<&RequestParams>,
        meta: Option<&TransportMeta>,
    ) -> Result<Command, Rejection> {
        let (params, meta) = match (params, meta) {
            (Some(p), Some(m)) if !p.is_empty() => (p, m),
            _ => return Err(Rejection::MalformedRequest),
        };

        let identifier = match params.get(PARAM_IDENTIFIER) {
            Some(raw) => Some(PeerId::parse(raw).map_err(|_| Rejection::InvalidIdentifier)?),
            None => None,
        };

        let compress = params
            .get(PARAM_COMPRESSION)
            .map(|raw| parse_leading_int(raw) != 0)
            .unwrap_or(false);

        let raw_port = params.get(PARAM_UDP_PORT).ok_or(Rejection::MissingPort)?;
        let port = parse_leading_int(raw_port);
        if port < i64::from(MIN_DHT_PORT) {
            return Err(Rejection::PortTooLow);
        }
        let port = u16::try_from(port).map_err(|_| Rejection::PortTooHigh)?;

        if let Some(ua) = &meta.user_agent {
            if self.denylist.contains(ua) {
                return Err(Rejection::RejectedClient);
            }
        }

        let mode = if params.contains_key(PARAM_LIVE) {
            Mode::LivenessRefresh
        } else if params.contains_key(PARAM_STOP) {
            Mode::Deregister
        } else {
            Mode::Register
        };

        Ok(Command {
            identifier,
            address: meta.remote_addr,
            port,
            compress,
            user_agent: meta.user_agent.as_deref().map(clamp_user_agent),
            mode,
        })
    }
}

/// Integer prefix of `raw`: optional whitespace and sign, then digits.
/// Anything unparseable is 0, and values saturate instead of overflowing.
pub fn parse_leading_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative {
        -value
    } else {
        value
    }
}
