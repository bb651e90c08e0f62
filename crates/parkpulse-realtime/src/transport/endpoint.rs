//! Realtime endpoint selection.

use std::fmt;

use parkpulse_core::types::id::LotId;

/// Which realtime feed to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// The general dashboard feed.
    General,
    /// The admin feed.
    Admin,
    /// The feed scoped to a single parking lot.
    Lot(LotId),
}

impl EndpointKind {
    /// Build the connection URL from the server's WebSocket base URL.
    pub fn url(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        match self {
            Self::General => format!("{base}/ws"),
            Self::Admin => format!("{base}/ws/admin"),
            Self::Lot(id) => format!("{base}/ws/lot/{id}"),
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => write!(f, "general"),
            Self::Admin => write!(f, "admin"),
            Self::Lot(id) => write!(f, "lot:{id}"),
        }
    }
}
