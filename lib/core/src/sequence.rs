//! Last-request-wins sequencing for asynchronous operations.
//!
//! Every asynchronous request issued against a graph (layout, draft
//! generation) carries a [`RequestToken`]. Only a response whose token
//! matches the most recently issued one may be applied; responses for
//! superseded or abandoned requests are discarded on arrival.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonically increasing token identifying one asynchronous request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Returns the raw sequence number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a response was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Staleness {
    /// A newer request was issued after this one.
    Superseded,
    /// The owner abandoned all outstanding requests.
    Abandoned,
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Superseded => write!(f, "superseded by a newer request"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Issues request tokens and decides whether a response is still current.
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    latest: u64,
    abandoned_through: u64,
    /// Highest token whose response was accepted.
    retired: u64,
}

impl RequestSequencer {
    /// Creates a sequencer with no outstanding request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new token, superseding every earlier one.
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    /// Returns the most recently issued token, if any.
    #[must_use]
    pub fn latest(&self) -> Option<RequestToken> {
        (self.latest > 0).then_some(RequestToken(self.latest))
    }

    /// Returns whether a response carrying `token` may be applied.
    #[must_use]
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.check(token).is_ok()
    }

    /// Checks a token, reporting why it is stale.
    ///
    /// # Errors
    ///
    /// Returns the reason the response must be discarded.
    pub fn check(&self, token: RequestToken) -> Result<(), Staleness> {
        if token.0 <= self.abandoned_through {
            return Err(Staleness::Abandoned);
        }
        // An earlier or already accepted token lost to a newer response.
        if token.0 != self.latest || token.0 <= self.retired {
            return Err(Staleness::Superseded);
        }
        Ok(())
    }

    /// Accepts a response: returns `Ok` once for the current token and
    /// retires it so a duplicate delivery is discarded.
    ///
    /// # Errors
    ///
    /// Returns the reason the response must be discarded.
    pub fn accept(&mut self, token: RequestToken) -> Result<(), Staleness> {
        self.check(token)?;
        self.retired = token.0;
        Ok(())
    }

    /// Abandons every outstanding request.
    ///
    /// Tokens issued afterwards are unaffected.
    pub fn abandon(&mut self) {
        self.abandoned_through = self.latest;
    }

    /// Returns whether a request is outstanding.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.latest > self.abandoned_through.max(self.retired)
    }
}
