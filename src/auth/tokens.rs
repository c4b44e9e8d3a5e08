//! Token set and expiry arithmetic

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Refresh this many seconds before the upstream expiry.
pub const SAFETY_MARGIN_SECS: u64 = 300;

/// Seconds since the Unix epoch.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// The persisted credential record. Always fully populated.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(deserialize_with = "deserialize_epoch_secs")]
    pub expires_at: u64,
}

impl TokenSet {
    /// Mint a token set; `expires_at` is fixed here and never recomputed.
    pub fn issue(access_token: String, refresh_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: now_secs().saturating_add(expires_in),
        }
    }

    /// True when `now >= expires_at - margin`.
    pub fn expires_within(&self, now: u64, margin: u64) -> bool {
        now >= self.expires_at.saturating_sub(margin)
    }

    pub fn remaining_secs(&self, now: u64) -> i64 {
        self.expires_at as i64 - now as i64
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Accept integer or fractional seconds; older token files store a float.
/// Integers are taken exactly, only fractions go through `f64`.
fn deserialize_epoch_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(EpochSecsVisitor)
}

struct EpochSecsVisitor;

impl<'de> Visitor<'de> for EpochSecsVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative timestamp in seconds")
    }

    fn visit_u64<E: de::Error>(self, secs: u64) -> Result<u64, E> {
        Ok(secs)
    }

    fn visit_i64<E: de::Error>(self, secs: i64) -> Result<u64, E> {
        u64::try_from(secs).map_err(|_| {
            E::custom(format!(
                "expires_at must be a non-negative timestamp, got {}",
                secs
            ))
        })
    }

    fn visit_f64<E: de::Error>(self, secs: f64) -> Result<u64, E> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(E::custom(format!(
                "expires_at must be a non-negative timestamp, got {}",
                secs
            )));
        }
        Ok(secs as u64)
    }
}

/// Point-in-time view of the stored credentials, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStatus {
    pub expires_at: u64,
    pub remaining_secs: i64,
    pub refresh_due: bool,
}
