// Expiry classification and fade weight.
//
// A document is hidden outright once its timestamp is older than the two day
// horizon. Otherwise it stays fully visible until six hours before expiry and
// then fades linearly, never below 0.2, until the instant it expires.

use serde::Serialize;
use twodays_common::time::{Millis, HORIZON, MILLIS_PER_MINUTE};
use twodays_common::types::Document;

/// Minutes before expiry at which fading starts.
pub const START_FADING_MINUTES: f64 = 360.0;
/// Weight floor: content stays legible until it expires.
pub const MIN_VISIBILITY: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    /// Written after `now` by our clock; rendered, clock skew is tolerated.
    Future,
    /// Within the horizon.
    Living,
    /// Older than the horizon; never rendered.
    PastHorizon,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: DocStatus,
    pub visibility_weight: f64,
    pub minutes_to_expiry: f64,
    pub is_expired: bool,
}

impl Classification {
    pub fn is_renderable(&self) -> bool {
        self.status != DocStatus::PastHorizon
    }
}

pub fn classify(doc: &Document, now: Millis) -> Classification {
    let now_micros = now.to_micros();
    let horizon = now_micros - HORIZON.to_micros();
    let expiry = doc.expires_at();

    let minutes_to_expiry = (expiry.as_millis_f64() - now.0 as f64) / MILLIS_PER_MINUTE as f64;
    let is_expired = expiry <= now_micros;

    let status = if doc.timestamp < horizon {
        DocStatus::PastHorizon
    } else if doc.timestamp > now_micros {
        DocStatus::Future
    } else {
        DocStatus::Living
    };

    Classification {
        status,
        visibility_weight: visibility_weight(minutes_to_expiry),
        minutes_to_expiry,
        is_expired,
    }
}

/// Fade factor in `[0.2, 1.0]` for the given minutes remaining.
pub fn visibility_weight(minutes_to_expiry: f64) -> f64 {
    if minutes_to_expiry.is_nan() {
        return MIN_VISIBILITY;
    }
    if minutes_to_expiry > START_FADING_MINUTES {
        return 1.0;
    }
    (minutes_to_expiry / START_FADING_MINUTES).max(MIN_VISIBILITY)
}
