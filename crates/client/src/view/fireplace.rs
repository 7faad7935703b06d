// The shared fire: how many logs are burning, and the viewer's own log.

use chrono::TimeDelta;
use serde::Serialize;
use twodays_common::path::is_log_path;
use twodays_common::time::{Micros, Millis};
use twodays_common::types::Document;

const DESCRIPTIONS: [&str; 4] = [
    "An unlit fireplace. Cold.",
    "A small fire flickers in a fireplace. Cosy",
    "A robust fire warms a fireplace. Toasty.",
    "A roaring fire fills a fireplace. Hot!",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fireplace {
    pub burning_logs: usize,
    /// 0 (cold) to 3 (roaring).
    pub level: usize,
    pub description: &'static str,
}

pub fn fireplace<'a>(docs: impl IntoIterator<Item = &'a Document>, now: Micros) -> Fireplace {
    let burning_logs =
        docs.into_iter().filter(|doc| is_log_path(&doc.path) && doc.is_living_at(now)).count();
    let level = burning_logs.min(DESCRIPTIONS.len() - 1);
    Fireplace { burning_logs, level, description: DESCRIPTIONS[level] }
}

/// State of the viewer's "throw log on fire" control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum OwnLog {
    /// Anonymous viewers cannot throw logs.
    Anonymous,
    /// A log may be thrown.
    Ready,
    /// The viewer's log is still burning.
    Burning { remaining: String },
}

impl OwnLog {
    pub fn label(&self) -> String {
        match self {
            Self::Anonymous => "Anonymous users cannot throw logs on fires".to_string(),
            Self::Ready => "Throw log on fire".to_string(),
            Self::Burning { remaining } => format!("Your log will burn for {remaining}"),
        }
    }
}

pub fn own_log(signed_in: bool, log: Option<&Document>, now: Millis) -> OwnLog {
    if !signed_in {
        return OwnLog::Anonymous;
    }
    match log {
        Some(doc) if doc.is_living_at(now.to_micros()) => {
            let remaining =
                doc.delete_after.map(|at| format_remaining(at, now)).unwrap_or_default();
            OwnLog::Burning { remaining }
        }
        _ => OwnLog::Ready,
    }
}

/// Strict humanized distance from `now` to `until`: `"59 minutes"`, `"1 hour"`.
///
/// The unit is picked from the unrounded span, the count is rounded.
pub fn format_remaining(until: Micros, now: Millis) -> String {
    let span = TimeDelta::milliseconds((until.to_millis() - now).0.max(0));
    let millis = span.num_milliseconds() as f64;

    let (count, unit) = if span < TimeDelta::minutes(1) {
        (millis / 1_000.0, "second")
    } else if span < TimeDelta::hours(1) {
        (millis / 60_000.0, "minute")
    } else if span < TimeDelta::days(1) {
        (millis / 3_600_000.0, "hour")
    } else {
        (millis / 86_400_000.0, "day")
    };

    let count = count.round() as i64;
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T_MS: i64 = 1_700_000_000_000;

    fn log(author: &str, burn_ms: i64) -> Document {
        Document {
            path: format!("/fireplace/~{author}/!log.log"),
            author: author.into(),
            content: "log".into(),
            timestamp: Millis(T_MS).to_micros(),
            delete_after: Some(Millis(T_MS + burn_ms).to_micros()),
        }
    }

    #[test]
    fn level_counts_living_logs_and_caps_at_three() {
        let now = Millis(T_MS + 1).to_micros();
        assert_eq!(fireplace(std::iter::empty(), now).level, 0);

        let logs = [log("@a", 10_000), log("@b", 10_000)];
        let fire = fireplace(&logs, now);
        assert_eq!(fire.level, 2);
        assert_eq!(fire.description, "A robust fire warms a fireplace. Toasty.");

        let many: Vec<_> =
            ["@a", "@b", "@c", "@d", "@e"].iter().map(|a| log(a, 10_000)).collect();
        let fire = fireplace(&many, now);
        assert_eq!(fire.burning_logs, 5);
        assert_eq!(fire.level, 3);
    }

    #[test]
    fn burnt_and_cleared_logs_do_not_count() {
        let now = Millis(T_MS + 5_000).to_micros();
        let logs = [log("@a", 1_000), log("@b", 10_000).cleared(), log("@c", 10_000)];
        assert_eq!(fireplace(&logs, now).burning_logs, 1);
    }

    #[test]
    fn non_log_documents_are_ignored() {
        let now = Millis(T_MS).to_micros();
        let mut chat = log("@a", 10_000);
        chat.path = "/twodays-v1.0/~@a/1.txt!".into();
        assert_eq!(fireplace([&chat], now).burning_logs, 0);
    }

    #[test]
    fn own_log_states() {
        let now = Millis(T_MS);
        assert_eq!(own_log(false, None, now), OwnLog::Anonymous);
        assert_eq!(own_log(true, None, now), OwnLog::Ready);

        let burning = log("@a", 60 * 60 * 1_000);
        assert_eq!(
            own_log(true, Some(&burning), now),
            OwnLog::Burning { remaining: "1 hour".into() }
        );
        assert_eq!(own_log(true, Some(&burning), now).label(), "Your log will burn for 1 hour");

        assert_eq!(own_log(true, Some(&burning.cleared()), now), OwnLog::Ready);
    }

    #[test]
    fn remaining_time_formatting() {
        let now = Millis(T_MS);
        let at = |ms: i64| Millis(T_MS + ms).to_micros();

        assert_eq!(format_remaining(at(30_000), now), "30 seconds");
        assert_eq!(format_remaining(at(1_000), now), "1 second");
        assert_eq!(format_remaining(at(59 * 60_000), now), "59 minutes");
        assert_eq!(format_remaining(at(90 * 60_000), now), "2 hours");
        assert_eq!(format_remaining(at(3 * 86_400_000), now), "3 days");
        assert_eq!(format_remaining(at(-5_000), now), "0 seconds");
    }
}
