// Ambient narrative: how many other people are, or were, around the fire.
//
// Thresholds are evaluated highest first and the first match wins:
//   > 10 crowd, > 5 many, > 2 several, > 0 few, otherwise empty.

use std::collections::BTreeSet;

use serde::Serialize;
use twodays_common::time::Micros;
use twodays_common::types::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stratum {
    Empty,
    Few,
    Several,
    Many,
    Crowd,
}

impl Stratum {
    pub fn for_count(count: usize) -> Self {
        if count > 10 {
            Self::Crowd
        } else if count > 5 {
            Self::Many
        } else if count > 2 {
            Self::Several
        } else if count > 0 {
            Self::Few
        } else {
            Self::Empty
        }
    }

    /// Line describing people currently present.
    pub fn living_text(self) -> &'static str {
        match self {
            Self::Empty => "The fire crackles to itself. Nobody else is here.",
            Self::Few => "Someone sits across the fire, warming their hands.",
            Self::Several => "A small circle has gathered around the fire.",
            Self::Many => "The room hums with the chatter of a lively crowd.",
            Self::Crowd => "The room is packed; voices tumble over one another.",
        }
    }

    /// Line describing people who were present and have gone quiet.
    pub fn past_text(self) -> &'static str {
        match self {
            Self::Empty => "No footprints lead away from the hearth.",
            Self::Few => "A lone set of footprints leads out into the snow.",
            Self::Several => "A few sets of footprints lead out into the snow.",
            Self::Many => "Many footprints crisscross the snow outside.",
            Self::Crowd => "The snow outside is trampled flat by departed guests.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Narrative {
    pub living_authors: usize,
    pub past_authors: usize,
    pub living: Stratum,
    pub past: Stratum,
}

impl Narrative {
    pub fn living_text(&self) -> &'static str {
        self.living.living_text()
    }

    pub fn past_text(&self) -> &'static str {
        self.past.past_text()
    }
}

/// Count distinct other authors with living and with cleared documents.
///
/// A document whose `deleteAfter` has passed counts as cleared.
pub fn aggregate<'a>(
    docs: impl IntoIterator<Item = &'a Document>,
    current_author: Option<&str>,
    now: Micros,
) -> Narrative {
    let mut living = BTreeSet::new();
    let mut past = BTreeSet::new();

    for doc in docs {
        if current_author == Some(doc.author.as_str()) {
            continue;
        }
        if doc.is_living_at(now) {
            living.insert(doc.author.as_str());
        } else {
            past.insert(doc.author.as_str());
        }
    }

    Narrative {
        living_authors: living.len(),
        past_authors: past.len(),
        living: Stratum::for_count(living.len()),
        past: Stratum::for_count(past.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Micros = Micros(1_700_000_000_000_000);

    fn doc(author: &str, content: &str) -> Document {
        Document {
            path: format!("/twodays-v1.0/~{author}/1.txt!"),
            author: author.into(),
            content: content.into(),
            timestamp: NOW,
            delete_after: Some(NOW + Micros(60_000_000)),
        }
    }

    #[test]
    fn strata_boundaries() {
        let expected = [
            (0, Stratum::Empty),
            (1, Stratum::Few),
            (2, Stratum::Few),
            (3, Stratum::Several),
            (5, Stratum::Several),
            (6, Stratum::Many),
            (10, Stratum::Many),
            (11, Stratum::Crowd),
        ];
        for (count, stratum) in expected {
            assert_eq!(Stratum::for_count(count), stratum, "count {count}");
        }
    }

    #[test]
    fn three_other_living_authors_are_several() {
        let docs = [doc("@a", "hi"), doc("@b", "hi"), doc("@c", "hi"), doc("@a", "again")];
        let narrative = aggregate(&docs, Some("@me"), NOW);

        assert_eq!(narrative.living_authors, 3);
        assert_eq!(narrative.living, Stratum::Several);
        assert_eq!(narrative.living_text(), Stratum::Several.living_text());
        assert_eq!(narrative.past, Stratum::Empty);
    }

    #[test]
    fn current_author_is_not_counted() {
        let docs = [doc("@me", "hi"), doc("@a", "")];
        let narrative = aggregate(&docs, Some("@me"), NOW);

        assert_eq!(narrative.living_authors, 0);
        assert_eq!(narrative.past_authors, 1);
        assert_eq!(narrative.past, Stratum::Few);
    }

    #[test]
    fn anonymous_viewer_counts_everyone() {
        let docs = [doc("@me", "hi"), doc("@a", "hi")];
        assert_eq!(aggregate(&docs, None, NOW).living_authors, 2);
    }

    #[test]
    fn expired_content_counts_as_past() {
        let docs = [doc("@a", "hi")];
        let later = NOW + Micros(60_000_000);
        let narrative = aggregate(&docs, None, later);

        assert_eq!(narrative.living_authors, 0);
        assert_eq!(narrative.past_authors, 1);
    }
}
