//! Filtering and ordering of a note collection for display.

use std::cmp::Ordering;

use log::debug;

use crate::{Note, Selection, SortBy, SortOrder};

/// What to show and in which order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteQuery {
    /// Case-insensitive substring looked for in title, raw content and tags
    pub search_term: Option<String>,
    pub category: Selection,
    pub tag: Selection,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl NoteQuery {
    /// Whether `note` passes every filter of this query.
    pub fn matches(&self, note: &Note) -> bool {
        self.matches_search(note) && self.category.admits(&note.category) && self.matches_tag(note)
    }

    fn matches_search(&self, note: &Note) -> bool {
        let Some(term) = self.search_term.as_deref().filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();

        // Content is searched as stored, markup included.
        note.title.to_lowercase().contains(&term)
            || note.content.to_lowercase().contains(&term)
            || note.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
    }

    fn matches_tag(&self, note: &Note) -> bool {
        match &self.tag {
            Selection::All => true,
            Selection::Only(tag) => note.tags.contains(tag),
        }
    }

    fn compare(&self, a: &Note, b: &Note) -> Ordering {
        let cmp = match self.sort_by {
            SortBy::Date => a.date.cmp(&b.date),
            SortBy::Updated => a.updated_at.cmp(&b.updated_at),
            SortBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };
        match self.sort_order {
            SortOrder::Asc => cmp,
            SortOrder::Desc => cmp.reverse(),
        }
    }
}

/// Filters and sorts `notes` without touching them.
///
/// The sort is stable: notes with equal keys keep their input order in both
/// directions.
pub fn view(notes: &[Note], query: &NoteQuery) -> Vec<Note> {
    let mut selected: Vec<Note> = notes
        .iter()
        .filter(|note| query.matches(note))
        .cloned()
        .collect();

    selected.sort_by(|a, b| query.compare(a, b));

    debug!("View selected {} of {} notes", selected.len(), notes.len());
    selected
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::*;

    fn note(id: &str, title: &str, day: u32, updated_min: i64) -> Note {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Note {
            id: id.to_string(),
            title: title.to_string(),
            content: String::new(),
            tags: Vec::new(),
            category: "general".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            attendees: None,
            meeting_time: None,
            created_at: created,
            updated_at: created + Duration::minutes(updated_min),
        }
    }

    fn ids(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn search_covers_title_raw_content_and_tags() {
        let mut a = note("a", "Budget Review", 1, 0);
        let mut b = note("b", "Other", 2, 0);
        let mut c = note("c", "Third", 3, 0);
        b.content = "<strong>budget</strong> talk".into();
        c.tags = vec!["Finance".into()];
        a.tags = vec!["x".into()];

        let query = NoteQuery {
            search_term: Some("BUDGET".into()),
            ..NoteQuery::default()
        };
        assert_eq!(view(&[a.clone(), b.clone(), c.clone()], &query).len(), 2);

        let markup = NoteQuery {
            search_term: Some("<strong>".into()),
            ..NoteQuery::default()
        };
        assert_eq!(ids(&view(&[a.clone(), b.clone(), c.clone()], &markup)), vec!["b"]);

        let tag = NoteQuery {
            search_term: Some("fin".into()),
            ..NoteQuery::default()
        };
        assert_eq!(ids(&view(&[a, b, c], &tag)), vec!["c"]);
    }

    #[test]
    fn filters_are_conjunctive() {
        let mut a = note("a", "one", 1, 0);
        let mut b = note("b", "two", 2, 0);
        let mut c = note("c", "three", 3, 0);
        a.category = "meeting".into();
        a.tags = vec!["team".into()];
        b.category = "meeting".into();
        c.tags = vec!["team".into()];

        let query = NoteQuery {
            category: Selection::Only("meeting".into()),
            tag: Selection::Only("team".into()),
            ..NoteQuery::default()
        };
        assert_eq!(ids(&view(&[a, b, c], &query)), vec!["a"]);
    }

    #[test]
    fn tag_filter_is_exact_membership() {
        let mut a = note("a", "one", 1, 0);
        a.tags = vec!["teamwork".into()];
        let query = NoteQuery {
            tag: Selection::Only("team".into()),
            ..NoteQuery::default()
        };
        assert!(view(&[a], &query).is_empty());
    }

    #[test]
    fn sorts_by_each_key_in_both_directions() {
        let notes = vec![
            note("a", "banana", 3, 10),
            note("b", "Apple", 1, 30),
            note("c", "cherry", 2, 20),
        ];

        let by = |sort_by, sort_order| NoteQuery {
            sort_by,
            sort_order,
            ..NoteQuery::default()
        };

        assert_eq!(ids(&view(&notes, &by(SortBy::Title, SortOrder::Asc))), vec!["b", "a", "c"]);
        assert_eq!(ids(&view(&notes, &by(SortBy::Date, SortOrder::Desc))), vec!["a", "c", "b"]);
        assert_eq!(ids(&view(&notes, &by(SortBy::Updated, SortOrder::Asc))), vec!["a", "c", "b"]);
        assert_eq!(ids(&view(&notes, &NoteQuery::default())), vec!["b", "c", "a"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let notes = vec![
            note("first", "x", 1, 5),
            note("second", "y", 2, 5),
            note("third", "z", 3, 9),
        ];
        let desc = NoteQuery::default();
        assert_eq!(ids(&view(&notes, &desc)), vec!["third", "first", "second"]);

        let asc = NoteQuery {
            sort_order: SortOrder::Asc,
            ..NoteQuery::default()
        };
        assert_eq!(ids(&view(&notes, &asc)), vec!["first", "second", "third"]);
    }

    #[test]
    fn view_is_idempotent() {
        let mut notes = vec![note("a", "b", 2, 1), note("b", "a", 1, 1), note("c", "c", 3, 0)];
        notes[0].tags = vec!["t".into()];
        notes[2].tags = vec!["t".into()];
        let query = NoteQuery {
            tag: Selection::Only("t".into()),
            sort_by: SortBy::Title,
            ..NoteQuery::default()
        };
        let once = view(&notes, &query);
        assert_eq!(view(&once, &query), once);
    }
}
