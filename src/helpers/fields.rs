//! Field-name templating for the timesheet form.
//!
//! The allocator knows nothing about PDF field names; sessions are turned
//! into `key -> value` pairs here, one row of the form per session.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::session::WorkSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSlot {
    Label,
    Date,
    Start,
    End,
    Break,
    Duration,
}

impl FieldSlot {
    pub const ALL: [FieldSlot; 6] = [
        FieldSlot::Label,
        FieldSlot::Date,
        FieldSlot::Start,
        FieldSlot::End,
        FieldSlot::Break,
        FieldSlot::Duration,
    ];

    fn value(self, session: &WorkSession) -> String {
        match self {
            FieldSlot::Label => session.label.clone(),
            FieldSlot::Date => session.date_field(),
            FieldSlot::Start => session.start_field(),
            FieldSlot::End => session.end_field(),
            FieldSlot::Break => session.break_field(),
            FieldSlot::Duration => session.duration_field(),
        }
    }
}

/// Prefixes of the fillable fields in the form template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    pub label: String,
    pub date: String,
    pub time: String,
    pub summary: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            label: "Tätigkeit Stichwort Projekt".to_string(),
            date: "ttmmjj".to_string(),
            time: "hhmm".to_string(),
            summary: "Summe".to_string(),
        }
    }
}

/// Name of the form field holding `slot` of the session in row `index`
/// (1-based).
pub fn field_key(index: usize, slot: FieldSlot, names: &FieldNames) -> String {
    match slot {
        FieldSlot::Label => format!("{}Row{}", names.label, index),
        FieldSlot::Date => format!("{}Row{}", names.date, index),
        FieldSlot::Start => format!("{}Row{}", names.time, index),
        FieldSlot::End => format!("{}Row{}_2", names.time, index),
        FieldSlot::Break => format!("{}Row{}_3", names.time, index),
        FieldSlot::Duration => format!("{}Row{}_4", names.time, index),
    }
}

/// Formats a decimal hour total as `"{h}h {m}m"`, minutes rounded.
pub fn format_total(total_hours: f64) -> String {
    let minutes = (total_hours.max(0.0) * 60.0).round() as u64;
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Flat field mapping handed to the form sink, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFieldMapping {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl SessionFieldMapping {
    pub fn from_sessions(sessions: &[WorkSession], total_hours: f64, names: &FieldNames) -> Self {
        let mut mapping = Self::default();

        for (idx, session) in sessions.iter().enumerate() {
            for slot in FieldSlot::ALL {
                mapping.insert(field_key(idx + 1, slot, names), slot.value(session));
            }
        }
        mapping.insert(names.summary.clone(), format_total(total_hours));

        mapping
    }

    /// Inserts or replaces `key`. Replacing keeps the first insertion position.
    pub fn insert(&mut self, key: String, value: String) {
        match self.positions.get(&key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.positions
            .get(key)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl Serialize for SessionFieldMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
