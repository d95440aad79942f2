use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{ObjectId, ScheduleEntry};

/// Floating-point slack when comparing overlaps against the tolerance, minutes.
const OVERLAP_SLACK_MINUTES: f64 = 1e-6;

/// What is wrong with a pair of entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictKind {
    /// The entries share more time than the tolerance allows
    Overlap { minutes: f64 },
    /// The same catalog object is observed twice
    DuplicateObject { object: ObjectId },
}

/// Represents a scheduling conflict between two entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub first_index: usize,
    pub second_index: usize,
    pub first_name: String,
    pub second_name: String,
    pub kind: ConflictKind,
}

/// Find conflicts in a list of schedule entries
///
/// Detects:
/// - Pairs of entries overlapping by more than `max_overlap_minutes`
/// - Catalog objects that appear in more than one entry
///
/// # Arguments
/// * `entries` - Scheduled entries, in any order
/// * `max_overlap_minutes` - Tolerated overlap between two entries
///
/// # Returns
/// List of conflicts found, ordered by entry index
pub fn find_conflicts(entries: &[ScheduleEntry], max_overlap_minutes: f64) -> Vec<ScheduleConflict> {
    let mut conflicts = Vec::new();

    for (i, a) in entries.iter().enumerate() {
        for (j, b) in entries.iter().enumerate().skip(i + 1) {
            let minutes = a.overlap_minutes(b);
            if minutes > max_overlap_minutes + OVERLAP_SLACK_MINUTES {
                conflicts.push(conflict(i, a, j, b, ConflictKind::Overlap { minutes }));
            }
        }
    }

    let mut seen: HashMap<ObjectId, usize> = HashMap::new();
    for (j, entry) in entries.iter().enumerate() {
        for id in entry.target.member_ids() {
            match seen.get(&id) {
                Some(&i) if i != j => conflicts.push(conflict(
                    i,
                    &entries[i],
                    j,
                    entry,
                    ConflictKind::DuplicateObject { object: id },
                )),
                _ => {
                    seen.insert(id, j);
                }
            }
        }
    }

    conflicts.sort_by_key(|c| (c.first_index, c.second_index));
    conflicts
}

fn conflict(i: usize, a: &ScheduleEntry, j: usize, b: &ScheduleEntry, kind: ConflictKind) -> ScheduleConflict {
    ScheduleConflict {
        first_index: i,
        second_index: j,
        first_name: a.target.name().to_string(),
        second_name: b.target.name().to_string(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CelestialObject, Target};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, 0).unwrap()
    }

    fn entry(id: usize, start: DateTime<Utc>, end: DateTime<Utc>) -> ScheduleEntry {
        let target: Target = CelestialObject::new(ObjectId::new(id), format!("T{}", id), 1.0, 1.0, None, Some(9.0)).into();
        ScheduleEntry::new(start, end, target)
    }

    #[test]
    fn test_find_conflicts_empty() {
        assert!(find_conflicts(&[], 0.0).is_empty());
    }

    #[test]
    fn test_touching_entries_do_not_conflict() {
        let entries = vec![entry(0, at(20, 0), at(21, 0)), entry(1, at(21, 0), at(22, 0))];
        assert!(find_conflicts(&entries, 0.0).is_empty());
    }

    #[test]
    fn test_overlap_beyond_tolerance() {
        let entries = vec![entry(0, at(20, 0), at(21, 0)), entry(1, at(20, 50), at(22, 0))];
        assert!(find_conflicts(&entries, 10.0).is_empty());

        let conflicts = find_conflicts(&entries, 5.0);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].first_name, "T0");
        assert!(matches!(conflicts[0].kind, ConflictKind::Overlap { minutes } if (minutes - 10.0).abs() < 1e-9));
    }

    #[test]
    fn test_duplicate_object() {
        let entries = vec![entry(3, at(20, 0), at(21, 0)), entry(3, at(22, 0), at(23, 0))];
        let conflicts = find_conflicts(&entries, 0.0);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts[0].kind,
            ConflictKind::DuplicateObject { object: ObjectId::new(3) }
        );
    }
}
