//! Snapshot comparison.

use dirwatch_core::{ChangeEvent, FileRecord, Snapshot};

/// Compare two snapshots.
///
/// Added and modified files are reported in `current`'s walk order, then
/// removed files in `previous`'s order. A file counts as modified when the
/// filesystem modification time observed by the two scans differs.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> Vec<ChangeEvent> {
    let mut events = Vec::new();

    for record in current.records() {
        match previous.get(&record.name) {
            None => events.push(ChangeEvent::added(record.name.clone())),
            Some(old) if old.modified != record.modified => {
                events.push(ChangeEvent::modified(record.name.clone()))
            }
            Some(_) => {}
        }
    }

    events.extend(
        previous
            .records()
            .filter(|record| !current.contains(&record.name))
            .map(|record| ChangeEvent::removed(record.name.clone())),
    );

    events
}

/// A freshly scanned snapshot with timestamps carried over from the
/// previous generation, plus the changes between the two.
#[derive(Debug)]
pub struct Reconciled {
    pub snapshot: Snapshot,
    pub events: Vec<ChangeEvent>,
}

/// Diff `scanned` against `previous` and carry record history forward.
///
/// Records present in both keep their `created_time`. Their `updated_time`
/// is refreshed to the new modification time when the file changed and kept
/// otherwise. The baseline is left for the publisher to set.
pub fn reconcile(previous: &Snapshot, scanned: Snapshot) -> Reconciled {
    let events = diff(previous, &scanned);
    let snapshot = scanned.map_records(|record| match previous.get(&record.name) {
        Some(old) => carry_forward(old, record),
        None => record,
    });
    Reconciled { snapshot, events }
}

fn carry_forward(old: &FileRecord, mut record: FileRecord) -> FileRecord {
    record.created_time = old.created_time;
    record.updated_time = if old.modified != record.modified {
        record.modified
    } else {
        old.updated_time
    };
    record
}
