// Accumulation of a work-package/work-report is deferred in the case that it has a not-yet-fulfilled dependency and is
// cancelled entirely in the case of an invalid dependency. Dependencies are specified as work-package hashes and in
// order to know which work-packages have been accumulated already, we maintain a history of what has been accumulated.
// This history (AccumulatedHistory) is sufficiently large for an epoch worth of work-reports.

// We also maintain knowledge of ready (i.e. available and/or audited) but not-yet-accumulated work-reports in the
// ReadyQueue. Each of these were made available at most one epoch ago but have or had unfulfilled dependencies.
// Alongside the work-report itself, we retain its unaccumulated dependencies, a set of work-package hashes.

use std::collections::HashSet;

use jam_types::{AccumulatedHistory, ReadyQueue, ReadyRecord, TimeSlot, WorkPackageHash, WorkReport};

// The queue-editing function. Removes every entry whose package was accumulated, and drops accumulated packages from
// the dependencies of the rest.
pub fn edit_queue(records: &mut Vec<ReadyRecord>, accumulated: &HashSet<WorkPackageHash>) {
    records.retain(|record| !accumulated.contains(&record.report.package_spec.hash));
    for record in records.iter_mut() {
        record.dependencies.retain(|dependency| !accumulated.contains(dependency));
    }
}

/// The reports which become accumulatable from the queue, in order: those without dependencies first, then those
/// their accumulation unblocks, and so on.
pub fn resolve_queue(mut records: Vec<ReadyRecord>) -> Vec<WorkReport> {
    let mut resolved = Vec::new();
    loop {
        let ready: Vec<WorkReport> = records
            .iter()
            .filter(|record| record.dependencies.is_empty())
            .map(|record| record.report.clone())
            .collect();
        if ready.is_empty() {
            return resolved;
        }
        let hashes = ready.iter().map(|report| report.package_spec.hash).collect();
        edit_queue(&mut records, &hashes);
        resolved.extend(ready);
    }
}

// Dependencies of a report: its prerequisites and the packages of its segment-root lookups
fn dependencies(report: &WorkReport) -> Vec<WorkPackageHash> {
    let mut dependencies = report.context.prerequisites.clone();
    for item in &report.segment_root_lookup {
        if !dependencies.contains(&item.work_package_hash) {
            dependencies.push(item.work_package_hash);
        }
    }
    dependencies.sort();
    dependencies
}

/// Splits the newly available reports and resolves them against the ready queue. Returns the reports to accumulate in
/// this block and the new queue entries of those which still wait on something.
pub fn accumulatable_reports(
    available: &[WorkReport],
    ready_queue: &ReadyQueue,
    history: &AccumulatedHistory,
    slot_index: usize,
) -> (Vec<WorkReport>, Vec<ReadyRecord>) {

    // The newly available work-reports are partitioned into two sequences based on the condition of having zero
    // prerequisite work-reports. Those meeting the condition are accumulated immediately.
    let (immediate, queued): (Vec<&WorkReport>, Vec<&WorkReport>) = available
        .iter()
        .partition(|report| report.context.prerequisites.is_empty() && report.segment_root_lookup.is_empty());

    let mut new_records: Vec<ReadyRecord> = queued
        .into_iter()
        .map(|report| ReadyRecord { report: report.clone(), dependencies: dependencies(report) })
        .collect();
    let historical: HashSet<WorkPackageHash> = history.iter().flatten().copied().collect();
    edit_queue(&mut new_records, &historical);

    // Oldest entries first: from the current slot to the end of the epoch, then from the start
    let mut records: Vec<ReadyRecord> = ready_queue[slot_index..]
        .iter()
        .chain(ready_queue[..slot_index].iter())
        .flatten()
        .cloned()
        .chain(new_records.iter().cloned())
        .collect();

    let immediate: Vec<WorkReport> = immediate.into_iter().cloned().collect();
    let immediate_hashes = immediate.iter().map(|report| report.package_spec.hash).collect();
    edit_queue(&mut records, &immediate_hashes);

    let mut accumulatable = immediate;
    accumulatable.extend(resolve_queue(records));

    (accumulatable, new_records)
}

/// Shifts the history by one and records the packages accumulated in this block.
pub fn update_history(history: &mut AccumulatedHistory, accumulated: &[WorkPackageHash]) {
    let mut newest = accumulated.to_vec();
    newest.sort();
    newest.dedup();
    history.rotate_left(1);
    if let Some(last) = history.last_mut() {
        *last = newest;
    }
}

/// The current slot's entry receives the new queue items, the entries of slots skipped since the previous block are
/// cleared and every other entry is edited by the newly accumulated packages.
pub fn update_ready_queue(
    ready_queue: &mut ReadyQueue,
    new_records: Vec<ReadyRecord>,
    accumulated: &HashSet<WorkPackageHash>,
    prior_tau: TimeSlot,
    post_tau: TimeSlot,
    slot_index: usize,
) {
    let epoch_length = ready_queue.len();
    let elapsed = post_tau.saturating_sub(prior_tau) as usize;
    let mut new_records = Some(new_records);

    for i in 0..epoch_length {
        let index = (slot_index + epoch_length - i) % epoch_length;
        if i == 0 {
            ready_queue[index] = new_records.take().unwrap_or_default();
        } else if i < elapsed {
            ready_queue[index].clear();
        } else {
            edit_queue(&mut ready_queue[index], accumulated);
        }
    }
}
