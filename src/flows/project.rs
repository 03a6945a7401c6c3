//! Result projection
//!
//! Turns the flat event stream of one collection into file groups ready for
//! rendering. Pure: no I/O, same input always gives the same output.

use log::warn;

use crate::core::model::{CollectionResult, DisplayLine, FileGroup, LineRecord, RawEvent};
use crate::core::paths::relative_within_root;
use crate::core::util::digit_width;

/// File groups plus the metadata a renderer needs to align them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub groups: Vec<FileGroup>,
    /// Digits in the largest line number; 1 when there are no lines
    pub line_number_width: usize,
}

/// Group events by file in first-appearance order.
///
/// `begin` opens a group and `end` closes it. A path that shows up again
/// after its `end` gets a new, adjacent group. Line events with no open group
/// for their path open one implicitly, which covers output cut short by a
/// truncated collection. Events whose path is not strictly inside the search
/// root are dropped.
pub fn project(result: &CollectionResult) -> Projection {
    let mut groups: Vec<FileGroup> = Vec::new();
    let mut open: Option<FileGroup> = None;

    for event in &result.events {
        let Some(path) = event.path() else {
            continue;
        };
        if relative_within_root(path).is_none() {
            warn!("dropping result outside the search root: {:?}", path);
            continue;
        }

        match event {
            RawEvent::Begin { path } => {
                close(&mut open, &mut groups);
                open = Some(FileGroup {
                    path: path.clone(),
                    lines: Vec::new(),
                });
            }
            RawEvent::Match(record) => push_line(&mut open, &mut groups, record, true),
            RawEvent::Context(record) => push_line(&mut open, &mut groups, record, false),
            RawEvent::End { path } => {
                if open.as_ref().is_some_and(|g| &g.path == path) {
                    close(&mut open, &mut groups);
                }
            }
            RawEvent::Other => {}
        }
    }
    close(&mut open, &mut groups);

    let line_number_width = groups
        .iter()
        .flat_map(|g| g.lines.iter())
        .map(|l| digit_width(l.line_number))
        .max()
        .unwrap_or(1);

    Projection {
        groups,
        line_number_width,
    }
}

fn push_line(
    open: &mut Option<FileGroup>,
    groups: &mut Vec<FileGroup>,
    record: &LineRecord,
    is_match: bool,
) {
    if open.as_ref().map_or(true, |g| g.path != record.path) {
        close(open, groups);
        *open = Some(FileGroup {
            path: record.path.clone(),
            lines: Vec::new(),
        });
    }

    if let Some(group) = open.as_mut() {
        group.lines.push(DisplayLine {
            line_number: record.line_number,
            text: record.text.clone(),
            is_match,
            spans: record.submatches.clone(),
        });
    }
}

fn close(open: &mut Option<FileGroup>, groups: &mut Vec<FileGroup>) {
    if let Some(mut group) = open.take() {
        if group.lines.is_empty() {
            return;
        }
        // Stable, so equal line numbers keep emission order
        group.lines.sort_by_key(|l| l.line_number);
        groups.push(group);
    }
}
