//! Help text is never written by hand: both the one-line status
//! summaries and the dedicated help view are derived from the doc strings
//! registered in the context command/filter maps.

use std::collections::BTreeMap;

use crate::context::Context;
use crate::error::CoreError;
use crate::keys::KeyToken;
use crate::model::{DocRow, Row};

#[derive(Debug, Clone)]
pub struct HelpEntry {
    pub context: &'static str,
    pub key: KeyToken,
    pub short: String,
    pub long: String,
    pub is_filter: bool,
}

/// The parsed doc entries plus whatever failed to parse. Malformed docs
/// are excluded and reported; they must never break the render path.
#[derive(Debug, Default)]
pub struct HelpTable {
    pub entries: Vec<HelpEntry>,
    pub malformed: Vec<CoreError>,
}

/// Split every registered doc string once on `" | "`.
pub fn build_table<'a>(contexts: impl Iterator<Item = &'a Context>) -> HelpTable {
    let mut table = HelpTable::default();
    for context in contexts {
        let commands = context.commands().map(|(k, s)| (k, s, false));
        let filters = context.filters().map(|(k, s)| (k, s, true));
        for (key, spec, is_filter) in commands.chain(filters) {
            match spec.doc.split_once(" | ") {
                Some((short, long)) => table.entries.push(HelpEntry {
                    context: context.name(),
                    key: *key,
                    short: short.to_string(),
                    long: long.to_string(),
                    is_filter,
                }),
                None => table.malformed.push(CoreError::MalformedDoc {
                    context: context.name().to_string(),
                    key: key.label(),
                    doc: spec.doc.to_string(),
                }),
            }
        }
    }
    table
}

/// Grouped, label-sorted one-line summary of one context's commands,
/// e.g. `a - Anitya   esc|q - Quit`.
pub fn short_command_summary(table: &HelpTable, context: &str) -> String {
    summarize(table, context, false)
}

/// Same, for the filter toggles.
pub fn short_filter_summary(table: &HelpTable, context: &str) -> String {
    summarize(table, context, true)
}

fn summarize(table: &HelpTable, context: &str, filters: bool) -> String {
    let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for entry in &table.entries {
        if entry.context == context && entry.is_filter == filters {
            grouped
                .entry(entry.short.as_str())
                .or_default()
                .push(entry.key.label());
        }
    }
    grouped
        .into_iter()
        .map(|(short, mut keys)| {
            keys.sort();
            format!("{} - {}", keys.join("|"), short)
        })
        .collect::<Vec<_>>()
        .join("   ")
}

/// Rows for the dedicated help view: a heading per context, then one row
/// per distinct long description listing every key bound to it.
pub fn doc_rows(table: &HelpTable) -> Vec<Row> {
    let mut contexts: Vec<&'static str> = Vec::new();
    for entry in &table.entries {
        if !contexts.contains(&entry.context) {
            contexts.push(entry.context);
        }
    }

    let mut rows = Vec::new();
    for context in contexts {
        rows.push(Row::Doc(DocRow {
            section: context.to_string(),
            keys: String::new(),
            doc: String::new(),
        }));
        let mut collapsed: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for entry in &table.entries {
            if entry.context == context {
                collapsed
                    .entry(entry.long.as_str())
                    .or_default()
                    .push(entry.key.label());
            }
        }
        for (long, mut keys) in collapsed {
            keys.sort();
            rows.push(Row::Doc(DocRow {
                section: String::new(),
                keys: keys.join("|"),
                doc: long.to_string(),
            }));
        }
    }
    rows
}
