use std::collections::BTreeMap;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::listview::{FilterableList, Predicate, SearchInput};
use crate::model::Row;

/// What a generated view displaces: the canonical rows and the predicate
/// set that was filtering them.
struct Stash {
    rows: Vec<Row>,
    filters: BTreeMap<String, Predicate<Row>>,
}

/// Display-side state the contexts and mixins operate on: the filterable
/// row list, the search pattern buffer, the focus position, and the two
/// one-line status slots at the bottom of the screen.
pub struct UiState {
    pub list: FilterableList<Row>,
    pub search: SearchInput,
    selected: usize,
    pub prompt: String,
    pub command_line: String,
    pub filter_line: String,
    command_summary: String,
    stash: Option<Stash>,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            list: FilterableList::new(),
            search: SearchInput::default(),
            selected: 0,
            prompt: String::new(),
            command_line: "Initializing...".to_string(),
            filter_line: String::new(),
            command_summary: String::new(),
            stash: None,
        }
    }

    /// Called on every context transition with the regenerated summaries.
    pub fn set_summaries(&mut self, prompt: &str, commands: String, filters: String) {
        self.prompt = prompt.to_string();
        self.command_summary = commands;
        self.command_line = self.command_summary.clone();
        self.filter_line = filters;
    }

    /// The currently focused row, if any row is visible.
    pub fn get_active_row(&self) -> Option<Row> {
        self.list.get(self.selected).cloned()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.list.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.list.len().saturating_sub(1);
    }

    pub fn page(&mut self, delta: isize) {
        let len = self.list.len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let target = self.selected as isize + delta;
        self.selected = target.clamp(0, len as isize - 1) as usize;
    }

    /// Keep the focus inside the visible range after a refilter.
    pub fn clamp_selection(&mut self) {
        if self.selected >= self.list.len() {
            self.selected = self.list.len().saturating_sub(1);
        }
    }

    /// Open the search prompt: empty pattern, a filter that matches
    /// everything, and a `/` in the command slot.
    pub fn begin_search(&mut self) {
        self.search.begin();
        self.install_search_filter("");
        self.list.filter_results();
        self.clamp_selection();
        self.command_line = "/".to_string();
    }

    /// Close the search prompt. With `remove` the filter is uninstalled
    /// (esc); without it the filtered view is kept (enter). Returns
    /// whether a filter was actually removed.
    pub fn end_search(&mut self, remove: bool) -> bool {
        self.search.end();
        self.command_line = self.command_summary.clone();
        if !remove {
            return false;
        }
        let removed = self.list.remove_filter("search").is_some();
        if removed {
            self.list.filter_results();
            self.clamp_selection();
        }
        removed
    }

    /// Recompile the search predicate from the current pattern and
    /// refilter. An invalid pattern is reported on the status line and
    /// leaves the previous visible set untouched.
    pub fn apply_search_pattern(&mut self) {
        let pattern = self.search.pattern().to_string();
        match Regex::new(&pattern) {
            Ok(_) => {
                self.install_search_filter(&pattern);
                self.list.filter_results();
                self.clamp_selection();
                self.command_line = format!("/{pattern}");
            }
            Err(source) => {
                let err = CoreError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                };
                warn!(target: "search", "{err}");
                self.command_line = format!("/{pattern}  (invalid pattern)");
            }
        }
    }

    fn install_search_filter(&mut self, pattern: &str) {
        // Compile once here; an empty pattern matches everything.
        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(_) => return,
        };
        self.list.add_filter(
            "search",
            Box::new(move |row: &Row| regex.is_match(row.name())),
        );
    }

    /// Swap in a generated row set (the help table), stashing the real
    /// rows and suspending the installed filters so the generated rows
    /// render unfiltered.
    pub fn show_generated_rows(&mut self, rows: Vec<Row>) {
        debug!(target: "ui", "stashing {} rows for a generated view", self.list.originals().len());
        let filters = self.list.take_filters();
        let previous = self.list.swap_originals(rows);
        if self.stash.is_none() {
            self.stash = Some(Stash {
                rows: previous,
                filters,
            });
        }
        self.selected = 0;
    }

    /// Restore the rows and filters stashed by `show_generated_rows`.
    pub fn restore_rows(&mut self) {
        if let Some(stash) = self.stash.take() {
            self.list.restore_filters(stash.filters);
            self.list.set_originals(stash.rows);
            self.clamp_selection();
        }
    }

    /// Install the canonical package rows. While a generated view owns
    /// the screen, late-arriving data lands in the stash instead, so it
    /// appears once the real rows are restored rather than being lost.
    pub fn set_base_rows(&mut self, rows: Vec<Row>) {
        match &mut self.stash {
            Some(stash) => stash.rows = rows,
            None => {
                self.list.set_originals(rows);
                self.clamp_selection();
            }
        }
    }

    pub fn has_stash(&self) -> bool {
        self.stash.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PackageRow, PkgdbRecord};

    fn package_row(name: &str) -> Row {
        Row::Package(PackageRow::new(PkgdbRecord {
            name: name.to_string(),
            ..Default::default()
        }))
    }

    fn ui_with(names: &[&str]) -> UiState {
        let mut ui = UiState::new();
        ui.list
            .set_originals(names.iter().map(|n| package_row(n)).collect());
        ui
    }

    fn visible(ui: &UiState) -> Vec<String> {
        ui.list.reference().map(|r| r.name().to_string()).collect()
    }

    #[test]
    fn incremental_search_narrows_and_restores() {
        let mut ui = ui_with(&["foo", "bar", "foobar"]);

        ui.begin_search();
        for c in "foo".chars() {
            ui.search.push(c);
            ui.apply_search_pattern();
        }
        assert_eq!(visible(&ui), vec!["foo", "foobar"]);
        assert_eq!(ui.command_line, "/foo");

        for c in "bar".chars() {
            ui.search.push(c);
            ui.apply_search_pattern();
        }
        assert_eq!(visible(&ui), vec!["foobar"]);

        assert!(ui.end_search(true));
        assert_eq!(visible(&ui), vec!["foo", "bar", "foobar"]);
    }

    #[test]
    fn invalid_pattern_keeps_previous_view() {
        let mut ui = ui_with(&["foo", "bar"]);
        ui.begin_search();
        ui.search.push('f');
        ui.apply_search_pattern();
        assert_eq!(visible(&ui), vec!["foo"]);

        ui.search.push('(');
        ui.apply_search_pattern();
        assert_eq!(visible(&ui), vec!["foo"], "bad regex must not change the view");
        assert!(ui.command_line.contains("invalid pattern"));
    }

    #[test]
    fn selection_clamps_after_refilter() {
        let mut ui = ui_with(&["foo", "bar", "baz"]);
        ui.select_last();
        assert_eq!(ui.selected(), 2);

        ui.list
            .add_filter("only_b", Box::new(|row: &Row| row.name().starts_with('b')));
        ui.list.filter_results();
        ui.clamp_selection();
        assert_eq!(ui.selected(), 1);
    }

    #[test]
    fn generated_rows_stash_and_restore() {
        let mut ui = ui_with(&["foo", "bar"]);
        ui.show_generated_rows(vec![Row::Doc(crate::model::DocRow {
            section: "main".into(),
            keys: "q".into(),
            doc: "Quit".into(),
        })]);
        assert_eq!(ui.list.len(), 1);
        assert!(ui.has_stash());

        ui.restore_rows();
        assert_eq!(visible(&ui), vec!["foo", "bar"]);
        assert!(!ui.has_stash());
    }

    #[test]
    fn generated_views_suspend_installed_filters() {
        let mut ui = ui_with(&["foo", "bar"]);
        ui.list
            .add_filter("only_f", Box::new(|row: &Row| row.name().starts_with('f')));
        ui.list.filter_results();
        assert_eq!(visible(&ui), vec!["foo"]);

        ui.show_generated_rows(vec![Row::Doc(crate::model::DocRow {
            section: "main".into(),
            keys: "q".into(),
            doc: "Quit".into(),
        })]);
        assert_eq!(ui.list.len(), 1, "generated rows render unfiltered");

        ui.restore_rows();
        assert_eq!(visible(&ui), vec!["foo"]);
        assert!(ui.list.has_filter("only_f"));
    }

    #[test]
    fn base_rows_arriving_under_a_generated_view_land_in_the_stash() {
        let mut ui = UiState::new();
        ui.show_generated_rows(vec![Row::Doc(crate::model::DocRow {
            section: "main".into(),
            keys: "q".into(),
            doc: "Quit".into(),
        })]);

        ui.set_base_rows(vec![package_row("nethack"), package_row("zsh")]);
        assert_eq!(ui.list.len(), 1, "the generated view stays on screen");

        ui.restore_rows();
        assert_eq!(visible(&ui), vec!["nethack", "zsh"]);
    }
}
