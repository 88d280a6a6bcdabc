//! The incremental search behavior end to end: keys flow through the
//! controller into the searchable mixin, the pattern narrows the visible
//! rows, and esc/enter resolve the prompt.

use pkgdash::actions::Action;
use pkgdash::context::{Controller, Dispatch, KeyResult};
use pkgdash::contexts::all_contexts;
use pkgdash::keys::KeyToken;
use pkgdash::model::{PackageRow, PkgdbRecord, Row};
use pkgdash::ui::UiState;

fn ui_with(names: &[&str]) -> UiState {
    let mut ui = UiState::new();
    ui.list.set_originals(
        names
            .iter()
            .map(|name| {
                Row::Package(PackageRow::new(PkgdbRecord {
                    name: name.to_string(),
                    ..Default::default()
                }))
            })
            .collect(),
    );
    ui
}

fn visible(ui: &UiState) -> Vec<String> {
    ui.list.reference().map(|r| r.name().to_string()).collect()
}

/// Drive the `/`-dispatch the way the application does.
fn open_search(controller: &mut Controller, ui: &mut UiState) {
    let result = controller.keypress(KeyToken::Char('/'), ui);
    assert_eq!(
        result,
        KeyResult::Dispatch(Dispatch {
            action: Action::StartSearch,
            batch: false,
        })
    );
    ui.begin_search();
}

#[test]
fn typing_narrows_and_esc_restores() {
    let mut ui = ui_with(&["foo", "bar", "foobar"]);
    let mut controller = Controller::new(all_contexts(), &mut ui);

    open_search(&mut controller, &mut ui);
    for c in "foo".chars() {
        assert_eq!(controller.keypress(KeyToken::Char(c), &mut ui), KeyResult::Handled);
    }
    assert_eq!(visible(&ui), vec!["foo", "foobar"]);
    assert_eq!(ui.command_line, "/foo");

    assert_eq!(controller.keypress(KeyToken::Esc, &mut ui), KeyResult::Handled);
    assert_eq!(visible(&ui), vec!["foo", "bar", "foobar"]);
    assert!(!ui.list.has_filter("search"));
}

#[test]
fn enter_commits_the_filtered_view() {
    let mut ui = ui_with(&["foo", "bar", "foobar"]);
    let mut controller = Controller::new(all_contexts(), &mut ui);

    open_search(&mut controller, &mut ui);
    controller.keypress(KeyToken::Char('b'), &mut ui);
    assert_eq!(controller.keypress(KeyToken::Enter, &mut ui), KeyResult::Handled);

    assert_eq!(visible(&ui), vec!["bar", "foobar"]);
    assert!(ui.list.has_filter("search"), "enter keeps the filter installed");
    assert!(!ui.search.is_accepting());

    // A later esc removes the committed filter.
    assert_eq!(controller.keypress(KeyToken::Esc, &mut ui), KeyResult::Handled);
    assert_eq!(visible(&ui), vec!["foo", "bar", "foobar"]);
}

#[test]
fn invalid_patterns_keep_the_previous_view() {
    let mut ui = ui_with(&["foo", "bar", "foobar"]);
    let mut controller = Controller::new(all_contexts(), &mut ui);

    open_search(&mut controller, &mut ui);
    controller.keypress(KeyToken::Char('f'), &mut ui);
    assert_eq!(visible(&ui), vec!["foo", "foobar"]);

    controller.keypress(KeyToken::Char('('), &mut ui);
    assert_eq!(visible(&ui), vec!["foo", "foobar"]);
    assert!(ui.command_line.contains("invalid pattern"));

    // Erasing the offending character recovers.
    controller.keypress(KeyToken::Backspace, &mut ui);
    assert_eq!(visible(&ui), vec!["foo", "foobar"]);
    assert_eq!(ui.command_line, "/f");
}

#[test]
fn backspace_on_an_empty_pattern_closes_the_search() {
    let mut ui = ui_with(&["foo", "bar"]);
    let mut controller = Controller::new(all_contexts(), &mut ui);

    open_search(&mut controller, &mut ui);
    assert_eq!(controller.keypress(KeyToken::Backspace, &mut ui), KeyResult::Handled);
    assert!(!ui.search.is_accepting());
    assert!(!ui.list.has_filter("search"));
    assert_eq!(visible(&ui), vec!["foo", "bar"]);
}

#[test]
fn navigation_keys_are_swallowed_while_the_prompt_is_open() {
    let mut ui = ui_with(&["foo", "bar"]);
    let mut controller = Controller::new(all_contexts(), &mut ui);

    open_search(&mut controller, &mut ui);
    assert_eq!(controller.keypress(KeyToken::Down, &mut ui), KeyResult::Handled);
    assert_eq!(ui.selected(), 0);
}

#[test]
fn search_keys_fall_through_while_the_list_is_empty() {
    let mut ui = UiState::new();
    let mut controller = Controller::new(all_contexts(), &mut ui);

    // Without data the '/' still resolves from the filter map, but the
    // application refuses to open the prompt; a stray esc quits instead
    // of being eaten by the mixin.
    assert_eq!(
        controller.keypress(KeyToken::Esc, &mut ui),
        KeyResult::Dispatch(Dispatch {
            action: Action::Quit,
            batch: false,
        })
    );
}
