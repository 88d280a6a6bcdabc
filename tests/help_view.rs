//! The generated help view: entering the help context swaps in doc rows
//! derived from the command maps, leaving it restores the package rows,
//! and the status summaries regenerate on every transition.

use pkgdash::app::App;
use pkgdash::config::Config;
use pkgdash::context::Controller;
use pkgdash::contexts::all_contexts;
use pkgdash::keys::KeyToken;
use pkgdash::logging::LogRingBuffer;
use pkgdash::model::{PackageRow, PkgdbRecord, Row};
use pkgdash::notify::Emission;
use pkgdash::ui::UiState;
use serde_json::json;

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

fn doc_rows(ui: &UiState) -> Vec<(String, String, String)> {
    ui.list
        .reference()
        .filter_map(|row| match row {
            Row::Doc(doc) => Some((doc.section.clone(), doc.keys.clone(), doc.doc.clone())),
            Row::Package(_) => None,
        })
        .collect()
}

#[test]
fn entering_help_shows_the_generated_table() {
    let mut ui = ui_with(&["foo", "bar"]);
    let mut controller = Controller::new(all_contexts(), &mut ui);

    controller.set_context("help", &mut ui);
    assert_eq!(controller.current(), "help");
    assert_eq!(ui.prompt, "HELP");

    let rows = doc_rows(&ui);
    assert_eq!(rows.len(), ui.list.len(), "help view contains only doc rows");

    // A heading per context, main first.
    assert_eq!(rows[0].0, "main");
    assert!(rows[0].1.is_empty());
    let headings: Vec<&str> = rows
        .iter()
        .filter(|(_, keys, _)| keys.is_empty())
        .map(|(section, _, _)| section.as_str())
        .collect();
    assert_eq!(headings, vec!["main", "anitya", "build:rawhide", "help"]);

    // Keys sharing one long description collapse into a single row.
    let quit = rows
        .iter()
        .find(|(_, _, doc)| doc == "Exit the dashboard.")
        .expect("quit row present");
    assert_eq!(quit.1, "esc|q");
}

#[test]
fn leaving_help_restores_the_package_rows() {
    let mut ui = ui_with(&["foo", "bar"]);
    let mut controller = Controller::new(all_contexts(), &mut ui);

    controller.set_context("help", &mut ui);
    assert!(ui.has_stash());

    controller.set_context("main", &mut ui);
    assert!(!ui.has_stash());
    let names: Vec<String> = ui.list.reference().map(|r| r.name().to_string()).collect();
    assert_eq!(names, vec!["foo", "bar"]);
    assert_eq!(ui.prompt, "READY");
}

#[test]
fn summaries_follow_the_active_context() {
    let mut ui = ui_with(&["foo"]);
    let mut controller = Controller::new(all_contexts(), &mut ui);

    assert_eq!(
        ui.command_line,
        "a - Anitya   d - Debug   ? - Help   esc|q - Quit   b - Rawhide"
    );
    assert_eq!(ui.filter_line, "/ - Search");

    controller.set_context("anitya", &mut ui);
    assert_eq!(ui.prompt, "ANITYA");
    assert_eq!(
        ui.command_line,
        "esc|q - Back   c - Check   n - New   o - Open"
    );
    assert_eq!(
        ui.filter_line,
        "/ - Search   m - Show Mismatches   a - Show Missing"
    );
}

#[test]
fn committed_search_does_not_filter_the_help_table() {
    let mut ui = ui_with(&["foo", "bar", "foobar"]);
    let mut controller = Controller::new(all_contexts(), &mut ui);

    controller.keypress(KeyToken::Char('/'), &mut ui);
    ui.begin_search();
    for c in "foo".chars() {
        controller.keypress(KeyToken::Char(c), &mut ui);
    }
    controller.keypress(KeyToken::Enter, &mut ui);
    assert_eq!(ui.list.len(), 2, "committed view shows foo and foobar");

    controller.set_context("help", &mut ui);
    let generated = ui.list.originals().len();
    assert!(generated > 0);
    assert_eq!(
        ui.list.len(),
        generated,
        "every generated row is visible despite the committed pattern"
    );

    // The committed view comes back intact on the way out.
    controller.set_context("main", &mut ui);
    let names: Vec<String> = ui.list.reference().map(|r| r.name().to_string()).collect();
    assert_eq!(names, vec!["foo", "foobar"]);
    assert!(ui.list.has_filter("search"));
}

#[test]
fn packages_arriving_during_help_survive_the_view_switch() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut app = App::new(
        Config::default(),
        LogRingBuffer::new(16),
        runtime.handle().clone(),
    )
    .unwrap();

    // Help opened before any data arrived.
    app.controller.set_context("help", &mut app.ui);

    app.on_emission(Emission {
        event: "pkgdb".to_string(),
        key: None,
        payload: json!({
            "point of contact": [{"name": "nethack"}, {"name": "zsh"}]
        }),
    });

    app.controller.set_context("main", &mut app.ui);
    let names: Vec<String> = app
        .ui
        .list
        .reference()
        .map(|r| r.name().to_string())
        .collect();
    assert_eq!(names, vec!["nethack", "zsh"]);
}
