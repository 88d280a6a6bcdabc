//! The concrete interaction modes. Each context is assembled once when
//! the controller is built; the key tables never change afterwards.

use crate::actions::Action;
use crate::context::{Context, ContextKind, Searchable};
use crate::keys::KeyToken;

const BACK_DOC: &str = "Back | Return to the top-level context.";
const SEARCH_DOC: &str = "Search | Filter packages with a regular expression.";

/// Give a list-backed context the incremental-search behavior: the
/// mixin in the handler chain plus the `/` binding in its filter map.
fn searchable(context: Context) -> Context {
    context
        .mixin(Searchable)
        .filter(KeyToken::Char('/'), Action::StartSearch, SEARCH_DOC)
}

pub fn main_context() -> Context {
    searchable(
        Context::new("main", "READY")
            .command(KeyToken::Char('q'), Action::Quit, "Quit | Exit the dashboard.")
            .command(KeyToken::Esc, Action::Quit, "Quit | Exit the dashboard.")
            .command(
                KeyToken::Char('?'),
                Action::Switch("help"),
                "Help | Show the available commands, i.e. this menu.",
            )
            .command(
                KeyToken::Char('a'),
                Action::Switch("anitya"),
                "Anitya | Enter anitya (release-monitoring.org) mode.",
            )
            .command(
                KeyToken::Char('b'),
                Action::Switch("build:rawhide"),
                "Rawhide | Enter rawhide mode (scratch builds, koji, dist-git).",
            )
            .command(
                KeyToken::Char('d'),
                Action::DebugRow,
                "Debug | Log debug information about the highlighted row.",
            ),
    )
}

pub fn anitya_context() -> Context {
    searchable(
        Context::new("anitya", "ANITYA")
            .command(KeyToken::Char('q'), Action::Switch("main"), BACK_DOC)
            .command(KeyToken::Esc, Action::Switch("main"), BACK_DOC)
            .command(
                KeyToken::Char('o'),
                Action::OpenAnitya,
                "Open | Open the anitya project in your web browser.",
            )
            .command(
                KeyToken::Char('n'),
                Action::NewAnitya,
                "New | Add the project to release-monitoring.org.",
            )
            .command(
                KeyToken::Char('c'),
                Action::CheckAnitya,
                "Check | Force a check of the latest upstream release.",
            )
            .filter(
                KeyToken::Char('m'),
                Action::ToggleMismatchFilter,
                "Show Mismatches | Toggle showing only upstream/rawhide mismatches.",
            )
            .filter(
                KeyToken::Char('a'),
                Action::ToggleMissingFilter,
                "Show Missing | Toggle showing only packages missing from anitya.",
            ),
    )
}

pub fn build_context(branch: &str) -> Context {
    // Context names are static; rawhide is the only branch wired up so
    // far and the prompt carries the branch for the day more appear.
    debug_assert_eq!(branch, "rawhide");
    searchable(
        Context::new("build:rawhide", format!("BUILD ({branch})"))
            .command(KeyToken::Char('q'), Action::Switch("main"), BACK_DOC)
            .command(KeyToken::Esc, Action::Switch("main"), BACK_DOC)
            .command(
                KeyToken::Char('r'),
                Action::ScratchBuild,
                "Scratch | Kick off a scratch build of the package.",
            ),
    )
}

pub fn help_context() -> Context {
    Context::new("help", "HELP")
        .kind(ContextKind::Help)
        .command(
            KeyToken::Char('q'),
            Action::CloseHelp,
            "Back | Close this help menu.",
        )
        .command(KeyToken::Esc, Action::CloseHelp, "Back | Close this help menu.")
}

/// Every context of a session, `main` first.
pub fn all_contexts() -> Vec<Context> {
    vec![
        main_context(),
        anitya_context(),
        build_context("rawhide"),
        help_context(),
    ]
}
