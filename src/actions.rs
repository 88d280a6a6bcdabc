/// Everything a key binding can trigger. Resolution happens in the
/// context maps; execution happens at the application level so actions
/// can reach the list view, the notifier, and the background runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// End the process. Not a state transition.
    Quit,
    /// Switch the controller to the named context.
    Switch(&'static str),
    /// Leave the help view, restoring the stashed rows.
    CloseHelp,
    /// Log what we know about the target rows.
    DebugRow,
    /// Open the anitya project page (or a search page) in the browser.
    OpenAnitya,
    /// Open a prefilled anitya project-creation page in the browser.
    NewAnitya,
    /// Ask anitya to re-check the latest upstream release.
    CheckAnitya,
    /// Kick off a scratch build of the target package.
    ScratchBuild,
    /// Open the incremental search prompt.
    StartSearch,
    /// Toggle the "only upstream/rawhide mismatches" filter.
    ToggleMismatchFilter,
    /// Toggle the "only packages missing from anitya" filter.
    ToggleMissingFilter,
}
