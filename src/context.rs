use std::collections::HashMap;

use crossterm::event::{Event, KeyEventKind};
use tracing::{debug, warn};

use crate::actions::Action;
use crate::help;
use crate::keys::KeyToken;
use crate::ui::state::UiState;

/// An action bound to a key, with its two-part `"Short | Long"` doc
/// string. The doc is parsed lazily, at help-build time.
pub struct CommandSpec {
    pub action: Action,
    pub doc: &'static str,
}

/// What one member of the mixin chain did with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixinOutcome {
    Handled,
    Pass,
}

/// A composable keypress behavior consulted before the context's own
/// command tables. Mixins run in the order the context declares them.
pub trait KeyMixin: Send {
    fn keypress(&mut self, key: KeyToken, ui: &mut UiState) -> MixinOutcome;
}

/// A resolved command: which action to run and whether it applies to the
/// whole visible list instead of just the focused row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub action: Action,
    pub batch: bool,
}

/// Result of routing one key through the active context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    /// Consumed by a mixin; nothing further to do.
    Handled,
    /// Resolved to a command or filter toggle for the caller to execute.
    Dispatch(Dispatch),
    /// Nobody wanted it; the caller applies default list navigation.
    Unhandled(KeyToken),
}

/// Which `assume_primacy` behavior a context carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Plain,
    Help,
}

/// A named interaction mode with its own command and filter key tables.
/// The maps are populated at construction and immutable afterwards.
pub struct Context {
    name: &'static str,
    prompt: String,
    kind: ContextKind,
    commands: HashMap<KeyToken, CommandSpec>,
    filters: HashMap<KeyToken, CommandSpec>,
    mixins: Vec<Box<dyn KeyMixin>>,
}

impl Context {
    pub fn new(name: &'static str, prompt: impl Into<String>) -> Self {
        Self {
            name,
            prompt: prompt.into(),
            kind: ContextKind::Plain,
            commands: HashMap::new(),
            filters: HashMap::new(),
            mixins: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: ContextKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn command(mut self, key: KeyToken, action: Action, doc: &'static str) -> Self {
        self.commands.insert(key, CommandSpec { action, doc });
        self
    }

    pub fn filter(mut self, key: KeyToken, action: Action, doc: &'static str) -> Self {
        self.filters.insert(key, CommandSpec { action, doc });
        self
    }

    pub fn mixin(mut self, mixin: impl KeyMixin + 'static) -> Self {
        self.mixins.push(Box::new(mixin));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn context_kind(&self) -> ContextKind {
        self.kind
    }

    pub fn commands(&self) -> impl Iterator<Item = (&KeyToken, &CommandSpec)> {
        self.commands.iter()
    }

    pub fn filters(&self) -> impl Iterator<Item = (&KeyToken, &CommandSpec)> {
        self.filters.iter()
    }

    /// Route one key. Resolution order: mixin chain, exact command match,
    /// case-folded batch match, filter match, unhandled.
    pub fn keypress(&mut self, key: KeyToken, ui: &mut UiState) -> KeyResult {
        for mixin in self.mixins.iter_mut() {
            if mixin.keypress(key, ui) == MixinOutcome::Handled {
                return KeyResult::Handled;
            }
        }

        if let Some(spec) = self.commands.get(&key) {
            return KeyResult::Dispatch(Dispatch {
                action: spec.action,
                batch: false,
            });
        }

        // An uppercase letter folds to its lowercase command and applies
        // it to every visible row. A literal uppercase binding wins, per
        // the exact match above.
        if let Some(folded) = key.case_folded() {
            if let Some(spec) = self.commands.get(&folded) {
                return KeyResult::Dispatch(Dispatch {
                    action: spec.action,
                    batch: true,
                });
            }
        }

        if let Some(spec) = self.filters.get(&key) {
            return KeyResult::Dispatch(Dispatch {
                action: spec.action,
                batch: false,
            });
        }

        KeyResult::Unhandled(key)
    }
}

/// Incremental-search behavior shared by the list-backed contexts.
///
/// While the pattern buffer is accepting, every key is a pattern edit:
/// printable characters append, backspace trims, enter commits the
/// filtered view, esc cancels and removes the filter. The buffer itself
/// lives in [`UiState`] so it survives context switches the same way the
/// installed filter does.
pub struct Searchable;

impl KeyMixin for Searchable {
    fn keypress(&mut self, key: KeyToken, ui: &mut UiState) -> MixinOutcome {
        if !ui.list.initialized() {
            return MixinOutcome::Pass;
        }

        match key {
            KeyToken::Esc => {
                let was_accepting = ui.search.is_accepting();
                let removed = ui.end_search(true);
                if removed || was_accepting {
                    MixinOutcome::Handled
                } else {
                    MixinOutcome::Pass
                }
            }
            _ if !ui.search.is_accepting() => MixinOutcome::Pass,
            KeyToken::Enter => {
                ui.end_search(false);
                MixinOutcome::Handled
            }
            KeyToken::Backspace => {
                if ui.search.backspace() {
                    ui.apply_search_pattern();
                } else {
                    ui.end_search(true);
                }
                MixinOutcome::Handled
            }
            KeyToken::Char(c) => {
                ui.search.push(c);
                ui.apply_search_pattern();
                MixinOutcome::Handled
            }
            // Swallow navigation keys while the prompt is open.
            _ => MixinOutcome::Handled,
        }
    }
}

/// Owns the context table and the notion of "current context". All raw
/// input flows through here.
pub struct Controller {
    contexts: Vec<Context>,
    current: usize,
}

impl Controller {
    /// Assemble the controller and activate the `main` context.
    pub fn new(contexts: Vec<Context>, ui: &mut UiState) -> Self {
        let mut controller = Self {
            contexts,
            current: 0,
        };
        controller.set_context("main", ui);
        controller
    }

    pub fn current(&self) -> &'static str {
        self.contexts[self.current].name()
    }

    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    /// Switch the active context, run its `assume_primacy` behavior, and
    /// push freshly derived command/filter summaries to the status bars.
    pub fn set_context(&mut self, name: &str, ui: &mut UiState) {
        let Some(index) = self.contexts.iter().position(|c| c.name() == name) else {
            warn!(target: "context", "unknown context {name:?}");
            return;
        };

        let table = help::build_table(self.contexts.iter());
        let leaving_help =
            self.contexts[self.current].context_kind() == ContextKind::Help && index != self.current;
        self.current = index;

        if leaving_help {
            ui.restore_rows();
        }

        let context = &self.contexts[index];
        debug!(target: "context", "{} assuming primacy", context.name());
        if context.context_kind() == ContextKind::Help {
            // An open search prompt is transient state; cancel it rather
            // than letting it edit a pattern nobody can see. Committed
            // filters survive inside the stash.
            if ui.search.is_accepting() {
                ui.end_search(true);
            }
            for err in &table.malformed {
                warn!(target: "help", "{err}");
            }
            ui.show_generated_rows(help::doc_rows(&table));
        }

        ui.set_summaries(
            context.prompt(),
            help::short_command_summary(&table, context.name()),
            help::short_filter_summary(&table, context.name()),
        );
    }

    /// Raw input entry point. Pointer (mouse) events are discarded here;
    /// key presses are forwarded verbatim to the active context.
    pub fn handle_event(&mut self, event: &Event, ui: &mut UiState) -> KeyResult {
        match event {
            Event::Mouse(_) => KeyResult::Handled,
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                match KeyToken::from_event(key) {
                    Some(token) => self.keypress(token, ui),
                    None => KeyResult::Handled,
                }
            }
            _ => KeyResult::Handled,
        }
    }

    pub fn keypress(&mut self, key: KeyToken, ui: &mut UiState) -> KeyResult {
        debug!(target: "context", "{} got key {:?}", self.current(), key);
        self.contexts[self.current].keypress(key, ui)
    }
}
