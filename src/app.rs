//! Application assembly and the main loop: one synchronous UI turn per
//! iteration (drain scheduled notifier deliveries, draw, poll input),
//! with all long-latency work pushed onto the tokio runtime.

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::actions::Action;
use crate::config::Config;
use crate::context::{Controller, Dispatch, KeyResult};
use crate::contexts;
use crate::fetch;
use crate::keys::KeyToken;
use crate::logging::LogRingBuffer;
use crate::model::{MatchState, Nvr, PackageRow, PackageStore, PkgdbRecord, Row};
use crate::notify::{Emission, Notifier};
use crate::ui::render;
use crate::ui::UiState;
use crate::buildsys;

/// Upstream URL fragments mapped to the anitya backend they imply, used
/// to prefill the project-creation form.
const BACKEND_GUESSES: &[(&str, &str)] = &[
    ("ftp.debian.org", "Debian project"),
    ("github.com", "GitHub"),
    ("download.gnome.org", "GNOME"),
    ("ftp.gnu.org", "GNU project"),
    ("hackage.haskell.org", "Hackage"),
    ("launchpad.net", "launchpad"),
    ("www.npmjs.org", "npmjs"),
    ("packagist.org", "Packagist"),
    ("pear.php.net", "PEAR"),
    ("pecl.php.net", "PECL"),
    ("pypi.python.org", "PyPI"),
    ("rubygems.org", "Rubygems"),
    ("sourceforge.net", "Sourceforge"),
];

/// Distro packaging prefixes that rarely appear in the upstream name.
const NAME_PREFIXES: &[&str] = &["python-", "php-", "nodejs-", "rust-", "ghc-"];

pub struct App {
    pub config: Config,
    pub ui: UiState,
    pub controller: Controller,
    pub logs: LogRingBuffer,
    notifier: Notifier,
    emissions: UnboundedReceiver<Emission>,
    store: PackageStore,
    runtime: Handle,
    http: reqwest::Client,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, logs: LogRingBuffer, runtime: Handle) -> Result<Self> {
        let (mut notifier, emissions) = Notifier::new();
        let mut ui = UiState::new();
        let controller = Controller::new(contexts::all_contexts(), &mut ui);

        notifier.register("pkgdb", None, |payload: &Value| {
            let count = payload["point of contact"]
                .as_array()
                .map(Vec::len)
                .unwrap_or(0);
            info!(target: "model", "pkgdb reported {count} packages");
        })?;
        notifier.register("initialized", None, |_: &Value| {
            info!(target: "model", "initial data load complete");
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            config,
            ui,
            controller,
            logs,
            notifier,
            emissions,
            store: PackageStore::default(),
            runtime,
            http,
            should_quit: false,
        })
    }

    /// Launch the startup data-fetch tasks.
    pub fn start_fetchers(&self) {
        let handle = self.notifier.handle();
        let config = self.config.clone();
        self.runtime.spawn(async move {
            if let Err(err) = fetch::build_nvr_map(config, handle).await {
                warn!(target: "fetch", "rawhide map failed: {err:#}");
            }
        });

        let handle = self.notifier.handle();
        let config = self.config.clone();
        let client = self.http.clone();
        self.runtime.spawn(async move {
            if let Err(err) = fetch::load_packages(config, client, handle).await {
                warn!(target: "fetch", "package load failed: {err:#}");
            }
        });
    }

    /// One synchronous UI turn per iteration. Scheduled notifier
    /// deliveries always run at the top of a turn, never inside the
    /// keypress handling that produced them.
    pub fn run(&mut self, terminal: &mut render::Term) -> Result<()> {
        loop {
            while let Ok(emission) = self.emissions.try_recv() {
                self.on_emission(emission);
            }
            terminal.draw(|frame| render::draw(frame, self))?;
            if self.should_quit {
                return Ok(());
            }
            if event::poll(Duration::from_millis(100))? {
                let event = event::read()?;
                self.handle_event(&event);
            }
        }
    }

    pub fn handle_event(&mut self, event: &Event) {
        match self.controller.handle_event(event, &mut self.ui) {
            KeyResult::Handled => {}
            KeyResult::Dispatch(dispatch) => self.run_dispatch(dispatch),
            KeyResult::Unhandled(key) => self.default_keypress(key),
        }
    }

    /// Deliver one drained emission. Rows that no longer exist or events
    /// nobody subscribed to are silently fine; late callbacks from
    /// abandoned contexts must never crash the session.
    pub fn on_emission(&mut self, emission: Emission) {
        match (emission.event.as_str(), &emission.key) {
            ("pkgdb", None) => self.initialize_rows(&emission.payload),
            ("rawhide", Some(name)) => {
                if let Ok(nvr) = serde_json::from_value::<Nvr>(emission.payload.clone()) {
                    self.store.cache_nvr(name, nvr);
                }
            }
            _ => {}
        }

        if let Err(err) = self.notifier.deliver(&emission) {
            warn!(target: "notify", "dropping emission: {err}");
        }

        // Field updates can change what the installed filters accept.
        self.ui.list.filter_results();
        self.ui.clamp_selection();
    }

    /// Build the package rows from the pkgdb payload and subscribe each
    /// one to its keyed update events.
    fn initialize_rows(&mut self, payload: &Value) {
        let records: Vec<PkgdbRecord> =
            match serde_json::from_value(payload["point of contact"].clone()) {
                Ok(records) => records,
                Err(err) => {
                    warn!(target: "model", "unusable pkgdb payload: {err}");
                    return;
                }
            };

        for record in records {
            if self.store.get(&record.name).is_some() {
                continue;
            }
            let row = PackageRow::new(record);
            if let Some(nvr) = self.store.cached_nvr(row.name()) {
                row.set_rawhide(nvr.clone());
            }

            let rawhide_row = row.clone();
            let upstream_row = row.clone();
            let registrations = [
                self.notifier
                    .register("rawhide", Some(row.name()), move |payload: &Value| {
                        rawhide_row.apply_rawhide(payload);
                    }),
                self.notifier
                    .register("upstream", Some(row.name()), move |payload: &Value| {
                        upstream_row.apply_upstream(payload);
                    }),
            ];
            for result in registrations {
                if let Err(err) = result {
                    warn!(target: "notify", "row subscription failed: {err}");
                }
            }
            self.store.push(row);
        }

        let rows: Vec<Row> = self.store.rows().iter().cloned().map(Row::Package).collect();
        info!(target: "model", "tracking {} packages", rows.len());
        self.ui.set_base_rows(rows);
    }

    fn run_dispatch(&mut self, dispatch: Dispatch) {
        let targets: Vec<Row> = if dispatch.batch {
            self.ui.list.reference().cloned().collect()
        } else {
            self.ui.get_active_row().into_iter().collect()
        };
        debug!(
            target: "action",
            "running {:?} against {} row(s)",
            dispatch.action,
            targets.len()
        );
        // A failing action is logged and abandoned; the current context
        // stays whatever it was before the action ran.
        if let Err(err) = self.run_action(dispatch.action, targets) {
            warn!(target: "action", "{:?} failed: {err:#}", dispatch.action);
        }
    }

    fn run_action(&mut self, action: Action, targets: Vec<Row>) -> Result<()> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Switch(name) => self.controller.set_context(name, &mut self.ui),
            Action::CloseHelp => self.controller.set_context("main", &mut self.ui),
            Action::StartSearch => {
                if self.ui.list.initialized() {
                    self.ui.begin_search();
                }
            }
            Action::DebugRow => {
                for package in targets.iter().filter_map(Row::as_package) {
                    package.with(|p| {
                        info!(target: "model", "pkgdb: {:?}", p.pkgdb);
                        info!(target: "model", "upstream: {:?}", p.upstream);
                        info!(target: "model", "rawhide: {:?}", p.rawhide);
                    });
                }
            }
            Action::ToggleMismatchFilter => self.toggle_filter("anitya_mismatch", |row| {
                row.as_package()
                    .map(|p| p.with(|p| p.match_state() == MatchState::Mismatched))
                    .unwrap_or(false)
            }),
            Action::ToggleMissingFilter => self.toggle_filter("anitya_missing", |row| {
                row.as_package()
                    .map(|p| p.with(|p| p.upstream_display() == "(not found)"))
                    .unwrap_or(false)
            }),
            Action::OpenAnitya => {
                for package in targets.iter().filter_map(Row::as_package) {
                    self.open_anitya(package)?;
                }
            }
            Action::NewAnitya => {
                for package in targets.iter().filter_map(Row::as_package) {
                    self.new_anitya(package)?;
                }
            }
            Action::CheckAnitya => {
                for package in targets.iter().filter_map(Row::as_package) {
                    self.check_anitya(package);
                }
            }
            Action::ScratchBuild => {
                for package in targets.iter().filter_map(Row::as_package) {
                    self.scratch_build(package);
                }
            }
        }
        Ok(())
    }

    fn toggle_filter(&mut self, name: &str, predicate: fn(&Row) -> bool) {
        if self.ui.list.remove_filter(name).is_none() {
            self.ui.list.add_filter(name, Box::new(predicate));
        }
        self.ui.list.filter_results();
        self.ui.clamp_selection();
    }

    fn open_anitya(&self, package: &PackageRow) -> Result<()> {
        let id = package.with(|p| p.upstream.as_ref().and_then(|u| u.id));
        let url = match id {
            Some(id) => format!("{}/project/{id}", self.config.anitya_url),
            None => format!(
                "{}/projects/search/?pattern={}",
                self.config.anitya_url,
                package.name()
            ),
        };
        open_in_browser(&url)
    }

    /// Open a prefilled project-creation form, guessing the backend from
    /// the upstream URL and stripping distro packaging prefixes.
    fn new_anitya(&self, package: &PackageRow) -> Result<()> {
        let (mut name, homepage) =
            package.with(|p| (p.pkgdb.name.clone(), p.pkgdb.upstream_url.clone()));

        for prefix in NAME_PREFIXES {
            if let Some(stripped) = name.strip_prefix(prefix) {
                name = stripped.to_string();
                break;
            }
        }

        let backend = BACKEND_GUESSES
            .iter()
            .find(|(fragment, _)| homepage.contains(fragment))
            .map(|(_, backend)| *backend);
        if backend.is_some() {
            // When the backend is known the upstream name is usually the
            // last path segment of the homepage.
            if let Some(segment) = homepage.trim_end_matches('/').rsplit('/').next() {
                if !segment.is_empty() && !segment.contains('.') {
                    name = segment.to_string();
                }
            }
        }

        let mut params = vec![
            ("name", name),
            ("homepage", homepage),
            ("distro", "Fedora".to_string()),
            ("package_name", package.name().to_string()),
        ];
        if let Some(backend) = backend {
            params.push(("backend", backend.to_string()));
        }
        let url = reqwest::Url::parse_with_params(
            &format!("{}/project/new", self.config.anitya_url),
            &params,
        )?;
        open_in_browser(url.as_str())
    }

    fn check_anitya(&self, package: &PackageRow) {
        let Some(id) = package.with(|p| p.upstream.as_ref().and_then(|u| u.id)) else {
            info!(target: "fetch", "cannot check {}: anitya has no record of it", package.name());
            return;
        };
        let config = self.config.clone();
        let client = self.http.clone();
        let handle = self.notifier.handle();
        let name = package.name().to_string();
        self.runtime.spawn(async move {
            if let Err(err) = fetch::check_upstream(config, client, handle, name, id).await {
                warn!(target: "fetch", "upstream check failed: {err:#}");
            }
        });
    }

    fn scratch_build(&self, package: &PackageRow) {
        let upstream = package.with(|p| {
            p.upstream
                .as_ref()
                .and_then(|u| u.version.clone())
                .filter(|v| !v.is_empty())
        });
        let Some(upstream) = upstream else {
            warn!(
                target: "build",
                "cannot bump {}, no upstream version found",
                package.name()
            );
            return;
        };
        let config = self.config.build.clone();
        let handle = self.notifier.handle();
        let name = package.name().to_string();
        self.runtime.spawn(async move {
            if let Err(err) = buildsys::scratch_build(config, name, upstream, handle).await {
                warn!(target: "build", "scratch build failed: {err:#}");
            }
        });
    }

    /// Default cursor handling for keys no context wanted.
    fn default_keypress(&mut self, key: KeyToken) {
        match key {
            KeyToken::Up | KeyToken::Char('k') => self.ui.select_previous(),
            KeyToken::Down | KeyToken::Char('j') => self.ui.select_next(),
            KeyToken::PageUp => self.ui.page(-10),
            KeyToken::PageDown => self.ui.page(10),
            KeyToken::Home | KeyToken::Char('g') => self.ui.select_first(),
            KeyToken::End | KeyToken::Char('G') => self.ui.select_last(),
            _ => {}
        }
    }
}

/// Fire and forget; browsers write noise to stderr which would wreck the
/// display, so both streams are discarded.
fn open_in_browser(url: &str) -> Result<()> {
    info!(target: "action", "opening {url}");
    std::process::Command::new("xdg-open")
        .arg(url)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()?;
    Ok(())
}
