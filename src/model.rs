use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// One package record from the pkgdb API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PkgdbRecord {
    pub name: String,
    #[serde(default)]
    pub upstream_url: String,
    #[serde(default)]
    pub summary: String,
}

/// Name-version-release of the latest rawhide build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Nvr {
    pub version: String,
    pub release: String,
}

/// Upstream project record from release-monitoring.org.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamProject {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Agreement between the upstream release and the rawhide build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    Unknown,
    Matched,
    Mismatched,
}

impl MatchState {
    pub fn marker(&self) -> &'static str {
        match self {
            MatchState::Unknown => "?",
            MatchState::Matched => "\u{2713}",
            MatchState::Mismatched => "\u{2717}",
        }
    }
}

/// Mutable package state: what we know so far about one tracked package.
#[derive(Debug, Default)]
pub struct Package {
    pub pkgdb: PkgdbRecord,
    pub upstream: Option<UpstreamProject>,
    pub rawhide: Option<Nvr>,
}

impl Package {
    pub fn upstream_display(&self) -> String {
        match &self.upstream {
            None => "(loading...)".to_string(),
            Some(project) => match &project.version {
                None => "(not found)".to_string(),
                Some(v) if v.is_empty() => "(not checked)".to_string(),
                Some(v) => v.clone(),
            },
        }
    }

    pub fn rawhide_display(&self) -> String {
        match &self.rawhide {
            None => "(loading...)".to_string(),
            Some(nvr) => nvr.version.clone(),
        }
    }

    pub fn match_state(&self) -> MatchState {
        let upstream = self.upstream_display();
        let rawhide = self.rawhide_display();
        if upstream.starts_with('(') || rawhide.starts_with('(') {
            MatchState::Unknown
        } else if upstream == rawhide {
            MatchState::Matched
        } else {
            MatchState::Mismatched
        }
    }
}

/// A displayable package row. The state sits behind a shared handle so
/// notifier callbacks registered against this package can update fields
/// while the list view keeps its own clone.
#[derive(Clone)]
pub struct PackageRow {
    name: String,
    inner: Arc<Mutex<Package>>,
}

impl PackageRow {
    pub fn new(pkgdb: PkgdbRecord) -> Self {
        let name = pkgdb.name.clone();
        Self {
            name,
            inner: Arc::new(Mutex::new(Package {
                pkgdb,
                upstream: None,
                rawhide: None,
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read access under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&Package) -> R) -> R {
        f(&self.inner.lock().unwrap())
    }

    pub fn set_upstream(&self, project: UpstreamProject) {
        self.inner.lock().unwrap().upstream = Some(project);
    }

    pub fn set_rawhide(&self, nvr: Nvr) {
        self.inner.lock().unwrap().rawhide = Some(nvr);
    }

    /// Notifier callback entry point for `upstream` signals.
    pub fn apply_upstream(&self, payload: &Value) {
        match serde_json::from_value::<UpstreamProject>(payload.clone()) {
            Ok(project) => self.set_upstream(project),
            Err(err) => {
                warn!(target: "model", "bad upstream payload for {}: {}", self.name, err)
            }
        }
    }

    /// Notifier callback entry point for `rawhide` signals.
    pub fn apply_rawhide(&self, payload: &Value) {
        match serde_json::from_value::<Nvr>(payload.clone()) {
            Ok(nvr) => self.set_rawhide(nvr),
            Err(err) => {
                warn!(target: "model", "bad rawhide payload for {}: {}", self.name, err)
            }
        }
    }
}

impl std::fmt::Debug for PackageRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<PackageRow {:?}>", self.name)
    }
}

/// One line of the generated help table. A row with an empty `keys` field
/// is a context heading.
#[derive(Debug, Clone)]
pub struct DocRow {
    pub section: String,
    pub keys: String,
    pub doc: String,
}

/// Anything the filterable list can display.
#[derive(Debug, Clone)]
pub enum Row {
    Package(PackageRow),
    Doc(DocRow),
}

impl Row {
    /// The name text-search predicates match against.
    pub fn name(&self) -> &str {
        match self {
            Row::Package(row) => row.name(),
            Row::Doc(row) => &row.doc,
        }
    }

    pub fn as_package(&self) -> Option<&PackageRow> {
        match self {
            Row::Package(row) => Some(row),
            Row::Doc(_) => None,
        }
    }
}

/// Ordered set of tracked packages plus the rawhide NVR cache. The cache
/// lets rows created after the repoquery pass pick up their build version
/// immediately instead of waiting for the next signal.
#[derive(Default)]
pub struct PackageStore {
    rows: Vec<PackageRow>,
    by_name: HashMap<String, usize>,
    nvrs: HashMap<String, Nvr>,
}

impl PackageStore {
    pub fn push(&mut self, row: PackageRow) {
        self.by_name.insert(row.name().to_string(), self.rows.len());
        self.rows.push(row);
    }

    pub fn get(&self, name: &str) -> Option<&PackageRow> {
        self.by_name.get(name).map(|&index| &self.rows[index])
    }

    pub fn rows(&self) -> &[PackageRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cache_nvr(&mut self, name: &str, nvr: Nvr) {
        self.nvrs.insert(name.to_string(), nvr);
    }

    pub fn cached_nvr(&self, name: &str) -> Option<&Nvr> {
        self.nvrs.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(name: &str) -> PackageRow {
        PackageRow::new(PkgdbRecord {
            name: name.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn match_state_tracks_version_agreement() {
        let package = row("nethack");
        assert_eq!(package.with(|p| p.match_state()), MatchState::Unknown);

        package.apply_upstream(&json!({"id": 7, "version": "3.6.7"}));
        package.apply_rawhide(&json!({"version": "3.6.7", "release": "1.fc41"}));
        assert_eq!(package.with(|p| p.match_state()), MatchState::Matched);

        package.apply_rawhide(&json!({"version": "3.6.6", "release": "2.fc41"}));
        assert_eq!(package.with(|p| p.match_state()), MatchState::Mismatched);
    }

    #[test]
    fn upstream_without_version_reads_not_found() {
        let package = row("left-pad");
        package.apply_upstream(&json!({}));
        assert_eq!(package.with(|p| p.upstream_display()), "(not found)");
        package.apply_upstream(&json!({"id": 1, "version": ""}));
        assert_eq!(package.with(|p| p.upstream_display()), "(not checked)");
    }

    #[test]
    fn clones_share_state() {
        let package = row("zsh");
        let other = package.clone();
        package.apply_rawhide(&json!({"version": "5.9", "release": "3.fc41"}));
        assert_eq!(other.with(|p| p.rawhide_display()), "5.9");
    }

    #[test]
    fn store_caches_nvrs_for_late_rows() {
        let mut store = PackageStore::default();
        store.cache_nvr(
            "zsh",
            Nvr {
                version: "5.9".into(),
                release: "3.fc41".into(),
            },
        );
        let package = row("zsh");
        if let Some(nvr) = store.cached_nvr("zsh") {
            package.set_rawhide(nvr.clone());
        }
        store.push(package);
        assert_eq!(store.get("zsh").unwrap().with(|p| p.rawhide_display()), "5.9");
    }
}
