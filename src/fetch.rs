//! The data-fetch collaborators. Everything here runs as background
//! tokio tasks and reports back exclusively through notifier signals;
//! the display side never polls these sources.

use std::time::Instant;

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::Config;
use crate::notify::NotifierHandle;

/// Build the rawhide name -> (version, release) table by running
/// repoquery over the source repo, signalling `rawhide` per package.
pub async fn build_nvr_map(config: Config, notifier: NotifierHandle) -> Result<()> {
    let args = [
        "--quiet",
        &format!("--config={}", config.yum_conf),
        "--archlist=src",
        "--all",
        "--qf",
        "%{name}\t%{version}\t%{release}",
    ];
    info!(target: "fetch", "running repoquery {}", args.join(" "));

    let start = Instant::now();
    let output = Command::new("repoquery")
        .args(args)
        .output()
        .await
        .context("spawning repoquery")?;
    if !output.status.success() {
        bail!(
            "repoquery failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    info!(target: "fetch", "repoquery finished in {:.0?}", start.elapsed());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut count = 0usize;
    for line in stdout.lines() {
        let line = line.trim().trim_matches('\'');
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(name), Some(version), Some(release)) =
            (fields.next(), fields.next(), fields.next())
        else {
            warn!(target: "fetch", "unparseable repoquery line: {line:?}");
            continue;
        };
        notifier.signal(
            "rawhide",
            Some(name),
            json!({ "version": version, "release": release }),
        );
        count += 1;
    }
    info!(target: "fetch", "rawhide map built with {count} entries");
    Ok(())
}

/// Load the maintainer's packages from pkgdb, then fan out one upstream
/// query per package to anitya. Signals: unkeyed `pkgdb` with the raw
/// package list, keyed `upstream` per package, unkeyed `initialized`
/// once everything has been asked at least once.
pub async fn load_packages(
    config: Config,
    client: reqwest::Client,
    notifier: NotifierHandle,
) -> Result<()> {
    let url = format!(
        "{}/api/packager/package/{}",
        config.pkgdb_url, config.username
    );
    info!(target: "fetch", "loading packages from {url}");
    let start = Instant::now();

    let payload: Value = client
        .get(&url)
        .send()
        .await
        .context("querying pkgdb")?
        .error_for_status()?
        .json()
        .await
        .context("decoding pkgdb response")?;

    let names: Vec<String> = payload["point of contact"]
        .as_array()
        .map(|records| {
            records
                .iter()
                .filter_map(|r| r["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    info!(
        target: "fetch",
        "found {} packages in {:.0?}",
        names.len(),
        start.elapsed()
    );
    notifier.signal("pkgdb", None, payload);

    for name in &names {
        let url = format!("{}/api/project/Fedora/{}", config.anitya_url, name);
        let project = match client.get(&url).send().await {
            Ok(response) => response.json::<Value>().await.unwrap_or_else(|err| {
                warn!(target: "fetch", "bad anitya payload for {name}: {err}");
                json!({})
            }),
            Err(err) => {
                warn!(target: "fetch", "anitya request for {name} failed: {err}");
                json!({})
            }
        };
        notifier.signal("upstream", Some(name), project);
    }

    notifier.signal("initialized", None, Value::Null);
    info!(target: "fetch", "done loading data in {:.0?}", start.elapsed());
    Ok(())
}

/// Ask anitya to re-check the latest upstream release of one project,
/// signalling the fresh record on success.
pub async fn check_upstream(
    config: Config,
    client: reqwest::Client,
    notifier: NotifierHandle,
    package: String,
    project_id: u64,
) -> Result<()> {
    let url = format!("{}/api/version/get", config.anitya_url);
    let response: Value = client
        .post(&url)
        .form(&[("id", project_id.to_string())])
        .send()
        .await
        .context("querying anitya")?
        .json()
        .await
        .context("decoding anitya response")?;

    if let Some(error) = response.get("error") {
        warn!(target: "fetch", "anitya error for {package}: {error}");
    } else {
        notifier.signal("upstream", Some(&package), response);
    }
    Ok(())
}
