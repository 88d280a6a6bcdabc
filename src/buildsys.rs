//! Scratch-build pipeline: clone dist-git, bump the spec to the latest
//! upstream release, assemble an SRPM, and hand it to koji. Runs as a
//! background task; every step logs through tracing so the pipeline is
//! visible in the log pane.

use std::path::Path;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use serde_json::json;
use tokio::process::Command;
use tracing::info;

use crate::config::BuildConfig;
use crate::notify::NotifierHandle;

async fn run(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<String> {
    info!(target: "build", "running {program} {}", args.join(" "));
    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let output = command
        .output()
        .await
        .with_context(|| format!("spawning {program}"))?;
    if !output.status.success() {
        bail!(
            "{program} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Kick off one scratch build. `upstream` is the version the spec gets
/// bumped to; the caller has already checked it is known.
pub async fn scratch_build(
    config: BuildConfig,
    package: String,
    upstream: String,
    notifier: NotifierHandle,
) -> Result<()> {
    let workspace = tempfile::Builder::new()
        .prefix("pkgdash-")
        .tempdir_in("/var/tmp")
        .context("creating build workspace")?;
    let dir = workspace.path();

    let url = config.dist_git_url.replace("{package}", &package);
    info!(target: "build", "cloning {url} into {}", dir.display());
    run("git", &["clone", &url, &dir.to_string_lossy()], None).await?;

    let specfile = dir.join(format!("{package}.spec"));
    let spec = specfile.to_string_lossy().into_owned();
    let comment = format!("Latest upstream, {upstream}");

    // Needs rpmdevtools >= 8.5 for --new.
    run(
        "rpmdev-bumpspec",
        &[
            "--new",
            &upstream,
            "-c",
            &comment,
            "-u",
            &config.git_userstring,
            &spec,
        ],
        None,
    )
    .await?;

    // Patches and existing sources from dist-git, then the new upstream
    // tarball, then the SRPM, all inside the workspace.
    run("fedpkg", &["sources"], Some(dir)).await?;
    run("spectool", &["-g", &spec], Some(dir)).await?;
    let output = run(
        "rpmbuild",
        &[
            "-D", "%_topdir .",
            "-D", "%_sourcedir .",
            "-D", "%_srcrpmdir .",
            "-bs", &spec,
        ],
        Some(dir),
    )
    .await?;

    let Some(srpm) = output.split_whitespace().last() else {
        bail!("rpmbuild reported no SRPM for {package}");
    };
    let srpm = dir.join(srpm.trim_start_matches("./"));

    let submission = run(
        "koji",
        &[
            "build",
            "--scratch",
            "--nowait",
            &config.koji_target,
            &srpm.to_string_lossy(),
        ],
        None,
    )
    .await?;
    info!(target: "build", "scratch build submitted for {package}: {}", submission.trim());

    notifier.signal(
        "build",
        Some(&package),
        json!({ "target": config.koji_target, "upstream": upstream }),
    );
    Ok(())
}
