use anyhow::Result;
use tracing::info;

use pkgdash::app::App;
use pkgdash::config::Config;
use pkgdash::logging;
use pkgdash::ui::render;

fn main() -> Result<()> {
    let config = Config::load()?;
    let logs = logging::init_tracing(1000);
    info!(target: "main", "pkgdash starting for {}", config.username);

    let runtime = tokio::runtime::Runtime::new()?;
    let mut app = App::new(config, logs.clone(), runtime.handle().clone())?;
    app.start_fetchers();

    let mut terminal = render::setup_terminal()?;
    let result = app.run(&mut terminal);
    render::restore_terminal(&mut terminal)?;

    // The alternate screen ate the log pane; replay the tail so a crash
    // or a plain quit leaves something to read.
    for entry in app.logs.recent(app.config.logsize) {
        eprintln!("{}", entry.format_for_display());
    }

    result
}
