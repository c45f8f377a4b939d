//! Hotkey Kit runner
//!
//! Loads the saved hotkeys (or the configured defaults), registers them and
//! dispatches presses until the `App.Exit` action fires.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing::{info, warn};

use hotkey_kit::actions::{ActionRegistry, AppActions};
use hotkey_kit::config::{self, Config};
use hotkey_kit::hotkeys::{
    HostMessage, HotkeyCollection, HotkeyService, HotkeyStore, JsonFileStore,
};
use hotkey_kit::logging;

#[derive(Parser)]
#[command(name = "hotkey-kit")]
#[command(version)]
#[command(about = "System-wide hotkeys bound to named actions", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.hotkey-kit/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the saved hotkeys and exit
    #[arg(short, long)]
    list: bool,

    /// Replace the saved hotkeys with the configured defaults
    #[arg(long)]
    reset: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref());
    let _guard = logging::init(&config);

    info!(
        event_type = "app_start",
        store = %config.get_store_path().display(),
        "Hotkey Kit starting"
    );

    let mut store = JsonFileStore::new(config.get_store_path(), config.get_separator());

    if cli.list {
        return list(&mut store, config.get_separator(), &mut io::stdout().lock());
    }

    let app = AppActions::new();
    let mut actions = ActionRegistry::new();
    actions.register_group(&app);

    let result = run(&cli, &config, app, actions, store);
    if let Err(e) = &result {
        tracing::error!(event_type = "app_exit", error = %e, "Hotkey Kit failed");
        eprintln!("Recent activity:");
        for line in logging::recent_logs() {
            eprintln!("  {}", line);
        }
    }
    result
}

fn list(store: &mut JsonFileStore, separator: char, out: &mut impl Write) -> anyhow::Result<()> {
    let records = store
        .load()
        .with_context(|| format!("reading {}", store.path().display()))?;
    match records {
        Some(records) => {
            for record in records {
                writeln!(out, "{}", record.to_line(separator))?;
            }
        }
        None => writeln!(out, "No saved hotkeys at {}", store.path().display())?,
    }
    Ok(())
}

/// Fill the collection from the store, falling back to the defaults when
/// nothing is saved or `--reset` was given.
fn populate<S: HotkeyService, St: HotkeyStore>(
    collection: &mut HotkeyCollection<S, St>,
    cli: &Cli,
    config: &Config,
) -> anyhow::Result<()> {
    let loaded = if cli.reset {
        false
    } else {
        match collection.load() {
            Ok(loaded) => loaded,
            Err(e) => {
                logging::log_error("Loading saved hotkeys", &e);
                warn!("Saved hotkeys unreadable, restoring defaults");
                false
            }
        }
    };
    if !loaded {
        collection
            .reset(&config.get_default_hotkeys())
            .context("restoring default hotkeys")?;
    }

    for (_, hotkey) in collection.iter() {
        info!(
            name = hotkey.name(),
            combo = %hotkey.combo(),
            status = ?hotkey.status(),
            action = hotkey.action_id().unwrap_or(""),
            "Hotkey ready"
        );
    }
    Ok(())
}

#[cfg(not(windows))]
fn run(
    cli: &Cli,
    config: &Config,
    app: AppActions,
    actions: ActionRegistry,
    store: JsonFileStore,
) -> anyhow::Result<()> {
    use std::time::Duration;

    use hotkey_kit::platform::GlobalHotkeyService;

    const POLL_INTERVAL: Duration = Duration::from_millis(100);

    let service = GlobalHotkeyService::new().context("creating the hotkey manager")?;
    let owner = service.owner();
    let mut collection = HotkeyCollection::from_config(service, owner, store, actions, config)?;
    populate(&mut collection, cli, config)?;

    while !app.exit_requested() {
        let Some(message) = collection.context().service().poll(POLL_INTERVAL) else {
            continue;
        };
        dispatch(&mut collection, &message);
    }

    collection.shutdown();
    info!(event_type = "app_exit", "Hotkey Kit stopped");
    Ok(())
}

#[cfg(windows)]
fn run(
    cli: &Cli,
    config: &Config,
    app: AppActions,
    actions: ActionRegistry,
    store: JsonFileStore,
) -> anyhow::Result<()> {
    use hotkey_kit::platform::win32::{self, Win32HotkeyService, THREAD_OWNER};

    let mut collection = HotkeyCollection::from_config(
        Win32HotkeyService::new(),
        THREAD_OWNER,
        store,
        actions,
        config,
    )?;
    populate(&mut collection, cli, config)?;

    while !app.exit_requested() {
        if !win32::wait_message(|message| dispatch(&mut collection, message)) {
            break;
        }
    }

    collection.shutdown();
    info!(event_type = "app_exit", "Hotkey Kit stopped");
    Ok(())
}

fn dispatch<S: HotkeyService, St: HotkeyStore>(
    collection: &mut HotkeyCollection<S, St>,
    message: &HostMessage,
) -> bool {
    let handled = collection.dispatch(message);
    if !handled && message.is_hotkey() {
        warn!(id = message.id, "Hotkey press not handled");
    }
    handled
}
