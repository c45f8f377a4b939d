//! The built-in `App` action group.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use super::registry::ActionGroup;
use super::types::{ActionContext, ActionSettingSpec, HotkeyAction, SettingType};
use crate::logging;

pub const APP_GROUP: &str = "App";
pub const LOG_PRESS_ACTION: &str = "LogPress";
pub const EXIT_ACTION: &str = "Exit";

/// `App.LogPress` and `App.Exit`. Exit only raises a flag; the runner's
/// event loop polls [`AppActions::exit_requested`].
#[derive(Debug, Clone, Default)]
pub struct AppActions {
    exit_requested: Arc<AtomicBool>,
}

impl AppActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::SeqCst)
    }
}

impl ActionGroup for AppActions {
    fn name(&self) -> &str {
        APP_GROUP
    }

    fn actions(&self) -> Vec<(String, Arc<dyn HotkeyAction>)> {
        let log_press: Arc<dyn HotkeyAction> = Arc::new(LogPress::new());
        let exit: Arc<dyn HotkeyAction> = Arc::new(Exit {
            flag: self.exit_requested.clone(),
        });
        vec![
            (LOG_PRESS_ACTION.to_string(), log_press),
            (EXIT_ACTION.to_string(), exit),
        ]
    }
}

struct LogPress {
    settings: [ActionSettingSpec; 1],
}

impl LogPress {
    fn new() -> Self {
        LogPress {
            settings: [ActionSettingSpec::new(
                "Message",
                SettingType::String,
                "Text written to the log with every press",
                "",
            )],
        }
    }
}

impl LogPress {
    fn line(ctx: &ActionContext<'_>) -> String {
        let message = ctx.setting("Message").unwrap_or_default();
        format!("{} [{}] pressed {}", ctx.hotkey, ctx.combo, message)
            .trim_end()
            .to_string()
    }
}

impl HotkeyAction for LogPress {
    fn invoke(&self, ctx: &ActionContext<'_>) -> bool {
        logging::log("ACTION", &Self::line(ctx));
        true
    }

    fn settings(&self) -> &[ActionSettingSpec] {
        &self.settings
    }

    fn description(&self) -> &str {
        "Log every press of the hotkey"
    }
}

struct Exit {
    flag: Arc<AtomicBool>,
}

impl HotkeyAction for Exit {
    fn invoke(&self, ctx: &ActionContext<'_>) -> bool {
        info!(event_type = "app_lifecycle", action = "exit_requested", hotkey = ctx.hotkey, "Exit requested");
        self.flag.store(true, Ordering::SeqCst);
        true
    }

    fn description(&self) -> &str {
        "Stop the hotkey runner"
    }
}
