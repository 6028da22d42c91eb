use std::{env, path::PathBuf, sync::Arc};

use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use finledger_config::ConfigManager;
use finledger_core::SystemClock;
use finledger_domain::OwnerId;
use finledger_storage_json::JsonLedgerStore;

use crate::{engine::FinanceEngine, session::StaticSession};

use super::{
    commands, output,
    registry::{CommandEntry, CommandRegistry},
    CliError, CommandError, LoopControl,
};

/// Owner id (UUID) the script acts as. Without it every command reports a sign-in error.
pub const OWNER_ENV: &str = "FINLEDGER_OWNER";
/// Overrides the configured JSON datastore path.
pub const DATA_ENV: &str = "FINLEDGER_DATA";

pub struct CliContext {
    pub(crate) engine: FinanceEngine,
    pub(crate) session: StaticSession,
    pub(crate) registry: CommandRegistry,
}

impl CliContext {
    pub fn new(engine: FinanceEngine, session: StaticSession) -> Self {
        Self {
            engine,
            session,
            registry: CommandRegistry::new(commands::all_entries()),
        }
    }

    /// Reads config through [`ConfigManager`], opens the datastore and resolves the owner.
    pub fn from_env() -> Result<Self, CliError> {
        let config = ConfigManager::from_env()?.load()?;
        output::set_color_enabled(config.ui_color_enabled);

        let data_file = env::var_os(DATA_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| config.resolve_data_file());
        info!(path = %data_file.display(), "opening ledger");
        let store = JsonLedgerStore::open(data_file)?;

        let session = match env::var(OWNER_ENV) {
            Ok(raw) if !raw.trim().is_empty() => {
                let id = Uuid::parse_str(raw.trim()).map_err(|err| {
                    CliError::Input(format!("{OWNER_ENV} is not a valid UUID: {err}"))
                })?;
                StaticSession::authenticated(OwnerId::from(id))
            }
            _ => {
                debug!("no owner configured; running anonymously");
                StaticSession::anonymous()
            }
        };

        let engine = FinanceEngine::new(Arc::new(store), Arc::new(SystemClock), config);
        Ok(Self::new(engine, session))
    }

    pub fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.handler(command) else {
            output::warning(format!(
                "Unknown command `{raw}`. Type `help` to see available commands."
            ));
            return Ok(LoopControl::Continue);
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::info("Use `help <command>` for usage details.");
            }
            CommandError::Engine(err) if err.is_benign() => output::info(err.user_message()),
            CommandError::Engine(err) => {
                debug!(error = %err, "command failed");
                output::error(err.user_message());
            }
            other => output::error(other.to_string()),
        }
    }

    pub(crate) fn money(&self, amount: Decimal) -> String {
        format!("{:.2} {}", amount, self.engine.config().currency)
    }
}
