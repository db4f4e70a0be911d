//! Application context for the Biblio CLI.
//!
//! Bundles the parsed arguments with the config file, the output context and
//! a lazily opened store.

use std::path::PathBuf;
use std::sync::Arc;

use dialoguer::Confirm;
use once_cell::unsync::OnceCell;

use biblio_core::access::is_privileged;
use biblio_core::storage::{Member, MemberStore, SqliteStore};
use biblio_core::{Clock, FixedClock, SystemClock};

use crate::cli::Cli;
use crate::config::{read_config, BiblioConfig, DEFAULT_LOAN_DAYS, MAX_LOAN_DAYS};
use crate::errors::CliError;
use crate::helpers::parse_date;
use crate::ui::{UiContext, UiFlags};

use super::resolver::{missing_library_message, resolve_config_path, resolve_library_path};

pub struct AppContext<'a> {
    cli: &'a Cli,
    config_path: PathBuf,
    config: Option<BiblioConfig>,
    ui: UiContext,
    store: OnceCell<SqliteStore>,
    actor: OnceCell<Option<Member>>,
}

impl<'a> AppContext<'a> {
    /// Read the config file if there is one and detect the terminal.
    pub fn new(cli: &'a Cli) -> anyhow::Result<Self> {
        let config_path = resolve_config_path()?;
        let config = if config_path.exists() {
            Some(read_config(&config_path)?)
        } else {
            None
        };
        let flags = UiFlags {
            json: cli.json,
            format: cli.format.as_deref(),
            no_color: cli.no_color,
            ascii: cli.ascii,
        };
        let configured_format = config.as_ref().and_then(|c| c.ui.format.as_deref());
        let ui = UiContext::from_env(flags, configured_format);

        Ok(Self {
            cli,
            config_path,
            config,
            ui,
            store: OnceCell::new(),
            actor: OnceCell::new(),
        })
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    pub fn ui(&self) -> &UiContext {
        &self.ui
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Default and maximum loan length in days.
    pub fn loan_days(&self) -> (u32, u32) {
        match &self.config {
            Some(config) => (config.loans.default_loan_days, config.loans.max_loan_days),
            None => (DEFAULT_LOAN_DAYS, MAX_LOAN_DAYS),
        }
    }

    pub fn library_path(&self) -> anyhow::Result<PathBuf> {
        resolve_library_path(
            self.cli.db.as_deref(),
            self.config.as_ref(),
            &self.config_path,
        )
    }

    /// Clock honouring `--today`.
    pub fn clock(&self) -> anyhow::Result<Arc<dyn Clock>> {
        match self.cli.today.as_deref() {
            Some(value) => Ok(Arc::new(FixedClock::new(parse_date(value)?))),
            None => Ok(Arc::new(SystemClock)),
        }
    }

    /// Open the library, once per invocation.
    pub fn store(&self) -> anyhow::Result<&SqliteStore> {
        self.store.get_or_try_init(|| -> anyhow::Result<SqliteStore> {
            let path = self.library_path()?;
            if !path.exists() {
                return Err(CliError::not_found(missing_library_message(&path), "").into());
            }
            Ok(SqliteStore::open(&path)?.with_clock(self.clock()?))
        })
    }

    /// The member named by `--as`, if any.
    pub fn actor(&self) -> anyhow::Result<Option<&Member>> {
        let actor = self.actor.get_or_try_init(|| -> anyhow::Result<Option<Member>> {
            let Some(email) = self.cli.as_member.as_deref() else {
                return Ok(None);
            };
            let member = self.store()?.get_member_by_email(email)?.ok_or_else(|| {
                CliError::not_found(
                    format!("No member with email {} to act as", email.trim()),
                    "Run:\n  biblio member list",
                )
            })?;
            tracing::debug!(member_id = %member.id, role = %member.role, "acting as member");
            Ok(Some(member))
        })?;
        Ok(actor.as_ref())
    }

    /// Refuse catalog and admin operations for a non-admin `--as` member.
    ///
    /// Without `--as` the local operator is trusted.
    pub fn require_privileged(&self, action: &str) -> anyhow::Result<()> {
        match self.actor()? {
            Some(actor) if !is_privileged(actor) => Err(CliError::permission_denied(format!(
                "{} may not {}",
                actor.email, action
            ))
            .into()),
            _ => Ok(()),
        }
    }

    /// Ask before a destructive action.
    ///
    /// `--yes` skips the prompt. Without a terminal there is no one to ask,
    /// so the action is refused.
    pub fn confirm(&self, prompt: &str) -> anyhow::Result<bool> {
        if self.cli.yes {
            return Ok(true);
        }
        if !self.ui.interactive {
            return Err(CliError::invalid_input(format!(
                "{} Re-run with --yes to confirm.",
                prompt
            ))
            .into());
        }
        Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
    }
}
