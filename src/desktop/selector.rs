//! Desktop resolution for one login

use thiserror::Error;
use tracing::{debug, info, warn};

use super::{DesktopCatalog, DesktopSelection, DesktopStore, UserDesktopState};
use crate::auth::Identity;
use crate::config::LoginConfig;
use crate::error::LoginError;

/// How the presenter may answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// An explicit choice is required; there is no default
    Forced,
    /// Accepting the offered default is allowed
    Free,
}

/// Presenter failures
#[derive(Error, Debug)]
pub enum SelectionError {
    /// Nothing to choose from
    #[error("No desktop entries available")]
    NoEntries,

    /// Input closed or too many invalid answers
    #[error("Desktop selection cancelled")]
    Cancelled,

    /// Terminal I/O failed
    #[error("Desktop menu I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Interactive desktop chooser
pub trait DesktopPresenter {
    /// Pick one of `entries`. `default` is only offered in [`SelectionMode::Free`].
    fn choose(
        &mut self,
        entries: &[DesktopSelection],
        mode: SelectionMode,
        default: Option<&DesktopSelection>,
    ) -> Result<DesktopSelection, SelectionError>;
}

/// Outcome of desktop selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDesktop {
    /// Leaf selection to launch
    pub selection: DesktopSelection,
    /// Language from the user's preferences, overriding `session.lang`
    pub lang_override: Option<String>,
}

/// Picks the desktop for an authenticated user
pub struct DesktopSelector {
    catalog: DesktopCatalog,
    store: Box<dyn DesktopStore>,
    presenter: Box<dyn DesktopPresenter>,
}

impl DesktopSelector {
    /// Create new selector
    pub fn new(
        catalog: DesktopCatalog,
        store: Box<dyn DesktopStore>,
        presenter: Box<dyn DesktopPresenter>,
    ) -> Self {
        Self {
            catalog,
            store,
            presenter,
        }
    }

    /// Resolve the desktop for `identity`.
    ///
    /// A pinned preference without the re-select flag is used as-is. Otherwise
    /// the configured auto-login session wins over the menu. Without any
    /// preferences the menu is forced; with the flag it offers the last used
    /// desktop as default. Only menu choices are remembered.
    pub fn select(&mut self, identity: &Identity, config: &LoginConfig) -> Result<ResolvedDesktop, LoginError> {
        let state = match self.store.load_state(identity) {
            Ok(state) => state,
            Err(e) => {
                warn!("Ignoring desktop preferences for {}: {}", identity.username, e);
                None
            }
        };
        let lang_override = state
            .as_ref()
            .and_then(|s| s.lang.clone())
            .filter(|lang| !lang.is_empty());

        let mode = match state {
            Some(UserDesktopState {
                desktop: Some(desktop),
                reselect: false,
                ..
            }) => {
                debug!("Using pinned desktop {}", desktop);
                return Ok(ResolvedDesktop {
                    selection: desktop.leaf().clone(),
                    lang_override,
                });
            }
            Some(_) => SelectionMode::Free,
            None => SelectionMode::Forced,
        };

        let selection = match self.autologin_entry(config).cloned() {
            Some(entry) => {
                info!("Auto-login desktop: {}", entry);
                entry
            }
            None => self.choose(identity, mode)?,
        };

        let leaf = selection.leaf().clone();
        info!("Selected desktop: {}", leaf);

        Ok(ResolvedDesktop {
            selection: leaf,
            lang_override,
        })
    }

    fn autologin_entry(&self, config: &LoginConfig) -> Option<&DesktopSelection> {
        config.auth.autologin_user()?;
        let name = config.auth.autologin_session()?;

        let entry = self.catalog.find(name);
        if entry.is_none() {
            warn!("Auto-login session {} is not installed, asking instead", name);
        }
        entry
    }

    fn choose(&mut self, identity: &Identity, mode: SelectionMode) -> Result<DesktopSelection, LoginError> {
        let last_used = match self.store.last_used(identity) {
            Ok(last_used) => last_used,
            Err(e) => {
                warn!("Ignoring last-used desktop for {}: {}", identity.username, e);
                None
            }
        };
        let default = match mode {
            SelectionMode::Free => last_used.as_ref(),
            SelectionMode::Forced => None,
        };

        let chosen = self
            .presenter
            .choose(self.catalog.entries(), mode, default)
            .map_err(|e| LoginError::DesktopSelectionFailure {
                reason: e.to_string(),
            })?;

        if chosen.is_rememberable() && last_used.as_ref() != Some(&chosen) {
            if let Err(e) = self.store.remember(identity, &chosen) {
                warn!("Failed to remember desktop {}: {}", chosen, e);
            }
        }

        Ok(chosen)
    }
}
