//! Resolved settings and the backend they select.
//!
//! Flags and environment variables win over `config.json`, which wins over
//! the defaults.

pub mod backend;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context as _, Result, bail};

use shutter_core::feed::{DEFAULT_PAGE_SIZE, PaginatorConfig};
use shutter_core::models::UserProfile;
use shutter_core::traits::Store;
use shutter_core::types::{StoreUrl, Username};

use crate::cli::GlobalArgs;

pub use backend::CliBackend;
use storage::StoredConfig;

/// Everything a command needs.
pub struct Context {
    pub backend: Arc<CliBackend>,
    pub user: Option<Username>,
    pub page_size: u32,
    pub json: bool,
}

impl Context {
    /// Resolve settings and connect to the store.
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let stored = storage::load_config()?;
        Self::resolve(args, &stored)
    }

    fn resolve(args: &GlobalArgs, stored: &StoredConfig) -> Result<Self> {
        let url = match args.store.as_ref().or(stored.store.as_ref()) {
            Some(url) => StoreUrl::new(url).context("Invalid store URL")?,
            None => StoreUrl::from_directory(storage::default_store_dir()?)
                .context("Invalid default store directory")?,
        };

        let user = args
            .user
            .as_ref()
            .or(stored.user.as_ref())
            .map(Username::new)
            .transpose()
            .context("Invalid username")?;

        let page_size = args
            .page_size
            .or(stored.page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let backend =
            CliBackend::connect(url, args.token.clone()).context("Failed to open store")?;
        tracing::debug!(store = %backend.url(), "Using store");

        Ok(Self {
            backend: Arc::new(backend),
            user,
            page_size,
            json: args.json,
        })
    }

    /// The engine configuration for list commands.
    pub fn paginator(&self) -> Result<PaginatorConfig> {
        PaginatorConfig::new(self.page_size).context("Invalid page size")
    }

    /// Look up a profile by username, failing if it does not exist.
    pub async fn profile_named(&self, username: &str) -> Result<UserProfile> {
        let username = Username::new(username).context("Invalid username")?;
        self.backend
            .find_profile(&username)
            .await
            .context("Failed to look up profile")?
            .with_context(|| format!("No such user: {}", username))
    }

    /// The profile commands act as.
    pub async fn acting_user(&self) -> Result<UserProfile> {
        let Some(username) = &self.user else {
            bail!("No acting user. Pass --as <USERNAME> or run 'shutter use <USERNAME>' first.");
        };
        self.profile_named(username.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> StoredConfig {
        StoredConfig {
            store: Some("file:///tmp/saved/".into()),
            user: Some("amy".into()),
            page_size: Some(25),
        }
    }

    #[test]
    fn flags_override_saved_settings() {
        let args = GlobalArgs {
            store: Some("file:///tmp/flag/".into()),
            user: Some("rory".into()),
            page_size: Some(3),
            ..Default::default()
        };

        let ctx = Context::resolve(&args, &stored()).unwrap();
        assert_eq!(ctx.backend.url().as_str(), "file:///tmp/flag/");
        assert_eq!(ctx.user.as_ref().map(Username::as_str), Some("rory"));
        assert_eq!(ctx.page_size, 3);
    }

    #[test]
    fn saved_settings_fill_gaps() {
        let ctx = Context::resolve(&GlobalArgs::default(), &stored()).unwrap();
        assert_eq!(ctx.backend.url().as_str(), "file:///tmp/saved/");
        assert_eq!(ctx.user.as_ref().map(Username::as_str), Some("amy"));
        assert_eq!(ctx.page_size, 25);
    }

    #[test]
    fn http_store_selects_firestore() {
        let args = GlobalArgs {
            store: Some("http://localhost:8080/v1/projects/demo/databases/(default)/documents".into()),
            ..Default::default()
        };
        let ctx = Context::resolve(&args, &StoredConfig::default()).unwrap();
        assert!(matches!(*ctx.backend, CliBackend::Firestore(_)));
        assert_eq!(ctx.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let args = GlobalArgs {
            page_size: Some(0),
            ..Default::default()
        };
        let ctx = Context::resolve(&args, &stored()).unwrap();
        assert!(ctx.paginator().is_err());
    }

    #[test]
    fn invalid_username_is_rejected() {
        let args = GlobalArgs {
            user: Some("Not Valid!".into()),
            ..Default::default()
        };
        assert!(Context::resolve(&args, &stored()).is_err());
    }
}
