pub mod assess;
pub mod completion;
pub mod config;
pub mod history;
pub mod session;

use std::{
    io::{self, BufRead, Write},
    sync::Arc,
};

use anyhow::{Context, Result, bail};
use client::{ApiClient, ClientError, FileStore, SessionFlow, StagingStore, TokenStore};
use shared::config::ClientConfig;

/// Resolved configuration plus the on-device store every command shares.
#[derive(Debug)]
pub struct AppContext {
    pub config: ClientConfig,
    store: Arc<FileStore>,
}

impl AppContext {
    pub fn new(config: ClientConfig) -> Self {
        let store = Arc::new(FileStore::new(config.storage_path()));
        Self { config, store }
    }

    pub fn api(&self) -> Result<ApiClient> {
        ApiClient::from_config(&self.config, TokenStore::new(self.store.clone()))
            .context("failed to build HTTP client")
    }

    pub fn flow(&self) -> Result<SessionFlow> {
        Ok(SessionFlow::new(self.api()?, StagingStore::new(self.store.clone()))
            .with_provider_radius(self.config.provider_radius_m))
    }
}

/// Present a client error the way a dialog would: title, then message.
pub fn dialog(err: ClientError) -> anyhow::Error {
    let title = err.title();
    anyhow::Error::new(err).context(title)
}

/// Same as [`dialog`] with a command-specific title.
pub fn titled(title: &'static str) -> impl FnOnce(ClientError) -> anyhow::Error {
    move |err| anyhow::Error::new(err).context(title)
}

pub fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    let trimmed = input.trim().to_string();
    if trimmed.is_empty() {
        bail!("input must not be empty");
    }
    Ok(trimmed)
}
