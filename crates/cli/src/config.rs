// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is read from `$TESTBOARD_CONFIG`, or else from
//! `config.toml` in the user config directory (`$XDG_CONFIG_HOME/testboard`
//! on Linux). Every key is optional:
//!
//! ```toml
//! store_url = "ws://localhost:7890"
//! tracker_url = "http://localhost:3001"
//! poll_interval_ms = 5000
//! issue_poll_interval_ms = 30000
//! scope = "test_cards"
//! tester = "marta"
//! images_dir = "/srv/board/images"
//! ```
//!
//! `TESTBOARD_STORE_URL`, `TESTBOARD_TRACKER_URL`, `TESTBOARD_USER` and
//! `TESTBOARD_IMAGES_DIR` override the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tb_core::protocol::CARDS_TABLE;

use crate::board::BoardConfig;
use crate::engine::SyncConfig;
use crate::env;
use crate::error::{Error, Result};

const APP_DIR_NAME: &str = "testboard";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// WebSocket URL of the card store.
    pub store_url: String,
    /// Base URL of the issue tracker proxy.
    pub tracker_url: String,
    pub poll_interval_ms: u64,
    pub issue_poll_interval_ms: u64,
    /// Change feed scope.
    pub scope: String,
    /// Name recorded as tester on new cards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tester: Option<String>,
    /// Where uploaded images are kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store_url: "ws://localhost:7890".to_string(),
            tracker_url: "http://localhost:3001".to_string(),
            poll_interval_ms: 5_000,
            issue_poll_interval_ms: 30_000,
            scope: CARDS_TABLE.to_string(),
            tester: None,
            images_dir: None,
        }
    }
}

/// Default config file location, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl Config {
    /// Loads, overrides from the environment and validates.
    ///
    /// An explicitly named file (flag or `TESTBOARD_CONFIG`) must exist; the
    /// default location may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let named = explicit.map(Path::to_path_buf).or_else(env::config_path);
        let mut config = match named {
            Some(path) => Config::from_file(&path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Config::from_file(&path)?,
                _ => Config::default(),
            },
        };
        config.apply_env(env::lookup);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Config::parse(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Config> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string().trim_end().to_string()))
    }

    /// Applies environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(env::vars::TESTBOARD_STORE_URL) {
            self.store_url = url;
        }
        if let Some(url) = lookup(env::vars::TESTBOARD_TRACKER_URL) {
            self.tracker_url = url;
        }
        if let Some(user) = lookup(env::vars::TESTBOARD_USER) {
            self.tester = Some(user);
        }
        if let Some(dir) = lookup(env::vars::TESTBOARD_IMAGES_DIR) {
            self.images_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.store_url.starts_with("ws://") || self.store_url.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "store_url must be a ws:// or wss:// URL, got '{}'",
                self.store_url
            )));
        }
        if !(self.tracker_url.starts_with("http://") || self.tracker_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "tracker_url must be an http:// or https:// URL, got '{}'",
                self.tracker_url
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be greater than 0".to_string()));
        }
        if self.issue_poll_interval_ms == 0 {
            return Err(Error::Config(
                "issue_poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.scope.trim().is_empty() {
            return Err(Error::Config("scope cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            scope: self.scope.clone(),
            ..SyncConfig::default()
        }
    }

    pub fn board_config(&self) -> BoardConfig {
        BoardConfig {
            issue_poll_interval: Duration::from_millis(self.issue_poll_interval_ms),
            sync: self.sync_config(),
        }
    }

    /// Image directory: configured, else the user data directory, else the
    /// working directory.
    pub fn images_root(&self) -> PathBuf {
        self.images_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .unwrap_or_else(|| PathBuf::from(".testboard"))
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
