// sumactl - CLI reports for the SUSE Manager XML-RPC API
// Copyright (C) 2025 sumactl contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://localhost/rpc/api";

pub const ENV_ENDPOINT: &str = "SUMACTL_ENDPOINT";
pub const ENV_USERNAME: &str = "SUMACTL_USERNAME";
pub const ENV_PASSWORD: &str = "SUMACTL_PASSWORD";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub insecure_tls: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    User,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate a writable config directory for the current user")]
    MissingConfigDir,
    #[error(
        "API credentials are required; set them with `sumactl configure --username <user> --password <pass>` or via SUMACTL_USERNAME/SUMACTL_PASSWORD"
    )]
    MissingCredentials,
}

#[derive(Debug)]
pub struct EffectiveConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub insecure_tls: bool,
}

/// Per-invocation overrides from the global CLI flags. Highest precedence.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub insecure_tls: bool,
}

pub fn config_path(scope: Scope, cwd: &Path) -> Result<PathBuf> {
    match scope {
        Scope::Local => Ok(cwd.join(".sumactl.yaml")),
        Scope::User => {
            if let Ok(custom) = env::var("SUMACTL_CONFIG_DIR") {
                return Ok(PathBuf::from(custom).join("config.yaml"));
            }
            let base = config_dir().ok_or(ConfigError::MissingConfigDir)?;
            Ok(base.join("sumactl").join("config.yaml"))
        }
    }
}

pub fn load(cwd: &Path) -> Result<Config> {
    let user = read_if_exists(&config_path(Scope::User, cwd)?)?.unwrap_or_default();
    let local = read_if_exists(&config_path(Scope::Local, cwd)?)?.unwrap_or_default();
    Ok(merge(user, local))
}

pub fn load_scope(scope: Scope, cwd: &Path) -> Result<Config> {
    Ok(read_if_exists(&config_path(scope, cwd)?)?.unwrap_or_default())
}

pub fn save(scope: Scope, config: &Config, cwd: &Path) -> Result<PathBuf> {
    let path = config_path(scope, cwd)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(path)
}

/// Merge order, later wins: user file, local file, environment, CLI flags.
pub fn resolve(cwd: &Path, overrides: Overrides) -> Result<EffectiveConfig> {
    let mut merged = env_overlay(load(cwd)?);

    if let Some(endpoint) = overrides.endpoint {
        merged.endpoint = Some(endpoint);
    }
    if let Some(username) = overrides.username {
        merged.username = Some(username);
    }
    if let Some(password) = overrides.password {
        merged.password = Some(password);
    }
    let insecure_tls = merged.insecure_tls || overrides.insecure_tls;

    let endpoint = merged
        .endpoint
        .map(|e| e.trim().to_string())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let username = merged.username.ok_or(ConfigError::MissingCredentials)?;
    let password = merged.password.ok_or(ConfigError::MissingCredentials)?;

    Ok(EffectiveConfig {
        endpoint,
        username,
        password,
        insecure_tls,
    })
}

fn env_overlay(mut config: Config) -> Config {
    if let Ok(endpoint) = env::var(ENV_ENDPOINT) {
        config.endpoint = Some(endpoint);
    }
    if let Ok(username) = env::var(ENV_USERNAME) {
        config.username = Some(username);
    }
    if let Ok(password) = env::var(ENV_PASSWORD) {
        config.password = Some(password);
    }
    config
}

fn read_if_exists(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let config = serde_yaml::from_str(&contents).with_context(|| format!("parsing {:?}", path))?;
    Ok(Some(config))
}

fn merge(user: Config, local: Config) -> Config {
    Config {
        endpoint: local.endpoint.or(user.endpoint),
        username: local.username.or(user.username),
        password: local.password.or(user.password),
        insecure_tls: local.insecure_tls || user.insecure_tls,
    }
}
