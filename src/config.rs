use std::path::{Path, PathBuf};

use url::Url;

use crate::errors::EtlError;

/// Database connection parameters, read from `DB_USER`, `DB_PASSWORD`,
/// `DB_HOST`, `DB_PORT` and `DB_NAME`.
///
/// Missing variables are kept as empty strings; the connection attempt is
/// what reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbSettings {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: String,
    pub name: String,
}

impl DbSettings {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).unwrap_or_default();
        Self {
            user: var("DB_USER"),
            password: var("DB_PASSWORD"),
            host: var("DB_HOST"),
            port: var("DB_PORT"),
            name: var("DB_NAME"),
        }
    }

    /// Builds `postgresql://<user>:<password>@<host>:<port>/<name>`.
    ///
    /// Credentials are percent-encoded.
    pub fn connection_url(&self) -> Result<String, EtlError> {
        let mut url = Url::parse("postgresql://localhost")
            .map_err(|e| EtlError::Config(e.to_string()))?;

        if self.host.trim().is_empty() {
            return Err(EtlError::Config("DB_HOST is not set".to_string()));
        }
        url.set_host(Some(&self.host))
            .map_err(|e| EtlError::Config(format!("invalid DB_HOST '{}': {}", self.host, e)))?;

        let port = if self.port.is_empty() {
            None
        } else {
            Some(self.port.parse::<u16>().map_err(|_| {
                EtlError::Config(format!("DB_PORT must be a valid port, got '{}'", self.port))
            })?)
        };
        url.set_port(port)
            .map_err(|_| EtlError::Config("cannot set port on database URL".to_string()))?;

        url.set_username(&self.user)
            .map_err(|_| EtlError::Config("cannot set user on database URL".to_string()))?;
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|_| EtlError::Config("cannot set password on database URL".to_string()))?;
        }
        url.set_path(&format!("/{}", self.name.trim_start_matches('/')));

        Ok(url.to_string())
    }
}

/// A full connection URL taken from `DB_URL` or `DATABASE_URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlOverride {
    /// Name of the variable the URL came from.
    pub var: &'static str,
    pub url: String,
}

/// Runtime configuration shared by both binaries.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub db: DbSettings,
    /// Replaces `db` when present.
    pub database_url_override: Option<UrlOverride>,
    /// Directory that holds `data/processed/`.
    pub project_root: PathBuf,
}

impl EtlConfig {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url_override = ["DB_URL", "DATABASE_URL"].into_iter().find_map(|var| {
            non_empty(var).map(|url| UrlOverride { var, url })
        });
        let project_root = non_empty("ETL_PROJECT_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(default_project_root);

        let config = Self {
            db: DbSettings::from_lookup(&lookup),
            database_url_override,
            project_root,
        };

        tracing::debug!("Project root: {}", config.project_root.display());
        if let Some(ref o) = config.database_url_override {
            tracing::warn!(
                "{} is set and overrides DB_USER/DB_PASSWORD/DB_HOST/DB_PORT/DB_NAME",
                o.var
            );
        } else {
            tracing::debug!(
                "Database host: {}:{} ({})",
                config.db.host,
                config.db.port,
                config.db.name
            );
        }

        config
    }

    pub fn database_url(&self) -> Result<String, EtlError> {
        match &self.database_url_override {
            Some(o) => Ok(o.url.clone()),
            None => self.db.connection_url(),
        }
    }
}

/// First of `start` and its ancestors that contains `data/processed`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("data").join("processed").is_dir())
        .map(Path::to_path_buf)
}

/// Looks upward from the running executable, then from the working
/// directory. Falls back to the working directory itself.
pub fn default_project_root() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().and_then(find_project_root))
        .or_else(|| find_project_root(&cwd))
        .unwrap_or(cwd)
}
