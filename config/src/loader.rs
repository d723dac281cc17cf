use crate::{ConfigError, FmshConfig, LogLevel};
use regex::Regex;
use std::path::{Path, PathBuf};

pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        if let Some(home) = dirs::home_dir() {
            search_paths.push(home.join(".config/fmsh/fmsh.yaml"));
        }
        search_paths.push(PathBuf::from("./fmsh.yaml"));

        #[cfg(unix)]
        search_paths.insert(0, PathBuf::from("/etc/fmsh/fmsh.yaml"));

        Self {
            explicit_file: None,
            search_paths,
        }
    }

    #[must_use]
    pub fn with_file(mut self, path: &str) -> Self {
        self.explicit_file = Some(PathBuf::from(path));
        self
    }

    #[must_use]
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn load(&self) -> Result<FmshConfig, ConfigError> {
        self.load_with(|name| std::env::var(name).ok())
    }

    /// Same as [`load`](Self::load) but reads environment variables through `lookup`.
    pub fn load_with<F>(&self, lookup: F) -> Result<FmshConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = FmshConfig::default();

        if let Some(env_path) = lookup("FMSH_CONFIG") {
            config = self.read_file(Path::new(&env_path), &lookup)?;
        } else if let Some(ref explicit) = self.explicit_file {
            config = self.read_file(explicit, &lookup)?;
        } else {
            for path in &self.search_paths {
                if !path.exists() {
                    continue;
                }
                match std::fs::read_to_string(path) {
                    Ok(content) => {
                        tracing::debug!(path = %path.display(), "merging config file");
                        config = self.merge_yaml(&config, &content, &lookup)?;
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable config file");
                    }
                }
            }
        }

        Self::apply_overrides(&mut config, &lookup);
        Ok(config)
    }

    fn read_file<F>(&self, path: &Path, lookup: &F) -> Result<FmshConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.parse_yaml(&content, lookup)
    }

    fn parse_yaml<F>(&self, content: &str, lookup: &F) -> Result<FmshConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expanded = expand_env_vars(content, lookup)?;
        Ok(serde_yaml::from_str(&expanded)?)
    }

    fn merge_yaml<F>(
        &self,
        base: &FmshConfig,
        content: &str,
        lookup: &F,
    ) -> Result<FmshConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let overlay = self.parse_yaml(content, lookup)?;
        Ok(merge_configs(base, &overlay))
    }

    fn apply_overrides<F>(config: &mut FmshConfig, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("FMSH_LOG_LEVEL") {
            match level.parse::<LogLevel>() {
                Ok(l) => config.logging.level = l,
                Err(e) => tracing::warn!(error = %e, "ignoring FMSH_LOG_LEVEL"),
            }
        }
        if let Some(file) = lookup("FMSH_LOG_FILE") {
            if !file.is_empty() {
                config.logging.file = file;
            }
        }
        if let Some(prompt) = lookup("FMSH_PROMPT") {
            config.shell.prompt = prompt;
        }
        if let Some(history) = lookup("FMSH_HISTORY_FILE") {
            if !history.is_empty() {
                config.shell.history.file = history;
            }
        }
    }
}

/// Later files only override sections that differ from the compiled defaults.
fn merge_configs(base: &FmshConfig, overlay: &FmshConfig) -> FmshConfig {
    let defaults = FmshConfig::default();
    let mut result = base.clone();

    if overlay.shell.prompt != defaults.shell.prompt {
        result.shell.prompt.clone_from(&overlay.shell.prompt);
    }
    if overlay.shell.history != defaults.shell.history {
        result.shell.history = overlay.shell.history.clone();
    }
    if overlay.logging != defaults.logging {
        result.logging = overlay.logging.clone();
    }

    result
}

fn expand_env_vars<F>(content: &str, lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
    Ok(re
        .replace_all(content, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_default()
        })
        .to_string())
}
