//! Layered configuration for lumen.
//!
//! Values are merged from, in increasing priority:
//! 1. built-in defaults,
//! 2. a config file (TOML, YAML or JSON, picked by extension), either given
//!    explicitly or found at `<config dir>/lumen/config.toml`,
//! 3. `LUMEN_`-prefixed environment variables, with `__` separating nested
//!    keys (`LUMEN_THUMBNAILS__DIR=/var/cache/lumen`).
//!
//! ```toml
//! media_root = "/srv/media"
//! database = "/var/lib/lumen/cache.sqlite3"
//!
//! [thumbnails]
//! dir = "/var/lib/lumen/thumbnails"
//! url_prefix = "/static/thumbnails"
//!
//! [subtitles]
//! dir = "/srv/subtitles"
//!
//! [tools]
//! ffmpeg = "/usr/local/bin/ffmpeg"
//! probe_timeout = 15
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use lumen_media::{ThumbnailPipeline, Timeouts};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "LUMEN_";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory tree that is indexed. Nothing outside it is ever read.
    pub media_root: PathBuf,
    /// SQLite file holding the metadata cache.
    pub database: PathBuf,
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
    #[serde(default)]
    pub subtitles: SubtitleConfig,
    #[serde(default)]
    pub tools: ToolConfig,
}

/// Where extracted frames are written, and the URL they are served under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    pub dir: PathBuf,
    pub url_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleConfig {
    /// Without a directory, subtitle lookups always come back empty.
    pub dir: Option<PathBuf>,
    pub url_prefix: String,
}

/// External tool executables and their time budgets (in seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub ffprobe: String,
    pub ffmpeg: String,
    pub probe_timeout: u64,
    pub extract_timeout: u64,
    pub retry_timeout: u64,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "lumen")
}

fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".lumen"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            media_root: PathBuf::new(),
            database: data_dir().join("cache.sqlite3"),
            thumbnails: ThumbnailConfig::default(),
            subtitles: SubtitleConfig::default(),
            tools: ToolConfig::default(),
        }
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            dir: data_dir().join("thumbnails"),
            url_prefix: ThumbnailPipeline::DEFAULT_URL_PREFIX.to_string(),
        }
    }
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            dir: None,
            url_prefix: "/static/subtitles".to_string(),
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        let timeouts = Timeouts::default();
        Self {
            ffprobe: "ffprobe".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            probe_timeout: timeouts.probe.as_secs(),
            extract_timeout: timeouts.extract.as_secs(),
            retry_timeout: timeouts.retry.as_secs(),
        }
    }
}

impl ToolConfig {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            probe: Duration::from_secs(self.probe_timeout),
            extract: Duration::from_secs(self.extract_timeout),
            retry: Duration::from_secs(self.retry_timeout),
        }
    }
}

/// The config file used when none is given explicitly.
pub fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

impl Config {
    /// Load, merge and validate the configuration.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(file)?)
    }

    /// The merged providers, before extraction.
    ///
    /// Exposed so that callers can merge further overrides (command-line
    /// flags, for example) on top.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::FileNotFound(path.to_path_buf()));
                }
                figment = merge_file(figment, path)?;
            },
            None => {
                if let Some(path) = default_config_file().filter(|path| path.is_file()) {
                    figment = merge_file(figment, &path)?;
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(|err| ErrorKind::Invalid(err.to_string()))?;
        config.validate()?;
        tracing::debug!(media_root = %config.media_root.display(), database = %config.database.display(), "Configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.media_root.as_os_str().is_empty() {
            exn::bail!(ErrorKind::MissingMediaRoot);
        }
        if !self.media_root.is_dir() {
            exn::bail!(ErrorKind::MediaRootNotDirectory(self.media_root.clone()));
        }
        if resolve(&self.thumbnails.dir).starts_with(resolve(&self.media_root)) {
            exn::bail!(ErrorKind::ThumbnailsInsideMediaRoot(self.thumbnails.dir.clone()));
        }
        for (key, secs) in [
            ("tools.probe_timeout", self.tools.probe_timeout),
            ("tools.extract_timeout", self.tools.extract_timeout),
            ("tools.retry_timeout", self.tools.retry_timeout),
        ] {
            if secs == 0 {
                exn::bail!(ErrorKind::ZeroTimeout(key));
            }
        }
        Ok(())
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    tracing::debug!(path = %path.display(), "Reading config file");
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

/// Best-effort canonical form of a path that may not exist yet: the
/// nearest existing ancestor is resolved, and the rest appended to it.
fn resolve(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return missing.iter().rev().fold(canonical, |resolved, part| resolved.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            },
            _ => return absolute.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    fn make_media_root(jail: &Jail) {
        std::fs::create_dir_all(jail.directory().join("media")).unwrap();
    }

    #[test]
    fn test_defaults() {
        let tools = ToolConfig::default();
        assert_eq!(tools.timeouts(), Timeouts::default());
        assert_eq!(ThumbnailConfig::default().url_prefix, "/static/thumbnails");
        assert_eq!(SubtitleConfig::default().dir, None);
        assert!(Config::default().database.ends_with("cache.sqlite3"));
    }

    #[rstest]
    #[case("lumen.toml", "media_root = \"media\"\n[tools]\nprobe_timeout = 5\n")]
    #[case("lumen.yaml", "media_root: media\ntools:\n  probe_timeout: 5\n")]
    #[case("lumen.json", r#"{"media_root": "media", "tools": {"probe_timeout": 5}}"#)]
    fn test_load_file_formats(#[case] name: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            make_media_root(jail);
            jail.create_file(name, contents)?;
            let config = Config::load(Some(Path::new(name))).unwrap();
            assert_eq!(config.media_root, PathBuf::from("media"));
            assert_eq!(config.tools.probe_timeout, 5);
            // Untouched keys keep their defaults.
            assert_eq!(config.tools.extract_timeout, 45);
            assert_eq!(config.tools.ffmpeg, "ffmpeg");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            make_media_root(jail);
            jail.create_file("lumen.toml", "media_root = \"media\"\n[thumbnails]\nurl_prefix = \"/file\"\n")?;
            jail.set_env("LUMEN_THUMBNAILS__URL_PREFIX", "/env");
            jail.set_env("LUMEN_TOOLS__RETRY_TIMEOUT", "7");
            let config = Config::load(Some(Path::new("lumen.toml"))).unwrap();
            assert_eq!(config.thumbnails.url_prefix, "/env");
            assert_eq!(config.tools.timeouts().retry, Duration::from_secs(7));
            Ok(())
        });
    }

    #[test]
    fn test_env_only() {
        Jail::expect_with(|jail| {
            make_media_root(jail);
            jail.set_env("LUMEN_MEDIA_ROOT", "media");
            jail.set_env("LUMEN_SUBTITLES__DIR", "subs");
            let config = Config::from_figment(
                Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed(ENV_PREFIX).split("__")),
            )
            .unwrap();
            assert_eq!(config.subtitles.dir, Some(PathBuf::from("subs")));
            Ok(())
        });
    }

    #[test]
    fn test_missing_media_root() {
        Jail::expect_with(|jail| {
            jail.create_file("lumen.toml", "database = \"cache.sqlite3\"\n")?;
            let err = Config::load(Some(Path::new("lumen.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::MissingMediaRoot);
            Ok(())
        });
    }

    #[test]
    fn test_media_root_must_be_directory() {
        Jail::expect_with(|jail| {
            jail.create_file("not-a-dir", "")?;
            jail.create_file("lumen.toml", "media_root = \"not-a-dir\"\n")?;
            let err = Config::load(Some(Path::new("lumen.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::MediaRootNotDirectory(PathBuf::from("not-a-dir")));
            Ok(())
        });
    }

    #[test]
    fn test_thumbnails_inside_media_root_rejected() {
        Jail::expect_with(|jail| {
            make_media_root(jail);
            jail.create_file("lumen.toml", "media_root = \"media\"\n[thumbnails]\ndir = \"media/.thumbs\"\n")?;
            let err = Config::load(Some(Path::new("lumen.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::ThumbnailsInsideMediaRoot(PathBuf::from("media/.thumbs")));
            Ok(())
        });
    }

    #[cfg(unix)]
    #[test]
    fn test_thumbnails_inside_symlinked_media_root_rejected() {
        Jail::expect_with(|jail| {
            make_media_root(jail);
            std::os::unix::fs::symlink(jail.directory().join("media"), jail.directory().join("library")).unwrap();
            jail.create_file("lumen.toml", "media_root = \"library\"\n[thumbnails]\ndir = \"library/cache/thumbs\"\n")?;
            let err = Config::load(Some(Path::new("lumen.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::ThumbnailsInsideMediaRoot(PathBuf::from("library/cache/thumbs")));
            Ok(())
        });
    }

    #[test]
    fn test_resolve_missing_tail_under_existing_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        assert_eq!(resolve(&dir.path().join("a/b")), canonical.join("a/b"));
        assert_eq!(resolve(dir.path()), canonical);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        Jail::expect_with(|jail| {
            make_media_root(jail);
            jail.create_file("lumen.toml", "media_root = \"media\"\n[tools]\nextract_timeout = 0\n")?;
            let err = Config::load(Some(Path::new("lumen.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::ZeroTimeout("tools.extract_timeout"));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = Config::figment(Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::FileNotFound(path));
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumen.ini");
        std::fs::write(&path, "media_root = /srv").unwrap();
        let err = Config::figment(Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat(path));
    }

    #[test]
    fn test_malformed_file() {
        Jail::expect_with(|jail| {
            make_media_root(jail);
            jail.create_file("lumen.toml", "media_root = \"media\"\n[tools]\nprobe_timeout = \"soon\"\n")?;
            let err = Config::load(Some(Path::new("lumen.toml"))).unwrap_err();
            assert!(matches!(*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_default_config_file_is_discovered() {
        Jail::expect_with(|jail| {
            make_media_root(jail);
            let config_home = jail.directory().join("xdg");
            std::fs::create_dir_all(config_home.join("lumen")).unwrap();
            let media_root = jail.directory().join("media");
            std::fs::write(
                config_home.join("lumen").join(CONFIG_FILE),
                format!("media_root = {:?}\n", media_root.display().to_string()),
            )
            .unwrap();
            jail.set_env("XDG_CONFIG_HOME", config_home.display());
            let config = Config::load(None).unwrap();
            assert_eq!(config.media_root, media_root);
            Ok(())
        });
    }
}
