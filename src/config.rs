//! Optional config file loading. Search order: ./txtbind.toml, then
//! $XDG_CONFIG_HOME/txtbind/config.toml (or ~/.config/txtbind/config.toml).

use serde::Deserialize;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override
/// defaults, and CLI flags override the file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Default output directory when -o is not set. Paths are relative to CWD.
    pub output_dir: Option<PathBuf>,
    /// Author written into book metadata.
    pub author: Option<String>,
    /// Chapter detection mode: "both" (default), "pattern", or "blank-line".
    pub detection_mode: Option<String>,
    /// Whether two consecutive blank lines split chapters (default: true).
    pub double_blank_split: Option<bool>,
    /// Prefix detected headings with the marker string (default: false).
    pub marker_insertion: Option<bool>,
    /// Marker string used when marker_insertion is on (default: "#").
    pub marker: Option<String>,
    /// Reorder chapters by (volume, chapter) key (default: false).
    pub sorting: Option<bool>,
    /// Bark push endpoint; notifications are skipped when unset.
    pub bark_url: Option<String>,
    /// Local cover image embedded into EPUB output.
    pub cover_image: Option<PathBuf>,
}

/// Search order: (1) ./txtbind.toml, (2) $XDG_CONFIG_HOME/txtbind/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present
/// file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("txtbind.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("txtbind").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            return Ok(Some(config));
        }
    }
    Ok(None)
}
