use crate::strings::CONFIG_FILE_NAME;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

const DEFAULT_DOCUMENT: &str = "project.v";
const DEFAULT_ROOT: &str = "all";
const DEFAULT_OUTPUT: &str = "deps.pdf";
const DEFAULT_UNFLATTEN_LEVEL: u32 = 100;

/// Search for lemma-deps.toml starting from the current directory and moving
/// up the directory tree.
pub fn find_config_file() -> Result<Option<PathBuf>, ConfigError> {
    let current_dir = env::current_dir().map_err(|e| ConfigError::Io(PathBuf::from("."), e))?;
    let start_dir = current_dir
        .canonicalize()
        .map_err(|e| ConfigError::Io(current_dir.clone(), e))?;

    Ok(find_config_file_from(&start_dir))
}

fn find_config_file_from(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Load the config at `path`, or look for one if no path is given. Falls back
/// to the defaults when there is no config file at all.
pub fn load_config(path: Option<&Path>) -> Result<DepsConfig, ConfigError> {
    let path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file()?,
    };

    match path {
        Some(path) => {
            log::info!("using config {}", path.display());
            DepsConfig::from_file(&path)
        }
        None => {
            log::info!("no {CONFIG_FILE_NAME} found, using defaults");
            let base_dir = env::current_dir().map_err(|e| ConfigError::Io(PathBuf::from("."), e))?;
            Ok(DepsConfig::from_parts(base_dir, DepsConfigFile::default()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct DepsConfig {
    base_dir: PathBuf,
    document: PathBuf,
    root: String,
    output: String,
    unflatten: bool,
    tools: ToolConfig,
    section_colors: BTreeMap<String, String>,
    groups: BTreeMap<String, Vec<String>>,
    chains: Vec<Vec<String>>,
}

impl DepsConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse(path, &contents)
    }

    /// Parse the contents of the config file at `path`. Paths inside are
    /// relative to its directory.
    pub fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let config_file =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        let base_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self::from_parts(base_dir, config_file))
    }

    fn from_parts(base_dir: PathBuf, file: DepsConfigFile) -> Self {
        let document = file.document.unwrap_or_default();
        let render = file.render.unwrap_or_default();
        let layout = file.layout.unwrap_or_default();

        Self {
            document: base_dir.join(document.path.as_deref().unwrap_or(DEFAULT_DOCUMENT)),
            output: render.output.unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
            root: render.root.unwrap_or_else(|| DEFAULT_ROOT.to_string()),
            unflatten: render.unflatten.unwrap_or(false),
            tools: file.tools.unwrap_or_default(),
            section_colors: file.sections.unwrap_or_default(),
            groups: file.groups.unwrap_or_default(),
            chains: layout.chains.unwrap_or_default(),
            base_dir,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The document to scan. Relative paths in the config file are resolved
    /// against the config file's directory.
    pub fn document(&self) -> &Path {
        &self.document
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// An output path relative to the config file's directory, `-` for stdout
    /// or the empty string for the interactive viewer.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn unflatten(&self) -> bool {
        self.unflatten
    }

    pub fn tools(&self) -> &ToolConfig {
        &self.tools
    }

    /// Maps a section header title to the color of the obligations under it.
    pub fn section_colors(&self) -> &BTreeMap<String, String> {
        &self.section_colors
    }

    /// Named pseudo-nodes that depend on a fixed list of obligations.
    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    /// Node chains joined by invisible edges to steer the layout.
    pub fn chains(&self) -> &[Vec<String>] {
        &self.chains
    }
}

/// Names of the external Graphviz tools.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub dot: String,
    pub unflatten: String,
    pub unflatten_level: u32,
    pub viewer: String,
    pub dot2tex: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            dot: "dot".to_string(),
            unflatten: "unflatten".to_string(),
            unflatten_level: DEFAULT_UNFLATTEN_LEVEL,
            viewer: "xdot".to_string(),
            dot2tex: "dot2tex".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DepsConfigFile {
    document: Option<DocumentConfig>,
    render: Option<RenderConfig>,
    tools: Option<ToolConfig>,
    sections: Option<BTreeMap<String, String>>,
    groups: Option<BTreeMap<String, Vec<String>>>,
    layout: Option<LayoutConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentConfig {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderConfig {
    root: Option<String>,
    output: Option<String>,
    unflatten: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LayoutConfig {
    chains: Option<Vec<Vec<String>>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read `{}`: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid config `{}`: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
}

/// Written by `lemma-deps init`.
pub const DEFAULT_CONFIG_TEXT: &str = r#"# Configuration for lemma-deps.

[document]
# The proof script to scan, relative to this file.
path = "project.v"

[render]
# `all`, a comma separated list of roots, or `+name` for everything that
# `name` does not depend on.
root = "all"
# The extension picks the Graphviz format. `.tex` goes through dot2tex,
# `-` prints DOT to stdout and an empty string opens the viewer.
output = "deps.pdf"
unflatten = false

[tools]
dot = "dot"
unflatten = "unflatten"
unflatten_level = 100
viewer = "xdot"
dot2tex = "dot2tex"

# Colors for obligations under a `(** ** Title *)` header.
[sections]
# "The typing relation" = "blue"

# Pseudo-nodes whose members count as used.
[groups]
# ROOT = ["preservation", "progress"]

[layout]
# Chains of nodes joined by invisible edges to steer the layout.
chains = [
    # ["lookup_map", "typed_type_shift_cut"],
]
"#;
