use crate::{
    config::DEFAULT_CONFIG_TEXT,
    error::DepsError,
    strings::CONFIG_FILE_NAME,
    util::ansi::{ANSI_BOLD, ANSI_GREEN, ANSI_RESET},
};
use argh::FromArgs;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Write a default lemma-deps.toml.
#[derive(FromArgs)]
#[argh(subcommand, name = "init")]
pub struct InitCommand {
    /// directory to create the config file in (defaults to the current one)
    #[argh(positional)]
    dir: Option<PathBuf>,
}

pub fn run_init(cmd: InitCommand) -> Result<(), DepsError> {
    let dir = cmd.dir.unwrap_or_else(|| PathBuf::from("."));
    let path = write_default_config(&dir)?;

    println!(
        "{ANSI_GREEN}{ANSI_BOLD}Created{ANSI_RESET} {}",
        path.display()
    );
    Ok(())
}

fn write_default_config(dir: &Path) -> Result<PathBuf, DepsError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(DepsError::AlreadyExists(path));
    }

    fs::write(&path, DEFAULT_CONFIG_TEXT).map_err(|source| DepsError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DepsConfig;

    #[test]
    fn writes_config_once() {
        let dir = std::env::temp_dir().join(format!("lemma-deps-init-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let path = write_default_config(&dir).unwrap();
        let config = DepsConfig::from_file(&path).unwrap();
        assert_eq!(config.document(), dir.join("project.v"));

        let err = write_default_config(&dir).unwrap_err();
        assert!(matches!(err, DepsError::AlreadyExists(p) if p == path));

        fs::remove_dir_all(&dir).unwrap();
    }
}
