//! Hand DOT text to the external Graphviz tools.

use crate::config::ToolConfig;
use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
};

const STDOUT_OUTPUT: &str = "-";
const TEX_EXTENSION: &str = "tex";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Print the DOT text itself.
    Stdout,
    /// Open the interactive viewer.
    Viewer,
    /// Let `dot` produce a file in the format named by the extension.
    Image { path: PathBuf, format: String },
    /// Lay out to a `.dot` file next to `path`, then convert it with dot2tex.
    Tex { path: PathBuf, dot_path: PathBuf },
}

impl OutputTarget {
    pub fn from_output(output: &str, base_dir: &Path) -> Result<Self, RenderError> {
        if output.is_empty() {
            return Ok(Self::Viewer);
        }
        if output == STDOUT_OUTPUT {
            return Ok(Self::Stdout);
        }

        let path = base_dir.join(output);
        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if !ext.is_empty() => ext.to_string(),
            _ => return Err(RenderError::MissingFormat(path)),
        };

        if format == TEX_EXTENSION {
            let dot_path = path.with_extension("dot");
            Ok(Self::Tex { path, dot_path })
        } else {
            Ok(Self::Image { path, format })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("output `{}` has no extension to pick a format from", .0.display())]
    MissingFormat(PathBuf),

    #[error("could not run `{tool}`: {source}")]
    Spawn { tool: String, source: io::Error },

    #[error("could not send the graph to `{tool}`: {source}")]
    Pipe { tool: String, source: io::Error },

    #[error("`{tool}` failed ({status})")]
    ToolFailed { tool: String, status: ExitStatus },

    #[error("could not write `{}`: {source}", .path.display())]
    Output { path: PathBuf, source: io::Error },
}

/// Run the layout tools for `target` on the given DOT text, optionally piping
/// it through `unflatten` first.
pub fn run_pipeline(
    target: &OutputTarget,
    dot: &str,
    tools: &ToolConfig,
    unflatten: bool,
) -> Result<(), RenderError> {
    let (layout_tool, layout_args) = match target {
        OutputTarget::Stdout => {
            return io::stdout()
                .write_all(dot.as_bytes())
                .map_err(|source| RenderError::Output {
                    path: PathBuf::from(STDOUT_OUTPUT),
                    source,
                });
        }
        OutputTarget::Viewer => (&tools.viewer, vec![]),
        OutputTarget::Image { path, format } => (
            &tools.dot,
            vec![format!("-T{format}"), "-o".to_string(), path.display().to_string()],
        ),
        OutputTarget::Tex { dot_path, .. } => (
            &tools.dot,
            vec!["-o".to_string(), dot_path.display().to_string()],
        ),
    };

    let mut layout = Command::new(layout_tool);
    layout.args(&layout_args);

    if unflatten {
        let mut pre = Command::new(&tools.unflatten);
        pre.arg("-l")
            .arg(tools.unflatten_level.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped());
        let mut pre_child = spawn(&mut pre, &tools.unflatten)?;

        if let Some(out) = pre_child.stdout.take() {
            layout.stdin(Stdio::from(out));
        }
        let layout_child = match spawn(&mut layout, layout_tool) {
            Ok(child) => child,
            Err(err) => {
                let _ = pre_child.kill();
                let _ = pre_child.wait();
                return Err(err);
            }
        };

        // Both children are reaped before any error is returned. `feed`
        // closes the input, so they always exit.
        let fed = feed(&mut pre_child, dot, &tools.unflatten);
        let pre_done = wait(pre_child, &tools.unflatten);
        let layout_done = wait(layout_child, layout_tool);
        fed.and(pre_done).and(layout_done)?;
    } else {
        layout.stdin(Stdio::piped());
        let mut child = spawn(&mut layout, layout_tool)?;
        let fed = feed(&mut child, dot, layout_tool);
        fed.and(wait(child, layout_tool))?;
    }

    if let OutputTarget::Tex { path, dot_path } = target {
        convert_tex(dot_path, path, tools)?;
    }

    Ok(())
}

fn convert_tex(dot_path: &Path, path: &Path, tools: &ToolConfig) -> Result<(), RenderError> {
    let out = File::create(path).map_err(|source| RenderError::Output {
        path: path.to_path_buf(),
        source,
    })?;

    let mut cmd = Command::new(&tools.dot2tex);
    cmd.arg(dot_path).stdout(out);
    let child = spawn(&mut cmd, &tools.dot2tex)?;
    wait(child, &tools.dot2tex)
}

fn spawn(cmd: &mut Command, tool: &str) -> Result<Child, RenderError> {
    log::info!("running {cmd:?}");
    cmd.spawn().map_err(|source| RenderError::Spawn {
        tool: tool.to_string(),
        source,
    })
}

fn feed(child: &mut Child, dot: &str, tool: &str) -> Result<(), RenderError> {
    let Some(mut stdin) = child.stdin.take() else {
        return Ok(());
    };

    match stdin.write_all(dot.as_bytes()) {
        // The tool stopped reading early. Its exit status tells what happened.
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            log::debug!("`{tool}` closed its input early");
            Ok(())
        }
        Err(source) => Err(RenderError::Pipe {
            tool: tool.to_string(),
            source,
        }),
        Ok(()) => Ok(()),
    }
}

fn wait(mut child: Child, tool: &str) -> Result<(), RenderError> {
    let status = child.wait().map_err(|source| RenderError::Spawn {
        tool: tool.to_string(),
        source,
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(RenderError::ToolFailed {
            tool: tool.to_string(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOT: &str = "digraph {\n}\n";

    fn tools(dot: &str, viewer: &str, unflatten: &str) -> ToolConfig {
        ToolConfig {
            dot: dot.to_string(),
            viewer: viewer.to_string(),
            unflatten: unflatten.to_string(),
            ..ToolConfig::default()
        }
    }

    #[test]
    fn targets_from_output() {
        let base = Path::new("/proj");
        assert_eq!(OutputTarget::from_output("", base).unwrap(), OutputTarget::Viewer);
        assert_eq!(OutputTarget::from_output("-", base).unwrap(), OutputTarget::Stdout);
        assert_eq!(
            OutputTarget::from_output("deps.svg", base).unwrap(),
            OutputTarget::Image {
                path: PathBuf::from("/proj/deps.svg"),
                format: "svg".to_string(),
            }
        );
        assert_eq!(
            OutputTarget::from_output("out/deps.tex", base).unwrap(),
            OutputTarget::Tex {
                path: PathBuf::from("/proj/out/deps.tex"),
                dot_path: PathBuf::from("/proj/out/deps.dot"),
            }
        );
        assert_eq!(
            OutputTarget::from_output("/abs/deps.pdf", base).unwrap(),
            OutputTarget::Image {
                path: PathBuf::from("/abs/deps.pdf"),
                format: "pdf".to_string(),
            }
        );
    }

    #[test]
    fn output_without_extension_is_rejected() {
        let err = OutputTarget::from_output("deps", Path::new(".")).unwrap_err();
        assert!(matches!(err, RenderError::MissingFormat(_)));
    }

    #[test]
    fn missing_tool_fails_to_spawn() {
        let tools = tools("lemma-deps-missing-dot", "lemma-deps-missing-viewer", "cat");
        let err = run_pipeline(&OutputTarget::Viewer, DOT, &tools, false).unwrap_err();
        assert!(
            matches!(&err, RenderError::Spawn { tool, .. } if tool == "lemma-deps-missing-viewer")
        );

        let err = run_pipeline(&OutputTarget::Viewer, DOT, &tools, true).unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
    }

    #[test]
    fn failing_tool_is_reported() {
        let tools = tools("dot", "false", "cat");
        let err = run_pipeline(&OutputTarget::Viewer, DOT, &tools, false).unwrap_err();
        assert!(matches!(&err, RenderError::ToolFailed { tool, .. } if tool == "false"));
    }

    #[test]
    fn failing_unflatten_is_reported_after_layout_exits() {
        let tools = tools("dot", "cat", "false");
        let err = run_pipeline(&OutputTarget::Viewer, DOT, &tools, true).unwrap_err();
        assert!(matches!(&err, RenderError::ToolFailed { tool, .. } if tool == "false"));
    }

    #[test]
    fn stdout_target_runs_no_tools() {
        let tools = tools(
            "lemma-deps-missing-dot",
            "lemma-deps-missing-viewer",
            "lemma-deps-missing-unflatten",
        );
        run_pipeline(&OutputTarget::Stdout, DOT, &tools, true).unwrap();
    }

    /// Shell scripts standing in for the Graphviz tools. `dot` copies its input
    /// to the `-o` file and its `-T` flag next to it. `unflatten` and `dot2tex`
    /// prefix what they pass on.
    fn fake_tools(dir: &Path) -> ToolConfig {
        use std::os::unix::fs::PermissionsExt;

        let scripts = [
            (
                "dot",
                "#!/bin/sh\n\
                 while [ $# -gt 1 ]; do\n\
                 case \"$1\" in -T*) fmt=\"$1\" ;; esac\n\
                 if [ \"$1\" = -o ]; then out=\"$2\"; fi\n\
                 shift\n\
                 done\n\
                 if [ -n \"$fmt\" ]; then echo \"$fmt\" > \"$out.fmt\"; fi\n\
                 cat > \"$out\"\n",
            ),
            ("unflatten", "#!/bin/sh\nprintf 'UNFLAT %s %s ' \"$1\" \"$2\"\ncat\n"),
            ("dot2tex", "#!/bin/sh\necho TEX\ncat \"$1\"\n"),
        ];

        std::fs::create_dir_all(dir).unwrap();
        for (name, text) in scripts {
            let path = dir.join(name);
            std::fs::write(&path, text).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let tool = |name: &str| dir.join(name).display().to_string();
        ToolConfig {
            dot: tool("dot"),
            unflatten: tool("unflatten"),
            unflatten_level: 7,
            viewer: tool("lemma-deps-missing-viewer"),
            dot2tex: tool("dot2tex"),
        }
    }

    #[test]
    fn tex_output_goes_through_dot2tex() {
        let dir = std::env::temp_dir().join(format!("lemma-deps-tex-{}", std::process::id()));
        let tools = fake_tools(&dir);
        let target = OutputTarget::from_output("deps.tex", &dir).unwrap();

        run_pipeline(&target, DOT, &tools, true).unwrap();

        let dot = std::fs::read_to_string(dir.join("deps.dot")).unwrap();
        assert_eq!(dot, "UNFLAT -l 7 digraph {\n}\n");
        let tex = std::fs::read_to_string(dir.join("deps.tex")).unwrap();
        assert_eq!(tex, "TEX\nUNFLAT -l 7 digraph {\n}\n");
        assert!(!dir.join("deps.dot.fmt").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn image_output_passes_format_to_dot() {
        let dir = std::env::temp_dir().join(format!("lemma-deps-image-{}", std::process::id()));
        let tools = fake_tools(&dir);
        let target = OutputTarget::from_output("deps.svg", &dir).unwrap();

        run_pipeline(&target, DOT, &tools, false).unwrap();

        let svg = std::fs::read_to_string(dir.join("deps.svg")).unwrap();
        assert_eq!(svg, DOT);
        let format = std::fs::read_to_string(dir.join("deps.svg.fmt")).unwrap();
        assert_eq!(format, "-Tsvg\n");
        assert!(!dir.join("deps.dot").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn pipes_graph_into_tool() {
        // `cat` stands in for the viewer; it reads the graph and exits cleanly.
        let tools = tools("dot", "cat", "unflatten");
        run_pipeline(&OutputTarget::Viewer, DOT, &tools, false).unwrap();
    }
}
