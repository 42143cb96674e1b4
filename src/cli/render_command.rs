use crate::{
    config::{DepsConfig, load_config},
    diagnostics::{ReportTracker, print_reports},
    document::{Document, scan_document},
    error::DepsError,
    graph::{DepGraph, RootSelection},
    render::{
        DotGraph, DotOptions,
        pipeline::{OutputTarget, run_pipeline},
    },
    span::SourceCache,
    util::ansi::{ANSI_BOLD, ANSI_GRAY, ANSI_GREEN, ANSI_RED, ANSI_RESET},
};
use argh::FromArgs;
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use itertools::Itertools;
use notify::Watcher;
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    sync::mpsc,
};

/// Render the dependency graph of a proof script with Graphviz.
#[derive(FromArgs)]
#[argh(subcommand, name = "render")]
pub struct RenderCommand {
    /// the proof script to scan.
    #[argh(option, short = 'f')]
    filename: Option<PathBuf>,

    /// roots to draw: `all`, a comma separated list, or `+name` for everything
    /// outside the dependencies of `name`.
    #[argh(option, short = 'r')]
    root: Option<String>,

    /// output file. The extension picks the format, `-` prints DOT.
    #[argh(option, short = 'o')]
    output: Option<String>,

    /// leave out edges implied by transitivity.
    #[argh(switch, short = 'a')]
    no_redundant: bool,

    /// pipe the graph through unflatten before the layout.
    #[argh(switch, short = 'u')]
    unflatten: bool,

    /// draw the layout chains as dashed edges.
    #[argh(switch, short = 'i')]
    show_invisible: bool,

    /// open the graph in the viewer instead of writing a file.
    #[argh(switch)]
    view: bool,

    /// render again whenever the proof script changes.
    #[argh(switch, short = 'w')]
    watch: bool,

    /// path to lemma-deps.toml config file.
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
}

/// Command line flags merged over the config file.
struct RenderSettings {
    document: PathBuf,
    selection: RootSelection,
    target: OutputTarget,
    reduce: bool,
    unflatten: bool,
    show_invisible: bool,
}

impl RenderSettings {
    fn resolve(cmd: &RenderCommand, config: &DepsConfig) -> Result<Self, DepsError> {
        let target = if cmd.view {
            OutputTarget::Viewer
        } else {
            match &cmd.output {
                Some(output) => OutputTarget::from_output(output, Path::new(""))?,
                None => OutputTarget::from_output(config.output(), config.base_dir())?,
            }
        };

        Ok(Self {
            document: cmd
                .filename
                .clone()
                .unwrap_or_else(|| config.document().to_path_buf()),
            selection: RootSelection::parse(cmd.root.as_deref().unwrap_or(config.root())),
            target,
            reduce: cmd.no_redundant,
            unflatten: cmd.unflatten || config.unflatten(),
            show_invisible: cmd.show_invisible,
        })
    }
}

pub struct Scanned {
    pub document: Document,
    pub graph: DepGraph,
}

/// Scan the proof script and build its dependency graph, printing any
/// diagnostics along the way.
pub fn scan(config: &DepsConfig, path: &Path) -> Result<Scanned, DepsError> {
    let mut sources = SourceCache::new(config.base_dir().to_path_buf());
    let source = sources
        .add_path(path)
        .map_err(|source| DepsError::Document {
            path: path.to_path_buf(),
            source,
        })?;

    let mut tracker = ReportTracker::new();
    let document = match scan_document(&sources, source, &mut tracker) {
        Ok(document) => document,
        Err(reports) => {
            print_reports(&reports, &sources);
            return Err(DepsError::Diagnostics {
                path: path.to_path_buf(),
            });
        }
    };
    print_reports(&tracker.into_reports(), &sources);

    let graph = DepGraph::build(&document, &sources, config.groups())?;
    Ok(Scanned { document, graph })
}

pub fn run_render(cmd: RenderCommand) -> Result<(), DepsError> {
    let config = load_config(cmd.config.as_deref())?;
    let settings = RenderSettings::resolve(&cmd, &config)?;

    if cmd.watch {
        watch(&config, &settings)
    } else {
        render(&config, &settings)
    }
}

fn render(config: &DepsConfig, settings: &RenderSettings) -> Result<(), DepsError> {
    let scanned = scan(config, &settings.document)?;
    let graph = &scanned.graph;

    _ = write_unused(&mut io::stderr().lock(), graph);

    let nodes = settings.selection.select(graph)?;
    let options = DotOptions {
        reduce: settings.reduce,
        show_invisible: settings.show_invisible,
        section_colors: config.section_colors(),
        chains: config.chains(),
    };
    let dot = DotGraph::plan(graph, &nodes, &options)?;

    _ = write_implied(&mut io::stderr().lock(), &dot);

    run_pipeline(&settings.target, &dot.to_string(), config.tools(), settings.unflatten)?;

    match &settings.target {
        OutputTarget::Image { path, .. } | OutputTarget::Tex { path, .. } => {
            println!(
                "{ANSI_GREEN}{ANSI_BOLD}Rendered{ANSI_RESET} {} nodes and {} edges to {}",
                nodes.len(),
                dot.edge_count(),
                path.display()
            );
        }
        OutputTarget::Stdout | OutputTarget::Viewer => {}
    }

    Ok(())
}

/// One unused obligation per line, sorted.
fn write_unused(out: &mut impl Write, graph: &DepGraph) -> io::Result<()> {
    for name in graph.unused() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

fn write_implied(out: &mut impl Write, dot: &DotGraph) -> io::Result<()> {
    for (from, implied) in dot.implied() {
        writeln!(
            out,
            "{ANSI_GRAY}Implied by transitivity:{ANSI_RESET} {from} -> {}",
            implied.iter().join(", ")
        )?;
    }
    Ok(())
}

fn watch(config: &DepsConfig, settings: &RenderSettings) -> Result<(), DepsError> {
    // Editors often replace the file instead of writing it, so watch the
    // directory and filter by file name.
    let watched_dir = match settings.document.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let watched_name = settings.document.file_name().map(|n| n.to_os_string());

    let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>();
    let mut watcher = notify::recommended_watcher(tx)?;
    watcher.watch(&watched_dir, notify::RecursiveMode::NonRecursive)?;

    for i in 1.. {
        let _ = rx.try_iter().count();

        // Clear the screen to print the new info
        _ = execute!(io::stdout(), Clear(ClearType::Purge), MoveTo(0, 0));
        println!("{ANSI_GRAY}[render #{i}]{ANSI_RESET}");

        if let Err(err) = render(config, settings) {
            eprintln!("{ANSI_RED}{ANSI_BOLD}error:{ANSI_RESET} {err}");
        }

        loop {
            let event = match rx.recv() {
                Ok(event) => event?,
                Err(_) => return Ok(()),
            };

            if matches!(event.kind, notify::EventKind::Access(_)) {
                continue;
            }
            if event
                .paths
                .iter()
                .any(|p| p.file_name() == watched_name.as_deref())
            {
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::tests::{CHAIN, graph_of},
        strings::CONFIG_FILE_NAME,
    };
    use std::{collections::BTreeMap, fs};

    fn command(args: &[&str]) -> RenderCommand {
        RenderCommand::from_args(&["render"], args)
            .unwrap_or_else(|e| panic!("bad arguments: {}", e.output))
    }

    #[test]
    fn flags_override_config() {
        let config = DepsConfig::parse(
            Path::new("/proj/lemma-deps.toml"),
            "[render]\nroot = \"preservation\"\noutput = \"deps.svg\"\n",
        )
        .unwrap();

        let settings = RenderSettings::resolve(&command(&[]), &config).unwrap();
        assert_eq!(settings.document, PathBuf::from("/proj/project.v"));
        assert_eq!(
            settings.selection,
            RootSelection::Roots(vec![ustr::Ustr::from("preservation")])
        );
        assert_eq!(
            settings.target,
            OutputTarget::Image {
                path: PathBuf::from("/proj/deps.svg"),
                format: "svg".to_string(),
            }
        );
        assert!(!settings.reduce);

        let settings = RenderSettings::resolve(
            &command(&["-f", "other.v", "-r", "all", "-o", "out/graph.png", "-a", "-u", "-i"]),
            &config,
        )
        .unwrap();
        assert_eq!(settings.document, PathBuf::from("other.v"));
        assert_eq!(settings.selection, RootSelection::All);
        assert_eq!(
            settings.target,
            OutputTarget::Image {
                path: PathBuf::from("out/graph.png"),
                format: "png".to_string(),
            }
        );
        assert!(settings.reduce && settings.unflatten && settings.show_invisible);

        let settings = RenderSettings::resolve(&command(&["--view"]), &config).unwrap();
        assert_eq!(settings.target, OutputTarget::Viewer);
    }

    #[test]
    fn scan_reports_missing_document() {
        let config =
            DepsConfig::parse(Path::new("/nonexistent-lemma-deps/lemma-deps.toml"), "").unwrap();
        let err = scan(&config, config.document()).err().unwrap();
        assert!(matches!(err, DepsError::Document { .. }));
    }

    #[test]
    fn scans_document_from_disk() {
        let dir = std::env::temp_dir().join(format!("lemma-deps-scan-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("project.v"),
            "Lemma a_one : True. Qed.\nLemma a_two : True. Proof. apply a_one. Qed.\n",
        )
        .unwrap();
        let config =
            DepsConfig::parse(&dir.join(CONFIG_FILE_NAME), "[groups]\nROOT = [\"a_two\"]\n")
                .unwrap();

        let scanned = scan(&config, config.document()).unwrap();
        assert_eq!(scanned.document.obligations().len(), 2);
        assert!(scanned.graph.unused().is_empty());

        fs::write(dir.join("project.v"), "Lemma x : True. Qed.\nLemma x : True. Qed.\n").unwrap();
        let err = scan(&config, config.document()).err().unwrap();
        assert!(matches!(err, DepsError::Diagnostics { .. }));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn notes_list_unused_and_implied_edges() {
        let graph = graph_of(CHAIN, &[]).unwrap();
        let nodes = RootSelection::All.select(&graph).unwrap();
        let colors = BTreeMap::new();
        let options = DotOptions {
            reduce: true,
            show_invisible: false,
            section_colors: &colors,
            chains: &[],
        };
        let dot = DotGraph::plan(&graph, &nodes, &options).unwrap();

        let mut unused = Vec::new();
        write_unused(&mut unused, &graph).unwrap();
        assert_eq!(String::from_utf8(unused).unwrap(), "lonely\ntop\n");

        let mut implied = Vec::new();
        write_implied(&mut implied, &dot).unwrap();
        assert_eq!(
            String::from_utf8(implied).unwrap(),
            format!("{ANSI_GRAY}Implied by transitivity:{ANSI_RESET} top -> base\n")
        );
    }
}
