use crate::{
    document::{ObligationKind, ProofEnd},
    graph::{DepGraph, NodeKind},
    util::{
        ansi::{ANSI_BOLD, ANSI_GRAY, ANSI_GREEN, ANSI_RED, ANSI_RESET, ANSI_YELLOW},
        plural,
    },
};
use itertools::Itertools;
use ustr::Ustr;

const HEAVIEST_SHOWN: usize = 5;

#[derive(Debug)]
pub struct DepsReport {
    lemma_cnt: usize,
    theorem_cnt: usize,
    corollary_cnt: usize,
    section_cnt: usize,
    incomplete: Vec<(Ustr, ProofEnd)>,
    unused: Vec<Ustr>,
    implied_cnt: usize,
    edge_cnt: usize,
    heaviest: Vec<(Ustr, usize)>,
}

impl DepsReport {
    pub fn new(graph: &DepGraph, section_cnt: usize) -> Self {
        let mut report = Self {
            lemma_cnt: 0,
            theorem_cnt: 0,
            corollary_cnt: 0,
            section_cnt,
            incomplete: Vec::new(),
            unused: graph.unused(),
            implied_cnt: 0,
            edge_cnt: graph.edge_count(),
            heaviest: Vec::new(),
        };

        for name in graph.obligations() {
            let NodeKind::Obligation { kind, end, .. } = graph.kind(name) else {
                continue;
            };

            match kind {
                ObligationKind::Lemma => report.lemma_cnt += 1,
                ObligationKind::Theorem => report.theorem_cnt += 1,
                ObligationKind::Corollary => report.corollary_cnt += 1,
            }
            if !end.is_complete() {
                report.incomplete.push((name, end));
            }
        }

        report.implied_cnt = graph
            .names()
            .iter()
            .map(|&n| graph.reduce(n).implied.len())
            .sum();

        report.heaviest = graph
            .obligations()
            .map(|n| (n, graph.total_lines(n)))
            .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
            .take(HEAVIEST_SHOWN)
            .collect();

        report
    }

    pub fn total_cnt(&self) -> usize {
        self.lemma_cnt + self.theorem_cnt + self.corollary_cnt
    }

    pub fn incomplete(&self) -> &[(Ustr, ProofEnd)] {
        &self.incomplete
    }

    pub fn unused(&self) -> &[Ustr] {
        &self.unused
    }

    pub fn implied_cnt(&self) -> usize {
        self.implied_cnt
    }

    pub fn heaviest(&self) -> &[(Ustr, usize)] {
        &self.heaviest
    }

    /// Every proof is closed with `Qed` or `Defined`.
    pub fn all_closed(&self) -> bool {
        self.incomplete.is_empty()
    }
}

/// Print the report and return whether every proof is closed.
pub fn display_report(report: &DepsReport) -> bool {
    println!(
        "Scanned {} obligation{} ({} lemmas, {} theorems, {} corollaries) in {} section{}:",
        report.total_cnt(),
        plural(report.total_cnt()),
        report.lemma_cnt,
        report.theorem_cnt,
        report.corollary_cnt,
        report.section_cnt,
        plural(report.section_cnt),
    );

    let closed_cnt = report.total_cnt() - report.incomplete().len();
    println!(
        " {ANSI_GREEN}✓{ANSI_RESET} {ANSI_BOLD}{closed_cnt}{ANSI_RESET} proof{} closed.",
        plural(closed_cnt)
    );

    if !report.incomplete().is_empty() {
        let n = report.incomplete().len();
        println!(
            " {ANSI_YELLOW}!{ANSI_RESET} {ANSI_BOLD}{n}{ANSI_RESET} proof{} admitted or aborted.",
            plural(n)
        );
        print_names(report.incomplete().iter().map(|(name, end)| format!("{name} ({end:?})")));
    }

    if !report.unused().is_empty() {
        let n = report.unused().len();
        println!(
            " {ANSI_RED}✗{ANSI_RESET} {ANSI_BOLD}{n}{ANSI_RESET} obligation{} nothing depends on.",
            plural(n)
        );
        print_names(report.unused().iter().map(|name| name.to_string()));
    }

    println!(
        " {ANSI_GRAY}~{ANSI_RESET} {ANSI_BOLD}{}{ANSI_RESET} of {} edge{} implied by transitivity.",
        report.implied_cnt(),
        report.edge_cnt,
        plural(report.edge_cnt)
    );

    if !report.heaviest().is_empty() {
        println!();
        println!("Largest dependency footprints (lines):");
        for (name, lines) in report.heaviest() {
            println!("   {lines:>6}  {name}");
        }
    }

    let all_ok = report.all_closed();
    if all_ok {
        println!();
        println!("All proofs closed.");
    }

    all_ok
}

fn print_names(names: impl Iterator<Item = String>) {
    print!("     -");
    for (i, name) in names.enumerate() {
        if i > 0 {
            print!(",");
        }
        print!(" {name}");
    }
    println!();
}
