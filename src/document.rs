use crate::{
    diagnostics::{ReportTracker, WResult, specifics},
    span::{SourceCache, SourceId, Span},
    strings,
};
use aho_corasick::{AhoCorasick, MatchKind};
use line_span::LineSpanExt;
use rustc_hash::FxHashMap;
use std::{ops::Range, sync::LazyLock};
use ustr::Ustr;

/// The keyword that opens a proof obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObligationKind {
    Lemma,
    Theorem,
    Corollary,
}

impl ObligationKind {
    const ALL: [Self; 3] = [Self::Lemma, Self::Corollary, Self::Theorem];

    pub fn keyword(self) -> Ustr {
        match self {
            Self::Lemma => *strings::LEMMA,
            Self::Theorem => *strings::THEOREM,
            Self::Corollary => *strings::COROLLARY,
        }
    }
}

/// The keyword that closes a proof obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofEnd {
    Qed,
    Defined,
    Admitted,
    Abort,
}

impl ProofEnd {
    const ALL: [Self; 4] = [Self::Qed, Self::Defined, Self::Admitted, Self::Abort];

    pub fn keyword(self) -> Ustr {
        match self {
            Self::Qed => *strings::QED,
            Self::Defined => *strings::DEFINED,
            Self::Admitted => *strings::ADMITTED,
            Self::Abort => *strings::ABORT,
        }
    }

    /// Whether the proof was actually carried out.
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Qed | Self::Defined)
    }
}

// Pattern `i` is the terminator of `ProofEnd::ALL[i]`.
static TERMINATORS: LazyLock<AhoCorasick> = LazyLock::new(|| {
    let patterns = ProofEnd::ALL.map(|end| format!("{}.", end.keyword()));
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostFirst)
        .build(patterns)
        .expect("proof terminators are plain literals")
});

#[derive(Debug, Clone, Copy)]
pub struct Obligation {
    name: Ustr,
    kind: ObligationKind,
    end: ProofEnd,
    body: Span,
    line: usize,
    lines: usize,
    section: Option<Ustr>,
}

impl Obligation {
    pub fn name(&self) -> Ustr {
        self.name
    }

    pub fn kind(&self) -> ObligationKind {
        self.kind
    }

    pub fn end(&self) -> ProofEnd {
        self.end
    }

    /// From just after the statement's colon up to the closing keyword.
    pub fn body(&self) -> Span {
        self.body
    }

    /// 1-based line of the opening keyword.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Number of source lines the obligation spans.
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn section(&self) -> Option<Ustr> {
        self.section
    }
}

pub struct Document {
    obligations: Vec<Obligation>,
    sections: Vec<Ustr>,
}

impl Document {
    fn new() -> Self {
        Self {
            obligations: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Obligations in source order.
    pub fn obligations(&self) -> &[Obligation] {
        &self.obligations
    }

    /// Section header titles in source order.
    pub fn sections(&self) -> &[Ustr] {
        &self.sections
    }
}

pub fn scan_document(
    sources: &SourceCache,
    source: SourceId,
    tracker: &mut ReportTracker,
) -> WResult<Document> {
    let text = sources.get_text(source);
    let make_span = |start: usize, end: usize| Span::new(source, start, end);

    let mut doc = Document::new();
    let mut declared: FxHashMap<Ustr, Span> = FxHashMap::default();
    let mut section = None;

    // Everything before `cursor` belongs to an earlier match.
    let mut cursor = 0;
    let mut line_number = 1;
    let mut counted_to = 0;

    for line in text.line_spans() {
        let start = line.start();
        if start < cursor {
            continue;
        }

        if let Some(opening) = match_opening(&text[start..]) {
            let name = Ustr::from(&text[start + opening.name.start..start + opening.name.end]);
            let body_start = start + opening.body_start;

            match TERMINATORS.find(&text[body_start..]) {
                Some(m) => {
                    let end = body_start + m.end();
                    line_number += count_newlines(&text[counted_to..start]);
                    counted_to = start;

                    let obligation = Obligation {
                        name,
                        kind: opening.kind,
                        end: ProofEnd::ALL[m.pattern().as_usize()],
                        body: make_span(body_start, body_start + m.start()),
                        line: line_number,
                        lines: count_newlines(&text[start..end]) + 1,
                        section,
                    };

                    match declared.get(&name) {
                        Some(&previous) => tracker.add_message(specifics::duplicate_obligation(
                            make_span(start, start + opening.name.end),
                            opening.kind,
                            name,
                            previous,
                        )),
                        None => {
                            declared.insert(name, make_span(start, start + opening.name.end));
                            doc.obligations.push(obligation);
                        }
                    }

                    log::debug!("scanned {name} at line {line_number}");
                    cursor = end;
                    continue;
                }
                None => {
                    tracker.add_message(specifics::unterminated_obligation(
                        make_span(start, start + opening.name.end),
                        opening.kind,
                        name,
                    ));
                    continue;
                }
            }
        }

        if let Some(title) = match_section_header(line.as_str()) {
            let title = Ustr::from(title);
            section = Some(title);
            doc.sections.push(title);
        }
    }

    tracker.checkpoint()?;
    Ok(doc)
}

/// Split a proof body into candidate references: maximal runs of lowercase
/// ASCII letters, digits and underscores.
pub fn identifiers(body: &str) -> impl Iterator<Item = &str> {
    body.split(|c: char| !is_ident_char(c))
        .filter(|s| !s.is_empty())
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

fn leading_whitespace(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

struct Opening {
    kind: ObligationKind,
    /// Relative to the start of the line.
    name: Range<usize>,
    /// Relative to the start of the line.
    body_start: usize,
}

/// Match `Keyword <ws>+ name <ws>* :` at the start of `rest`.
fn match_opening(rest: &str) -> Option<Opening> {
    let kind = ObligationKind::ALL
        .into_iter()
        .find(|k| rest.starts_with(k.keyword().as_str()))?;

    let mut pos = kind.keyword().len();
    let ws = leading_whitespace(&rest[pos..]);
    if ws == 0 {
        return None;
    }
    pos += ws;

    let name_len = rest[pos..].chars().take_while(|&c| is_ident_char(c)).count();
    if name_len == 0 {
        return None;
    }
    let name = pos..pos + name_len;
    pos += name_len;

    pos += leading_whitespace(&rest[pos..]);
    if !rest[pos..].starts_with(':') {
        return None;
    }

    Some(Opening {
        kind,
        name,
        body_start: pos + 1,
    })
}

fn match_section_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(strings::SECTION_OPEN)?;
    let close = rest.rfind(strings::SECTION_CLOSE)?;
    Some(&rest[..close])
}
