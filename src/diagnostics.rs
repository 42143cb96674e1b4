use crate::span::{SourceCache, Span};
use ustr::Ustr;

mod render;
pub mod specifics;

pub use render::render;

/// Results of document processing. On failure, carries every report collected
/// up to the failing checkpoint.
pub type WResult<T> = Result<T, Vec<Report>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationTy {
    Note,
    Info,
}

#[derive(Debug, Clone)]
pub struct Annotation {
    ty: AnnotationTy,
    span: Span,
    msg: Ustr,
}

#[derive(Debug, Clone)]
pub struct Report {
    level: ReportLevel,
    msg: Ustr,
    annotations: Vec<Annotation>,
}

impl Report {
    pub fn new(level: ReportLevel, msg: Ustr) -> Self {
        Self {
            level,
            msg,
            annotations: Vec::new(),
        }
    }

    pub fn with_info(mut self, span: Span, msg: Ustr) -> Self {
        self.annotations.push(Annotation {
            ty: AnnotationTy::Info,
            span,
            msg,
        });
        self
    }

    pub fn with_note(mut self, span: Span, msg: Ustr) -> Self {
        self.annotations.push(Annotation {
            ty: AnnotationTy::Note,
            span,
            msg,
        });
        self
    }

    pub fn level(&self) -> ReportLevel {
        self.level
    }

    pub fn msg(&self) -> Ustr {
        self.msg
    }
}

/// Collects reports while a document is processed.
#[derive(Debug, Default)]
pub struct ReportTracker {
    reports: Vec<Report>,
}

impl ReportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, report: Report) {
        self.reports.push(report);
    }

    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(|r| r.level == ReportLevel::Error)
    }

    /// Stop processing if any error has been reported so far.
    pub fn checkpoint(&mut self) -> WResult<()> {
        if self.has_errors() {
            Err(std::mem::take(&mut self.reports))
        } else {
            Ok(())
        }
    }

    pub fn into_reports(self) -> Vec<Report> {
        self.reports
    }
}

pub fn print_reports(reports: &[Report], sources: &SourceCache) {
    for report in reports {
        render(report, sources);
    }
}
