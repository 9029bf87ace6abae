/// The per-conformation scans that report fine-grained progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// Fitting every conformation onto the reference.
    Superposition,
    /// Filling the rows of the pairwise RMSD matrix.
    PairwiseRmsd,
}

impl Scan {
    pub fn label(&self) -> &'static str {
        match self {
            Scan::Superposition => "Fitting conformations",
            Scan::PairwiseRmsd => "Pairwise RMSD",
        }
    }
}

/// Events emitted while an ensemble is superposed or analyzed.
///
/// Workflows bracket their stages with `PhaseStart`/`PhaseFinish`. Inside a
/// stage, a scan announces how many conformations it will visit and then
/// emits one event per conformation, in completion order (which is not the
/// index order when the `parallel` feature is on).
#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    ScanStart { scan: Scan, conformations: u64 },
    /// Conformation `index` was fitted and transformed.
    ConformationFitted { index: usize },
    /// Row `index` of the pairwise RMSD matrix is complete.
    RowComputed { index: usize },
    ScanFinish { scan: Scan },

    /// One round of iterative superposition finished; `rmsd_change` is the
    /// RMSD between the previous and the new mean structure.
    Iteration { step: usize, rmsd_change: f64 },

    Message(String),
}

impl Progress {
    /// Whether this event advances a scan by one conformation.
    pub fn is_scan_step(&self) -> bool {
        matches!(
            self,
            Progress::ConformationFitted { .. } | Progress::RowComputed { .. }
        )
    }
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Hands [`Progress`] events to an optional callback; without one, events
/// are dropped. Tasks share the reporter across rayon workers, hence the
/// `Send + Sync` bound on the callback.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    pub fn message(&self, text: impl Into<String>) {
        self.report(Progress::Message(text.into()));
    }

    /// Reports `PhaseStart`, runs `stage`, then reports `PhaseFinish`
    /// whether or not the stage succeeded.
    pub fn phase<T>(&self, name: &'static str, stage: impl FnOnce() -> T) -> T {
        self.report(Progress::PhaseStart { name });
        let result = stage();
        self.report(Progress::PhaseFinish);
        result
    }
}
