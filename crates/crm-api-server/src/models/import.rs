use serde::Serialize;

/// Outcome of one bulk import job. `total` counts data rows seen before the
/// empty-row drop; `skipped` covers dropped rows plus duplicates. Callers
/// must inspect `errors` even on a successful response: a job with failed
/// batches still returns 200.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    pub total: usize,
    pub imported: usize,
    pub skipped: usize,
    pub duplicates: Vec<String>,
    pub errors: Vec<BatchError>,
}

/// One failed bulk insert. `batch` is the 0-based index of the batch within
/// the job.
#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub batch: usize,
    pub message: String,
}
