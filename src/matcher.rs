use crate::model::Job;

/// Whether the job's branch pattern matches the whole ref.
pub fn branch_matches(job: &Job, ref_: &str) -> bool {
    job.branch_matcher.is_match(ref_)
}

/// Whether at least one project relative path contains a diff pattern match.
pub fn diff_matches(job: &Job, relative_files: &[String]) -> bool {
    relative_files
        .iter()
        .any(|file| job.diff_matcher.is_match(file))
}

/// Decides whether `job` fires for a push to `ref_` touching `relative_files`.
///
/// An empty file set never fires, whatever the patterns.
pub fn matches(job: &Job, ref_: &str, relative_files: &[String]) -> bool {
    !relative_files.is_empty() && branch_matches(job, ref_) && diff_matches(job, relative_files)
}
