use crate::model::Project;

/// Returns the changed files that fall under `project`, relative to its path.
///
/// Membership is a literal byte-prefix test on the full path, so a project
/// path of `"api"` also claims `"api-docs/x"`. Files under no project are
/// simply not returned. Order is preserved and nothing is deduplicated
/// across projects.
pub fn classify(project: &Project, changed_files: &[String]) -> Vec<String> {
    changed_files
        .iter()
        .filter_map(|file| file.strip_prefix(project.path.as_str()))
        .map(ToString::to_string)
        .collect()
}
