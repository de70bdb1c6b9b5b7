use std::fmt::Write;

use crate::engine::DispatchReport;
use crate::model::{CompiledConfig, Job};

use super::styling::{failure, heading, muted, success};
use super::tables::{or_dash, outcome_cell, table_with_header};

/// Prints every configured job, grouped by repository and project.
pub fn print_config(config: &CompiledConfig) {
    println!("{}", render_config(config));
}

/// Prints the jobs a push would trigger.
pub fn print_plan(repository: &str, ref_: &str, jobs: &[&Job]) {
    println!("{}", render_plan(repository, ref_, jobs));
}

/// Prints the outcome of each trigger request.
pub fn print_report(report: &DispatchReport) {
    println!("{}", render_report(report));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{emoji} {}", heading(title));
}

fn render_config(config: &CompiledConfig) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🗂️", "Configuration");
    let _ = writeln!(
        output,
        "  Jenkins: {}  {}",
        config.jenkins.url,
        muted(format!("timeout {}s", config.jenkins.timeout.as_secs()))
    );
    let _ = writeln!(output, "  GitHub:  {}", config.github.api_url);

    let mut table = table_with_header(&[
        "Repository",
        "Project",
        "Job",
        "Branch",
        "Diff",
        "Parameters",
    ]);
    for repo in &config.repositories {
        for project in &repo.projects {
            for job in &project.jobs {
                table.add_row(vec![
                    repo.name.clone(),
                    or_dash(&project.path),
                    job.name.clone(),
                    job.branch_pattern().to_string(),
                    job.diff_matcher.as_str().to_string(),
                    or_dash(&job.parameters.to_string()),
                ]);
            }
        }
    }
    let _ = writeln!(output, "{table}");
    let _ = write!(
        output,
        "{}",
        success(format!(
            "✓ {} repositories, {} jobs",
            config.repositories.len(),
            config.job_count()
        ))
    );
    output
}

fn render_plan(repository: &str, ref_: &str, jobs: &[&Job]) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🧭", &format!("Plan for {repository} {ref_}"));

    if jobs.is_empty() {
        let _ = write!(output, "{}", muted("No jobs match this push"));
        return output;
    }

    let mut table = table_with_header(&["Job", "Endpoint", "Parameters"]);
    for job in jobs {
        let endpoint = if job.parameters.is_empty() {
            "build"
        } else {
            "buildWithParameters"
        };
        table.add_row(vec![
            job.name.clone(),
            endpoint.to_string(),
            or_dash(&job.parameters.to_string()),
        ]);
    }
    let _ = write!(output, "{table}");
    output
}

fn render_report(report: &DispatchReport) -> String {
    let mut output = String::new();
    add_section_header(
        &mut output,
        "🚀",
        &format!("Triggered for {} {}", report.repository, report.ref_),
    );

    if report.outcomes.is_empty() {
        let _ = write!(output, "{}", muted("No jobs match this push"));
        return output;
    }

    let mut table = table_with_header(&["Job", "Status", "Error"]);
    for outcome in &report.outcomes {
        table.add_row(vec![
            outcome.job.clone().into(),
            outcome_cell(outcome.succeeded),
            or_dash(outcome.error.as_deref().unwrap_or_default()).into(),
        ]);
    }
    let _ = writeln!(output, "{table}");

    let summary = if report.all_succeeded() {
        success(format!("✓ {} jobs triggered", report.outcomes.len()))
    } else {
        failure(format!(
            "✗ {} of {} jobs failed",
            report.failures(),
            report.outcomes.len()
        ))
    };
    let _ = write!(output, "{summary}");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawProject;
    use crate::jenkins::TriggerOutcome;
    use crate::model::tests::{raw_config, raw_job, secrets};
    use chrono::Utc;

    fn config() -> CompiledConfig {
        let mut job = raw_job("deploy", "master", "^src/");
        job.parameters = crate::parameters::RawParameters::Expression("env=prod".to_string());
        let raw = raw_config(
            "http://jenkins",
            vec![RawProject {
                path: String::new(),
                jobs: vec![job, raw_job("test", ".*", ".*")],
            }],
        );
        CompiledConfig::compile(&raw, &secrets()).unwrap()
    }

    #[test]
    fn test_render_config_lists_jobs_without_tokens() {
        let rendered = render_config(&config());
        assert!(rendered.contains("deploy"));
        assert!(rendered.contains("env=prod"));
        assert!(rendered.contains("2 jobs"));
        assert!(rendered.contains("master"));
        assert!(!rendered.contains("^(?:"));
        assert!(!rendered.contains("resolved-token"));
    }

    #[test]
    fn test_render_plan() {
        let config = config();
        let jobs: Vec<&Job> = config.repositories[0].projects[0].jobs.iter().collect();
        let rendered = render_plan("repo", "master", &jobs);
        assert!(rendered.contains("buildWithParameters"));
        assert!(rendered.contains("test"));

        let empty = render_plan("repo", "master", &[]);
        assert!(empty.contains("No jobs match"));
    }

    #[test]
    fn test_render_report_counts_failures() {
        let report = DispatchReport {
            repository: "repo".to_string(),
            ref_: "master".to_string(),
            triggered_at: Utc::now(),
            outcomes: vec![
                TriggerOutcome {
                    job: "a".to_string(),
                    succeeded: true,
                    error: None,
                },
                TriggerOutcome {
                    job: "b".to_string(),
                    succeeded: false,
                    error: Some("Received error response status 503".to_string()),
                },
            ],
        };

        let rendered = render_report(&report);
        assert!(rendered.contains("1 of 2 jobs failed"));
        assert!(rendered.contains("503"));
    }
}
