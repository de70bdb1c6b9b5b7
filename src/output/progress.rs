use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{failure, pending, success};

/// Spinner shown on stderr while trigger requests are in flight
pub struct DispatchProgress {
    pb: ProgressBar,
}

impl DispatchProgress {
    pub fn start(jobs: usize) -> Self {
        let pb = create_spinner(pending(format!("Calling Jenkins for {jobs} jobs")).to_string());
        Self { pb }
    }

    pub fn finish(self, failures: usize) {
        let message = if failures == 0 {
            success("Jenkins accepted every trigger ✓").to_string()
        } else {
            failure(format!("Jenkins rejected or missed {failures} triggers ✗")).to_string()
        };
        self.pb.finish_with_message(message);
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_spinner().template("  {msg} {spinner}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
