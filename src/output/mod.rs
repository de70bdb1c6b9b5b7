mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::DispatchProgress;
pub use summary::{print_config, print_plan, print_report};

use styling::{brand, muted};

/// Prints the banner to stderr.
pub fn print_banner() {
    eprintln!(
        "\n{} {}\n  {}\n",
        brand("🔔 github2jenkins"),
        muted(env!("CARGO_PKG_VERSION")),
        muted("pushes in, Jenkins builds out")
    );
}
