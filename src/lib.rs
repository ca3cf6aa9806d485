pub mod advisor;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod http;
pub mod lookup;
pub mod models;
pub mod view;

pub use advisor::{Advisor, HeuristicAdvisor, create_advisor};
pub use config::Config;
pub use error::{AgriError, Result};
pub use models::{Diagnosis, FormInput, Recommendation};

// Initialise tracing once per binary. Logs go to stderr so CLI output stays clean.
pub fn init_tracing(log_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_level))
        .with_writer(std::io::stderr)
        .try_init();
}
