use clap::{Args as ClapArgs, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// Fleet total-cost-of-ownership and BEV feasibility report.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Workbook to analyse: an `.xlsx`/`.xlsm` file, or a directory with
    /// `tours.csv`, `vehicles.csv` and `TCO-calculation.csv`.
    pub workbook: PathBuf,

    /// Where to write the JSON report.
    #[clap(long, default_value = "report.json", env = "REPORT_OUTPUT")]
    pub output: PathBuf,

    /// Also export the per-vehicle table as CSV.
    #[clap(long, env = "VEHICLES_CSV")]
    pub vehicles_csv: Option<PathBuf>,

    /// Rows shown in each console preview table.
    #[clap(long, default_value = "5", env = "PREVIEW_ROWS")]
    pub preview_rows: usize,

    /// Daily energy budget used when the workbook does not state one.
    #[clap(long, default_value = "1000", env = "DEFAULT_ENERGY_LIMIT_KWH")]
    pub default_energy_limit_kwh: f64,

    #[clap(flatten)]
    pub ai: AiArgs,
}

#[derive(Clone, ClapArgs)]
pub struct AiArgs {
    /// Ask the language model for a narrative summary of the report.
    #[clap(long = "enable-ai-summary", env = "ENABLE_AI_SUMMARY")]
    pub enabled: bool,

    #[clap(long = "google-api-key", env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[clap(long = "google-ai-model", default_value = "models/gemini-pro", env = "GOOGLE_AI_MODEL")]
    pub model: String,

    #[clap(long = "ai-timeout-seconds", default_value = "12", env = "AI_TIMEOUT_SECONDS")]
    pub timeout_seconds: f64,
}

impl AiArgs {
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds).unwrap_or(Duration::from_secs(12))
    }
}
