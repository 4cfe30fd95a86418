// CLI commands: run-and-grade, poll, config bootstrap
use anyhow::{bail, Context, Result};
use clap::Args;
use codelab_client::{CancellationSignal, JudgeClient, RunRequest};
use codelab_common::config::ClientConfig;
use codelab_common::report::GradedReport;
use codelab_common::types::{Language, TestCaseSpec};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// File containing the candidate's source code
    #[arg(short, long)]
    pub code: std::path::PathBuf,

    /// JSON file with an array of test-case descriptors
    #[arg(short, long)]
    pub tests: std::path::PathBuf,

    /// Snippet appended to the code to invoke the function under test
    #[arg(short, long)]
    pub function_call: Option<String>,

    /// python or sql (defaults to the configured language)
    #[arg(short, long)]
    pub language: Option<Language>,

    /// Judge-side execution timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(long)]
    pub question_id: Option<String>,

    #[arg(long)]
    pub test_id: Option<String>,

    #[arg(long)]
    pub user_id: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Resolve configuration: file (or defaults), then environment, then flags
pub fn load_config(path: Option<&Path>, judge_url: Option<&str>) -> Result<ClientConfig> {
    let base = match path {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ClientConfig::default(),
    };

    let mut config = base
        .with_overrides(|name| std::env::var(name).ok())
        .context("Invalid environment override")?;

    if let Some(url) = judge_url {
        config.judge_url = url.to_string();
    }

    config.validate().context("Invalid client configuration")?;
    Ok(config)
}

/// Read test-case descriptors; any JSON element is accepted
pub fn read_test_cases(path: &Path) -> Result<Vec<TestCaseSpec>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read test cases {}", path.display()))?;
    let raw: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse test cases {}", path.display()))?;

    match raw {
        Value::Array(items) => Ok(items.into_iter().map(TestCaseSpec::from).collect()),
        _ => bail!("Test cases file must contain a JSON array"),
    }
}

pub fn render_report(report: &GradedReport) -> String {
    let mut out = String::from("Test Cases:\n");
    for label in &report.per_case_labels {
        out.push_str(&format!("  {}\n", label));
    }
    out.push_str(&report.message);
    if !report.raw_output.is_empty() {
        out.push_str("\n\nOutput:\n");
        out.push_str(&report.raw_output);
    }
    out
}

/// Cancel the signal on Ctrl-C
fn cancel_on_ctrl_c(cancel: &CancellationSignal) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, cancelling");
            cancel.cancel();
        }
    });
}

/// Run and grade; returns whether every test case passed
pub async fn run(args: RunArgs, config: ClientConfig) -> Result<bool> {
    let code = fs::read_to_string(&args.code)
        .with_context(|| format!("Failed to read source {}", args.code.display()))?;
    if code.trim().is_empty() {
        bail!("Source file {} is empty", args.code.display());
    }
    let test_cases = read_test_cases(&args.tests)?;

    let mut request = RunRequest::new(code, test_cases);
    request.function_call = args.function_call;
    request.language = args.language;
    request.timeout_seconds = args.timeout;
    request.question_id = args.question_id;
    request.test_id = args.test_id;
    request.user_id = args.user_id;

    let client = JudgeClient::from_config(config).context("Failed to create judge client")?;
    info!(
        judge_url = %client.config().judge_url,
        test_cases = request.test_cases.len(),
        "Processing..."
    );

    let cancel = CancellationSignal::new();
    cancel_on_ctrl_c(&cancel);

    let run = client.run_and_grade(&request, &cancel).await;
    if let Some(e) = &run.error {
        warn!(error = %e, "Run did not produce a graded result");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run.report)?);
    } else {
        println!("{}", render_report(&run.report));
    }

    Ok(run.passed())
}

/// Poll an existing submission and print the raw execution result
pub async fn poll(submission_id: &str, max_wait: Option<u64>, config: ClientConfig) -> Result<()> {
    let max_wait = Duration::from_secs(max_wait.unwrap_or(config.poll_timeout_secs));
    let client = JudgeClient::from_config(config).context("Failed to create judge client")?;

    let cancel = CancellationSignal::new();
    cancel_on_ctrl_c(&cancel);

    let result = client
        .poll_until_complete(submission_id, max_wait, &cancel)
        .await
        .with_context(|| format!("Submission {} did not complete", submission_id))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Write a default config file, refusing to overwrite
pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json_content = serde_json::to_string_pretty(&ClientConfig::default())
        .context("Failed to serialize config")?;
    fs::write(path, json_content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created: {}", path.display());
    Ok(())
}
