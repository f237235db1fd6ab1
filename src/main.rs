use dlp_client::config::Config;
use dlp_client::dlp::{
    character_mask_config, ContentItem, DeidentifyContentRequest, DlpJobType, InfoType,
    InspectConfig, InspectContentRequest, Likelihood, ListDeidentifyTemplatesRequest,
    ListDlpJobsRequest, ListInfoTypesRequest, ListInspectTemplatesRequest,
};
use dlp_client::{ClientConfig, DlpClient, ResourceNames};

/// Version injected at compile time via DLP_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("DLP_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::{pin_mut, TryStreamExt};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command-line client for Cloud DLP
#[derive(Parser, Debug)]
#[command(name = "dlp", version = VERSION, about, long_about = None)]
struct Args {
    /// GCP project to use
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Service endpoint (defaults to https://dlp.googleapis.com)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Bearer token to send instead of Application Default Credentials
    #[arg(long, env = "DLP_ACCESS_TOKEN", hide_env_values = true, global = true)]
    access_token: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the info types the service can detect
    InfoTypes {
        #[arg(long)]
        language_code: Option<String>,
        /// e.g. supported_by=INSPECT
        #[arg(long)]
        filter: Option<String>,
    },
    /// Inspect a string for sensitive data
    Inspect {
        text: String,
        #[arg(long = "info-type")]
        info_types: Vec<String>,
        /// very-unlikely, unlikely, possible, likely or very-likely
        #[arg(long)]
        min_likelihood: Option<Likelihood>,
    },
    /// Mask sensitive data in a string
    Mask {
        text: String,
        #[arg(long = "info-type")]
        info_types: Vec<String>,
        #[arg(long = "char", default_value_t = '*')]
        masking_character: char,
    },
    /// List DLP jobs
    ListJobs {
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, value_enum)]
        job_type: Option<JobTypeArg>,
        #[arg(long)]
        page_size: Option<i32>,
    },
    /// Show a DLP job
    GetJob { job_id: String },
    /// Delete a DLP job
    DeleteJob { job_id: String },
    /// Cancel a running DLP job
    CancelJob { job_id: String },
    /// List inspect templates
    ListInspectTemplates {
        #[arg(long)]
        organization: Option<String>,
    },
    /// Delete an inspect template
    DeleteInspectTemplate {
        template_id: String,
        #[arg(long)]
        organization: Option<String>,
    },
    /// List de-identify templates
    ListDeidentifyTemplates {
        #[arg(long)]
        organization: Option<String>,
    },
    /// Remember a default project for later runs
    SetProject { project_id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum JobTypeArg {
    Inspect,
    Risk,
}

impl From<JobTypeArg> for DlpJobType {
    fn from(arg: JobTypeArg) -> Self {
        match arg {
            JobTypeArg::Inspect => DlpJobType::InspectJob,
            JobTypeArg::Risk => DlpJobType::RiskAnalysisJob,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: cannot open log file {:?}: {}", log_path, e);
            return None;
        },
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("dlp {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("dlp").join("dlp.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".dlp").join("dlp.log");
    }
    PathBuf::from("dlp.log")
}

async fn build_client(args: &Args, config: ClientConfig) -> Result<DlpClient> {
    let client = match &args.access_token {
        Some(token) => DlpClient::with_access_token(config, token.clone()),
        None => DlpClient::new(config).await,
    };
    client.map_err(|e| anyhow::anyhow!(e.user_message()))
}

fn inspect_config(info_types: &[String], min_likelihood: Option<Likelihood>) -> InspectConfig {
    InspectConfig {
        info_types: info_types.iter().map(InfoType::new).collect(),
        min_likelihood,
        include_quote: true,
        ..InspectConfig::default()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();

    if let Command::SetProject { project_id } = &args.command {
        config.set_project(project_id)?;
        println!("Default project set to {}", project_id);
        return Ok(());
    }

    let project = config.effective_project(args.project.as_deref());
    if let Some(project) = &project {
        tracing::info!("Using project: {}", project);
    }

    let client = build_client(&args, config.to_client_config(args.endpoint.as_deref())).await?;

    if let Err(err) = run(&client, project.as_deref(), args.command).await {
        tracing::error!("Command failed: {:#}", err);
        return Err(err);
    }
    Ok(())
}

fn require_project(project: Option<&str>) -> Result<&str> {
    project.context(
        "No GCP project configured. Set GOOGLE_CLOUD_PROJECT, use --project or run `dlp set-project`",
    )
}

async fn run(client: &DlpClient, project: Option<&str>, command: Command) -> Result<()> {
    let names = client.names();

    match command {
        Command::InfoTypes {
            language_code,
            filter,
        } => {
            let response = client
                .list_info_types(&ListInfoTypesRequest {
                    language_code,
                    filter,
                })
                .await
                .context("Failed to list info types")?;
            for info_type in response.info_types {
                println!("{}\t{}", info_type.name, info_type.display_name);
            }
        },
        Command::Inspect {
            text,
            info_types,
            min_likelihood,
        } => {
            let parent = names.project_path(require_project(project)?)?;
            let response = client
                .inspect_content(&InspectContentRequest {
                    parent,
                    inspect_config: Some(inspect_config(&info_types, min_likelihood)),
                    item: Some(ContentItem::text(text)),
                    ..InspectContentRequest::default()
                })
                .await
                .context("Failed to inspect content")?;
            let result = response.result;
            if result.findings.is_empty() {
                println!("No findings.");
            }
            for finding in &result.findings {
                println!(
                    "{}\t{}\t{}",
                    finding.quote.as_deref().unwrap_or("-"),
                    finding
                        .info_type
                        .as_ref()
                        .map(|t| t.name.as_str())
                        .unwrap_or("-"),
                    finding.likelihood.unwrap_or_default().as_str()
                );
            }
            if result.findings_truncated {
                println!("(findings truncated)");
            }
        },
        Command::Mask {
            text,
            info_types,
            masking_character,
        } => {
            let parent = names.project_path(require_project(project)?)?;
            let response = client
                .deidentify_content(&DeidentifyContentRequest {
                    parent,
                    deidentify_config: Some(character_mask_config(masking_character)),
                    inspect_config: Some(inspect_config(&info_types, None)),
                    item: Some(ContentItem::text(text)),
                    ..DeidentifyContentRequest::default()
                })
                .await
                .context("Failed to de-identify content")?;
            let masked = response.item.and_then(|item| item.value).unwrap_or_default();
            println!("{}", masked);
        },
        Command::ListJobs {
            filter,
            job_type,
            page_size,
        } => {
            let parent = names.project_path(require_project(project)?)?;
            let request = ListDlpJobsRequest {
                parent,
                filter,
                page_size,
                job_type: job_type.map(DlpJobType::from),
                ..ListDlpJobsRequest::default()
            };
            let jobs = client.list_dlp_jobs_stream(&request);
            pin_mut!(jobs);
            while let Some(job) = jobs.try_next().await.context("Failed to list DLP jobs")? {
                let id = names
                    .match_dlp_job_from_dlp_job_name(&job.name)
                    .unwrap_or_else(|_| job.name.clone());
                let state = job
                    .state
                    .map(|s| format!("{:?}", s))
                    .unwrap_or_else(|| "-".to_string());
                let created = job
                    .create_time
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}", id, state, created);
            }
        },
        Command::GetJob { job_id } => {
            let name = names.dlp_job_path(require_project(project)?, &job_id)?;
            let job = client
                .get_dlp_job(&name)
                .await
                .with_context(|| format!("Failed to get {}", name))?;
            println!("{:#?}", job);
        },
        Command::DeleteJob { job_id } => {
            let name = names.dlp_job_path(require_project(project)?, &job_id)?;
            client
                .delete_dlp_job(&name)
                .await
                .with_context(|| format!("Failed to delete {}", name))?;
            println!("Deleted {}", name);
        },
        Command::CancelJob { job_id } => {
            let name = names.dlp_job_path(require_project(project)?, &job_id)?;
            client
                .cancel_dlp_job(&name)
                .await
                .with_context(|| format!("Failed to cancel {}", name))?;
            println!("Cancelled {}", name);
        },
        Command::ListInspectTemplates { organization } => {
            let parent = template_parent(names, organization.as_deref(), project)?;
            let templates = client
                .list_inspect_templates(&ListInspectTemplatesRequest {
                    parent,
                    ..ListInspectTemplatesRequest::default()
                })
                .await
                .context("Failed to list inspect templates")?;
            for template in templates {
                println!(
                    "{}\t{}",
                    template.name,
                    template.display_name.as_deref().unwrap_or("")
                );
            }
        },
        Command::DeleteInspectTemplate {
            template_id,
            organization,
        } => {
            let name = match organization.as_deref() {
                Some(org) => names.organization_inspect_template_path(org, &template_id)?,
                None => {
                    names.project_inspect_template_path(require_project(project)?, &template_id)?
                },
            };
            client
                .delete_inspect_template(&name)
                .await
                .with_context(|| format!("Failed to delete {}", name))?;
            println!("Deleted {}", name);
        },
        Command::ListDeidentifyTemplates { organization } => {
            let parent = template_parent(names, organization.as_deref(), project)?;
            let templates = client
                .list_deidentify_templates(&ListDeidentifyTemplatesRequest {
                    parent,
                    ..ListDeidentifyTemplatesRequest::default()
                })
                .await
                .context("Failed to list de-identify templates")?;
            for template in templates {
                println!(
                    "{}\t{}",
                    template.name,
                    template.display_name.as_deref().unwrap_or("")
                );
            }
        },
        Command::SetProject { .. } => anyhow::bail!("set-project does not talk to the service"),
    }

    Ok(())
}

/// Templates live under the organization when one is given, the project otherwise
fn template_parent(
    names: &ResourceNames,
    organization: Option<&str>,
    project: Option<&str>,
) -> Result<String> {
    match organization {
        Some(org) => Ok(names.organization_path(org)?),
        None => Ok(names.project_path(require_project(project)?)?),
    }
}
