use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::ValidationConfig;
use crate::middleware::{ApiRequest, ApiResponse, RequestVerdict, ValidationMiddleware};
use crate::router::{RouteLookup, Router};
use crate::spec::{load_spec, SpecDocument};
use crate::validator::print_errors;

/// Command-line interface for oasguard
#[derive(Parser, Debug)]
#[command(name = "oasguard")]
#[command(about = "OpenAPI request/response validation", long_about = None)]
pub struct Cli {
    /// Log level when OASGUARD_LOG_LEVEL/RUST_LOG are unset
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a specification and print a summary
    Check {
        #[arg(short, long)]
        spec: PathBuf,
    },
    /// List every documented operation
    Routes {
        #[arg(short, long)]
        spec: PathBuf,
    },
    /// Resolve a request path to its documented operation
    Match {
        #[arg(short, long)]
        spec: PathBuf,

        #[arg(short, long, default_value = "GET")]
        method: String,

        #[arg(short, long)]
        path: String,

        /// Mount prefix stripped before matching
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Validate a request body, or a response body when --status is given
    Validate {
        #[arg(short, long)]
        spec: PathBuf,

        #[arg(short, long)]
        method: String,

        /// Request path, including any query string
        #[arg(short, long)]
        path: String,

        /// Validate as a response with this status code
        #[arg(long)]
        status: Option<u16>,

        /// File holding the payload; omit for an empty body
        #[arg(short, long)]
        body: Option<PathBuf>,

        #[arg(long, default_value = "application/json")]
        content_type: String,

        /// YAML middleware configuration; OASGUARD_* variables still apply
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Parse arguments, initialize logging and run the command.
pub fn run_cli() -> Result<ExitCode> {
    let cli = Cli::parse();
    crate::logging::init_logging(&cli.log_level)?;
    execute(&cli)
}

/// Run a parsed command. `Ok(ExitCode::FAILURE)` reports an invalid payload
/// or an undocumented path; `Err` is reserved for unusable input.
pub fn execute(cli: &Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Check { spec } => {
            let doc = load(spec)?;
            println!("✅ {} {} (OpenAPI {})", doc.title(), doc.api_version(), doc.openapi_version());
            println!("   paths:       {}", doc.paths().len());
            println!("   operations:  {}", doc.operations().count());
            println!("   components:  {}", doc.component_names().len());
            println!("   fingerprint: {}", doc.fingerprint());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Routes { spec } => {
            let doc = load(spec)?;
            for (template, item) in doc.paths() {
                let mut operations: Vec<_> = item.operations.values().collect();
                operations.sort_by(|a, b| a.method.as_str().cmp(b.method.as_str()));
                for op in operations {
                    let id = op.operation_id.as_deref().unwrap_or("-");
                    println!("{:<7} {template:<40} {id}", op.method.as_str());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Match {
            spec,
            method,
            path,
            prefix,
        } => {
            let doc = load(spec)?;
            let method = parse_method(method)?;
            let mut router = Router::new(&doc);
            if let Some(prefix) = prefix {
                router = router.with_prefix(prefix.as_str());
            }
            match router.lookup(&method, path) {
                RouteLookup::Matched(m) => {
                    println!("{} {} -> {}", method, m.template, m.operation.label());
                    for (name, value) in &m.path_params {
                        println!("   {name} = {value}");
                    }
                    Ok(ExitCode::SUCCESS)
                }
                RouteLookup::MethodNotDocumented { template } => {
                    println!("❌ {method} is not documented for {template}");
                    Ok(ExitCode::FAILURE)
                }
                RouteLookup::PathNotDocumented => {
                    println!("❌ {path} is not documented");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Validate {
            spec,
            method,
            path,
            status,
            body,
            content_type,
            config,
        } => {
            let mut cfg = match config {
                Some(path) => ValidationConfig::from_file(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?,
                None => ValidationConfig::default(),
            }
            .apply_env()
            .context("Invalid OASGUARD_* environment")?;
            // an explicit --status is always validated
            cfg.response.validate_success_only = false;
            cfg.strict = true;

            let doc = Arc::new(load(spec)?);
            let middleware = ValidationMiddleware::new(doc, cfg);
            let payload = match body {
                Some(file) => std::fs::read(file)
                    .with_context(|| format!("Failed to read body {}", file.display()))?,
                None => Vec::new(),
            };
            let request: ApiRequest = http::Request::builder()
                .method(parse_method(method)?)
                .uri(path.as_str())
                .header(CONTENT_TYPE, content_type.as_str())
                .body(if status.is_some() { Vec::new() } else { payload.clone() })
                .context("Invalid request")?;

            let (subject, errors) = match (middleware.validate_request(&request), status) {
                (RequestVerdict::Undocumented, _) => bail!("{path} is not documented"),
                (RequestVerdict::NotFound(errors), _) => ("Request", errors),
                (RequestVerdict::Invalid(_, errors), None) => ("Request", errors),
                (RequestVerdict::Valid(_), None) => ("Request", Vec::new()),
                (RequestVerdict::Valid(route) | RequestVerdict::Invalid(route, _), Some(code)) => {
                    let mut response = ApiResponse::new(payload);
                    *response.status_mut() = StatusCode::from_u16(*code)
                        .with_context(|| format!("Invalid status code {code}"))?;
                    response.headers_mut().insert(
                        CONTENT_TYPE,
                        content_type
                            .parse::<http::HeaderValue>()
                            .context("Invalid content type")?,
                    );
                    ("Response", middleware.validate_response(&route, &response))
                }
            };

            if errors.is_empty() {
                println!("✅ {subject} is valid");
                Ok(ExitCode::SUCCESS)
            } else {
                print_errors(subject, &errors);
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn load(path: &Path) -> Result<SpecDocument> {
    load_spec(path).with_context(|| format!("Failed to load specification {}", path.display()))
}

fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method {method:?}"))
}
