use anyhow::Result;
use clap::Parser;
use clothy::ai::GeminiTryOnClient;
use clothy::config::Config;
use clothy::download::save_result;
use clothy::workflow::{Role, WorkflowController, WorkflowState};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "clothy")]
#[command(about = "Dress a person photo in a clothing photo with a generative image model")]
struct CliArgs {
    /// Photo of the person to dress.
    #[arg(long, value_name = "PATH")]
    person: PathBuf,

    /// Photo of the clothing item.
    #[arg(long, value_name = "PATH")]
    clothing: PathBuf,

    /// Directory the result is downloaded to.
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Gemini model ID.
    #[arg(long)]
    model: Option<String>,

    /// Alternative API endpoint.
    #[arg(long)]
    base_url: Option<String>,

    /// Abort the generation request after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clothy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    if let Some(base_url) = args.base_url {
        config = config.with_base_url(base_url);
    }
    config = config.with_timeout(args.timeout_secs.map(Duration::from_secs));

    info!("Starting clothy (model: {})", config.model);

    let controller = WorkflowController::new(Box::new(GeminiTryOnClient::from_config(&config)));
    controller
        .set_upload(Role::Person, Some(args.person.as_path()))
        .await;
    controller
        .set_upload(Role::Clothing, Some(args.clothing.as_path()))
        .await;

    match controller.request_generation().await {
        WorkflowState::Succeeded { result } => {
            let path = save_result(&args.out_dir, &result).await?;
            println!("{}", path.display());
            Ok(())
        }
        _ => {
            let message = controller
                .error()
                .unwrap_or_else(|| "Try-on did not complete".to_string());
            eprintln!("{}", message);
            std::process::exit(1);
        }
    }
}
