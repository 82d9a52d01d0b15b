use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};

use analogous_edit::config::{DEFAULT_BASE_URL, EndpointConfig, PLACEHOLDER_API_KEY};
use analogous_edit::llm::{self, EditSuggestion};
use analogous_edit::logging;
use analogous_edit::palette::Palette;
use analogous_edit::utils::pluralize_with;

#[derive(Parser, Debug)]
#[command(
    name = "analogous-edit",
    version,
    about = "Apply an example edit to new text with a local language model.",
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct EndpointArgs {
    /// Base URL of the OpenAI-compatible API
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// API key sent with each request. Local servers usually ignore it
    #[arg(long, value_name = "KEY", default_value = PLACEHOLDER_API_KEY)]
    api_key: String,
}

impl From<EndpointArgs> for EndpointConfig {
    fn from(args: EndpointArgs) -> Self {
        EndpointConfig::new(args.base_url).with_api_key(args.api_key)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask the model to apply the before/after edit to new text
    Edit {
        /// Text of the example before editing
        #[arg(long, value_name = "TEXT")]
        before: String,
        /// Text of the example after editing
        #[arg(long, value_name = "TEXT")]
        after: String,
        /// Text to apply a similar edit to
        #[arg(long, value_name = "TEXT")]
        text: String,
        /// Read the reply as a reason/edit pair and highlight the changes
        #[arg(long, default_value_t = false)]
        parsed: bool,
        #[command(flatten)]
        endpoint: EndpointArgs,
    },
    /// List the models the endpoint serves
    Check {
        #[command(flatten)]
        endpoint: EndpointArgs,
    },
}

#[tokio::main]
async fn main() {
    logging::init_tracing();
    if let Err(err) = run_cli().await {
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Edit {
            before,
            after,
            text,
            parsed,
            endpoint,
        } => {
            let client = llm::build_client(&endpoint.into());
            let reply = llm::request_edit(&client, &before, &after, &text).await?;
            if parsed {
                print_suggestion(&EditSuggestion::parse(&reply)?);
            } else {
                println!("{reply}");
            }
        }
        Command::Check { endpoint } => {
            let config: EndpointConfig = endpoint.into();
            let client = llm::build_client(&config);
            let models = llm::healthcheck_client(&client).await?;
            if models.is_empty() {
                bail!("{} is reachable but serves no models", config.base_url);
            }
            println!(
                "{} is serving {}:",
                Palette::paint(Palette::INFO, &config.base_url),
                pluralize_with("model", models.len(), |n| Palette::paint(
                    Palette::WARNING,
                    n
                ))
            );
            for model in models {
                println!("  {}", Palette::paint(Palette::SUCCESS, model));
            }
        }
    }

    Ok(())
}

fn print_suggestion(suggestion: &EditSuggestion) {
    println!("{} {}", Palette::dim("reason:"), suggestion.reason);
    println!("{} {}", Palette::dim("edit:"), suggestion.highlighted());
}
