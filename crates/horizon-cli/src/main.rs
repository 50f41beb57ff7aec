use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "horizon",
    about = "Horizon — predictive horizontal autoscaling",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one evaluation cycle.
    ///
    /// Reads the current evaluation (`{"targetReplicas": n}`) from stdin and
    /// prints the predicted evaluation to stdout.
    Evaluate {
        /// Predictive configuration file
        #[arg(short, long)]
        config: String,
        /// Evaluation store (default: dbPath from the configuration)
        #[arg(long)]
        db: Option<String>,
    },
    /// Print the stored evaluation history of a model, oldest first
    History {
        #[arg(short, long)]
        config: String,
        /// Model name
        #[arg(short, long)]
        model: String,
        #[arg(long)]
        db: Option<String>,
    },
    /// Parse and validate a predictive configuration file
    Validate {
        #[arg(short, long)]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("horizon=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate { config, db } => {
            commands::evaluate::evaluate(&config, db.as_deref()).await
        }
        Commands::History { config, model, db } => {
            commands::history::history(&config, &model, db.as_deref())
        }
        Commands::Validate { config } => commands::validate::validate(&config),
    }
}
