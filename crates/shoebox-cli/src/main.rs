//! `shoebox`: command-line uploader for the Shoebox coordinator.
//!
//! Settings come from flags or the SHOEBOX_* environment variables (a `.env` file is
//! read first).

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use shoebox_api_client::{Auth, CoordinatorClient};
use shoebox_cli::{
    hash_password, init_tracing, BatchConfig, BatchRunner, FileOutcome, FileUploader,
    TracingObserver,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "shoebox", about = "Deduplicating media uploader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CoordinatorArgs {
    /// Base URL of the coordinator
    #[arg(long, env = "SHOEBOX_URL")]
    url: String,
    /// Basic auth username
    #[arg(long, env = "SHOEBOX_USERNAME", default_value = "")]
    username: String,
    /// Basic auth password
    #[arg(long, env = "SHOEBOX_PASSWORD", hide_env_values = true)]
    password: String,
}

impl CoordinatorArgs {
    fn client(self) -> anyhow::Result<CoordinatorClient> {
        CoordinatorClient::new(
            self.url,
            Auth::Basic {
                username: self.username,
                password: self.password,
            },
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Upload every media file in the pending directory, moving finished files to done
    Batch {
        #[command(flatten)]
        coordinator: CoordinatorArgs,
        /// Directory of files waiting for upload
        #[arg(long, env = "SHOEBOX_PENDING_DIR")]
        pending_dir: PathBuf,
        /// Directory finished files are moved to
        #[arg(long, env = "SHOEBOX_DONE_DIR")]
        done_dir: PathBuf,
        /// Flag uploads as non-production
        #[arg(long)]
        test_upload: bool,
    },
    /// Upload a single file as a test upload; the file is not moved
    Upload {
        #[command(flatten)]
        coordinator: CoordinatorArgs,
        /// File to upload
        #[arg(long)]
        file: PathBuf,
    },
    /// Read a password from stdin and print its bcrypt hash for BCRYPT_PASS
    HashPassword,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Batch {
            coordinator,
            pending_dir,
            done_dir,
            test_upload,
        } => {
            let client = coordinator.client()?;
            let config = BatchConfig {
                pending_dir,
                done_dir,
                test_upload,
            };
            let runner = BatchRunner::new(client, config, Arc::new(TracingObserver));
            runner.run().await?;
        }
        Commands::Upload { coordinator, file } => {
            let client = coordinator.client()?;
            let uploader = FileUploader::new(client, true, Arc::new(TracingObserver));
            let outcome = uploader.process(&file, 1, 1).await?;
            if outcome == FileOutcome::NotMedia {
                anyhow::bail!("{} is not a media file", file.display());
            }
        }
        Commands::HashPassword => {
            let mut password = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut password)
                .context("Failed to read password from stdin")?;
            let password = password.trim_end_matches(['\r', '\n']);
            if password.is_empty() {
                anyhow::bail!("Password must not be empty");
            }
            println!("{}", hash_password(password).context("Failed to hash password")?);
        }
    }

    Ok(())
}
