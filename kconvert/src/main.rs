use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kconvert::Kustomization;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract image tags and secret generators from manifests into a kustomization.
    Convert {
        #[clap(required = true)]
        manifests: Vec<PathBuf>,
        /// Write `kustomization.yaml` and the remaining resources to this directory instead of
        /// printing the kustomization.
        #[clap(long)]
        out_dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Convert { manifests, out_dir } => {
            let mut resources = kconvert::load_resources(&manifests)?;
            let mut kustomization = Kustomization::default();
            kconvert::convert(&mut kustomization, &mut resources).context("converting manifests")?;

            match out_dir {
                None => serde_yaml::to_writer(std::io::stdout(), &kustomization)?,
                Some(dir) => kconvert::write_dir(&dir, kustomization, &resources)?,
            }
        }
    }

    Ok(())
}
