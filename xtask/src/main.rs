use anyhow::Result;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::Command;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest with default configuration
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Materialize a throwaway fake .git tree for manual probing
    Fixture {
        /// Directory to create the fixture repository in
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::Fixture { path } => write_fixture(path)?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo nextest run failed");
    }
    Ok(())
}

fn write_fixture(path: PathBuf) -> Result<()> {
    let git = path.join(".git");
    fs::create_dir_all(git.join("refs/heads"))?;
    fs::create_dir_all(git.join("refs/remotes/origin"))?;
    fs::create_dir_all(git.join("refs/tags"))?;

    fs::write(git.join("HEAD"), "ref: refs/heads/main\n")?;
    fs::write(git.join("COMMIT_EDITMSG"), "Add fixture commit\n")?;
    fs::write(git.join("refs/heads/main"), format!("{}\n", "0".repeat(40)))?;
    fs::write(git.join("refs/heads/dev"), format!("{}\n", "1".repeat(40)))?;
    fs::write(git.join("refs/tags/v0.1.0"), format!("{}\n", "2".repeat(40)))?;

    println!("fixture repository written to {}", path.display());
    Ok(())
}
