use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use vkup::{Res, cli, config, error, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Upload directories as playlists
    Upload(UploadOptions),

    /// Show the albums directories would produce, without uploading
    Scan(ScanOptions),

    /// Obtain or validate the access token
    Auth(AuthOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Path to the credentials file
    #[clap(short, long, value_name = "CREDS_PATH")]
    pub creds: Option<PathBuf>,

    /// Path to the token file
    #[clap(short, long, value_name = "TOKEN_PATH")]
    pub token: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct UploadOptions {
    /// Upload to a group instead of the user page
    #[clap(short, long, value_name = "GROUP_ID", allow_hyphen_values = true)]
    pub group: Option<i64>,

    #[clap(flatten)]
    pub auth: AuthOptions,

    /// Process directories recursively
    #[clap(short, long)]
    pub recursive: bool,

    /// Hide playlists from search
    #[clap(short = 'H', long)]
    pub hidden: bool,

    /// Open created playlists in the browser
    #[clap(long)]
    pub open: bool,

    /// Directories to upload
    #[clap(value_name = "DIRECTORY", required = true)]
    pub dirs: Vec<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ScanOptions {
    /// Process directories recursively
    #[clap(short, long)]
    pub recursive: bool,

    /// Directories to scan
    #[clap(value_name = "DIRECTORY", required = true)]
    pub dirs: Vec<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

async fn run(command: Command) -> Res<()> {
    match command {
        Command::Upload(opt) => {
            cli::upload(cli::UploadRequest {
                dirs: opt.dirs,
                group: opt.group,
                credentials: opt.auth.creds,
                token: opt.auth.token,
                recursive: opt.recursive,
                hidden: opt.hidden,
                open: opt.open,
            })
            .await
        }
        Command::Scan(opt) => cli::scan(opt.dirs, opt.recursive).await,
        Command::Auth(opt) => cli::auth(opt.creds, opt.token).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    // Dropping `run` on Ctrl-C still removes the transcoding directory.
    let result = tokio::select! {
        result = run(cli.command) => result,
        _ = tokio::signal::ctrl_c() => {
            warning!("Exiting...");
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}
