use std::{path::PathBuf, sync::Arc};

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use tokio::sync::Mutex;
use tunematch::{
    cli, config, error, importer::ImportOptions, matching::ResolverOptions, types::PkceToken,
};

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
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Match a library and import it into Spotify
    Import(ImportArgs),

    /// Match a single library track
    Match(MatchArgs),

    /// Show cached matches of a library
    Matches(MatchesArgs),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct MatchingFlags {
    /// Do not penalize tracks that only appear on compilations
    #[clap(long)]
    pub allow_compilations: bool,

    /// Ask instead of guessing when several tracks match equally well
    #[clap(long)]
    pub no_guess: bool,
}

impl MatchingFlags {
    fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            prefer_original: !self.allow_compilations,
            guess_matching: !self.no_guess,
            ..Default::default()
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// Path to the iTunes Library.xml export
    pub library: PathBuf,

    /// Also save every matched track to your Spotify library
    #[clap(long)]
    pub add_to_library: bool,

    /// Do not create the "iTunes Library" playlist
    #[clap(long)]
    pub no_library_playlist: bool,

    /// Do not import the library's playlists
    #[clap(long)]
    pub no_playlists: bool,

    /// Import unchecked tracks too
    #[clap(long)]
    pub import_disabled: bool,

    /// Create public playlists
    #[clap(long)]
    pub public: bool,

    #[clap(flatten)]
    pub matching: MatchingFlags,
}

impl ImportArgs {
    fn options(&self) -> ImportOptions {
        let matching = self.matching.resolver_options();
        ImportOptions {
            add_to_library: self.add_to_library,
            library_as_playlist: !self.no_library_playlist,
            import_playlists: !self.no_playlists,
            prefer_original: matching.prefer_original,
            guess_matching: matching.guess_matching,
            import_disabled: self.import_disabled,
            public_playlists: self.public,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct MatchArgs {
    /// Path to the iTunes Library.xml export
    pub library: PathBuf,

    /// Track ID as listed in the library
    pub track_id: i64,

    #[clap(flatten)]
    pub matching: MatchingFlags,
}

#[derive(Parser, Debug, Clone)]
pub struct MatchesArgs {
    /// Path to the iTunes Library.xml export
    pub library: PathBuf,

    /// Only list tracks recorded as having no match
    #[clap(long)]
    pub unmatched: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => {
            let oauth_result: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
            cli::auth(Arc::clone(&oauth_result)).await;
        }
        Command::Import(args) => cli::import(&args.library, args.options()).await,
        Command::Match(args) => {
            cli::match_track(&args.library, args.track_id, args.matching.resolver_options()).await
        }
        Command::Matches(args) => cli::list_matches(&args.library, args.unmatched).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
