use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use memeforge::{
    AssetSources, BotConfig, CommandExecutor as _, Dispatcher, FsSource, MediaEngine,
    MemorySource, MessageContext, Reply, Router, UserDirectory, UserRef, builtin_table,
    required_assets,
};

#[derive(Parser, Debug)]
#[command(name = "memeforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to the chat gateway and answer commands.
    Run(BotConfig),
    /// Render one command offline, using local files as avatars.
    Render(RenderArgs),
    /// Print the command table as JSON.
    Commands(CommandsArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Command token, without prefix.
    #[arg(long)]
    command: String,

    /// Free text following the command.
    #[arg(long, default_value = "")]
    caption: String,

    /// Avatar image of a target user; repeat for commands with several targets.
    #[arg(long = "avatar")]
    avatars: Vec<PathBuf>,

    /// Display name for the target with the same position; defaults to the file stem.
    #[arg(long = "name")]
    names: Vec<String>,

    /// Directory holding templates and fonts.
    #[arg(long, env = "ASSETS_ROOT", default_value = "assets")]
    assets_root: PathBuf,

    #[arg(long, default_value_t = memeforge::engine::media::DEFAULT_AVATAR_SIZE)]
    avatar_size: u32,

    /// Output file (.png or .gif, matching the command's output).
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct CommandsArgs {
    /// Also list template assets and whether they exist under this root.
    #[arg(long)]
    check_assets: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    memeforge::config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(cfg) => cmd_run(cfg).await,
        Command::Render(args) => cmd_render(args).await,
        Command::Commands(args) => cmd_commands(args),
    }
}

async fn cmd_run(cfg: BotConfig) -> anyhow::Result<()> {
    let token = cfg.validate()?.to_string();
    tracing::info!(config = ?cfg, "starting");

    let table = Arc::new(builtin_table()?);
    for missing in missing_assets(&table, &cfg.assets_root) {
        tracing::warn!(asset = %missing, root = %cfg.assets_root.display(), "template asset missing");
    }

    let http = reqwest::Client::builder()
        .user_agent(concat!("memeforge/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("build http client")?;
    let engine = MediaEngine::new(
        table.clone(),
        AssetSources::standard(&cfg.assets_root, http),
    )
    .with_avatar_size(cfg.avatar_size)
    .with_prefix(cfg.prefix.clone());
    let router = Router::new(cfg.prefix.clone(), table).ignore_bots(cfg.ignore_bots);
    let dispatcher = Dispatcher::new(router, Arc::new(engine));

    if let Some(port) = cfg.keepalive_port {
        tokio::spawn(async move {
            if let Err(e) = memeforge::keepalive::serve(port).await {
                tracing::error!(error = %e, "keep-alive server failed");
            }
        });
    }

    memeforge::discord::handler::run(&token, dispatcher).await?;
    Ok(())
}

async fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let table = Arc::new(builtin_table()?);
    let command = table
        .lookup(&args.command)
        .cloned()
        .with_context(|| format!("unknown command '{}'", args.command))?;

    let mut avatars = MemorySource::new();
    let mut targets = Vec::with_capacity(args.avatars.len());
    for (i, path) in args.avatars.iter().enumerate() {
        let name = args.names.get(i).cloned().unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("user{i}"))
        });
        let user = UserRef::new(format!("local-{i}"), name, format!("user{i}"))
            .with_avatar(format!("file://{}", path.display()));
        let bytes = std::fs::read(path)
            .with_context(|| format!("read avatar '{}'", path.display()))?;
        if let Some(url) = user.avatar_url(args.avatar_size) {
            avatars.insert(url, bytes);
        }
        targets.push(user);
    }

    let sources = AssetSources::new(
        Arc::new(FsSource::new(&args.assets_root)),
        Arc::new(avatars),
    );
    let engine = MediaEngine::new(table, sources).with_avatar_size(args.avatar_size);
    let ctx = MessageContext {
        raw_text: format!("!{} {}", command.token, args.caption),
        mentioned_users: targets,
        invoking_user: UserRef::new("local-self", "You", "you"),
        known_users: UserDirectory::new(),
    };

    match engine.execute(&command, &ctx).await? {
        Some(Reply::File(media)) => {
            std::fs::write(&args.out, &media.buffer)
                .with_context(|| format!("write '{}'", args.out.display()))?;
            println!(
                "wrote {} ({}, {} bytes)",
                args.out.display(),
                media.mime_type,
                media.buffer.len()
            );
        }
        Some(Reply::Text(text)) => println!("{text}"),
        Some(Reply::Embed(embed)) => println!("{} <{}>", embed.title, embed.url),
        None => println!("command produced no reply"),
    }
    Ok(())
}

fn cmd_commands(args: CommandsArgs) -> anyhow::Result<()> {
    let table = builtin_table()?;
    let listing = table.iter().collect::<Vec<_>>();
    println!("{}", serde_json::to_string_pretty(&listing)?);

    if let Some(root) = args.check_assets {
        let missing = missing_assets(&table, &root);
        for asset in required_assets(&table) {
            let state = if missing.contains(&asset) { "missing" } else { "ok" };
            eprintln!("{state:>7}  {asset}");
        }
    }
    Ok(())
}

fn missing_assets(table: &memeforge::CommandTable, root: &Path) -> Vec<String> {
    required_assets(table)
        .into_iter()
        .filter(|a| !root.join(a).is_file())
        .collect()
}
