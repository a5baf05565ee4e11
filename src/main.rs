use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use hedera_tracker::{
    config::Config,
    feed::FeedView,
    filter::{FilterMode, FilterState},
    gui,
    mirror::{MirrorClient, Order, TransactionQuery},
    server,
    utils::{format_tinybars, format_timestamp},
};

#[derive(Parser)]
#[command(name = "hedera-tracker", version, about = "Track Hedera and EVM transactions")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the desktop dashboard (default)
    Gui,
    /// Run the local mirror-node proxy
    Serve(ServeArgs),
    /// Fetch once and print the filtered feed
    Fetch(FetchArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
    /// Refuse to start without valid ACCOUNT_ID / PRIVATE_KEY
    #[arg(long)]
    require_operator: bool,
}

#[derive(Args)]
struct FetchArgs {
    /// Only transactions of this account (shard.realm.num)
    #[arg(long)]
    account: Option<String>,
    /// Substring to match against entity id or timestamp
    #[arg(long, default_value = "")]
    query: String,
    /// Fee band: all, high-fee or low-fee
    #[arg(long, default_value = "all")]
    mode: FilterMode,
    /// Number of transactions to request (1-100)
    #[arg(long)]
    limit: Option<u32>,
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread().enable_all().build()?)
}

fn run_fetch(config: &Config, args: FetchArgs) -> Result<()> {
    let client = MirrorClient::from_config(config)?;
    let query = TransactionQuery {
        account_id: args.account,
        limit: args.limit,
        order: Some(Order::Desc),
    };

    let mut feed = FeedView::new();
    feed.begin_fetch();
    let result = runtime()?.block_on(client.fetch(&query));
    feed.apply_fetch(result);
    if let Some(e) = feed.last_error() {
        return Err(e.clone().into());
    }

    let filter = FilterState::new(args.query, args.mode);
    let stats = feed.stats();
    println!("Network: {} ({})", config.network.label(), config.mirror_node_url);
    println!("Total transactions: {}", stats.count);
    println!(
        "Average fee: {}",
        stats
            .average_fee
            .map(|fee| format_tinybars(Some(fee)))
            .unwrap_or_else(|| "no data".to_string())
    );
    println!();

    let rows = feed.project(&filter);
    if rows.is_empty() {
        println!(
            "{}",
            if filter.is_active() && stats.count > 0 {
                "No transactions match your filters"
            } else {
                "No transactions found"
            }
        );
    }
    for record in rows {
        println!(
            "{:<14} {:<20} {:>18}",
            record.entity_id.as_deref().unwrap_or("-"),
            format_timestamp(record.consensus_timestamp.as_deref()),
            format_tinybars(record.charged_fee),
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command.unwrap_or(Command::Gui) {
        Command::Gui => gui::launch(config)?,
        Command::Serve(args) => {
            if let Some(port) = args.port {
                config.proxy.port = port;
            }
            config.proxy.require_operator |= args.require_operator;
            runtime()?.block_on(server::serve(&config))?;
        }
        Command::Fetch(args) => run_fetch(&config, args)?,
    }

    Ok(())
}
