use clap::Parser;
use tracing_error::ErrorLayer;
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "atelier", about = "Serve user-registered dynamic endpoints and pages")]
struct Args {
    #[arg(short, long, default_value_t = 8080, env = "ATELIER_PORT")]
    port: u16,
    /// SQLite database path, or `:memory:` for throwaway storage.
    #[arg(long, default_value = ":memory:", env = "ATELIER_DATABASE_URL")]
    database_url: String,
    /// HMAC key that session tokens are signed with.
    #[arg(long, env = "ATELIER_SESSION_SECRET")]
    session_secret: String,
    /// Wall-clock budget for a single handler invocation, in milliseconds.
    #[arg(long, default_value_t = 10_000, env = "ATELIER_HANDLER_TIMEOUT_MS")]
    handler_timeout_ms: u64,
    /// Whether deleting a project also deletes its endpoints and pages.
    #[arg(
        long,
        default_value_t = true,
        env = "ATELIER_CASCADE_DELETE",
        action = clap::ArgAction::Set
    )]
    cascade_delete: bool,
}

#[tokio::main]
async fn main() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hyper=off,info"));

    let subscriber = tracing_subscriber::Registry::default()
        .with(ErrorLayer::default())
        .with(env_filter)
        .with(tracing_subscriber::fmt::Layer::default());

    tracing::subscriber::set_global_default(subscriber)
        .expect("failed to setup tracing subscriber");

    let args = Args::parse();
    let config = atelier_server::Config {
        port: args.port,
        port_tx: None,
        database_url: args.database_url,
        session_secret: args.session_secret,
        handler_timeout_ms: args.handler_timeout_ms,
        cascade_delete: args.cascade_delete,
    };

    if let Err(error) = atelier_server::start(config, atelier_server::shutdown_signal()).await {
        tracing::error!(?error, "server exited with an error");
        std::process::exit(1);
    }
}
