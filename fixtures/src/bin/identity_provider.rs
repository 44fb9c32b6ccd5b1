use clap::Parser;
use fixtures::{identity_provider::IdentityProvider, run_server, FixtureArgs};

/// Microsoft Entra ID fixture server
///
/// Point the web server at it with `AUTHORITY=http://127.0.0.1:<port>` and
/// `GRAPH_URL=http://127.0.0.1:<port>`.
#[derive(Parser, Debug)]
#[clap(name = "identity-provider-fixture")]
struct Cli {
    #[clap(flatten)]
    common: FixtureArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let app = IdentityProvider::new().router();

    run_server(args.common, app).await
}
