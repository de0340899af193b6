#[tokio::main]
async fn main() {
    let args: wallet::arguments::Arguments = shared::exit::parse_arguments();
    observe::tracing::initialize(&args.logging.observe_config());
    tracing::debug!("running wallet with arguments:\n{}", args);
    shared::exit::exit(wallet::run(args).await)
}
