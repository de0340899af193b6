#[tokio::main]
async fn main() {
    let args: fassets::arguments::Arguments = shared::exit::parse_arguments();
    observe::tracing::initialize(&args.logging.observe_config());
    tracing::debug!("running fassets with arguments:\n{}", args);
    shared::exit::exit(fassets::run(args).await)
}
