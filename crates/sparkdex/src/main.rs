#[tokio::main]
async fn main() {
    let args: sparkdex::arguments::Arguments = shared::exit::parse_arguments();
    observe::tracing::initialize(&args.logging.observe_config());
    tracing::debug!("running sparkdex with arguments:\n{}", args);
    shared::exit::exit(sparkdex::run(args).await)
}
