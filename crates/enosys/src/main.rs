#[tokio::main]
async fn main() {
    let args: enosys::arguments::Arguments = shared::exit::parse_arguments();
    observe::tracing::initialize(&args.logging.observe_config());
    tracing::debug!("running enosys with arguments:\n{}", args);
    shared::exit::exit(enosys::run(args).await)
}
