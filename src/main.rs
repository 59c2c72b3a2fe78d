use graphmine::cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let status = cli::run(std::env::args_os());
    std::process::exit(status.code());
}
