use clap::Parser;
use ft_svg_bind::cli::Cli;
use ft_svg_bind::config::Config;
use ft_svg_bind::run;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load();

    if let Err(e) = run(cli.command, &config) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
