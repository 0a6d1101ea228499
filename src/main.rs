use {
    clap::{error::ErrorKind, Parser},
    ddc_write::{os_primary_source, transport},
    log::error,
    std::process::ExitCode,
};

mod args;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = match args::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return ExitCode::SUCCESS
            },
            _ => {
                let _ = e.print();
                println!("\n{}", args::USAGE);
                return ExitCode::FAILURE
            },
        },
    };

    let config = cli.config();
    let request = cli.request();
    let result = transport::select(&config, transport::probes())
        .and_then(|mut transport| request.execute(&mut transport, &*os_primary_source(&config)));

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            println!("Changing value failed");
            ExitCode::FAILURE
        },
    }
}
