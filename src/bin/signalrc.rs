// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::env;
use std::path::{Path, PathBuf};

use clap::{App, Arg, SubCommand};
use tokio::runtime;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use signalrc::config::{self, Settings};
use signalrc::fork::Detached;
use signalrc::launcher;
use signalrc::status::{self, ProcFs};
use signalrc::Error;

const BASE_DIR: &str = "base-dir";
const CONFIG: &str = "config";
const VERBOSE: &str = "verbose";
const START: &str = "start";
const STATUS: &str = "status";

trait SetupClapApp {
    fn setup_clap_app(self) -> Self;
}

impl<'a, 'b> SetupClapApp for App<'a, 'b> {
    fn setup_clap_app(self) -> Self {
        self.version(env!("CARGO_PKG_VERSION"))
            .author(env!("CARGO_PKG_AUTHORS"))
    }
}

fn app() -> App<'static, 'static> {
    App::new(env!("CARGO_PKG_NAME"))
        .setup_clap_app()
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::with_name(BASE_DIR)
                .long(BASE_DIR)
                .value_name("DIR")
                .global(true)
                .takes_value(true)
                .help("directory all relative paths are anchored to, defaults to $SIGNALRC_HOME or the executable's directory"),
        )
        .arg(
            Arg::with_name(CONFIG)
                .short("c")
                .long(CONFIG)
                .value_name("FILE")
                .global(true)
                .takes_value(true)
                .help("configuration file, relative to the base directory"),
        )
        .arg(
            Arg::with_name(VERBOSE)
                .short("v")
                .long(VERBOSE)
                .global(true)
                .multiple(true)
                .help("more diagnostics on stderr, repeat for more"),
        )
        .subcommand(
            SubCommand::with_name(START)
                .setup_clap_app()
                .about("start all components (default)"),
        )
        .subcommand(
            SubCommand::with_name(STATUS)
                .setup_clap_app()
                .about("show which components are running"),
        )
}

fn init_tracing(verbosity: u64) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // stdout carries the startup log
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Error> {
    let args = app().get_matches();

    init_tracing(args.occurrences_of(VERBOSE));

    let base_dir = config::resolve_base_directory(args.value_of_os(BASE_DIR))?;
    env::set_current_dir(&base_dir).map_err(|e| Error::at_path(&base_dir, e))?;
    debug!("base directory {}", base_dir.display());

    let config_path = args.value_of_os(CONFIG).map(PathBuf::from);
    let settings = Settings::load(&base_dir, config_path.as_deref())?;

    let runtime = runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match args.subcommand() {
        (START, Some(_)) | ("", None) => runtime.block_on(start(settings, &base_dir)),
        (STATUS, Some(_)) => show_status(&settings),
        (arg, _) => {
            println!("unexpected argument: {}", arg);
            println!("{}", args.usage());
            std::process::exit(2);
        }
    }
}

async fn start(mut settings: Settings, base_dir: &Path) -> Result<(), Error> {
    // `.env` only fills in what the environment does not already set
    let dotenv = config::read_dotenv(base_dir);
    settings.attach_credentials(|k| env::var(k).ok().or_else(|| dotenv.get(k).cloned()));

    let spawner = Detached::new(&settings.base_dir);
    let report = launcher::start(&settings, spawner).await?;

    info!("{}", report.summary());
    Ok(())
}

fn show_status(settings: &Settings) -> Result<(), Error> {
    for line in status::status_lines(&settings.components, &ProcFs::default()) {
        println!("{}", line);
    }

    Ok(())
}
