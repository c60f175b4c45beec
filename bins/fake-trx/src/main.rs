use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use std::net::{IpAddr, Ipv4Addr};

use trx_config::{DEFAULT_BB_BASE_PORT, DEFAULT_BTS_BASE_PORT, SharedConfig, StackConfig, TrxDef, toml_config};
use trx_core::debug;
use trx_entities::{Event, FakeTrx};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Virtual Um-interface (fake transceiver)",
    long_about = "Connects GSM Layer-1 implementations (BTS and MS side) over the TRXC/TRXD interface \
                  and forwards bursts between them, simulating a radio channel"
)]
struct Args {
    /// Optional TOML config; without one, a BTS and an MS transceiver are set up from the options below
    #[arg(help = "TOML config with clock, power measurement and transceiver parameters")]
    config: Option<String>,

    /// Local address all transceiver sockets bind to
    #[arg(short = 'b', long = "trx-bind-addr")]
    trx_bind_addr: Option<IpAddr>,

    /// BTS remote address
    #[arg(short = 'R', long = "bts-addr", default_value = "127.0.0.1")]
    bts_addr: IpAddr,

    /// BB (MS) remote address
    #[arg(short = 'r', long = "bb-addr", default_value = "127.0.0.1")]
    bb_addr: IpAddr,

    /// BTS base port number
    #[arg(short = 'P', long = "bts-base-port", default_value_t = DEFAULT_BTS_BASE_PORT)]
    bts_base_port: u16,

    /// BB (MS) base port number
    #[arg(short = 'p', long = "bb-base-port", default_value_t = DEFAULT_BB_BASE_PORT)]
    bb_base_port: u16,

    /// Add a transceiver for BTS or MS (e.g. 127.0.0.1:5703 or 127.0.0.1:5700/1)
    #[arg(long = "trx", value_name = "REMOTE_ADDR:BASE_PORT[/CHILD_IDX]")]
    trx: Vec<TrxDef>,

    /// Verbose log file, overrides debug_log from the config
    #[arg(long = "log-file")]
    log_file: Option<String>,
}

/// Load configuration file, or build it from the command line
fn load_config(args: &Args) -> SharedConfig {
    let mut cfg = match &args.config {
        Some(path) => match toml_config::stack_config_from_file(path) {
            Ok(c) => c,
            Err(e) => {
                println!("Failed to load configuration from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => StackConfig::with_bts_and_bb(
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            (args.bts_addr, args.bts_base_port),
            (args.bb_addr, args.bb_base_port),
        ),
    };

    if let Some(addr) = args.trx_bind_addr {
        cfg.bind_addr = addr;
    }
    if args.log_file.is_some() {
        cfg.debug_log = args.log_file.clone();
    }
    for def in &args.trx {
        if let Err(e) = cfg.add_trx_def(def) {
            println!("{}", e);
            std::process::exit(1);
        }
    }

    match SharedConfig::from_config(cfg) {
        Ok(c) => c,
        Err(e) => {
            println!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let args = Args::parse();
    if args.bts_base_port == args.bb_base_port {
        Args::command()
            .error(ErrorKind::ArgumentConflict, "BTS and BB base ports shall be different")
            .exit();
    }

    let cfg = load_config(&args);
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());

    let mut app = match FakeTrx::new(cfg) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("Failed to set up transceivers: {}", e);
            std::process::exit(1);
        }
    };

    // Set up Ctrl+C handler for graceful shutdown
    let events = app.event_sender();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Signal received");
        let _ = events.send(Event::Shutdown);
    }) {
        tracing::error!("Failed to set Ctrl+C handler: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = app.run() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
