use atc_listener::app::{self, Options, RealScanner};
use atc_listener::sink::zabbix::ZabbixSender;
use clap::Parser;
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;
use std::time::Duration;

/// Exit codes for the application
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_PANIC: i32 = 2;

/// Timeout for one Zabbix sender exchange.
const SINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the one-shot poll connection.
#[cfg(feature = "bluer")]
const POLL_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set up panic hook to ensure clean exit codes for process managers
    // (e.g., systemd) that monitor exit status
    panic::set_hook(Box::new(move |info: &PanicHookInfo| {
        eprintln!("Panic! {}", info);
        std::process::exit(EXIT_PANIC);
    }));

    let options = Options::parse();

    let filter = if options.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if let Some(address) = options.poll {
        #[cfg(feature = "bluer")]
        match atc_listener::poll::read_temperature(address, POLL_CONNECT_TIMEOUT).await {
            Ok(temperature) => {
                println!("Temp: {:.1} °C", temperature);
                std::process::exit(EXIT_SUCCESS);
            }
            Err(why) => {
                eprintln!("error: {}", why);
                std::process::exit(EXIT_ERROR);
            }
        }
        #[cfg(not(feature = "bluer"))]
        {
            eprintln!("error: polling {} requires the bluer feature", address);
            std::process::exit(EXIT_ERROR);
        }
    }

    let sink = Arc::new(ZabbixSender::new(
        options.zabbix_server.clone(),
        options.zabbix_port,
        SINK_TIMEOUT,
    ));

    match app::run(options, &RealScanner, sink).await {
        Ok(_) => std::process::exit(EXIT_SUCCESS),
        Err(why) => {
            eprintln!("error: {}", why);
            std::process::exit(EXIT_ERROR);
        }
    }
}
