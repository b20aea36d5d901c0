/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Connectivity-test driver for the order-entry client.
//!
//! Opens a session with the configured exchange, reports executions on
//! the console, and shuts down cleanly on end of input.

use clap::Parser;
use std::time::Duration;
use tracing::info;
use tradewire_core::message::Response;
use tradewire_core::types::SeqNum;
use tradewire_trader::{Trader, DEFAULT_ENCODING, DEFAULT_HOST, DEFAULT_PATH, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(name = "trader", about = "FIX-over-WebSocket order-entry client")]
struct Args {
    /// Encoding name used for codec provider selection.
    #[arg(default_value = DEFAULT_ENCODING)]
    encoding: String,

    /// Exchange host.
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Exchange port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// WebSocket path.
    #[arg(long, default_value = DEFAULT_PATH)]
    path: String,

    /// Bound on blocking waits, in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_seconds: u64,
}

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();

    let args = Args::parse();

    let trader = Trader::builder()
        .host(&args.host)
        .port(args.port)
        .path(&args.path)
        .encoding(&args.encoding)
        .timeout(Duration::from_secs(args.timeout_seconds))
        .message_listener(Box::new(
            |source: &str, message: &Response<'_>, seq_no: SeqNum| match message {
                Response::ExecutionReport(report) => {
                    info!(
                        %source,
                        seq_no = seq_no.value(),
                        cl_ord_id = report.cl_ord_id,
                        exec_type = ?report.exec_type,
                        ord_status = ?report.ord_status,
                        cum_qty = report.cum_qty,
                        "execution report"
                    );
                }
                Response::OrderCancelReject(reject) => {
                    info!(
                        %source,
                        seq_no = seq_no.value(),
                        cl_ord_id = reject.cl_ord_id,
                        reason = ?reject.cxl_rej_reason,
                        "order cancel reject"
                    );
                }
            },
        ))
        .build()?;

    trader.open()?;
    info!("session open; press enter (or close stdin) to quit");

    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line)?;

    trader.close();
    info!("session closed");
    Ok(())
}
