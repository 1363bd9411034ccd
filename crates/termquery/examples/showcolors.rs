/// # showcolors: Querying the Terminal's Colors
///
/// This example queries the terminal for its default foreground and background
/// colors, probes the number of indexed colors, and then queries the first 16
/// indexed colors. Set `RUST_LOG=termquery=debug` to see the queries and
/// replies. Set `TERMQUERY_FORWARD=1` to forward queries through tmux or GNU
/// screen.
use tracing_subscriber::EnvFilter;

use termquery::err::{ErrorKind, Result};
use termquery::opt::Options;
use termquery::{Color, Session};

const TIMEOUT: i32 = 200;

fn show(label: &str, color: Option<Color>) {
    match color {
        Some(color) => println!("{:>12}  {}  alpha {:.3}", label, color, color.alpha()),
        None => println!("{:>12}  ‹no reply›", label),
    }
}

fn run() -> Result<()> {
    let options = Options::builder()
        .timeout(TIMEOUT)
        .forward(std::env::var_os("TERMQUERY_FORWARD").is_some())
        .build();

    let mut session = match Session::with_stdin(options) {
        Ok(session) => session,
        Err(err) if err.kind() == ErrorKind::SetupFailure => {
            println!("showcolors requires a terminal, skipping: {}", err);
            return Ok(());
        }
        Err(err) => return Err(err),
    };
    let timeout = session.options().timeout();

    let foreground = session.query_foreground(timeout)?;
    let background = session.query_background(timeout)?;
    let count = session.probe_color_count(timeout)?;
    let palette = session.query_indexed_colors(Some(count.min(16)), timeout)?;
    let errors = session.error_count();
    session.close()?;

    show("foreground", foreground);
    show("background", background);
    println!("{:>12}  {}", "colors", count);
    for (index, color) in palette.into_iter().enumerate() {
        show(&format!("color {}", index), Some(color));
    }

    if 0 < errors {
        tracing::warn!(errors, "some queries failed");
    }
    Ok(())
}

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    run().map_err(Into::into)
}
