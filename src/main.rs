//! Natscreen REPL — a command-bar stand-in over the sample universe.
//!
//! Reads one query per line, prints the interpretation, a result table
//! and follow-up suggestions. `--json` prints the full serialized
//! response instead, exactly as a UI client would receive it.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use natscreen::universe::sample_universe;
use natscreen::{ResponseType, Screener, ScreenerResponse};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let json_mode = std::env::args().any(|arg| arg == "--json");

    tracing::info!("natscreen v{}", env!("CARGO_PKG_VERSION"));
    println!("natscreen — type a screen (e.g. 'PE < 15 and ROE > 20%'), 'help', or 'exit'");

    let mut screener = Screener::new(sample_universe);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        let response = screener.query(line);
        if json_mode {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            render(&response);
        }
    }

    Ok(())
}

fn render(response: &ScreenerResponse) {
    println!("{}", response.interpretation);

    if response.response_type == ResponseType::Screener && !response.data.is_empty() {
        let headers: Vec<String> = response
            .columns
            .iter()
            .map(|col| col.to_string())
            .collect();
        let rows: Vec<Vec<String>> = response
            .data
            .iter()
            .map(|sec| {
                response
                    .columns
                    .iter()
                    .map(|col| sec.display_field(*col))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                rows.iter()
                    .map(|r| r[i].len())
                    .chain(std::iter::once(h.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:<width$}", cell, width = w))
                .collect::<Vec<_>>()
                .join("  ")
        };

        println!("{}", line(&headers));
        for row in &rows {
            println!("{}", line(row));
        }
        println!(
            "{} of {} shown · {:.2}ms",
            response.data.len(),
            response.total,
            response.execution_time_ms
        );
    }

    for suggestion in &response.suggestions {
        println!("  · {}", suggestion);
    }
}
