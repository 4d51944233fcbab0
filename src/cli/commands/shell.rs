use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::error;

use super::search::print_chemical;
use crate::services::SearchState;
use crate::state::SharedState;

type InputLines = Lines<BufReader<Stdin>>;

fn print_help() {
    println!("Type to search. Results update as PubChem answers.");
    println!("  :save <id>   Save a chemical from the results");
    println!("  :history     Show recent searches");
    println!("  :clear       Clear the current query");
    println!("  :q           Quit");
}

fn render(state: &SearchState) {
    if state.query.is_empty() {
        return;
    }

    if state.loading {
        if state.has_cached_results {
            println!(
                "[{}] {} local match(es), searching PubChem...",
                state.query,
                state.results.len()
            );
        } else {
            println!("[{}] searching PubChem...", state.query);
        }
        return;
    }

    if let Some(error) = &state.error {
        println!("⚠ PubChem lookup failed: {error}");
    }
    if state.results.is_empty() {
        println!("[{}] no chemicals found", state.query);
        return;
    }

    println!("[{}] {} result(s)", state.query, state.results.len());
    for chemical in &state.results {
        print_chemical(chemical);
    }
}

/// Runs one search view until the user quits or input ends.
async fn run_view(state: &SharedState, lines: &mut InputLines) -> anyhow::Result<()> {
    let search = state.hybrid_search();
    let mut rx = search.subscribe();

    let history = state.search_history.clone();
    let statistics = state.statistics.clone();
    let min_len = state.config.search.min_query_length;
    let printer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let current = rx.borrow_and_update().clone();
            render(&current);
            if !current.loading && current.query.chars().count() >= min_len {
                history
                    .add(&current.query, Some(current.results.len()))
                    .await;
                statistics.increment_search().await;
            }
        }
    });

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            ":q" | ":quit" | "exit" => break,
            ":help" | ":h" => print_help(),
            ":clear" => search.set_query(""),
            ":history" => {
                for item in state.search_history.entries().await {
                    println!("  • {}", item.query);
                }
            }
            _ if input.starts_with(":save ") => {
                let id = input.trim_start_matches(":save ").trim();
                let current = search.state();
                match current.results.into_iter().find(|c| c.id == id) {
                    Some(chemical) => {
                        let name = chemical.name.clone();
                        if state.bookmarks.add(chemical).await {
                            state.statistics.increment_bookmark().await;
                            println!("✓ Saved {name}");
                        } else {
                            println!("{name} is already saved");
                        }
                    }
                    None => println!("No result with ID {id}"),
                }
            }
            query => search.set_query(query),
        }
    }

    search.cancel();
    printer.abort();
    Ok(())
}

pub async fn cmd_shell(state: &SharedState) -> anyhow::Result<()> {
    println!("SafeChem interactive search");
    print_help();
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match AssertUnwindSafe(run_view(state, &mut lines))
            .catch_unwind()
            .await
        {
            Ok(result) => return result,
            Err(payload) => {
                error!(
                    "Search view crashed: {}",
                    crate::panic_message(payload.as_ref())
                );
                println!("⚠ Something went wrong. Starting a fresh search.");
            }
        }
    }
}
