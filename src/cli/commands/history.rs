use chrono::{Local, TimeZone};

use crate::state::SharedState;

fn format_timestamp(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

pub async fn cmd_history_list(state: &SharedState) -> anyhow::Result<()> {
    let entries = state.search_history.entries().await;

    if entries.is_empty() {
        println!("No search history.");
        return Ok(());
    }

    println!("Recent Searches ({}):", entries.len());
    println!("{:-<60}", "");

    for item in entries {
        let results = item
            .results_count
            .map_or_else(String::new, |n| format!(" ({n} results)"));
        println!("• {}{}", item.query, results);
        println!("  {}", format_timestamp(item.timestamp));
    }

    Ok(())
}

pub async fn cmd_history_remove(state: &SharedState, query: &str) -> anyhow::Result<()> {
    state.search_history.remove(query).await;
    println!("✓ Removed '{query}' from history");
    Ok(())
}

pub async fn cmd_history_clear(state: &SharedState) -> anyhow::Result<()> {
    state.search_history.clear().await;
    println!("✓ Search history cleared");
    Ok(())
}
