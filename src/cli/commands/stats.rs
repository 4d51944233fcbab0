use chrono::{Local, TimeZone};

use crate::state::SharedState;

pub async fn cmd_stats_show(state: &SharedState) -> anyhow::Result<()> {
    let stats = state.statistics.get().await;
    let date = |millis: i64| {
        Local
            .timestamp_millis_opt(millis)
            .single()
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d").to_string())
    };

    println!("Statistics");
    println!("{:-<40}", "");
    println!("Searches:          {}", stats.total_searches);
    println!("Saved chemicals:   {}", stats.total_bookmarks);
    println!("Chats started:     {}", stats.total_chats_started);
    println!("Chemicals viewed:  {}", stats.chemicals_viewed);
    println!("Member since:      {}", date(stats.joined_date));
    println!("Last active:       {}", date(stats.last_active));

    Ok(())
}

pub async fn cmd_stats_reset(state: &SharedState) -> anyhow::Result<()> {
    state.statistics.reset().await;
    println!("✓ Statistics reset");
    Ok(())
}
