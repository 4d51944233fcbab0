use super::search::print_chemical;
use crate::models::Chemical;
use crate::state::SharedState;

/// Catalog entry with this ID, else the best match for `query`.
async fn resolve(state: &SharedState, query: &str) -> Option<Chemical> {
    if let Some(chemical) = state.catalog.get(query) {
        return Some(chemical.clone());
    }
    if let Some(chemical) = state
        .bookmarks
        .list()
        .await
        .into_iter()
        .find(|c| c.id == query)
    {
        return Some(chemical);
    }

    let mut results = state.hybrid_search().search_once(query).await.results;
    let index = results.iter().position(|c| c.id == query).unwrap_or(0);
    (index < results.len()).then(|| results.swap_remove(index))
}

pub async fn cmd_bookmark_list(state: &SharedState) -> anyhow::Result<()> {
    let saved = state.bookmarks.list().await;

    if saved.is_empty() {
        println!("No saved chemicals.");
        return Ok(());
    }

    println!("Saved Chemicals ({}):", saved.len());
    println!("{:-<60}", "");
    for chemical in &saved {
        print_chemical(chemical);
    }

    Ok(())
}

pub async fn cmd_bookmark_add(state: &SharedState, query: &str) -> anyhow::Result<()> {
    let Some(chemical) = resolve(state, query).await else {
        println!("No chemical found for '{query}'");
        return Ok(());
    };

    let name = chemical.name.clone();
    if state.bookmarks.add(chemical).await {
        state.statistics.increment_bookmark().await;
        println!("✓ Saved {name}");
    } else {
        println!("{name} is already saved");
    }

    Ok(())
}

pub async fn cmd_bookmark_remove(state: &SharedState, id: &str) -> anyhow::Result<()> {
    if state.bookmarks.remove(id).await {
        state.statistics.decrement_bookmark().await;
        println!("✓ Removed {id}");
    } else {
        println!("{id} is not saved");
    }
    Ok(())
}

pub async fn cmd_bookmark_toggle(state: &SharedState, id: &str) -> anyhow::Result<()> {
    let Some(chemical) = resolve(state, id).await else {
        println!("No chemical found for '{id}'");
        return Ok(());
    };

    let name = chemical.name.clone();
    if state.bookmarks.toggle(chemical).await {
        state.statistics.increment_bookmark().await;
        println!("✓ Saved {name}");
    } else {
        state.statistics.decrement_bookmark().await;
        println!("✓ Removed {name}");
    }
    Ok(())
}

pub async fn cmd_bookmark_clear(state: &SharedState) -> anyhow::Result<()> {
    state.bookmarks.clear().await;
    state
        .statistics
        .update(crate::models::StatisticsUpdate {
            total_bookmarks: Some(0),
            ..Default::default()
        })
        .await;
    println!("✓ Saved chemicals cleared");
    Ok(())
}
