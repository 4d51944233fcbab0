use crate::clients::chat::{context_prompt, quick_actions};
use crate::models::Role;
use crate::state::SharedState;

pub async fn cmd_chat_history(state: &SharedState) -> anyhow::Result<()> {
    let messages = state.chat_history.messages().await;

    if messages.is_empty() {
        println!("No conversation yet.");
        return Ok(());
    }

    for message in messages {
        let speaker = match message.role {
            Role::User => "You",
            Role::Assistant if message.is_error() => "SafeChem AI (error)",
            Role::Assistant | Role::System => "SafeChem AI",
        };
        println!("{speaker}: {}", message.content);
        println!();
    }

    Ok(())
}

pub async fn cmd_chat_clear(state: &SharedState) -> anyhow::Result<()> {
    state.chat_history.clear().await;
    println!("✓ Conversation cleared");
    Ok(())
}

pub async fn cmd_chat(
    state: &SharedState,
    message: &str,
    chemical_id: Option<&str>,
) -> anyhow::Result<()> {
    let chemical = match chemical_id {
        Some(id) => {
            let Some(chemical) = state.catalog.get(id) else {
                println!("Chemical with ID {id} not found in the catalog.");
                return Ok(());
            };
            Some(chemical.clone())
        }
        None => None,
    };
    let chemical_name = chemical.as_ref().map(|c| c.name.clone());

    if message.trim().is_empty() {
        println!("Try asking:");
        for action in quick_actions(chemical_name.as_deref()) {
            println!("  • {}", context_prompt(&action, chemical_name.as_deref()));
        }
        return Ok(());
    }

    let session = state.chat_session().with_chemical(chemical);

    match session.send(message).await {
        Ok(reply) => println!("{}", reply.content),
        Err(e) => println!("⚠ {e}"),
    }
    Ok(())
}
