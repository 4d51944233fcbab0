//! CLI module - Command-line interface for SafeChem
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

use crate::models::Category;

/// SafeChem - Chemical safety lookup and assistant
#[derive(Parser)]
#[command(name = "safechem")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search bundled and PubChem chemicals
    #[command(alias = "s")]
    Search {
        /// Name, formula or CAS number
        #[arg(required = true)]
        query: Vec<String>,
        /// Only search the bundled catalog
        #[arg(long)]
        local: bool,
    },

    /// List the bundled catalog
    #[command(alias = "ls")]
    Catalog {
        /// Only show one category
        #[arg(long, short, value_enum)]
        category: Option<Category>,
    },

    /// Show a bundled chemical by ID
    #[command(alias = "i")]
    Info {
        /// Catalog ID
        id: String,
    },

    /// Fetch GHS and handling data for a PubChem compound
    Safety {
        /// PubChem compound ID
        cid: u64,
    },

    /// Manage search history
    #[command(alias = "h")]
    History {
        #[command(subcommand)]
        command: Option<HistoryCommands>,
    },

    /// Manage saved chemicals
    #[command(alias = "b", alias = "bookmarks")]
    Bookmark {
        #[command(subcommand)]
        command: Option<BookmarkCommands>,
    },

    /// Ask the safety assistant a question
    Chat {
        /// Message to send
        message: Vec<String>,
        /// Catalog ID of the chemical to discuss
        #[arg(long)]
        chemical: Option<String>,
        /// Show the conversation so far
        #[arg(long)]
        history: bool,
        /// Forget the conversation
        #[arg(long)]
        clear: bool,
    },

    /// Show or reset usage statistics
    Stats {
        #[command(subcommand)]
        command: Option<StatsCommands>,
    },

    /// Sign in to your account
    Login {
        username: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out and forget stored credentials
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Request a password reset email
    ForgotPassword { email: String },

    /// Interactive search with live results
    Shell,

    /// Create default config file
    Init,
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List recent searches
    #[command(alias = "ls")]
    List,
    /// Remove one query
    #[command(alias = "rm")]
    Remove { query: Vec<String> },
    /// Forget all searches
    Clear,
}

#[derive(Subcommand)]
pub enum BookmarkCommands {
    /// List saved chemicals
    #[command(alias = "ls")]
    List,
    /// Save a chemical by catalog ID, or the best match for a query
    Add {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Remove a saved chemical
    #[command(alias = "rm")]
    Remove { id: String },
    /// Save if missing, remove if saved
    Toggle { id: String },
    /// Remove all saved chemicals
    Clear,
}

#[derive(Subcommand)]
pub enum StatsCommands {
    /// Show counters
    Show,
    /// Zero all counters
    Reset,
}

pub use commands::*;
