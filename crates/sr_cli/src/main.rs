use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use sr_client::summary::DEFAULT_PAGE_SIZE;
use sr_client::{
    ApiClient, AuthStore, ClientConfig, PagedList, RouteLog, SummaryFilters, SummaryStore,
};
use sr_core::{ContentType, Error, Result, SortKey, Summary, SummaryPreview};
use sr_storage::create_storage;

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal client for the summarization service", long_about = None)]
struct Cli {
    /// Directory the session tokens live in
    #[arg(long, default_value = ".sr")]
    profile: PathBuf,
    /// Token storage backend: file or memory
    #[arg(long, default_value = "file")]
    storage: String,
    /// Server location, overriding the SERVER_URL environment variable
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account and start a session
    Register {
        email: String,
        username: String,
        password: String,
    },
    /// Start a session
    Login { username: String, password: String },
    /// End the session
    Logout,
    /// Show the signed-in profile
    Me,
    /// List your own summaries
    List(ListArgs),
    /// Browse other people's public summaries
    Discover(ListArgs),
    /// Search summaries
    Search { query: String },
    /// Show one summary in full
    Show { id: String },
    /// Summarize something new
    Create {
        #[command(subcommand)]
        command: CreateCommands,
    },
    /// Like a summary
    Like { id: String },
    /// Dislike a summary
    Dislike { id: String },
    /// Add a summary to your favorites
    Favorite { id: String },
    /// Delete one of your summaries
    Delete { id: String },
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Rows per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    limit: u32,
    /// Sort order: date, likes or favorites
    #[arg(long, default_value = "date")]
    sort: SortKey,
    /// Only summaries of one content type: text, website, file or video
    #[arg(long)]
    content_type: Option<ContentType>,
    /// Only summaries in one category
    #[arg(long)]
    category: Option<String>,
    /// Follow the cursor until the whole list is loaded
    #[arg(long)]
    all: bool,
}

#[derive(Subcommand, Debug)]
enum CreateCommands {
    /// Summarize a web page
    Website {
        url: String,
        #[arg(long, default_value = "")]
        prompt: String,
        #[arg(long)]
        private: bool,
    },
    /// Summarize a pasted block of text
    Text {
        text: String,
        #[arg(long, default_value = "")]
        prompt: String,
        #[arg(long)]
        private: bool,
    },
    /// Summarize a document
    File {
        path: PathBuf,
        #[arg(long, default_value = "")]
        prompt: String,
        #[arg(long)]
        private: bool,
    },
    /// Summarize a video
    Video {
        url: String,
        #[arg(long, default_value = "")]
        prompt: String,
        #[arg(long)]
        private: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let token_path = cli.profile.join("tokens.json");
    let storage = create_storage(&cli.storage, Some(&token_path)).await?;

    let config = match &cli.server_url {
        Some(url) => ClientConfig::new(url.clone()),
        None => ClientConfig::from_env(),
    };
    info!("🔗 Talking to {}", config.base_url);

    let navigator = Arc::new(RouteLog::new());
    let api = Arc::new(ApiClient::new(config, storage.clone())?);
    let summaries = Arc::new(SummaryStore::new(api.clone(), navigator.clone()));
    let auth = AuthStore::new(api, storage, navigator, summaries.clone());

    match cli.command {
        Commands::Register {
            email,
            username,
            password,
        } => {
            if auth.register(&email, &username, &password).await? {
                println!("✅ Registered and signed in as {}", username);
            } else {
                eprintln!("❌ Registration failed");
            }
        }
        Commands::Login { username, password } => {
            if auth.login(&username, &password).await? {
                println!("✅ Signed in as {}", username);
            } else {
                eprintln!("❌ Login failed, check your credentials");
            }
        }
        Commands::Logout => {
            auth.logout().await;
            println!("👋 Signed out");
        }
        Commands::Me => {
            if !ensure_session(&auth).await? {
                return Ok(());
            }
            if let Some(user) = auth.fetch_user().await? {
                println!("👤 {} <{}>", user.username, user.email);
                println!("⭐ {} favorites", user.favorites.len());
            }
        }
        Commands::List(args) => {
            if !ensure_session(&auth).await? {
                return Ok(());
            }
            run_list(&summaries, &args, false).await?;
        }
        Commands::Discover(args) => {
            auth.init().await?;
            run_list(&summaries, &args, true).await?;
        }
        Commands::Search { query } => {
            auth.init().await?;
            summaries.search_summaries(&query).await?;
            let results = summaries.state().await.search_results;
            if results.is_empty() {
                println!("🤷 No matches for \"{}\"", query);
            } else {
                for item in &results {
                    println!("{}", preview_line(item));
                }
            }
        }
        Commands::Show { id } => {
            auth.init().await?;
            match summaries.get_summary_by_id(&id).await {
                Ok(summary) => print_summary(&summary),
                Err(Error::Unauthorized) => {
                    eprintln!("🔒 That summary is private. Sign in with `sr login` to see it.")
                }
                Err(Error::NotFound) => eprintln!("❓ No summary with id {}", id),
                Err(e) => return Err(e),
            }
        }
        Commands::Create { command } => {
            if !ensure_session(&auth).await? {
                return Ok(());
            }
            let created = match command {
                CreateCommands::Website {
                    url,
                    prompt,
                    private,
                } => summaries.create_website_summary(&url, &prompt, private).await?,
                CreateCommands::Text {
                    text,
                    prompt,
                    private,
                } => summaries.create_text_summary(&text, &prompt, private).await?,
                CreateCommands::File {
                    path,
                    prompt,
                    private,
                } => summaries.create_file_summary(&path, &prompt, private).await?,
                CreateCommands::Video {
                    url,
                    prompt,
                    private,
                } => summaries.create_video_summary(&url, &prompt, private).await?,
            };
            match created {
                Some(id) => {
                    println!("🆕 Created summary {}", id);
                    println!("   sr show {}", id);
                }
                None => {
                    let state = summaries.state().await;
                    eprintln!(
                        "❌ {}",
                        state.error.unwrap_or_else(|| "Something went wrong".to_string())
                    );
                }
            }
        }
        Commands::Like { id } => {
            if !ensure_session(&auth).await? {
                return Ok(());
            }
            match summaries.add_like(&id).await? {
                Some(summary) => println!("👍 \"{}\" now has {} likes", summary.title, summary.likes),
                None => eprintln!("❌ Could not like {}", id),
            }
        }
        Commands::Dislike { id } => {
            if !ensure_session(&auth).await? {
                return Ok(());
            }
            match summaries.add_dislike(&id).await? {
                Some(summary) => println!(
                    "👎 \"{}\" now has {} dislikes",
                    summary.title, summary.dislikes
                ),
                None => eprintln!("❌ Could not dislike {}", id),
            }
        }
        Commands::Favorite { id } => {
            if !ensure_session(&auth).await? {
                return Ok(());
            }
            match summaries.add_favorite(&id).await? {
                Some(summary) => println!(
                    "⭐ \"{}\" now has {} favorites",
                    summary.title, summary.favorites
                ),
                None => eprintln!("❌ Could not favorite {}", id),
            }
        }
        Commands::Delete { id } => {
            if !ensure_session(&auth).await? {
                return Ok(());
            }
            if summaries.delete_summary(&id).await? {
                println!("🗑️ Deleted {}", id);
            } else {
                eprintln!("❌ Could not delete {}", id);
            }
        }
    }

    Ok(())
}

/// Run the startup sequence and tell the user to sign in when it ends
/// anonymous.
async fn ensure_session(auth: &AuthStore) -> Result<bool> {
    auth.init().await?;
    if auth.current_user().await.is_some() {
        Ok(true)
    } else {
        println!("🔒 Not signed in. Run `sr login <username> <password>` first.");
        Ok(false)
    }
}

async fn run_list(summaries: &SummaryStore, args: &ListArgs, discovery: bool) -> Result<()> {
    let filters = SummaryFilters {
        limit: args.limit,
        sort: args.sort,
        content_type: args.content_type,
        category: args.category.clone(),
        ..SummaryFilters::default()
    };

    // a page that fails to load ends the loop; retrying the same
    // request would only fail the same way
    let mut failed = false;
    loop {
        let loaded = if discovery {
            summaries.get_discovery_summaries(&filters).await?
        } else {
            summaries.get_summaries(&filters).await?
        };
        if !loaded {
            failed = true;
            break;
        }
        let state = summaries.state().await;
        let list = if discovery { &state.discovery } else { &state.summaries };
        if list.complete || !args.all {
            break;
        }
    }

    let state = summaries.state().await;
    let list = if discovery { &state.discovery } else { &state.summaries };
    for line in render_list(list, failed) {
        println!("{}", line);
    }
    Ok(())
}

/// Lines a loaded list prints as. A failed page load gets its own line,
/// so a server that is down never reads as an empty account.
fn render_list(list: &PagedList, failed: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if failed {
        lines.push("❌ The server could not deliver summaries".to_string());
    }
    if list.items.is_empty() {
        if !failed {
            lines.push("🤷 Nothing here yet".to_string());
        }
        return lines;
    }
    for item in &list.items {
        lines.push(preview_line(item));
    }
    if !list.complete && !failed {
        lines.push(format!("({} loaded, more available with --all)", list.items.len()));
    }
    lines
}

fn preview_line(item: &SummaryPreview) -> String {
    let author = item
        .author
        .as_ref()
        .map(|a| a.username.as_str())
        .unwrap_or("anonymous");
    let lock = if item.is_private { "🔒 " } else { "" };
    format!(
        "📄 {} {}{} 👍{} ⭐{} by {} on {}",
        item.id,
        lock,
        truncate(&item.title, 48),
        item.likes,
        item.favorites,
        author,
        item.created_at.format("%Y-%m-%d"),
    )
}

fn print_summary(summary: &Summary) {
    let lock = if summary.is_private { " 🔒" } else { "" };
    println!("📄 {} [{}]{}", summary.title, summary.content_type, lock);
    if let Some(author) = &summary.author {
        println!("👤 {}", author.username);
    }
    if !summary.url.is_empty() {
        println!("🔗 {}", summary.url);
    }
    if !summary.category.is_empty() {
        println!("📂 {}", summary.category);
    }
    if !summary.tags.is_empty() {
        println!("🏷️ {}", summary.tags.join(", "));
    }
    println!(
        "👍 {}  👎 {}  ⭐ {}  🕒 {}",
        summary.likes,
        summary.dislikes,
        summary.favorites,
        summary.created_at.format("%Y-%m-%d %H:%M"),
    );
    println!();
    println!("{}", summary.summary);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
