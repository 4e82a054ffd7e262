//! Catalog client CLI
//!
//! Drives the catalog session and state layer from the command line against a running
//! catalog API. The session survives between invocations in the session file.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use catalog_client::admin::AdminPage;
use catalog_client::config::Config;
use catalog_client::models::{Credentials, NewComment, Registration};
use catalog_client::storage::FileStorage;
use catalog_client::CatalogClient;

#[derive(Parser, Debug)]
#[clap(
    name = "catalog-client",
    version = env!("CARGO_PKG_VERSION"),
    about = "Session and state client for the movie catalog API"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the persisted session
    Status,
    /// Sign in and persist the session
    Login {
        #[clap(short, long)]
        username: String,
        #[clap(short, long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[clap(short, long)]
        username: String,
        #[clap(short, long)]
        email: String,
        #[clap(short, long)]
        password: String,
    },
    /// Forget the session
    Logout,
    /// Full-text movie search
    Search {
        query: String,
        #[clap(long, default_value = "0")]
        page: u32,
    },
    /// List a movie's comments, or post one with --post
    Comments {
        movie_id: i64,
        #[clap(long, default_value = "0")]
        page: u32,
        #[clap(long)]
        post: Option<String>,
    },
    /// List an admin collection: movies, crew or genres
    Admin {
        tab: String,
        #[clap(long, default_value = "0")]
        page: u32,
    },
    /// Delete from an admin collection and show the refreshed page
    Delete {
        tab: String,
        id: i64,
        #[clap(long, default_value = "0")]
        page: u32,
    },
    /// Resolve a front-end path through the navigation guard
    Navigate { path: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::from_env();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("API base URL: {}", config.api_base_url);
    tracing::debug!("Session path: {:?}", config.session_path);

    let storage = Arc::new(FileStorage::open(&config.session_path)?);
    let client = CatalogClient::connect(config, storage)?;

    run(&client, cli.command).await
}

async fn run(client: &CatalogClient, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Status => match client.session.current().user() {
            Some(user) => {
                let roles: Vec<&str> = user.roles.iter().map(String::as_str).collect();
                println!("Signed in as {} (id {}) [{}]", user.username, user.id, roles.join(", "));
            }
            None => println!("Not signed in"),
        },
        Command::Login { username, password } => {
            let session = client
                .session
                .login(&Credentials::new(username, password))
                .await?;
            if let Some(user) = session.user() {
                println!("Signed in as {}", user.username);
            }
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let session = client
                .session
                .register(&Registration {
                    username,
                    email,
                    password,
                })
                .await?;
            if let Some(user) = session.user() {
                println!("Registered {}", user.username);
            }
        }
        Command::Logout => {
            client.session.logout();
            println!("Signed out");
        }
        Command::Search { query, page } => {
            let results = client.search.search(query, page).await?;
            println!("Page {} of {}", results.page_index + 1, results.total_pages);
            for movie in &results.items {
                println!("{:>6}  {}", movie.id, movie.title);
            }
        }
        Command::Comments {
            movie_id,
            page,
            post,
        } => {
            if let Some(body) = post {
                let comment = client.comments.post(NewComment::new(movie_id, body)).await?;
                println!("Posted comment {}", comment.id);
            }
            let comments = client
                .comments
                .fetch(movie_id, page, client.comments.default_page_size())
                .await?;
            for comment in &comments.items {
                println!("#{} by {}: {}", comment.id, comment.author_id, comment.body);
            }
        }
        Command::Admin { tab, page } => {
            print_admin_page(&client.admin.fetch_tab(&tab, page).await?);
        }
        Command::Delete { tab, id, page } => {
            client.admin.fetch_tab(&tab, page).await?;
            print_admin_page(&client.admin.delete_in_tab(&tab, id).await?);
        }
        Command::Navigate { path } => {
            let transition = client.router.navigate(&path)?;
            if transition.redirected {
                println!("{} -> {}", transition.requested, transition.landed);
            } else {
                println!("{}", transition.landed);
            }
        }
    }

    Ok(())
}

fn print_admin_page(page: &AdminPage) {
    let (index, total) = page.cursor();
    println!("{}: page {} of {}", page.kind().noun(), index + 1, total);
    match page {
        AdminPage::Movies(p) => p.items.iter().for_each(|m| println!("{:>6}  {}", m.id, m.title)),
        AdminPage::Crew(p) => p.items.iter().for_each(|c| println!("{:>6}  {}", c.id, c.name)),
        AdminPage::Genres(p) => p.items.iter().for_each(|g| println!("{:>6}  {}", g.id, g.name)),
    }
}
