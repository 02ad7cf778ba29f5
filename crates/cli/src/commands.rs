//! CLI commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use wallpaper_core::{Category, CredentialStore, Tag, Wallpaper};
use wallpaper_http::AdminClient;
use wallpaper_http::client::notify::TracingNotifier;
use wallpaper_http::client::session::MemoryNavigator;
use wallpaper_http::types::{LoginRequest, PageQuery, WallpaperQuery, WallpaperUpload};

use crate::config;

const CREDENTIALS_FILE: &str = "credentials.json";

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and remember the session
    Login(Credentials),

    /// Create a new account
    Register(Credentials),

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Manage wallpapers
    Wallpaper {
        #[command(subcommand)]
        command: WallpaperCommands,
    },

    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Manage tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },

    /// Client configuration files
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args)]
pub struct Credentials {
    username: String,

    /// Password (prefer the environment variable over the flag)
    #[arg(long, env = "WALLPAPER_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args)]
pub struct Paging {
    #[arg(long, default_value = "1")]
    page: u32,

    #[arg(long, default_value = "10")]
    page_size: u32,
}

#[derive(Subcommand)]
pub enum WallpaperCommands {
    /// List wallpapers
    List {
        #[command(flatten)]
        paging: Paging,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        tag: Option<i64>,
        #[arg(long)]
        keyword: Option<String>,
    },
    /// Show one wallpaper
    Show { id: i64 },
    /// Add a wallpaper
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        image_url: String,
        #[arg(long, default_value = "")]
        thumbnail_url: String,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long = "tag")]
        tags: Vec<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Upload an image file as a new wallpaper
    Upload {
        /// Image file to upload
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long = "tag")]
        tags: Vec<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change fields of a wallpaper
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a wallpaper
    Delete { id: i64 },
    /// Most recent wallpapers
    Latest {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Most downloaded wallpapers
    Hot {
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories
    List {
        #[command(flatten)]
        paging: Paging,
        #[arg(long)]
        keyword: Option<String>,
    },
    /// Show the category tree
    Tree,
    /// List direct children of a category (top level by default)
    Children {
        #[arg(long)]
        parent: Option<i64>,
    },
    /// Show one category
    Show { id: i64 },
    /// Add a category
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        parent: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change fields of a category
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        parent: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a category
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum TagCommands {
    /// List tags
    List {
        #[command(flatten)]
        paging: Paging,
    },
    /// List every tag
    All,
    /// Most used tags
    Hot {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one tag
    Show { id: i64 },
    /// Add a tag
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change fields of a tag
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a tag
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate client configuration file
    Init {
        /// Output file path (defaults to WALLPAPER_STATE_DIR/config.json)
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

/// Data directory from the flag, `WALLPAPER_STATE_DIR`, or the system data dir
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        if let Ok(state_dir) = std::env::var("WALLPAPER_STATE_DIR") {
            PathBuf::from(state_dir)
        } else {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("wallpaper-admin")
        }
    })
}

/// Client wired for a headless session
struct Session {
    client: AdminClient,
    navigator: Arc<MemoryNavigator>,
}

impl Session {
    fn open(data_dir: &std::path::Path, config_file: Option<&std::path::Path>, page: &str) -> Result<Self> {
        let config = config::load_client_config(config_file, data_dir)?;
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let navigator = Arc::new(MemoryNavigator::new(page));
        let client = AdminClient::builder()
            .config(&config)
            .store(CredentialStore::file(data_dir.join(CREDENTIALS_FILE)))
            .navigator(navigator.clone())
            .notifier(Arc::new(TracingNotifier))
            .build()?;

        Ok(Self { client, navigator })
    }

    /// Tell the user when the pipeline sent them back to the login page
    fn report_navigation(&self) {
        if let Some(target) = self.navigator.last_navigation() {
            if self.client.session().is_login_path(&target) && target.contains("redirect=") {
                eprintln!("Session expired. Run `wallpaper-admin login <username>` to sign in again.");
            }
        }
    }
}

fn read_upload(path: &std::path::Path) -> Result<WallpaperUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    Ok(WallpaperUpload::new(file_name, bytes))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Commands {
    pub async fn execute(self, data_dir: PathBuf, config_file: Option<PathBuf>) -> Result<()> {
        if let Self::Config { command } = self {
            return command.execute(&data_dir, config_file.as_deref());
        }

        let session = Session::open(&data_dir, config_file.as_deref(), self.page())?;
        let outcome = self.run(&session.client).await;
        session.report_navigation();
        outcome
    }

    // Page the command stands in for; it becomes the login redirect target.
    const fn page(&self) -> &'static str {
        match self {
            Self::Login(_) | Self::Register(_) => "/login",
            Self::Wallpaper { .. } => "/wallpaper",
            Self::Category { .. } => "/category",
            Self::Tag { .. } => "/tag",
            Self::Logout | Self::Whoami | Self::Config { .. } => "/",
        }
    }

    async fn run(self, client: &AdminClient) -> Result<()> {
        match self {
            Self::Login(credentials) => {
                let result = client
                    .login(&LoginRequest::new(credentials.username, credentials.password))
                    .await?;
                println!("Logged in as {}", result.user_info.username);
                Ok(())
            }
            Self::Register(credentials) => {
                let username = credentials.username.clone();
                client
                    .register(&LoginRequest::new(credentials.username, credentials.password))
                    .await?;
                println!("Registered {username}");
                Ok(())
            }
            Self::Logout => {
                if let Err(e) = client.logout().await {
                    info!("logout call failed: {e}");
                }
                println!("Logged out");
                Ok(())
            }
            Self::Whoami => {
                if client.store().credential()?.is_none() {
                    anyhow::bail!("not logged in");
                }
                print_json(&client.current_user().await?)
            }
            Self::Wallpaper { command } => command.execute(client).await,
            Self::Category { command } => command.execute(client).await,
            Self::Tag { command } => command.execute(client).await,
            Self::Config { .. } => Ok(()),
        }
    }
}

impl WallpaperCommands {
    async fn execute(self, client: &AdminClient) -> Result<()> {
        match self {
            Self::List {
                paging,
                category,
                tag,
                keyword,
            } => {
                let query = WallpaperQuery {
                    page: PageQuery {
                        page: paging.page,
                        page_size: paging.page_size,
                        keyword,
                    },
                    category_id: category,
                    tag_id: tag,
                };
                print_json(&client.wallpapers(&query).await?)
            }
            Self::Show { id } => print_json(&client.wallpaper(id).await?),
            Self::Create {
                title,
                image_url,
                thumbnail_url,
                category,
                tags,
                description,
            } => {
                let wallpaper = Wallpaper {
                    title,
                    image_url,
                    thumbnail_url,
                    category_id: category,
                    tag_ids: (!tags.is_empty()).then_some(tags),
                    description,
                    ..Wallpaper::default()
                };
                client.create_wallpaper(wallpaper).await?;
                println!("Wallpaper created");
                Ok(())
            }
            Self::Upload {
                file,
                title,
                category,
                tags,
                description,
            } => {
                let upload = read_upload(&file)?;
                let wallpaper = client
                    .upload_wallpaper_image(WallpaperUpload {
                        title,
                        description,
                        category_id: category,
                        tag_ids: tags,
                        ..upload
                    })
                    .await?;
                print_json(&wallpaper)
            }
            Self::Update {
                id,
                title,
                image_url,
                category,
                description,
            } => {
                let mut wallpaper = client.wallpaper(id).await?;
                if let Some(title) = title {
                    wallpaper.title = title;
                }
                if let Some(image_url) = image_url {
                    wallpaper.image_url = image_url;
                }
                if category.is_some() {
                    wallpaper.category_id = category;
                }
                if description.is_some() {
                    wallpaper.description = description;
                }
                client.update_wallpaper(&wallpaper).await?;
                println!("Wallpaper {id} updated");
                Ok(())
            }
            Self::Delete { id } => {
                client.delete_wallpaper(id).await?;
                println!("Wallpaper {id} deleted");
                Ok(())
            }
            Self::Latest { limit } => print_json(&client.latest_wallpapers(limit).await?),
            Self::Hot { limit } => print_json(&client.hot_wallpapers(limit).await?),
        }
    }
}

impl CategoryCommands {
    async fn execute(self, client: &AdminClient) -> Result<()> {
        match self {
            Self::List { paging, keyword } => {
                let query = PageQuery {
                    page: paging.page,
                    page_size: paging.page_size,
                    keyword,
                };
                print_json(&client.categories(&query).await?)
            }
            Self::Tree => print_json(&client.category_tree().await?),
            Self::Children { parent } => print_json(&client.category_children(parent).await?),
            Self::Show { id } => print_json(&client.category(id).await?),
            Self::Create {
                name,
                parent,
                description,
            } => {
                let category = Category {
                    name,
                    parent_id: parent,
                    description,
                    ..Category::default()
                };
                client.create_category(&category).await?;
                println!("Category created");
                Ok(())
            }
            Self::Update {
                id,
                name,
                parent,
                description,
            } => {
                let mut category = client.category(id).await?;
                if let Some(name) = name {
                    category.name = name;
                }
                if parent.is_some() {
                    category.parent_id = parent;
                }
                if description.is_some() {
                    category.description = description;
                }
                client.update_category(&category).await?;
                println!("Category {id} updated");
                Ok(())
            }
            Self::Delete { id } => {
                client.delete_category(id).await?;
                println!("Category {id} deleted");
                Ok(())
            }
        }
    }
}

impl TagCommands {
    async fn execute(self, client: &AdminClient) -> Result<()> {
        match self {
            Self::List { paging } => {
                let query = PageQuery {
                    page: paging.page,
                    page_size: paging.page_size,
                    keyword: None,
                };
                print_json(&client.tags(&query).await?)
            }
            Self::All => print_json(&client.all_tags().await?),
            Self::Hot { limit } => print_json(&client.hot_tags(limit).await?),
            Self::Show { id } => print_json(&client.tag(id).await?),
            Self::Create { name, description } => {
                let tag = Tag {
                    name,
                    description,
                    ..Tag::default()
                };
                client.create_tag(&tag).await?;
                println!("Tag created");
                Ok(())
            }
            Self::Update {
                id,
                name,
                description,
            } => {
                let mut tag = client.tag(id).await?;
                if let Some(name) = name {
                    tag.name = name;
                }
                if description.is_some() {
                    tag.description = description;
                }
                client.update_tag(&tag).await?;
                println!("Tag {id} updated");
                Ok(())
            }
            Self::Delete { id } => {
                client.delete_tag(id).await?;
                println!("Tag {id} deleted");
                Ok(())
            }
        }
    }
}

impl ConfigCommands {
    fn execute(self, data_dir: &std::path::Path, config_file: Option<&std::path::Path>) -> Result<()> {
        match self {
            Self::Init { output, force } => {
                let config_path = output.unwrap_or_else(|| config::default_config_path(data_dir));
                anyhow::ensure!(
                    force || !config_path.exists(),
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                );

                // Create parent directory if it doesn't exist
                if let Some(parent) = config_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }

                config::generate_default_config(&config_path)?;
                println!(
                    "Generated client configuration at: {}",
                    config_path.display()
                );
                Ok(())
            }
            Self::Show => print_json(&config::load_client_config(config_file, data_dir)?),
        }
    }
}
