//! Pet Pals command-line client.
//!
//! Thin screens over a remote backend-as-a-service: auth, the feed, pet
//! management, pedigree display and the post composer. All durable state
//! lives server-side; this process only holds request-scoped copies.

mod config;
mod errors;
mod models;
mod pedigree;
mod screens;
mod session;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use errors::AppError;
use models::{CreateAnimalRequest, UpdateProfileRequest};
use pedigree::{AncestorSummary, PedigreeView};
use screens::images::ImageAttachment;
use session::{Session, SessionContext};
use store::{RestClient, SessionService};

#[derive(Parser)]
#[command(
    name = "petpals",
    about = "Pet Pals — a social network for pet owners",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with email and password
    Login(LoginArgs),
    /// Create an account and its profile
    Register(RegisterArgs),
    /// Sign out and discard the stored session
    Logout,
    /// Show the current session
    Whoami,
    /// Browse the latest posts
    Feed,
    /// Manage your pets
    #[command(subcommand)]
    Pets(PetsCommand),
    /// Show an animal's two-generation pedigree
    Pedigree { animal_id: String },
    /// View a user profile with their animals and posts
    User { user_id: String },
    /// View an animal and its owner
    Animal { animal_id: String },
    /// Compose a post
    Post(PostArgs),
    /// Edit your profile or change your password
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    confirm_password: String,
    #[arg(long)]
    username: String,
    #[arg(long)]
    full_name: Option<String>,
}

#[derive(Subcommand)]
enum PetsCommand {
    /// List your pets
    List,
    /// Register a new pet
    Add(AddPetArgs),
    /// Show one pet
    Show { animal_id: String },
}

#[derive(Args)]
struct AddPetArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    species: String,
    #[arg(long)]
    breed: String,
    #[arg(long)]
    birth_date: Option<String>,
    #[arg(long)]
    color: Option<String>,
    #[arg(long)]
    metric_number: Option<String>,
    /// Identifier of the recorded father
    #[arg(long)]
    father: Option<String>,
    /// Identifier of the recorded mother
    #[arg(long)]
    mother: Option<String>,
    #[arg(long)]
    has_pedigree: bool,
    /// Path to a profile picture to upload
    #[arg(long)]
    photo: Option<PathBuf>,
}

#[derive(Args)]
struct PostArgs {
    #[arg(long)]
    caption: String,
    /// Path to the image to upload
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    kind: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long)]
    reward: Option<f64>,
    /// Post on behalf of this animal
    #[arg(long)]
    as_animal: Option<String>,
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Update profile fields
    Edit(EditProfileArgs),
    /// Change the account password
    Password(PasswordArgs),
}

#[derive(Args)]
struct EditProfileArgs {
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    bio: Option<String>,
    /// Path to a new avatar image
    #[arg(long)]
    avatar: Option<PathBuf>,
}

#[derive(Args)]
struct PasswordArgs {
    #[arg(long)]
    new_password: String,
    #[arg(long)]
    confirm_password: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if config.api_key.is_none() {
        tracing::warn!("No API key configured (PETPALS_API_KEY); the backend may reject requests");
    }

    if let Err(err) = run(cli.command, &config).await {
        eprintln!("{}", err.message());
        std::process::exit(1);
    }
}

async fn run(command: Command, config: &Config) -> Result<(), AppError> {
    let stored = session::load(&config.session_path).await;
    let context = Arc::new(SessionContext::new(stored));
    let client = RestClient::new(config, context.clone())?;

    match command {
        Command::Login(args) => login(config, &context, &client, args).await,
        Command::Register(args) => register(config, &context, &client, args).await,
        Command::Logout => logout(config, &client).await,
        Command::Whoami => whoami(&context, &client).await,
        Command::Feed => feed(&client).await,
        Command::Pets(command) => pets(&context, &client, command).await,
        Command::Pedigree { animal_id } => show_pedigree(&client, &animal_id).await,
        Command::User { user_id } => user_page(&client, &user_id).await,
        Command::Animal { animal_id } => animal_page(&client, &animal_id).await,
        Command::Post(args) => post(&context, &client, args).await,
        Command::Profile(command) => profile(&context, &client, command).await,
    }
}

/// The session the command needs, or a sign-in hint.
fn require_session(context: &SessionContext) -> Result<Session, AppError> {
    context.current().ok_or_else(|| {
        AppError::Unauthorized("Not signed in. Run `petpals login` first.".to_string())
    })
}

async fn persist(config: &Config, session: &Session) {
    if let Err(err) = session::store(&config.session_path, session).await {
        tracing::warn!("Could not persist the session: {}", err);
    }
}

async fn login(
    config: &Config,
    context: &SessionContext,
    client: &RestClient,
    args: LoginArgs,
) -> Result<(), AppError> {
    // The watch drives the post-login redirect, the way the app's router
    // reacts to session transitions.
    let mut transitions = context.subscribe();
    screens::auth::sign_in(client, &args.email, &args.password).await?;

    if let Some(Some(session)) = transitions.next().await {
        persist(config, &session).await;
        println!(
            "Signed in as {}",
            session.email.as_deref().unwrap_or(&session.user_id)
        );
    }
    Ok(())
}

async fn register(
    config: &Config,
    context: &SessionContext,
    client: &RestClient,
    args: RegisterArgs,
) -> Result<(), AppError> {
    let form = screens::auth::RegisterForm {
        email: args.email,
        password: args.password,
        confirm_password: args.confirm_password,
        username: args.username,
        full_name: args.full_name,
    };

    let mut transitions = context.subscribe();
    let (_, profile) = screens::auth::register(client, client, &form).await?;

    if let Some(Some(session)) = transitions.next().await {
        persist(config, &session).await;
    }
    println!("Welcome, {}!", profile.username);
    Ok(())
}

async fn logout(config: &Config, client: &RestClient) -> Result<(), AppError> {
    client.sign_out().await?;
    if let Err(err) = session::clear_file(&config.session_path).await {
        tracing::warn!("Could not remove the session file: {}", err);
    }
    println!("Signed out.");
    Ok(())
}

async fn whoami(context: &SessionContext, client: &RestClient) -> Result<(), AppError> {
    let Some(session) = context.current() else {
        println!("Not signed in.");
        return Ok(());
    };

    match screens::profile::my_profile(client, &session).await {
        Ok(profile) => {
            println!("{} ({})", profile.username, session.user_id);
            if let Some(full_name) = &profile.full_name {
                println!("{}", full_name);
            }
            if let Some(bio) = &profile.bio {
                println!("{}", bio);
            }
        }
        Err(AppError::NotFound(_)) => {
            println!(
                "Signed in as {} (no profile yet)",
                session.email.as_deref().unwrap_or(&session.user_id)
            );
        }
        Err(err) => return Err(err),
    }
    Ok(())
}

async fn feed(client: &RestClient) -> Result<(), AppError> {
    let posts = screens::feed::load_feed(client).await?;
    if posts.is_empty() {
        println!("The feed is empty.");
        return Ok(());
    }

    for post in posts {
        let author = screens::feed::author_display(client, &post).await;
        println!("{}: {}", author, post.caption);
        println!("    {} | {}", post.created_at, post.image_url);
        if let Some(location) = &post.location {
            println!("    at {}", location);
        }
        if let Some(reward) = post.reward {
            println!("    reward: {}", reward);
        }
    }
    Ok(())
}

async fn pets(
    context: &SessionContext,
    client: &RestClient,
    command: PetsCommand,
) -> Result<(), AppError> {
    match command {
        PetsCommand::List => {
            let session = require_session(context)?;
            let animals = screens::pets::list_pets(client, &session).await?;
            if animals.is_empty() {
                println!("No pets added yet.");
            }
            for animal in animals {
                let mut line = format!("{}  {} ({})", animal.id, animal.name, animal.lineage());
                if let Some(metric) = &animal.metric_number {
                    line.push_str(&format!("  [{}]", metric));
                }
                println!("{}", line);
            }
            Ok(())
        }
        PetsCommand::Add(args) => {
            let session = require_session(context)?;
            let photo = match &args.photo {
                Some(path) => Some(ImageAttachment::read(path).await?),
                None => None,
            };
            let request = CreateAnimalRequest {
                name: args.name,
                species: args.species,
                breed: Some(args.breed),
                birth_date: args.birth_date,
                color: args.color,
                metric_number: args.metric_number,
                father_id: args.father,
                mother_id: args.mother,
                has_pedigree: args.has_pedigree,
            };
            let animal =
                screens::pets::register_pet(client, client, &session, request, photo.as_ref())
                    .await?;
            println!("Added {} ({})", animal.name, animal.id);
            Ok(())
        }
        PetsCommand::Show { animal_id } => {
            let animal = screens::pets::pet_detail(client, &animal_id).await?;
            print_animal(&animal);
            Ok(())
        }
    }
}

async fn show_pedigree(client: &RestClient, animal_id: &str) -> Result<(), AppError> {
    match pedigree::resolve_pedigree(client, animal_id).await {
        PedigreeView::RootNotFound => {
            println!("Pet not found");
            Ok(())
        }
        PedigreeView::Ready(tree) => {
            println!("{}'s pedigree", tree.root.name);
            println!("{} ({})", tree.root.name, tree.root.lineage);
            print_slot("Father", &tree.father);
            print_slot("Mother", &tree.mother);
            print_slot("Paternal grandfather", &tree.paternal_grandfather);
            print_slot("Paternal grandmother", &tree.paternal_grandmother);
            print_slot("Maternal grandfather", &tree.maternal_grandfather);
            print_slot("Maternal grandmother", &tree.maternal_grandmother);
            Ok(())
        }
    }
}

fn print_slot(label: &str, slot: &Option<AncestorSummary>) {
    match slot {
        Some(ancestor) => println!("  {:<22} {} ({})", label, ancestor.name, ancestor.lineage),
        None => println!("  {:<22} (not recorded)", label),
    }
}

fn print_animal(animal: &models::Animal) {
    println!("{} ({})", animal.name, animal.lineage());
    if let Some(birth_date) = &animal.birth_date {
        println!("  born {}", birth_date);
    }
    if let Some(color) = &animal.color {
        println!("  color {}", color);
    }
    if let Some(metric) = &animal.metric_number {
        println!("  registry {}", metric);
    }
    if animal.has_pedigree {
        println!("  pedigree recorded");
    }
}

async fn user_page(client: &RestClient, user_id: &str) -> Result<(), AppError> {
    let page = screens::profile::user_page(client, user_id).await?;

    println!("{}", page.profile.username);
    if let Some(full_name) = &page.profile.full_name {
        println!("{}", full_name);
    }
    if let Some(bio) = &page.profile.bio {
        println!("{}", bio);
    }

    println!("Animals:");
    if page.animals.is_empty() {
        println!("  (none)");
    }
    for animal in &page.animals {
        println!("  {} ({})", animal.name, animal.lineage());
    }

    println!("Posts:");
    if page.posts.is_empty() {
        println!("  (none)");
    }
    for post in &page.posts {
        println!("  {}  {}", post.created_at, post.caption);
    }
    Ok(())
}

async fn animal_page(client: &RestClient, animal_id: &str) -> Result<(), AppError> {
    let page = screens::profile::animal_page(client, animal_id).await?;
    print_animal(&page.animal);
    println!("  owner: {}", page.owner.username);
    Ok(())
}

async fn post(
    context: &SessionContext,
    client: &RestClient,
    args: PostArgs,
) -> Result<(), AppError> {
    let session = require_session(context)?;
    let image = ImageAttachment::read(&args.image).await?;

    let draft = screens::compose::PostDraft {
        caption: args.caption,
        image: Some(image),
        kind: args.kind,
        location: args.location,
        tags: if args.tags.is_empty() {
            None
        } else {
            Some(args.tags)
        },
        reward: args.reward,
        author_animal: args.as_animal,
    };

    let post = screens::compose::submit(client, client, Some(&session), &draft).await?;
    println!("Posted {}", post.id);
    Ok(())
}

async fn profile(
    context: &SessionContext,
    client: &RestClient,
    command: ProfileCommand,
) -> Result<(), AppError> {
    match command {
        ProfileCommand::Edit(args) => {
            let session = require_session(context)?;

            let avatar_url = match &args.avatar {
                Some(path) => {
                    let image = ImageAttachment::read(path).await?;
                    Some(screens::images::upload_image(client, &image).await?)
                }
                None => None,
            };

            let update = UpdateProfileRequest {
                username: args.username,
                full_name: args.full_name,
                bio: args.bio,
                avatar_url,
            };
            let profile = screens::profile::edit_profile(client, &session, &update).await?;
            println!("Profile updated: {}", profile.username);
            Ok(())
        }
        ProfileCommand::Password(args) => {
            require_session(context)?;
            screens::profile::change_password(client, &args.new_password, &args.confirm_password)
                .await?;
            println!("Password changed.");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests;
