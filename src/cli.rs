use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use time::{macros::format_description, Date};
use tracing::info;
use uuid::Uuid;

use crate::accounts::{ExtraFields, ProfileType, ProfileUpdate, Pronoun, UserManager};
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "accounts", about = "Manage user accounts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Create a regular user
    CreateUser(CreateArgs),
    /// Create a staff superuser
    CreateSuperuser {
        #[command(flatten)]
        args: CreateArgs,
        /// Do not grant staff status
        #[arg(long)]
        no_staff: bool,
        /// Do not grant superuser status
        #[arg(long)]
        no_superuser: bool,
    },
    /// Upload a profile image; the thumbnail is regenerated on save
    SetImage(FileArgs),
    /// Upload an identity document
    SetIdProof(FileArgs),
    /// Change profile fields
    Update {
        id: Uuid,
        #[command(flatten)]
        profile: ProfileArgs,
        /// Deactivate the account
        #[arg(long, conflicts_with = "activate")]
        deactivate: bool,
        /// Reactivate the account
        #[arg(long)]
        activate: bool,
    },
    /// Replace the password hash
    SetPassword {
        id: Uuid,
        #[arg(long, env = "ACCOUNTS_PASSWORD")]
        password: String,
    },
    /// Flag a user as deleted
    SoftDelete { id: Uuid },
    /// Remove a user row
    Delete { id: Uuid },
    /// Print a user as JSON
    Show { id: Uuid },
    /// Print all users as JSON, newest first
    List,
    /// Check an email/password pair
    Authenticate {
        email: String,
        #[arg(long, env = "ACCOUNTS_PASSWORD")]
        password: String,
    },
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub email: String,
    /// Omit to create an account with an unusable password
    #[arg(long, env = "ACCOUNTS_PASSWORD")]
    pub password: Option<String>,
    #[command(flatten)]
    pub profile: ProfileArgs,
}

#[derive(Debug, Args)]
pub struct FileArgs {
    pub id: Uuid,
    pub file: PathBuf,
    /// Defaults to a guess from the file extension
    #[arg(long)]
    pub content_type: Option<String>,
}

#[derive(Debug, Default, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub profile_type: Option<ProfileType>,
    #[arg(long)]
    pub age: Option<i16>,
    /// YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    pub birth_date: Option<Date>,
    #[arg(long)]
    pub qualification: Option<String>,
    #[arg(long)]
    pub employee_id: Option<String>,
    #[arg(long)]
    pub gender: Option<Pronoun>,
}

impl ProfileArgs {
    fn into_extra(self) -> ExtraFields {
        ExtraFields {
            name: self.name,
            first_name: self.first_name,
            last_name: self.last_name,
            profile_type: self.profile_type,
            age: self.age,
            birth_date: self.birth_date,
            qualification: self.qualification,
            employee_id: self.employee_id,
            gender: self.gender,
            ..Default::default()
        }
    }

    fn into_update(self) -> ProfileUpdate {
        ProfileUpdate {
            name: self.name.map(Some),
            first_name: self.first_name,
            last_name: self.last_name,
            profile_type: self.profile_type,
            age: self.age.map(Some),
            birth_date: self.birth_date.map(Some),
            qualification: self.qualification.map(Some),
            employee_id: self.employee_id.map(Some),
            gender: self.gender.map(Some),
            is_active: None,
        }
    }
}

fn parse_date(s: &str) -> Result<Date, String> {
    Date::parse(s, format_description!("[year]-[month]-[day]")).map_err(|e| e.to_string())
}

pub(crate) fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

async fn read_file(args: &FileArgs) -> anyhow::Result<(Bytes, String)> {
    let body = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("read {}", args.file.display()))?;
    let content_type = args
        .content_type
        .clone()
        .unwrap_or_else(|| content_type_for(&args.file).to_string());
    Ok((Bytes::from(body), content_type))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;
    if let Command::Migrate = cli.command {
        sqlx::migrate!("./migrations")
            .run(&state.db)
            .await
            .context("run migrations")?;
        info!("migrations applied");
        return Ok(());
    }
    execute(&state.users(), cli.command).await
}

async fn execute(users: &UserManager, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Migrate => anyhow::bail!("migrate needs a database connection"),
        Command::CreateUser(args) => {
            let user = users
                .create_user(&args.email, args.password.as_deref(), args.profile.into_extra())
                .await?;
            print_json(&user)
        }
        Command::CreateSuperuser {
            args,
            no_staff,
            no_superuser,
        } => {
            let mut extra = args.profile.into_extra();
            extra.is_staff = no_staff.then_some(false);
            extra.is_superuser = no_superuser.then_some(false);
            let user = users
                .create_superuser(&args.email, args.password.as_deref(), extra)
                .await?;
            print_json(&user)
        }
        Command::SetImage(args) => {
            let (body, content_type) = read_file(&args).await?;
            let mut user = users.get(args.id).await?;
            users.attach_image(&mut user, body, &content_type).await?;
            users.save(&mut user).await?;
            print_json(&user)
        }
        Command::SetIdProof(args) => {
            let (body, content_type) = read_file(&args).await?;
            let mut user = users.get(args.id).await?;
            users.attach_id_proof(&mut user, body, &content_type).await?;
            users.save(&mut user).await?;
            print_json(&user)
        }
        Command::Update {
            id,
            profile,
            deactivate,
            activate,
        } => {
            let mut user = users.get(id).await?;
            let mut update = profile.into_update();
            if deactivate {
                update.is_active = Some(false);
            } else if activate {
                update.is_active = Some(true);
            }
            update.apply(&mut user);
            users.save(&mut user).await?;
            print_json(&user)
        }
        Command::SetPassword { id, password } => {
            let mut user = users.get(id).await?;
            user.set_password(Some(&password))?;
            users.save(&mut user).await?;
            info!(user_id = %id, "password changed");
            Ok(())
        }
        Command::SoftDelete { id } => {
            let user = users.soft_delete(id).await?;
            print_json(&user)
        }
        Command::Delete { id } => {
            users.delete(id).await?;
            Ok(())
        }
        Command::Show { id } => print_json(&users.get(id).await?),
        Command::List => print_json(&users.list().await?),
        Command::Authenticate { email, password } => {
            match users.authenticate(&email, &password).await? {
                Some(user) => print_json(&user),
                None => anyhow::bail!("invalid credentials"),
            }
        }
    }
}
