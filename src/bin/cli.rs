use clap::{Parser, Subcommand};
use keepalley::{
    db,
    repositories::{SqliteSubscriptionRepository, SqliteUserRepository, SubscriptionRepository},
    services::user_service::{RegisterRequest, UserService, UserServiceError},
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "keepalley-cli")]
#[command(about = "Operator tool for Keep Alley Trash accounts and subscribers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Subscriber commands
    Subscribers {
        #[command(subcommand)]
        command: SubscriberCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,

        #[arg(short, long)]
        neighborhood: Option<String>,

        /// Grant admin rights
        #[arg(long)]
        admin: bool,
    },

    /// List all users
    List {
        /// Maximum number of users to display
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Offset for pagination
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },

    /// Grant admin rights
    Promote {
        #[arg(short, long)]
        email: String,
    },

    /// Revoke admin rights
    Demote {
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password for a user
    SetPassword {
        #[arg(short, long)]
        email: String,

        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum SubscriberCommands {
    /// List every subscription, active or not
    List,
}

fn get_password(prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

fn confirm_password(prompt: &str) -> Result<(String, String), Box<dyn std::error::Error>> {
    let password = get_password(prompt)?;
    let confirm = get_password("Confirm password")?;
    Ok((password, confirm))
}

fn fail(action: &str, err: UserServiceError) -> ! {
    match err {
        UserServiceError::Invalid(errors) => {
            for message in errors.messages() {
                eprintln!("❌ {}", message);
            }
        }
        other => eprintln!("❌ Failed to {}: {}", action, other),
    }
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let pool = db::create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let user_service = UserService::new(Arc::new(SqliteUserRepository::new(pool.clone())));
    let subscriptions = SqliteSubscriptionRepository::new(pool.clone());

    let cli = Cli::parse();

    match cli.command {
        Commands::User { command } => match command {
            UserCommands::Create {
                username,
                email,
                password,
                neighborhood,
                admin,
            } => {
                let (password, password_confirm) = match password {
                    Some(pw) => (pw.clone(), pw),
                    None => confirm_password("Password")?,
                };

                let request = RegisterRequest {
                    username,
                    email,
                    password,
                    password_confirm: Some(password_confirm),
                    neighborhood,
                };

                match user_service.create_user(request, admin).await {
                    Ok(user) => {
                        println!("✅ User created successfully!");
                        println!("  ID: {}", user.id);
                        println!("  Username: {}", user.username);
                        println!("  Email: {}", user.email);
                        println!("  Admin: {}", user.is_admin);
                    }
                    Err(err) => fail("create user", err),
                }
            }

            UserCommands::List { limit, offset } => {
                match user_service.list_users(Some(limit), Some(offset)).await {
                    Ok(users) if users.is_empty() => println!("No users found."),
                    Ok(users) => {
                        println!(
                            "{:<5} {:<20} {:<40} {:<6} {:<20}",
                            "ID", "Username", "Email", "Admin", "Created"
                        );
                        println!("{}", "-".repeat(95));
                        for user in users {
                            println!(
                                "{:<5} {:<20} {:<40} {:<6} {:<20}",
                                user.id,
                                user.username,
                                user.email,
                                if user.is_admin { "Yes" } else { "No" },
                                user.created_at.as_deref().unwrap_or("N/A")
                            );
                        }
                    }
                    Err(err) => fail("list users", err),
                }
            }

            UserCommands::Promote { email } => match user_service.set_admin(&email, true).await {
                Ok(user) => println!("✅ '{}' is now an admin", user.email),
                Err(err) => fail("promote user", err),
            },

            UserCommands::Demote { email } => match user_service.set_admin(&email, false).await {
                Ok(user) => println!("✅ '{}' is no longer an admin", user.email),
                Err(err) => fail("demote user", err),
            },

            UserCommands::SetPassword { email, password } => {
                let (new_password, password_confirm) = match password {
                    Some(pw) => (pw.clone(), pw),
                    None => confirm_password("New password")?,
                };

                if new_password != password_confirm {
                    eprintln!("❌ Passwords do not match");
                    std::process::exit(1);
                }

                match user_service.update_password(&email, &new_password).await {
                    Ok(()) => println!("✅ Password updated successfully for '{}'!", email),
                    Err(err) => fail("update password", err),
                }
            }
        },

        Commands::Subscribers { command } => match command {
            SubscriberCommands::List => {
                let all = subscriptions.list_all().await?;
                if all.is_empty() {
                    println!("No subscribers found.");
                } else {
                    println!("{:<5} {:<40} {:<8} {:<20}", "ID", "Email", "Active", "Since");
                    println!("{}", "-".repeat(75));
                    for subscription in &all {
                        println!(
                            "{:<5} {:<40} {:<8} {:<20}",
                            subscription.id,
                            subscription.email,
                            if subscription.is_active { "Yes" } else { "No" },
                            subscription.subscribed_at.as_deref().unwrap_or("N/A")
                        );
                    }
                    let active = all.iter().filter(|s| s.is_active).count();
                    println!("\n{} active of {} total", active, all.len());
                }
            }
        },
    }

    Ok(())
}
