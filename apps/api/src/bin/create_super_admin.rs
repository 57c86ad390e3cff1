//! # Super Admin Bootstrap
//!
//! Creates the platform's first super admin. Every other account is
//! provisioned from a dashboard.
//!
//! ## Usage
//! ```bash
//! cargo run -p shopdesk-api --bin create-super-admin -- \
//!     --email owner@example.com --password 's3cret!' --name "Platform Owner"
//!
//! # Specify database path
//! cargo run -p shopdesk-api --bin create-super-admin -- --db ./data/shopdesk.db ...
//! ```

use std::env;

use anyhow::{bail, Context};

use shopdesk_api::auth::Passwords;
use shopdesk_core::validation::{validate_email, validate_name, validate_password};
use shopdesk_core::Role;
use shopdesk_db::{Database, DbConfig, NewAccount};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut email: Option<String> = None;
    let mut password: Option<String> = None;
    let mut name: Option<String> = None;
    let mut db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "./shopdesk.db".to_string());

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match args[i].as_str() {
            "--email" | "-e" => {
                email = value;
                i += 1;
            }
            "--password" | "-p" => {
                password = value;
                i += 1;
            }
            "--name" | "-n" => {
                name = value;
                i += 1;
            }
            "--db" | "-d" => {
                if let Some(path) = value {
                    db_path = path;
                }
                i += 1;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => bail!("unknown argument: {}", other),
        }
        i += 1;
    }

    let (Some(email), Some(password), Some(name)) = (email, password, name) else {
        print_help();
        bail!("--email, --password and --name are required");
    };

    validate_name("name", &name)?;
    validate_email(&email)?;
    validate_password(&password)?;

    println!("ShopDesk Super Admin Bootstrap");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("opening database")?;
    println!("✓ Connected to database");

    if db.profiles().super_admin_exists().await? {
        bail!("a super admin already exists");
    }

    let password_hash = Passwords::default().hash(&password).await?;

    let profile = db
        .profiles()
        .provision(&NewAccount {
            email: email.trim().to_lowercase(),
            password_hash,
            name,
            role: Role::SuperAdmin,
            admin_id: None,
            store_name: None,
            username: None,
            phone: None,
            picture_url: None,
            created_by: None,
        })
        .await
        .context("creating super admin")?;

    println!("✓ Super admin created: {} ({})", profile.email, profile.id);
    db.close().await;
    Ok(())
}

fn print_help() {
    println!("ShopDesk Super Admin Bootstrap");
    println!();
    println!("Usage: create-super-admin --email <EMAIL> --password <PASSWORD> --name <NAME> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -e, --email <EMAIL>        Sign-in email (required)");
    println!("  -p, --password <PASSWORD>  At least 6 characters (required)");
    println!("  -n, --name <NAME>          Display name (required)");
    println!("  -d, --db <PATH>            Database file path (default: $DATABASE_PATH or ./shopdesk.db)");
    println!("  -h, --help                 Show this help message");
}
