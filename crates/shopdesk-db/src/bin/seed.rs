//! # Demo Data Seeder
//!
//! Fills one store with categories, items and payment options.
//!
//! ## Usage
//! ```bash
//! # Seed the store owned by an existing admin
//! cargo run -p shopdesk-db --bin seed -- --admin <ADMIN_PROFILE_ID>
//!
//! # Specify database path
//! cargo run -p shopdesk-db --bin seed -- --admin <ID> --db ./data/shopdesk.db
//! ```
//!
//! Item codes come from the same generator the admin dashboard uses, so a
//! seeded store can contain colliding codes. Collisions are printed.

use std::env;

use shopdesk_core::codes::generate_item_code;
use shopdesk_core::Role;
use shopdesk_db::{Database, DbConfig, NewCategory, NewItem, NewPaymentOption};

/// (category, [(item, price_cents, quantity)])
const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Beverages",
        &[
            ("Cola 330ml", 150, 48),
            ("Orange Juice 1L", 320, 12),
            ("Mineral Water 500ml", 90, 96),
            ("Iced Tea 500ml", 180, 6),
        ],
    ),
    (
        "Snacks",
        &[
            ("Salted Crisps", 120, 40),
            ("Chocolate Bar", 110, 35),
            ("Peanuts 200g", 250, 8),
        ],
    ),
    (
        "Household",
        &[
            ("Dish Soap", 275, 20),
            ("Laundry Powder 1kg", 640, 9),
            ("Paper Towels", 399, 15),
        ],
    ),
];

const PAYMENT_OPTIONS: &[(&str, &str)] = &[("First Bank", "0001234567"), ("City Credit Union", "9876-5432-10")];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut admin_id: Option<String> = None;
    let mut db_path = String::from("./shopdesk.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--admin" | "-a" => {
                if i + 1 < args.len() {
                    admin_id = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let Some(admin_id) = admin_id else {
        print_help();
        return Err("--admin is required".into());
    };

    println!("ShopDesk Demo Seeder");
    println!("====================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    match db.profiles().get(&admin_id).await? {
        Some(profile) if profile.role == Role::Admin => {
            println!("✓ Seeding store: {}", profile.store_name.as_deref().unwrap_or(&profile.name));
        }
        _ => return Err(format!("{} is not an admin profile", admin_id).into()),
    }

    let existing = db.items().count(&admin_id).await?;
    if existing > 0 {
        println!("⚠ Store already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut rng = rand::thread_rng();
    let mut generated = 0;

    for (category_name, items) in CATALOG {
        let category = db
            .categories()
            .insert(&NewCategory {
                admin_id: admin_id.clone(),
                name: category_name.to_string(),
            })
            .await?;

        for (name, price_cents, quantity) in items.iter() {
            let code = generate_item_code(Some(&category.name), name, &mut rng);
            if db.items().code_exists(&admin_id, &code).await? {
                println!("  ⚠ Code collision: {}", code);
            }

            db.items()
                .insert(&NewItem {
                    admin_id: admin_id.clone(),
                    name: name.to_string(),
                    price_cents: *price_cents,
                    quantity: *quantity,
                    category_id: Some(category.id.clone()),
                    category_name: category.name.clone(),
                    code,
                    image_url: None,
                })
                .await?;
            generated += 1;
        }
    }
    println!("✓ {} categories, {} items", CATALOG.len(), generated);

    for (bank_name, account_number) in PAYMENT_OPTIONS {
        db.payment_options()
            .insert(&NewPaymentOption {
                admin_id: admin_id.clone(),
                bank_name: bank_name.to_string(),
                account_name: "Store Account".to_string(),
                account_number: account_number.to_string(),
            })
            .await?;
    }
    println!("✓ {} payment options", PAYMENT_OPTIONS.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn print_help() {
    println!("ShopDesk Demo Seeder");
    println!();
    println!("Usage: seed --admin <ID> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -a, --admin <ID>   Admin profile id owning the store (required)");
    println!("  -d, --db <PATH>    Database file path (default: ./shopdesk.db)");
    println!("  -h, --help         Show this help message");
}
