//! Fixtures shared by the repository tests.

use shopdesk_core::codes::{generate_item_code, generate_username};
use shopdesk_core::{Category, Item, PaymentOption, Profile, Role};

use crate::{Database, DbConfig, NewAccount, NewCategory, NewItem, NewPaymentOption};

pub async fn db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn email_for(name: &str) -> String {
    let local: String = name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    format!("{}@shop.com", local)
}

pub async fn account(
    db: &Database,
    email: &str,
    name: &str,
    role: Role,
    admin_id: Option<&str>,
) -> Profile {
    db.profiles()
        .provision(&NewAccount {
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            name: name.to_string(),
            role,
            admin_id: admin_id.map(str::to_string),
            store_name: (role == Role::Admin).then(|| format!("{}'s Store", name)),
            username: (role == Role::Salesperson).then(|| generate_username(name)),
            phone: None,
            picture_url: None,
            created_by: None,
        })
        .await
        .unwrap()
}

pub async fn admin(db: &Database, name: &str) -> Profile {
    account(db, &email_for(name), name, Role::Admin, None).await
}

pub async fn salesperson(db: &Database, admin: &Profile, name: &str) -> Profile {
    account(db, &email_for(name), name, Role::Salesperson, Some(&admin.id)).await
}

pub async fn category(db: &Database, admin: &Profile, name: &str) -> Category {
    db.categories()
        .insert(&NewCategory {
            admin_id: admin.id.clone(),
            name: name.to_string(),
        })
        .await
        .unwrap()
}

pub async fn item(db: &Database, admin: &Profile, name: &str, price_cents: i64, quantity: i64) -> Item {
    let code = generate_item_code(None, name, &mut rand::thread_rng());
    db.items()
        .insert(&NewItem {
            admin_id: admin.id.clone(),
            name: name.to_string(),
            price_cents,
            quantity,
            category_id: None,
            category_name: String::new(),
            code,
            image_url: None,
        })
        .await
        .unwrap()
}

pub async fn payment_option(db: &Database, admin: &Profile, bank: &str) -> PaymentOption {
    db.payment_options()
        .insert(&NewPaymentOption {
            admin_id: admin.id.clone(),
            bank_name: bank.to_string(),
            account_name: admin.name.clone(),
            account_number: "0123456789".to_string(),
        })
        .await
        .unwrap()
}
