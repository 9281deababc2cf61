//! # Seed Data Generator
//!
//! Populates a database with a small demo catalog and customer list.
//!
//! ## Usage
//! ```bash
//! # Seed ./billbook_dev.db
//! cargo run -p billbook-db --bin seed
//!
//! # Specify database path
//! cargo run -p billbook-db --bin seed -- --db ./data/billbook.db
//! ```
//!
//! Categories become top-level products, every item is filed under one.
//! Roughly one item in five starts at or below its minimum stock so the
//! low-stock view has something to show.

use billbook_core::{CustomerDraft, Money, ProductDraft};
use billbook_db::{Database, DbConfig};
use std::env;

/// (category, unit, [(item, price in cents)])
const CATALOG: &[(&str, &str, &[(&str, i64)])] = &[
    (
        "Grains",
        "kg",
        &[
            ("Basmati Rice", 9000),
            ("Brown Rice", 7500),
            ("Wheat Flour", 4200),
            ("Rolled Oats", 16500),
        ],
    ),
    (
        "Pulses",
        "kg",
        &[
            ("Toor Dal", 14000),
            ("Moong Dal", 12500),
            ("Chickpeas", 9800),
        ],
    ),
    (
        "Dairy",
        "pcs",
        &[
            ("Milk 1L", 2800),
            ("Paneer 200g", 9000),
            ("Curd 400g", 4500),
            ("Butter 100g", 5600),
        ],
    ),
    (
        "Beverages",
        "pcs",
        &[
            ("Tea 250g", 14500),
            ("Instant Coffee 50g", 18000),
            ("Mango Drink 1L", 9900),
        ],
    ),
];

const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Asha Verma", "98765 43210", "12 Market Road"),
    ("Ravi Kumar", "91234 56789", "4 Temple Street"),
    ("Meera Shah", "99887 76655", ""),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = "./billbook_dev.db".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Billbook Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./billbook_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Billbook Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().list().await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let products = db.products();
    let mut seed = 0i64;
    for (category, unit, items) in CATALOG {
        let parent = products
            .add(ProductDraft {
                name: category.to_string(),
                ..Default::default()
            })
            .await?;

        for (name, price) in items.iter() {
            seed += 1;
            let min_stock = 5 + seed % 6;
            let stock = if seed % 5 == 0 { min_stock - 2 } else { 10 + (seed * 7) % 41 };

            products
                .add(ProductDraft {
                    name: name.to_string(),
                    parent_id: Some(parent.id.clone()),
                    price: Money::from_cents(*price),
                    stock,
                    min_stock,
                    unit: unit.to_string(),
                })
                .await?;
        }
    }
    println!("✓ Added {} categories, {} products", CATALOG.len(), seed);

    for (name, phone, address) in CUSTOMERS {
        db.customers()
            .add(CustomerDraft {
                name: name.to_string(),
                phone: phone.to_string(),
                address: address.to_string(),
            })
            .await?;
    }
    println!("✓ Added {} customers", CUSTOMERS.len());

    let low = db.products().low_stock().await?;
    println!("  Low stock: {} products", low.len());
    println!(
        "  Next invoice: {}",
        db.invoices().peek_next_invoice_number().await?
    );

    db.close().await;
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
