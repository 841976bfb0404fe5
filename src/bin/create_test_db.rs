use std::{
    error::Error,
    path::Path,
    process::exit,
    sync::{Arc, Mutex},
};

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use fintrack_rs::{
    NewTransaction, SQLiteTransactionStore, TransactionStore, TransactionType, create_user,
    initialize_db,
};

/// A utility for creating a test database for the REST API server of fintrack_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");
    let user = create_user("Test User", Some(Decimal::new(1500, 0)), &conn)?;

    println!("Creating transactions...");
    let store = SQLiteTransactionStore::new(Arc::new(Mutex::new(conn)));
    let now = OffsetDateTime::now_utc();

    // Three months of pay, rent and groceries so that summaries have some history.
    for months_ago in 0..3 {
        let month_start = now - Duration::days(30 * months_ago);

        let transactions = [
            ("Salary", Decimal::new(4200, 0), TransactionType::Income, "Salary", 0),
            ("Rent", Decimal::new(1650, 0), TransactionType::Expense, "Housing", 1),
            ("Groceries", Decimal::new(18245, 2), TransactionType::Expense, "Food", 3),
            ("Bus pass", Decimal::new(60, 0), TransactionType::Expense, "Transport", 5),
            ("Dinner out", Decimal::new(7480, 2), TransactionType::Expense, "Food", 12),
        ];

        for (title, amount, kind, category, day_offset) in transactions {
            store.insert(NewTransaction {
                owner: user.id,
                title: title.to_owned(),
                amount,
                kind,
                category: category.to_owned(),
                date: month_start - Duration::days(day_offset),
                description: None,
            })?;
        }
    }

    println!("Success! Created user {} with ID {}.", user.name, user.id);

    Ok(())
}
