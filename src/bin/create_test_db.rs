use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use pocket_ledger::{
    NewUser, PasswordHash, Transaction, TransactionKind, ValidatedPassword, create_transaction,
    create_user, initialize_db,
};

/// A utility for creating a test database for the REST API server of pocket_ledger.
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

    println!("Creating test user test@example.com with the password 'test'...");

    let now = OffsetDateTime::now_utc();
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        NewUser {
            name: "Test User".to_owned(),
            email: "test@example.com".to_owned(),
            password_hash,
        },
        now,
        &conn,
    )?;

    println!("Creating test transactions...");

    let transactions = [
        (TransactionKind::Income, "Salary", 2500.0, 0),
        (TransactionKind::Expense, "Rent", 950.0, 0),
        (TransactionKind::Expense, "Groceries", 123.45, 1),
        (TransactionKind::Expense, "Coffee", 4.5, 2),
        (TransactionKind::Income, "Freelance", 400.0, 40),
        (TransactionKind::Expense, "Power bill", 180.0, 45),
    ];

    for (kind, name, amount, days_ago) in transactions {
        create_transaction(
            user.id,
            Transaction::build(kind, name, amount).created_at(now - Duration::days(days_ago)),
            now,
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
