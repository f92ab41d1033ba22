//! The transaction ledger: recording income and expenses, the trash, and the
//! reports over date windows.

mod core;
mod endpoints;
mod form;
mod query;
mod summary;
mod trash;
mod window;

pub use self::core::{
    Transaction, TransactionBuilder, TransactionKind, create_transaction,
    create_transaction_table, trash_transaction, update_transaction,
};
#[cfg(test)]
pub use self::core::get_transaction;
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, expense_summary_endpoint,
    highest_endpoint, income_summary_endpoint, left_endpoint, list_transactions_endpoint,
    purge_transaction_endpoint, purge_transactions_of_kind_endpoint,
    restore_transaction_endpoint, restore_transactions_of_kind_endpoint,
    transaction_trash_endpoint, update_transaction_endpoint,
};
