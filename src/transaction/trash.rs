//! Restoring and permanently deleting trashed transactions.

use rusqlite::Connection;

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{
        Transaction, TransactionKind,
        core::{TRANSACTION_COLUMNS, map_transaction_row},
    },
    user::UserID,
};

/// Take a trashed transaction owned by `user_id` out of the trash.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` is not in the trash of `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn restore_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET deleted_at = NULL
             WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NOT NULL
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .map_err(|error| error.into())
}

/// Take every trashed transaction of `kind` owned by `user_id` out of the
/// trash, returning how many were restored.
///
/// # Errors
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn restore_transactions_of_kind(
    user_id: UserID,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE \"transaction\" SET deleted_at = NULL
             WHERE user_id = ?1 AND type = ?2 AND deleted_at IS NOT NULL",
            (user_id.as_i64(), kind),
        )
        .map_err(|error| error.into())
}

/// Permanently delete a trashed transaction owned by `user_id`.
///
/// Active transactions must be trashed first.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` is not in the trash of `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn purge_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "DELETE FROM \"transaction\"
             WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NOT NULL
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .map_err(|error| error.into())
}

/// Permanently delete every trashed transaction of `kind` owned by `user_id`,
/// returning how many were deleted.
///
/// # Errors
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn purge_transactions_of_kind(
    user_id: UserID,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\"
             WHERE user_id = ?1 AND type = ?2 AND deleted_at IS NOT NULL",
            (user_id.as_i64(), kind),
        )
        .map_err(|error| error.into())
}

#[cfg(test)]
mod trash_tests {
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        Error,
        test_utils::{get_test_connection, insert_test_user},
        transaction::{
            Transaction, TransactionKind, create_transaction, get_transaction, trash_transaction,
        },
        user::UserID,
    };

    use super::{
        purge_transaction, purge_transactions_of_kind, restore_transaction,
        restore_transactions_of_kind,
    };

    const NOW: OffsetDateTime = datetime!(2024-01-05 10:00:00 UTC);

    fn insert(conn: &Connection, user_id: UserID, kind: TransactionKind) -> Transaction {
        create_transaction(user_id, Transaction::build(kind, "test", 1.0), NOW, conn).unwrap()
    }

    #[test]
    fn delete_then_restore_only_changes_deleted_at() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "alice@example.com");
        let original = insert(&conn, user_id, TransactionKind::Income);
        trash_transaction(user_id, original.id, datetime!(2024-01-06 00:00:00 UTC), &conn)
            .unwrap();

        let restored = restore_transaction(user_id, original.id, &conn).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn active_transactions_cannot_be_restored_or_purged() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "alice@example.com");
        let transaction = insert(&conn, user_id, TransactionKind::Income);

        assert_eq!(
            restore_transaction(user_id, transaction.id, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            purge_transaction(user_id, transaction.id, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(get_transaction(user_id, transaction.id, &conn), Ok(transaction));
    }

    #[test]
    fn purged_transaction_cannot_be_restored() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "alice@example.com");
        let transaction = insert(&conn, user_id, TransactionKind::Expense);
        trash_transaction(user_id, transaction.id, NOW, &conn).unwrap();

        let purged = purge_transaction(user_id, transaction.id, &conn).unwrap();

        assert_eq!(purged.id, transaction.id);
        assert_eq!(
            restore_transaction(user_id, transaction.id, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            get_transaction(user_id, transaction.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn other_users_trash_is_untouched() {
        let conn = get_test_connection();
        let alice = insert_test_user(&conn, "alice@example.com");
        let bob = insert_test_user(&conn, "bob@example.com");
        let transaction = insert(&conn, alice, TransactionKind::Expense);
        trash_transaction(alice, transaction.id, NOW, &conn).unwrap();

        assert_eq!(
            restore_transaction(bob, transaction.id, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            purge_transaction(bob, transaction.id, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            purge_transactions_of_kind(bob, TransactionKind::Expense, &conn),
            Ok(0)
        );
        assert!(
            get_transaction(alice, transaction.id, &conn)
                .unwrap()
                .deleted_at
                .is_some()
        );
    }

    #[test]
    fn bulk_operations_only_touch_trashed_transactions_of_kind() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "alice@example.com");
        let active_income = insert(&conn, user_id, TransactionKind::Income);
        let trashed_income: Vec<Transaction> = (0..2)
            .map(|_| insert(&conn, user_id, TransactionKind::Income))
            .collect();
        let trashed_expense = insert(&conn, user_id, TransactionKind::Expense);
        for transaction in trashed_income.iter().chain([&trashed_expense]) {
            trash_transaction(user_id, transaction.id, NOW, &conn).unwrap();
        }

        assert_eq!(
            restore_transactions_of_kind(user_id, TransactionKind::Income, &conn),
            Ok(2)
        );
        assert_eq!(
            restore_transactions_of_kind(user_id, TransactionKind::Income, &conn),
            Ok(0)
        );
        assert_eq!(
            purge_transactions_of_kind(user_id, TransactionKind::Expense, &conn),
            Ok(1)
        );
        assert_eq!(
            purge_transactions_of_kind(user_id, TransactionKind::Income, &conn),
            Ok(0)
        );
        assert_eq!(
            get_transaction(user_id, active_income.id, &conn),
            Ok(active_income)
        );
        assert_eq!(
            get_transaction(user_id, trashed_expense.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn purging_user_removes_their_transactions() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "alice@example.com");
        let transaction = insert(&conn, user_id, TransactionKind::Income);
        crate::user::trash_user(user_id, NOW, &conn).unwrap();
        crate::user::purge_user(user_id, &conn).unwrap();

        let remaining: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM \"transaction\" WHERE id = ?1",
                (transaction.id,),
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(remaining, 0);
    }
}
