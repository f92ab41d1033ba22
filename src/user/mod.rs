//! Users of the application and the endpoints for managing them.

mod core;
mod endpoints;
mod form;

pub use self::core::{
    NewUser, User, UserID, UserSortKey, create_user, create_user_table, get_user_by_email,
    get_user_by_id, list_users, purge_all_users, purge_user, restore_all_users, restore_user,
    trash_user, update_password, update_user,
};
pub use endpoints::{
    create_user_endpoint, delete_user_endpoint, get_me, list_users_endpoint,
    purge_all_users_endpoint, purge_user_endpoint, restore_all_users_endpoint,
    restore_user_endpoint, update_user_endpoint, user_trash_endpoint,
};
pub use form::UserForm;
