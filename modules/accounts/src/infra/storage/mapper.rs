use crate::contract::model::User;
use crate::infra::storage::user::Model as UserRow;

/// Convert a database row to a contract model; the password hash stays behind.
pub fn user_to_contract(row: UserRow) -> User {
    User {
        id: row.id,
        email: row.email,
        name: row.name,
        is_staff: row.is_staff,
        is_superuser: row.is_superuser,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
