use serde::Serialize;
use time::OffsetDateTime;

use crate::users::repo_types::User;

/// Wire form of a user. Field order is the order clients see in JSON.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            password: u.password,
            email: u.email,
            phone: u.phone,
            address: u.address,
            created: u.created,
            updated: u.updated,
        }
    }
}

pub fn to_wire(user: User) -> UserResponse {
    UserResponse::from(user)
}
