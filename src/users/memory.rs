//! In-memory `UserStore` for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::repo::{StoreError, UserStore};
use super::repo_types::{NewUser, User, UserChanges, UserField};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

impl Table {
    fn taken(&self, field: UserField, value: &str, except: Option<i64>) -> bool {
        self.rows.values().any(|u| {
            Some(u.id) != except
                && match field {
                    UserField::Username => u.username == value,
                    UserField::Email => u.email == value,
                }
        })
    }
}

pub struct MemoryUserStore {
    table: RwLock<Table>,
    available: AtomicBool,
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table::default()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store switched off".into()))
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.check()?;
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_field(
        &self,
        field: UserField,
        value: &str,
    ) -> Result<Option<User>, StoreError> {
        self.check()?;
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .find(|u| match field {
                UserField::Username => u.username == value,
                UserField::Email => u.email == value,
            })
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.check()?;
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        self.check()?;
        let mut table = self.table.write().await;
        if table.taken(UserField::Username, &user.username, None) {
            return Err(StoreError::Conflict { field: "username" });
        }
        if table.taken(UserField::Email, &user.email, None) {
            return Err(StoreError::Conflict { field: "email" });
        }
        table.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: table.next_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, StoreError> {
        self.check()?;
        let mut table = self.table.write().await;
        if let Some(username) = &changes.username {
            if table.taken(UserField::Username, username, Some(id)) {
                return Err(StoreError::Conflict { field: "username" });
            }
        }
        if let Some(email) = &changes.email {
            if table.taken(UserField::Email, email, Some(id)) {
                return Err(StoreError::Conflict { field: "email" });
            }
        }
        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            row.username = username;
        }
        if let Some(email) = changes.email {
            row.email = email;
        }
        if let Some(hash) = changes.password_hash {
            row.password_hash = hash;
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}
