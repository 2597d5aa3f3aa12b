//! Test doubles for HTTP handler tests.
//!
//! The stubs keep their rows behind a `Mutex` and mimic the domain services'
//! error contracts (`not_found`, `conflict`, unknown owner) without touching a
//! database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::domain::ports::{
    DatabaseHealth, DatabaseHealthError, ItemFilter, ItemsCommand, ItemsQuery, UsersCommand,
    UsersQuery,
};
use crate::domain::{
    Error, Item, ItemChanges, ItemId, NewItem, NewUser, PageRequest, PasswordHash, User,
    UserChanges, UserId,
};
use crate::test_support::fixtures::{fixed_time, fixture_clock};

use super::state::{HttpState, HttpStatePorts, ServiceInfo};

fn page_of<T: Clone>(rows: &[T], page: PageRequest) -> Vec<T> {
    let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
    rows.iter()
        .skip(skip)
        .take(page.limit() as usize)
        .cloned()
        .collect()
}

/// In-memory users port.
#[derive(Default)]
pub struct StubUsers {
    users: Mutex<Vec<User>>,
    failure: Mutex<Option<Error>>,
}

impl StubUsers {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            failure: Mutex::new(None),
        }
    }

    /// Every call fails with `error`.
    pub fn failing(error: Error) -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            failure: Mutex::new(Some(error)),
        }
    }

    pub fn snapshot(&self) -> Vec<User> {
        self.users.lock().expect("users lock").clone()
    }

    fn check(&self) -> Result<(), Error> {
        match self.failure.lock().expect("failure lock").as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn user_not_found(id: &UserId) -> Error {
    Error::not_found(format!("user {id} not found"))
}

#[async_trait]
impl UsersQuery for StubUsers {
    async fn list_users(&self, page: PageRequest) -> Result<Vec<User>, Error> {
        self.check()?;
        Ok(page_of(&self.users.lock().expect("users lock"), page))
    }

    async fn get_user(&self, id: &UserId) -> Result<User, Error> {
        self.check()?;
        self.users
            .lock()
            .expect("users lock")
            .iter()
            .find(|user| user.id == *id)
            .cloned()
            .ok_or_else(|| user_not_found(id))
    }
}

#[async_trait]
impl UsersCommand for StubUsers {
    async fn create_user(&self, new_user: NewUser) -> Result<User, Error> {
        self.check()?;
        let mut users = self.users.lock().expect("users lock");
        if users
            .iter()
            .any(|user| user.email == new_user.email || user.username == new_user.username)
        {
            return Err(Error::conflict("email or username already registered")
                .with_details(json!({ "code": "duplicate_user" })));
        }
        let user = User {
            id: UserId::random(),
            email: new_user.email,
            username: new_user.username,
            full_name: new_user.full_name,
            hashed_password: PasswordHash::new(format!("hashed:{}", new_user.password.expose())),
            is_active: new_user.is_active,
            is_superuser: new_user.is_superuser,
            is_verified: new_user.is_verified,
            avatar_url: new_user.avatar_url,
            bio: new_user.bio,
            extra_data: new_user.extra_data,
            created_at: fixed_time(),
            updated_at: fixed_time(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: &UserId, changes: UserChanges) -> Result<User, Error> {
        self.check()?;
        let mut users = self.users.lock().expect("users lock");
        let user = users
            .iter_mut()
            .find(|user| user.id == *id)
            .ok_or_else(|| user_not_found(id))?;
        if let Some(password) = changes.apply_to(user) {
            user.hashed_password = PasswordHash::new(format!("hashed:{}", password.expose()));
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), Error> {
        self.check()?;
        let mut users = self.users.lock().expect("users lock");
        let before = users.len();
        users.retain(|user| user.id != *id);
        if users.len() == before {
            return Err(user_not_found(id));
        }
        Ok(())
    }
}

/// In-memory items port; only `owners` may own new items.
#[derive(Default)]
pub struct StubItems {
    items: Mutex<Vec<Item>>,
    owners: Mutex<Vec<UserId>>,
}

impl StubItems {
    pub fn new(owners: Vec<UserId>, items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
            owners: Mutex::new(owners),
        }
    }

    pub fn snapshot(&self) -> Vec<Item> {
        self.items.lock().expect("items lock").clone()
    }

    fn check_owner(&self, owner_id: &UserId) -> Result<(), Error> {
        if self.owners.lock().expect("owners lock").contains(owner_id) {
            return Ok(());
        }
        Err(
            Error::invalid_request(format!("owner {owner_id} does not exist"))
                .with_details(json!({ "field": "ownerId", "code": "unknown_owner" })),
        )
    }
}

fn item_not_found(id: &ItemId) -> Error {
    Error::not_found(format!("item {id} not found"))
}

fn matches(filter: &ItemFilter, item: &Item) -> bool {
    filter.owner_id.is_none_or(|owner| owner == item.owner_id)
        && filter
            .category
            .as_ref()
            .is_none_or(|category| item.category.as_ref() == Some(category))
        && filter.is_active.is_none_or(|active| active == item.is_active)
}

#[async_trait]
impl ItemsQuery for StubItems {
    async fn list_items(&self, filter: ItemFilter, page: PageRequest) -> Result<Vec<Item>, Error> {
        let items = self.items.lock().expect("items lock");
        let selected: Vec<Item> = items
            .iter()
            .filter(|item| matches(&filter, item))
            .cloned()
            .collect();
        Ok(page_of(&selected, page))
    }

    async fn get_item(&self, id: &ItemId) -> Result<Item, Error> {
        self.items
            .lock()
            .expect("items lock")
            .iter()
            .find(|item| item.id == *id)
            .cloned()
            .ok_or_else(|| item_not_found(id))
    }
}

#[async_trait]
impl ItemsCommand for StubItems {
    async fn create_item(&self, new_item: NewItem) -> Result<Item, Error> {
        self.check_owner(&new_item.owner_id)?;
        let item = Item {
            id: ItemId::random(),
            title: new_item.title,
            description: new_item.description,
            price: new_item.price,
            currency: new_item.currency,
            is_active: new_item.is_active,
            category: new_item.category,
            tags: new_item.tags,
            extra_data: new_item.extra_data,
            owner_id: new_item.owner_id,
            created_at: fixed_time(),
            updated_at: fixed_time(),
        };
        self.items.lock().expect("items lock").push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: &ItemId, changes: ItemChanges) -> Result<Item, Error> {
        if let Some(owner) = &changes.owner_id {
            self.check_owner(owner)?;
        }
        let mut items = self.items.lock().expect("items lock");
        let item = items
            .iter_mut()
            .find(|item| item.id == *id)
            .ok_or_else(|| item_not_found(id))?;
        changes.apply_to(item);
        Ok(item.clone())
    }

    async fn delete_item(&self, id: &ItemId) -> Result<(), Error> {
        let mut items = self.items.lock().expect("items lock");
        let before = items.len();
        items.retain(|item| item.id != *id);
        if items.len() == before {
            return Err(item_not_found(id));
        }
        Ok(())
    }
}

/// Database probe with a fixed answer.
pub struct StubDatabase {
    reachable: bool,
    pool_size: u32,
}

impl StubDatabase {
    pub fn new(reachable: bool, pool_size: u32) -> Self {
        Self {
            reachable,
            pool_size,
        }
    }
}

#[async_trait]
impl DatabaseHealth for StubDatabase {
    async fn ping(&self) -> Result<(), DatabaseHealthError> {
        if self.reachable {
            Ok(())
        } else {
            Err(DatabaseHealthError::unreachable("connection refused"))
        }
    }

    fn pool_size(&self) -> u32 {
        self.pool_size
    }
}

/// Builder for an [`HttpState`] wired to stubs.
pub struct TestState {
    users: Arc<StubUsers>,
    items: Arc<StubItems>,
    database: Arc<StubDatabase>,
    debug: bool,
}

/// Empty stubs, a reachable database and debug mode on.
pub fn test_state() -> TestState {
    TestState {
        users: Arc::new(StubUsers::default()),
        items: Arc::new(StubItems::default()),
        database: Arc::new(StubDatabase::new(true, 10)),
        debug: true,
    }
}

impl TestState {
    pub fn with_users(mut self, users: Arc<StubUsers>) -> Self {
        self.users = users;
        self
    }

    pub fn with_items(mut self, items: Arc<StubItems>) -> Self {
        self.items = items;
        self
    }

    pub fn with_database(mut self, database: StubDatabase) -> Self {
        self.database = Arc::new(database);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn build(self) -> HttpState {
        HttpState::new(
            HttpStatePorts {
                users: self.users.clone(),
                users_command: self.users,
                items: self.items.clone(),
                items_command: self.items,
                database: self.database,
                clock: fixture_clock(),
            },
            ServiceInfo::new("Test Project", "test", self.debug),
        )
    }
}
