//! User registry operations

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common::{SnapshotConfig, SnapshotStore, check_record};
use tracing::{info, warn};

use crate::credentials::{Verification, hash_credential, normalize_credential, verify_credential};
use crate::error::{RegistryError, RegistryResult};
use crate::models::{Goal, Meal, User, Workout};

/// Summary of the snapshot load performed when the registry was opened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenReport {
    /// Number of users loaded
    pub loaded: usize,
    /// Keys of snapshot entries that were skipped as malformed
    pub skipped: Vec<String>,
    /// Whether unreadable snapshot content was set aside
    pub quarantined: bool,
}

struct RegistryState {
    users: BTreeMap<String, User>,
    store: SnapshotStore<User>,
}

impl RegistryState {
    fn persist(&self) -> RegistryResult<()> {
        self.store.save(&self.users)?;
        Ok(())
    }
}

/// User registry
///
/// Holds every profile in memory and writes the full registry to the
/// snapshot after each change. A single lock covers the map and the snapshot
/// file, so clones of the registry can be shared between callers.
#[derive(Clone)]
pub struct UserRegistry {
    state: Arc<Mutex<RegistryState>>,
    open_report: OpenReport,
}

impl UserRegistry {
    /// Open the registry from an existing snapshot store
    ///
    /// Missing or corrupt snapshots yield an empty registry; only an I/O
    /// failure reading an existing snapshot is returned as an error.
    pub fn open(store: SnapshotStore<User>) -> RegistryResult<Self> {
        let report = store.load()?;

        let open_report = OpenReport {
            loaded: report.records.len(),
            skipped: report.rejected.into_iter().map(|r| r.key).collect(),
            quarantined: report.quarantined,
        };
        info!(
            "User registry opened with {} users from {}",
            open_report.loaded,
            store.path().display()
        );

        Ok(Self {
            state: Arc::new(Mutex::new(RegistryState {
                users: report.records,
                store,
            })),
            open_report,
        })
    }

    /// Open the registry from configuration
    pub fn open_from_config(config: &SnapshotConfig) -> RegistryResult<Self> {
        Self::open(SnapshotStore::new(config)?)
    }

    /// Summary of the load performed by `open`
    pub fn open_report(&self) -> &OpenReport {
        &self.open_report
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new user
    ///
    /// The supplied credential is hashed before it is stored. A user that
    /// cannot be encoded into the snapshot, such as one with a non-finite
    /// measurement, is refused and the registry is left unchanged.
    pub fn add_user(&self, mut user: User) -> RegistryResult<User> {
        let mut state = self.lock();

        if state.users.contains_key(&user.username) {
            warn!(
                "Failed to add user: Username {} already exists",
                user.username
            );
            return Err(RegistryError::DuplicateUsername(user.username));
        }

        user.credential = hash_credential(&user.credential);
        check_record(&user)?;
        state.users.insert(user.username.clone(), user.clone());
        state.persist()?;

        info!("Added new user: {}", user.username);
        Ok(user)
    }

    /// Replace an existing user's profile and history
    ///
    /// A credential that differs from the stored one and is not already a
    /// digest is hashed before storage.
    pub fn update_user(&self, mut user: User) -> RegistryResult<User> {
        let mut state = self.lock();

        let Some(current) = state.users.get(&user.username) else {
            warn!("Failed to update user: Username {} not found", user.username);
            return Err(RegistryError::UserNotFound(user.username));
        };

        let candidate = std::mem::take(&mut user.credential);
        user.credential = normalize_credential(&current.credential, candidate);
        check_record(&user)?;

        state.users.insert(user.username.clone(), user.clone());
        state.persist()?;

        info!("Updated user: {}", user.username);
        Ok(user)
    }

    /// Remove a user and their whole history
    pub fn delete_user(&self, username: &str) -> RegistryResult<()> {
        let mut state = self.lock();

        if state.users.remove(username).is_none() {
            warn!("Failed to delete user: Username {} not found", username);
            return Err(RegistryError::UserNotFound(username.to_string()));
        }
        state.persist()?;

        info!("Deleted user: {}", username);
        Ok(())
    }

    /// Find a user by username
    pub fn get_user(&self, username: &str) -> Option<User> {
        self.lock().users.get(username).cloned()
    }

    /// Authenticate a user
    ///
    /// Unknown usernames and wrong secrets both fail with
    /// `InvalidCredentials`. A matching plaintext credential from an older
    /// release is replaced by its digest and persisted; if that write fails
    /// the login still succeeds and the upgrade is retried on the next save.
    pub fn authenticate_user(&self, username: &str, secret: &str) -> RegistryResult<User> {
        let mut state = self.lock();

        let Some(user) = state.users.get_mut(username) else {
            warn!("Authentication failed: Username {} not found", username);
            return Err(RegistryError::InvalidCredentials);
        };

        match verify_credential(&user.credential, secret) {
            Verification::Match => {
                info!("User authenticated: {}", username);
                Ok(user.clone())
            }
            Verification::LegacyMatch => {
                user.credential = hash_credential(secret);
                let user = user.clone();

                if let Err(e) = state.persist() {
                    warn!("Credential upgrade for {} not persisted: {}", username, e);
                }

                info!("User authenticated (credential upgraded to hash): {}", username);
                Ok(user)
            }
            Verification::Mismatch => {
                warn!("Authentication failed: Invalid password for {}", username);
                Err(RegistryError::InvalidCredentials)
            }
        }
    }

    /// Apply a change to a stored user
    ///
    /// The closure works on a copy; the change is committed and persisted
    /// only if it returns `Ok` and leaves the username untouched.
    pub fn modify_user<F>(&self, username: &str, f: F) -> RegistryResult<User>
    where
        F: FnOnce(&mut User) -> RegistryResult<()>,
    {
        let mut state = self.lock();

        let Some(current) = state.users.get(username) else {
            warn!("Failed to modify user: Username {} not found", username);
            return Err(RegistryError::UserNotFound(username.to_string()));
        };

        let mut updated = current.clone();
        f(&mut updated)?;

        if updated.username != username {
            return Err(RegistryError::UsernameImmutable {
                expected: username.to_string(),
                found: updated.username,
            });
        }

        let candidate = std::mem::take(&mut updated.credential);
        updated.credential = normalize_credential(&current.credential, candidate);
        check_record(&updated)?;

        state.users.insert(username.to_string(), updated.clone());
        state.persist()?;

        info!("Modified user: {}", username);
        Ok(updated)
    }

    /// Append a workout to a user's history
    pub fn log_workout(&self, username: &str, workout: Workout) -> RegistryResult<User> {
        self.modify_user(username, |user| {
            user.workouts.push(workout);
            Ok(())
        })
    }

    /// Append a meal to a user's history
    pub fn log_meal(&self, username: &str, meal: Meal) -> RegistryResult<User> {
        self.modify_user(username, |user| {
            user.meals.push(meal);
            Ok(())
        })
    }

    /// Add a goal for a user
    pub fn add_goal(&self, username: &str, goal: Goal) -> RegistryResult<User> {
        self.modify_user(username, |user| {
            user.goals.push(goal);
            Ok(())
        })
    }

    /// Mark the goal at `index` as completed
    pub fn complete_goal(&self, username: &str, index: usize) -> RegistryResult<User> {
        self.modify_user(username, |user| {
            let goal = user
                .goals
                .get_mut(index)
                .ok_or(RegistryError::RecordNotFound { kind: "goal", index })?;
            goal.completed = true;
            Ok(())
        })
    }

    /// Remove the workout at `index`
    pub fn remove_workout(&self, username: &str, index: usize) -> RegistryResult<User> {
        self.modify_user(username, |user| {
            remove_at(&mut user.workouts, index, "workout").map(drop)
        })
    }

    /// Remove the meal at `index`
    pub fn remove_meal(&self, username: &str, index: usize) -> RegistryResult<User> {
        self.modify_user(username, |user| {
            remove_at(&mut user.meals, index, "meal").map(drop)
        })
    }

    /// Remove the goal at `index`
    pub fn remove_goal(&self, username: &str, index: usize) -> RegistryResult<User> {
        self.modify_user(username, |user| {
            remove_at(&mut user.goals, index, "goal").map(drop)
        })
    }

    /// All registered usernames, sorted
    pub fn usernames(&self) -> Vec<String> {
        self.lock().users.keys().cloned().collect()
    }

    /// Number of registered users
    pub fn len(&self) -> usize {
        self.lock().users.len()
    }

    /// Whether no user is registered
    pub fn is_empty(&self) -> bool {
        self.lock().users.is_empty()
    }

    /// Write the current registry to the snapshot
    ///
    /// Used to retry after an operation reported a persistence error; the
    /// in-memory change from that operation is still applied.
    pub fn persist(&self) -> RegistryResult<()> {
        self.lock().persist()
    }
}

fn remove_at<T>(items: &mut Vec<T>, index: usize, kind: &'static str) -> RegistryResult<T> {
    if index >= items.len() {
        return Err(RegistryError::RecordNotFound { kind, index });
    }
    Ok(items.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::looks_hashed;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> UserRegistry {
        UserRegistry::open_from_config(&SnapshotConfig::new(dir.path().join("data.json"))).unwrap()
    }

    fn test_user() -> User {
        User::new("testuser", "password", "Test User", 25, "Male", 175.0, 70.0)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 10, day).unwrap()
    }

    #[test]
    fn test_add_user_hashes_credential() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);

        let stored = registry.add_user(test_user()).unwrap();

        assert_ne!(stored.credential, "password");
        assert_eq!(stored.credential, hash_credential("password"));
        assert_eq!(registry.get_user("testuser").unwrap(), stored);
    }

    #[test]
    fn test_add_duplicate_user_keeps_original() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        registry.add_user(test_user()).unwrap();

        let duplicate = User::new("testuser", "different", "Another User", 30, "Female", 165.0, 60.0);
        let result = registry.add_user(duplicate);

        assert!(matches!(result, Err(RegistryError::DuplicateUsername(name)) if name == "testuser"));
        let stored = registry.get_user("testuser").unwrap();
        assert_eq!(stored.display_name, "Test User");
        assert_eq!(stored.credential, hash_credential("password"));
    }

    #[test]
    fn test_update_user_keeps_unchanged_digest() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        registry.add_user(test_user()).unwrap();

        let mut user = registry.get_user("testuser").unwrap();
        user.display_name = "Updated Name".to_string();
        user.age = 26;
        let updated = registry.update_user(user).unwrap();

        assert_eq!(updated.display_name, "Updated Name");
        assert_eq!(updated.credential, hash_credential("password"));
        assert!(registry.authenticate_user("testuser", "password").is_ok());
    }

    #[test]
    fn test_update_user_hashes_new_plaintext() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        registry.add_user(test_user()).unwrap();

        let mut user = registry.get_user("testuser").unwrap();
        user.credential = "newpassword".to_string();
        registry.update_user(user).unwrap();

        let stored = registry.get_user("testuser").unwrap();
        assert_eq!(stored.credential, hash_credential("newpassword"));
        assert!(registry.authenticate_user("testuser", "newpassword").is_ok());
        assert!(matches!(
            registry.authenticate_user("testuser", "password"),
            Err(RegistryError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_update_nonexistent_user() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);

        let result = registry.update_user(test_user());

        assert!(matches!(result, Err(RegistryError::UserNotFound(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_delete_user() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        registry.add_user(test_user()).unwrap();

        registry.delete_user("testuser").unwrap();

        assert!(registry.get_user("testuser").is_none());
        assert!(matches!(
            registry.delete_user("testuser"),
            Err(RegistryError::UserNotFound(_))
        ));
    }

    #[test]
    fn test_authentication_failures_are_uniform() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        registry.add_user(test_user()).unwrap();

        let unknown = registry.authenticate_user("nosuchuser", "x").unwrap_err();
        let wrong = registry.authenticate_user("testuser", "wrongpassword").unwrap_err();

        assert!(matches!(unknown, RegistryError::InvalidCredentials));
        assert!(matches!(wrong, RegistryError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[test]
    fn test_modify_user_appends_history() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        registry.add_user(test_user()).unwrap();

        registry
            .log_workout("testuser", Workout::new("Running", 30, 350, date(15)))
            .unwrap();
        registry
            .log_meal(
                "testuser",
                Meal::new("Breakfast", "Oatmeal", 350, 12.0, 45.0, 10.0, date(15)),
            )
            .unwrap();
        registry
            .add_goal(
                "testuser",
                Goal::with_start_date("Weight loss", "Lose 5kg", date(31), date(15)),
            )
            .unwrap();
        let user = registry.complete_goal("testuser", 0).unwrap();

        assert_eq!(user.workouts.len(), 1);
        assert_eq!(user.meals.len(), 1);
        assert!(user.goals[0].completed);
        assert_eq!(registry.get_user("testuser").unwrap(), user);
    }

    #[test]
    fn test_modify_user_rejects_username_change() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        registry.add_user(test_user()).unwrap();

        let result = registry.modify_user("testuser", |user| {
            user.username = "renamed".to_string();
            Ok(())
        });

        assert!(matches!(result, Err(RegistryError::UsernameImmutable { .. })));
        assert!(registry.get_user("testuser").is_some());
        assert!(registry.get_user("renamed").is_none());
    }

    #[test]
    fn test_modify_user_discards_failed_change() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        registry.add_user(test_user()).unwrap();

        let result = registry.modify_user("testuser", |user| {
            user.display_name = "Half Done".to_string();
            Err(RegistryError::RecordNotFound { kind: "goal", index: 3 })
        });

        assert!(result.is_err());
        assert_eq!(registry.get_user("testuser").unwrap().display_name, "Test User");
    }

    #[test]
    fn test_out_of_range_index() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        registry.add_user(test_user()).unwrap();

        assert!(matches!(
            registry.complete_goal("testuser", 0),
            Err(RegistryError::RecordNotFound { kind: "goal", index: 0 })
        ));
        assert!(matches!(
            registry.remove_workout("testuser", 2),
            Err(RegistryError::RecordNotFound { kind: "workout", index: 2 })
        ));
    }

    #[test]
    fn test_remove_entries() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        registry.add_user(test_user()).unwrap();
        registry
            .log_workout("testuser", Workout::new("Running", 30, 350, date(15)))
            .unwrap();
        registry
            .log_workout("testuser", Workout::new("Swimming", 40, 300, date(16)))
            .unwrap();

        let user = registry.remove_workout("testuser", 0).unwrap();

        assert_eq!(user.workouts.len(), 1);
        assert_eq!(user.workouts[0].workout_type, "Swimming");
    }

    #[test]
    fn test_legacy_credential_is_upgraded() {
        let dir = TempDir::new().unwrap();
        let config = SnapshotConfig::new(dir.path().join("data.json"));
        let store = SnapshotStore::<User>::new(&config).unwrap();
        let legacy = User::new("bob", "secret1", "Bob", 40, "M", 180.0, 85.0);
        store
            .save(&BTreeMap::from([("bob".to_string(), legacy)]))
            .unwrap();

        let registry = UserRegistry::open_from_config(&config).unwrap();
        let user = registry.authenticate_user("bob", "secret1").unwrap();

        assert!(looks_hashed(&user.credential));
        assert!(looks_hashed(&registry.get_user("bob").unwrap().credential));

        let reopened = UserRegistry::open_from_config(&config).unwrap();
        assert_eq!(
            reopened.get_user("bob").unwrap().credential,
            hash_credential("secret1")
        );
        assert!(reopened.authenticate_user("bob", "secret1").is_ok());
    }

    #[test]
    fn test_shared_between_threads() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let user = User::new(format!("user{i}"), "pw", "Name", 30, "F", 160.0, 55.0);
                    registry.add_user(user).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.usernames(), vec!["user0", "user1", "user2", "user3"]);
        assert_eq!(open(&dir).len(), 4);
    }
}
