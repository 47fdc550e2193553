use chrono::NaiveDate;
use jotter_core::{Category, NewUser, Priority, Store, StructuredTask};
use tempfile::TempDir;

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: email.to_string(),
        username: username.to_string(),
        password: "correct horse".to_string(),
    }
}

fn open(dir: &TempDir) -> Store {
    Store::open(dir.path().join("store.json")).unwrap()
}

fn groceries() -> StructuredTask {
    StructuredTask {
        description: "Buy groceries".to_string(),
        category: Category::Shopping,
        priority: Priority::Low,
        due_date: NaiveDate::from_ymd_opt(2025, 6, 14),
    }
}

#[test]
fn test_missing_file_is_empty_store() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    assert!(store.find_user_by_username("ada").is_none());
    assert!(store.todos_for(1).is_empty());
}

#[test]
fn test_register_and_authenticate() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    let user = store.register_user(new_user("ada", "ada@example.com")).unwrap();
    assert_eq!(user.id, 1);
    assert_ne!(user.password_hash, "correct horse");

    let authed = store.authenticate("ada", "correct horse").unwrap();
    assert_eq!(authed.id, user.id);

    let bad_pw = store.authenticate("ada", "wrong").unwrap_err();
    let no_user = store.authenticate("bob", "correct horse").unwrap_err();
    assert_eq!(bad_pw.to_string(), no_user.to_string());
}

#[test]
fn test_duplicate_username_or_email_rejected() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    store.register_user(new_user("ada", "ada@example.com")).unwrap();

    let err = store.register_user(new_user("ada", "other@example.com")).unwrap_err();
    assert!(err.to_string().contains("already exists"));

    let err = store.register_user(new_user("ada2", "ADA@example.com")).unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[test]
fn test_todos_persist_across_reopen() {
    let dir = TempDir::new().unwrap();
    let (user_id, todo_id) = {
        let mut store = open(&dir);
        let user = store.register_user(new_user("ada", "ada@example.com")).unwrap();
        let todo = store.add_todo(user.id, groceries()).unwrap();
        (user.id, todo.id)
    };

    let store = open(&dir);
    let todos = store.todos_for(user_id);
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, todo_id);
    assert_eq!(todos[0].task, "Buy groceries");
    assert_eq!(todos[0].category, Category::Shopping);
    assert_eq!(todos[0].due_date, NaiveDate::from_ymd_opt(2025, 6, 14));
    assert!(!todos[0].done);
}

#[test]
fn test_done_undone_edit_delete() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    let user = store.register_user(new_user("ada", "ada@example.com")).unwrap();
    let todo = store.add_todo(user.id, groceries()).unwrap();

    assert!(store.set_done(user.id, todo.id, true).unwrap().done);
    assert!(!store.set_done(user.id, todo.id, false).unwrap().done);

    store.set_done(user.id, todo.id, true).unwrap();
    let edited = store
        .update_todo(user.id, todo.id, StructuredTask::raw("Buy oat milk"))
        .unwrap();
    assert_eq!(edited.task, "Buy oat milk");
    assert_eq!(edited.category, Category::Personal);
    assert_eq!(edited.due_date, None);
    // Editing keeps status.
    assert!(edited.done);

    store.delete_todo(user.id, todo.id).unwrap();
    assert!(store.todos_for(user.id).is_empty());
    assert!(store.delete_todo(user.id, todo.id).is_err());
}

#[test]
fn test_todos_are_scoped_to_owner() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    let ada = store.register_user(new_user("ada", "ada@example.com")).unwrap();
    let bob = store.register_user(new_user("bob", "bob@example.com")).unwrap();

    let a1 = store.add_todo(ada.id, groceries()).unwrap();
    let b1 = store.add_todo(bob.id, StructuredTask::raw("Walk dog")).unwrap();
    let a2 = store.add_todo(ada.id, StructuredTask::raw("Read")).unwrap();

    let ids: Vec<u64> = store.todos_for(ada.id).iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![a1.id, a2.id]);

    assert!(store.set_done(bob.id, a1.id, true).is_err());
    assert!(store.update_todo(bob.id, a1.id, StructuredTask::raw("x")).is_err());
    assert!(store.delete_todo(ada.id, b1.id).is_err());
    assert!(store.todo(ada.id, b1.id).is_none());
    assert_eq!(store.todos_for(bob.id).len(), 1);
}

#[test]
fn test_add_todo_for_unknown_user_fails() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    assert!(store.add_todo(99, groceries()).is_err());
}

#[test]
fn test_failed_save_leaves_store_unchanged() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let mut store = Store::open(data_dir.join("store.json")).unwrap();
    let user = store.register_user(new_user("ada", "ada@example.com")).unwrap();
    let todo = store.add_todo(user.id, groceries()).unwrap();

    // Replace the data directory with a plain file so every save fails.
    std::fs::remove_dir_all(&data_dir).unwrap();
    std::fs::write(&data_dir, "not a directory").unwrap();

    assert!(store.add_todo(user.id, StructuredTask::raw("Walk dog")).is_err());
    assert!(store.set_done(user.id, todo.id, true).is_err());
    assert!(store.delete_todo(user.id, todo.id).is_err());
    assert!(store.register_user(new_user("bob", "bob@example.com")).is_err());

    let todos = store.todos_for(user.id);
    assert_eq!(todos.len(), 1);
    assert!(!todos[0].done);
    assert!(store.find_user_by_username("bob").is_none());

    // Once saving works again the id counter has not moved.
    std::fs::remove_file(&data_dir).unwrap();
    let next = store.add_todo(user.id, StructuredTask::raw("Walk dog")).unwrap();
    assert_eq!(next.id, todo.id + 1);
}
