use super::*;
use crate::storage::MemoryStore;

#[test]
fn read_preference_falls_back_to_system() {
    let store = MemoryStore::new();
    assert_eq!(read_preference(&store, false), Theme::Light);
    assert_eq!(read_preference(&store, true), Theme::Dark);
}

#[test]
fn stored_preference_wins_over_system() {
    let store = MemoryStore::new();
    store.set(THEME_KEY, "light").unwrap();
    assert_eq!(read_preference(&store, true), Theme::Light);
}

#[test]
fn unknown_stored_value_falls_back() {
    let store = MemoryStore::new();
    store.set(THEME_KEY, "solarized").unwrap();
    assert_eq!(read_preference(&store, true), Theme::Dark);
    assert_eq!(read_preference(&store, false), Theme::Light);
}

#[test]
fn toggle_persists_new_theme() {
    let store = MemoryStore::new();
    let next = toggle(&store, Theme::Light);
    assert_eq!(next, Theme::Dark);
    assert!(next.is_dark());
    assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));

    let back = toggle(&store, next);
    assert_eq!(back, Theme::Light);
    assert_eq!(read_preference(&store, true), Theme::Light);
}

#[test]
fn parse_rejects_unknown_names() {
    assert_eq!(" dark ".parse::<Theme>(), Ok(Theme::Dark));
    assert_eq!("Dark".parse::<Theme>(), Err(UnknownTheme("Dark".into())));
}
