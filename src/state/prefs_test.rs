use super::*;

use crate::storage::MemoryStore;

#[test]
fn load_defaults_when_storage_empty() {
    let prefs = Preferences::load(Arc::new(MemoryStore::new()));
    assert_eq!(prefs.language(), Language::En);
    assert_eq!(prefs.theme(), Theme::System);
}

#[test]
fn load_reads_stored_values() {
    let storage = Arc::new(MemoryStore::with_entries([(LANGUAGE_KEY, "ko"), (THEME_KEY, "dark")]));
    let prefs = Preferences::load(storage);
    assert_eq!(prefs.language(), Language::Ko);
    assert_eq!(prefs.theme(), Theme::Dark);
}

#[test]
fn load_falls_back_on_unknown_values() {
    let storage = Arc::new(MemoryStore::with_entries([(LANGUAGE_KEY, "klingon"), (THEME_KEY, "sepia")]));
    let prefs = Preferences::load(storage);
    assert_eq!(prefs.language(), Language::En);
    assert_eq!(prefs.theme(), Theme::System);
}

#[test]
fn setters_write_through_to_storage() {
    let storage = Arc::new(MemoryStore::new());
    let mut prefs = Preferences::load(storage.clone());

    prefs.set_language(Language::Ko).unwrap();
    prefs.set_theme(Theme::Light).unwrap();

    assert_eq!(storage.get(LANGUAGE_KEY).as_deref(), Some("ko"));
    assert_eq!(storage.get(THEME_KEY).as_deref(), Some("light"));

    let reloaded = Preferences::load(storage);
    assert_eq!(reloaded.language(), Language::Ko);
    assert_eq!(reloaded.theme(), Theme::Light);
}

#[test]
fn system_theme_follows_system_preference() {
    assert!(Theme::System.is_dark(true));
    assert!(!Theme::System.is_dark(false));
    assert!(Theme::Dark.is_dark(false));
    assert!(!Theme::Light.is_dark(true));
}

#[test]
fn toggle_dark_pins_opposite_of_effective_mode() {
    let storage = Arc::new(MemoryStore::new());
    let mut prefs = Preferences::load(storage.clone());

    assert_eq!(prefs.toggle_dark(true).unwrap(), Theme::Light);
    assert_eq!(prefs.toggle_dark(true).unwrap(), Theme::Dark);
    assert_eq!(storage.get(THEME_KEY).as_deref(), Some("dark"));
}

#[test]
fn theme_parse_round_trips() {
    for theme in [Theme::Light, Theme::Dark, Theme::System] {
        assert_eq!(Theme::parse(theme.as_str()), Some(theme));
    }
    assert_eq!(Theme::parse("auto"), None);
}
