//! Tests du parcours de la bibliothèque musicale.

use podplaylist::MusicLibrary;
use tempfile::TempDir;

fn music_root() -> (TempDir, MusicLibrary) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    std::fs::create_dir(root.join("Albums")).unwrap();
    std::fs::write(root.join("intro.mp3"), b"").unwrap();
    std::fs::write(root.join("notes.txt"), b"").unwrap();
    std::fs::write(root.join("Albums/track1.flac"), b"").unwrap();
    std::fs::write(root.join("Albums/cover.jpg"), b"").unwrap();

    let library = MusicLibrary::new(root, vec!["mp3".into(), "flac".into()]);
    (dir, library)
}

#[test]
fn lists_immediate_children_dirs_first() {
    let (_dir, library) = music_root();

    let entries = library.browse("").unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();

    assert_eq!(names, vec!["Albums", "intro.mp3", "notes.txt"]);
    assert!(entries[0].is_dir);
}

#[test]
fn flags_audio_files_only() {
    let (_dir, library) = music_root();

    let entries = library.browse("").unwrap();
    let intro = entries.iter().find(|e| e.name == "intro.mp3").unwrap();
    let notes = entries.iter().find(|e| e.name == "notes.txt").unwrap();

    assert!(intro.is_music);
    assert!(!notes.is_music);
}

#[test]
fn subdirectory_ids_are_root_relative() {
    let (_dir, library) = music_root();

    let entries = library.browse("Albums").unwrap();
    let track = entries.iter().find(|e| e.name == "track1.flac").unwrap();

    assert_eq!(track.id, "Albums/track1.flac");
    assert!(track.is_music);

    let cover = entries.iter().find(|e| e.name == "cover.jpg").unwrap();
    assert!(!cover.is_music);
}

#[test]
fn escaping_the_root_yields_empty_listing() {
    let (_dir, library) = music_root();

    assert!(library.browse("..").unwrap().is_empty());
    assert!(library.browse("../..").unwrap().is_empty());
    assert!(library.browse("Albums/../..").unwrap().is_empty());
}

#[test]
fn absolute_looking_paths_stay_contained() {
    let (_dir, library) = music_root();

    // le slash de tête est neutralisé, le chemin reste relatif à la racine
    let entries = library.browse("/Albums/").unwrap();
    assert_eq!(entries.len(), 2);
}

#[test]
fn missing_directory_yields_empty_listing() {
    let (_dir, library) = music_root();

    assert!(library.browse("does-not-exist").unwrap().is_empty());
}

#[test]
fn file_path_yields_empty_listing() {
    let (_dir, library) = music_root();

    assert!(library.browse("intro.mp3").unwrap().is_empty());
}
