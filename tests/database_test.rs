//! Saved type databases round-trip through disk without losing the model.

use monodump::model::FieldSlot;
use monodump::output::{list_databases, TypeDatabase};
use monodump::runtime::records::{ClassKind, ValueKind};
use monodump::TypeNode;

fn arena() -> Vec<TypeNode> {
    vec![
        TypeNode {
            address: 0x2_3000_0000,
            name: "Entity".to_string(),
            namespace: "Game".to_string(),
            full_name: "Game.Entity".to_string(),
            kind: ClassKind::Class,
            parent: None,
            interfaces: Vec::new(),
            fields: vec![FieldSlot {
                name: "health".to_string(),
                type_name: "Int32".to_string(),
                offset: 0x10,
                value_kind: None,
            }],
        },
        TypeNode {
            address: 0x2_3001_0000,
            name: "Player".to_string(),
            namespace: "Game".to_string(),
            full_name: "Game.Player".to_string(),
            kind: ClassKind::Class,
            parent: Some(0),
            interfaces: vec![0],
            fields: vec![FieldSlot {
                name: "instance".to_string(),
                type_name: "Player".to_string(),
                offset: 0x0,
                value_kind: Some(ValueKind::Static),
            }],
        },
    ]
}

#[test]
fn round_trip_preserves_the_full_model() {
    let dir = tempfile::tempdir().unwrap();
    let saved = TypeDatabase::new("game.exe", "Assembly-CSharp", arena());
    let path = saved.save(dir.path()).unwrap();

    let loaded = TypeDatabase::load(&path).unwrap();
    assert_eq!(loaded.process, "game.exe");
    assert_eq!(loaded.assembly, "Assembly-CSharp");
    assert_eq!(loaded.version, saved.version);
    pretty_assertions::assert_eq!(loaded.types, saved.types);
}

#[test]
fn links_and_value_kinds_survive_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = TypeDatabase::new("game.exe", "Core", arena())
        .save(dir.path())
        .unwrap();

    let player = &TypeDatabase::load(&path).unwrap().types[1];
    assert_eq!(player.parent, Some(0));
    assert_eq!(player.interfaces, vec![0]);
    assert_eq!(player.fields[0].value_kind, Some(ValueKind::Static));
}

#[test]
fn saving_twice_overwrites_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let first = TypeDatabase::new("game.exe", "Core", arena());
    let second = TypeDatabase::new("game.exe", "Core", Vec::new());

    first.save(dir.path()).unwrap();
    let path = second.save(dir.path()).unwrap();

    let found = list_databases(dir.path()).unwrap();
    assert_eq!(found, vec![path.clone()]);
    assert!(TypeDatabase::load(&path).unwrap().types.is_empty());
}
