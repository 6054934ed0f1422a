//! End-to-end conversion through the public API.

use bingo_goals::logs::{LogLevel, LOG_BROADCASTER};
use bingo_goals::{
    canonical_categories, convert_csv_file, convert_json_file, csv_to_document, document_to_csv,
    parse_document_str, render_document, ConvertError, Schema, ShapeError,
};
use serde_json::{json, Value};
use tempfile::TempDir;

const LEGACY_SHEET: &str = "\
name,jp,difficulty,child,fire,ice,songs
Dodongo,ドドンゴ,3,true,1.0,*0.5,
Bomb Bag,ボム袋,1,false,,,
,,,,,,
Song of Storms,嵐の歌,12,true,,,2
Broken,壊れた,2,true,x,,
";

#[test]
fn legacy_sheet_to_goal_list() {
    let result = csv_to_document(&Schema::legacy(), LEGACY_SHEET).unwrap();
    let value: Value = serde_json::from_str(&render_document(&result.document).unwrap()).unwrap();

    assert_eq!(value["info"], json!({"version": "v9"}));
    assert_eq!(value["3"][0]["subtypes"], json!({"ice": 0.5}));
    assert_eq!(value["12"][0]["types"], json!({"songs": 2.0}));
    assert_eq!(value["1"][0]["types"], json!({}));
    assert!(value.get("2").is_none());

    assert_eq!(result.stats.converted, 3);
    assert_eq!(result.stats.blank, 1);
    assert_eq!(result.stats.skipped.len(), 1);
    assert_eq!(result.stats.skipped[0].line, 6);
}

#[test]
fn skipped_rows_are_logged() {
    let mut rx = LOG_BROADCASTER.subscribe();
    csv_to_document(&Schema::legacy(), LEGACY_SHEET).unwrap();

    let mut warned_lines = Vec::new();
    while let Ok(entry) = rx.try_recv() {
        if entry.level == LogLevel::Warning {
            warned_lines.extend(entry.line);
        }
    }
    assert!(warned_lines.contains(&6));
}

#[test]
fn goal_list_back_to_sheet() {
    let schema = Schema::legacy();
    let json = r#"{
        "info": {"version": "v9"},
        "10": [{"name": "Ten", "jp": "十", "child": "false", "types": {"fire": 1.5}}],
        "2": [{"name": "Two", "jp": "二", "child": "true", "types": {}, "subtypes": {"ice": 1.0}}]
    }"#;

    let document = parse_document_str(&schema, json).unwrap();
    let order = canonical_categories();
    let csv = document_to_csv(&schema, &document, &order).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert!(lines[0].starts_with("name,jp,difficulty,child,childzl,saria"));
    assert!(lines[1].starts_with("Two,二,2,true,"));
    assert!(lines[2].starts_with("Ten,十,10,false,"));
    assert!(lines[1].contains("*1.0"));
    assert!(lines[2].contains(",1.5,"));
    assert_eq!(lines.len(), 3);
}

#[test]
fn current_sheet_with_derived_ids() {
    let sheet = "\
name,jp,difficulty,time,skill,child,bottle,hookshot,notes,fire
Light Arrows,光の矢,20,12.5,dungeons,no,yes,yes,long,1
Deku Stick,,1,0.5,,yes,no,no,,
";
    let schema = Schema::current();
    let result = csv_to_document(&schema, sheet).unwrap();
    let value = result.document.to_value().unwrap();

    assert_eq!(value["items"][0]["id"], "light-arrows");
    assert_eq!(value["items"][1]["id"], "deku-stick");
    assert_eq!(value["items"][0]["payload"]["jp"], "光の矢");
    assert_eq!(value["items"][0]["time"], 12.5);
    assert!(value["items"][0].get("notes").is_none());
}

#[test]
fn wrong_layout_is_rejected() {
    let err = parse_document_str(&Schema::current(), r#"{"info": {"version": "v9"}}"#).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Shape(ShapeError::MissingKey(ref key)) if key == "cardType"
    ));
}

#[test]
fn files_round_trip() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("goals.csv");
    let json_path = dir.path().join("goal-list.json");
    let back_path = dir.path().join("goals-back.csv");
    std::fs::write(&csv_path, LEGACY_SHEET).unwrap();

    let schema = Schema::legacy();
    let stats = convert_csv_file(&schema, &csv_path, &json_path, true).unwrap();
    assert_eq!(stats.converted, 3);

    let order: Vec<String> = ["fire", "ice", "songs"].iter().map(|s| s.to_string()).collect();
    let written = convert_json_file(&schema, &json_path, &back_path, &order).unwrap();
    assert_eq!(written, 3);

    let back = std::fs::read_to_string(&back_path).unwrap();
    assert_eq!(
        back,
        "name,jp,difficulty,child,fire,ice,songs\n\
         Bomb Bag,ボム袋,1,false,,,\n\
         Dodongo,ドドンゴ,3,true,1.0,*0.5,\n\
         Song of Storms,嵐の歌,12,true,,,2.0\n"
    );
}

#[test]
fn aborted_conversion_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("goals.csv");
    let json_path = dir.path().join("goal-list.json");
    std::fs::write(
        &csv_path,
        "name,jp,difficulty,time,skill,child,bottle,hookshot,notes\nA,,1,fast,,no,no,no,\n",
    )
    .unwrap();

    let err = convert_csv_file(&Schema::current(), &csv_path, &json_path, true).unwrap_err();
    assert!(matches!(err, ConvertError::Row { line: 2, .. }));
    assert!(!json_path.exists());
}
