use std::fs;
use std::path::{Path, PathBuf};

use lookml_core::{DefinitionsConfig, FieldKind, LookmlError, UpdaterConfig};
use lookml_parser::parse_file;
use lookml_update::LookmlModifier;

const VIEW: &str = "view: orders {\n  sql_table_name: analytics.orders ;;\n\n  dimension: city {\n    type: string\n    sql: ${TABLE}.city ;;\n  }\n\n  dimension: count_name {\n    type: string\n    sql: ${TABLE}.count_name ;;\n  }\n\n  measure: total_revenue {\n    type: sum\n    description: \"stale\nsecond line\"\n    sql: ${TABLE}.revenue ;;\n  }\n}\n";

fn write_definitions(dir: &Path, rows: &[(&str, &str, &str, &str)]) -> PathBuf {
    let mut body = String::from("file,type,name,definition\n");
    for (file, kind, name, definition) in rows {
        let quoted = format!("\"{}\"", definition.replace('"', "\"\""));
        body.push_str(&format!("{},{},{},{}\n", file, kind, name, quoted));
    }
    let path = dir.join("definitions.csv");
    fs::write(&path, body).unwrap();
    path
}

fn updater_config(definitions: PathBuf, use_basename: bool) -> UpdaterConfig {
    UpdaterConfig {
        definitions: DefinitionsConfig {
            kind: "csv".to_string(),
            filename: definitions,
        },
        use_basename,
    }
}

#[test]
fn injects_missing_description() {
    let dir = tempfile::tempdir().unwrap();
    let infile = dir.path().join("orders.view.lkml");
    fs::write(&infile, VIEW).unwrap();
    let defs = write_definitions(
        dir.path(),
        &[(infile.to_str().unwrap(), "dimension", "city", "City of the order")],
    );

    let modifier = LookmlModifier::new(updater_config(defs, false)).unwrap();
    let outfile = dir.path().join("out.view.lkml");
    modifier.modify(&infile, &outfile).unwrap();

    let parsed = parse_file(&outfile).unwrap();
    let view = parsed.single_view().unwrap();
    assert_eq!(
        view.field(FieldKind::Dimension, "city").unwrap().description(),
        Some("City of the order")
    );
}

#[test]
fn replaces_multiline_description_without_touching_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let infile = dir.path().join("orders.view.lkml");
    fs::write(&infile, VIEW).unwrap();
    let defs = write_definitions(
        dir.path(),
        &[(
            infile.to_str().unwrap(),
            "measure",
            "total_revenue",
            "Total revenue in USD",
        )],
    );

    let modifier = LookmlModifier::new(updater_config(defs, false)).unwrap();
    let outfile = dir.path().join("out.view.lkml");
    modifier.modify(&infile, &outfile).unwrap();

    let output = fs::read_to_string(&outfile).unwrap();
    let parsed = parse_file(&outfile).unwrap();
    let view = parsed.single_view().unwrap();
    assert_eq!(
        view.field(FieldKind::Measure, "total_revenue")
            .unwrap()
            .description(),
        Some("Total revenue in USD")
    );

    // line-by-line diff outside the replaced block is empty
    let before: Vec<&str> = VIEW.lines().collect();
    let after: Vec<&str> = output.lines().collect();
    assert_eq!(after.len(), before.len() - 1);
    let changed: Vec<&&str> = after.iter().filter(|l| !before.contains(l)).collect();
    assert_eq!(changed, vec![&"    description: \"Total revenue in USD\""]);
}

#[test]
fn matching_description_is_a_no_op_copy_through() {
    let dir = tempfile::tempdir().unwrap();
    let infile = dir.path().join("orders.view.lkml");
    fs::write(&infile, VIEW).unwrap();
    let defs = write_definitions(
        dir.path(),
        &[(
            infile.to_str().unwrap(),
            "measure",
            "total_revenue",
            "stale\nsecond line",
        )],
    );

    let modifier = LookmlModifier::new(updater_config(defs, false)).unwrap();
    let outfile = dir.path().join("out.view.lkml");
    modifier.modify(&infile, &outfile).unwrap();

    assert_eq!(fs::read_to_string(&outfile).unwrap(), VIEW);
}

#[test]
fn no_matching_definitions_still_writes_output() {
    let dir = tempfile::tempdir().unwrap();
    let infile = dir.path().join("orders.view.lkml");
    fs::write(&infile, VIEW).unwrap();
    let defs = write_definitions(
        dir.path(),
        &[("other.view.lkml", "dimension", "city", "City")],
    );

    let modifier = LookmlModifier::new(updater_config(defs, false)).unwrap();
    let outfile = dir.path().join("out.view.lkml");
    modifier.modify(&infile, &outfile).unwrap();

    assert_eq!(fs::read_to_string(&outfile).unwrap(), VIEW);
}

#[test]
fn modify_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let infile = dir.path().join("orders.view.lkml");
    fs::write(&infile, VIEW).unwrap();
    let defs = write_definitions(
        dir.path(),
        &[
            (infile.to_str().unwrap(), "dimension", "city", "City of the order"),
            (
                infile.to_str().unwrap(),
                "measure",
                "total_revenue",
                "Now\nspanning\nthree lines",
            ),
        ],
    );

    let modifier = LookmlModifier::new(updater_config(defs.clone(), false)).unwrap();
    let first = dir.path().join("first.view.lkml");
    modifier.modify(&infile, &first).unwrap();

    // feed the first output back in with definitions matched on basename,
    // since the intermediate file has a different path
    let defs2 = write_definitions(
        dir.path(),
        &[
            ("first.view.lkml", "dimension", "city", "City of the order"),
            (
                "first.view.lkml",
                "measure",
                "total_revenue",
                "Now\nspanning\nthree lines",
            ),
        ],
    );
    let modifier2 = LookmlModifier::new(updater_config(defs2, true)).unwrap();
    let second = dir.path().join("second.view.lkml");
    modifier2.modify(&first, &second).unwrap();

    assert_eq!(
        fs::read_to_string(&first).unwrap(),
        fs::read_to_string(&second).unwrap()
    );
}

#[test]
fn basename_matching_covers_both_directories() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a")).unwrap();
    fs::create_dir_all(dir.path().join("b")).unwrap();
    let in_a = dir.path().join("a/orders.view.lkml");
    let in_b = dir.path().join("b/orders.view.lkml");
    fs::write(&in_a, VIEW).unwrap();
    fs::write(&in_b, VIEW).unwrap();
    let defs = write_definitions(
        dir.path(),
        &[("orders.view.lkml", "dimension", "city", "City of the order")],
    );

    // enabled: both files receive the definition
    let modifier = LookmlModifier::new(updater_config(defs.clone(), true)).unwrap();
    for (infile, outfile) in [(&in_a, dir.path().join("out_a.lkml")), (&in_b, dir.path().join("out_b.lkml"))] {
        modifier.modify(infile, &outfile).unwrap();
        let parsed = parse_file(&outfile).unwrap();
        let view = parsed.single_view().unwrap();
        assert_eq!(
            view.field(FieldKind::Dimension, "city").unwrap().description(),
            Some("City of the order")
        );
    }

    // disabled: the full path does not match, so neither receives it
    let modifier = LookmlModifier::new(updater_config(defs, false)).unwrap();
    let out = dir.path().join("out_c.lkml");
    modifier.modify(&in_a, &out).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), VIEW);
}

#[test]
fn two_views_is_format_error_and_no_output_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let infile = dir.path().join("two.view.lkml");
    fs::write(&infile, "view: a {}\nview: b {}\n").unwrap();
    let defs = write_definitions(dir.path(), &[]);

    let modifier = LookmlModifier::new(updater_config(defs, false)).unwrap();
    let outfile = dir.path().join("out.view.lkml");
    let err = modifier.modify(&infile, &outfile).unwrap_err();
    assert!(matches!(err, LookmlError::Format(_)));
    assert!(!outfile.exists());
}

#[test]
fn absent_field_is_lookup_error_not_silent_skip() {
    let dir = tempfile::tempdir().unwrap();
    let infile = dir.path().join("orders.view.lkml");
    fs::write(&infile, VIEW).unwrap();
    let defs = write_definitions(
        dir.path(),
        &[(infile.to_str().unwrap(), "measure", "revenue_amount", "x")],
    );

    let modifier = LookmlModifier::new(updater_config(defs, false)).unwrap();
    let outfile = dir.path().join("out.view.lkml");
    let err = modifier.modify(&infile, &outfile).unwrap_err();
    assert!(matches!(
        err,
        LookmlError::Lookup {
            kind: FieldKind::Measure,
            ..
        }
    ));
    assert!(!outfile.exists());
}

#[test]
fn one_line_field_blocks_are_patched_inside_the_braces() {
    let dir = tempfile::tempdir().unwrap();
    let infile = dir.path().join("compact.view.lkml");
    fs::write(
        &infile,
        "view: compact {\n  dimension: city { type: string }\n  measure: total { description: \"old\" }\n}\n",
    )
    .unwrap();
    let defs = write_definitions(
        dir.path(),
        &[
            ("compact.view.lkml", "dimension", "city", "City name"),
            ("compact.view.lkml", "measure", "total", "Total count"),
        ],
    );

    fs::create_dir_all(dir.path().join("first")).unwrap();
    fs::create_dir_all(dir.path().join("second")).unwrap();
    let modifier = LookmlModifier::new(updater_config(defs, true)).unwrap();
    let first = dir.path().join("first/compact.view.lkml");
    modifier.modify(&infile, &first).unwrap();

    let parsed = parse_file(&first).unwrap();
    let view = parsed.single_view().unwrap();
    assert_eq!(
        view.field(FieldKind::Dimension, "city").unwrap().description(),
        Some("City name")
    );
    assert_eq!(
        view.field(FieldKind::Measure, "total").unwrap().description(),
        Some("Total count")
    );

    // a second pass sees up-to-date descriptions and copies through
    let second = dir.path().join("second/compact.view.lkml");
    modifier.modify(&first, &second).unwrap();
    assert_eq!(
        fs::read_to_string(&first).unwrap(),
        fs::read_to_string(&second).unwrap()
    );
}

#[test]
fn unknown_provider_fails_at_construction() {
    let config = UpdaterConfig {
        definitions: DefinitionsConfig {
            kind: "spreadsheet".to_string(),
            filename: PathBuf::from("defs.csv"),
        },
        use_basename: false,
    };
    assert!(matches!(
        LookmlModifier::new(config).err(),
        Some(LookmlError::Configuration(_))
    ));
}
