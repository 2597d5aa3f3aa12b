//! Revision script format.
//!
//! ```text
//! -- revision: 1a2b3c4d5e6f
//! -- down_revision: none
//! -- message: create users table
//! -- created: 2024-05-01T12:00:00Z
//!
//! -- +upgrade
//! CREATE TABLE ...;
//!
//! -- +downgrade
//! DROP TABLE ...;
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use super::plan::{Direction, MigrationStep, join};
use super::{MigrationError, Revision, RevisionId, VERSION_TABLE};

const UPGRADE_MARKER: &str = "-- +upgrade";
const DOWNGRADE_MARKER: &str = "-- +downgrade";
const SLUG_MAX: usize = 40;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Upgrade,
    Downgrade,
}

/// Parse one revision script.
pub fn parse_revision(file: &str, contents: &str) -> Result<Revision, MigrationError> {
    let mut id = None;
    let mut parents = None;
    let mut message = String::new();
    let mut created_at = None;
    let mut upgrade = Vec::new();
    let mut downgrade = Vec::new();
    let mut section = Section::Header;
    let mut saw_upgrade = false;

    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed == UPGRADE_MARKER {
            if saw_upgrade || section == Section::Downgrade {
                return Err(MigrationError::script(
                    file,
                    "'-- +upgrade' must appear once, before '-- +downgrade'",
                ));
            }
            saw_upgrade = true;
            section = Section::Upgrade;
            continue;
        }
        if trimmed == DOWNGRADE_MARKER {
            if section == Section::Downgrade {
                return Err(MigrationError::script(
                    file,
                    "'-- +downgrade' must appear once",
                ));
            }
            section = Section::Downgrade;
            continue;
        }
        match section {
            Section::Header => {
                let Some((key, value)) = header_pair(trimmed) else {
                    continue;
                };
                match key {
                    "revision" => {
                        id = Some(RevisionId::new(value).map_err(|err| {
                            MigrationError::script(file, format!("invalid 'revision' header: {err}"))
                        })?);
                    }
                    "down_revision" => parents = Some(parse_parents(file, value)?),
                    "message" => value.clone_into(&mut message),
                    "created" => {
                        let parsed = DateTime::parse_from_rfc3339(value).map_err(|err| {
                            MigrationError::script(file, format!("invalid 'created' header: {err}"))
                        })?;
                        created_at = Some(parsed.with_timezone(&Utc));
                    }
                    _ => {}
                }
            }
            Section::Upgrade => upgrade.push(line),
            Section::Downgrade => downgrade.push(line),
        }
    }

    let id = id.ok_or_else(|| MigrationError::script(file, "missing 'revision' header"))?;
    let parents =
        parents.ok_or_else(|| MigrationError::script(file, "missing 'down_revision' header"))?;
    if !saw_upgrade {
        return Err(MigrationError::script(file, "missing '-- +upgrade' section"));
    }

    Ok(Revision {
        id,
        parents,
        message,
        created_at,
        upgrade: upgrade.join("\n").trim().to_owned(),
        downgrade: downgrade.join("\n").trim().to_owned(),
    })
}

fn header_pair(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_prefix("--")?.trim();
    let (key, value) = body.split_once(':')?;
    Some((key.trim(), value.trim()))
}

fn parse_parents(file: &str, value: &str) -> Result<Vec<RevisionId>, MigrationError> {
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|raw| {
            RevisionId::new(raw.trim()).map_err(|err| {
                MigrationError::script(file, format!("invalid 'down_revision' header: {err}"))
            })
        })
        .collect()
}

/// Collapse every whitespace run, line breaks included, into one space.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render a revision in script format.
pub fn render_revision(revision: &Revision) -> String {
    let parents = if revision.parents.is_empty() {
        "none".to_owned()
    } else {
        join(&revision.parents)
    };
    let mut out = format!(
        "-- revision: {}\n-- down_revision: {parents}\n-- message: {}\n",
        revision.id,
        single_line(&revision.message)
    );
    if let Some(created) = revision.created_at {
        out.push_str(&format!(
            "-- created: {}\n",
            created.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
    }
    out.push_str(&format!("\n{UPGRADE_MARKER}\n"));
    push_body(&mut out, &revision.upgrade);
    out.push_str(&format!("\n{DOWNGRADE_MARKER}\n"));
    push_body(&mut out, &revision.downgrade);
    out
}

fn push_body(out: &mut String, body: &str) {
    if !body.is_empty() {
        out.push_str(body);
        out.push('\n');
    }
}

/// Fresh identifier: the first twelve hex digits of a random UUID.
pub fn generate_revision_id() -> RevisionId {
    let simple = Uuid::new_v4().simple().to_string();
    RevisionId::from_trusted(simple[..12].to_owned())
}

/// `<id>_<slug>.sql`, the slug derived from the message.
pub fn file_name(id: &RevisionId, message: &str) -> String {
    let slug: String = message
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(SLUG_MAX)
        .collect();
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        format!("{id}.sql")
    } else {
        format!("{id}_{slug}.sql")
    }
}

/// Render planned steps as a standalone SQL script for offline review.
pub fn render_offline(steps: &[MigrationStep]) -> String {
    let mut out = format!(
        "BEGIN;\n\nCREATE TABLE IF NOT EXISTS {VERSION_TABLE} (\n    version_num VARCHAR(32) NOT NULL,\n    CONSTRAINT {VERSION_TABLE}_pkc PRIMARY KEY (version_num)\n);\n"
    );
    for step in steps {
        let arrow = match step.direction {
            Direction::Upgrade => format!(
                "{} -> {}",
                parents_or_base(&step.parents),
                step.revision
            ),
            Direction::Downgrade => format!(
                "{} -> {}",
                step.revision,
                parents_or_base(&step.parents)
            ),
        };
        out.push_str(&format!(
            "\n-- Running {} {arrow}, {}\n\n",
            step.direction, step.message
        ));
        push_body(&mut out, &step.sql);
        out.push_str(&format!("\nDELETE FROM {VERSION_TABLE};\n"));
        for head in &step.heads_after {
            out.push_str(&format!(
                "INSERT INTO {VERSION_TABLE} (version_num) VALUES ('{head}');\n"
            ));
        }
    }
    out.push_str("\nCOMMIT;\n");
    out
}

fn parents_or_base(parents: &[RevisionId]) -> String {
    if parents.is_empty() {
        "base".to_owned()
    } else {
        join(parents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    const SCRIPT: &str = "\
-- revision: b2c3d4e5f6a7
-- down_revision: a1b2c3d4e5f6
-- message: create items table
-- created: 2024-05-01T12:00:00Z

-- +upgrade
CREATE TABLE items (id UUID PRIMARY KEY);

-- +downgrade
DROP TABLE items;
";

    #[rstest]
    fn parses_headers_and_sections() {
        let revision = parse_revision("b2c3.sql", SCRIPT).expect("script parses");
        assert_eq!(revision.id.as_str(), "b2c3d4e5f6a7");
        assert_eq!(revision.parents.len(), 1);
        assert_eq!(revision.message, "create items table");
        assert_eq!(
            revision.created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single()
        );
        assert_eq!(revision.upgrade, "CREATE TABLE items (id UUID PRIMARY KEY);");
        assert_eq!(revision.downgrade, "DROP TABLE items;");
    }

    #[rstest]
    fn render_then_parse_preserves_revision() {
        let original = parse_revision("b2c3.sql", SCRIPT).expect("script parses");
        let rendered = render_revision(&original);
        assert_eq!(parse_revision("again.sql", &rendered), Ok(original));
    }

    #[rstest]
    fn multi_line_message_stays_in_its_header() {
        let mut original = parse_revision("b2c3.sql", SCRIPT).expect("script parses");
        original.message = "add sku\n-- +upgrade\r\nDROP TABLE items;".into();

        let reparsed = parse_revision("again.sql", &render_revision(&original)).expect("parses");

        assert_eq!(reparsed.message, "add sku -- +upgrade DROP TABLE items;");
        assert_eq!(reparsed.upgrade, "CREATE TABLE items (id UUID PRIMARY KEY);");
        assert_eq!(reparsed.downgrade, "DROP TABLE items;");
    }

    #[rstest]
    #[case("-- down_revision: none\n-- +upgrade\n", "missing 'revision' header")]
    #[case("-- revision: abc\n-- +upgrade\n", "missing 'down_revision' header")]
    #[case("-- revision: abc\n-- down_revision: none\n", "missing '-- +upgrade' section")]
    #[case("-- revision: a-b\n-- down_revision: none\n-- +upgrade\n", "invalid 'revision' header")]
    #[case(
        "-- revision: abc\n-- down_revision: none\n-- created: yesterday\n-- +upgrade\n",
        "invalid 'created' header"
    )]
    fn reports_file_and_header(#[case] contents: &str, #[case] expected: &str) {
        let err = parse_revision("broken.sql", contents).expect_err("script is invalid");
        let text = err.to_string();
        assert!(text.starts_with("broken.sql: "), "{text}");
        assert!(text.contains(expected), "{text}");
    }

    #[rstest]
    fn merge_parents_are_comma_separated() {
        let contents = "-- revision: m1\n-- down_revision: a1, b1\n-- +upgrade\n";
        let revision = parse_revision("m1.sql", contents).expect("script parses");
        assert_eq!(join(&revision.parents), "a1, b1");
        assert!(revision.is_merge());
    }

    #[rstest]
    fn generated_ids_are_twelve_hex_digits() {
        let id = generate_revision_id();
        assert_eq!(id.as_str().len(), 12);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[rstest]
    #[case("Create items table", "abc_create_items_table.sql")]
    #[case("  !!  ", "abc.sql")]
    #[case(
        "a very long message that keeps going well past the slug limit",
        "abc_a_very_long_message_that_keeps_going_wel.sql"
    )]
    fn file_names_use_slugs(#[case] message: &str, #[case] expected: &str) {
        let id = RevisionId::new("abc").expect("valid id");
        assert_eq!(file_name(&id, message), expected);
    }

    #[rstest]
    fn offline_script_updates_version_rows() {
        let step = MigrationStep {
            revision: RevisionId::new("b2").expect("valid id"),
            parents: vec![RevisionId::new("a1").expect("valid id")],
            message: "add column".into(),
            direction: Direction::Upgrade,
            sql: "ALTER TABLE t ADD COLUMN c INT;".into(),
            heads_after: vec![RevisionId::new("b2").expect("valid id")],
        };
        let script = render_offline(&[step]);
        assert!(script.starts_with("BEGIN;"));
        assert!(script.contains("-- Running upgrade a1 -> b2, add column"));
        assert!(script.contains("ALTER TABLE t ADD COLUMN c INT;"));
        assert!(script.contains("INSERT INTO schema_revisions (version_num) VALUES ('b2');"));
        assert!(script.trim_end().ends_with("COMMIT;"));
    }
}
