//! Namespace snapshot files.
//!
//! A snapshot lists the namespace objects in child-list order, parents
//! before their children:
//!
//! ```toml
//! [[node]]
//! path = "_SB_.PCI0"
//! kind = "device"
//!
//! [[node]]
//! path = "_SB_.PCI0._HID"
//! value = { eisa_id = "PNP0A03" }
//! ```
//!
//! `kind` defaults to the type of `value`, or `Any` for objects without
//! one. `fail_kind`, `fail_eval` and `fail_children` make the matching
//! request fail, which is useful for reproducing misbehaving firmware.

use std::path::Path;

use acpi_namespace::channel::MemoryNamespace;
use acpi_namespace::{EisaId, NamespaceValue, ObjectType};
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

/// Top-level snapshot document.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Objects in listing order.
    #[serde(default, rename = "node")]
    pub nodes: Vec<NodeEntry>,
}

/// One `[[node]]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeEntry {
    /// Dotted path of the object.
    pub path: String,
    /// Object type name, such as `device` or `thermal_zone`.
    pub kind: Option<String>,
    /// Value returned when the object is evaluated.
    pub value: Option<ValueEntry>,
    #[serde(default)]
    pub fail_kind: bool,
    #[serde(default)]
    pub fail_eval: bool,
    #[serde(default)]
    pub fail_children: bool,
}

/// A value as written in a snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueEntry {
    Integer(u64),
    String(String),
    Buffer(Vec<u8>),
    Package(Vec<ValueEntry>),
    /// A textual EISA ID stored as its compressed integer.
    EisaId(String),
}

impl ValueEntry {
    fn to_value(&self) -> Result<NamespaceValue> {
        Ok(match self {
            Self::Integer(v) => NamespaceValue::Integer(*v),
            Self::String(s) => NamespaceValue::Str(s.as_bytes().to_vec()),
            Self::Buffer(b) => NamespaceValue::Buffer(b.clone()),
            Self::Package(elements) => NamespaceValue::Package(
                elements
                    .iter()
                    .map(Self::to_value)
                    .collect::<Result<_>>()?,
            ),
            Self::EisaId(id) => {
                let id = EisaId::from_str_id(id).ok_or_else(|| anyhow!("invalid EISA ID {id:?}"))?;
                NamespaceValue::Integer(u64::from(id.raw))
            }
        })
    }
}

impl Snapshot {
    /// Parses a snapshot from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Builds the in-memory namespace described by this snapshot.
    pub fn build(&self) -> Result<MemoryNamespace> {
        let mut ns = MemoryNamespace::new();
        for node in &self.nodes {
            let value = node
                .value
                .as_ref()
                .map(ValueEntry::to_value)
                .transpose()
                .with_context(|| format!("node {}", node.path))?;
            let kind = match (&node.kind, &value) {
                (Some(name), _) => ObjectType::from_name(name)
                    .ok_or_else(|| anyhow!("node {}: unknown kind {name:?}", node.path))?,
                (None, Some(value)) => value.object_type(),
                (None, None) => ObjectType::Any,
            };

            ns.insert(&node.path, kind, value)
                .with_context(|| format!("node {}", node.path))?;
            if node.fail_kind {
                ns.fail_kind(&node.path)?;
            }
            if node.fail_eval {
                ns.fail_eval(&node.path)?;
            }
            if node.fail_children {
                ns.fail_children(&node.path)?;
            }
        }
        Ok(ns)
    }
}

/// Loads a snapshot file into an in-memory namespace.
pub fn load(path: &Path) -> Result<MemoryNamespace> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let snapshot = Snapshot::parse(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    let ns = snapshot
        .build()
        .with_context(|| format!("loading {}", path.display()))?;
    log::debug!("loaded {} objects from {}", ns.len(), path.display());
    Ok(ns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use acpi_namespace::{Client, Path as NsPath};

    const SAMPLE: &str = r#"
        [[node]]
        path = "_SB_"
        kind = "device"

        [[node]]
        path = "_SB_.LID0"
        kind = "Device"

        [[node]]
        path = "_SB_.LID0._HID"
        value = { eisa_id = "PNP0C0D" }

        [[node]]
        path = "_SB_.LID0._STA"
        kind = "method"
        value = { integer = 15 }
        fail_eval = true

        [[node]]
        path = "_SB_.LID0.PKG0"
        value = { package = [{ integer = 1 }, { string = "two" }] }

        [[node]]
        path = "_TZ_"
    "#;

    fn ns_path(s: &str) -> NsPath {
        NsPath::parse(s).unwrap()
    }

    #[test]
    fn builds_namespace() {
        let ns = Snapshot::parse(SAMPLE).unwrap().build().unwrap();
        assert_eq!(ns.len(), 6);

        let mut client = Client::new(ns);
        assert_eq!(client.get_kind(&ns_path("_SB_.LID0")).unwrap(), ObjectType::Device);
        assert_eq!(client.get_kind(&ns_path("_TZ_")).unwrap(), ObjectType::Any);
        assert_eq!(
            client.evaluate_value(&ns_path("_SB_.LID0._HID")).unwrap(),
            Some(NamespaceValue::Integer(0x0D0C_D041))
        );
        assert_eq!(
            client.evaluate_value(&ns_path("_SB_.LID0.PKG0")).unwrap(),
            Some(NamespaceValue::Package(vec![
                NamespaceValue::Integer(1),
                NamespaceValue::Str(b"two".to_vec()),
            ]))
        );
        assert!(client.evaluate(&ns_path("_SB_.LID0._STA")).is_err());
    }

    #[test]
    fn rejects_bad_entries() {
        let unknown_kind = "[[node]]\npath = \"X\"\nkind = \"gizmo\"\n";
        assert!(Snapshot::parse(unknown_kind).unwrap().build().is_err());

        let orphan = "[[node]]\npath = \"A.B\"\n";
        assert!(Snapshot::parse(orphan).unwrap().build().is_err());

        let bad_id = "[[node]]\npath = \"_HID\"\nvalue = { eisa_id = \"nope\" }\n";
        assert!(Snapshot::parse(bad_id).unwrap().build().is_err());

        assert!(Snapshot::parse("[[node]]\nname = \"X\"\n").is_err());
    }

    #[test]
    fn sample_snapshot_tree() {
        use acpi_namespace::Walker;

        let text = include_str!("../tests/fixtures/sample.toml");
        let ns = Snapshot::parse(text).unwrap().build().unwrap();
        let mut client = Client::new(ns);
        let lines: Vec<String> = Walker::new(&mut client)
            .walk(None)
            .unwrap()
            .map(|line| line.unwrap().to_string())
            .collect();

        assert_eq!(
            lines[..7],
            [
                "|-- _GPE [Any]",
                "|-- _PR_ [Any]",
                "|-- _SB_ [Device]",
                "|   |-- PCI0 [Device]",
                "|   |   |-- _HID (PNP0A08) [Integer]",
                "|   |   |-- _CID (PNP0A03) [Integer]",
                "|   |   |-- _ADR (0x0) [Integer]",
            ]
        );
        for expected in [
            "|   |   `-- DOCK [Device]",
            "|   |       |-- _STA (0xf) [Method]",
            "|   |       `-- _STR (Dock) [Buffer]",
            "|   `-- PWRB [Device]",
            "`-- _TZ_ [Device]",
            "    |-- THRM [Thermal]",
            "    |   |-- _TMP [Method]",
            "    |   `-- _STR (CPU thermal zone) [String]",
            "    `-- FAN0 [Not Found]",
        ] {
            assert!(lines.iter().any(|l| l == expected), "missing {expected:?}");
        }
        assert_eq!(lines.last().map(String::as_str), Some("    `-- FAN0 [Not Found]"));
    }
}
