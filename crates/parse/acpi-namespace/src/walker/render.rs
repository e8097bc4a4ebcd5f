//! Leaf rendering rules.
//!
//! A leaf's content is chosen by the first rule in [`RULES`] whose name
//! list contains the leaf's name or whose type matches the leaf's type.
//! Name matches come first so that well-known fields are decoded even when
//! the provider reports them as methods.

use core::fmt;

use log::warn;

use crate::channel::{Channel, Client};
use crate::eisa::EisaId;
use crate::object::ObjectType;
use crate::path::Path;
use crate::value::NamespaceValue;

/// Bytes per hex-dump row.
pub const HEX_ROW_LEN: usize = 16;

/// How a leaf's value is fetched and shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    /// Evaluate as an integer and show the compressed EISA ID.
    HardwareId,
    /// Evaluate as a string, or a buffer of 16-bit characters.
    Text,
    /// Evaluate as an integer and show it in hexadecimal.
    Integer,
    /// Show the raw response as a hex dump.
    HexDump,
}

/// One entry of the rendering table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Leaf names this rule applies to.
    pub names: &'static [&'static str],
    /// Object type this rule applies to, regardless of name.
    pub kind: Option<ObjectType>,
    /// Renderer used when the rule matches.
    pub renderer: Renderer,
}

impl Rule {
    fn matches(&self, name: &str, kind: Option<ObjectType>) -> bool {
        self.names.contains(&name) || (self.kind.is_some() && self.kind == kind)
    }
}

/// Rendering rules, in priority order.
pub const RULES: &[Rule] = &[
    Rule {
        names: &["_HID", "_CID"],
        kind: None,
        renderer: Renderer::HardwareId,
    },
    Rule {
        names: &["_STR"],
        kind: Some(ObjectType::String),
        renderer: Renderer::Text,
    },
    Rule {
        names: &["_STA"],
        kind: Some(ObjectType::Integer),
        renderer: Renderer::Integer,
    },
    Rule {
        names: &["_CRS", "_PRS", "_PRT", "_MAT"],
        kind: None,
        renderer: Renderer::HexDump,
    },
];

/// Returns the renderer for a leaf, or `None` if it is shown by name and
/// type only.
#[must_use]
pub fn select(name: &str, kind: Option<ObjectType>) -> Option<Renderer> {
    RULES
        .iter()
        .find(|rule| rule.matches(name, kind))
        .map(|rule| rule.renderer)
}

/// The content shown for a tree entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Nothing beyond name and type.
    None,
    /// A decoded hardware ID.
    HardwareId(EisaId),
    /// Text content.
    Text(String),
    /// An integer value.
    Integer(u64),
    /// Raw response bytes.
    HexDump(Vec<u8>),
    /// The provider returned no data or the request failed.
    NoData,
    /// The value could not be fetched or decoded.
    Failed(String),
}

impl fmt::Display for Rendered {
    /// Writes the inline part of the content (hex-dump rows are written by
    /// the tree line).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None | Self::HexDump(_) => Ok(()),
            Self::HardwareId(id) => write!(f, " ({id})"),
            Self::Text(text) => write!(f, " ({text})"),
            Self::Integer(v) => write!(f, " (0x{v:x})"),
            Self::NoData => f.write_str(" (empty/failed)"),
            Self::Failed(reason) => write!(f, " (error: {reason})"),
        }
    }
}

fn failed(path: &Path, what: &str, reason: impl fmt::Display) -> Rendered {
    warn!("{path}: {what}: {reason}");
    Rendered::Failed(reason.to_string())
}

/// Fetches and renders a leaf's value.
pub fn render<C: Channel>(renderer: Renderer, client: &mut Client<C>, path: &Path) -> Rendered {
    if renderer == Renderer::HexDump {
        return match client.evaluate(path) {
            Ok(raw) if raw.is_empty() => Rendered::NoData,
            Ok(raw) => Rendered::HexDump(raw),
            Err(e) => {
                warn!("{path}: evaluate failed: {e}");
                Rendered::NoData
            }
        };
    }

    let value = match client.evaluate_value(path) {
        Ok(Some(value)) => value,
        Ok(None) => return Rendered::NoData,
        Err(e) => return failed(path, "evaluate failed", e),
    };

    match (renderer, value) {
        #[allow(clippy::cast_possible_truncation)]
        (Renderer::HardwareId, NamespaceValue::Integer(v)) => {
            Rendered::HardwareId(EisaId::new(v as u32))
        }
        (Renderer::Integer, NamespaceValue::Integer(v)) => Rendered::Integer(v),
        (
            Renderer::HardwareId | Renderer::Text,
            value @ (NamespaceValue::Str(_) | NamespaceValue::Buffer(_)),
        ) => {
            // Always `Some` for strings and buffers.
            Rendered::Text(value.to_text().unwrap_or_default())
        }
        (_, value) => failed(
            path,
            "unexpected value",
            format!("{} value", value.object_type()),
        ),
    }
}
