//! ACPI object type codes.
//!
//! The channel reports an object's type as a small integer. Codes 0x00
//! through 0x1F are defined by ACPICA; anything else is carried through
//! as [`ObjectType::Unknown`].

use core::fmt;

/// Display names indexed by type code.
const TYPE_NAMES: [&str; 0x20] = [
    "Any",
    "Integer",
    "String",
    "Buffer",
    "Package",
    "Field Unit",
    "Device",
    "Event",
    "Method",
    "Mutex",
    "Region",
    "Power",
    "Processor",
    "Thermal",
    "Buffer Field",
    "DDB Handle",
    "Debug Object/External Max", // 0x10
    "Local Region Field",
    "Local Bank Field",
    "Local Index Field",
    "Local Reference",
    "Local Alias",
    "Local Method Alias",
    "Local Notify",
    "Local Address Handler",
    "Local Resource",
    "Local Resource Field",
    "Local Scope/NS Node Max",
    "Local Extra",
    "Local Data/Local Max",
    "Invalid",
    "Not Found", // 0x1F
];

/// The type of a namespace object as reported by the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// Untyped (0x00).
    Any,
    /// Integer (0x01).
    Integer,
    /// String (0x02).
    String,
    /// Buffer (0x03).
    Buffer,
    /// Package (0x04).
    Package,
    /// Field unit (0x05).
    FieldUnit,
    /// Device (0x06).
    Device,
    /// Event (0x07).
    Event,
    /// Control method (0x08).
    Method,
    /// Mutex (0x09).
    Mutex,
    /// Operation region (0x0A).
    Region,
    /// Power resource (0x0B).
    Power,
    /// Processor (0x0C).
    Processor,
    /// Thermal zone (0x0D).
    Thermal,
    /// Buffer field (0x0E).
    BufferField,
    /// DDB handle (0x0F).
    DdbHandle,
    /// ACPICA-internal types 0x10..=0x1D, kept by code.
    Internal(u32),
    /// Invalid (0x1E).
    Invalid,
    /// The path does not name an object (0x1F).
    NotFound,
    /// A code outside the defined table.
    Unknown(u32),
}

impl ObjectType {
    /// Maps a raw type code to an [`ObjectType`].
    #[must_use]
    pub fn from_code(code: u32) -> Self {
        match code {
            0x00 => Self::Any,
            0x01 => Self::Integer,
            0x02 => Self::String,
            0x03 => Self::Buffer,
            0x04 => Self::Package,
            0x05 => Self::FieldUnit,
            0x06 => Self::Device,
            0x07 => Self::Event,
            0x08 => Self::Method,
            0x09 => Self::Mutex,
            0x0A => Self::Region,
            0x0B => Self::Power,
            0x0C => Self::Processor,
            0x0D => Self::Thermal,
            0x0E => Self::BufferField,
            0x0F => Self::DdbHandle,
            0x10..=0x1D => Self::Internal(code),
            0x1E => Self::Invalid,
            0x1F => Self::NotFound,
            _ => Self::Unknown(code),
        }
    }

    /// Returns the raw type code.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Any => 0x00,
            Self::Integer => 0x01,
            Self::String => 0x02,
            Self::Buffer => 0x03,
            Self::Package => 0x04,
            Self::FieldUnit => 0x05,
            Self::Device => 0x06,
            Self::Event => 0x07,
            Self::Method => 0x08,
            Self::Mutex => 0x09,
            Self::Region => 0x0A,
            Self::Power => 0x0B,
            Self::Processor => 0x0C,
            Self::Thermal => 0x0D,
            Self::BufferField => 0x0E,
            Self::DdbHandle => 0x0F,
            Self::Internal(code) | Self::Unknown(code) => code,
            Self::Invalid => 0x1E,
            Self::NotFound => 0x1F,
        }
    }

    /// Looks a type up by its display name, case-insensitively.
    ///
    /// Also accepts the short spellings `thermal_zone`, `power_resource`
    /// and `field_unit` used in namespace snapshot files.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.replace('_', " ");
        let alias = match normalized.to_ascii_lowercase().as_str() {
            "thermal zone" => "thermal".to_string(),
            "power resource" => "power".to_string(),
            "string" | "str" => "string".to_string(),
            other => other.to_string(),
        };
        TYPE_NAMES
            .iter()
            .position(|n| n.eq_ignore_ascii_case(&alias))
            .map(|code| Self::from_code(code as u32))
    }

    /// Returns the display name of this type.
    #[must_use]
    pub fn name(self) -> &'static str {
        TYPE_NAMES.get(self.code() as usize).copied().unwrap_or("Unknown")
    }

    /// Returns `true` for the kinds whose children are enumerated as a
    /// subtree: devices, processors, thermal zones and power resources.
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(
            self,
            Self::Device | Self::Processor | Self::Thermal | Self::Power
        )
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
