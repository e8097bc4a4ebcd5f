//! `acpi-namespace` --- decoding and walking an ACPI namespace exposed over a
//! request/response channel.
//!
//! A driver-style channel answers path-addressed requests (object type,
//! child listing, evaluation, parent lookup) with self-describing binary
//! blobs. This crate turns those blobs into typed [`NamespaceValue`]s and
//! walks the namespace depth-first, producing one [`TreeLine`] per entry.
//!
//! The crate never executes ACPI control methods itself: it only issues
//! requests through a [`Channel`] and decodes what comes back.
//!
//! # Usage
//!
//! ```ignore
//! let mut client = Client::new(my_channel);
//! let mut walker = Walker::new(&mut client);
//! for line in walker.walk(None)? {
//!     println!("{}", line?);
//! }
//! ```

#![warn(missing_docs)]

pub mod channel;
pub mod decode;
pub mod eisa;
pub mod encode;
pub mod object;
pub mod path;
pub mod value;
pub mod walker;

// Re-export key types at crate root for convenience.
pub use channel::{Channel, Client, ClientError, Operation, TransportError};
pub use decode::{DecodeError, RECORD_SIZE, decode, decode_integer, decode_type_code};
pub use eisa::{EisaId, encode_eisa_id};
pub use encode::{encode, encode_args};
pub use object::ObjectType;
pub use path::{Path, PathError};
pub use value::{NamespaceValue, narrow_buffer_to_string};
pub use walker::{NodeClass, Rendered, TreeLine, Walk, WalkError, WalkOptions, Walker};
