//! Request/response channel to the namespace provider.
//!
//! The provider (typically a kernel driver behind a character device) is
//! modelled by the [`Channel`] trait: a request is submitted for a path and
//! answered with a declared response size, after which the response bytes
//! are read back. [`Client`] layers the typed operations on top and
//! enforces the length contract.

pub mod memory;

use core::fmt;

use log::debug;
use thiserror::Error;

use crate::decode::{DecodeError, decode, decode_type_code};
use crate::encode::encode_args;
use crate::object::ObjectType;
use crate::path::{Path, PathError};
use crate::value::NamespaceValue;

pub use memory::{InsertError, MemoryNamespace};

/// A path-addressed request understood by the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Report the object type as an integer record.
    GetKind,
    /// List the names of the immediate children, newline-delimited.
    ListChildren,
    /// Evaluate the object and return its value as a record.
    Evaluate,
    /// Return the full path of the object's parent.
    GetParent,
    /// Return the full paths of every object with the given name,
    /// newline-delimited.
    FindObjects,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GetKind => "GET_TYPE",
            Self::ListChildren => "GET_NEXT",
            Self::Evaluate => "EVALUATE_OBJ",
            Self::GetParent => "GET_PARENT",
            Self::FindObjects => "GET_OBJECTS",
        })
    }
}

/// Failures reported by the transport itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The provider rejected the request.
    #[error("{op} failed at {path:?}: {reason}")]
    Failed {
        /// The operation that was submitted.
        op: Operation,
        /// The path it was submitted for (empty for the root).
        path: String,
        /// Provider-specific description.
        reason: String,
    },
    /// Fewer (or more) bytes were read back than the request declared.
    #[error("short read: {declared} bytes declared, {actual} read")]
    LengthMismatch {
        /// Size announced by [`Channel::submit`].
        declared: usize,
        /// Bytes returned by [`Channel::read`].
        actual: usize,
    },
    /// No buffer could be allocated for the declared response size.
    #[error("cannot allocate {requested} bytes for the response")]
    Allocation {
        /// Size announced by [`Channel::submit`].
        requested: usize,
    },
    /// [`Channel::read`] was called without a pending response.
    #[error("no response pending")]
    NoPendingResponse,
}

/// The provider side of the namespace.
///
/// Implementations answer one request at a time: [`submit`](Self::submit)
/// returns the size of the response, and [`read`](Self::read) hands it
/// over. A response not read before the next submit is discarded.
pub trait Channel {
    /// Submits `op` for `path` (`None` addresses the root) and returns the
    /// size of the response in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Failed`] if the provider rejects the
    /// request.
    fn submit(&mut self, op: Operation, path: Option<&str>) -> Result<usize, TransportError>;

    /// Copies the pending response into `buf` and returns the number of
    /// bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NoPendingResponse`] if nothing was
    /// submitted.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Stages an encoded argument list for the next evaluate request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Failed`] if the provider rejects the list.
    fn write_args(&mut self, args: &[u8]) -> Result<(), TransportError>;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn submit(&mut self, op: Operation, path: Option<&str>) -> Result<usize, TransportError> {
        (**self).submit(op, path)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).read(buf)
    }

    fn write_args(&mut self, args: &[u8]) -> Result<(), TransportError> {
        (**self).write_args(args)
    }
}

/// Errors returned by [`Client`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request itself failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The response could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The response named an invalid path.
    #[error(transparent)]
    Path(#[from] PathError),
    /// A textual response was not valid UTF-8.
    #[error("{op} response is not valid UTF-8")]
    InvalidUtf8 {
        /// The operation whose response was malformed.
        op: Operation,
    },
}

/// Splits a newline-delimited name list.
///
/// A trailing newline does not produce an empty entry, and NUL padding at
/// the end of the response is ignored.
#[must_use]
pub fn split_child_list(text: &str) -> Vec<String> {
    text.trim_end_matches('\0')
        .split('\n')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Typed access to a [`Channel`].
pub struct Client<C> {
    channel: C,
}

impl<C: Channel> Client<C> {
    /// Wraps a channel.
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    /// Returns the underlying channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Returns the underlying channel mutably.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Consumes the client and returns the channel.
    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Issues a raw request and returns the whole response.
    ///
    /// A zero-length response is a successful "no data" answer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Allocation`] if no buffer of the declared
    /// size can be allocated, [`TransportError::LengthMismatch`] if the bytes
    /// read back do not match the declared size, or any error from the
    /// channel.
    pub fn request(
        &mut self,
        op: Operation,
        path: Option<&Path>,
    ) -> Result<Vec<u8>, TransportError> {
        let path_str = path.filter(|p| !p.is_root()).map(ToString::to_string);
        let declared = self.channel.submit(op, path_str.as_deref())?;
        debug!("{op} {}: {declared} bytes", path_str.as_deref().unwrap_or("\\"));

        if declared == 0 {
            return Ok(Vec::new());
        }

        let mut buf = Vec::new();
        buf.try_reserve_exact(declared)
            .map_err(|_| TransportError::Allocation { requested: declared })?;
        buf.resize(declared, 0);
        let actual = self.channel.read(&mut buf)?;
        if actual != declared {
            return Err(TransportError::LengthMismatch { declared, actual });
        }
        Ok(buf)
    }

    fn request_text(&mut self, op: Operation, path: Option<&Path>) -> Result<String, ClientError> {
        let raw = self.request(op, path)?;
        String::from_utf8(raw).map_err(|_| ClientError::InvalidUtf8 { op })
    }

    /// Returns the type of the object at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the request fails or the response is not an integer record.
    pub fn get_kind(&mut self, path: &Path) -> Result<ObjectType, ClientError> {
        let raw = self.request(Operation::GetKind, Some(path))?;
        Ok(decode_type_code(&raw)?)
    }

    /// Lists the names of the children of `path` (`None` for the root), in
    /// the order the provider returns them.
    ///
    /// # Errors
    ///
    /// Fails if the request fails or the listing is not UTF-8.
    pub fn list_children(&mut self, path: Option<&Path>) -> Result<Vec<String>, ClientError> {
        let text = self.request_text(Operation::ListChildren, path)?;
        Ok(split_child_list(&text))
    }

    /// Evaluates `path` and returns the raw response.
    ///
    /// # Errors
    ///
    /// Fails if the request fails.
    pub fn evaluate(&mut self, path: &Path) -> Result<Vec<u8>, ClientError> {
        Ok(self.request(Operation::Evaluate, Some(path))?)
    }

    /// Evaluates `path` and decodes the result. Returns `None` when the
    /// provider answered with no data.
    ///
    /// # Errors
    ///
    /// Fails if the request fails or the response cannot be decoded.
    pub fn evaluate_value(&mut self, path: &Path) -> Result<Option<NamespaceValue>, ClientError> {
        let raw = self.evaluate(path)?;
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(decode(&raw)?))
    }

    /// Evaluates `path` with an argument list.
    ///
    /// # Errors
    ///
    /// Fails if staging the arguments, the request, or decoding fails.
    pub fn evaluate_with_args(
        &mut self,
        path: &Path,
        args: &[NamespaceValue],
    ) -> Result<Option<NamespaceValue>, ClientError> {
        self.channel.write_args(&encode_args(args))?;
        self.evaluate_value(path)
    }

    /// Returns the parent of `path`, or `None` if the provider returned
    /// nothing.
    ///
    /// # Errors
    ///
    /// Fails if the request fails or the response is not a valid path.
    pub fn get_parent(&mut self, path: &Path) -> Result<Option<Path>, ClientError> {
        let text = self.request_text(Operation::GetParent, Some(path))?;
        let text = text.trim_end_matches(['\0', '\n']);
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(Path::parse(text)?))
    }

    /// Returns the full paths of every object named `name`.
    ///
    /// # Errors
    ///
    /// Fails if the request fails or a returned path is invalid.
    pub fn find_objects(&mut self, name: &str) -> Result<Vec<Path>, ClientError> {
        let query = Path::parse(name)?;
        let text = self.request_text(Operation::FindObjects, Some(&query))?;
        split_child_list(&text)
            .iter()
            .map(|p| Path::parse(p).map_err(ClientError::from))
            .collect()
    }

    /// Finds the first object named `name` and resolves its parent.
    ///
    /// Returns `(object, parent)`, or `None` if no object has that name.
    ///
    /// # Errors
    ///
    /// Fails if either lookup fails or the object has no parent.
    pub fn locate(&mut self, name: &str) -> Result<Option<(Path, Path)>, ClientError> {
        let Some(object) = self.find_objects(name)?.into_iter().next() else {
            return Ok(None);
        };
        let parent = self.get_parent(&object)?.unwrap_or_else(Path::root);
        Ok(Some((object, parent)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;

    /// Channel that answers every request with a fixed response and can
    /// under-deliver on read.
    struct Scripted {
        response: Vec<u8>,
        declared: usize,
        submitted: Vec<(Operation, Option<String>)>,
    }

    impl Scripted {
        fn new(response: Vec<u8>) -> Self {
            Self {
                declared: response.len(),
                response,
                submitted: Vec::new(),
            }
        }
    }

    impl Channel for Scripted {
        fn submit(&mut self, op: Operation, path: Option<&str>) -> Result<usize, TransportError> {
            self.submitted.push((op, path.map(str::to_string)));
            Ok(self.declared)
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            let n = buf.len().min(self.response.len());
            buf[..n].copy_from_slice(&self.response[..n]);
            Ok(n)
        }

        fn write_args(&mut self, _args: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[test]
    fn child_list_splitting() {
        assert_eq!(split_child_list("_SB_\n_PR_\n"), ["_SB_", "_PR_"]);
        assert_eq!(split_child_list("_SB_\n_PR_"), ["_SB_", "_PR_"]);
        assert_eq!(split_child_list("A\n\nB\n\0\0"), ["A", "B"]);
        assert!(split_child_list("").is_empty());
    }

    #[test]
    fn root_is_addressed_without_path() {
        let mut client = Client::new(Scripted::new(b"_SB_\n".to_vec()));
        let names = client.list_children(None).unwrap();
        assert_eq!(names, ["_SB_"]);
        client.list_children(Some(&Path::root())).unwrap();
        assert_eq!(
            client.channel().submitted,
            [(Operation::ListChildren, None), (Operation::ListChildren, None)]
        );
    }

    #[test]
    fn short_read_is_transport_error() {
        let mut channel = Scripted::new(encode(&NamespaceValue::Integer(6)));
        channel.declared = 32;
        let mut client = Client::new(channel);
        let err = client.get_kind(&Path::parse("_SB_").unwrap()).unwrap_err();
        assert_eq!(
            err,
            ClientError::Transport(TransportError::LengthMismatch {
                declared: 32,
                actual: 24
            })
        );
    }

    #[test]
    fn oversized_response_is_transport_error() {
        let mut channel = Scripted::new(Vec::new());
        channel.declared = usize::MAX;
        let mut client = Client::new(channel);
        let path = Path::parse("_SB_").unwrap();
        assert_eq!(
            client.get_kind(&path),
            Err(ClientError::Transport(TransportError::Allocation {
                requested: usize::MAX
            }))
        );
        assert!(client.evaluate(&path).is_err());
        assert!(client.list_children(Some(&path)).is_err());
    }

    #[test]
    fn zero_length_is_no_data() {
        let mut client = Client::new(Scripted::new(Vec::new()));
        let path = Path::parse("_SB_.LID0._LID").unwrap();
        assert_eq!(client.evaluate_value(&path), Ok(None));
        assert_eq!(client.get_parent(&path), Ok(None));
    }

    #[test]
    fn kind_decodes_type_code() {
        let mut client = Client::new(Scripted::new(encode(&NamespaceValue::Integer(0x0C))));
        let kind = client.get_kind(&Path::parse("_PR_.CPU0").unwrap()).unwrap();
        assert_eq!(kind, ObjectType::Processor);
    }

    #[test]
    fn kind_rejects_non_integer() {
        let mut client = Client::new(Scripted::new(encode(&NamespaceValue::Str(b"x".to_vec()))));
        assert!(matches!(
            client.get_kind(&Path::parse("X").unwrap()),
            Err(ClientError::Decode(
                DecodeError::SizeMismatch { .. } | DecodeError::UnexpectedType { .. }
            ))
        ));
    }

    #[test]
    fn parent_is_parsed() {
        let mut client = Client::new(Scripted::new(b"\\_SB_.PCI0.GFX0\0".to_vec()));
        let parent = client.get_parent(&Path::parse("_SB_.PCI0.GFX0._DOD").unwrap());
        assert_eq!(parent.unwrap().unwrap().to_string(), "_SB_.PCI0.GFX0");
    }

    #[test]
    fn invalid_utf8_listing() {
        let mut client = Client::new(Scripted::new(vec![0xFF, b'\n']));
        assert_eq!(
            client.list_children(None),
            Err(ClientError::InvalidUtf8 {
                op: Operation::ListChildren
            })
        );
    }
}
