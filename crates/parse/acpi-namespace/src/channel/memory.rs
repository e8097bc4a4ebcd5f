//! In-memory namespace provider.
//!
//! [`MemoryNamespace`] holds a namespace tree and answers [`Channel`]
//! requests from it, encoding values with the same record layout a driver
//! would use. Nodes can be marked to fail specific requests, which makes it
//! suitable for exercising degraded-node handling.

use thiserror::Error;

use super::{Channel, Operation, TransportError};
use crate::decode::decode_args;
use crate::encode::encode;
use crate::object::ObjectType;
use crate::path::{Path, PathError};
use crate::value::NamespaceValue;

/// Errors returned when building a [`MemoryNamespace`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    /// The path could not be parsed.
    #[error(transparent)]
    Path(#[from] PathError),
    /// The root cannot be inserted or modified.
    #[error("the root object cannot be replaced")]
    Root,
    /// The parent of the path has not been inserted.
    #[error("parent of {0:?} does not exist")]
    MissingParent(String),
    /// An object already exists at the path.
    #[error("object {0:?} already exists")]
    Duplicate(String),
    /// No object exists at the path.
    #[error("object {0:?} does not exist")]
    NotFound(String),
}

/// Requests a node is configured to reject.
#[derive(Debug, Clone, Copy, Default)]
struct Failures {
    kind: bool,
    eval: bool,
    children: bool,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<usize>,
    children: Vec<usize>,
    kind: ObjectType,
    value: Option<NamespaceValue>,
    fail: Failures,
}

/// A namespace held in memory.
#[derive(Debug, Clone)]
pub struct MemoryNamespace {
    /// Node arena; index 0 is the root.
    nodes: Vec<Node>,
    pending: Option<Vec<u8>>,
    staged_args: Option<Vec<NamespaceValue>>,
    last_args: Option<Vec<NamespaceValue>>,
    requests: usize,
}

impl Default for MemoryNamespace {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNamespace {
    /// Creates a namespace containing only the root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                parent: None,
                children: Vec::new(),
                kind: ObjectType::Any,
                value: None,
                fail: Failures::default(),
            }],
            pending: None,
            staged_args: None,
            last_args: None,
            requests: 0,
        }
    }

    fn lookup(&self, path: &Path) -> Option<usize> {
        let mut index = 0;
        for segment in path.segments() {
            index = *self.nodes[index]
                .children
                .iter()
                .find(|&&c| self.nodes[c].name == *segment)?;
        }
        Some(index)
    }

    fn lookup_str(&self, path: &str) -> Result<usize, InsertError> {
        let parsed = Path::parse(path)?;
        self.lookup(&parsed)
            .ok_or_else(|| InsertError::NotFound(path.to_string()))
    }

    fn full_path(&self, mut index: usize) -> Path {
        let mut names = Vec::new();
        while let Some(parent) = self.nodes[index].parent {
            names.push(self.nodes[index].name.as_str());
            index = parent;
        }
        names.reverse();
        // Node names are validated on insert.
        names
            .into_iter()
            .try_fold(Path::root(), |p, name| p.child(name))
            .unwrap_or_default()
    }

    /// Inserts an object. Children are listed in insertion order.
    ///
    /// # Errors
    ///
    /// Fails if the path is invalid or the root, its parent is missing, or
    /// an object already exists there.
    pub fn insert(
        &mut self,
        path: &str,
        kind: ObjectType,
        value: Option<NamespaceValue>,
    ) -> Result<(), InsertError> {
        let parsed = Path::parse(path)?;
        let name = parsed.last().ok_or(InsertError::Root)?.to_string();
        let parent_path = parsed.parent().unwrap_or_default();
        let parent = self
            .lookup(&parent_path)
            .ok_or_else(|| InsertError::MissingParent(path.to_string()))?;
        if self.lookup(&parsed).is_some() {
            return Err(InsertError::Duplicate(path.to_string()));
        }

        let index = self.nodes.len();
        self.nodes.push(Node {
            name,
            parent: Some(parent),
            children: Vec::new(),
            kind,
            value,
            fail: Failures::default(),
        });
        self.nodes[parent].children.push(index);
        Ok(())
    }

    /// Inserts a data object whose type follows from its value.
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert).
    pub fn insert_value(&mut self, path: &str, value: NamespaceValue) -> Result<(), InsertError> {
        let kind = value.object_type();
        self.insert(path, kind, Some(value))
    }

    /// Makes type queries for `path` fail.
    ///
    /// # Errors
    ///
    /// Fails if no object exists at `path`.
    pub fn fail_kind(&mut self, path: &str) -> Result<(), InsertError> {
        let index = self.lookup_str(path)?;
        self.nodes[index].fail.kind = true;
        Ok(())
    }

    /// Makes evaluation of `path` fail.
    ///
    /// # Errors
    ///
    /// Fails if no object exists at `path`.
    pub fn fail_eval(&mut self, path: &str) -> Result<(), InsertError> {
        let index = self.lookup_str(path)?;
        self.nodes[index].fail.eval = true;
        Ok(())
    }

    /// Makes child listing of `path` fail.
    ///
    /// # Errors
    ///
    /// Fails if no object exists at `path`.
    pub fn fail_children(&mut self, path: &str) -> Result<(), InsertError> {
        let index = self.lookup_str(path)?;
        self.nodes[index].fail.children = true;
        Ok(())
    }

    /// Returns the argument list received with the most recent evaluate.
    #[must_use]
    pub fn last_args(&self) -> Option<&[NamespaceValue]> {
        self.last_args.as_deref()
    }

    /// Returns the number of requests submitted so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests
    }

    /// Returns the number of objects, excluding the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Returns `true` if only the root exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full paths of every object named like the last segment of `query`,
    /// depth-first in listing order.
    fn find(&self, query: &Path) -> Vec<u8> {
        let name = query.last().unwrap_or_default();
        let mut out = String::new();
        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if index != 0 && node.name == name {
                out.push_str(&self.full_path(index).to_string());
                out.push('\n');
            }
            stack.extend(node.children.iter().rev());
        }
        out.into_bytes()
    }

    fn respond(&self, op: Operation, path: &Path) -> Result<Vec<u8>, String> {
        if op == Operation::FindObjects {
            return Ok(self.find(path));
        }

        let Some(index) = self.lookup(path) else {
            return match op {
                Operation::GetKind => Ok(encode(&NamespaceValue::Integer(u64::from(
                    ObjectType::NotFound.code(),
                )))),
                _ => Err("no such object".to_string()),
            };
        };
        let node = &self.nodes[index];

        match op {
            Operation::GetKind if node.fail.kind => Err("type query rejected".to_string()),
            Operation::GetKind => Ok(encode(&NamespaceValue::Integer(u64::from(node.kind.code())))),
            Operation::ListChildren if node.fail.children => Err("listing rejected".to_string()),
            Operation::ListChildren => {
                let mut out = String::new();
                for &child in &node.children {
                    out.push_str(&self.nodes[child].name);
                    out.push('\n');
                }
                Ok(out.into_bytes())
            }
            Operation::Evaluate if node.fail.eval => Err("evaluation failed".to_string()),
            Operation::Evaluate => Ok(node.value.as_ref().map(encode).unwrap_or_default()),
            Operation::GetParent | Operation::FindObjects => Ok(node
                .parent
                .map(|parent| self.full_path(parent).to_string().into_bytes())
                .unwrap_or_default()),
        }
    }
}

impl Channel for MemoryNamespace {
    fn submit(&mut self, op: Operation, path: Option<&str>) -> Result<usize, TransportError> {
        self.requests += 1;
        self.pending = None;
        let path_str = path.unwrap_or_default();
        let failed = |reason: String| TransportError::Failed {
            op,
            path: path_str.to_string(),
            reason,
        };

        if op == Operation::Evaluate {
            self.last_args = self.staged_args.take();
        }

        let parsed = Path::parse(path_str).map_err(|e| failed(e.to_string()))?;
        let response = self.respond(op, &parsed).map_err(failed)?;
        let len = response.len();
        self.pending = Some(response);
        Ok(len)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let response = self.pending.take().ok_or(TransportError::NoPendingResponse)?;
        let n = buf.len().min(response.len());
        buf[..n].copy_from_slice(&response[..n]);
        Ok(n)
    }

    fn write_args(&mut self, args: &[u8]) -> Result<(), TransportError> {
        let decoded = decode_args(args).map_err(|e| TransportError::Failed {
            op: Operation::Evaluate,
            path: String::new(),
            reason: format!("bad argument list: {e}"),
        })?;
        self.staged_args = Some(decoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Client, ClientError};

    fn sample() -> MemoryNamespace {
        let mut ns = MemoryNamespace::new();
        ns.insert("_SB_", ObjectType::Device, None).unwrap();
        ns.insert("_SB_.PCI0", ObjectType::Device, None).unwrap();
        ns.insert_value("_SB_.PCI0._HID", NamespaceValue::Integer(0x030A_D041)).unwrap();
        ns.insert("_SB_.PCI0.GFX0", ObjectType::Device, None).unwrap();
        ns.insert(
            "_SB_.PCI0.GFX0._DOD",
            ObjectType::Method,
            Some(NamespaceValue::Package(vec![
                NamespaceValue::Integer(0x100),
                NamespaceValue::Integer(0x110),
            ])),
        )
        .unwrap();
        ns.insert("_SB_.DOCK", ObjectType::Device, None).unwrap();
        ns.insert("_SB_.DOCK._DCK", ObjectType::Method, Some(NamespaceValue::Integer(1)))
            .unwrap();
        ns
    }

    #[test]
    fn insert_validates_structure() {
        let mut ns = sample();
        assert_eq!(ns.len(), 7);
        assert!(matches!(
            ns.insert("_SB_.NOPE._STA", ObjectType::Integer, None),
            Err(InsertError::MissingParent(_))
        ));
        assert!(matches!(
            ns.insert("_SB_.PCI0", ObjectType::Device, None),
            Err(InsertError::Duplicate(_))
        ));
        assert_eq!(ns.insert("", ObjectType::Device, None), Err(InsertError::Root));
        assert!(matches!(ns.fail_eval("_SB_.NOPE"), Err(InsertError::NotFound(_))));
    }

    #[test]
    fn children_in_insertion_order() {
        let mut client = Client::new(sample());
        let sb = Path::parse("_SB_").unwrap();
        assert_eq!(client.list_children(Some(&sb)).unwrap(), ["PCI0", "DOCK"]);
        assert_eq!(client.list_children(None).unwrap(), ["_SB_"]);
    }

    #[test]
    fn missing_object_kind_is_not_found() {
        let mut client = Client::new(sample());
        let kind = client.get_kind(&Path::parse("_SB_.NOPE").unwrap()).unwrap();
        assert_eq!(kind, ObjectType::NotFound);
    }

    #[test]
    fn evaluate_package() {
        let mut client = Client::new(sample());
        let dod = Path::parse("_SB_.PCI0.GFX0._DOD").unwrap();
        assert_eq!(
            client.evaluate_value(&dod).unwrap(),
            Some(NamespaceValue::Package(vec![
                NamespaceValue::Integer(0x100),
                NamespaceValue::Integer(0x110)
            ]))
        );
        // Devices carry no value.
        let gfx = Path::parse("_SB_.PCI0.GFX0").unwrap();
        assert_eq!(client.evaluate_value(&gfx).unwrap(), None);
    }

    #[test]
    fn locate_returns_parent() {
        let mut client = Client::new(sample());
        let (object, parent) = client.locate("_DCK").unwrap().unwrap();
        assert_eq!(object.to_string(), "_SB_.DOCK._DCK");
        assert_eq!(parent.to_string(), "_SB_.DOCK");
        assert_eq!(client.locate("_LID").unwrap(), None);
    }

    #[test]
    fn find_objects_in_walk_order() {
        let mut ns = sample();
        ns.insert_value("_SB_.DOCK._HID", NamespaceValue::Integer(0x0C0C_D041))
            .unwrap();
        let mut client = Client::new(ns);
        let found: Vec<String> = client
            .find_objects("_HID")
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(found, ["_SB_.PCI0._HID", "_SB_.DOCK._HID"]);
    }

    #[test]
    fn arguments_reach_the_provider() {
        let mut client = Client::new(sample());
        let dck = Path::parse("_SB_.DOCK._DCK").unwrap();
        let result = client
            .evaluate_with_args(&dck, &[NamespaceValue::Integer(0)])
            .unwrap();
        assert_eq!(result, Some(NamespaceValue::Integer(1)));
        assert_eq!(
            client.channel().last_args(),
            Some(&[NamespaceValue::Integer(0)][..])
        );

        // Arguments are consumed by the evaluate they precede.
        client.evaluate_value(&dck).unwrap();
        assert_eq!(client.channel().last_args(), None);
    }

    #[test]
    fn injected_failures() {
        let mut ns = sample();
        ns.fail_eval("_SB_.PCI0._HID").unwrap();
        ns.fail_children("_SB_.DOCK").unwrap();
        let mut client = Client::new(ns);

        let hid = Path::parse("_SB_.PCI0._HID").unwrap();
        assert!(matches!(
            client.evaluate(&hid),
            Err(ClientError::Transport(TransportError::Failed { op: Operation::Evaluate, .. }))
        ));
        let dock = Path::parse("_SB_.DOCK").unwrap();
        assert!(client.list_children(Some(&dock)).is_err());
        assert_eq!(client.channel().request_count(), 2);
    }

    #[test]
    fn read_without_submit() {
        let mut ns = sample();
        let mut buf = [0u8; 4];
        assert_eq!(ns.read(&mut buf), Err(TransportError::NoPendingResponse));
    }
}
