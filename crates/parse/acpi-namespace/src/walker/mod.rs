//! Depth-first namespace walker.
//!
//! [`Walk`] lists the children of a starting path, classifies each one as a
//! subtree (devices, processors, thermal zones, power resources) or a
//! leaf, and yields a [`TreeLine`] per entry. Subtrees are entered before
//! their next sibling is visited.
//!
//! The traversal keeps an explicit stack of frames, one per level, each
//! holding the listing for that level and how many of its entries are
//! still to be printed. Branch glyphs for a line are computed from the
//! whole stack. Failures at a single node become placeholders; only a
//! failure to list the starting path is reported as an error.

pub mod glyph;
pub mod render;

use core::fmt;

use log::warn;
use thiserror::Error;

use crate::channel::{Channel, Client, ClientError};
use crate::object::ObjectType;
use crate::path::Path;

pub use render::{Rendered, Renderer};

/// Default limit on the depth of the walk.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Errors that end a walk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalkError {
    /// The starting path could not be listed.
    #[error("cannot list children of {path:?}: {source}")]
    InitialListing {
        /// The starting path (empty for the root).
        path: String,
        /// The underlying failure.
        source: ClientError,
    },
    /// The namespace nests deeper than the configured limit, which points
    /// at a cyclic or misbehaving provider.
    #[error("namespace deeper than {limit} levels below {path}")]
    DepthExceeded {
        /// The subtree that would have been entered.
        path: String,
        /// The configured limit.
        limit: usize,
    },
}

/// Walk configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Deepest level whose entries may be printed.
    pub max_depth: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Whether an entry's children are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    /// Children are listed beneath the entry.
    Subtree,
    /// The entry is shown with its value, if any.
    Leaf,
}

/// One entry of the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    /// Level of the entry; children of the starting path are at depth 1.
    pub depth: usize,
    /// Branch glyphs preceding the name.
    pub prefix: String,
    /// Prefix for additional rows printed under this entry.
    pub continuation: String,
    /// The entry's own segment name.
    pub name: String,
    /// Full path of the entry.
    pub path: Path,
    /// Subtree or leaf.
    pub class: NodeClass,
    /// Reported type, or `None` when the type query failed.
    pub kind: Option<ObjectType>,
    /// Rendered content.
    pub value: Rendered,
}

impl TreeLine {
    /// Returns the type label shown in brackets.
    #[must_use]
    pub fn type_label(&self) -> &'static str {
        self.kind.map_or(ObjectType::NotFound.name(), ObjectType::name)
    }
}

impl fmt::Display for TreeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{} [{}]",
            self.prefix,
            self.name,
            self.value,
            self.type_label()
        )?;
        if let Rendered::HexDump(bytes) = &self.value {
            for (row, chunk) in bytes.chunks(render::HEX_ROW_LEN).enumerate() {
                write!(f, "\n{}\t{:04x}:", self.continuation, row * render::HEX_ROW_LEN)?;
                for byte in chunk {
                    write!(f, " {byte:02x}")?;
                }
            }
        }
        Ok(())
    }
}

/// One level of the traversal.
struct Frame {
    path: Path,
    children: Vec<String>,
    /// Index of the next child to emit.
    next: usize,
    /// Entries at this level not yet finished, counting a subtree entry
    /// until its children are exhausted.
    remaining: usize,
}

impl Frame {
    fn new(path: Path, children: Vec<String>) -> Self {
        Self {
            remaining: children.len(),
            path,
            children,
            next: 0,
        }
    }
}

/// Entry point for walking a namespace through a [`Client`].
pub struct Walker<'c, C> {
    client: &'c mut Client<C>,
    options: WalkOptions,
}

impl<'c, C: Channel> Walker<'c, C> {
    /// Creates a walker with default options.
    pub fn new(client: &'c mut Client<C>) -> Self {
        Self {
            client,
            options: WalkOptions::default(),
        }
    }

    /// Replaces the walk options.
    #[must_use]
    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    /// Starts a walk below `root` (`None` for the namespace root).
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::InitialListing`] if the children of `root`
    /// cannot be listed.
    pub fn walk(&mut self, root: Option<&Path>) -> Result<Walk<'_, C>, WalkError> {
        let start = root.cloned().unwrap_or_default();
        let children = self
            .client
            .list_children(Some(&start))
            .map_err(|source| WalkError::InitialListing {
                path: start.to_string(),
                source,
            })?;

        Ok(Walk {
            client: &mut *self.client,
            stack: vec![Frame::new(start, children)],
            max_depth: self.options.max_depth,
            error: None,
        })
    }
}

/// A lazy depth-first traversal. See the [module docs](self).
pub struct Walk<'w, C> {
    client: &'w mut Client<C>,
    stack: Vec<Frame>,
    max_depth: usize,
    /// Set when the walk must stop; yielded once, then the walk ends.
    error: Option<WalkError>,
}

impl<C: Channel> Walk<'_, C> {
    /// Marks the current entry of the innermost level as finished.
    fn finish_entry(&mut self) {
        if let Some(frame) = self.stack.last_mut() {
            frame.remaining = frame.remaining.saturating_sub(1);
        }
    }

    /// Pops every level whose children have all been emitted.
    fn pop_exhausted(&mut self) {
        while let Some(frame) = self.stack.last() {
            if frame.next < frame.children.len() {
                break;
            }
            self.stack.pop();
            // The subtree entry that owned the popped frame is now done.
            self.finish_entry();
        }
    }

    fn kind_of(&mut self, path: &Path) -> Option<ObjectType> {
        match self.client.get_kind(path) {
            Ok(kind) => Some(kind),
            Err(e) => {
                warn!("{path}: type query failed: {e}");
                None
            }
        }
    }

    fn emit(&mut self) -> Option<TreeLine> {
        self.pop_exhausted();
        let depth = self.stack.len();
        let frame = self.stack.last_mut()?;

        let name = frame.children[frame.next].clone();
        frame.next += 1;
        let parent = frame.path.clone();

        let ancestors: Vec<usize> = self.stack[..depth - 1].iter().map(|f| f.remaining).collect();
        let remaining = self.stack[depth - 1].remaining;
        let prefix = glyph::branch_prefix(&ancestors, remaining);
        let continuation = glyph::continuation_prefix(&ancestors, remaining);

        let path = match parent.child(&name) {
            Ok(path) => path,
            Err(e) => {
                warn!("{parent}: bad child name {name:?}: {e}");
                self.finish_entry();
                return Some(TreeLine {
                    depth,
                    prefix,
                    continuation,
                    name,
                    path: parent,
                    class: NodeClass::Leaf,
                    kind: None,
                    value: Rendered::Failed(e.to_string()),
                });
            }
        };

        let kind = self.kind_of(&path);
        let class = if kind.is_some_and(ObjectType::is_container) {
            NodeClass::Subtree
        } else {
            NodeClass::Leaf
        };

        let value = match class {
            NodeClass::Subtree => {
                self.descend(&path, depth);
                Rendered::None
            }
            NodeClass::Leaf => {
                let rendered = match render::select(&name, kind) {
                    Some(renderer) => render::render(renderer, self.client, &path),
                    None => Rendered::None,
                };
                self.finish_entry();
                rendered
            }
        };

        Some(TreeLine {
            depth,
            prefix,
            continuation,
            name,
            path,
            class,
            kind,
            value,
        })
    }

    /// Pushes a frame for the children of the subtree at `path`, found at
    /// `depth`. On failure the entry is finished immediately.
    fn descend(&mut self, path: &Path, depth: usize) {
        if depth >= self.max_depth {
            self.error = Some(WalkError::DepthExceeded {
                path: path.to_string(),
                limit: self.max_depth,
            });
            self.finish_entry();
            return;
        }

        match self.client.list_children(Some(path)) {
            Ok(children) if !children.is_empty() => {
                self.stack.push(Frame::new(path.clone(), children));
            }
            Ok(_) => self.finish_entry(),
            Err(e) => {
                warn!("{path}: cannot list children: {e}");
                self.finish_entry();
            }
        }
    }
}

impl<C: Channel> Iterator for Walk<'_, C> {
    type Item = Result<TreeLine, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.error.take() {
            self.stack.clear();
            return Some(Err(error));
        }
        self.emit().map(Ok)
    }
}
