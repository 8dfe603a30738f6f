//! Walking the AcroForm field hierarchy.
//!
//! The `/Fields` array of the document's interactive form holds the roots of
//! a tree of field dictionaries. Grouping nodes carry `/Kids`; terminal
//! nodes are widget annotations that appear in some page's `/Annots` array.
//! Because `/Parent` is never followed (see [`crate::object`]), inheritable
//! attributes are carried down from groups to their kids during the walk.

use std::collections::HashSet;

use lopdf::Dictionary;

use crate::object::{DecodedArray, DecodedDictionary};

/// Classification of one node of the field tree.
///
/// A node is [`Terminal`](FieldNode::Terminal) when it carries `/Subtype`,
/// or when it is a kid (depth > 0) typed `/Annot`; every other node is a
/// [`Group`](FieldNode::Group).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldNode<'n, 'a> {
    Group(&'n DecodedDictionary<'a>),
    Terminal(&'n DecodedDictionary<'a>),
}

impl<'n, 'a> FieldNode<'n, 'a> {
    /// Classify `dict`, found at `depth` in the tree (`/Fields` entries are
    /// at depth 0).
    pub fn classify(dict: &'n DecodedDictionary<'a>, depth: usize) -> Self {
        let annot_kid = depth > 0 && dict.name("Type") == Some("Annot");
        if dict.contains("Subtype") || annot_kid {
            FieldNode::Terminal(dict)
        } else {
            FieldNode::Group(dict)
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FieldNode::Terminal(_))
    }

    pub fn dictionary(&self) -> &'n DecodedDictionary<'a> {
        match self {
            FieldNode::Group(d) | FieldNode::Terminal(d) => d,
        }
    }
}

/// Inheritable field attributes, accumulated from the root of the field
/// tree down to a terminal node. Values set on a node override the ones it
/// inherits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InheritedAttributes {
    /// `/FT` field type name.
    pub field_type: Option<String>,
    /// `/Ff` field flags.
    pub flags: Option<u32>,
    /// `/V` value, as a name or string.
    pub value: Option<String>,
    /// `/T` partial field name.
    pub name: Option<String>,
    /// `/DA` default appearance string.
    pub default_appearance: Option<String>,
    /// `/Q` quadding.
    pub quadding: Option<i64>,
}

impl InheritedAttributes {
    /// Attributes of `dict`, falling back to `self` for the ones it lacks.
    pub fn merged_with(&self, dict: &DecodedDictionary<'_>) -> Self {
        Self {
            field_type: dict
                .name("FT")
                .map(str::to_string)
                .or_else(|| self.field_type.clone()),
            flags: dict
                .integer("Ff")
                .map(|ff| ff as u32)
                .or(self.flags),
            value: dict
                .text("V")
                .map(str::to_string)
                .or_else(|| self.value.clone()),
            name: dict
                .text("T")
                .map(str::to_string)
                .or_else(|| self.name.clone()),
            default_appearance: dict
                .string("DA")
                .map(str::to_string)
                .or_else(|| self.default_appearance.clone()),
            quadding: dict.integer("Q").or(self.quadding),
        }
    }
}

/// A terminal field reached by the walker, with the attributes it inherits.
#[derive(Debug, Clone)]
pub struct TerminalField<'a> {
    /// The widget (or merged field/widget) dictionary.
    pub dict: DecodedDictionary<'a>,
    /// Attributes of the widget merged over those of its ancestors.
    pub attributes: InheritedAttributes,
    /// Nesting depth; entries of `/Fields` are at depth 0.
    pub depth: usize,
}

/// Counters of one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOutcome {
    /// Terminal fields visited.
    pub terminals: usize,
    /// Groups whose kids were skipped because of the depth limit.
    pub truncated_groups: usize,
    /// Nodes reached again through another `/Kids` entry and skipped.
    pub repeated_nodes: usize,
}

/// Recursive walker over the AcroForm field tree.
#[derive(Debug, Clone, Copy)]
pub struct FieldWalker {
    max_depth: usize,
}

impl FieldWalker {
    /// Walker that stops descending below `max_depth` levels of nesting.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// The `/AcroForm` `/Fields` array of a decoded catalog.
    pub fn acroform_fields<'c, 'a>(catalog: &'c DecodedDictionary<'a>) -> Option<&'c DecodedArray<'a>> {
        catalog.dictionary("AcroForm")?.array("Fields")
    }

    /// Visit every terminal field reachable from `fields`, in tree order.
    pub fn walk<'a, F>(&self, fields: &DecodedArray<'a>, mut visit: F) -> WalkOutcome
    where
        F: FnMut(TerminalField<'a>),
    {
        let mut outcome = WalkOutcome::default();
        let root = InheritedAttributes::default();
        let mut walk = Walk {
            visit: &mut visit,
            outcome: &mut outcome,
            seen: HashSet::new(),
        };
        for field in fields.dictionaries() {
            self.visit_node(field, &root, 0, &mut walk);
        }
        outcome
    }

    /// Collect every terminal field reachable from `fields`.
    pub fn collect<'a>(&self, fields: &DecodedArray<'a>) -> Vec<TerminalField<'a>> {
        let mut terminals = Vec::new();
        self.walk(fields, |t| terminals.push(t));
        terminals
    }

    fn visit_node<'a, F>(
        &self,
        dict: &DecodedDictionary<'a>,
        inherited: &InheritedAttributes,
        depth: usize,
        walk: &mut Walk<'_, F>,
    ) where
        F: FnMut(TerminalField<'a>),
    {
        if !walk.seen.insert(std::ptr::from_ref(dict.raw())) {
            walk.outcome.repeated_nodes += 1;
            return;
        }
        let attributes = inherited.merged_with(dict);
        match FieldNode::classify(dict, depth) {
            FieldNode::Terminal(widget) => {
                walk.outcome.terminals += 1;
                (walk.visit)(TerminalField {
                    dict: widget.clone(),
                    attributes,
                    depth,
                });
            }
            FieldNode::Group(group) => {
                let Some(kids) = group.array("Kids") else {
                    return;
                };
                if depth >= self.max_depth {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        depth,
                        name = attributes.name.as_deref().unwrap_or(""),
                        "field tree nested too deeply, skipping kids"
                    );
                    walk.outcome.truncated_groups += 1;
                    return;
                }
                for kid in kids.dictionaries() {
                    self.visit_node(kid, &attributes, depth + 1, walk);
                }
            }
        }
    }
}

/// State of one walk: the visitor, the counters and the nodes already
/// visited, keyed by dictionary address.
struct Walk<'w, F> {
    visit: &'w mut F,
    outcome: &'w mut WalkOutcome,
    seen: HashSet<*const Dictionary>,
}
