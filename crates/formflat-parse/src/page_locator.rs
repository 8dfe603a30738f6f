//! Finding the page that displays a terminal field.

use std::collections::HashSet;

use formflat_core::PageNumbering;
use lopdf::Dictionary;

use crate::object::{DecodedDictionary, DecodedValue};

/// Nesting limit for intermediate `/Pages` nodes.
const MAX_PAGE_TREE_DEPTH: usize = 64;

/// Page tree flattened once into numbered page dictionaries, searched by
/// [`locate`](PageLocator::locate).
///
/// Leaves of the page tree are numbered by their position among all leaves
/// in tree order, following the configured [`PageNumbering`]. Every `/Kids`
/// entry that is not descended into takes a position, including null or
/// dangling entries, so a flat tree numbers exactly like its `/Kids` count.
#[derive(Debug, Clone)]
pub struct PageLocator<'a> {
    pages: Vec<(u32, DecodedDictionary<'a>)>,
    slots: usize,
}

impl<'a> PageLocator<'a> {
    /// Build the locator from the document catalog's `/Pages` tree.
    ///
    /// A catalog without a page tree yields a locator that finds nothing.
    pub fn new(catalog: &DecodedDictionary<'a>, numbering: PageNumbering) -> Self {
        let mut leaves = Vec::new();
        if let Some(root) = catalog.dictionary("Pages") {
            let mut seen = HashSet::from([std::ptr::from_ref(root.raw())]);
            collect_leaves(root, 0, &mut seen, &mut leaves);
        }
        let slots = leaves.len();
        let pages = leaves
            .into_iter()
            .enumerate()
            .filter_map(|(index, page)| Some((numbering.page_number(index, slots), page?)))
            .collect();
        Self { pages, slots }
    }

    /// Number of numbered positions, usable pages or not.
    pub fn page_count(&self) -> usize {
        self.slots
    }

    /// The 1-based number of the page whose `/Annots` array contains a
    /// dictionary structurally equal to `field`, or `None` when no page
    /// does.
    pub fn locate(&self, field: &DecodedDictionary<'a>) -> Option<u32> {
        self.pages.iter().find_map(|(number, page)| {
            let annots = page.array("Annots")?;
            annots
                .dictionaries()
                .any(|annot| annot == field)
                .then_some(*number)
        })
    }
}

/// Append one slot per leaf below `node`. Intermediate nodes are expanded
/// at most once; a repeated or too deeply nested one keeps a single empty
/// slot, as does any entry that is not a dictionary.
fn collect_leaves<'a>(
    node: &DecodedDictionary<'a>,
    depth: usize,
    seen: &mut HashSet<*const Dictionary>,
    leaves: &mut Vec<Option<DecodedDictionary<'a>>>,
) {
    let Some(kids) = node.array("Kids") else {
        return;
    };
    for entry in kids.positions() {
        let Some(kid) = entry.as_ref().and_then(DecodedValue::as_dictionary) else {
            leaves.push(None);
            continue;
        };
        let is_intermediate = kid.name("Type") == Some("Pages") || kid.contains("Kids");
        if !is_intermediate {
            leaves.push(Some(kid.clone()));
        } else if !seen.insert(std::ptr::from_ref(kid.raw())) {
            #[cfg(feature = "tracing")]
            tracing::warn!(depth, "page tree node repeated, skipping subtree");
            leaves.push(None);
        } else if depth < MAX_PAGE_TREE_DEPTH {
            collect_leaves(kid, depth + 1, seen, leaves);
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!(depth, "page tree nested too deeply, skipping subtree");
            leaves.push(None);
        }
    }
}
