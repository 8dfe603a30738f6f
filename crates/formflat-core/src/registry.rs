//! Per-page registry of discovered form fields.

use std::collections::BTreeMap;

use crate::FormFieldInstance;

/// Form field instances bucketed by 1-based page number.
///
/// Built once by discovery, then owned by whoever edits field values. The
/// flattening renderer only reads it.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormFieldRegistry {
    pages: BTreeMap<u32, Vec<FormFieldInstance>>,
}

impl FormFieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field to the bucket of `page`, creating the bucket if needed.
    pub fn insert(&mut self, page: u32, field: FormFieldInstance) {
        self.pages.entry(page).or_default().push(field);
    }

    /// Fields shown on `page`, in registration order. Empty when the page
    /// has no fields.
    pub fn fields_for_page(&self, page: u32) -> &[FormFieldInstance] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mutable access to the fields of `page`, for value edits.
    pub fn fields_for_page_mut(&mut self, page: u32) -> &mut [FormFieldInstance] {
        self.pages
            .get_mut(&page)
            .map(Vec::as_mut_slice)
            .unwrap_or(&mut [])
    }

    /// Page numbers that have at least one field, ascending.
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    /// All fields with their page numbers, ordered by page.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &FormFieldInstance)> {
        self.pages
            .iter()
            .flat_map(|(page, fields)| fields.iter().map(move |f| (*page, f)))
    }

    /// Mutable iteration over every field, ordered by page.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut FormFieldInstance)> {
        self.pages
            .iter_mut()
            .flat_map(|(page, fields)| fields.iter_mut().map(move |f| (*page, f)))
    }

    /// Set the value of every field named `name`, on any page.
    ///
    /// Widgets of one radio group share a name, so this selects the widget
    /// whose export value equals `value` and deselects the others. Returns
    /// the number of instances updated.
    pub fn set_value_by_name(&mut self, name: &str, value: &str) -> usize {
        let mut updated = 0;
        for (_, field) in self.iter_mut() {
            if field.name == name {
                field.set_value(value);
                updated += 1;
            }
        }
        updated
    }

    /// Total number of registered fields.
    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.values().all(Vec::is_empty)
    }
}
