//! Form field discovery: field tree → page → registry.
//!
//! [`discover_form_fields`] walks the AcroForm field tree once, locates the
//! page of every terminal field and registers the instantiated fields per
//! page. Fields that sit on no page or have an unsupported type are counted
//! in the [`DiscoveryReport`] and dropped.

use formflat_core::{FormFieldRegistry, FormOptions};

use crate::field_factory::instantiate;
use crate::field_tree::{FieldWalker, TerminalField};
use crate::object::{DecodedDictionary, document_catalog};
use crate::page_locator::PageLocator;

/// Counters describing one discovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Fields registered on some page.
    pub registered: usize,
    /// Terminal fields that no page's `/Annots` array contains.
    pub unlocated: usize,
    /// Located fields whose type has no renderer, or without a `/Rect`.
    pub unsupported: usize,
    /// Field groups skipped because of the depth limit.
    pub truncated_groups: usize,
}

/// Result of a discovery pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveredForm {
    pub registry: FormFieldRegistry,
    pub report: DiscoveryReport,
}

/// Incremental registration of terminal fields into a [`FormFieldRegistry`].
#[derive(Debug)]
pub struct FormDiscovery<'a> {
    locator: PageLocator<'a>,
    form: DiscoveredForm,
}

impl<'a> FormDiscovery<'a> {
    pub fn new(catalog: &DecodedDictionary<'a>, options: &FormOptions) -> Self {
        Self {
            locator: PageLocator::new(catalog, options.page_numbering),
            form: DiscoveredForm::default(),
        }
    }

    /// Locate, instantiate and register one terminal field.
    ///
    /// Returns the page number the field was registered on.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn register(&mut self, terminal: &TerminalField<'a>) -> Option<u32> {
        let name = terminal.attributes.name.as_deref().unwrap_or("");
        let Some(page) = self.locator.locate(&terminal.dict) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(field = name, "field is not on any page, skipping");
            self.form.report.unlocated += 1;
            return None;
        };
        match instantiate(terminal) {
            Ok(field) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(field = name, page, kind = ?field.kind, "registered form field");
                self.form.registry.insert(page, field);
                self.form.report.registered += 1;
                Some(page)
            }
            Err(skipped) => {
                #[cfg(feature = "tracing")]
                log_skipped(name, &skipped);
                self.form.report.unsupported += 1;
                None
            }
        }
    }

    /// Record groups the walker skipped.
    pub fn record_truncated(&mut self, groups: usize) {
        self.form.report.truncated_groups += groups;
    }

    pub fn finish(self) -> DiscoveredForm {
        self.form
    }
}

#[cfg(feature = "tracing")]
fn log_skipped(name: &str, skipped: &crate::field_factory::Skipped) {
    use crate::field_factory::Skipped;
    match skipped {
        Skipped::UnsupportedType(ft) => tracing::debug!(
            field = name,
            field_type = ft.as_deref().unwrap_or("<none>"),
            "unsupported field type, skipping"
        ),
        Skipped::MissingRect => tracing::debug!(field = name, "field has no /Rect, skipping"),
    }
}

/// Discover every form field of `doc` and bucket them by page.
///
/// A document without a catalog, an `/AcroForm` or `/Fields` yields an
/// empty registry.
pub fn discover_form_fields(doc: &lopdf::Document, options: &FormOptions) -> DiscoveredForm {
    let Some(catalog) = document_catalog(doc) else {
        return DiscoveredForm::default();
    };
    let Some(fields) = FieldWalker::acroform_fields(&catalog) else {
        return DiscoveredForm::default();
    };

    let mut discovery = FormDiscovery::new(&catalog, options);
    let outcome = FieldWalker::new(options.max_field_depth)
        .walk(fields, |terminal| {
            discovery.register(&terminal);
        });
    discovery.record_truncated(outcome.truncated_groups);

    let form = discovery.finish();
    #[cfg(feature = "tracing")]
    tracing::debug!(
        registered = form.report.registered,
        unlocated = form.report.unlocated,
        unsupported = form.report.unsupported,
        "form discovery finished"
    );
    form
}
