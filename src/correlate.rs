//! Correlation of a shipment payload with the lines of a host document.
//!
//! A run has three phases:
//!
//! 1. the payload is normalised and grouped by SKU;
//! 2. the document lines are walked in order, consuming units from the
//!    groups and planning what each line receives;
//! 3. every planned identifier is resolved against the host.
//!
//! The document is only written once all three phases have succeeded, so a
//! failed run leaves it exactly as it was.

use std::num::NonZeroUsize;

use serde::Serialize;
use tracing::instrument;

use crate::{
    Error,
    domain::{
        AssignedIdentifier, Document, DocumentKind, DocumentLine, LineRole, ProviderProfile, Sku,
        SkuGroups, commit, group::GroupIndex,
    },
    host::{IdentifierResolver, SkuLookup},
};

mod strategy;
use strategy::Strategy;

/// What correlation did to one document line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineOutcome {
    /// The line received a quantity and, possibly, identifiers.
    Assigned {
        /// The committed quantity.
        quantity: Option<u32>,
        /// The identifiers written to the line, in consumption order.
        identifiers: Vec<AssignedIdentifier>,
    },
    /// The line was left as the host suggested.
    Skipped(SkipReason),
}

/// Why a line was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// The line does not carry inventory detail.
    Untracked,
    /// Nothing with the line's SKU was shipped.
    NotShipped,
    /// The line's kit was not shipped.
    KitNotShipped,
    /// A component line with no kit parent before it.
    NoKit,
    /// The shipped kit has no bundle data for this component.
    NoComponentData,
    /// The provider reports no identifiers.
    QuantityOnly,
}

/// Units of one SKU no document line consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unconsumed {
    /// The SKU.
    pub sku: Sku,
    /// Number of units left over.
    pub units: usize,
}

/// The result of a successful correlation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelationOutcome {
    /// One outcome per document line, in line order.
    pub lines: Vec<LineOutcome>,
    /// Payload units that matched no line.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unconsumed: Vec<Unconsumed>,
}

impl CorrelationOutcome {
    /// Total number of identifiers assigned.
    #[must_use]
    pub fn identifiers_assigned(&self) -> usize {
        self.lines
            .iter()
            .map(|line| match line {
                LineOutcome::Assigned { identifiers, .. } => identifiers.len(),
                LineOutcome::Skipped(_) => 0,
            })
            .sum()
    }
}

/// A kit whose component lines are being processed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Kit {
    group: GroupIndex,
    committed: u32,
    dequeued: bool,
}

/// Where the line walk stands.
#[derive(Debug, Clone, Copy)]
enum Cursor {
    /// Outside any kit.
    Idle,
    /// Inside a kit that has no shipment data.
    Unmatched,
    /// Inside a shipped kit.
    Kit(Kit),
}

/// A document line as seen by a strategy.
pub(crate) struct Line<'a> {
    index: usize,
    sku: Option<&'a Sku>,
    position: NonZeroUsize,
}

/// What a line will receive, before identifiers are resolved.
#[derive(Debug)]
pub(crate) enum Planned {
    Assign {
        quantity: Option<u32>,
        raw: Vec<String>,
    },
    Skip(SkipReason),
}

/// Correlates payloads with documents using host lookups.
pub struct Correlator<'h> {
    skus: &'h dyn SkuLookup,
    resolver: &'h dyn IdentifierResolver,
}

impl<'h> Correlator<'h> {
    /// Creates a correlator backed by the given host capabilities.
    #[must_use]
    pub fn new(skus: &'h dyn SkuLookup, resolver: &'h dyn IdentifierResolver) -> Self {
        Self { skus, resolver }
    }

    /// Assigns the units declared in `raw_payload` to the lines of `document`.
    ///
    /// Lines are walked in order. A kit parent line selects the group of its
    /// SKU and commits a quantity; the component lines that follow draw their
    /// identifiers from that group according to the provider's variant.
    /// Stand-alone lines draw from their own group. Lines with no matching
    /// group keep the host's suggested quantity.
    ///
    /// # Errors
    ///
    /// - [`Error::Payload`] if the payload is malformed, empty, or has a blank
    ///   SKU the provider requires
    /// - [`Error::UnsupportedKit`] if a kit has more components than the
    ///   provider reports identifiers for
    /// - [`Error::UnitWithoutIdentifier`] if a kit unit lacks the identifier a
    ///   component needs
    /// - [`Error::IdentifierNotFound`] if a fulfilment identifier does not
    ///   exist on the host
    /// - [`Error::Host`] if a host lookup fails
    ///
    /// On error `document` is unchanged.
    #[instrument(skip_all, fields(kind = %document.kind, variant = ?profile.variant))]
    pub fn correlate(
        &self,
        document: &mut Document,
        raw_payload: &str,
        profile: &ProviderProfile,
    ) -> Result<CorrelationOutcome, Error> {
        let strategy = strategy::for_variant(profile.variant);
        let units = strategy.units(raw_payload, profile)?;
        tracing::debug!(units = units.len(), "normalised payload");

        let mut groups = SkuGroups::from_units(units);
        let plan = self.plan(&document.lines, &mut groups, strategy, profile)?;
        let lines = self.resolve(document, plan)?;

        for (line, outcome) in document.lines.iter_mut().zip(&lines) {
            if let LineOutcome::Assigned {
                quantity,
                identifiers,
            } = outcome
            {
                line.quantity = *quantity;
                line.identifiers.clone_from(identifiers);
            }
        }

        let unconsumed: Vec<_> = groups
            .iter()
            .filter(|group| !group.is_empty())
            .map(|group| Unconsumed {
                sku: group.name().clone(),
                units: group.len(),
            })
            .collect();

        let outcome = CorrelationOutcome { lines, unconsumed };
        tracing::info!(
            lines = outcome.lines.len(),
            identifiers = outcome.identifiers_assigned(),
            unconsumed = outcome.unconsumed.len(),
            "correlated document"
        );
        Ok(outcome)
    }

    fn plan(
        &self,
        lines: &[DocumentLine],
        groups: &mut SkuGroups,
        strategy: &dyn Strategy,
        profile: &ProviderProfile,
    ) -> Result<Vec<Planned>, Error> {
        let mut cursor = Cursor::Idle;
        let mut plan = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            let sku = match line.role {
                LineRole::Untracked => None,
                _ => self.skus.lookup_item_sku(&line.item)?,
            };
            let current = Line {
                index,
                sku: sku.as_ref(),
                position: line.component_position.unwrap_or(NonZeroUsize::MIN),
            };

            let planned = match line.role {
                LineRole::Untracked => Planned::Skip(SkipReason::Untracked),
                LineRole::KitParent => {
                    close(cursor, groups, strategy);
                    let (next, planned) = open_kit(line, &current, groups, strategy);
                    cursor = next;
                    planned
                }
                LineRole::Component => match &mut cursor {
                    Cursor::Kit(kit) => {
                        strategy.component(groups.get_mut(kit.group), kit, &current, profile)?
                    }
                    Cursor::Unmatched => Planned::Skip(SkipReason::KitNotShipped),
                    Cursor::Idle => Planned::Skip(SkipReason::NoKit),
                },
                LineRole::Standalone => {
                    close(cursor, groups, strategy);
                    cursor = Cursor::Idle;
                    standalone(line, &current, groups, strategy, profile)
                }
            };

            tracing::debug!(
                line = index,
                role = ?line.role,
                sku = ?current.sku.map(Sku::as_str),
                ?planned,
                "planned line"
            );
            plan.push(planned);
        }

        close(cursor, groups, strategy);
        Ok(plan)
    }

    fn resolve(&self, document: &Document, plan: Vec<Planned>) -> Result<Vec<LineOutcome>, Error> {
        plan.into_iter()
            .zip(&document.lines)
            .enumerate()
            .map(|(index, (planned, line))| -> Result<_, Error> {
                Ok(match planned {
                    Planned::Skip(reason) => LineOutcome::Skipped(reason),
                    Planned::Assign { quantity, raw } => LineOutcome::Assigned {
                        quantity,
                        identifiers: self.assign(document.kind, index, line, raw)?,
                    },
                })
            })
            .collect()
    }

    /// Fulfilments issue existing inventory numbers, which must exist on the
    /// host. Receipts record the raw numbers.
    fn assign(
        &self,
        kind: DocumentKind,
        index: usize,
        line: &DocumentLine,
        raw: Vec<String>,
    ) -> Result<Vec<AssignedIdentifier>, Error> {
        if !kind.issues_inventory() {
            return Ok(raw.into_iter().map(AssignedIdentifier::Received).collect());
        }

        let mut identifiers = Vec::with_capacity(raw.len());
        for value in raw {
            let Some(id) = self.resolver.resolve_identifier(&value, &line.item)? else {
                return Err(Error::IdentifierNotFound {
                    value,
                    item: line.item.clone(),
                    line: index,
                });
            };
            identifiers.push(AssignedIdentifier::Issued(id));
        }
        Ok(identifiers)
    }
}

fn open_kit(
    line: &DocumentLine,
    current: &Line<'_>,
    groups: &SkuGroups,
    strategy: &dyn Strategy,
) -> (Cursor, Planned) {
    let Some(index) = current.sku.and_then(|sku| groups.position(sku)) else {
        tracing::warn!(line = current.index, item = %line.item, "kit was not shipped");
        return (Cursor::Unmatched, Planned::Skip(SkipReason::NotShipped));
    };

    let available = strategy.kit_available(groups.get(index));
    let committed = commit(line.requested_quantity, available);
    tracing::debug!(line = current.index, available, committed, "opened kit");

    let kit = Kit {
        group: index,
        committed,
        dequeued: false,
    };
    let planned = Planned::Assign {
        quantity: Some(committed),
        raw: Vec::new(),
    };
    (Cursor::Kit(kit), planned)
}

fn close(cursor: Cursor, groups: &mut SkuGroups, strategy: &dyn Strategy) {
    if let Cursor::Kit(kit) = cursor {
        strategy.close_kit(groups.get_mut(kit.group), &kit);
    }
}

fn standalone(
    line: &DocumentLine,
    current: &Line<'_>,
    groups: &mut SkuGroups,
    strategy: &dyn Strategy,
    profile: &ProviderProfile,
) -> Planned {
    let own = current.sku.and_then(|sku| groups.position(sku));
    let index = own.or_else(|| {
        let fallback = profile.standalone_fallback_sku.as_ref()?;
        let index = groups.position(fallback)?;
        tracing::debug!(line = current.index, %fallback, "using fallback group");
        Some(index)
    });
    let Some(index) = index else {
        return Planned::Skip(SkipReason::NotShipped);
    };

    let group = groups.get_mut(index);
    let committed = commit(line.requested_quantity, group.declared_quantity());
    let raw = strategy.standalone(group, committed);
    Planned::Assign {
        quantity: Some(committed),
        raw,
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::{
        domain::{InventoryId, ItemRef, ProviderVariant},
        host::memory::Catalog,
        payload::PayloadError,
    };

    const KIT_PAYLOAD: &str = r#"[
        {"Barcode": "KIT", "SerialNo": "S1", "BatchNo": "B1", "Quantity": 1},
        {"Barcode": "KIT", "SerialNo": "S2", "BatchNo": "B2", "Quantity": 1}
    ]"#;

    fn sku(code: &str) -> Sku {
        Sku::new(code).unwrap()
    }

    fn line(item: &str, role: LineRole, requested: Option<u32>) -> DocumentLine {
        DocumentLine::new(ItemRef::new(item), role, requested)
    }

    /// Items are named after their SKU; every inventory number `X` resolves
    /// to `id-X`.
    fn catalog(items: &[&str], numbers: &[&str]) -> Catalog {
        let catalog = items
            .iter()
            .fold(Catalog::default(), |c, item| c.with_sku(item, sku(item)));
        numbers
            .iter()
            .fold(catalog, |c, n| c.with_inventory(n, &format!("id-{n}")))
    }

    fn issued(ids: &[&str]) -> Vec<AssignedIdentifier> {
        ids.iter()
            .map(|id| AssignedIdentifier::Issued(InventoryId::new(format!("id-{id}"))))
            .collect()
    }

    fn kit_document(requested: Option<u32>) -> Document {
        Document::from_lines(
            DocumentKind::ItemFulfillment,
            [
                line("KIT", LineRole::KitParent, requested),
                line("BRACELET", LineRole::Component, None),
                line("CUFF", LineRole::Component, None),
            ],
        )
    }

    #[test]
    fn kit_components_share_one_dequeue() {
        let host = catalog(&["KIT"], &["S1", "S2", "B1", "B2"]);
        let mut document = kit_document(Some(2));

        let outcome = Correlator::new(&host, &host)
            .correlate(&mut document, KIT_PAYLOAD, &ProviderProfile::ogl())
            .unwrap();

        assert_eq!(document.lines[0].quantity, Some(2));
        assert_eq!(document.lines[1].identifiers, issued(&["S1", "S2"]));
        assert_eq!(document.lines[2].identifiers, issued(&["B1", "B2"]));
        assert!(outcome.unconsumed.is_empty());
        assert_eq!(outcome.identifiers_assigned(), 4);
    }

    #[test]
    fn second_kit_continues_from_the_queue() {
        let host = catalog(&["KIT"], &["S1", "S2", "B1", "B2"]);
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [
                line("KIT", LineRole::KitParent, Some(1)),
                line("BRACELET", LineRole::Component, None),
                line("CUFF", LineRole::Component, None),
                line("KIT", LineRole::KitParent, Some(1)),
                line("BRACELET", LineRole::Component, None),
                line("CUFF", LineRole::Component, None),
            ],
        );

        Correlator::new(&host, &host)
            .correlate(&mut document, KIT_PAYLOAD, &ProviderProfile::ogl())
            .unwrap();

        assert_eq!(document.lines[1].identifiers, issued(&["S1"]));
        assert_eq!(document.lines[2].identifiers, issued(&["B1"]));
        assert_eq!(document.lines[4].identifiers, issued(&["S2"]));
        assert_eq!(document.lines[5].identifiers, issued(&["B2"]));
    }

    #[test]
    fn single_component_kit_still_dequeues() {
        let host = catalog(&["KIT"], &["S1", "S2"]);
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [
                line("KIT", LineRole::KitParent, Some(1)),
                line("BRACELET", LineRole::Component, None),
                line("KIT", LineRole::KitParent, Some(1)),
                line("BRACELET", LineRole::Component, None),
            ],
        );

        let outcome = Correlator::new(&host, &host)
            .correlate(&mut document, KIT_PAYLOAD, &ProviderProfile::ogl())
            .unwrap();

        assert_eq!(document.lines[1].identifiers, issued(&["S1"]));
        assert_eq!(document.lines[3].identifiers, issued(&["S2"]));
        assert!(outcome.unconsumed.is_empty());
    }

    #[test_case(Some(5), 3; "request above available is truncated")]
    #[test_case(Some(2), 2; "request below available")]
    #[test_case(None, 3; "no request takes everything")]
    #[test_case(Some(0), 3; "zero request takes everything")]
    fn standalone_quantity(requested: Option<u32>, expected: u32) {
        let payload = r#"[
            {"Barcode": "BRACELET", "SerialNo": "S1"},
            {"Barcode": "BRACELET", "SerialNo": "S2"},
            {"Barcode": "BRACELET", "SerialNo": "S3"}
        ]"#;
        let host = catalog(&["BRACELET"], &["S1", "S2", "S3"]);
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [line("BRACELET", LineRole::Standalone, requested)],
        );

        Correlator::new(&host, &host)
            .correlate(&mut document, payload, &ProviderProfile::ogl())
            .unwrap();

        let expected_ids: Vec<_> = ["S1", "S2", "S3"][..usize::try_from(expected).unwrap()].to_vec();
        assert_eq!(document.lines[0].quantity, Some(expected));
        assert_eq!(document.lines[0].identifiers, issued(&expected_ids));
    }

    #[test_case(Some(5), 5; "request within the total")]
    #[test_case(None, u32::MAX; "total saturates")]
    fn standalone_quantities_beyond_u32(requested: Option<u32>, expected: u32) {
        let payload = r#"[
            {"Barcode": "STRAP", "Quantity": 3000000000},
            {"Barcode": "STRAP", "Quantity": 3000000000}
        ]"#;
        let host = catalog(&["STRAP"], &[]);
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [line("STRAP", LineRole::Standalone, requested)],
        );

        Correlator::new(&host, &host)
            .correlate(&mut document, payload, &ProviderProfile::ogl())
            .unwrap();

        assert_eq!(document.lines[0].quantity, Some(expected));
        assert!(document.lines[0].identifiers.is_empty());
    }

    #[test]
    fn kit_request_above_available_is_truncated() {
        let host = catalog(&["KIT"], &["S1", "S2", "B1", "B2"]);
        let mut document = kit_document(Some(5));

        Correlator::new(&host, &host)
            .correlate(&mut document, KIT_PAYLOAD, &ProviderProfile::ogl())
            .unwrap();

        assert_eq!(document.lines[0].quantity, Some(2));
        assert_eq!(document.lines[1].quantity, Some(2));
        assert_eq!(document.lines[1].identifiers.len(), 2);
    }

    #[test]
    fn batch_number_backs_up_missing_serial() {
        let payload = r#"[{"Barcode": "STRAP", "SerialNo": null, "BatchNo": "LOT-7"}]"#;
        let host = catalog(&["STRAP"], &["LOT-7"]);
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [line("STRAP", LineRole::Standalone, Some(1))],
        );

        Correlator::new(&host, &host)
            .correlate(&mut document, payload, &ProviderProfile::ogl())
            .unwrap();

        assert_eq!(document.lines[0].identifiers, issued(&["LOT-7"]));
    }

    #[test]
    fn sku_absent_from_document_is_left_over() {
        let payload = r#"[
            {"Barcode": "KIT", "SerialNo": "S1", "BatchNo": "B1"},
            {"Barcode": "X", "SerialNo": "X1"}
        ]"#;
        let host = catalog(&["KIT"], &["S1", "B1"]);
        let mut document = kit_document(Some(1));

        let outcome = Correlator::new(&host, &host)
            .correlate(&mut document, payload, &ProviderProfile::ogl())
            .unwrap();

        assert_eq!(
            outcome.unconsumed,
            vec![Unconsumed {
                sku: sku("X"),
                units: 1
            }]
        );
    }

    #[test]
    fn unshipped_kit_leaves_components_alone() {
        let payload = r#"[{"Barcode": "OTHER", "SerialNo": "O1"}]"#;
        let host = catalog(&["KIT", "OTHER"], &["O1"]);
        let mut document = kit_document(Some(3));
        let before = document.clone();

        let outcome = Correlator::new(&host, &host)
            .correlate(&mut document, payload, &ProviderProfile::ogl())
            .unwrap();

        assert_eq!(document, before);
        assert_eq!(
            outcome.lines,
            vec![
                LineOutcome::Skipped(SkipReason::NotShipped),
                LineOutcome::Skipped(SkipReason::KitNotShipped),
                LineOutcome::Skipped(SkipReason::KitNotShipped),
            ]
        );
    }

    #[test]
    fn component_without_parent_is_skipped() {
        let host = catalog(&["KIT"], &["S1", "S2"]);
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [line("BRACELET", LineRole::Component, Some(1))],
        );

        let outcome = Correlator::new(&host, &host)
            .correlate(&mut document, KIT_PAYLOAD, &ProviderProfile::ogl())
            .unwrap();

        assert_eq!(outcome.lines, vec![LineOutcome::Skipped(SkipReason::NoKit)]);
    }

    #[test]
    fn untracked_lines_inside_a_kit_are_ignored() {
        let host = catalog(&["KIT"], &["S1", "S2", "B1", "B2"]);
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [
                line("KIT", LineRole::KitParent, Some(2)),
                line("BRACELET", LineRole::Component, None),
                line("MANUAL", LineRole::Untracked, None),
                line("CUFF", LineRole::Component, None),
            ],
        );

        Correlator::new(&host, &host)
            .correlate(&mut document, KIT_PAYLOAD, &ProviderProfile::ogl())
            .unwrap();

        assert!(document.lines[2].identifiers.is_empty());
        assert_eq!(document.lines[3].identifiers, issued(&["B1", "B2"]));
    }

    #[test]
    fn malformed_payload_touches_nothing() {
        let host = catalog(&["KIT"], &[]);
        let mut document = kit_document(Some(2));
        let before = document.clone();

        let error = Correlator::new(&host, &host)
            .correlate(&mut document, r#"[{"Barcode": "KIT""#, &ProviderProfile::ogl())
            .unwrap_err();

        assert!(matches!(error, Error::Payload(PayloadError::Malformed(_))));
        assert_eq!(document, before);
    }

    #[test]
    fn empty_payload_is_rejected() {
        let host = catalog(&["KIT"], &[]);
        let mut document = kit_document(Some(2));

        let error = Correlator::new(&host, &host)
            .correlate(&mut document, "[]", &ProviderProfile::ogl())
            .unwrap_err();

        assert!(matches!(error, Error::Payload(PayloadError::Empty)));
    }

    #[test]
    fn unknown_serial_aborts_without_mutation() {
        let host = catalog(&["KIT"], &["S1", "S2", "B1"]);
        let mut document = kit_document(Some(2));
        let before = document.clone();

        let error = Correlator::new(&host, &host)
            .correlate(&mut document, KIT_PAYLOAD, &ProviderProfile::ogl())
            .unwrap_err();

        match &error {
            Error::IdentifierNotFound { value, line, .. } => {
                assert_eq!(value, "B2");
                assert_eq!(*line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(error.user_message().contains("Wrong serial number (B2)"));
        assert_eq!(document, before);
    }

    #[test]
    fn receipts_record_raw_numbers() {
        let host = catalog(&["KIT"], &[]);
        let mut document = kit_document(Some(2));
        document.kind = DocumentKind::ItemReceipt;

        Correlator::new(&host, &host)
            .correlate(&mut document, KIT_PAYLOAD, &ProviderProfile::ogl())
            .unwrap();

        assert_eq!(
            document.lines[1].identifiers,
            vec![
                AssignedIdentifier::Received("S1".into()),
                AssignedIdentifier::Received("S2".into()),
            ]
        );
    }

    #[test]
    fn third_component_exceeds_kit_pair_slots() {
        let host = catalog(&["KIT"], &["S1", "S2", "B1", "B2"]);
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [
                line("KIT", LineRole::KitParent, Some(2)),
                line("BRACELET", LineRole::Component, None),
                line("CUFF", LineRole::Component, None),
                line("BOX", LineRole::Component, None),
            ],
        );

        let error = Correlator::new(&host, &host)
            .correlate(&mut document, KIT_PAYLOAD, &ProviderProfile::ogl())
            .unwrap_err();

        assert!(matches!(error, Error::UnsupportedKit { position, .. } if position.get() == 3));
    }

    #[test]
    fn kit_unit_missing_batch_number() {
        let payload = r#"[{"Barcode": "KIT", "SerialNo": "S1"}]"#;
        let host = catalog(&["KIT"], &["S1"]);
        let mut document = kit_document(Some(1));

        let error = Correlator::new(&host, &host)
            .correlate(&mut document, payload, &ProviderProfile::ogl())
            .unwrap_err();

        assert!(matches!(error, Error::UnitWithoutIdentifier { line: 2, .. }));
    }

    #[test]
    fn returned_component_falls_back_to_kit_group() {
        let payload = r#"[{"ReturnItems": [{"Barcode": "KIT", "SerialNo": "S1", "BatchNo": "B1"}]}]"#;
        let host = catalog(&["BRACELET", "KIT"], &[]);
        let mut document = Document::from_lines(
            DocumentKind::ItemReceipt,
            [line("BRACELET", LineRole::Standalone, Some(1))],
        );
        let profile = ProviderProfile {
            standalone_fallback_sku: Some(sku("KIT")),
            ..ProviderProfile::ogl()
        };

        Correlator::new(&host, &host)
            .correlate(&mut document, payload, &profile)
            .unwrap();

        assert_eq!(
            document.lines[0].identifiers,
            vec![AssignedIdentifier::Received("S1".into())]
        );
    }

    #[test]
    fn without_fallback_the_line_is_not_shipped() {
        let payload = r#"[{"Barcode": "KIT", "SerialNo": "S1", "BatchNo": "B1"}]"#;
        let host = catalog(&["BRACELET", "KIT"], &[]);
        let mut document = Document::from_lines(
            DocumentKind::ItemReceipt,
            [line("BRACELET", LineRole::Standalone, Some(1))],
        );

        let outcome = Correlator::new(&host, &host)
            .correlate(&mut document, payload, &ProviderProfile::ogl())
            .unwrap();

        assert_eq!(
            outcome.lines,
            vec![LineOutcome::Skipped(SkipReason::NotShipped)]
        );
    }

    const BUNDLED_PAYLOAD: &str = r#"{
        "OrderNumber": "24161",
        "OrderItems": [
            {"SKU": "KITNS", "Quantity": 2, "bundles": [
                {"bundleNo": "21D1", "items": [
                    {"SKU": "G1", "Quantity": 1, "SerialNumbers": ["21D1"]},
                    {"SKU": "I1", "Quantity": 1, "SerialNumbers": ["21BA-2003"]}
                ]},
                {"bundleNo": "218E", "items": [
                    {"SKU": "G1", "Quantity": 1, "SerialNumbers": ["218E"]},
                    {"SKU": "I1", "Quantity": 1, "SerialNumbers": ["21BA-1747"]}
                ]}
            ]},
            {"SKU": "I1", "Quantity": 1, "SerialNumbers": ["21BA-1729"]}
        ]
    }"#;

    #[test]
    fn bundled_kit_components_take_their_own_serials() {
        let host = catalog(
            &["KITNS", "G1", "I1"],
            &["21D1", "218E", "21BA-2003", "21BA-1747", "21BA-1729"],
        );
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [
                line("KITNS", LineRole::KitParent, Some(2)),
                line("G1", LineRole::Component, None),
                line("I1", LineRole::Component, None),
                line("I1", LineRole::Standalone, Some(1)),
            ],
        );

        let outcome = Correlator::new(&host, &host)
            .correlate(&mut document, BUNDLED_PAYLOAD, &ProviderProfile::fastlog())
            .unwrap();

        assert_eq!(document.lines[0].quantity, Some(2));
        assert_eq!(document.lines[1].identifiers, issued(&["21D1", "218E"]));
        assert_eq!(
            document.lines[2].identifiers,
            issued(&["21BA-2003", "21BA-1747"])
        );
        assert_eq!(document.lines[3].identifiers, issued(&["21BA-1729"]));
        assert!(outcome.unconsumed.is_empty());
    }

    #[test]
    fn bundled_partial_kit() {
        let host = catalog(&["KITNS", "G1", "I1"], &["21D1", "21BA-2003"]);
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [
                line("KITNS", LineRole::KitParent, Some(1)),
                line("G1", LineRole::Component, None),
                line("I1", LineRole::Component, None),
            ],
        );

        let outcome = Correlator::new(&host, &host)
            .correlate(&mut document, BUNDLED_PAYLOAD, &ProviderProfile::fastlog())
            .unwrap();

        assert_eq!(document.lines[1].identifiers, issued(&["21D1"]));
        assert_eq!(document.lines[2].identifiers, issued(&["21BA-2003"]));
        let left: Vec<_> = outcome.unconsumed.iter().map(|u| (u.sku.as_str(), u.units)).collect();
        assert_eq!(left, vec![("KITNS", 1), ("I1", 1)]);
    }

    #[test]
    fn bundled_component_without_data_is_skipped() {
        let host = catalog(&["KITNS", "G1", "BOX", "I1"], &["21D1", "218E"]);
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [
                line("KITNS", LineRole::KitParent, Some(2)),
                line("G1", LineRole::Component, None),
                line("BOX", LineRole::Component, None),
            ],
        );

        let outcome = Correlator::new(&host, &host)
            .correlate(&mut document, BUNDLED_PAYLOAD, &ProviderProfile::fastlog())
            .unwrap();

        assert_eq!(
            outcome.lines[2],
            LineOutcome::Skipped(SkipReason::NoComponentData)
        );
    }

    #[test]
    fn quantity_only_reconciles_quantities() {
        let payload = r#"[{"SKU": "A", "Quantity": 4}, {"SKU": "KIT", "Quantity": 1}]"#;
        let host = catalog(&["A", "B", "KIT"], &[]);
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [
                line("A", LineRole::Standalone, Some(6)),
                line("B", LineRole::Standalone, Some(2)),
                line("KIT", LineRole::KitParent, Some(1)),
                line("A", LineRole::Component, Some(1)),
            ],
        );

        let outcome = Correlator::new(&host, &host)
            .correlate(&mut document, payload, &ProviderProfile::kinesis())
            .unwrap();

        assert_eq!(document.lines[0].quantity, Some(4));
        assert_eq!(document.lines[1].quantity, None);
        assert_eq!(document.lines[2].quantity, Some(1));
        assert_eq!(
            outcome.lines[3],
            LineOutcome::Skipped(SkipReason::QuantityOnly)
        );
        assert_eq!(outcome.identifiers_assigned(), 0);
    }

    #[test_case(""; "blank")]
    #[test_case("[]"; "empty list")]
    fn quantity_only_tolerates_empty_payload(payload: &str) {
        let host = catalog(&["A"], &[]);
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [line("A", LineRole::Standalone, Some(6))],
        );
        let profile = ProviderProfile::new(ProviderVariant::QuantityOnly);

        let outcome = Correlator::new(&host, &host)
            .correlate(&mut document, payload, &profile)
            .unwrap();

        assert_eq!(
            outcome.lines,
            vec![LineOutcome::Skipped(SkipReason::NotShipped)]
        );
    }

    #[test]
    fn item_without_sku_mapping_is_not_shipped() {
        let host = catalog(&[], &["S1", "S2"]);
        let mut document = Document::from_lines(
            DocumentKind::ItemFulfillment,
            [line("BRACELET", LineRole::Standalone, Some(1))],
        );

        let outcome = Correlator::new(&host, &host)
            .correlate(&mut document, KIT_PAYLOAD, &ProviderProfile::ogl())
            .unwrap();

        assert_eq!(
            outcome.lines,
            vec![LineOutcome::Skipped(SkipReason::NotShipped)]
        );
        assert_eq!(outcome.unconsumed[0].units, 2);
    }
}
