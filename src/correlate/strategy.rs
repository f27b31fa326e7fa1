//! Per-provider interpretation of payloads and kit lines.

use std::num::NonZeroUsize;

use crate::{
    Error,
    correlate::{Kit, Line, Planned, SkipReason},
    domain::{ProviderProfile, ProviderVariant, ShipmentUnit, SkuGroup},
    payload::{PayloadError, Records},
};

/// Kit-pair payloads carry at most two identifier slots per unit.
const KIT_PAIR_SLOTS: NonZeroUsize = NonZeroUsize::MIN.saturating_add(1);

/// The structural convention of one provider variant.
pub(super) trait Strategy {
    /// Normalises the raw payload into flat units.
    fn units(&self, raw: &str, profile: &ProviderProfile)
    -> Result<Vec<ShipmentUnit>, PayloadError>;

    /// Units available to a kit parent line.
    fn kit_available(&self, group: &SkuGroup) -> u32;

    /// Plans one component line of an open kit.
    fn component(
        &self,
        group: &mut SkuGroup,
        kit: &mut Kit,
        line: &Line<'_>,
        profile: &ProviderProfile,
    ) -> Result<Planned, Error>;

    /// Consumes whatever the kit still holds once its last component is seen.
    fn close_kit(&self, group: &mut SkuGroup, kit: &Kit);

    /// Consumes `committed` units for a stand-alone line and returns their
    /// identifiers.
    fn standalone(&self, group: &mut SkuGroup, committed: u32) -> Vec<String>;
}

/// Returns the strategy for a variant.
pub(super) fn for_variant(variant: ProviderVariant) -> &'static dyn Strategy {
    match variant {
        ProviderVariant::KitPair => &KitPair,
        ProviderVariant::Bundled => &Bundled,
        ProviderVariant::QuantityOnly => &QuantityOnly,
    }
}

fn primary_identifiers(units: &[ShipmentUnit]) -> Vec<String> {
    units
        .iter()
        .filter_map(|unit| {
            let identifier = unit.primary_identifier();
            if identifier.is_none() {
                tracing::debug!(sku = %unit.sku, "unit has no identifier");
            }
            identifier.map(str::to_string)
        })
        .collect()
}

/// One flat record per kit instance. Component 1 takes the serial number,
/// component 2 the batch number of the same unit, and the unit leaves the
/// queue at the last slot.
struct KitPair;

impl KitPair {
    fn limit(profile: &ProviderProfile) -> NonZeroUsize {
        profile
            .kit_component_limit
            .map_or(KIT_PAIR_SLOTS, |limit| limit.min(KIT_PAIR_SLOTS))
    }
}

impl Strategy for KitPair {
    fn units(
        &self,
        raw: &str,
        profile: &ProviderProfile,
    ) -> Result<Vec<ShipmentUnit>, PayloadError> {
        Records::parse(raw, profile)?.flat_units()
    }

    fn kit_available(&self, group: &SkuGroup) -> u32 {
        u32::try_from(group.len()).unwrap_or(u32::MAX)
    }

    fn component(
        &self,
        group: &mut SkuGroup,
        kit: &mut Kit,
        line: &Line<'_>,
        profile: &ProviderProfile,
    ) -> Result<Planned, Error> {
        let limit = Self::limit(profile);
        if line.position > limit {
            return Err(Error::UnsupportedKit {
                sku: group.name().clone(),
                position: line.position,
                limit,
            });
        }

        let first_slot = line.position == NonZeroUsize::MIN;
        let count = usize::try_from(kit.committed).unwrap_or(usize::MAX);
        let raw = group
            .peek_front(count)
            .map(|unit| {
                let slot = if first_slot {
                    &unit.serial_number
                } else {
                    &unit.batch_number
                };
                slot.clone().ok_or_else(|| Error::UnitWithoutIdentifier {
                    sku: unit.sku.clone(),
                    position: line.position,
                    line: line.index,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if line.position == limit && !kit.dequeued {
            group.consume_front(count);
            kit.dequeued = true;
        }

        Ok(Planned::Assign {
            quantity: Some(kit.committed),
            raw,
        })
    }

    fn close_kit(&self, group: &mut SkuGroup, kit: &Kit) {
        if !kit.dequeued {
            group.consume_front(usize::try_from(kit.committed).unwrap_or(usize::MAX));
        }
    }

    fn standalone(&self, group: &mut SkuGroup, committed: u32) -> Vec<String> {
        primary_identifiers(&group.consume_quantity(committed))
    }
}

/// Kits carry bundles of per-component serial lists; stand-alone items
/// carry serial lists of their own.
struct Bundled;

impl Strategy for Bundled {
    fn units(
        &self,
        raw: &str,
        profile: &ProviderProfile,
    ) -> Result<Vec<ShipmentUnit>, PayloadError> {
        Records::parse(raw, profile)?.bundled_units()
    }

    fn kit_available(&self, group: &SkuGroup) -> u32 {
        group.declared_quantity()
    }

    fn component(
        &self,
        group: &mut SkuGroup,
        kit: &mut Kit,
        line: &Line<'_>,
        _profile: &ProviderProfile,
    ) -> Result<Planned, Error> {
        let Some(queue) = line.sku.and_then(|sku| group.component(sku)) else {
            tracing::warn!(
                kit = %group.name(),
                line = line.index,
                "kit component has no bundle data"
            );
            return Ok(Planned::Skip(SkipReason::NoComponentData));
        };

        let per_kit = (queue.quantity() / group.shipped_quantity().max(1)).max(1);
        let count = per_kit.saturating_mul(kit.committed);
        let sku = queue.sku().clone();
        let raw = group.consume_component(&sku, usize::try_from(count).unwrap_or(usize::MAX));

        Ok(Planned::Assign {
            quantity: Some(count),
            raw,
        })
    }

    fn close_kit(&self, group: &mut SkuGroup, kit: &Kit) {
        group.consume_quantity(kit.committed);
    }

    fn standalone(&self, group: &mut SkuGroup, committed: u32) -> Vec<String> {
        primary_identifiers(&group.consume_quantity(committed))
    }
}

/// Only quantities are reconciled. A blank or empty payload is valid.
struct QuantityOnly;

impl Strategy for QuantityOnly {
    fn units(
        &self,
        raw: &str,
        profile: &ProviderProfile,
    ) -> Result<Vec<ShipmentUnit>, PayloadError> {
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(Records::parse(raw, profile)?.quantity_units())
    }

    fn kit_available(&self, group: &SkuGroup) -> u32 {
        group.declared_quantity()
    }

    fn component(
        &self,
        _group: &mut SkuGroup,
        _kit: &mut Kit,
        _line: &Line<'_>,
        _profile: &ProviderProfile,
    ) -> Result<Planned, Error> {
        Ok(Planned::Skip(SkipReason::QuantityOnly))
    }

    fn close_kit(&self, group: &mut SkuGroup, kit: &Kit) {
        group.consume_quantity(kit.committed);
    }

    fn standalone(&self, group: &mut SkuGroup, committed: u32) -> Vec<String> {
        group.consume_quantity(committed);
        Vec::new()
    }
}
