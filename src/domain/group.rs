//! Grouping of flat payload units into per-SKU FIFO queues.
//!
//! The [`SkuGroups`] built here are owned by a single correlation pass and
//! shrink monotonically as lines consume units from the front.

use std::{collections::VecDeque, num::NonZeroU32};

use nonempty::NonEmpty;

use crate::domain::{
    Sku,
    unit::{ShipmentUnit, flatten_bundles},
};

/// All units sharing one SKU, in payload order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuGroup {
    name: Sku,
    children: VecDeque<ShipmentUnit>,
    components: Vec<ComponentQueue>,
    shipped: u32,
}

/// The flattened serial numbers of one kit component, consumed FIFO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentQueue {
    sku: Sku,
    quantity: u32,
    identifiers: VecDeque<String>,
}

impl ComponentQueue {
    /// The component SKU.
    #[must_use]
    pub const fn sku(&self) -> &Sku {
        &self.sku
    }

    /// The declared component quantity summed over all bundles.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// The identifiers not yet consumed.
    #[must_use]
    pub const fn identifiers(&self) -> &VecDeque<String> {
        &self.identifiers
    }

    fn take(&mut self, count: usize) -> Vec<String> {
        let count = count.min(self.identifiers.len());
        self.identifiers.drain(..count).collect()
    }
}

impl SkuGroup {
    /// Creates a group from its units.
    ///
    /// Bundles carried by the units are flattened into per-component queues
    /// and detached from the children.
    #[must_use]
    pub fn new(name: Sku, units: NonEmpty<ShipmentUnit>) -> Self {
        let mut children: VecDeque<ShipmentUnit> = units.into_iter().collect();

        let bundles: Vec<_> = children
            .iter_mut()
            .flat_map(|unit| std::mem::take(&mut unit.bundles))
            .collect();
        let components = flatten_bundles(&bundles)
            .into_iter()
            .flat_map(|bundle| bundle.items)
            .map(|item| ComponentQueue {
                sku: item.sku,
                quantity: item.quantity,
                identifiers: item.serial_numbers.into(),
            })
            .collect();
        let shipped = children
            .iter()
            .map(|unit| unit.quantity.get())
            .fold(0, u32::saturating_add);

        Self {
            name,
            children,
            components,
            shipped,
        }
    }

    /// The SKU shared by every child.
    #[must_use]
    pub const fn name(&self) -> &Sku {
        &self.name
    }

    /// The units not yet consumed, front first.
    #[must_use]
    pub const fn children(&self) -> &VecDeque<ShipmentUnit> {
        &self.children
    }

    /// Number of units not yet consumed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether every unit has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Sum of the declared quantities of the remaining children.
    #[must_use]
    pub fn declared_quantity(&self) -> u32 {
        self.children
            .iter()
            .map(|unit| unit.quantity.get())
            .fold(0, u32::saturating_add)
    }

    /// Total quantity declared when the group was built.
    #[must_use]
    pub const fn shipped_quantity(&self) -> u32 {
        self.shipped
    }

    /// Component queues from flattened bundles, in order of first appearance.
    #[must_use]
    pub fn components(&self) -> &[ComponentQueue] {
        &self.components
    }

    /// Reads up to `count` units from the front without removing them.
    pub fn peek_front(&self, count: usize) -> impl Iterator<Item = &ShipmentUnit> {
        self.children.iter().take(count)
    }

    /// Removes up to `count` units from the front and returns them in order.
    pub fn consume_front(&mut self, count: usize) -> Vec<ShipmentUnit> {
        let count = count.min(self.children.len());
        self.children.drain(..count).collect()
    }

    /// Removes units from the front until their quantities add up to
    /// `quantity`, splitting the last unit if only part of it is needed.
    pub fn consume_quantity(&mut self, quantity: u32) -> Vec<ShipmentUnit> {
        let mut remaining = quantity;
        let mut taken = Vec::new();

        while remaining > 0 {
            let Some(front) = self.children.front_mut() else {
                break;
            };
            let available = front.quantity.get();
            if available <= remaining {
                remaining -= available;
                taken.extend(self.children.pop_front());
            } else if let (Some(left), Some(part)) = (
                NonZeroU32::new(available - remaining),
                NonZeroU32::new(remaining),
            ) {
                front.quantity = left;
                taken.push(front.clone().with_quantity(part));
                remaining = 0;
            } else {
                break;
            }
        }

        taken
    }

    /// Removes up to `count` identifiers from the front of the named
    /// component queue. Returns nothing if the kit has no such component.
    pub fn consume_component(&mut self, component: &Sku, count: usize) -> Vec<String> {
        self.components
            .iter_mut()
            .find(|queue| &queue.sku == component)
            .map(|queue| queue.take(count))
            .unwrap_or_default()
    }

    /// Looks up a component queue by SKU.
    #[must_use]
    pub fn component(&self, component: &Sku) -> Option<&ComponentQueue> {
        self.components.iter().find(|queue| &queue.sku == component)
    }
}

/// The groups of one payload, one per distinct SKU in order of first
/// appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkuGroups(Vec<SkuGroup>);

/// Index of a group inside its [`SkuGroups`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupIndex(usize);

impl SkuGroups {
    /// Groups units by exact SKU equality, preserving payload order both
    /// across groups and within each group.
    #[must_use]
    pub fn from_units(units: impl IntoIterator<Item = ShipmentUnit>) -> Self {
        let mut buckets: Vec<(Sku, Vec<ShipmentUnit>)> = Vec::new();
        for unit in units {
            if let Some((_, bucket)) = buckets.iter_mut().find(|(sku, _)| *sku == unit.sku) {
                bucket.push(unit);
            } else {
                buckets.push((unit.sku.clone(), vec![unit]));
            }
        }

        Self(
            buckets
                .into_iter()
                .filter_map(|(sku, bucket)| {
                    NonEmpty::from_vec(bucket).map(|units| SkuGroup::new(sku, units))
                })
                .collect(),
        )
    }

    /// Finds the group for a SKU.
    #[must_use]
    pub fn position(&self, sku: &Sku) -> Option<GroupIndex> {
        self.0
            .iter()
            .position(|group| group.name() == sku)
            .map(GroupIndex)
    }

    /// Returns the group at `index`.
    #[must_use]
    pub fn get(&self, index: GroupIndex) -> &SkuGroup {
        &self.0[index.0]
    }

    /// Returns the group at `index` mutably.
    pub fn get_mut(&mut self, index: GroupIndex) -> &mut SkuGroup {
        &mut self.0[index.0]
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the groups in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = &SkuGroup> {
        self.0.iter()
    }
}
