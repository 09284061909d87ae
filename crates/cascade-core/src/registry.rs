//! The ordered, bounded strategy list.
//!
//! Position is priority: index 0 is offered deposits first and asked for
//! withdrawals first. Storage is a fixed array of `MAX_STRATEGIES` slots;
//! occupied slots are always `0..len` and removal shifts later entries left
//! so relative order never changes.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use cascade_contracts::{
    account::{AccountId, AssetId},
    error::{CascadeError, CascadeResult},
    event::VaultEvent,
    MAX_STRATEGIES,
};

use crate::traits::StrategyHandle;

/// The asset and authority every member must declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub asset: AssetId,
    pub authority: AccountId,
}

/// Ordered, deduplicated list of strategy handles.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    slots: [Option<StrategyHandle>; MAX_STRATEGIES],
    len: usize,
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered strategies.
    pub fn count(&self) -> usize {
        self.len
    }

    /// Return true if no strategy is registered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return true if a strategy with this account is registered.
    pub fn contains(&self, strategy: &AccountId) -> bool {
        self.position(strategy).is_some()
    }

    /// Priority index of a registered strategy.
    pub fn position(&self, strategy: &AccountId) -> Option<usize> {
        self.iter().position(|s| &s.id() == strategy)
    }

    /// The handle registered under `strategy`.
    pub fn get(&self, strategy: &AccountId) -> Option<&StrategyHandle> {
        self.iter().find(|s| &s.id() == strategy)
    }

    /// Members in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &StrategyHandle> {
        self.slots[..self.len].iter().flatten()
    }

    /// Cloned handles in priority order.
    pub fn handles(&self) -> Vec<StrategyHandle> {
        self.iter().cloned().collect()
    }

    /// Member accounts in priority order.
    pub fn ids(&self) -> Vec<AccountId> {
        self.iter().map(|s| s.id()).collect()
    }

    /// Append `strategy` at the lowest priority.
    ///
    /// Fails with `NullReference` for a null account, with
    /// `DuplicateOrInvalidStrategy` if it is already a member or declares a
    /// different asset or authority than `binding`, and with
    /// `CapacityExceeded` if the list is full.
    pub fn add(
        &mut self,
        strategy: StrategyHandle,
        binding: &Binding,
    ) -> CascadeResult<VaultEvent> {
        let id = strategy.id();
        if id.is_null() {
            return Err(CascadeError::NullReference);
        }
        if self.contains(&id)
            || strategy.underlying_asset() != binding.asset
            || strategy.authority() != binding.authority
        {
            return Err(CascadeError::DuplicateOrInvalidStrategy { strategy: id });
        }
        if self.len >= MAX_STRATEGIES {
            return Err(CascadeError::CapacityExceeded {
                max: MAX_STRATEGIES,
            });
        }

        let position = self.len;
        self.slots[position] = Some(strategy);
        self.len += 1;

        debug!(strategy = %id, position, "strategy added");
        Ok(VaultEvent::StrategyAdded {
            strategy: id,
            position,
        })
    }

    /// Remove `strategy`, shifting every later entry one position left.
    pub fn remove(&mut self, strategy: &AccountId) -> CascadeResult<(StrategyHandle, VaultEvent)> {
        let position = self
            .position(strategy)
            .ok_or_else(|| CascadeError::DuplicateOrInvalidStrategy {
                strategy: strategy.clone(),
            })?;

        let removed = self.slots[position]
            .take()
            .ok_or_else(|| CascadeError::DuplicateOrInvalidStrategy {
                strategy: strategy.clone(),
            })?;

        // Bubble the emptied slot to the end so later entries keep their order.
        for index in position..self.len - 1 {
            self.slots.swap(index, index + 1);
        }
        self.len -= 1;

        debug!(strategy = %strategy, position, "strategy removed");
        Ok((
            removed,
            VaultEvent::StrategyRemoved {
                strategy: strategy.clone(),
            },
        ))
    }

    /// Replace the order with `new_order`, which must be a permutation of the
    /// current members.
    ///
    /// Runs as remove-all then add-all on a working copy; the registry is
    /// only replaced once every re-add has passed validation.
    pub fn reorder(
        &mut self,
        new_order: &[AccountId],
        binding: &Binding,
    ) -> CascadeResult<Vec<VaultEvent>> {
        if new_order.len() != self.len {
            return Err(CascadeError::LengthMismatch {
                expected: self.len,
                actual: new_order.len(),
            });
        }

        let mut seen = HashSet::with_capacity(new_order.len());
        let mut reordered = Vec::with_capacity(new_order.len());
        for id in new_order {
            if !seen.insert(id) {
                return Err(CascadeError::DuplicateOrInvalidStrategy {
                    strategy: id.clone(),
                });
            }
            let handle = self
                .get(id)
                .cloned()
                .ok_or_else(|| CascadeError::DuplicateOrInvalidStrategy {
                    strategy: id.clone(),
                })?;
            reordered.push(handle);
        }

        let mut working = self.clone();
        let mut events = Vec::with_capacity(new_order.len() * 2);
        for id in self.ids() {
            let (_, event) = working.remove(&id)?;
            events.push(event);
        }
        for handle in reordered {
            events.push(working.add(handle, binding)?);
        }

        *self = working;
        Ok(events)
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cascade_contracts::{
        account::{AccountId, Amount, AssetId},
        error::{CascadeError, CascadeResult},
        event::VaultEvent,
        MAX_STRATEGIES,
    };

    use crate::traits::{Journaled, Snapshot, Strategy, StrategyHandle};

    use super::{Binding, StrategyRegistry};

    /// A strategy that only answers identity questions.
    struct StubStrategy {
        id: AccountId,
        asset: AssetId,
        authority: AccountId,
    }

    impl Journaled for StubStrategy {
        fn snapshot(&self) -> CascadeResult<Snapshot> {
            Ok(Snapshot::new(()))
        }

        fn restore(&self, _snapshot: &Snapshot) -> CascadeResult<()> {
            Ok(())
        }
    }

    impl Strategy for StubStrategy {
        fn id(&self) -> AccountId {
            self.id.clone()
        }

        fn underlying_asset(&self) -> AssetId {
            self.asset.clone()
        }

        fn authority(&self) -> AccountId {
            self.authority.clone()
        }

        fn total_assets(&self) -> Amount {
            0
        }

        fn max_deposit(&self, _receiver: &AccountId) -> Amount {
            0
        }

        fn max_withdraw(&self, _owner: &AccountId) -> Amount {
            0
        }

        fn deposit(
            &self,
            _caller: &AccountId,
            _assets: Amount,
            _receiver: &AccountId,
        ) -> CascadeResult<Amount> {
            Ok(0)
        }

        fn withdraw(
            &self,
            _caller: &AccountId,
            _assets: Amount,
            _receiver: &AccountId,
            _owner: &AccountId,
        ) -> CascadeResult<Amount> {
            Ok(0)
        }
    }

    fn binding() -> Binding {
        Binding {
            asset: AssetId::new("usdc"),
            authority: AccountId::new("authority"),
        }
    }

    fn stub(id: &str) -> StrategyHandle {
        Arc::new(StubStrategy {
            id: AccountId::new(id),
            asset: AssetId::new("usdc"),
            authority: AccountId::new("authority"),
        })
    }

    fn ids(names: &[&str]) -> Vec<AccountId> {
        names.iter().map(|n| AccountId::new(*n)).collect()
    }

    fn registry_of(names: &[&str]) -> StrategyRegistry {
        let mut registry = StrategyRegistry::new();
        for name in names {
            registry.add(stub(name), &binding()).unwrap();
        }
        registry
    }

    #[test]
    fn add_appends_in_order_and_reports_position() {
        let mut registry = StrategyRegistry::new();
        let event = registry.add(stub("a"), &binding()).unwrap();
        assert_eq!(
            event,
            VaultEvent::StrategyAdded {
                strategy: AccountId::new("a"),
                position: 0
            }
        );
        registry.add(stub("b"), &binding()).unwrap();

        assert_eq!(registry.ids(), ids(&["a", "b"]));
        assert_eq!(registry.count(), 2);
        assert!(registry.contains(&AccountId::new("b")));
    }

    #[test]
    fn add_rejects_null_reference() {
        let mut registry = StrategyRegistry::new();
        let result = registry.add(stub(""), &binding());
        assert_eq!(result, Err(CascadeError::NullReference));
        assert!(registry.is_empty());
    }

    #[test]
    fn add_rejects_duplicate_and_leaves_registry_unchanged() {
        let mut registry = registry_of(&["a", "b"]);
        let result = registry.add(stub("a"), &binding());

        assert!(matches!(result, Err(CascadeError::DuplicateOrInvalidStrategy { .. })));
        assert_eq!(registry.ids(), ids(&["a", "b"]));
    }

    #[test]
    fn add_rejects_asset_mismatch() {
        let mut registry = StrategyRegistry::new();
        let foreign: StrategyHandle = Arc::new(StubStrategy {
            id: AccountId::new("weth-strategy"),
            asset: AssetId::new("weth"),
            authority: AccountId::new("authority"),
        });
        let result = registry.add(foreign, &binding());
        assert!(matches!(result, Err(CascadeError::DuplicateOrInvalidStrategy { .. })));
    }

    #[test]
    fn add_rejects_authority_mismatch() {
        let mut registry = StrategyRegistry::new();
        let foreign: StrategyHandle = Arc::new(StubStrategy {
            id: AccountId::new("rogue"),
            asset: AssetId::new("usdc"),
            authority: AccountId::new("someone-else"),
        });
        let result = registry.add(foreign, &binding());
        assert!(matches!(result, Err(CascadeError::DuplicateOrInvalidStrategy { .. })));
    }

    #[test]
    fn add_eleventh_strategy_exceeds_capacity() {
        let names: Vec<String> = (0..MAX_STRATEGIES).map(|i| format!("s{i}")).collect();
        let mut registry = StrategyRegistry::new();
        for name in &names {
            registry.add(stub(name), &binding()).unwrap();
        }

        let result = registry.add(stub("eleventh"), &binding());
        assert_eq!(result, Err(CascadeError::CapacityExceeded { max: MAX_STRATEGIES }));
        assert_eq!(registry.count(), MAX_STRATEGIES);
        assert!(!registry.contains(&AccountId::new("eleventh")));
    }

    #[test]
    fn remove_preserves_relative_order() {
        let mut registry = registry_of(&["a", "b", "c", "d"]);
        let (removed, event) = registry.remove(&AccountId::new("b")).unwrap();

        assert_eq!(removed.id(), AccountId::new("b"));
        assert_eq!(event, VaultEvent::StrategyRemoved { strategy: AccountId::new("b") });
        assert_eq!(registry.ids(), ids(&["a", "c", "d"]));
    }

    #[test]
    fn remove_first_and_last() {
        let mut registry = registry_of(&["a", "b", "c"]);
        registry.remove(&AccountId::new("a")).unwrap();
        assert_eq!(registry.ids(), ids(&["b", "c"]));
        registry.remove(&AccountId::new("c")).unwrap();
        assert_eq!(registry.ids(), ids(&["b"]));

        // Freed slots are reusable.
        registry.add(stub("e"), &binding()).unwrap();
        assert_eq!(registry.ids(), ids(&["b", "e"]));
    }

    #[test]
    fn remove_unknown_strategy_fails() {
        let mut registry = registry_of(&["a"]);
        let result = registry.remove(&AccountId::new("zzz"));
        assert!(matches!(result, Err(CascadeError::DuplicateOrInvalidStrategy { .. })));
        assert_eq!(registry.ids(), ids(&["a"]));
    }

    #[test]
    fn reorder_applies_permutation() {
        let mut registry = registry_of(&["a", "b", "c"]);
        let events = registry.reorder(&ids(&["c", "a", "b"]), &binding()).unwrap();

        assert_eq!(registry.ids(), ids(&["c", "a", "b"]));
        // Three removals followed by three additions.
        assert_eq!(events.len(), 6);
        assert_eq!(
            events[3],
            VaultEvent::StrategyAdded {
                strategy: AccountId::new("c"),
                position: 0
            }
        );
    }

    #[test]
    fn reorder_rejects_length_mismatch() {
        let mut registry = registry_of(&["a", "b"]);
        let result = registry.reorder(&ids(&["a"]), &binding());
        assert_eq!(result, Err(CascadeError::LengthMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn reorder_rejects_duplicates_and_strangers() {
        let mut registry = registry_of(&["a", "b"]);

        let dup = registry.reorder(&ids(&["a", "a"]), &binding());
        assert!(matches!(dup, Err(CascadeError::DuplicateOrInvalidStrategy { .. })));

        let stranger = registry.reorder(&ids(&["a", "x"]), &binding());
        assert!(matches!(stranger, Err(CascadeError::DuplicateOrInvalidStrategy { .. })));

        assert_eq!(registry.ids(), ids(&["a", "b"]));
    }

    #[test]
    fn reorder_revalidates_binding() {
        let mut registry = registry_of(&["a", "b"]);
        let other = Binding {
            asset: AssetId::new("usdc"),
            authority: AccountId::new("new-authority"),
        };
        let result = registry.reorder(&ids(&["b", "a"]), &other);

        assert!(matches!(result, Err(CascadeError::DuplicateOrInvalidStrategy { .. })));
        assert_eq!(registry.ids(), ids(&["a", "b"]));
    }
}
