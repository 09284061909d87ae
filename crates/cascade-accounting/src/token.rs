//! In-memory underlying asset ledger.

use std::collections::BTreeMap;
use std::sync::Mutex;

use tracing::debug;

use cascade_contracts::{
    account::{AccountId, Amount, AssetId},
    error::{CascadeError, CascadeResult},
};
use cascade_core::traits::{AssetToken, Journaled, Snapshot};

use crate::lock;

#[derive(Debug, Clone, Default)]
struct TokenState {
    balances: BTreeMap<AccountId, Amount>,
    allowances: BTreeMap<AccountId, BTreeMap<AccountId, Amount>>,
    total_supply: Amount,
}

impl TokenState {
    fn balance(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|by_spender| by_spender.get(spender))
            .copied()
            .unwrap_or(0)
    }

    fn move_balance(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> CascadeResult<()> {
        let available = self.balance(from);
        if available < amount {
            return Err(CascadeError::InsufficientBalance {
                account: from.clone(),
                needed: amount,
                available,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }

        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| CascadeError::overflow("token balance"))?;
        self.balances.insert(from.clone(), available - amount);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

/// A fungible token ledger held entirely in memory.
///
/// An allowance of `Amount::MAX` is treated as unlimited and is not consumed
/// by `transfer_from`.
#[derive(Debug)]
pub struct InMemoryToken {
    asset: AssetId,
    state: Mutex<TokenState>,
}

impl InMemoryToken {
    /// An empty ledger for `asset`.
    pub fn new(asset: AssetId) -> Self {
        Self {
            asset,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Create `amount` new tokens in `to`'s balance.
    pub fn mint(&self, to: &AccountId, amount: Amount) -> CascadeResult<()> {
        let mut state = lock(&self.state);
        let balance = state
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| CascadeError::overflow("token balance"))?;
        let supply = state
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| CascadeError::overflow("token supply"))?;
        state.balances.insert(to.clone(), balance);
        state.total_supply = supply;
        debug!(asset = %self.asset, to = %to, amount, "tokens minted");
        Ok(())
    }

    /// Destroy `amount` tokens from `from`'s balance.
    pub fn burn(&self, from: &AccountId, amount: Amount) -> CascadeResult<()> {
        let mut state = lock(&self.state);
        let available = state.balance(from);
        if available < amount {
            return Err(CascadeError::InsufficientBalance {
                account: from.clone(),
                needed: amount,
                available,
            });
        }
        state.balances.insert(from.clone(), available - amount);
        state.total_supply -= amount;
        Ok(())
    }

    /// Tokens in existence.
    pub fn total_supply(&self) -> Amount {
        lock(&self.state).total_supply
    }
}

impl Journaled for InMemoryToken {
    fn snapshot(&self) -> CascadeResult<Snapshot> {
        Ok(Snapshot::new(lock(&self.state).clone()))
    }

    fn restore(&self, snapshot: &Snapshot) -> CascadeResult<()> {
        let saved = snapshot.downcast::<TokenState>()?;
        *lock(&self.state) = saved.clone();
        Ok(())
    }
}

impl AssetToken for InMemoryToken {
    fn asset(&self) -> AssetId {
        self.asset.clone()
    }

    fn balance_of(&self, account: &AccountId) -> Amount {
        lock(&self.state).balance(account)
    }

    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Amount) -> CascadeResult<()> {
        lock(&self.state).move_balance(from, to, amount)
    }

    fn approve(&self, owner: &AccountId, spender: &AccountId, amount: Amount) -> CascadeResult<()> {
        let mut state = lock(&self.state);
        let by_spender = state.allowances.entry(owner.clone()).or_default();
        if amount == 0 {
            by_spender.remove(spender);
        } else {
            by_spender.insert(spender.clone(), amount);
        }
        Ok(())
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        lock(&self.state).allowance(owner, spender)
    }

    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> CascadeResult<()> {
        let mut state = lock(&self.state);
        let allowed = state.allowance(from, spender);
        if spender != from && allowed < amount {
            return Err(CascadeError::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                needed: amount,
                available: allowed,
            });
        }

        state.move_balance(from, to, amount)?;

        if spender != from && allowed != Amount::MAX {
            let left = allowed - amount;
            let by_spender = state.allowances.entry(from.clone()).or_default();
            if left == 0 {
                by_spender.remove(spender);
            } else {
                by_spender.insert(spender.clone(), left);
            }
        }
        Ok(())
    }
}
