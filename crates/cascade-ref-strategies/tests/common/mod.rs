#![allow(dead_code)]

use std::sync::Arc;

use cascade_contracts::account::{AccountId, Amount};
use cascade_core::traits::StrategyHandle;
use cascade_ref_strategies::{deployment::ALICE, CappedStrategy, Deployment};

pub use cascade_ref_strategies::deployment::acct;

/// Reference deployment with one strategy per entry in `caps`, named
/// `s0`, `s1`, ... in priority order, and alice funded with `funding`.
pub fn deploy(caps: &[Option<Amount>], funding: Amount) -> (Deployment, Vec<Arc<CappedStrategy>>) {
    let deployment = Deployment::reference().unwrap();
    let strategies: Vec<Arc<CappedStrategy>> = caps
        .iter()
        .enumerate()
        .map(|(i, cap)| {
            let strategy = deployment.strategy(&format!("s{i}"));
            Arc::new(match cap {
                Some(cap) => strategy.with_cap(*cap),
                None => strategy,
            })
        })
        .collect();
    let handles: Vec<StrategyHandle> = strategies
        .iter()
        .map(|s| s.clone() as StrategyHandle)
        .collect();
    deployment.install(&handles).unwrap();
    if funding > 0 {
        deployment.fund(ALICE, funding).unwrap();
    }
    (deployment, strategies)
}

pub fn held(deployment: &Deployment, strategy: &str) -> Amount {
    deployment.balance(strategy)
}

pub fn alice() -> AccountId {
    acct(ALICE)
}

/// Balances and share state that must survive a failed call untouched.
#[derive(Debug, PartialEq, Eq)]
pub struct Fingerprint {
    pub tokens: Vec<(String, Amount)>,
    pub total_supply: Amount,
    pub strategies: Vec<AccountId>,
    pub logged: usize,
}

pub fn fingerprint(deployment: &Deployment, accounts: &[&str]) -> Fingerprint {
    Fingerprint {
        tokens: accounts
            .iter()
            .map(|a| (a.to_string(), deployment.balance(a)))
            .collect(),
        total_supply: deployment.vault.total_supply(),
        strategies: deployment.vault.strategies().unwrap(),
        logged: deployment.log.len(),
    }
}
