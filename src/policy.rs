use crate::ledger::BudgetLedger;
use crate::types::Bid;

/// Allocation policy selector, as chosen on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Greedy,
    Balance,
    Msvv,
}

impl PolicyKind {
    /// Parse the strategy name used on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "greedy" => Some(PolicyKind::Greedy),
            "balance" => Some(PolicyKind::Balance),
            "msvv" => Some(PolicyKind::Msvv),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::Greedy => "greedy",
            PolicyKind::Balance => "balance",
            PolicyKind::Msvv => "msvv",
        }
    }

    /// Create the boxed policy implementation for this kind
    pub fn create_policy(&self) -> Box<dyn AllocationPolicy> {
        match self {
            PolicyKind::Greedy => Box::new(GreedyPolicy),
            PolicyKind::Balance => Box::new(BalancePolicy),
            PolicyKind::Msvv => Box::new(MsvvPolicy),
        }
    }

    pub fn all() -> [PolicyKind; 3] {
        [PolicyKind::Greedy, PolicyKind::Balance, PolicyKind::Msvv]
    }
}

/// Trait for allocation policies
/// Given an eligible bid and the ledger state before the current query,
/// produce the selection score. The charge is always the raw bid value for
/// every policy; only the score differs.
pub trait AllocationPolicy {
    fn name(&self) -> &'static str;

    /// Selection score of an eligible bid under this policy
    fn score(&self, bid: &Bid, ledger: &BudgetLedger) -> f64;
}

/// Picks the highest eligible bid outright
pub struct GreedyPolicy;

impl AllocationPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn score(&self, bid: &Bid, _ledger: &BudgetLedger) -> f64 {
        bid.value
    }
}

/// Picks the advertiser with the most unspent budget, spreading spend evenly
pub struct BalancePolicy;

impl AllocationPolicy for BalancePolicy {
    fn name(&self) -> &'static str {
        "balance"
    }

    fn score(&self, bid: &Bid, ledger: &BudgetLedger) -> f64 {
        ledger.remaining(bid.advertiser)
    }
}

/// Damps each bid by how much of the advertiser's budget is already spent,
/// the theoretically optimal online damping for this problem class
pub struct MsvvPolicy;

impl AllocationPolicy for MsvvPolicy {
    fn name(&self) -> &'static str {
        "msvv"
    }

    fn score(&self, bid: &Bid, ledger: &BudgetLedger) -> f64 {
        bid.value * psi(ledger.spent_fraction(bid.advertiser))
    }
}

/// MSVV damping function ψ(x) = 1 − e^{x−1}
/// ψ(0) = 1 − e^{−1} ≈ 0.632 for an untouched budget, falling to ψ(1) = 0
/// once the budget is exhausted.
pub fn psi(x: f64) -> f64 {
    1.0 - (x - 1.0).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BidCatalog;
    use std::collections::BTreeMap;

    fn fixture() -> (BidCatalog, Bid) {
        let budgets = BTreeMap::from([(1, 10.0)]);
        let bid = Bid {
            advertiser: 1,
            keyword: "k".to_string(),
            value: 5.0,
        };
        let catalog = BidCatalog::new(budgets, vec![bid.clone()]).unwrap();
        (catalog, bid)
    }

    #[test]
    fn test_psi() {
        assert!((psi(0.0) - (1.0 - (-1.0f64).exp())).abs() < 1e-12);
        assert!((psi(1.0)).abs() < 1e-12);
        // Monotonically decreasing
        assert!(psi(0.2) > psi(0.7));
    }

    #[test]
    fn test_greedy_scores_raw_bid() {
        let (catalog, bid) = fixture();
        let ledger = BudgetLedger::new(&catalog);
        assert_eq!(GreedyPolicy.score(&bid, &ledger), 5.0);
    }

    #[test]
    fn test_balance_scores_remaining_budget() {
        let (catalog, bid) = fixture();
        let mut ledger = BudgetLedger::new(&catalog);
        assert_eq!(BalancePolicy.score(&bid, &ledger), 10.0);
        ledger.charge(1, 5.0);
        assert_eq!(BalancePolicy.score(&bid, &ledger), 5.0);
    }

    #[test]
    fn test_msvv_damps_spent_advertisers() {
        let (catalog, bid) = fixture();
        let mut ledger = BudgetLedger::new(&catalog);

        let fresh = MsvvPolicy.score(&bid, &ledger);
        assert!((fresh - 5.0 * psi(0.0)).abs() < 1e-12);

        ledger.charge(1, 9.0);
        let damped = MsvvPolicy.score(&bid, &ledger);
        assert!((damped - 5.0 * psi(0.9)).abs() < 1e-12);
        assert!(damped < fresh);
    }

    #[test]
    fn test_kind_parse_roundtrip() {
        for kind in PolicyKind::all() {
            assert_eq!(PolicyKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PolicyKind::from_name("optimal"), None);
    }
}
