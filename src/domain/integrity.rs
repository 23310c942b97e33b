use serde::Serialize;

use super::Cents;

/// Raw counts gathered from the store for an integrity check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityStats {
    pub customer_count: i64,
    pub account_count: i64,
    pub transaction_count: i64,
    pub total_balance: Cents,
    pub negative_balances: i64,
    pub orphan_accounts: i64,
    pub dangling_transactions: i64,
    pub invalid_amounts: i64,
    pub self_transfers: i64,
}

/// Result of checking the ledger for broken invariants.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub customer_count: i64,
    pub account_count: i64,
    pub transaction_count: i64,
    pub total_balance: Cents,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Turn store counts into a report listing each violated invariant.
pub fn build_integrity_report(stats: &IntegrityStats) -> IntegrityReport {
    let mut issues = Vec::new();

    if stats.negative_balances > 0 {
        issues.push(format!(
            "{} account(s) have a negative balance",
            stats.negative_balances
        ));
    }
    if stats.orphan_accounts > 0 {
        issues.push(format!(
            "{} account(s) reference a missing customer",
            stats.orphan_accounts
        ));
    }
    if stats.dangling_transactions > 0 {
        issues.push(format!(
            "{} transaction(s) reference a missing account",
            stats.dangling_transactions
        ));
    }
    if stats.invalid_amounts > 0 {
        issues.push(format!(
            "{} transaction(s) have a non-positive amount",
            stats.invalid_amounts
        ));
    }
    if stats.self_transfers > 0 {
        issues.push(format!(
            "{} transaction(s) move money from an account to itself",
            stats.self_transfers
        ));
    }

    IntegrityReport {
        customer_count: stats.customer_count,
        account_count: stats.account_count,
        transaction_count: stats.transaction_count,
        total_balance: stats.total_balance,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_stats_are_healthy() {
        let stats = IntegrityStats {
            customer_count: 2,
            account_count: 2,
            transaction_count: 1,
            total_balance: 10000,
            ..Default::default()
        };

        let report = build_integrity_report(&stats);
        assert!(report.is_healthy());
        assert_eq!(report.account_count, 2);
        assert_eq!(report.total_balance, 10000);
    }

    #[test]
    fn test_each_violation_is_reported() {
        let stats = IntegrityStats {
            negative_balances: 1,
            orphan_accounts: 2,
            dangling_transactions: 3,
            invalid_amounts: 4,
            self_transfers: 5,
            ..Default::default()
        };

        let report = build_integrity_report(&stats);
        assert!(!report.is_healthy());
        assert_eq!(report.issues.len(), 5);
        assert!(report.issues[0].contains("negative balance"));
        assert!(report.issues[2].starts_with("3 transaction(s)"));
    }
}
