//! Firewall reconciliation specs

use crate::prelude::*;
use libops_core::test_support::firewall_rule;
use libops_core::RuleAction;

#[tokio::test]
async fn chain_matches_rule_list_order_and_actions() {
    let h = SiteHarness::new();
    h.admin.set_firewall_rules(
        SITE_ID,
        vec![
            firewall_rule(1, 22, RuleAction::Allow),
            firewall_rule(2, 80, RuleAction::Deny),
            firewall_rule(3, 443, RuleAction::Reject),
        ],
    );

    h.reconciler.firewall().await.unwrap();

    let chain = h.filter.chain("LIBOPS-FIREWALL").unwrap();
    assert_eq!(chain.len(), 3);
    assert!(chain[0].contains("--dport 22") && chain[0].ends_with("ACCEPT"));
    assert!(chain[1].contains("--dport 80") && chain[1].ends_with("DROP"));
    assert!(chain[2].contains("--dport 443") && chain[2].ends_with("REJECT"));
    assert_eq!(h.filter.input_jumps(), vec!["LIBOPS-FIREWALL".to_string()]);
}

#[tokio::test]
async fn repeated_reconciliation_leaves_identical_chain_and_single_jump() {
    let h = SiteHarness::new();
    h.admin.set_firewall_rules(SITE_ID, vec![firewall_rule(1, 22, RuleAction::Allow)]);

    h.reconciler.firewall().await.unwrap();
    let first = h.filter.chain("LIBOPS-FIREWALL").unwrap();
    h.reconciler.firewall().await.unwrap();
    let second = h.filter.chain("LIBOPS-FIREWALL").unwrap();

    assert_eq!(first, second);
    assert_eq!(h.filter.input_jumps().len(), 1);
}

#[tokio::test]
async fn deleted_rule_is_gone_after_rebuild() {
    let h = SiteHarness::new();
    h.admin.set_firewall_rules(
        SITE_ID,
        vec![firewall_rule(1, 22, RuleAction::Allow), firewall_rule(2, 23, RuleAction::Drop)],
    );
    h.reconciler.firewall().await.unwrap();

    h.admin.set_firewall_rules(SITE_ID, vec![firewall_rule(1, 22, RuleAction::Allow)]);
    h.reconciler.firewall().await.unwrap();

    let chain = h.filter.chain("LIBOPS-FIREWALL").unwrap();
    assert_eq!(chain.len(), 1);
    assert!(chain[0].contains("--dport 22"));
}
