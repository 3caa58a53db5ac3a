//! Integration tests for mining, appending and removing blocks

use hashledger::{
    Block, ChainError, HashDigest, HashValidator, LeadingZeroBits, Ledger, Transaction,
};
use std::sync::Arc;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Cheap enough to mine in a test, strict enough that most nonces fail.
fn test_validator() -> Arc<dyn HashValidator> {
    Arc::new(LeadingZeroBits(8))
}

fn alice_and_bob() -> Result<Ledger, ChainError> {
    let mut ledger = Ledger::new(test_validator())?;
    let deposit = ledger.mine(Transaction::mint("alice", 100))?;
    ledger.append(deposit)?;
    let transfer = ledger.mine(Transaction::new("alice", "bob", 40))?;
    ledger.append(transfer)?;
    Ok(ledger)
}

#[test]
fn test_fresh_ledger() -> TestResult {
    let ledger = Ledger::new(test_validator())?;

    assert_eq!(ledger.len(), 1);
    assert!(ledger.is_correct());
    ledger.check()?;
    assert_eq!(ledger.balance("alice"), 0);
    assert_eq!(ledger.balance(""), 0);
    assert!(ledger.validator().is_valid(ledger.tail_hash()));

    Ok(())
}

#[test]
fn test_deposit_then_transfer() -> TestResult {
    let ledger = alice_and_bob()?;

    assert_eq!(ledger.balance("alice"), 60);
    assert_eq!(ledger.balance("bob"), 40);
    assert_eq!(ledger.users(), &["alice".to_string(), "bob".to_string()]);
    assert_eq!(ledger.len(), 3);
    assert!(ledger.is_correct());

    let indices: Vec<u32> = ledger.blocks().map(Block::index).collect();
    assert_eq!(indices, vec![0, 1, 2]);

    let transactions: Vec<&Transaction> = ledger.transactions().collect();
    assert_eq!(transactions[0], &Transaction::empty());
    assert_eq!(transactions[2], &Transaction::new("alice", "bob", 40));

    Ok(())
}

#[test]
fn test_remove_last_unwinds_to_genesis() -> TestResult {
    let mut ledger = alice_and_bob()?;

    assert!(ledger.remove_last());
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.balance("bob"), 0);
    assert_eq!(ledger.balance("alice"), 100);

    assert!(ledger.remove_last());
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.balance("alice"), 0);

    assert!(!ledger.remove_last());
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.tail_hash(), ledger.genesis().hash());

    // Users stay registered after their blocks are gone.
    assert_eq!(ledger.users(), &["alice".to_string(), "bob".to_string()]);
    assert!(ledger.is_correct());

    Ok(())
}

#[test]
fn test_append_after_remove_reuses_position() -> TestResult {
    let mut ledger = alice_and_bob()?;
    ledger.remove_last();

    let replacement = ledger.mine(Transaction::new("alice", "carol", 25))?;
    assert_eq!(replacement.index(), 2);
    ledger.append(replacement)?;

    assert_eq!(ledger.balance("alice"), 75);
    assert_eq!(ledger.balance("bob"), 0);
    assert_eq!(ledger.balance("carol"), 25);
    assert_eq!(
        ledger.users(),
        &["alice".to_string(), "bob".to_string(), "carol".to_string()]
    );
    assert!(ledger.is_correct());

    Ok(())
}

#[test]
fn test_append_rejects_wrong_previous_hash() -> TestResult {
    let mut ledger = alice_and_bob()?;
    let tail_before = ledger.tail_hash().clone();

    let orphan = Block::mine(
        3,
        Transaction::mint("mallory", 1_000),
        HashDigest::new(vec![0xAB; 32]),
        ledger.validator().as_ref(),
    )?;
    let err = ledger.append(orphan).unwrap_err();

    assert!(matches!(err, ChainError::InvalidBlock(_)));
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.tail_hash(), &tail_before);
    assert_eq!(ledger.balance("mallory"), 0);
    assert!(!ledger.users().contains(&"mallory".to_string()));

    Ok(())
}

#[test]
fn test_append_rejects_unmined_nonce() -> TestResult {
    let mut ledger = Ledger::new(test_validator())?;
    let tx = Transaction::mint("alice", 10);
    let mined = ledger.mine(tx.clone())?;

    // Every nonce before the mined one fails the validator.
    for nonce in 0..mined.nonce() {
        let block = Block::accept(1, tx.clone(), ledger.tail_hash().clone(), nonce);
        assert!(ledger.append(block).is_err());
    }
    assert_eq!(ledger.len(), 1);

    let accepted = Block::accept(1, tx, ledger.tail_hash().clone(), mined.nonce());
    assert_eq!(accepted, mined);
    ledger.append(accepted)?;
    assert_eq!(ledger.balance("alice"), 10);

    Ok(())
}

#[test]
fn test_append_rejects_forged_hash() -> TestResult {
    let mut ledger = Ledger::new(test_validator())?;
    let tx = Transaction::mint("alice", 10);
    // Passes the validator but is not the hash of the contents.
    let forged = Block::from_raw_parts(
        1,
        tx,
        ledger.tail_hash().clone(),
        0,
        HashDigest::new(vec![0; 32]),
    );

    let err = ledger.append(forged).unwrap_err();
    assert!(err.to_string().contains("Hash mismatch"));
    assert_eq!(ledger.len(), 1);

    Ok(())
}
