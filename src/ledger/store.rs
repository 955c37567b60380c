//! Concurrent in-memory ledger store
//!
//! [`LedgerStore`] owns every record family: accounts, holds, balance
//! updates, journal entries, transaction records and risk decisions.
//! Plain reads and single-account updates go straight through the
//! sharded maps; multi-account mutations are staged in a
//! [`TransferUnit`] and applied atomically under the store's commit
//! lock with per-account version checks.

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::LedgerConfig;
use crate::types::{
    prefixed_id, Account, BalanceSnapshot, BalanceUpdate, DecisionRecord, Hold, JournalEntry,
    LedgerError, TransactionRecord,
};

/// An account paired with its optimistic-concurrency version
///
/// The version increments on every committed write. A [`TransferUnit`]
/// records the version it read and refuses to commit if the stored
/// version has moved since.
#[derive(Debug, Clone)]
struct VersionedAccount {
    account: Account,
    version: u64,
}

/// Concurrent store for all ledger record families
#[derive(Debug)]
pub struct LedgerStore {
    config: LedgerConfig,
    accounts: DashMap<String, VersionedAccount>,
    holds: DashMap<String, Hold>,
    balance_updates: DashMap<String, Vec<BalanceUpdate>>,
    journal: DashMap<String, JournalEntry>,
    journal_by_transaction: DashMap<String, Vec<String>>,
    transactions: DashMap<String, TransactionRecord>,
    decisions: DashMap<String, DecisionRecord>,
    // Serializes multi-account commits; reads stay lock-free.
    commit_lock: Mutex<()>,
}

impl LedgerStore {
    /// Create an empty store with the given configuration
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            accounts: DashMap::new(),
            holds: DashMap::new(),
            balance_updates: DashMap::new(),
            journal: DashMap::new(),
            journal_by_transaction: DashMap::new(),
            transactions: DashMap::new(),
            decisions: DashMap::new(),
            commit_lock: Mutex::new(()),
        }
    }

    /// The configuration this store was built with
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Fetch an account, creating it if absent
    ///
    /// A supplied `initial_balance` seeds the new account; `None` falls
    /// back to the configured default. Creation is atomic per account
    /// number: concurrent callers racing on the same number observe a
    /// single created account, and the balance argument is ignored for an
    /// account that already exists.
    pub fn get_or_create_account(
        &self,
        account_number: &str,
        customer_name: &str,
        initial_balance: Option<Decimal>,
    ) -> Account {
        let entry = self
            .accounts
            .entry(account_number.to_string())
            .or_insert_with(|| {
                let balance = initial_balance.unwrap_or(self.config.initial_balance);
                debug!(account_number, balance = %balance, "creating account");
                let mut account = Account::open(
                    account_number,
                    customer_name,
                    balance,
                    &self.config.default_currency,
                );
                account.overdraft_limit = self.config.default_overdraft_limit;
                VersionedAccount {
                    account,
                    version: 0,
                }
            });
        entry.account.clone()
    }

    /// Fetch an account by number
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no account with this number exists.
    pub fn get_account(&self, account_number: &str) -> Result<Account, LedgerError> {
        self.accounts
            .get(account_number)
            .map(|entry| entry.account.clone())
            .ok_or_else(|| LedgerError::account_not_found(account_number))
    }

    /// Whether an account with this number exists
    pub fn account_exists(&self, account_number: &str) -> bool {
        self.accounts.contains_key(account_number)
    }

    /// Apply a closure to a single account under its entry lock
    ///
    /// The closure runs against the live record; if it returns an error
    /// the account is left unchanged. On success the account version is
    /// bumped and the updated account returned.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist, or
    /// whatever error the closure produced.
    pub fn update_account<F>(&self, account_number: &str, f: F) -> Result<Account, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<(), LedgerError>,
    {
        let mut entry = self
            .accounts
            .get_mut(account_number)
            .ok_or_else(|| LedgerError::account_not_found(account_number))?;
        let mut candidate = entry.account.clone();
        f(&mut candidate)?;
        entry.account = candidate;
        entry.version += 1;
        Ok(entry.account.clone())
    }

    /// Current balance figures for an account
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub fn get_account_balance(&self, account_number: &str) -> Result<BalanceSnapshot, LedgerError> {
        let account = self.get_account(account_number)?;
        Ok(BalanceSnapshot {
            balance: account.balance,
            available_balance: account.available_balance,
            overdraft_limit: account.overdraft_limit,
        })
    }

    /// Whether the account can cover `amount`, overdraft included
    ///
    /// Also returns the current available balance for display.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub fn check_sufficient_funds(
        &self,
        account_number: &str,
        amount: Decimal,
    ) -> Result<(bool, Decimal), LedgerError> {
        let account = self.get_account(account_number)?;
        let sufficient = account.available_balance + account.overdraft_limit >= amount;
        Ok((sufficient, account.available_balance))
    }

    /// Begin a multi-account atomic unit
    pub fn begin_unit(&self) -> TransferUnit<'_> {
        TransferUnit {
            store: self,
            unit_id: prefixed_id("UNIT"),
            started: Instant::now(),
            reads: Vec::new(),
            staged_accounts: Vec::new(),
            staged_updates: Vec::new(),
            staged_journal: None,
        }
    }

    // --- holds ---

    /// Insert a hold record
    pub fn insert_hold(&self, hold: Hold) {
        self.holds.insert(hold.hold_id.clone(), hold);
    }

    /// Fetch a hold by id
    pub fn get_hold(&self, hold_id: &str) -> Option<Hold> {
        self.holds.get(hold_id).map(|h| h.clone())
    }

    /// Atomically mark a hold released
    ///
    /// Flips the `released` flag under the hold's entry lock. Returns the
    /// released hold exactly once: a second caller racing on the same id
    /// observes the flag already set and gets `None`. Unknown ids also
    /// yield `None`.
    pub fn try_release_hold(&self, hold_id: &str) -> Option<Hold> {
        let mut entry = self.holds.get_mut(hold_id)?;
        if entry.released {
            return None;
        }
        entry.released = true;
        entry.released_at = Some(chrono::Utc::now());
        Some(entry.clone())
    }

    /// Snapshot of every hold in the store
    pub fn all_holds(&self) -> Vec<Hold> {
        self.holds.iter().map(|h| h.clone()).collect()
    }

    /// All holds recorded against an account, released ones included
    pub fn holds_for_account(&self, account_number: &str) -> Vec<Hold> {
        let mut holds: Vec<Hold> = self
            .holds
            .iter()
            .filter(|h| h.account_number == account_number)
            .map(|h| h.clone())
            .collect();
        holds.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        holds
    }

    // --- journal ---

    /// Append a journal entry outside an atomic unit
    ///
    /// Used for failed-attempt audit records. Entries are append-only.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateJournalEntry` if the journal id is already taken.
    pub fn append_journal(&self, entry: JournalEntry) -> Result<(), LedgerError> {
        if self.journal.contains_key(&entry.journal_id) {
            return Err(LedgerError::duplicate_journal_entry(&entry.journal_id));
        }
        self.journal_by_transaction
            .entry(entry.transaction_id.clone())
            .or_default()
            .push(entry.journal_id.clone());
        self.journal.insert(entry.journal_id.clone(), entry);
        Ok(())
    }

    /// All journal entries recorded for a transaction id, oldest first
    pub fn journal_for_transaction(&self, transaction_id: &str) -> Vec<JournalEntry> {
        let ids = match self.journal_by_transaction.get(transaction_id) {
            Some(ids) => ids.clone(),
            None => return Vec::new(),
        };
        let mut entries: Vec<JournalEntry> = ids
            .iter()
            .filter_map(|id| self.journal.get(id).map(|e| e.clone()))
            .collect();
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        entries
    }

    /// The committed journal entry for a transaction id, if any
    ///
    /// At most one committed entry can exist per transaction id; this is
    /// the idempotency check for transfer replay.
    pub fn committed_entry_for(&self, transaction_id: &str) -> Option<JournalEntry> {
        self.journal_for_transaction(transaction_id)
            .into_iter()
            .find(|e| e.committed)
    }

    /// Balance updates recorded against an account, oldest first
    pub fn balance_updates_for(&self, account_number: &str) -> Vec<BalanceUpdate> {
        self.balance_updates
            .get(account_number)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Most recent balance updates for an account, newest first
    pub fn get_transaction_history(
        &self,
        account_number: &str,
        limit: usize,
    ) -> Vec<BalanceUpdate> {
        let mut updates = self.balance_updates_for(account_number);
        updates.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        updates.truncate(limit);
        updates
    }

    // --- transaction records and decisions ---

    /// Store a transaction record for later risk analysis
    pub fn record_transaction(&self, record: TransactionRecord) {
        self.transactions
            .insert(record.transaction_id.clone(), record);
    }

    /// Attach an embedding to a stored transaction record
    ///
    /// Returns whether a record with this id existed to attach to.
    pub fn store_embedding(&self, transaction_id: &str, embedding: Vec<f32>) -> bool {
        match self.transactions.get_mut(transaction_id) {
            Some(mut record) => {
                record.embedding = Some(embedding);
                true
            }
            None => false,
        }
    }

    /// Fetch a stored transaction record
    pub fn get_transaction(&self, transaction_id: &str) -> Option<TransactionRecord> {
        self.transactions.get(transaction_id).map(|t| t.clone())
    }

    /// Snapshot of every stored transaction record
    pub fn transactions_snapshot(&self) -> Vec<TransactionRecord> {
        self.transactions.iter().map(|t| t.clone()).collect()
    }

    /// Store a risk decision for a transaction
    pub fn record_decision(&self, decision: DecisionRecord) {
        self.decisions
            .insert(decision.transaction_id.clone(), decision);
    }

    /// Fetch the decision recorded for a transaction, if any
    pub fn decision_for(&self, transaction_id: &str) -> Option<DecisionRecord> {
        self.decisions.get(transaction_id).map(|d| d.clone())
    }

    /// Sum of all account balances, for reconciliation checks
    pub fn total_balance(&self) -> Decimal {
        self.accounts
            .iter()
            .map(|entry| entry.account.balance)
            .sum()
    }
}

/// A staged multi-account mutation applied atomically
///
/// Reads performed through the unit record the account version seen;
/// [`TransferUnit::commit`] re-checks every recorded version under the
/// store's commit lock and applies all staged writes only if none has
/// moved. Either everything is applied or nothing is.
#[derive(Debug)]
pub struct TransferUnit<'a> {
    store: &'a LedgerStore,
    unit_id: String,
    started: Instant,
    reads: Vec<(String, u64)>,
    staged_accounts: Vec<Account>,
    staged_updates: Vec<BalanceUpdate>,
    staged_journal: Option<JournalEntry>,
}

impl TransferUnit<'_> {
    /// Identifier of this unit, carried on every record it produces
    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    /// Read an account and record its version for the commit check
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub fn read_account(&mut self, account_number: &str) -> Result<Account, LedgerError> {
        let entry = self
            .store
            .accounts
            .get(account_number)
            .ok_or_else(|| LedgerError::account_not_found(account_number))?;
        self.reads
            .push((account_number.to_string(), entry.version));
        Ok(entry.account.clone())
    }

    /// Stage a mutated account for commit
    pub fn stage_account(&mut self, account: Account) {
        self.staged_accounts.push(account);
    }

    /// Stage an audit balance update for commit
    pub fn stage_balance_update(&mut self, update: BalanceUpdate) {
        self.staged_updates.push(update);
    }

    /// Stage the journal entry for commit
    pub fn stage_journal(&mut self, entry: JournalEntry) {
        self.staged_journal = Some(entry);
    }

    /// Apply every staged write, or nothing
    ///
    /// # Errors
    ///
    /// - `CommitBudgetExceeded` if the unit outlived the configured
    ///   commit budget; no writes are applied.
    /// - `WriteConflict` if an account read through this unit changed
    ///   since, or if another unit already committed an entry for the
    ///   staged journal's transaction id; no writes are applied.
    /// - `DuplicateJournalEntry` if the staged journal id is taken.
    pub fn commit(self) -> Result<(), LedgerError> {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let budget_ms = self.store.config.commit_budget_ms;
        if elapsed_ms > budget_ms {
            warn!(unit_id = %self.unit_id, elapsed_ms, budget_ms, "commit budget exceeded");
            return Err(LedgerError::CommitBudgetExceeded {
                elapsed_ms,
                budget_ms,
            });
        }

        let _guard = self
            .store
            .commit_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        for (account_number, version) in &self.reads {
            let entry = self
                .store
                .accounts
                .get(account_number)
                .ok_or_else(|| LedgerError::account_not_found(account_number))?;
            if entry.version != *version {
                debug!(account_number, "version moved since read, refusing commit");
                return Err(LedgerError::write_conflict(account_number));
            }
        }

        if let Some(entry) = &self.staged_journal {
            if self.store.journal.contains_key(&entry.journal_id) {
                return Err(LedgerError::duplicate_journal_entry(&entry.journal_id));
            }
            // Holding the commit lock is the only point where this check
            // is race-free: a unit staging a committed entry for a
            // transaction id that already has one must not apply twice.
            if entry.committed && self.store.committed_entry_for(&entry.transaction_id).is_some() {
                debug!(
                    transaction_id = entry.transaction_id.as_str(),
                    "transaction already committed, refusing commit"
                );
                return Err(LedgerError::write_conflict(&entry.debit_account));
            }
        }

        for account in self.staged_accounts {
            if let Some(mut entry) = self.store.accounts.get_mut(&account.account_number) {
                entry.account = account;
                entry.version += 1;
            }
        }
        for update in self.staged_updates {
            self.store
                .balance_updates
                .entry(update.account_number.clone())
                .or_default()
                .push(update);
        }
        if let Some(entry) = self.staged_journal {
            self.store
                .journal_by_transaction
                .entry(entry.transaction_id.clone())
                .or_default()
                .push(entry.journal_id.clone());
            self.store.journal.insert(entry.journal_id.clone(), entry);
        }
        Ok(())
    }
}
