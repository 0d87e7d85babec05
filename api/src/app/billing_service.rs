//! Billing service
//!
//! Credit top-up transactions (submit, approve, reject, amount override)
//! and one-time redeem codes (generate, redeem).

use std::sync::Arc;

use rand::Rng;

use crate::app::locks::UserLocks;
use crate::domain::entities::{
    normalize_code, NewTransaction, RedeemCode, Transaction, TransactionId, TransactionStatus,
    UserId, CODE_TOKEN_BYTES,
};
use crate::domain::ports::Storage;
use crate::error::{AppError, DomainError};

/// Upper bound on codes minted per request
const MAX_CODES_PER_BATCH: u32 = 100;

/// Service for transactions and redeem codes
pub struct BillingService {
    storage: Arc<dyn Storage>,
    locks: Arc<UserLocks>,
}

impl BillingService {
    pub fn new(storage: Arc<dyn Storage>, locks: Arc<UserLocks>) -> Self {
        Self { storage, locks }
    }

    /// List every transaction (admin operation)
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, AppError> {
        Ok(self.storage.get_transactions().await?)
    }

    /// Submit a top-up request; it starts out pending
    pub async fn submit(
        &self,
        user_id: &UserId,
        reference: &str,
        amount: i64,
    ) -> Result<Transaction, AppError> {
        if reference.trim().is_empty() {
            return Err(AppError::Domain(DomainError::Validation(
                "Transaction reference cannot be empty".to_string(),
            )));
        }
        if amount <= 0 {
            return Err(AppError::Domain(DomainError::Validation(
                "Transaction amount must be positive".to_string(),
            )));
        }

        Ok(self
            .storage
            .create_transaction(&NewTransaction {
                user_id: user_id.clone(),
                reference: reference.trim().to_string(),
                amount,
            })
            .await?)
    }

    /// Approve a pending transaction and credit its owner.
    ///
    /// The status flip is a one-shot compare-and-set; a missing owner leaves
    /// the approval standing and skips the grant with a warning.
    pub async fn approve(&self, id: &TransactionId) -> Result<Transaction, AppError> {
        let tx = self
            .storage
            .resolve_transaction(id, TransactionStatus::Approved)
            .await?;

        let _guard = self.locks.acquire(&tx.user_id).await;
        match self.storage.get_user(&tx.user_id).await? {
            Some(user) => {
                self.storage
                    .update_user_credits(&user.id, user.credits + tx.amount)
                    .await?;
                tracing::info!(
                    transaction = %tx.id,
                    user = %user.id,
                    amount = tx.amount,
                    "Transaction approved"
                );
            }
            None => {
                tracing::warn!(
                    transaction = %tx.id,
                    user = %tx.user_id,
                    "Approved transaction has no owning user; skipping credit grant"
                );
            }
        }

        Ok(tx)
    }

    /// Reject a pending transaction; no credit effect
    pub async fn reject(&self, id: &TransactionId) -> Result<Transaction, AppError> {
        Ok(self
            .storage
            .resolve_transaction(id, TransactionStatus::Rejected)
            .await?)
    }

    /// Overwrite a transaction's amount, independent of its status
    pub async fn set_amount(
        &self,
        id: &TransactionId,
        amount: i64,
    ) -> Result<Transaction, AppError> {
        if amount <= 0 {
            return Err(AppError::Domain(DomainError::Validation(
                "Transaction amount must be positive".to_string(),
            )));
        }
        Ok(self.storage.update_transaction_amount(id, amount).await?)
    }

    /// Mint a batch of redeem codes of a fixed value
    pub async fn generate_codes(
        &self,
        value: i64,
        count: u32,
    ) -> Result<Vec<RedeemCode>, AppError> {
        if value <= 0 {
            return Err(AppError::Domain(DomainError::Validation(
                "Code value must be positive".to_string(),
            )));
        }
        if count == 0 || count > MAX_CODES_PER_BATCH {
            return Err(AppError::Domain(DomainError::Validation(format!(
                "Code count must be between 1 and {}",
                MAX_CODES_PER_BATCH
            ))));
        }

        let mut codes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let token = generate_code_token();
            codes.push(self.storage.create_redeem_code(&token, value).await?);
        }
        Ok(codes)
    }

    /// Redeem a code for the caller and credit its value.
    ///
    /// The claim itself is atomic in the store; the credit grant runs under
    /// the redeemer's lock.
    pub async fn redeem(&self, user_id: &UserId, code: &str) -> Result<RedeemCode, AppError> {
        let token = normalize_code(code);

        let _guard = self.locks.acquire(user_id).await;
        let claimed = self.storage.claim_redeem_code(&token, user_id).await?;

        let user = self
            .storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;
        self.storage
            .update_user_credits(&user.id, user.credits + claimed.value)
            .await?;

        tracing::info!(user = %user_id, value = claimed.value, "Code redeemed");
        Ok(claimed)
    }
}

/// Generate a random code token: CSPRNG bytes, hex, uppercased
fn generate_code_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..CODE_TOKEN_BYTES).map(|_| rng.gen()).collect();
    hex::encode(bytes).to_uppercase()
}
