//! Payment flow: history lookup, build, sign, broadcast.
//!
//! Two sends racing on one session could select the same outputs and
//! double-spend; [`SendLocks`] serializes them per session token unless
//! `WALLET_SEND_LOCK` turns it off.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use dda_core::amount::from_subunits;
use dda_core::{Address, NetworkParams};
use dda_rpc::{RpcClient, SearchOptions};
use dda_wallet::{InMemorySessionStore, Session, TransactionBuilder, balance_from_txs};

use crate::error::{ApiError, ApiResult};

/// Per-session send mutexes.
pub struct SendLocks {
    enabled: bool,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SendLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locks: DashMap::new(),
        }
    }

    /// Wait for exclusive send rights on `token`. `None` when locking is off.
    pub async fn acquire(&self, token: &str) -> Option<OwnedMutexGuard<()>> {
        if !self.enabled {
            return None;
        }
        let lock = Arc::clone(
            self.locks
                .entry(token.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        Some(lock.lock_owned().await)
    }

    /// Drop the mutex of a finished session.
    pub fn forget(&self, token: &str) {
        self.locks.remove(token);
    }

    /// Drop every mutex nobody holds or waits on. Returns how many went.
    ///
    /// `acquire` clones the `Arc` under the map's shard lock, so a count of
    /// one here means no sender can be between lookup and lock.
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }
}

/// Periodic cleanup: expired sessions and the idle send mutexes they leave
/// behind, including those of sessions already evicted on lookup.
pub fn sweep(sessions: &InMemorySessionStore, locks: &SendLocks) {
    let sessions_removed = sessions.purge_expired();
    let locks_removed = locks.prune_idle();
    if sessions_removed + locks_removed > 0 {
        debug!(sessions_removed, locks_removed, "sweep finished");
    }
}

/// Settings the send flow needs from the server config.
#[derive(Clone, Copy, Debug)]
pub struct SendPolicy {
    pub fee_per_kb: u64,
    pub history_limit: u32,
}

/// Pay `amount` subunits to `to` from the session's address. Returns the
/// broadcast txid.
pub async fn send_payment(
    rpc: &RpcClient,
    session: &Session,
    params: &NetworkParams,
    policy: SendPolicy,
    to: &Address,
    amount: u64,
) -> ApiResult<String> {
    let from = session.address.as_str();
    let history = rpc
        .search_raw_transactions(from, SearchOptions::first(policy.history_limit))
        .await?;
    let summary = balance_from_txs(Some(history.as_slice()), from);
    if summary.balance < amount {
        return Err(ApiError::bad_request(format!(
            "Insufficient balance. Have {} DDACOIN.",
            from_subunits(summary.balance)
        )));
    }

    let key = session.credential.derive(params)?;
    let mut builder = TransactionBuilder::new();
    builder
        .add_recipient(to.clone(), amount)
        .set_change_address(session.address.clone())
        .set_fee_per_kb(policy.fee_per_kb);
    let signed = builder.build_and_sign(&key, &summary.utxos, rpc).await?;

    let txid = rpc.send_raw_transaction(&signed.hex).await.inspect_err(|e| {
        warn!(error = %e, local_txid = %signed.txid, "broadcast rejected");
    })?;
    info!(
        %txid,
        to = %to,
        amount,
        fee = signed.fee,
        inputs = signed.input_count,
        "payment broadcast"
    );
    Ok(txid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dda_wallet::SessionStore;
    use std::time::Duration;

    #[tokio::test]
    async fn lock_serializes_same_token() {
        let locks = Arc::new(SendLocks::new(true));
        let guard = locks.acquire("t").await.unwrap();

        let other = Arc::clone(&locks);
        let waiter = tokio::spawn(async move { other.acquire("t").await.is_some() });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn different_tokens_do_not_block() {
        let locks = SendLocks::new(true);
        let _a = locks.acquire("a").await.unwrap();
        let b = tokio::time::timeout(Duration::from_millis(50), locks.acquire("b")).await;
        assert!(b.unwrap().is_some());
    }

    #[tokio::test]
    async fn disabled_locks_hand_out_nothing() {
        let locks = SendLocks::new(false);
        assert!(locks.acquire("t").await.is_none());
        assert!(locks.acquire("t").await.is_none());
    }

    #[tokio::test]
    async fn forget_removes_entry() {
        let locks = SendLocks::new(true);
        drop(locks.acquire("t").await);
        assert_eq!(locks.locks.len(), 1);
        locks.forget("t");
        assert!(locks.locks.is_empty());
    }

    #[tokio::test]
    async fn sweep_drops_locks_of_expired_sessions() {
        let params = dda_core::Network::Mainnet.params();
        let sessions = InMemorySessionStore::with_ttl(chrono::Duration::milliseconds(5));
        let locks = SendLocks::new(true);

        for _ in 0..50 {
            let key = dda_wallet::DerivedKey::random(params);
            let credential = dda_wallet::Credential::wif(&key.to_wif(params));
            let token = sessions.create(credential, key.address).await;
            drop(locks.acquire(&token).await);
        }
        assert_eq!(locks.locks.len(), 50);

        tokio::time::sleep(Duration::from_millis(20)).await;
        sweep(&sessions, &locks);
        assert!(sessions.is_empty());
        assert_eq!(locks.locks.len(), 0);
    }

    #[tokio::test]
    async fn prune_keeps_held_locks() {
        let locks = SendLocks::new(true);
        let held = locks.acquire("busy").await;
        drop(locks.acquire("idle").await);

        assert_eq!(locks.prune_idle(), 1);
        assert_eq!(locks.locks.len(), 1);

        drop(held);
        assert_eq!(locks.prune_idle(), 1);
        assert_eq!(locks.locks.len(), 0);
    }
}
