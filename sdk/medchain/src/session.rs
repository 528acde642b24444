use crate::errors::{Error, Result};
use crate::ports::{ChainClient, MetadataStore, Wallet};
use crate::types::Address;

/// The connected account together with the collaborators acting for it.
pub struct Session<'a, C, S> {
    account: Address,
    chain: &'a C,
    store: &'a S,
}

impl<C, S> Clone for Session<'_, C, S> {
    fn clone(&self) -> Self {
        Self {
            account: self.account.clone(),
            chain: self.chain,
            store: self.store,
        }
    }
}

impl<'a, C: ChainClient, S: MetadataStore> Session<'a, C, S> {
    pub fn new(account: Address, chain: &'a C, store: &'a S) -> Self {
        Self {
            account,
            chain,
            store,
        }
    }

    /// Opens a session for the wallet's current account.
    pub async fn connect<W: Wallet>(wallet: &W, chain: &'a C, store: &'a S) -> Result<Self> {
        match wallet.current_account().await? {
            Some(account) => Ok(Self::new(account, chain, store)),
            None => Err(Error::WalletNotConnected),
        }
    }

    /// Prompts the wallet for account access, then opens a session.
    pub async fn request<W: Wallet>(wallet: &W, chain: &'a C, store: &'a S) -> Result<Self> {
        let account = wallet.connect().await?;
        Ok(Self::new(account, chain, store))
    }

    /// Waits for the wallet to switch accounts and reopens the session for
    /// the new one. Views loaded for the old account must be reloaded.
    pub async fn follow_account_change<W: Wallet>(&self, wallet: &W) -> Result<Self> {
        match wallet.next_account_change().await? {
            Some(account) => {
                tracing::info!(from = %self.account, to = %account, "wallet account changed");
                Ok(Self::new(account, self.chain, self.store))
            }
            None => Err(Error::WalletNotConnected),
        }
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn chain(&self) -> &'a C {
        self.chain
    }

    pub fn store(&self) -> &'a S {
        self.store
    }
}
