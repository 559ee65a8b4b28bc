//! Long-lived RPC client
//!
//! Reads the accounts zap composition depends on and sends or simulates the
//! composed instruction lists. Discovery runs against an in-memory snapshot
//! so one RPC round trip covers the pair and its bitmap extension.

use std::{sync::Arc, time::Duration};

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use spl_token::{solana_program::program_pack::Pack, state::Account as TokenAccount};
use tracing::{debug, info, instrument, warn};

use crate::config::SdkConfig;
use crate::discovery;
use crate::errors::{SdkError, SdkResult};
use crate::pda::derive_bitmap_extension;
use crate::store::InMemoryAccountStore;

pub struct ZapClient {
    rpc: Arc<RpcClient>,
    config: SdkConfig,
}

impl ZapClient {
    pub fn new(config: SdkConfig) -> SdkResult<Self> {
        config.validate()?;
        let rpc = RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            Duration::from_secs(config.timeout_secs),
            config.commitment_config()?,
        );
        Ok(Self {
            rpc: Arc::new(rpc),
            config,
        })
    }

    /// Share an existing RPC connection
    pub fn with_rpc(rpc: Arc<RpcClient>, config: SdkConfig) -> SdkResult<Self> {
        config.validate()?;
        Ok(Self { rpc, config })
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Raw account data, `None` when the account does not exist
    pub async fn get_account_data(&self, address: &Pubkey) -> SdkResult<Option<Vec<u8>>> {
        let accounts = self.rpc.get_multiple_accounts(&[*address]).await?;
        Ok(accounts.into_iter().next().flatten().map(|account| account.data))
    }

    /// Token amount held by an SPL token or token-2022 account
    pub async fn token_balance(&self, token_account: &Pubkey) -> SdkResult<u64> {
        let data = self
            .get_account_data(token_account)
            .await?
            .ok_or_else(|| SdkError::AccountNotFound(token_account.to_string()))?;
        // Token-2022 extensions follow the base layout
        let base = data.get(..TokenAccount::LEN).ok_or_else(|| {
            SdkError::SerializationError(format!("{} is not a token account", token_account))
        })?;
        let account = TokenAccount::unpack_from_slice(base)
            .map_err(|e| SdkError::SerializationError(format!("{}: {}", token_account, e)))?;
        Ok(account.amount)
    }

    /// Fetch `addresses` in one request into an in-memory store. Missing
    /// accounts are left out.
    #[instrument(skip(self, addresses), fields(count = addresses.len()))]
    pub async fn snapshot(&self, addresses: &[Pubkey]) -> SdkResult<InMemoryAccountStore> {
        let accounts = self.rpc.get_multiple_accounts(addresses).await?;
        let store: InMemoryAccountStore = addresses
            .iter()
            .zip(accounts)
            .filter_map(|(address, account)| account.map(|account| (*address, account.data)))
            .collect();
        debug!(found = store.len(), "fetched account snapshot");
        Ok(store)
    }

    /// Writable bin arrays for a liquidity book swap, next liquid array first
    pub async fn bin_arrays_for_swap(&self, lb_pair: &Pubkey, swap_for_y: bool) -> SdkResult<Vec<AccountMeta>> {
        let lb_program = self.config.lb_program_id;
        let (extension, _) = derive_bitmap_extension(&lb_program, lb_pair);
        let store = self.snapshot(&[*lb_pair, extension]).await?;
        discovery::bin_arrays_for_swap(
            &store,
            &lb_program,
            lb_pair,
            swap_for_y,
            self.config.bin_arrays_per_swap,
        )
    }

    /// Output-side pre-balance and swap bin arrays, fetched concurrently
    pub async fn swap_context(
        &self,
        output_token_account: &Pubkey,
        lb_pair: &Pubkey,
        swap_for_y: bool,
    ) -> SdkResult<(u64, Vec<AccountMeta>)> {
        tokio::try_join!(
            self.token_balance(output_token_account),
            self.bin_arrays_for_swap(lb_pair, swap_for_y)
        )
    }

    fn transaction(&self, instructions: &[Instruction], signers: &[&Keypair], blockhash: solana_sdk::hash::Hash) -> SdkResult<Transaction> {
        let payer = signers
            .first()
            .ok_or_else(|| SdkError::InvalidParameter("at least one signer is required".to_string()))?;
        Ok(Transaction::new_signed_with_payer(
            instructions,
            Some(&payer.pubkey()),
            signers,
            blockhash,
        ))
    }

    /// Send the instructions as one transaction, first signer paying
    pub async fn send_instructions(&self, instructions: &[Instruction], signers: &[&Keypair]) -> SdkResult<Signature> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let tx = self.transaction(instructions, signers, blockhash)?;
        let signature = self.rpc.send_and_confirm_transaction(&tx).await?;
        info!(%signature, instructions = instructions.len(), "transaction confirmed");
        Ok(signature)
    }

    /// Simulate the instructions and return the program logs
    pub async fn simulate_instructions(&self, instructions: &[Instruction], signers: &[&Keypair]) -> SdkResult<Vec<String>> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let tx = self.transaction(instructions, signers, blockhash)?;
        let result = self.rpc.simulate_transaction(&tx).await?.value;
        let logs = result.logs.unwrap_or_default();
        if let Some(err) = result.err {
            warn!(?err, "simulation failed");
            return Err(SdkError::SimulationError(format!("{:?}: {}", err, logs.join("\n"))));
        }
        Ok(logs)
    }
}
