use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use async_trait::async_trait;
use ethers::abi::parse_abi;
use ethers::contract::{AbiError, BaseContract};
use ethers::providers::{Http, Middleware, Provider, ProviderError};
use ethers::signers::{LocalWallet, Signer, WalletError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, H256, U256, U64};
use log::info;
use thiserror::Error;

use crate::config::Config;
use crate::helper::Helper;

/// Surface of the on-chain info store. Only `updateInfo` mutates state.
pub const INFO_STORE_ABI: &[&str] = &[
    "function encodedChatGPTInfo() external view returns (string)",
    "function owner() external view returns (address)",
    "function renounceOwnership() external",
    "function transferOwnership(address newOwner) external",
    "function updateInfo(string _newInfo) external",
    "event ChatGPTInfoUpdated(string newInfo)",
    "event OwnershipTransferred(address indexed previousOwner, address indexed newOwner)",
];

const UPDATE_FN: &str = "updateInfo";
const READ_FN: &str = "encodedChatGPTInfo";

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("refusing to write an empty sentence")]
    EmptySentence,

    #[error("invalid signing key: {0}")]
    Signer(#[from] WalletError),

    #[error("invalid contract address {0:?}")]
    ContractAddress(String),

    #[error("could not encode call: {0}")]
    Encode(#[from] AbiError),

    #[error("rpc error: {0}")]
    Rpc(#[from] ProviderError),

    #[error("transaction {0:#x} dropped before it was mined")]
    Dropped(H256),
}

/// What came back from a mined update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub tx_hash: H256,
    pub status: Option<U64>,
}

impl WriteOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == Some(U64::one())
    }
}

#[async_trait]
pub trait ChainWriter: Send + Sync {
    /// Submit `sentence` as the new stored info and wait for its receipt.
    async fn write(&self, sentence: &str) -> Result<WriteOutcome, WriteError>;
}

pub fn info_store() -> Result<BaseContract> {
    Ok(BaseContract::from(parse_abi(INFO_STORE_ABI)?))
}

/// Legacy transaction calling the store with prebuilt calldata.
pub fn build_update_tx(
    contract: Address,
    from: Address,
    calldata: Bytes,
    nonce: U256,
    gas_limit: u64,
    gas_price: U256,
    chain_id: u64,
) -> TypedTransaction {
    TransactionRequest::new()
        .to(contract)
        .from(from)
        .data(calldata)
        .nonce(nonce)
        .gas(gas_limit)
        .gas_price(gas_price)
        .chain_id(chain_id)
        .into()
}

/// Chain ids past `u64::MAX` cannot be signed for.
pub fn chain_id_from(raw: U256) -> Result<u64> {
    u64::try_from(raw).map_err(|_| anyhow!("node reported chain id {} which does not fit in u64", raw))
}

pub struct InfoStoreWriter {
    provider: Provider<Http>,
    store: BaseContract,
    chain_id: u64,
    private_key: String,
    contract_address: String,
    gas_limit: u64,
}

impl InfoStoreWriter {
    /// Opens the node connection and confirms it answers `eth_chainId`.
    pub async fn connect(config: &Config) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())?
            .interval(RECEIPT_POLL_INTERVAL);
        let chain_id = chain_id_from(provider.get_chainid().await?)?;
        info!("Node at {} answered, chain id {}", config.rpc_url, chain_id);

        Self::with_provider(provider, chain_id, config)
    }

    /// Skips the connectivity check.
    pub fn with_provider(provider: Provider<Http>, chain_id: u64, config: &Config) -> Result<Self> {
        Ok(Self {
            provider,
            store: info_store()?,
            chain_id,
            private_key: config.private_key.clone(),
            contract_address: config.contract_address.clone(),
            gas_limit: config.gas_limit,
        })
    }

    fn wallet(&self) -> Result<LocalWallet, WriteError> {
        let wallet = self
            .private_key
            .trim()
            .trim_start_matches("0x")
            .parse::<LocalWallet>()?;
        Ok(wallet.with_chain_id(self.chain_id))
    }

    pub fn signer_address(&self) -> Result<Address, WriteError> {
        Ok(self.wallet()?.address())
    }

    fn contract(&self) -> Result<Address, WriteError> {
        self.contract_address
            .trim()
            .parse::<Address>()
            .map_err(|_| WriteError::ContractAddress(self.contract_address.clone()))
    }

    pub fn update_calldata(&self, sentence: &str) -> Result<Bytes, WriteError> {
        Ok(self.store.encode(UPDATE_FN, sentence.to_string())?)
    }

    /// Read-only call of the stored info string.
    pub async fn current_info(&self) -> Result<String, WriteError> {
        let calldata = self.store.encode(READ_FN, ())?;
        let tx: TypedTransaction = TransactionRequest::new()
            .to(self.contract()?)
            .data(calldata)
            .into();
        let raw = self.provider.call(&tx, None).await?;
        Ok(self.store.decode_output(READ_FN, raw)?)
    }
}

#[async_trait]
impl ChainWriter for InfoStoreWriter {
    async fn write(&self, sentence: &str) -> Result<WriteOutcome, WriteError> {
        if sentence.is_empty() {
            return Err(WriteError::EmptySentence);
        }
        info!("Attempting to update on-chain info with: '{}'", sentence);

        let wallet = self.wallet()?;
        let from = wallet.address();
        let contract = self.contract()?;

        let nonce = self.provider.get_transaction_count(from, None).await?;
        let gas_price = self.provider.get_gas_price().await?;
        let calldata = self.update_calldata(sentence)?;

        let tx = build_update_tx(
            contract,
            from,
            calldata,
            nonce,
            self.gas_limit,
            gas_price,
            self.chain_id,
        );
        let signature = wallet.sign_transaction(&tx).await?;
        let raw = tx.rlp_signed(&signature);

        let pending = self.provider.send_raw_transaction(raw).await?;
        let tx_hash = pending.tx_hash();
        info!("Transaction sent. Tx Hash: {}", Helper::tx_hex(&tx_hash));

        let receipt = pending.await?.ok_or(WriteError::Dropped(tx_hash))?;

        Ok(WriteOutcome {
            tx_hash,
            status: receipt.status,
        })
    }
}
