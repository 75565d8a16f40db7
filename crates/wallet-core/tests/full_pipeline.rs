//! Cross-crate integration tests exercising the full pipeline:
//! mnemonic -> derive accounts -> fund -> sign -> relay.
//!
//! Chain data comes from an in-memory source so every path, including the
//! failure ones, runs without a network.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use chain_btc::address::address_to_script;
use chain_btc::source::{ChainInput, ChainOutput, ChainSource, ChainTransaction, ChainTxStatus};
use chain_btc::transaction::decode_raw_transaction;
use tracing_subscriber::fmt::MakeWriter;
use wallet_core::*;

const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// P2WPKH testnet address of private key 1.
const DESTINATION: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";

const FUNDING_TXID: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

const NETWORK: BtcNetwork = BtcNetwork::Testnet;

#[derive(Default)]
struct MockChain {
    utxos: Vec<Utxo>,
    raw_txs: HashMap<String, String>,
    fees: Option<FeeRateTier>,
    offline: bool,
    reject_with: Option<String>,
    history: Vec<ChainTransaction>,
    broadcasts: Mutex<Vec<String>>,
}

impl MockChain {
    fn with_utxos(utxos: Vec<Utxo>) -> Self {
        Self {
            utxos,
            ..Default::default()
        }
    }

    fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().unwrap().len()
    }

    fn last_broadcast(&self) -> Transaction {
        let raw = self.broadcasts.lock().unwrap().last().cloned().unwrap();
        decode_raw_transaction(&raw).unwrap()
    }
}

fn offline_error(what: &str) -> SourceError {
    SourceError::Timeout {
        url: format!("mock://{what}"),
    }
}

#[async_trait]
impl ChainSource for MockChain {
    async fn utxos(&self, _network: BtcNetwork, _address: &str) -> Result<Vec<Utxo>, SourceError> {
        if self.offline {
            return Err(offline_error("utxo"));
        }
        Ok(self.utxos.clone())
    }

    async fn raw_transaction(
        &self,
        _network: BtcNetwork,
        txid: &str,
    ) -> Result<String, SourceError> {
        self.raw_txs
            .get(txid)
            .cloned()
            .ok_or_else(|| SourceError::Status {
                url: format!("mock://tx/{txid}/hex"),
                status: 404,
                body: "Transaction not found".into(),
            })
    }

    async fn fee_estimates(&self, _network: BtcNetwork) -> Result<FeeRateTier, SourceError> {
        self.fees.ok_or_else(|| offline_error("fees"))
    }

    async fn broadcast(&self, _network: BtcNetwork, raw_hex: &str) -> Result<String, SourceError> {
        self.broadcasts.lock().unwrap().push(raw_hex.to_string());
        if let Some(reason) = &self.reject_with {
            return Err(SourceError::Status {
                url: "mock://tx".into(),
                status: 400,
                body: reason.clone(),
            });
        }
        let tx = decode_raw_transaction(raw_hex).unwrap();
        Ok(tx.compute_txid().to_string())
    }

    async fn address_transactions(
        &self,
        _network: BtcNetwork,
        _address: &str,
    ) -> Result<Vec<ChainTransaction>, SourceError> {
        if self.offline {
            return Err(offline_error("history"));
        }
        Ok(self.history.clone())
    }

    async fn transaction(
        &self,
        _network: BtcNetwork,
        txid: &str,
    ) -> Result<ChainTransaction, SourceError> {
        if self.offline {
            return Err(offline_error("tx"));
        }
        self.history
            .iter()
            .find(|tx| tx.txid == txid)
            .cloned()
            .ok_or_else(|| SourceError::Status {
                url: format!("mock://tx/{txid}"),
                status: 404,
                body: "Transaction not found".into(),
            })
    }
}

fn accounts() -> Vec<Account> {
    let seed = mnemonic_to_seed(TEST_MNEMONIC, "").unwrap();
    derive_accounts_from_seed(NETWORK, &seed).unwrap()
}

fn account(script_type: ScriptType) -> Account {
    accounts()
        .into_iter()
        .find(|a| a.script_type == script_type)
        .unwrap()
}

fn confirmed(txid: &str, vout: u32, value_sats: u64) -> Utxo {
    Utxo {
        txid: txid.to_string(),
        vout,
        value_sats,
        confirmed: true,
    }
}

/// A transaction paying `value` to `address` at output 0.
fn funding_tx(address: &str, value: u64) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::new(Txid::from_byte_array([7u8; 32]), 0),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(value),
            script_pubkey: address_to_script(address, NETWORK).unwrap(),
        }],
    }
}

/// Chain holding one confirmed 100,000 sat output for `account`.
fn funded_chain(account: &Account) -> MockChain {
    match account.script_type {
        ScriptType::Legacy => {
            let funding = funding_tx(&account.address, 100_000);
            let txid = funding.compute_txid().to_string();
            let mut chain = MockChain::with_utxos(vec![confirmed(&txid, 0, 100_000)]);
            chain
                .raw_txs
                .insert(txid, bitcoin::consensus::encode::serialize_hex(&funding));
            chain
        }
        _ => MockChain::with_utxos(vec![confirmed(FUNDING_TXID, 0, 100_000)]),
    }
}

fn request(account: &Account, value_sats: u64) -> TransactionRequest {
    TransactionRequest::new(
        account.address.as_str(),
        DESTINATION,
        value_sats,
        account.script_type,
        account.private_key_hex(),
    )
}

fn output_values(tx: &Transaction) -> Vec<u64> {
    tx.output.iter().map(|o| o.value.to_sat()).collect()
}

// ─── Send: every derived account ────────────────────────────────────

#[tokio::test]
async fn send_from_every_derived_account() {
    for account in accounts() {
        let wallet = Wallet::new(funded_chain(&account));
        let req = request(&account, 50_000).with_fee_rate(10);

        let result = wallet.build_and_send(NETWORK, &req).await.unwrap();

        let chain = wallet.source();
        assert_eq!(chain.broadcast_count(), 1, "{}", account.script_type);
        let tx = chain.last_broadcast();
        assert_eq!(result.txid, tx.compute_txid().to_string());
        assert_eq!(output_values(&tx), vec![50_000, 48_460]);
        assert_eq!(
            tx.output[0].script_pubkey,
            address_to_script(DESTINATION, NETWORK).unwrap()
        );
        assert_eq!(
            tx.output[1].script_pubkey,
            address_to_script(&account.address, NETWORK).unwrap()
        );

        let input = &tx.input[0];
        match account.script_type {
            ScriptType::NativeSegwit => {
                assert!(input.script_sig.is_empty());
                assert_eq!(input.witness.len(), 2);
            }
            ScriptType::NestedSegwit => {
                assert!(!input.script_sig.is_empty());
                assert_eq!(input.witness.len(), 2);
            }
            ScriptType::Taproot => {
                assert!(input.script_sig.is_empty());
                assert_eq!(input.witness.len(), 1);
                assert_eq!(input.witness.nth(0).unwrap().len(), 64);
            }
            ScriptType::Legacy => {
                assert!(!input.script_sig.is_empty());
                assert!(input.witness.is_empty());
            }
        }
    }
}

#[tokio::test]
async fn send_spends_the_listed_outpoint() {
    let account = account(ScriptType::NativeSegwit);
    let wallet = Wallet::new(funded_chain(&account));
    let req = request(&account, 50_000).with_fee_rate(10);

    wallet.build_and_send(NETWORK, &req).await.unwrap();

    let tx = wallet.source().last_broadcast();
    assert_eq!(tx.input.len(), 1);
    assert_eq!(tx.input[0].previous_output.txid.to_string(), FUNDING_TXID);
    assert_eq!(tx.input[0].previous_output.vout, 0);
}

// ─── Funding arithmetic ─────────────────────────────────────────────

#[tokio::test]
async fn one_input_two_outputs_at_ten_sat_per_vbyte() {
    let account = account(ScriptType::NativeSegwit);
    let wallet = Wallet::new(funded_chain(&account));
    let req = request(&account, 50_000).with_fee_rate(10);

    let signed = wallet.build_signed_transaction(NETWORK, &req).await.unwrap();

    assert_eq!(signed.draft.estimated_vsize, 154);
    assert_eq!(signed.draft.fee_sats, 1_540);
    assert_eq!(signed.draft.change_sats, 48_460);
    assert_eq!(signed.fee_rate_sat_vbyte, 10);
    assert_eq!(wallet.source().broadcast_count(), 0);
}

#[tokio::test]
async fn all_confirmed_utxos_are_spent() {
    let account = account(ScriptType::Taproot);
    let chain = MockChain::with_utxos(vec![
        confirmed(FUNDING_TXID, 0, 30_000),
        confirmed(FUNDING_TXID, 1, 40_000),
    ]);
    let wallet = Wallet::new(chain);
    let req = request(&account, 50_000).with_fee_rate(10);

    wallet.build_and_send(NETWORK, &req).await.unwrap();

    let tx = wallet.source().last_broadcast();
    assert_eq!(tx.input.len(), 2);
    // ceil(10.5 + 2 * 57.25 + 2 * 43) = 211 vB
    assert_eq!(output_values(&tx), vec![50_000, 70_000 - 50_000 - 2_110]);
}

#[tokio::test]
async fn zero_change_is_omitted() {
    let account = account(ScriptType::NativeSegwit);
    let wallet = Wallet::new(MockChain::with_utxos(vec![confirmed(
        FUNDING_TXID,
        0,
        51_540,
    )]));
    let req = request(&account, 50_000).with_fee_rate(10);

    wallet.build_and_send(NETWORK, &req).await.unwrap();

    assert_eq!(output_values(&wallet.source().last_broadcast()), vec![50_000]);
}

#[tokio::test]
async fn insufficient_funds_never_broadcasts() {
    let account = account(ScriptType::NativeSegwit);
    let wallet = Wallet::new(MockChain::with_utxos(vec![confirmed(FUNDING_TXID, 0, 1_000)]));
    let req = request(&account, 50_000).with_fee_rate(10);

    let err = wallet.build_and_send(NETWORK, &req).await.unwrap_err();

    assert!(matches!(
        err,
        WalletError::InsufficientFunds {
            available: 1_000,
            required: 51_540
        }
    ));
    assert_eq!(wallet.source().broadcast_count(), 0);
}

#[tokio::test]
async fn unconfirmed_outputs_are_not_spendable() {
    let account = account(ScriptType::NativeSegwit);
    let mut pending = confirmed(FUNDING_TXID, 1, 500_000);
    pending.confirmed = false;
    let wallet = Wallet::new(MockChain::with_utxos(vec![
        confirmed(FUNDING_TXID, 0, 1_000),
        pending,
    ]));
    let req = request(&account, 50_000).with_fee_rate(10);

    let err = wallet.build_and_send(NETWORK, &req).await.unwrap_err();

    assert!(matches!(
        err,
        WalletError::InsufficientFunds {
            available: 1_000,
            ..
        }
    ));
}

#[tokio::test]
async fn empty_address_is_insufficient() {
    let account = account(ScriptType::Legacy);
    let wallet = Wallet::new(MockChain::default());
    let req = request(&account, 1).with_fee_rate(1);

    let err = wallet.build_and_send(NETWORK, &req).await.unwrap_err();

    assert!(matches!(
        err,
        WalletError::InsufficientFunds { available: 0, .. }
    ));
}

// ─── Fee rate selection ─────────────────────────────────────────────

fn tiers() -> FeeRateTier {
    FeeRateTier {
        fastest: 20,
        half_hour: 15,
        hour: 10,
        economy: 5,
        minimum: 1,
    }
}

#[tokio::test]
async fn default_fee_rate_is_fastest_tier() {
    let account = account(ScriptType::NativeSegwit);
    let mut chain = funded_chain(&account);
    chain.fees = Some(tiers());
    let wallet = Wallet::new(chain);

    let signed = wallet
        .build_signed_transaction(NETWORK, &request(&account, 50_000))
        .await
        .unwrap();

    assert_eq!(signed.fee_rate_sat_vbyte, 20);
    assert_eq!(signed.draft.fee_sats, 3_080);
    assert_eq!(signed.draft.change_sats, 46_920);
}

#[tokio::test]
async fn named_tier_is_honoured() {
    let account = account(ScriptType::NativeSegwit);
    let mut chain = funded_chain(&account);
    chain.fees = Some(tiers());
    let wallet = Wallet::new(chain);
    let req = request(&account, 50_000).with_fee_tier(FeeRate::Tier(FeeTier::Economy));

    let signed = wallet.build_signed_transaction(NETWORK, &req).await.unwrap();

    assert_eq!(signed.fee_rate_sat_vbyte, 5);
    assert_eq!(signed.draft.fee_sats, 770);
}

#[tokio::test]
async fn custom_rate_skips_the_oracle() {
    let account = account(ScriptType::NativeSegwit);
    // No fee estimates available: a tier request would fail.
    let wallet = Wallet::new(funded_chain(&account));
    let req = request(&account, 50_000).with_fee_rate(3);

    let signed = wallet.build_signed_transaction(NETWORK, &req).await.unwrap();
    assert_eq!(signed.draft.fee_sats, 462);
}

#[tokio::test]
async fn fee_oracle_failure_aborts() {
    let account = account(ScriptType::NativeSegwit);
    let wallet = Wallet::new(funded_chain(&account));

    let err = wallet
        .build_and_send(NETWORK, &request(&account, 50_000))
        .await
        .unwrap_err();

    assert!(matches!(err, WalletError::FeeEstimate(_)));
    assert!(err.is_retryable());
    assert_eq!(wallet.source().broadcast_count(), 0);
}

#[tokio::test]
async fn get_fee_rates_passes_tiers_through() {
    let mut chain = MockChain::default();
    chain.fees = Some(tiers());
    let wallet = Wallet::new(chain);
    assert_eq!(wallet.get_fee_rates(NETWORK).await.unwrap(), tiers());

    let wallet = Wallet::new(MockChain::default());
    assert!(matches!(
        wallet.get_fee_rates(NETWORK).await,
        Err(WalletError::FeeEstimate(_))
    ));
}

// ─── Failures ───────────────────────────────────────────────────────

#[tokio::test]
async fn utxo_fetch_failure_aborts() {
    let account = account(ScriptType::NativeSegwit);
    let chain = MockChain {
        offline: true,
        ..Default::default()
    };
    let wallet = Wallet::new(chain);
    let req = request(&account, 50_000).with_fee_rate(10);

    let err = wallet.build_and_send(NETWORK, &req).await.unwrap_err();

    assert!(matches!(err, WalletError::UtxoFetch(_)));
    assert_eq!(wallet.source().broadcast_count(), 0);
}

#[tokio::test]
async fn missing_legacy_funding_tx_is_a_fetch_error() {
    let account = account(ScriptType::Legacy);
    let wallet = Wallet::new(MockChain::with_utxos(vec![confirmed(
        FUNDING_TXID,
        0,
        100_000,
    )]));
    let req = request(&account, 50_000).with_fee_rate(10);

    let err = wallet.build_and_send(NETWORK, &req).await.unwrap_err();

    assert!(matches!(err, WalletError::UtxoFetch(_)));
    assert_eq!(wallet.source().broadcast_count(), 0);
}

#[tokio::test]
async fn broadcast_rejection_carries_node_reason() {
    let account = account(ScriptType::NativeSegwit);
    let mut chain = funded_chain(&account);
    chain.reject_with = Some("sendrawtransaction RPC error: min relay fee not met".into());
    let wallet = Wallet::new(chain);
    let req = request(&account, 50_000).with_fee_rate(10);

    let err = wallet.build_and_send(NETWORK, &req).await.unwrap_err();

    match err {
        WalletError::Broadcast { reason, .. } => {
            assert_eq!(reason, "sendrawtransaction RPC error: min relay fee not met")
        }
        other => panic!("expected broadcast error, got {other:?}"),
    }
    assert_eq!(wallet.source().broadcast_count(), 1);
}

#[tokio::test]
async fn rejects_zero_value() {
    let account = account(ScriptType::NativeSegwit);
    let wallet = Wallet::new(funded_chain(&account));
    let err = wallet
        .build_and_send(NETWORK, &request(&account, 0).with_fee_rate(10))
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidRequest(_)));
}

#[tokio::test]
async fn rejects_zero_custom_fee_rate() {
    let account = account(ScriptType::NativeSegwit);
    let wallet = Wallet::new(funded_chain(&account));
    let err = wallet
        .build_and_send(NETWORK, &request(&account, 1_000).with_fee_rate(0))
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidRequest(_)));
}

#[tokio::test]
async fn rejects_payment_to_self() {
    let account = account(ScriptType::NativeSegwit);
    let wallet = Wallet::new(funded_chain(&account));
    let mut req = request(&account, 1_000).with_fee_rate(10);
    req.to_address = account.address.clone();

    let err = wallet.build_and_send(NETWORK, &req).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidRequest(_)));
}

#[tokio::test]
async fn rejects_destination_on_other_network() {
    let account = account(ScriptType::NativeSegwit);
    let wallet = Wallet::new(funded_chain(&account));
    let mut req = request(&account, 1_000).with_fee_rate(10);
    req.to_address = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4".into();

    let err = wallet.build_and_send(NETWORK, &req).await.unwrap_err();
    assert!(matches!(err, WalletError::AddressValidation(_)));
}

#[tokio::test]
async fn rejects_source_address_of_another_script_type() {
    let native = account(ScriptType::NativeSegwit);
    let taproot = account(ScriptType::Taproot);
    let wallet = Wallet::new(funded_chain(&native));
    // Native SegWit key, taproot source address.
    let req = TransactionRequest::new(
        taproot.address.as_str(),
        DESTINATION,
        1_000,
        ScriptType::NativeSegwit,
        native.private_key_hex(),
    )
    .with_fee_rate(10);

    let err = wallet.build_and_send(NETWORK, &req).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidRequest(_)));
    assert_eq!(wallet.source().broadcast_count(), 0);
}

#[tokio::test]
async fn rejects_malformed_private_key() {
    let account = account(ScriptType::NativeSegwit);
    let wallet = Wallet::new(funded_chain(&account));
    let req = TransactionRequest::new(
        account.address.as_str(),
        DESTINATION,
        1_000,
        ScriptType::NativeSegwit,
        "zz",
    )
    .with_fee_rate(10);

    let err = wallet.build_and_send(NETWORK, &req).await.unwrap_err();
    assert!(matches!(err, WalletError::KeyDerivation(_)));
}

#[tokio::test]
async fn legacy_value_disagreeing_with_funding_tx_never_broadcasts() {
    let account = account(ScriptType::Legacy);
    let funding = funding_tx(&account.address, 200_000);
    let txid = funding.compute_txid().to_string();
    let mut chain = MockChain::with_utxos(vec![confirmed(&txid, 0, 100_000)]);
    chain
        .raw_txs
        .insert(txid, bitcoin::consensus::encode::serialize_hex(&funding));
    let wallet = Wallet::new(chain);
    let req = request(&account, 50_000).with_fee_rate(10);

    let err = wallet.build_and_send(NETWORK, &req).await.unwrap_err();

    assert!(matches!(err, WalletError::TransactionBuild(_)));
    assert_eq!(wallet.source().broadcast_count(), 0);
}

// ─── Stage logging ──────────────────────────────────────────────────

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run one send under a JSON subscriber and return the log lines.
fn send_with_logs(
    chain: MockChain,
    req: &TransactionRequest,
) -> (Result<BroadcastResult, WalletError>, String) {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(logs.clone())
        .finish();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let wallet = Wallet::new(chain);
    let result = tracing::subscriber::with_default(subscriber, || {
        runtime.block_on(wallet.build_and_send(NETWORK, req))
    });
    (result, logs.contents())
}

#[test]
fn successful_send_ends_in_done_stage() {
    let account = account(ScriptType::NativeSegwit);
    let req = request(&account, 50_000).with_fee_rate(10);

    let (result, logs) = send_with_logs(funded_chain(&account), &req);

    assert!(result.is_ok());
    let stages = [
        "collecting",
        "sizing",
        "funding",
        "signing",
        "finalizing",
        "broadcasting",
        "done",
    ];
    for stage in stages {
        assert!(logs.contains(&format!("\"stage\":\"{stage}\"")), "missing {stage}");
    }
    assert!(!logs.contains("\"stage\":\"aborted\""));
}

#[test]
fn funding_failure_ends_in_aborted_stage() {
    let account = account(ScriptType::NativeSegwit);
    let req = request(&account, 50_000).with_fee_rate(10);

    let (result, logs) = send_with_logs(MockChain::default(), &req);

    assert!(matches!(result, Err(WalletError::InsufficientFunds { .. })));
    assert!(logs.contains("\"stage\":\"aborted\""));
    assert!(!logs.contains("\"stage\":\"signing\""));
    assert!(!logs.contains("\"stage\":\"broadcasting\""));
}

#[test]
fn relay_rejection_ends_in_broadcast_failed_stage() {
    let account = account(ScriptType::NativeSegwit);
    let mut chain = funded_chain(&account);
    chain.reject_with = Some("txn-mempool-conflict".into());
    let req = request(&account, 50_000).with_fee_rate(10);

    let (result, logs) = send_with_logs(chain, &req);

    assert!(matches!(result, Err(WalletError::Broadcast { .. })));
    assert!(logs.contains("\"stage\":\"broadcast_failed\""));
    assert!(!logs.contains("\"stage\":\"done\""));
    assert!(!logs.contains("\"stage\":\"aborted\""));
}

// ─── Balance and history ────────────────────────────────────────────

#[tokio::test]
async fn balance_counts_confirmed_outputs_only() {
    let mut pending = confirmed(FUNDING_TXID, 2, 7_000);
    pending.confirmed = false;
    let wallet = Wallet::new(MockChain::with_utxos(vec![
        confirmed(FUNDING_TXID, 0, 1_000),
        confirmed(FUNDING_TXID, 1, 2_500),
        pending,
    ]));
    assert_eq!(wallet.get_balance(NETWORK, DESTINATION).await, 3_500);
}

#[tokio::test]
async fn balance_lookup_failure_reads_as_zero() {
    let wallet = Wallet::new(MockChain {
        offline: true,
        ..Default::default()
    });
    assert_eq!(wallet.get_balance(NETWORK, DESTINATION).await, 0);
}

const ME: &str = "tb1qmine";
const OTHER: &str = "tb1qother";

fn output(address: &str, value: u64) -> ChainOutput {
    ChainOutput {
        scriptpubkey_address: Some(address.to_string()),
        value,
    }
}

fn sample_history() -> Vec<ChainTransaction> {
    vec![
        ChainTransaction {
            txid: "aa".repeat(32),
            vin: vec![ChainInput {
                prevout: Some(output(ME, 10_000)),
            }],
            vout: vec![output(OTHER, 6_000), output(ME, 3_000)],
            fee: 1_000,
            status: ChainTxStatus {
                confirmed: false,
                block_height: None,
                block_time: None,
            },
        },
        ChainTransaction {
            txid: "bb".repeat(32),
            vin: vec![ChainInput {
                prevout: Some(output(OTHER, 20_000)),
            }],
            vout: vec![output(ME, 10_000), output(OTHER, 9_500)],
            fee: 500,
            status: ChainTxStatus {
                confirmed: true,
                block_height: Some(2_500_000),
                block_time: Some(1_700_000_000),
            },
        },
    ]
}

#[tokio::test]
async fn history_classifies_each_transaction() {
    let chain = MockChain {
        history: sample_history(),
        ..Default::default()
    };
    let wallet = Wallet::new(chain);

    let records = wallet.get_transaction_history(NETWORK, ME).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].direction, Some(Direction::Send));
    assert_eq!(records[0].value_sats, Some(7_000));
    assert_eq!(records[0].status, TxStatus::Pending);
    assert_eq!(records[0].block_height, 0);
    assert_eq!(records[1].direction, Some(Direction::Received));
    assert_eq!(records[1].value_sats, Some(10_000));
    assert_eq!(records[1].status, TxStatus::Success);
    assert_eq!(records[1].block_timestamp, 1_700_000_000);
    assert_eq!(records[1].fee_sats, 500);
    assert!(records[1].explorer_url.ends_with(&format!("/tx/{}", "bb".repeat(32))));
}

#[tokio::test]
async fn history_lookup_failure_yields_empty_list() {
    let wallet = Wallet::new(MockChain {
        offline: true,
        history: sample_history(),
        ..Default::default()
    });
    assert!(wallet.get_transaction_history(NETWORK, ME).await.is_empty());
}

#[tokio::test]
async fn single_transaction_lookup() {
    let wallet = Wallet::new(MockChain {
        history: sample_history(),
        ..Default::default()
    });

    let bare = wallet
        .get_transaction(NETWORK, &"bb".repeat(32), None)
        .await
        .unwrap();
    assert_eq!(bare.direction, None);
    assert_eq!(bare.value_sats, None);

    let relative = wallet
        .get_transaction(NETWORK, &"bb".repeat(32), Some(ME))
        .await
        .unwrap();
    assert_eq!(relative.direction, Some(Direction::Received));

    let missing = wallet.get_transaction(NETWORK, &"cc".repeat(32), None).await;
    assert!(matches!(missing, Err(WalletError::History(_))));
}

// ─── Helpers exposed at the crate root ──────────────────────────────

#[test]
fn payment_uri_roundtrip_into_validation() {
    let uri = parse_payment_uri(&format!("bitcoin:{DESTINATION}?amount=0.0005")).unwrap();
    assert_eq!(uri.amount, "0.0005");
    assert!(validate_address(NETWORK, &uri.address));
}

#[test]
fn mnemonic_gate() {
    assert!(validate_mnemonic(TEST_MNEMONIC));
    assert!(!validate_mnemonic("abandon abandon"));
    assert!(matches!(
        mnemonic_to_seed("abandon abandon", ""),
        Err(WalletError::InvalidMnemonic(_))
    ));
}
