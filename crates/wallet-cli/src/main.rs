//! Command-line front end for the Bitcoin wallet engine.
//!
//! Chain data comes from an Esplora API configured through `BTC_*`
//! environment variables. Private keys are read from `WALLET_PRIVATE_KEY`
//! unless passed explicitly.

use anyhow::{bail, Context, Result};
use chain_btc::esplora::EsploraConfig;
use clap::{Parser, Subcommand, ValueEnum};
use wallet_core::{
    derive_accounts_from_private_key, derive_accounts_from_seed, mnemonic_to_seed,
    parse_payment_uri, private_key_to_wif, validate_address, Account, BtcNetwork, FeeRate,
    FeeTier, ScriptType, TransactionRequest, Wallet,
};

mod logging;

#[derive(Parser)]
#[command(name = "btc-wallet")]
#[command(about = "Derive accounts, inspect balances and send bitcoin")]
#[command(version)]
struct Cli {
    /// Network to use (mainnet or testnet).
    #[arg(short, long, global = true, default_value = "testnet")]
    network: BtcNetwork,

    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the four script-type accounts from a mnemonic, seed or key.
    Derive {
        /// BIP-39 mnemonic phrase.
        #[arg(long, conflicts_with_all = ["seed_hex", "private_key"])]
        mnemonic: Option<String>,

        /// Optional BIP-39 passphrase.
        #[arg(long, default_value = "", requires = "mnemonic")]
        passphrase: String,

        /// Raw BIP-32 seed as hex.
        #[arg(long, conflicts_with = "private_key")]
        seed_hex: Option<String>,

        /// 32-byte private key as hex.
        #[arg(long)]
        private_key: Option<String>,

        /// Also print private keys and WIF.
        #[arg(long)]
        show_keys: bool,
    },

    /// Check an address against the selected network.
    Validate { address: String },

    /// Confirmed balance of an address in satoshis.
    Balance { address: String },

    /// Recommended fee rates in sat/vB.
    Fees,

    /// Build, sign and broadcast a payment.
    Send {
        /// Source address; must belong to the private key.
        #[arg(long)]
        from: String,

        /// Destination address.
        #[arg(long)]
        to: String,

        /// Amount in satoshis.
        #[arg(long)]
        amount: u64,

        /// Script type of the source account.
        #[arg(long, default_value = "NATIVE_SEGWIT")]
        script_type: ScriptType,

        /// Explicit fee rate in sat/vB.
        #[arg(long, conflicts_with = "tier")]
        fee_rate: Option<u64>,

        /// Fee tier to request from the oracle.
        #[arg(long, value_enum, default_value_t = TierArg::Fastest)]
        tier: TierArg,

        /// Source private key as hex.
        #[arg(long, env = "WALLET_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,

        /// Sign but do not broadcast; prints the raw transaction.
        #[arg(long)]
        dry_run: bool,
    },

    /// Transactions touching an address.
    History { address: String },

    /// Look up a single transaction.
    Tx {
        hash: String,

        /// Classify relative to this address.
        #[arg(long)]
        address: Option<String>,
    },

    /// Decode a `bitcoin:` payment URI.
    Uri { text: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum TierArg {
    Fastest,
    HalfHour,
    Hour,
    Economy,
    Minimum,
}

impl From<TierArg> for FeeTier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::Fastest => FeeTier::Fastest,
            TierArg::HalfHour => FeeTier::HalfHour,
            TierArg::Hour => FeeTier::Hour,
            TierArg::Economy => FeeTier::Economy,
            TierArg::Minimum => FeeTier::Minimum,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    tracing::debug!(network = %cli.network, "starting");

    run(cli.network, cli.command)
        .await
        .inspect_err(|e| tracing::error!("command failed: {e:#}"))
}

async fn run(network: BtcNetwork, command: Commands) -> Result<()> {
    match command {
        Commands::Derive {
            mnemonic,
            passphrase,
            seed_hex,
            private_key,
            show_keys,
        } => {
            let accounts = if let Some(phrase) = mnemonic {
                let seed = mnemonic_to_seed(&phrase, &passphrase)?;
                derive_accounts_from_seed(network, &seed)?
            } else if let Some(seed_hex) = seed_hex {
                let seed = hex::decode(seed_hex.trim()).context("seed is not valid hex")?;
                derive_accounts_from_seed(network, &seed)?
            } else if let Some(key) = private_key {
                derive_accounts_from_private_key(network, &key)?
            } else {
                bail!("one of --mnemonic, --seed-hex or --private-key is required");
            };
            for account in &accounts {
                print_account(account, show_keys)?;
            }
        }
        Commands::Validate { address } => {
            let valid = validate_address(network, &address);
            println!("{address}: {}", if valid { "valid" } else { "invalid" });
            if !valid {
                std::process::exit(1);
            }
        }
        Commands::Balance { address } => {
            let wallet = esplora_wallet()?;
            println!("{}", wallet.get_balance(network, &address).await);
        }
        Commands::Fees => {
            let wallet = esplora_wallet()?;
            let rates = wallet.get_fee_rates(network).await?;
            println!("{}", serde_json::to_string_pretty(&rates)?);
        }
        Commands::Send {
            from,
            to,
            amount,
            script_type,
            fee_rate,
            tier,
            private_key,
            dry_run,
        } => {
            let request = TransactionRequest::new(from, to, amount, script_type, private_key);
            let request = match fee_rate {
                Some(rate) => request.with_fee_rate(rate),
                None => request.with_fee_tier(FeeRate::Tier(tier.into())),
            };

            let wallet = esplora_wallet()?;
            if dry_run {
                let signed = wallet.build_signed_transaction(network, &request).await?;
                println!("txid:  {}", signed.txid);
                println!(
                    "fee:   {} sat ({} sat/vB, ~{} vB)",
                    signed.draft.fee_sats, signed.fee_rate_sat_vbyte, signed.draft.estimated_vsize
                );
                println!("raw:   {}", signed.raw_hex);
            } else {
                let result = wallet.build_and_send(network, &request).await?;
                println!("{}", result.txid);
            }
        }
        Commands::History { address } => {
            let wallet = esplora_wallet()?;
            let records = wallet.get_transaction_history(network, &address).await;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Tx { hash, address } => {
            let wallet = esplora_wallet()?;
            let record = wallet
                .get_transaction(network, &hash, address.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Uri { text } => {
            let uri = parse_payment_uri(&text).context("not a bitcoin payment URI")?;
            let valid = validate_address(network, &uri.address);
            println!("address: {} ({})", uri.address, if valid { "valid" } else { "invalid" });
            println!("amount:  {} BTC", uri.amount);
        }
    }

    Ok(())
}

fn esplora_wallet() -> Result<Wallet<chain_btc::esplora::EsploraClient>> {
    Ok(Wallet::esplora(EsploraConfig::from_env())?)
}

fn print_account(account: &Account, show_keys: bool) -> Result<()> {
    println!("{:<14} {}", account.script_type.display_name(), account.address);
    if let Some(path) = &account.derivation_path {
        println!("{:<14} {path}", "");
    }
    if show_keys {
        let wif = private_key_to_wif(account.network, account.private_key_hex())?;
        println!("{:<14} {}", "", account.private_key_hex());
        println!("{:<14} {wif}", "");
    }
    Ok(())
}
