//! concord: drive a persisted governance engine from the command line.
//!
//! State lives in a single bincode file. Governed targets are live objects
//! and are not persisted, so from here only self-amendments change state;
//! calls to other addresses are authorized and logged but have no effect.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;

use concord_crypto::{sign_digest, to_checksum, SecretKey};
use concord_governance::{
    Amendment, Authority, EngineSnapshot, GovernanceConfig, GovernanceEngine, GovernedExecutor,
    TextStore,
};
use concord_store::{FileStore, StateStore};
use concord_types::{decode_hex, encode_hex, Address, Digest, Nonce, Power, RecoverableSignature, TxId};
use concord_utils::LogFormat;

#[derive(Parser)]
#[command(name = "concord", about = "Threshold governance engine driver")]
struct Cli {
    /// Engine state file.
    #[arg(long, default_value = "./concord_state.bin", env = "CONCORD_STATE")]
    state: PathBuf,

    /// Path to a TOML configuration file. Used by `init`, and for logging
    /// settings; CLI flags and env vars override it.
    #[arg(long, env = "CONCORD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CONCORD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CONCORD_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Create a state file from the configuration.
    Init {
        /// Replace an existing state file.
        #[arg(long)]
        force: bool,
    },

    /// Print membership, policy and counters.
    Show,

    /// Print call data for a governed action.
    Encode {
        #[command(subcommand)]
        call: EncodeCall,
    },

    /// Print the digest signers must sign (off-chain mode).
    Digest {
        /// Defaults to the next expected nonce.
        #[arg(long)]
        nonce: Option<Nonce>,
        #[arg(long)]
        target: Address,
        /// Hex call data.
        #[arg(long)]
        payload: String,
    },

    /// Sign a digest with a secp256k1 secret key.
    Sign {
        #[arg(long)]
        digest: Digest,
        /// Hex secret key.
        #[arg(long, env = "CONCORD_SECRET_KEY", hide_env_values = true)]
        secret_key: String,
    },

    /// Submit an action with its signatures (off-chain mode).
    Execute {
        #[arg(long)]
        nonce: Nonce,
        #[arg(long)]
        target: Address,
        #[arg(long)]
        payload: String,
        /// Comma-separated signatures, ascending by signer address.
        #[arg(long, value_delimiter = ',')]
        signatures: Vec<RecoverableSignature>,
    },

    /// Propose an action as `caller`, counting its vote (on-chain mode).
    Propose {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        target: Address,
        #[arg(long, default_value_t = 0)]
        value: u128,
        #[arg(long)]
        payload: String,
    },

    /// Confirm a proposal as `caller` (on-chain mode).
    Confirm {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        id: TxId,
    },

    /// Execute a proposal whose votes already meet the threshold (on-chain mode).
    Trigger {
        #[arg(long)]
        id: TxId,
    },
}

#[derive(clap::Subcommand)]
enum EncodeCall {
    UpdatePower {
        #[arg(long)]
        principal: Address,
        #[arg(long)]
        power: Power,
    },
    UpdateValidators {
        #[arg(long, value_delimiter = ',')]
        principals: Vec<Address>,
        #[arg(long, value_delimiter = ',')]
        flags: Vec<bool>,
    },
    SetConsensus {
        #[arg(long)]
        numerator: u64,
        #[arg(long)]
        denominator: u64,
    },
    SetText {
        #[arg(long)]
        text: String,
    },
}

fn load_engine(store: &FileStore) -> anyhow::Result<GovernanceEngine> {
    let snapshot: EngineSnapshot = store
        .load()
        .with_context(|| format!("loading state from {}", store.path().display()))?;
    Ok(GovernanceEngine::from_snapshot(snapshot, GovernedExecutor::new())?)
}

fn save_engine(store: &FileStore, engine: &GovernanceEngine) -> anyhow::Result<()> {
    store
        .save(&engine.snapshot())
        .with_context(|| format!("saving state to {}", store.path().display()))
}

fn print_output(output: &[u8]) {
    if !output.is_empty() {
        println!("output: {}", encode_hex(output));
    }
}

fn show(engine: &GovernanceEngine) {
    let authority = engine.authority();
    let (numerator, denominator) = authority.get_consensus();
    println!("mode:        {}", engine.mode());
    println!("address:     {}", to_checksum(&authority.address()));
    println!("consensus:   {numerator}/{denominator}");
    println!("total power: {}", authority.total_power());
    println!("required:    {}", authority.required());
    println!("next id:     {}", authority.transactions_count());
    match engine {
        GovernanceEngine::Offchain(offchain) => {
            if let Some(separator) = offchain.domain_separator() {
                println!("separator:   {separator}");
            }
        }
        GovernanceEngine::Onchain(onchain) => {
            for (id, record) in onchain.ledger().iter() {
                println!(
                    "tx {id}: target {} votes {} executed {}",
                    record.action().target,
                    record.votes(),
                    record.is_executed()
                );
            }
        }
    }
    println!("governors ({}):", authority.governors_count());
    for governor in authority.governors() {
        println!("  {} {}", to_checksum(&governor), authority.power_of(&governor));
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GovernanceConfig::from_toml_file(path)?,
        None => GovernanceConfig::default(),
    };
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    concord_utils::init_tracing(&log_level, cli.log_format.unwrap_or(config.log_format));

    let store = FileStore::new(&cli.state);

    match cli.command {
        Command::Init { force } => {
            if cli.config.is_none() {
                bail!("init needs --config");
            }
            if !force && StateStore::<EngineSnapshot>::exists(&store)? {
                bail!(
                    "{} already exists, pass --force to replace it",
                    store.path().display()
                );
            }
            let engine = config.build()?;
            save_engine(&store, &engine)?;
            tracing::info!(state = %store.path().display(), mode = engine.mode(), "state initialized");
            show(&engine);
        }
        Command::Show => show(&load_engine(&store)?),
        Command::Encode { call } => {
            let payload = match call {
                EncodeCall::UpdatePower { principal, power } => {
                    Amendment::UpdatePower { principal, power }.encode()
                }
                EncodeCall::UpdateValidators { principals, flags } => {
                    if principals.len() != flags.len() {
                        bail!(
                            "{} principals but {} flags",
                            principals.len(),
                            flags.len()
                        );
                    }
                    Amendment::UpdateValidators { principals, flags }.encode()
                }
                EncodeCall::SetConsensus {
                    numerator,
                    denominator,
                } => Amendment::SetConsensus {
                    numerator,
                    denominator,
                }
                .encode(),
                EncodeCall::SetText { text } => TextStore::set_text_call(&text),
            };
            println!("{}", encode_hex(&payload));
        }
        Command::Digest {
            nonce,
            target,
            payload,
        } => {
            let GovernanceEngine::Offchain(engine) = load_engine(&store)? else {
                bail!("digest applies to off-chain engines");
            };
            let payload = decode_hex(&payload)?;
            let nonce = nonce.unwrap_or_else(|| engine.transactions_count());
            println!("{}", engine.digest(nonce, &target, &payload));
        }
        Command::Sign { digest, secret_key } => {
            let secret = SecretKey::from_slice(&decode_hex(&secret_key)?)?;
            let signature = sign_digest(&digest, &secret)?;
            println!("signer:    {}", to_checksum(&secret.address()?));
            println!("signature: {signature}");
        }
        Command::Execute {
            nonce,
            target,
            payload,
            signatures,
        } => {
            let mut engine = load_engine(&store)?;
            let GovernanceEngine::Offchain(offchain) = &mut engine else {
                bail!("execute with signatures applies to off-chain engines");
            };
            let payload = decode_hex(&payload)?;
            let output = offchain.execute_transaction(nonce, target, &payload, &signatures)?;
            save_engine(&store, &engine)?;
            println!("executed nonce {nonce}");
            print_output(&output);
        }
        Command::Propose {
            caller,
            target,
            value,
            payload,
        } => {
            let mut engine = load_engine(&store)?;
            let GovernanceEngine::Onchain(onchain) = &mut engine else {
                bail!("propose applies to on-chain engines");
            };
            let id = onchain.create_transaction(caller, target, value, decode_hex(&payload)?)?;
            let executed = onchain.get_transaction(id)?.is_executed();
            save_engine(&store, &engine)?;
            println!("transaction {id} created (executed: {executed})");
        }
        Command::Confirm { caller, id } => {
            let mut engine = load_engine(&store)?;
            let GovernanceEngine::Onchain(onchain) = &mut engine else {
                bail!("confirm applies to on-chain engines");
            };
            let status = onchain.confirm_transaction(caller, id)?;
            save_engine(&store, &engine)?;
            println!(
                "transaction {} has {} votes (executed: {})",
                status.id, status.votes, status.executed
            );
        }
        Command::Trigger { id } => {
            let mut engine = load_engine(&store)?;
            let GovernanceEngine::Onchain(onchain) = &mut engine else {
                bail!("trigger applies to on-chain engines");
            };
            let output = onchain.execute_transaction(id)?;
            save_engine(&store, &engine)?;
            println!("transaction {id} executed");
            print_output(&output);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_signature_list() {
        let sig = format!("0x{}1b", "11".repeat(64));
        let signatures = format!("{sig},{sig}");
        let cli = Cli::try_parse_from([
            "concord",
            "execute",
            "--nonce",
            "0",
            "--target",
            "0x5151515151515151515151515151515151515151",
            "--payload",
            "0x",
            "--signatures",
            signatures.as_str(),
        ])
        .unwrap();
        let Command::Execute { signatures, .. } = cli.command else {
            panic!("expected execute");
        };
        assert_eq!(signatures.len(), 2);
    }

    #[test]
    fn parses_validator_flags() {
        let cli = Cli::try_parse_from([
            "concord",
            "encode",
            "update-validators",
            "--principals",
            "0x0101010101010101010101010101010101010101,0x0202020202020202020202020202020202020202",
            "--flags",
            "true,false",
        ])
        .unwrap();
        let Command::Encode {
            call: EncodeCall::UpdateValidators { principals, flags },
        } = cli.command
        else {
            panic!("expected update-validators");
        };
        assert_eq!(principals.len(), 2);
        assert_eq!(flags, vec![true, false]);
    }
}
