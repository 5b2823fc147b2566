//! Ledger CLI
//!
//! Command-line interface for the wallet ledger API.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use ledger_client::{ClientError, LedgerClient};
use ledger_types::{
    AccountStatus, AccountType, BalanceCheckQuery, CreateProfileRequest, CreateWalletRequest,
    GroupId, ListTransfersQuery, OwnerId, PaymentRequest, ProductType, RegisterAccountRequest,
    RemainingLimitsQuery, Role, ServiceType, SetLimitsRequest, ThresholdProfileId, TransferId,
    TransferRequest, ValidateThresholdRequest, WalletAdjustmentRequest, WalletKind, WalletQuery,
};

#[derive(Parser)]
#[command(name = "ledger")]
#[command(author, version, about = "Wallet ledger API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the ledger API
    #[arg(long, env = "LEDGER_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Caller identity sent as X-Caller-Id
    #[arg(long, env = "LEDGER_CALLER_ID")]
    caller_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transfer operations
    Transfer {
        #[command(subcommand)]
        action: TransferCommands,
    },
    /// Wallet operations
    Wallet {
        #[command(subcommand)]
        action: WalletCommands,
    },
    /// Threshold profiles and limits
    Limits {
        #[command(subcommand)]
        action: LimitCommands,
    },
    /// Account directory
    Account {
        #[command(subcommand)]
        action: AccountCommands,
    },
    /// Enable or disable a product
    Product {
        id: String,
        /// Disable instead of enable
        #[arg(long)]
        disable: bool,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum TransferCommands {
    /// Move money between two MAIN wallets
    Send {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        remarks: Option<String>,
        #[arg(long)]
        idempotency_key: Option<String>,
        #[arg(long)]
        group: Option<String>,
    },
    /// Recharge a subscriber
    Recharge(PaymentArgs),
    /// Pay a bill
    Bill(PaymentArgs),
    /// Show one transfer with its line items
    Get { id: String },
    /// List a party's transfers, newest first
    List {
        owner: String,
        /// SUCCESS, FAILED, PENDING or ALL
        #[arg(long)]
        status: Option<String>,
        /// Inclusive lower bound (RFC 3339)
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Exclusive upper bound (RFC 3339)
        #[arg(long)]
        until: Option<DateTime<Utc>>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(clap::Args)]
struct PaymentArgs {
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    #[arg(long)]
    amount: Decimal,
    /// MOBILE, DTH, ELECTRICITY, ...
    #[arg(long)]
    product_type: String,
    #[arg(long)]
    product_id: String,
    #[arg(long)]
    pin: String,
    #[arg(long)]
    idempotency_key: Option<String>,
}

#[derive(Subcommand)]
enum WalletCommands {
    /// Open a wallet for a registered account
    Open {
        owner: String,
        #[arg(long, default_value = "MAIN")]
        kind: String,
    },
    /// Show a wallet
    Get {
        owner: String,
        #[arg(long, default_value = "MAIN")]
        kind: String,
    },
    /// Credit a wallet
    Credit {
        owner: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "MAIN")]
        kind: String,
    },
    /// Debit a wallet
    Debit {
        owner: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "MAIN")]
        kind: String,
    },
    /// Check whether a wallet covers an amount
    Check {
        owner: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "MAIN")]
        kind: String,
    },
}

#[derive(Subcommand)]
enum LimitCommands {
    /// Check an amount against a party's limits
    Validate {
        owner: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "PAYER")]
        role: String,
        #[arg(long)]
        group: Option<String>,
    },
    /// Used and remaining allowance per window
    Remaining {
        owner: String,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        group: Option<String>,
    },
    /// Create a threshold profile
    Profile {
        name: String,
        #[arg(long, default_value = "USER")]
        owner_type: String,
    },
    /// Set the daily caps of one group
    Set {
        profile: String,
        #[arg(long, default_value = "DEFAULT")]
        group: String,
        #[arg(long)]
        payer_count: i64,
        #[arg(long)]
        payer_amount: Decimal,
        #[arg(long)]
        payee_count: i64,
        #[arg(long)]
        payee_amount: Decimal,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Register or replace an account
    Register {
        id: String,
        #[arg(long, default_value = "USER")]
        account_type: String,
        /// ACTIVE or INACTIVE
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        pin: Option<String>,
        #[arg(long)]
        profile: Option<String>,
    },
    /// Show an account
    Get { id: String },
}

fn parse<T>(what: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.to_ascii_uppercase()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", what, raw, e))
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn payment(service_type: ServiceType, args: PaymentArgs) -> Result<PaymentRequest> {
    Ok(PaymentRequest {
        transfer: TransferRequest {
            payer_id: OwnerId::from(args.from.as_str()),
            payee_id: OwnerId::from(args.to.as_str()),
            amount: args.amount,
            service_type,
            product_type: parse::<ProductType>("product type", &args.product_type)?,
            remarks: None,
            idempotency_key: args.idempotency_key,
            group_id: None,
            created_by: None,
        },
        product_id: args.product_id,
        pin: args.pin,
    })
}

async fn run(client: LedgerClient, command: Commands) -> Result<()> {
    match command {
        Commands::Health => {
            if client.health().await? {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Transfer { action } => match action {
            TransferCommands::Send {
                from,
                to,
                amount,
                remarks,
                idempotency_key,
                group,
            } => {
                let req = TransferRequest {
                    payer_id: OwnerId::from(from.as_str()),
                    payee_id: OwnerId::from(to.as_str()),
                    amount,
                    service_type: ServiceType::Transfer,
                    product_type: ProductType::P2p,
                    remarks,
                    idempotency_key,
                    group_id: group.as_deref().map(GroupId::from),
                    created_by: None,
                };
                print(&client.transfer(&req).await?)?;
            }
            TransferCommands::Recharge(args) => {
                let req = payment(ServiceType::Recharge, args)?;
                print(&client.recharge(&req).await?)?;
            }
            TransferCommands::Bill(args) => {
                let req = payment(ServiceType::BillPayment, args)?;
                print(&client.bill_payment(&req).await?)?;
            }
            TransferCommands::Get { id } => {
                print(&client.get_transfer(&TransferId::from(id.as_str())).await?)?;
            }
            TransferCommands::List {
                owner,
                status,
                since,
                until,
                page,
                limit,
            } => {
                let query = ListTransfersQuery {
                    status,
                    from: since,
                    to: until,
                    page,
                    limit,
                };
                print(
                    &client
                        .list_transfers(&OwnerId::from(owner.as_str()), &query)
                        .await?,
                )?;
            }
        },

        Commands::Wallet { action } => match action {
            WalletCommands::Open { owner, kind } => {
                let req = CreateWalletRequest {
                    owner_id: OwnerId::from(owner.as_str()),
                    kind: parse::<WalletKind>("wallet kind", &kind)?,
                };
                print(&client.create_wallet(&req).await?)?;
            }
            WalletCommands::Get { owner, kind } => {
                let query = WalletQuery {
                    kind: Some(parse::<WalletKind>("wallet kind", &kind)?),
                };
                print(&client.wallet(&OwnerId::from(owner.as_str()), &query).await?)?;
            }
            WalletCommands::Credit {
                owner,
                amount,
                kind,
            } => {
                let req = WalletAdjustmentRequest {
                    amount,
                    kind: parse::<WalletKind>("wallet kind", &kind)?,
                };
                print(&client.credit(&OwnerId::from(owner.as_str()), &req).await?)?;
            }
            WalletCommands::Debit {
                owner,
                amount,
                kind,
            } => {
                let req = WalletAdjustmentRequest {
                    amount,
                    kind: parse::<WalletKind>("wallet kind", &kind)?,
                };
                print(&client.debit(&OwnerId::from(owner.as_str()), &req).await?)?;
            }
            WalletCommands::Check {
                owner,
                amount,
                kind,
            } => {
                let query = BalanceCheckQuery {
                    amount,
                    kind: Some(parse::<WalletKind>("wallet kind", &kind)?),
                };
                print(
                    &client
                        .check_balance(&OwnerId::from(owner.as_str()), &query)
                        .await?,
                )?;
            }
        },

        Commands::Limits { action } => match action {
            LimitCommands::Validate {
                owner,
                amount,
                role,
                group,
            } => {
                let req = ValidateThresholdRequest {
                    owner_id: OwnerId::from(owner.as_str()),
                    amount,
                    role: parse::<Role>("role", &role)?,
                    group_id: group.as_deref().map(GroupId::from),
                };
                print(&client.validate_thresholds(&req).await?)?;
            }
            LimitCommands::Remaining { owner, role, group } => {
                let query = RemainingLimitsQuery {
                    role,
                    group_id: group.as_deref().map(GroupId::from),
                };
                print(
                    &client
                        .remaining_limits(&OwnerId::from(owner.as_str()), &query)
                        .await?,
                )?;
            }
            LimitCommands::Profile { name, owner_type } => {
                let req = CreateProfileRequest {
                    name,
                    owner_type: parse::<AccountType>("owner type", &owner_type)?,
                };
                print(&client.create_profile(&req).await?)?;
            }
            LimitCommands::Set {
                profile,
                group,
                payer_count,
                payer_amount,
                payee_count,
                payee_amount,
            } => {
                let req = SetLimitsRequest {
                    payer_count,
                    payer_amount,
                    payee_count,
                    payee_amount,
                };
                let limits = client
                    .set_limits(
                        &ThresholdProfileId::from(profile.as_str()),
                        &GroupId::from(group.as_str()),
                        &req,
                    )
                    .await?;
                print(&limits)?;
            }
        },

        Commands::Account { action } => match action {
            AccountCommands::Register {
                id,
                account_type,
                status,
                pin,
                profile,
            } => {
                let status = match status {
                    Some(raw) => Some(parse::<AccountStatus>("status", &raw)?),
                    None => None,
                };
                let req = RegisterAccountRequest {
                    id: OwnerId::from(id.as_str()),
                    account_type: parse::<AccountType>("account type", &account_type)?,
                    status,
                    pin,
                    threshold_profile_id: profile.as_deref().map(ThresholdProfileId::from),
                };
                print(&client.register_account(&req).await?)?;
            }
            AccountCommands::Get { id } => {
                print(&client.get_account(&OwnerId::from(id.as_str())).await?)?;
            }
        },

        Commands::Product { id, disable } => {
            client.set_product_status(&id, !disable).await?;
            println!(
                "✓ Product {} {}",
                id,
                if disable { "disabled" } else { "enabled" }
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = LedgerClient::new(&cli.api_url);
    if let Some(caller) = cli.caller_id {
        client = client.with_caller_id(caller);
    }

    let Err(e) = run(client, cli.command).await else {
        return Ok(());
    };
    if let Some(ClientError::Api {
        status,
        message,
        error_code,
        transfer_id,
    }) = e.downcast_ref::<ClientError>()
    {
        eprintln!("✗ {} ({})", message, status);
        if let Some(code) = error_code {
            eprintln!("  error_code: {}", code);
        }
        if let Some(id) = transfer_id {
            eprintln!("  transfer_id: {}", id);
        }
        std::process::exit(1);
    }
    Err(e)
}
