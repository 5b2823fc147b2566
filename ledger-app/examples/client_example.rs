//! Client example walking through the main ledger flows against a running server.
//!
//! Run with: cargo run -p ledger-app --example client_example

use ledger_client::{ClientError, LedgerClient};
use ledger_hex::{Collaborators, LedgerService, inbound::HttpServer};
use ledger_repo::build_repo;
use ledger_types::{
    AccountType, CreateProfileRequest, CreateWalletRequest, GroupId, ListTransfersQuery, OwnerId,
    PaymentRequest, ProductType, RegisterAccountRequest, RemainingLimitsQuery, ServiceType,
    SetLimitsRequest, TransferRequest, WalletAdjustmentRequest, WalletKind, WalletQuery,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::net::SocketAddr;
use tempfile::tempdir;
use tokio::net::TcpListener;

fn transfer(payer: &str, payee: &str, amount: Decimal) -> TransferRequest {
    TransferRequest {
        payer_id: OwnerId::from(payer),
        payee_id: OwnerId::from(payee),
        amount,
        service_type: ServiceType::Transfer,
        product_type: ProductType::P2p,
        remarks: None,
        idempotency_key: None,
        group_id: None,
        created_by: None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Bind once and hand the listener to the server
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;

    // Use a temp file-backed SQLite DB
    let tmp = tempdir()?;
    let db_path = tmp.path().join("ledger.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    println!("🚀 Starting server on {addr}...");
    println!("   Database: {db_url}");

    let repo = build_repo(&db_url).await?;
    let service = LedgerService::new(repo.clone(), Collaborators::backed_by(repo));
    let router = HttpServer::new(service).router();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router.into_make_service()).await {
            eprintln!("server stopped: {e}");
        }
    });

    let client = LedgerClient::new(format!("http://{addr}")).with_caller_id("client-example");
    println!("   Healthy: {}", client.health().await?);

    // ─────────────────────────────────────────────────────────────────────────
    // Setup: a limit profile and two funded parties
    // ─────────────────────────────────────────────────────────────────────────

    println!("\n📋 Creating threshold profile...");
    let profile = client
        .create_profile(&CreateProfileRequest {
            name: "retail".into(),
            owner_type: AccountType::User,
        })
        .await?;
    client
        .set_limits(
            &profile.id,
            &GroupId::default(),
            &SetLimitsRequest {
                payer_count: 20,
                payer_amount: dec!(500.00),
                payee_count: 50,
                payee_amount: dec!(5000.00),
            },
        )
        .await?;
    println!("   Profile {} caps payers at 500.00/day", profile.id);

    for (owner, account_type) in [("alice", AccountType::User), ("shop", AccountType::Merchant)] {
        client
            .register_account(&RegisterAccountRequest {
                id: OwnerId::from(owner),
                account_type,
                status: None,
                pin: Some("2468".into()),
                threshold_profile_id: Some(profile.id.clone()),
            })
            .await?;
        client
            .create_wallet(&CreateWalletRequest {
                owner_id: OwnerId::from(owner),
                kind: WalletKind::Main,
            })
            .await?;
    }
    let funded = client
        .credit(
            &OwnerId::from("alice"),
            &WalletAdjustmentRequest {
                amount: dec!(1000.00),
                kind: WalletKind::Main,
            },
        )
        .await?;
    println!("   alice funded with {}", funded.balance);

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: transfer and idempotent resubmission
    // ─────────────────────────────────────────────────────────────────────────

    println!("\n💸 Transferring 120.50 alice → shop...");
    let mut req = transfer("alice", "shop", dec!(120.50));
    req.idempotency_key = Some("order-1001".into());
    let first = client.transfer(&req).await?;
    println!(
        "   {} {} (alice {}, shop {})",
        first.transfer_id, first.status, first.payer_balance, first.payee_balance
    );

    let again = client.transfer(&req).await?;
    println!(
        "   Resubmitted: same id = {}, replayed = {}",
        again.transfer_id == first.transfer_id,
        again.replayed
    );

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: rejections
    // ─────────────────────────────────────────────────────────────────────────

    println!("\n🚫 Transferring 600.00 over the daily cap...");
    match client.transfer(&transfer("alice", "shop", dec!(600.00))).await {
        Err(ClientError::Api {
            status,
            error_code,
            transfer_id,
            ..
        }) => println!(
            "   Rejected with {} {:?}, recorded as {:?}",
            status, error_code, transfer_id
        ),
        other => println!("   Unexpected: {:?}", other.map(|r| r.status)),
    }

    println!("\n🔒 Recharge with a disabled product...");
    let recharge = PaymentRequest {
        transfer: TransferRequest {
            service_type: ServiceType::Recharge,
            product_type: ProductType::Mobile,
            ..transfer("alice", "shop", dec!(25.00))
        },
        product_id: "PRD_MOBILE".into(),
        pin: "2468".into(),
    };
    if let Err(e) = client.recharge(&recharge).await {
        println!("   {e}");
    }
    client.set_product_status("PRD_MOBILE", true).await?;
    let done = client.recharge(&recharge).await?;
    println!("   After enabling: {} {}", done.transfer_id, done.status);

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: reads
    // ─────────────────────────────────────────────────────────────────────────

    println!("\n📊 Remaining payer limits for alice:");
    let limits = client
        .remaining_limits(&OwnerId::from("alice"), &RemainingLimitsQuery::default())
        .await?;
    for window in &limits.windows {
        println!(
            "   {:<8} {}/{} transfers, {} of {} left",
            window.window.to_string(),
            window.count_used,
            window.count_limit,
            window.amount_remaining,
            window.amount_limit
        );
    }

    println!("\n📜 alice's history:");
    let page = client
        .list_transfers(&OwnerId::from("alice"), &ListTransfersQuery::default())
        .await?;
    for item in &page.items {
        println!(
            "   {} {} {} {}",
            item.transfer_id, item.service_type, item.amount, item.status
        );
    }

    let wallet = client
        .wallet(&OwnerId::from("alice"), &WalletQuery::default())
        .await?;
    println!("\n✅ Final alice balance: {}", wallet.balance);

    Ok(())
}
