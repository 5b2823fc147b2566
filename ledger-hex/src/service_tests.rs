//! LedgerService unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use ledger_repo::MemoryRepo;
    use ledger_types::{
        AccountStatus, AccountType, AppError, CreateProfileRequest, CreateWalletRequest,
        Direction, ErrorCode, ListTransfersQuery, OwnerId, PaymentRequest, ProductStatusRequest,
        ProductType, RegisterAccountRequest, RemainingLimitsQuery, Role, ServiceType,
        SetLimitsRequest, ThresholdProfileId, TransferRequest, TransferStatus,
        ValidateThresholdRequest, ViolationKind, WalletAdjustmentRequest, WalletKind, WalletQuery,
        Window, prefix,
    };

    use crate::{Collaborators, LedgerService, OrchestratorConfig};

    const PIN: &str = "4321";

    pub fn ledger() -> LedgerService<MemoryRepo> {
        let repo = MemoryRepo::new();
        LedgerService::new(repo.clone(), Collaborators::backed_by(repo))
    }

    /// Profile whose payer amount cap is `payer_amount` and everything else
    /// generous.
    pub async fn profile(
        service: &LedgerService<MemoryRepo>,
        payer_amount: Decimal,
    ) -> ThresholdProfileId {
        let profile = service
            .create_profile(CreateProfileRequest {
                name: "retail".into(),
                owner_type: AccountType::User,
            })
            .await
            .unwrap();
        service
            .set_limits(
                profile.id.clone(),
                Default::default(),
                SetLimitsRequest {
                    payer_count: 100,
                    payer_amount,
                    payee_count: 100,
                    payee_amount: dec!(1000000.00),
                },
            )
            .await
            .unwrap();
        profile.id
    }

    /// Registers an account with a MAIN wallet holding `balance`.
    pub async fn party(
        service: &LedgerService<MemoryRepo>,
        id: &str,
        profile: &ThresholdProfileId,
        balance: Decimal,
    ) -> OwnerId {
        let owner = OwnerId::new(id);
        service
            .register_account(RegisterAccountRequest {
                id: owner.clone(),
                account_type: AccountType::User,
                status: None,
                pin: Some(PIN.into()),
                threshold_profile_id: Some(profile.clone()),
            })
            .await
            .unwrap();
        service
            .create_wallet(CreateWalletRequest {
                owner_id: owner.clone(),
                kind: WalletKind::Main,
            })
            .await
            .unwrap();
        if balance > Decimal::ZERO {
            service
                .credit_wallet(
                    &owner,
                    WalletAdjustmentRequest {
                        amount: balance,
                        kind: WalletKind::Main,
                    },
                )
                .await
                .unwrap();
        }
        owner
    }

    fn transfer(payer: &OwnerId, payee: &OwnerId, amount: Decimal) -> TransferRequest {
        TransferRequest {
            payer_id: payer.clone(),
            payee_id: payee.clone(),
            amount,
            service_type: ServiceType::Transfer,
            product_type: ProductType::P2p,
            remarks: None,
            idempotency_key: None,
            group_id: None,
            created_by: None,
        }
    }

    fn recharge(payer: &OwnerId, payee: &OwnerId, amount: Decimal, pin: &str) -> PaymentRequest {
        let mut transfer = transfer(payer, payee, amount);
        transfer.service_type = ServiceType::Recharge;
        transfer.product_type = ProductType::Mobile;
        PaymentRequest {
            transfer,
            product_id: "PRD_MOBILE".into(),
            pin: pin.into(),
        }
    }

    async fn balance(service: &LedgerService<MemoryRepo>, owner: &OwnerId) -> Decimal {
        service
            .wallet(owner, WalletQuery::default())
            .await
            .unwrap()
            .balance
    }

    fn total_minor(service: &LedgerService<MemoryRepo>) -> i64 {
        service
            .repo()
            .wallets()
            .unwrap()
            .iter()
            .map(|w| w.balance.minor())
            .sum()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transfers
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_transfer_moves_money_and_writes_two_line_items() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(100.00)).await;
        let bob = party(&service, "bob", &p, dec!(20.00)).await;

        let response = service
            .process_transfer(transfer(&alice, &bob, dec!(50.00)))
            .await
            .unwrap();

        assert_eq!(response.status, TransferStatus::Success);
        assert_eq!(response.payer_balance, dec!(50.00));
        assert_eq!(response.payee_balance, dec!(70.00));
        assert!(!response.replayed);
        assert_eq!(balance(&service, &alice).await, dec!(50.00));
        assert_eq!(balance(&service, &bob).await, dec!(70.00));

        let view = service.get_transfer(&response.transfer_id).await.unwrap();
        assert_eq!(view.status, TransferStatus::Success);
        assert_eq!(view.line_items.len(), 2);

        let debit = view
            .line_items
            .iter()
            .find(|i| i.direction == Direction::Debit)
            .unwrap();
        let credit = view
            .line_items
            .iter()
            .find(|i| i.direction == Direction::Credit)
            .unwrap();
        assert_eq!(debit.party_id, alice);
        assert_eq!(debit.counterparty_id, bob);
        assert_eq!(debit.previous_balance - debit.post_balance, dec!(50.00));
        assert_eq!(credit.post_balance - credit.previous_balance, dec!(50.00));
        assert_eq!(credit.previous_balance, dec!(20.00));
    }

    #[tokio::test]
    async fn test_insufficient_balance_records_failed_transfer() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(100.00)).await;
        let bob = party(&service, "bob", &p, Decimal::ZERO).await;

        let rejection = service
            .process_transfer(transfer(&alice, &bob, dec!(110.00)))
            .await
            .unwrap_err();

        assert!(matches!(
            rejection.error,
            AppError::InsufficientBalance {
                available: 10_000,
                requested: 11_000
            }
        ));
        let id = rejection.transfer_id.expect("failed transfer is recorded");
        let view = service.get_transfer(&id).await.unwrap();
        assert_eq!(view.status, TransferStatus::Failed);
        assert_eq!(view.error_code, Some(ErrorCode::InsufficientBalance));
        assert!(view.line_items.is_empty());
        assert_eq!(balance(&service, &alice).await, dec!(100.00));
        assert_eq!(balance(&service, &bob).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_transfers_conserve_total_balance() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let a = party(&service, "a", &p, dec!(300.00)).await;
        let b = party(&service, "b", &p, dec!(45.50)).await;
        let c = party(&service, "c", &p, Decimal::ZERO).await;
        let before = total_minor(&service);

        service
            .process_transfer(transfer(&a, &b, dec!(120.25)))
            .await
            .unwrap();
        service
            .process_transfer(transfer(&b, &c, dec!(100.00)))
            .await
            .unwrap();
        service
            .process_transfer(transfer(&c, &a, dec!(500.00)))
            .await
            .unwrap_err();

        assert_eq!(total_minor(&service), before);
        assert_eq!(balance(&service, &a).await, dec!(179.75));
        assert_eq!(balance(&service, &b).await, dec!(65.75));
        assert_eq!(balance(&service, &c).await, dec!(100.00));
    }

    #[tokio::test]
    async fn test_transfer_of_whole_balance_leaves_zero() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(100.00)).await;
        let bob = party(&service, "bob", &p, Decimal::ZERO).await;

        let response = service
            .process_transfer(transfer(&alice, &bob, dec!(100.00)))
            .await
            .unwrap();
        assert_eq!(response.payer_balance, Decimal::ZERO);

        let rejection = service
            .process_transfer(transfer(&alice, &bob, dec!(0.01)))
            .await
            .unwrap_err();
        assert_eq!(rejection.error.code(), ErrorCode::InsufficientBalance);
        assert_eq!(balance(&service, &alice).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_request_errors_write_no_record() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(100.00)).await;
        let bob = party(&service, "bob", &p, Decimal::ZERO).await;

        let same = service
            .process_transfer(transfer(&alice, &alice, dec!(1.00)))
            .await
            .unwrap_err();
        assert!(matches!(same.error, AppError::BadRequest(_)));
        assert!(same.transfer_id.is_none());

        let zero = service
            .process_transfer(transfer(&alice, &bob, Decimal::ZERO))
            .await
            .unwrap_err();
        assert_eq!(zero.error.code(), ErrorCode::InvalidAmount);

        let fractional = service
            .process_transfer(transfer(&alice, &bob, dec!(1.005)))
            .await
            .unwrap_err();
        assert_eq!(fractional.error.code(), ErrorCode::InvalidAmount);

        let mut long = transfer(&alice, &bob, dec!(1.00));
        long.remarks = Some("x".repeat(501));
        let long = service.process_transfer(long).await.unwrap_err();
        assert!(matches!(long.error, AppError::BadRequest(_)));

        let page = service
            .list_transfers(&alice, ListTransfersQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_missing_payee_wallet_fails_without_moving_money() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(100.00)).await;
        let ghost = OwnerId::new("ghost");

        let rejection = service
            .process_transfer(transfer(&alice, &ghost, dec!(10.00)))
            .await
            .unwrap_err();

        assert_eq!(rejection.error.code(), ErrorCode::NotFound);
        assert!(rejection.transfer_id.is_some());
        assert_eq!(balance(&service, &alice).await, dec!(100.00));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Idempotency
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_same_idempotency_key_mutates_once() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(100.00)).await;
        let bob = party(&service, "bob", &p, Decimal::ZERO).await;

        let mut req = transfer(&alice, &bob, dec!(30.00));
        req.idempotency_key = Some("order-17".into());

        let first = service.process_transfer(req.clone()).await.unwrap();
        let second = service.process_transfer(req.clone()).await.unwrap();

        assert_eq!(first.transfer_id, second.transfer_id);
        assert!(second.replayed);
        assert_eq!(second.payer_balance, dec!(70.00));
        assert_eq!(second.payee_balance, dec!(30.00));
        assert_eq!(balance(&service, &alice).await, dec!(70.00));

        let page = service
            .list_transfers(&alice, ListTransfersQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        req.amount = dec!(31.00);
        let mismatch = service.process_transfer(req).await.unwrap_err();
        assert!(matches!(mismatch.error, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_failed_outcome_is_replayed() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(10.00)).await;
        let bob = party(&service, "bob", &p, Decimal::ZERO).await;

        let mut req = transfer(&alice, &bob, dec!(30.00));
        req.idempotency_key = Some("order-18".into());

        let first = service.process_transfer(req.clone()).await.unwrap_err();
        // Funding the wallet does not change the recorded outcome.
        service
            .credit_wallet(
                &alice,
                WalletAdjustmentRequest {
                    amount: dec!(100.00),
                    kind: WalletKind::Main,
                },
            )
            .await
            .unwrap();
        let second = service.process_transfer(req).await.unwrap_err();

        assert_eq!(first.transfer_id, second.transfer_id);
        assert_eq!(second.error.code(), ErrorCode::InsufficientBalance);
        assert!(matches!(second.error, AppError::Replayed { .. }));
        assert_eq!(balance(&service, &alice).await, dec!(110.00));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resubmissions_share_one_outcome() {
        let service = Arc::new(ledger());
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(100.00)).await;
        let bob = party(&service, "bob", &p, Decimal::ZERO).await;

        let mut req = transfer(&alice, &bob, dec!(40.00));
        req.idempotency_key = Some("order-19".into());

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let service = Arc::clone(&service);
                let req = req.clone();
                tokio::spawn(async move { service.process_transfer(req).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().transfer_id);
        }
        ids.dedup();

        assert_eq!(ids.len(), 1);
        assert_eq!(balance(&service, &alice).await, dec!(60.00));
        assert_eq!(balance(&service, &bob).await, dec!(40.00));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Concurrency
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_debits_never_overdraw() {
        let service = Arc::new(ledger());
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(100.00)).await;

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let service = Arc::clone(&service);
                let alice = alice.clone();
                tokio::spawn(async move {
                    service
                        .debit_wallet(
                            &alice,
                            WalletAdjustmentRequest {
                                amount: dec!(30.00),
                                kind: WalletKind::Main,
                            },
                        )
                        .await
                })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(e) => assert_eq!(e.code(), ErrorCode::InsufficientBalance),
            }
        }

        assert_eq!(succeeded, 3);
        assert_eq!(balance(&service, &alice).await, dec!(10.00));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_transfers_conserve_and_never_overdraw() {
        let service = Arc::new(ledger());
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(100.00)).await;
        let bob = party(&service, "bob", &p, Decimal::ZERO).await;
        let carol = party(&service, "carol", &p, Decimal::ZERO).await;
        let before = total_minor(&service);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = Arc::clone(&service);
                let payee = if i % 2 == 0 { bob.clone() } else { carol.clone() };
                let req = transfer(&alice, &payee, dec!(25.00));
                tokio::spawn(async move { service.process_transfer(req).await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(rejection) => {
                    assert_eq!(rejection.error.code(), ErrorCode::InsufficientBalance)
                }
            }
        }

        assert_eq!(succeeded, 4);
        assert_eq!(balance(&service, &alice).await, Decimal::ZERO);
        assert_eq!(total_minor(&service), before);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Thresholds
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_single_amount_over_daily_cap() {
        let service = ledger();
        let p = profile(&service, dec!(500.00)).await;
        let alice = party(&service, "alice", &p, Decimal::ZERO).await;

        let check = service
            .validate_thresholds(ValidateThresholdRequest {
                owner_id: alice,
                amount: dec!(600.00),
                role: Role::Payer,
                group_id: None,
            })
            .await
            .unwrap();

        assert!(!check.valid);
        assert!(
            check
                .violations
                .iter()
                .any(|v| v.window == Window::Daily && v.kind == ViolationKind::Amount)
        );
        assert!(
            check
                .violations
                .iter()
                .all(|v| v.window == Window::Daily)
        );
    }

    #[tokio::test]
    async fn test_cumulative_usage_over_daily_cap() {
        let service = ledger();
        let p = profile(&service, dec!(500.00)).await;
        let alice = party(&service, "alice", &p, dec!(1000.00)).await;
        let bob = party(&service, "bob", &p, Decimal::ZERO).await;

        service
            .process_transfer(transfer(&alice, &bob, dec!(150.00)))
            .await
            .unwrap();

        let check = service
            .validate_thresholds(ValidateThresholdRequest {
                owner_id: alice.clone(),
                amount: dec!(400.00),
                role: Role::Payer,
                group_id: None,
            })
            .await
            .unwrap();

        assert!(!check.valid);
        assert_eq!(check.violations.len(), 1);
        assert_eq!(check.violations[0].window, Window::Daily);
        assert_eq!(check.violations[0].kind, ViolationKind::Cumulative);

        let remaining = service
            .remaining_limits(&alice, RemainingLimitsQuery::default())
            .await
            .unwrap();
        let daily = &remaining.windows[0];
        assert_eq!(daily.window, Window::Daily);
        assert_eq!(daily.amount_used, dec!(150.00));
        assert_eq!(daily.amount_remaining, dec!(350.00));
        assert_eq!(daily.count_remaining, 99);
        assert_eq!(remaining.windows[1].amount_limit, dec!(3500.00));
    }

    #[tokio::test]
    async fn test_threshold_violation_fails_transfer() {
        let service = ledger();
        let p = profile(&service, dec!(500.00)).await;
        let alice = party(&service, "alice", &p, dec!(1000.00)).await;
        let bob = party(&service, "bob", &p, Decimal::ZERO).await;

        let rejection = service
            .process_transfer(transfer(&alice, &bob, dec!(600.00)))
            .await
            .unwrap_err();

        assert!(matches!(rejection.error, AppError::ThresholdViolation(_)));
        let view = service
            .get_transfer(&rejection.transfer_id.unwrap())
            .await
            .unwrap();
        assert_eq!(view.error_code, Some(ErrorCode::ThresholdViolation));
        assert!(
            view.remarks
                .unwrap()
                .contains("Daily amount limit exceeded")
        );
        assert_eq!(balance(&service, &alice).await, dec!(1000.00));
    }

    #[tokio::test]
    async fn test_missing_limits_are_not_found() {
        let service = ledger();
        let p = profile(&service, dec!(500.00)).await;
        let alice = party(&service, "alice", &p, Decimal::ZERO).await;

        let result = service
            .validate_thresholds(ValidateThresholdRequest {
                owner_id: alice,
                amount: dec!(1.00),
                role: Role::Payer,
                group_id: Some("VIP".into()),
            })
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_limits_require_existing_profile() {
        let service = ledger();

        let result = service
            .set_limits(
                ThresholdProfileId::new("THP_missing"),
                Default::default(),
                SetLimitsRequest {
                    payer_count: 1,
                    payer_amount: dec!(1.00),
                    payee_count: 1,
                    payee_amount: dec!(1.00),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Payment gates
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_recharge_passes_gates() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let merchant = party(&service, "merchant", &p, dec!(500.00)).await;
        let subscriber = party(&service, "subscriber", &p, Decimal::ZERO).await;
        service
            .set_product_status("PRD_MOBILE", ProductStatusRequest { active: true })
            .await
            .unwrap();

        let response = service
            .process_payment(recharge(&merchant, &subscriber, dec!(199.00), PIN))
            .await
            .unwrap();

        let view = service.get_transfer(&response.transfer_id).await.unwrap();
        assert_eq!(view.service_type, ServiceType::Recharge);
        assert_eq!(view.product_id.as_deref(), Some("PRD_MOBILE"));
        assert_eq!(balance(&service, &subscriber).await, dec!(199.00));
    }

    #[tokio::test]
    async fn test_gate_failures_write_no_record() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let merchant = party(&service, "merchant", &p, dec!(500.00)).await;
        let subscriber = party(&service, "subscriber", &p, Decimal::ZERO).await;

        let unavailable = service
            .process_payment(recharge(&merchant, &subscriber, dec!(10.00), PIN))
            .await
            .unwrap_err();
        assert_eq!(unavailable.error.code(), ErrorCode::ProductUnavailable);

        service
            .set_product_status("PRD_MOBILE", ProductStatusRequest { active: true })
            .await
            .unwrap();
        let wrong_pin = service
            .process_payment(recharge(&merchant, &subscriber, dec!(10.00), "0000"))
            .await
            .unwrap_err();
        assert!(matches!(wrong_pin.error, AppError::InvalidCredential));
        assert!(wrong_pin.transfer_id.is_none());

        service
            .register_account(RegisterAccountRequest {
                id: merchant.clone(),
                account_type: AccountType::User,
                status: Some(AccountStatus::Inactive),
                pin: Some(PIN.into()),
                threshold_profile_id: Some(p),
            })
            .await
            .unwrap();
        let inactive = service
            .process_payment(recharge(&merchant, &subscriber, dec!(10.00), PIN))
            .await
            .unwrap_err();
        assert_eq!(inactive.error.code(), ErrorCode::AccountInactive);

        let page = service
            .list_transfers(&merchant, ListTransfersQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(balance(&service, &merchant).await, dec!(500.00));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries and administration
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_list_transfers_filters_by_status() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(100.00)).await;
        let bob = party(&service, "bob", &p, Decimal::ZERO).await;

        service
            .process_transfer(transfer(&alice, &bob, dec!(10.00)))
            .await
            .unwrap();
        service
            .process_transfer(transfer(&alice, &bob, dec!(1000.00)))
            .await
            .unwrap_err();

        let all = service
            .list_transfers(
                &bob,
                ListTransfersQuery {
                    status: Some("ALL".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(all.total, 2);

        let failed = service
            .list_transfers(
                &alice,
                ListTransfersQuery {
                    status: Some("FAILED".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(failed.total, 1);
        assert_eq!(failed.items[0].status, TransferStatus::Failed);

        let bad_status = service
            .list_transfers(
                &alice,
                ListTransfersQuery {
                    status: Some("DONE".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(bad_status, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_list_transfers_rejects_inverted_range() {
        let service = ledger();
        let now = chrono::Utc::now();

        let result = service
            .list_transfers(
                &OwnerId::new("alice"),
                ListTransfersQuery {
                    from: Some(now),
                    to: Some(now - chrono::Duration::hours(1)),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_wallet_requires_registered_account() {
        let service = ledger();

        let result = service
            .create_wallet(CreateWalletRequest {
                owner_id: OwnerId::new("nobody"),
                kind: WalletKind::Main,
            })
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_check_balance() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(100.00)).await;

        let enough = service
            .check_balance(
                &alice,
                ledger_types::BalanceCheckQuery {
                    amount: dec!(100.00),
                    kind: None,
                },
            )
            .await
            .unwrap();
        let short = service
            .check_balance(
                &alice,
                ledger_types::BalanceCheckQuery {
                    amount: dec!(100.01),
                    kind: None,
                },
            )
            .await
            .unwrap();

        assert!(enough.sufficient);
        assert!(!short.sufficient);
    }

    #[tokio::test]
    async fn test_register_account_hashes_pin() {
        let service = ledger();

        let view = service
            .register_account(RegisterAccountRequest {
                id: OwnerId::new("alice"),
                account_type: AccountType::Merchant,
                status: None,
                pin: Some(PIN.into()),
                threshold_profile_id: None,
            })
            .await
            .unwrap();
        assert!(view.has_pin);
        assert_eq!(view.status, AccountStatus::Active);

        let short_pin = service
            .register_account(RegisterAccountRequest {
                id: OwnerId::new("bob"),
                account_type: AccountType::User,
                status: None,
                pin: Some("12".into()),
                threshold_profile_id: None,
            })
            .await;
        assert!(matches!(short_pin, Err(AppError::BadRequest(_))));

        let unknown_profile = service
            .register_account(RegisterAccountRequest {
                id: OwnerId::new("carol"),
                account_type: AccountType::User,
                status: None,
                pin: None,
                threshold_profile_id: Some(ThresholdProfileId::new("THP_missing")),
            })
            .await;
        assert!(matches!(unknown_profile, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_generated_ids_carry_their_prefix() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(50.00)).await;
        let bob = party(&service, "bob", &p, Decimal::ZERO).await;

        let done = service
            .process_transfer(transfer(&alice, &bob, dec!(5.00)))
            .await
            .unwrap();
        assert!(done.transfer_id.as_str().starts_with(&format!("{}_", prefix::TRANSFER)));
        assert!(p.as_str().starts_with(&format!("{}_", prefix::PROFILE)));
    }

    #[tokio::test]
    async fn test_payment_pin_must_belong_to_payer() {
        let service = ledger();
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(500.00)).await;
        let mallory = party(&service, "mallory", &p, Decimal::ZERO).await;
        service
            .register_account(RegisterAccountRequest {
                id: mallory.clone(),
                account_type: AccountType::User,
                status: None,
                pin: Some("9999".into()),
                threshold_profile_id: Some(p.clone()),
            })
            .await
            .unwrap();
        service
            .set_product_status("PRD_MOBILE", ProductStatusRequest { active: true })
            .await
            .unwrap();

        // Acting on alice's wallet with the actor's own PIN
        let mut hijack = recharge(&alice, &mallory, dec!(200.00), "9999");
        hijack.transfer.created_by = Some(mallory.clone());
        let rejection = service.process_payment(hijack).await.unwrap_err();
        assert!(matches!(rejection.error, AppError::InvalidCredential));
        assert!(rejection.transfer_id.is_none());
        assert_eq!(balance(&service, &alice).await, dec!(500.00));

        let mut delegated = recharge(&alice, &mallory, dec!(200.00), PIN);
        delegated.transfer.created_by = Some(mallory.clone());
        let done = service.process_payment(delegated).await.unwrap();
        assert_eq!(done.status, TransferStatus::Success);
        assert_eq!(balance(&service, &alice).await, dec!(300.00));

        let mut ghost = recharge(&alice, &mallory, dec!(10.00), PIN);
        ghost.transfer.created_by = Some(OwnerId::new("ghost"));
        let unknown_actor = service.process_payment(ghost).await.unwrap_err();
        assert_eq!(unknown_actor.error.code(), ErrorCode::AccountInactive);
        assert_eq!(balance(&service, &alice).await, dec!(300.00));
    }

    #[tokio::test]
    async fn test_held_party_lock_fails_after_bounded_retries() {
        let repo = MemoryRepo::new();
        let config = OrchestratorConfig {
            lock_wait: Duration::from_millis(20),
            conflict_retries: 2,
            retry_backoff: Duration::from_millis(1),
        };
        let service =
            LedgerService::with_config(repo.clone(), Collaborators::backed_by(repo), config);
        let p = profile(&service, dec!(100000.00)).await;
        let alice = party(&service, "alice", &p, dec!(100.00)).await;
        let bob = party(&service, "bob", &p, Decimal::ZERO).await;

        let held = service.locks().acquire([alice.as_str()]).await.unwrap();
        let started = Instant::now();
        let rejection = service
            .process_transfer(transfer(&alice, &bob, dec!(10.00)))
            .await
            .unwrap_err();
        // One wait per attempt
        assert!(started.elapsed() >= Duration::from_millis(60));
        drop(held);

        assert_eq!(rejection.error.code(), ErrorCode::ConcurrencyConflict);
        let id = rejection.transfer_id.expect("conflict is recorded");
        let view = service.get_transfer(&id).await.unwrap();
        assert_eq!(view.status, TransferStatus::Failed);
        assert_eq!(view.error_code, Some(ErrorCode::ConcurrencyConflict));
        assert_eq!(balance(&service, &alice).await, dec!(100.00));
        assert_eq!(balance(&service, &bob).await, Decimal::ZERO);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_transfers_cannot_jointly_exceed_cap() {
        let service = Arc::new(ledger());
        let p = profile(&service, dec!(500.00)).await;
        let alice = party(&service, "alice", &p, dec!(1000.00)).await;
        let bob = party(&service, "bob", &p, Decimal::ZERO).await;
        let carol = party(&service, "carol", &p, Decimal::ZERO).await;

        let handles: Vec<_> = [bob, carol]
            .into_iter()
            .map(|payee| {
                let service = Arc::clone(&service);
                let req = transfer(&alice, &payee, dec!(300.00));
                tokio::spawn(async move { service.process_transfer(req).await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(rejection) => {
                    assert_eq!(rejection.error.code(), ErrorCode::ThresholdViolation)
                }
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(balance(&service, &alice).await, dec!(700.00));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_services_sharing_a_store_agree_on_idempotency_key() {
        // Separate lock tables, as two processes over one database would have
        let repo = MemoryRepo::new();
        let first = Arc::new(LedgerService::new(
            repo.clone(),
            Collaborators::backed_by(repo.clone()),
        ));
        let second = Arc::new(LedgerService::new(
            repo.clone(),
            Collaborators::backed_by(repo),
        ));
        let p = profile(&first, dec!(100000.00)).await;
        let alice = party(&first, "alice", &p, dec!(100.00)).await;
        let bob = party(&first, "bob", &p, Decimal::ZERO).await;

        let mut req = transfer(&alice, &bob, dec!(40.00));
        req.idempotency_key = Some("order-77".into());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = Arc::clone(if i % 2 == 0 { &first } else { &second });
                let req = req.clone();
                tokio::spawn(async move { service.process_transfer(req).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(response) => ids.push(response.transfer_id),
                Err(rejection) => {
                    // Still in flight on the other service
                    assert_eq!(rejection.error.code(), ErrorCode::ConcurrencyConflict);
                    ids.push(rejection.transfer_id.expect("points at the recorded transfer"));
                }
            }
        }
        ids.dedup();

        assert_eq!(ids.len(), 1);
        assert_eq!(balance(&first, &alice).await, dec!(60.00));
        assert_eq!(balance(&second, &bob).await, dec!(40.00));
    }
}
