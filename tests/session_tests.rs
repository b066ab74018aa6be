#[cfg(test)]
mod tests {
    use party_loot::roll::select_winner;
    use party_loot::*;

    fn party(policy: PolicyKind, members: &[&str]) -> SessionCoordinator<MemoryHost> {
        let config = SessionConfig {
            initial_policy: policy,
            roll_timeout_ticks: 10,
            trade_request_timeout_ticks: 20,
            ..SessionConfig::default()
        }
        .with_seed(42);
        SessionCoordinator::new(config, MemoryHost::with_party(members.iter().copied()))
    }

    fn pid(name: &str) -> ParticipantId {
        ParticipantId::from(name)
    }

    fn drop_of(item: &str) -> LootDrop {
        LootDrop::new(item, 1, Position::new(1.0, 2.0, 3.0))
    }

    fn contested(session: &mut SessionCoordinator<MemoryHost>, item: &str) -> SessionId {
        match session.distribute(drop_of(item)).unwrap() {
            Distribution::Contested { session_id, .. } => session_id,
            other => panic!("expected a roll, got {:?}", other),
        }
    }

    // ========== Distribution ==========

    #[test]
    fn test_round_robin_walks_roster_after_cursor() {
        let mut session = party(PolicyKind::RoundRobin, &["A", "B", "C"]);
        let recipients: Vec<String> = (0..4)
            .map(|_| match session.distribute(drop_of("coin")).unwrap() {
                Distribution::Assigned { recipient, method, .. } => {
                    assert_eq!(method, ResolutionMethod::RoundRobin);
                    recipient.0
                }
                other => panic!("expected assignment, got {:?}", other),
            })
            .collect();
        assert_eq!(recipients, vec!["B", "C", "A", "B"]);
    }

    #[test]
    fn test_round_robin_shares_are_floor_or_ceil() {
        let members = ["A", "B", "C", "D", "E"];
        for n in [1u32, 4, 5, 13, 27] {
            let mut session = party(PolicyKind::RoundRobin, &members);
            for _ in 0..n {
                session.distribute(drop_of("ore")).unwrap();
            }
            let floor = n / members.len() as u32;
            let ceil = floor + u32::from(n % members.len() as u32 != 0);
            for m in members {
                let held = session.host().owned_grants(&pid(m), &ItemId::from("ore")) as u32;
                assert!(held == floor || held == ceil, "{m} holds {held} after {n} drops");
            }
        }
    }

    #[test]
    fn test_free_for_all_drops_shared_grant() {
        let mut session = party(PolicyKind::FreeForAll, &["A", "B"]);
        let result = session.distribute(drop_of("herb")).unwrap();
        assert!(matches!(result, Distribution::Dropped { .. }));
        let (_, grant) = &session.host().world_grants()[0];
        assert_eq!(grant.owner, None);
        assert_eq!(grant.position, Position::new(1.0, 2.0, 3.0));
        assert!(session.recent_history(10).is_empty());
    }

    #[test]
    fn test_master_loot_goes_to_leader() {
        let mut session = party(PolicyKind::MasterLoot, &["A", "B"]);
        let result = session.distribute(drop_of("crown")).unwrap();
        assert!(matches!(result, Distribution::Assigned { ref recipient, .. } if recipient == &pid("A")));
        assert_eq!(session.recent_history(1)[0].method, ResolutionMethod::MasterLoot);
    }

    #[test]
    fn test_master_loot_without_leader_falls_back() {
        let mut session = party(PolicyKind::MasterLoot, &["A", "B"]);
        session.host_mut().set_leader(None);
        let result = session.distribute(drop_of("crown")).unwrap();
        assert!(matches!(result, Distribution::Dropped { .. }));
    }

    #[test]
    fn test_non_leader_cannot_change_policy() {
        let mut session = party(PolicyKind::FreeForAll, &["A", "B"]);
        let err = session.set_policy(&pid("B"), PolicyKind::MasterLoot).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(session.policy().kind(), PolicyKind::FreeForAll);
        assert!(session.host().events().is_empty());
    }

    #[test]
    fn test_personal_loot_grants_are_owned() {
        let mut session = party(PolicyKind::PersonalLoot, &["A", "B", "C"]);
        let mut total = 0;
        for _ in 0..60 {
            let Distribution::Personal { grants } = session.distribute(drop_of("shard")).unwrap() else {
                panic!("expected personal grants");
            };
            total += grants.len();
        }
        assert!(total > 0);
        for (_, grant) in session.host().world_grants() {
            assert!(grant.owner.is_some());
            assert!(grant.is_personal());
        }
    }

    #[test]
    fn test_personal_loot_can_award_nobody() {
        let mut session = party(PolicyKind::PersonalLoot, &["A", "B", "C"]);
        let mut awarded = 0;
        let mut empty_seen = false;
        for _ in 0..100 {
            let Distribution::Personal { grants } = session.distribute(drop_of("shard")).unwrap() else {
                panic!("expected personal grants");
            };
            awarded += grants.len();
            if grants.is_empty() {
                empty_seen = true;
                break;
            }
        }
        assert!(empty_seen, "no empty personal roll in 100 seeded drops");
        // Nothing was spawned for the empty roll.
        assert_eq!(session.host().world_grants().len(), awarded);
    }

    #[test]
    fn test_zero_amount_drop_rejected() {
        let mut session = party(PolicyKind::RoundRobin, &["A", "B"]);
        let err = session.distribute(LootDrop::new("dust", 0, Position::default())).unwrap_err();
        assert_eq!(err, LootError::ZeroAmount);
        assert!(session.host().world_grants().is_empty());
    }

    // ========== Rolls ==========

    #[test]
    fn test_need_beats_greed_after_timeout() {
        let mut session = party(PolicyKind::NeedGreed, &["A", "B", "C"]);
        let roll = contested(&mut session, "Sword");
        session.submit_vote(roll, &pid("A"), VoteKind::Greed).unwrap();
        let second = session.submit_vote(roll, &pid("B"), VoteKind::Need).unwrap();
        assert!(second.settlement.is_none());

        let mut settled = None;
        for _ in 0..=10 {
            let report = session.tick();
            if let Some(s) = report.resolved_rolls.into_iter().next() {
                settled = Some(s);
                break;
            }
        }
        match settled {
            Some(RollSettlement::Awarded { recipient, method, .. }) => {
                assert_eq!(recipient, pid("B"));
                assert!(matches!(method, ResolutionMethod::Need { .. }));
            }
            other => panic!("expected B to win, got {:?}", other),
        }
        assert_eq!(session.host().item_count(&pid("B"), &ItemId::from("Sword")), 1);
    }

    #[test]
    fn test_full_quorum_resolves_immediately() {
        let mut session = party(PolicyKind::NeedGreed, &["A", "B"]);
        let roll = contested(&mut session, "ring");
        session.submit_vote(roll, &pid("A"), VoteKind::Pass).unwrap();
        let last = session.submit_vote(roll, &pid("B"), VoteKind::Pass).unwrap();
        assert!(matches!(last.settlement, Some(RollSettlement::Dropped { .. })));
        assert!(session.roll_session(roll).is_none());
    }

    #[test]
    fn test_force_resolve_twice_is_noop() {
        let mut session = party(PolicyKind::NeedGreed, &["A", "B", "C"]);
        let roll = contested(&mut session, "helm");
        session.submit_vote(roll, &pid("C"), VoteKind::Greed).unwrap();
        assert!(session.force_resolve(roll).is_some());
        assert!(session.force_resolve(roll).is_none());
        session.run_batch(20);
        let resolved = session
            .host()
            .events()
            .iter()
            .filter(|e| matches!(e, LootEvent::RollSessionResolved { .. }))
            .count();
        assert_eq!(resolved, 1);
        assert_eq!(session.host().item_count(&pid("C"), &ItemId::from("helm")), 1);
    }

    #[test]
    fn test_duplicate_vote_rejected() {
        let mut session = party(PolicyKind::NeedGreed, &["A", "B", "C"]);
        let roll = contested(&mut session, "cloak");
        session.submit_vote(roll, &pid("A"), VoteKind::Greed).unwrap();
        let err = session.submit_vote(roll, &pid("A"), VoteKind::Need).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(session.roll_session(roll).unwrap().votes.len(), 1);
    }

    #[test]
    fn test_late_joiner_not_eligible() {
        let mut session = party(PolicyKind::NeedGreed, &["A", "B"]);
        let roll = contested(&mut session, "staff");
        session.host_mut().join("D");
        let err = session.submit_vote(roll, &pid("D"), VoteKind::Need).unwrap_err();
        assert!(matches!(err, LootError::NotEligible { .. }));
    }

    #[test]
    fn test_departed_member_keeps_vote_slot() {
        let mut session = party(PolicyKind::NeedGreed, &["A", "B"]);
        let roll = contested(&mut session, "bow");
        session.host_mut().leave(&pid("B"));
        session.submit_vote(roll, &pid("A"), VoteKind::Pass).unwrap();
        let last = session.submit_vote(roll, &pid("B"), VoteKind::Greed).unwrap();
        assert!(matches!(last.settlement, Some(RollSettlement::Awarded { ref recipient, .. }) if recipient == &pid("B")));
    }

    #[test]
    fn test_single_member_need_greed_falls_back() {
        let mut session = party(PolicyKind::NeedGreed, &["A"]);
        let result = session.distribute(drop_of("gem")).unwrap();
        assert!(matches!(result, Distribution::Dropped { .. }));
        assert!(session.open_roll_sessions().is_empty());
    }

    #[test]
    fn test_need_priority_ignores_roll_values() {
        let vote = |who: &str, kind, roll, sequence| Vote {
            participant: pid(who),
            kind,
            roll,
            sequence,
            cast_at: 0,
        };
        let votes = vec![vote("A", VoteKind::Greed, 100, 1), vote("B", VoteKind::Need, 1, 2)];
        assert_eq!(select_winner(&votes).map(|v| v.participant.clone()), Some(pid("B")));
    }

    #[test]
    fn test_equal_need_rolls_resolve_to_first_voter_in_session() {
        let mut session = party(PolicyKind::NeedGreed, &["A", "B"]);
        let mut tie_seen = false;
        for _ in 0..2000 {
            let roll = contested(&mut session, "orb");
            let first = session.submit_vote(roll, &pid("A"), VoteKind::Need).unwrap().vote;
            let last = session.submit_vote(roll, &pid("B"), VoteKind::Need).unwrap();
            let Some(RollSettlement::Awarded { recipient, .. }) = last.settlement else {
                panic!("two Need votes must award the grant");
            };
            let expected = if last.vote.roll > first.roll { pid("B") } else { pid("A") };
            assert_eq!(recipient, expected);
            if last.vote.roll == first.roll {
                tie_seen = true;
                break;
            }
        }
        assert!(tie_seen, "no equal rolls in 2000 seeded sessions");
    }

    #[test]
    fn test_equal_need_rolls_go_to_first_submitter() {
        let vote = |who: &str, sequence| Vote {
            participant: pid(who),
            kind: VoteKind::Need,
            roll: 77,
            sequence,
            cast_at: 0,
        };
        let votes = vec![vote("C", 4), vote("A", 2), vote("B", 3)];
        for _ in 0..3 {
            assert_eq!(select_winner(&votes).map(|v| v.participant.clone()), Some(pid("A")));
        }
    }

    // ========== Trades ==========

    fn stocked(members: &[&str]) -> SessionCoordinator<MemoryHost> {
        let mut session = party(PolicyKind::FreeForAll, members);
        for m in members {
            session.host_mut().credit_gold(&pid(m), 50);
            session.host_mut().credit(&pid(m), &ItemId::from("potion"), 3);
            session.host_mut().credit(&pid(m), &ItemId::from("scroll"), 3);
        }
        session
    }

    #[test]
    fn test_staging_clears_counterparty_confirmation() {
        let mut session = stocked(&["X", "Y"]);
        let trade = session.initiate_trade(&pid("X"), &pid("Y")).unwrap();
        session.accept_trade(trade, &pid("Y")).unwrap();
        session.stage_gold(trade, &pid("X"), 5).unwrap();
        session.stage_item(trade, &pid("Y"), "potion", 1).unwrap();
        session.confirm_trade(trade, &pid("X")).unwrap();
        assert!(session.trade(trade).unwrap().is_confirmed_by(&pid("X")));

        session.stage_item(trade, &pid("Y"), "scroll", 1).unwrap();
        assert!(!session.trade(trade).unwrap().is_confirmed_by(&pid("X")));

        // Y's confirmation alone must not execute anything.
        let outcome = session.confirm_trade(trade, &pid("Y")).unwrap();
        assert_eq!(outcome, ConfirmOutcome::Waiting);
        assert_eq!(session.host().gold(&pid("Y")), 50);
    }

    #[test]
    fn test_completed_trade_moves_exactly_what_was_staged() {
        let mut session = stocked(&["X", "Y"]);
        let trade = session.initiate_trade(&pid("X"), &pid("Y")).unwrap();
        session.accept_trade(trade, &pid("Y")).unwrap();
        session.stage_gold(trade, &pid("X"), 5).unwrap();
        session.stage_item(trade, &pid("Y"), "potion", 1).unwrap();
        session.stage_item(trade, &pid("Y"), "potion", 2).unwrap();
        session.confirm_trade(trade, &pid("Y")).unwrap();
        let outcome = session.confirm_trade(trade, &pid("X")).unwrap();
        assert!(matches!(outcome, ConfirmOutcome::Completed(_)));

        let potion = ItemId::from("potion");
        assert_eq!(session.host().gold(&pid("X")), 45);
        assert_eq!(session.host().gold(&pid("Y")), 55);
        assert_eq!(session.host().item_count(&pid("X"), &potion), 6);
        assert_eq!(session.host().item_count(&pid("Y"), &potion), 0);
        assert_eq!(session.host().total_items(&potion), 6);
        assert!(session.trade(trade).is_none());
        assert_eq!(session.open_trade_of(&pid("X")), None);
    }

    #[test]
    fn test_overdrawn_trade_rolls_back() {
        let mut session = stocked(&["X", "Y"]);
        let trade = session.initiate_trade(&pid("X"), &pid("Y")).unwrap();
        session.accept_trade(trade, &pid("Y")).unwrap();
        session.stage_item(trade, &pid("X"), "scroll", 2).unwrap();
        session.stage_gold(trade, &pid("Y"), 80).unwrap();
        session.confirm_trade(trade, &pid("X")).unwrap();
        let outcome = session.confirm_trade(trade, &pid("Y")).unwrap();
        assert_eq!(outcome, ConfirmOutcome::Aborted(TradeCancelReason::InsufficientAssets(pid("Y"))));
        assert_eq!(session.host().item_count(&pid("X"), &ItemId::from("scroll")), 3);
        assert_eq!(session.host().gold(&pid("Y")), 50);
        assert!(session.trade(trade).is_none());
    }

    #[test]
    fn test_trade_rejections() {
        let mut session = stocked(&["X", "Y", "Z"]);
        assert_eq!(session.initiate_trade(&pid("X"), &pid("X")), Err(LootError::SelfTrade(pid("X"))));
        let trade = session.initiate_trade(&pid("X"), &pid("Y")).unwrap();
        assert!(matches!(session.initiate_trade(&pid("X"), &pid("Z")), Err(LootError::TradeAlreadyOpen(_))));
        assert!(matches!(session.initiate_trade(&pid("Z"), &pid("Y")), Err(LootError::TargetBusy(_))));
        assert!(matches!(session.accept_trade(trade, &pid("X")), Err(LootError::NotTradeTarget { .. })));
        assert!(matches!(session.stage_gold(trade, &pid("X"), 1), Err(LootError::TradeNotActive(_))));
        session.accept_trade(trade, &pid("Y")).unwrap();
        assert_eq!(session.confirm_trade(trade, &pid("X")), Err(LootError::NothingStaged(trade)));
        assert!(matches!(session.stage_gold(trade, &pid("Z"), 1), Err(LootError::NotTradeParticipant { .. })));
    }

    #[test]
    fn test_cancel_discards_offers() {
        let mut session = stocked(&["X", "Y"]);
        let trade = session.initiate_trade(&pid("X"), &pid("Y")).unwrap();
        session.accept_trade(trade, &pid("Y")).unwrap();
        session.stage_gold(trade, &pid("X"), 10).unwrap();
        session.confirm_trade(trade, &pid("X")).unwrap();
        session.cancel_trade(trade, &pid("Y")).unwrap();
        assert!(session.trade(trade).is_none());
        assert_eq!(session.host().gold(&pid("X")), 50);
        assert!(matches!(session.confirm_trade(trade, &pid("Y")), Err(LootError::UnknownTrade(_))));
        assert!(session.host().events().iter().any(|e| matches!(
            e,
            LootEvent::TradeCancelled { reason: TradeCancelReason::CancelledBy(who), .. } if who == &pid("Y")
        )));
    }

    #[test]
    fn test_unanswered_request_expires() {
        let mut session = stocked(&["X", "Y"]);
        let trade = session.initiate_trade(&pid("X"), &pid("Y")).unwrap();
        session.run_batch(19);
        assert!(session.trade(trade).is_some());
        let report = session.tick();
        assert_eq!(report.expired_trades, vec![trade]);
        assert!(session.initiate_trade(&pid("X"), &pid("Y")).is_ok());
    }

    #[test]
    fn test_declined_request_closes() {
        let mut session = stocked(&["X", "Y"]);
        let trade = session.initiate_trade(&pid("X"), &pid("Y")).unwrap();
        session.decline_trade(trade, &pid("Y")).unwrap();
        assert!(session.trade(trade).is_none());
        assert_eq!(session.open_trade_of(&pid("Y")), None);
    }

    // ========== History ==========

    #[test]
    fn test_history_keeps_last_entries_in_order() {
        let config = SessionConfig { initial_policy: PolicyKind::MasterLoot, history_capacity: 3, ..SessionConfig::default() }
            .with_seed(1);
        let mut session = SessionCoordinator::new(config, MemoryHost::with_party(["A", "B"]));
        for i in 0..7 {
            session.distribute(drop_of(&format!("relic-{i}"))).unwrap();
        }
        assert_eq!(session.history().len(), 3);
        let items: Vec<String> = session.recent_history(3).into_iter().map(|e| e.item.0).collect();
        assert_eq!(items, vec!["relic-4", "relic-5", "relic-6"]);
        assert_eq!(session.recent_history(1)[0].item, ItemId::from("relic-6"));
    }
}
