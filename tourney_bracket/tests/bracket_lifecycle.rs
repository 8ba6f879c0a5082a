//! Integration tests for the bracket lifecycle
//!
//! These tests drive the manager against the in-memory repositories, from
//! generation through the final result and the tournament finish signal.

#[cfg(test)]
mod bracket_lifecycle_tests {
    use std::sync::Arc;
    use tourney_bracket::bracket::{
        Bracket, BracketError, BracketManager, BracketStatus, MatchStatus, Participant,
        build_from_seed_order, record_result,
    };
    use tourney_bracket::db::{BracketRepository, MemoryBracketRepository, MemoryRoster};

    fn player(id: &str) -> Participant {
        Participant::new(id, id.to_uppercase())
    }

    async fn manager_with(
        tournament_id: i64,
        participants: Vec<Participant>,
    ) -> (BracketManager, Arc<MemoryBracketRepository>) {
        let repo = Arc::new(MemoryBracketRepository::new());
        let roster = Arc::new(MemoryRoster::new());
        roster.set_confirmed(tournament_id, participants).await;
        (BracketManager::new(repo.clone(), roster), repo)
    }

    #[test]
    fn test_five_player_bracket_from_fixed_seeding() {
        // Seed order C, A, E, B, D
        let seeded = ["c", "a", "e", "b", "d"].into_iter().map(player).collect();
        let mut bracket = build_from_seed_order(10, seeded).unwrap();

        assert_eq!(bracket.total_rounds, 3);
        assert_eq!(bracket.size(), 8);

        // First round: C-A, E-B pending, D alone, fourth match empty
        assert_eq!(bracket.match_at(1, 1).unwrap().status, MatchStatus::Pending);
        assert_eq!(bracket.match_at(1, 2).unwrap().status, MatchStatus::Pending);
        let lone = bracket.match_at(1, 3).unwrap();
        assert_eq!(lone.status, MatchStatus::Completed);
        assert_eq!(lone.winner.as_ref().unwrap().id, "d");
        assert_eq!(bracket.match_at(1, 4).unwrap().status, MatchStatus::Bye);

        // D walks over in the second semifinal and waits in the final
        let semi = bracket.match_at(2, 2).unwrap();
        assert_eq!(semi.status, MatchStatus::Walkover);
        assert_eq!(semi.winner.as_ref().unwrap().id, "d");
        let final_match = bracket.final_match().unwrap();
        assert_eq!(final_match.status, MatchStatus::Waiting);
        assert_eq!(final_match.slot_b.as_ref().unwrap().id, "d");
        assert_eq!(bracket.current_round, 1);

        // C beats A, then B beats E
        let outcome = record_result(&mut bracket, "r1m1", 3, 1).unwrap();
        assert_eq!(outcome.advanced_to.as_deref(), Some("r2m1"));
        assert_eq!(bracket.match_at(2, 1).unwrap().status, MatchStatus::Waiting);

        record_result(&mut bracket, "r1m2", 0, 2).unwrap();
        let semi = bracket.match_at(2, 1).unwrap();
        assert_eq!(semi.status, MatchStatus::Pending);
        assert_eq!(semi.slot_a.as_ref().unwrap().id, "c");
        assert_eq!(semi.slot_b.as_ref().unwrap().id, "b");
        assert_eq!(bracket.current_round, 2);

        // C wins the semifinal and meets D
        record_result(&mut bracket, "r2m1", 2, 1).unwrap();
        assert_eq!(bracket.current_round, 3);
        assert_eq!(bracket.final_match().unwrap().status, MatchStatus::Pending);

        let outcome = record_result(&mut bracket, "r3m1", 1, 4).unwrap();
        let finish = outcome.finish.unwrap();
        assert_eq!(finish.winner_id, "d");
        assert_eq!(finish.tournament_id, 10);
        assert_eq!(bracket.status, BracketStatus::Finished);
        assert_eq!(bracket.champion().unwrap().id, "d");

        // Re-scoring the final changes nothing
        let before = bracket.clone();
        let err = record_result(&mut bracket, "r3m1", 4, 1).unwrap_err();
        assert!(matches!(err, BracketError::AlreadyCompleted(_)));
        assert_eq!(bracket, before);
    }

    #[test]
    fn test_round_views_and_names() {
        let seeded = (1..=12).map(|i| player(&format!("p{i}"))).collect();
        let bracket = build_from_seed_order(11, seeded).unwrap();

        let views = bracket.round_views();
        let names: Vec<&str> = views.iter().map(|v| v.round.name.as_str()).collect();
        assert_eq!(names, ["Round of 16", "Quarterfinal", "Semifinal", "Final"]);

        let counts: Vec<usize> = views.iter().map(|v| v.matches.len()).collect();
        assert_eq!(counts, [8, 4, 2, 1]);
        assert!(
            views[0]
                .matches
                .windows(2)
                .all(|pair| pair[0].position < pair[1].position)
        );
    }

    #[test]
    fn test_bracket_document_survives_json() {
        let seeded = (1..=6).map(|i| player(&format!("p{i}"))).collect();
        let mut bracket = build_from_seed_order(12, seeded).unwrap();
        record_result(&mut bracket, "r1m1", 1, 0).unwrap();

        let document = serde_json::to_value(&bracket).unwrap();
        assert_eq!(document["status"], "active");
        assert_eq!(document["matches"]["r1m1"]["status"], "completed");

        let restored: Bracket = serde_json::from_value(document).unwrap();
        assert_eq!(restored, bracket);
    }

    #[tokio::test]
    async fn test_fillers_are_not_seeded() {
        let participants = vec![
            player("ana"),
            Participant::filler("bot-1"),
            player("bo"),
            player("cy"),
            Participant::filler("bot-2"),
        ];
        let (manager, _) = manager_with(20, participants).await;

        let bracket_id = manager.generate_bracket(20).await.unwrap();
        let bracket = manager.get_bracket(bracket_id).await.unwrap();

        assert_eq!(bracket.participants.len(), 3);
        assert!(bracket.participants.iter().all(|id| !id.starts_with("bot")));
        assert_eq!(bracket.total_rounds, 2);
    }

    #[tokio::test]
    async fn test_only_fillers_is_rejected() {
        let participants = vec![player("ana"), Participant::filler("bot-1")];
        let (manager, repo) = manager_with(21, participants).await;

        let err = manager.generate_bracket(21).await.unwrap_err();
        assert!(matches!(err, BracketError::Validation(_)));
        assert!(repo.find_by_tournament(21).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_full_tournament_through_manager() {
        let participants = (1..=9).map(|i| player(&format!("p{i}"))).collect();
        let (manager, repo) = manager_with(22, participants).await;

        let bracket_id = manager.generate_bracket(22).await.unwrap();
        let by_tournament = manager.get_bracket_for_tournament(22).await.unwrap().unwrap();
        assert_eq!(by_tournament.id, bracket_id);
        assert_eq!(by_tournament.total_rounds, 4);

        let mut results = 0;
        loop {
            let bracket = manager.get_bracket(bracket_id).await.unwrap();
            let Some(next) = bracket
                .matches
                .values()
                .filter(|m| m.status == MatchStatus::Pending)
                .min_by_key(|m| (m.round, m.position))
                .map(|m| m.id.clone())
            else {
                break;
            };

            let outcome = manager
                .record_match_result(bracket_id, &next, 1, 2)
                .await
                .unwrap();
            results += 1;
            assert_eq!(outcome.finish.is_some(), outcome.advanced_to.is_none());
        }

        // Nine players, eight eliminations
        assert_eq!(results, 8);

        let bracket = manager.get_bracket(bracket_id).await.unwrap();
        assert!(bracket.is_finished());
        assert_eq!(bracket.version, 8);
        assert!(bracket.updated_at.is_some());

        let finish = repo.tournament_finish(22).await.unwrap();
        assert_eq!(finish.winner_id, bracket.champion().unwrap().id);

        let err = manager
            .record_match_result(bracket_id, "r4m1", 2, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, BracketError::AlreadyCompleted(_)));
    }

    #[tokio::test]
    async fn test_stale_writer_gets_version_conflict() {
        let repo = MemoryBracketRepository::new();
        let seeded = ["a", "b", "c", "d"].into_iter().map(player).collect();
        let bracket = build_from_seed_order(23, seeded).unwrap();
        repo.insert_bracket(&bracket).await.unwrap();

        // Two writers load the same version
        let mut first = repo.get_bracket(bracket.id).await.unwrap().unwrap();
        let mut second = first.clone();

        record_result(&mut first, "r1m1", 1, 0).unwrap();
        first.version = 1;
        repo.update_bracket(&first, 0, None).await.unwrap();

        record_result(&mut second, "r1m2", 1, 0).unwrap();
        second.version = 1;
        let err = repo.update_bracket(&second, 0, None).await.unwrap_err();
        assert!(matches!(err, BracketError::VersionConflict { expected: 0, .. }));

        let stored = repo.get_bracket(bracket.id).await.unwrap().unwrap();
        assert_eq!(stored, first);
    }
}
