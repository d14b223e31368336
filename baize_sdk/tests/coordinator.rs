//! End-to-end scenarios through the coordinator against the in-memory
//! store: the four-player and three-player communities, the odd first
//! round, tie handling, promotion into a county, and idempotent retries.

use baize_lib::{levels::Level, matches::Match, players::Player, tournament::TournamentConfig};
use baize_sdk::{api::InitializeTournamentRequest, Coordinator, TournamentStore};
use baize_tests::{spoof_config, spoof_player, spoof_pool, MemoryStore};

fn init_request(tournament_id: &str) -> InitializeTournamentRequest {
    InitializeTournamentRequest {
        tournament_id: tournament_id.to_string(),
        special: false,
        level: None,
        scheduling_preference: None,
    }
}

fn seeded(players: Vec<Player>) -> Coordinator<MemoryStore> {
    let store = MemoryStore::new();
    store.seed_tournament(spoof_config("T1", &players));
    store.seed_players(players);
    Coordinator::new(store)
}

async fn initialized(players: Vec<Player>) -> Coordinator<MemoryStore> {
    let coordinator = seeded(players);
    let resp = coordinator
        .initialize_tournament(&init_request("T1"))
        .await
        .unwrap();
    assert!(resp.success, "init failed: {:?}", resp.error);
    coordinator
}

fn winner_and_loser(m: &Match) -> (String, String) {
    (m.player1_id.clone(), m.player2_id.clone().unwrap())
}

#[tokio::test]
async fn four_player_community_walks_the_five_match_scheme() {
    let coordinator = initialized(spoof_pool("p", 4, "C1")).await;
    let store = coordinator.store();

    let sf1 = store.get_match("T1", "Community_SF_COMM_C1_SF1").unwrap();
    let sf2 = store.get_match("T1", "Community_SF_COMM_C1_SF2").unwrap();

    // semi-finals: player1 of SF1 and player2 of SF2 win
    store.set_result("T1", &sf1.id, 3, 0);
    store.set_result("T1", &sf2.id, 0, 3);
    let (sf1_winner, sf1_loser) = winner_and_loser(&sf1);
    let (sf2_loser, sf2_winner) = winner_and_loser(&sf2);

    let resp = coordinator
        .next_round("T1", Level::Community, "C1")
        .await
        .unwrap();
    assert!(resp.success);
    let matches = resp.matches.unwrap();
    assert_eq!(matches.len(), 2);
    let wf = matches
        .iter()
        .find(|m| m.id == "Community_WF_COMM_C1_WINNERS_FINAL")
        .unwrap();
    let lf = matches
        .iter()
        .find(|m| m.id == "Community_LF_COMM_C1_LOSERS_FINAL")
        .unwrap();
    assert_eq!(wf.player1_id, sf1_winner);
    assert_eq!(wf.player2_id.as_deref(), Some(sf2_winner.as_str()));
    assert_eq!(lf.player1_id, sf1_loser);
    assert_eq!(lf.player2_id.as_deref(), Some(sf2_loser.as_str()));

    store.set_result("T1", &wf.id, 3, 0);
    store.set_result("T1", &lf.id, 3, 0);

    let resp = coordinator
        .next_round("T1", Level::Community, "C1")
        .await
        .unwrap();
    let matches = resp.matches.unwrap();
    assert_eq!(matches.len(), 1);
    let final_match = &matches[0];
    assert_eq!(final_match.id, "Community_F_COMM_C1_FINAL");
    // winners-final loser against losers-final winner
    assert_eq!(final_match.player1_id, sf2_winner);
    assert_eq!(final_match.player2_id.as_deref(), Some(sf1_loser.as_str()));

    store.set_result("T1", &final_match.id, 3, 0);
    let resp = coordinator
        .finalize_entity("T1", Level::Community, "C1")
        .await
        .unwrap();
    assert!(resp.success);
    let positions = resp.positions.unwrap();
    assert_eq!(positions["1"].id, sf1_winner);
    assert_eq!(positions["2"].id, sf2_winner);
    assert_eq!(positions["3"].id, sf1_loser);
    // the losers-final loser is eliminated without a position
    assert!(positions.values().all(|p| p.id != sf2_loser));
    assert_eq!(store.match_count("T1"), 5);
}

#[tokio::test]
async fn three_player_community_plays_two_matches() {
    let coordinator = initialized(spoof_pool("q", 3, "C2")).await;
    let store = coordinator.store();

    let initial = store
        .get_match("T1", "Community_Final_COMM_C2_INITIAL")
        .unwrap();
    let waiting = initial.waiting_player_id.clone().unwrap();
    store.set_result("T1", &initial.id, 3, 0);

    let resp = coordinator
        .next_round("T1", Level::Community, "C2")
        .await
        .unwrap();
    let matches = resp.matches.unwrap();
    assert_eq!(matches.len(), 1);
    let pos23 = &matches[0];
    assert_eq!(pos23.id, "Community_Final_COMM_C2_POS23_FINAL");
    assert_eq!(pos23.player1_id, initial.player2_id.clone().unwrap());
    assert_eq!(pos23.player2_id.as_deref(), Some(waiting.as_str()));

    store.set_result("T1", &pos23.id, 3, 0);
    let resp = coordinator
        .finalize_entity("T1", Level::Community, "C2")
        .await
        .unwrap();
    let positions = resp.positions.unwrap();
    assert_eq!(positions["1"].id, initial.player1_id);
    assert_eq!(positions["2"].id, pos23.player1_id);
    assert_eq!(positions["3"].id, waiting);
    assert_eq!(store.match_count("T1"), 2);
}

#[tokio::test]
async fn five_player_first_round_has_the_double_duty_extra() {
    let coordinator = seeded(spoof_pool("a", 5, "C3"));
    let resp = coordinator
        .initialize_tournament(&init_request("T1"))
        .await
        .unwrap();
    assert!(resp.success);
    let matches = resp.matches.unwrap();
    assert_eq!(matches.len(), 3);
    let extras: Vec<_> = matches.iter().filter(|m| m.special_match).collect();
    assert_eq!(extras.len(), 1);
    // the odd player's opponent plays twice
    let extra = extras[0];
    let opponent = extra.player2_id.clone().unwrap();
    let appearances = matches
        .iter()
        .filter(|m| {
            m.player1_id == opponent || m.player2_id.as_deref() == Some(opponent.as_str())
        })
        .count();
    assert_eq!(appearances, 2);
}

#[tokio::test]
async fn tied_final_refuses_to_finalize() {
    let coordinator = initialized(spoof_pool("p", 4, "C1")).await;
    let store = coordinator.store();
    store.set_result("T1", "Community_SF_COMM_C1_SF1", 3, 0);
    store.set_result("T1", "Community_SF_COMM_C1_SF2", 0, 3);
    coordinator
        .next_round("T1", Level::Community, "C1")
        .await
        .unwrap();
    store.set_result("T1", "Community_WF_COMM_C1_WINNERS_FINAL", 3, 0);
    store.set_result("T1", "Community_LF_COMM_C1_LOSERS_FINAL", 3, 0);
    coordinator
        .next_round("T1", Level::Community, "C1")
        .await
        .unwrap();

    // equal points on the decisive final
    store.set_result("T1", "Community_F_COMM_C1_FINAL", 2, 2);
    let resp = coordinator
        .finalize_entity("T1", Level::Community, "C1")
        .await
        .unwrap();
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("TieUndecidable"));

    // nothing was written
    let resp = coordinator
        .entity_positions("T1", Level::Community, "C1")
        .await
        .unwrap();
    assert!(!resp.success);
}

#[tokio::test]
async fn next_round_is_idempotent_under_retry() {
    let coordinator = initialized(spoof_pool("p", 4, "C1")).await;
    let store = coordinator.store();
    store.set_result("T1", "Community_SF_COMM_C1_SF1", 3, 0);
    store.set_result("T1", "Community_SF_COMM_C1_SF2", 0, 3);

    let first = coordinator
        .next_round("T1", Level::Community, "C1")
        .await
        .unwrap();
    let count_after_first = store.match_count("T1");
    let second = coordinator
        .next_round("T1", Level::Community, "C1")
        .await
        .unwrap();

    assert!(first.success && second.success);
    let ids =
        |resp: &baize_sdk::api::RoundResponse| -> Vec<String> {
            resp.matches
                .as_ref()
                .unwrap()
                .iter()
                .map(|m| m.id.clone())
                .collect()
        };
    assert_eq!(ids(&first), ids(&second));
    // no new documents on the retry
    assert_eq!(store.match_count("T1"), count_after_first);
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let coordinator = seeded(spoof_pool("p", 9, "C1"));
    let first = coordinator
        .initialize_tournament(&init_request("T1"))
        .await
        .unwrap();
    let count = coordinator.store().match_count("T1");
    let second = coordinator
        .initialize_tournament(&init_request("T1"))
        .await
        .unwrap();
    assert!(first.success && second.success);
    assert_eq!(coordinator.store().match_count("T1"), count);
    let ids = |resp: &baize_sdk::api::InitializeResponse| -> Vec<String> {
        resp.matches
            .as_ref()
            .unwrap()
            .iter()
            .map(|m| m.id.clone())
            .collect()
    };
    assert_eq!(ids(&first), ids(&second));
}

#[tokio::test]
async fn finalize_is_idempotent() {
    let coordinator = initialized(spoof_pool("p", 2, "C1")).await;
    let store = coordinator.store();
    store.set_result("T1", "Community_Final_COMM_C1_TWO_PLAYER_FINAL", 3, 1);

    let first = coordinator
        .finalize_entity("T1", Level::Community, "C1")
        .await
        .unwrap();
    let second = coordinator
        .finalize_entity("T1", Level::Community, "C1")
        .await
        .unwrap();
    assert!(first.success && second.success);
    assert_eq!(first.positions, second.positions);
    assert_eq!(second.already_finalized, Some(true));
}

#[tokio::test]
async fn terminal_next_round_reports_completion() {
    let coordinator = initialized(vec![spoof_player("solo", "C1")]).await;
    let resp = coordinator
        .next_round("T1", Level::Community, "C1")
        .await
        .unwrap();
    assert!(resp.success);
    assert_eq!(resp.action.as_deref(), Some("tournament_complete"));
    assert_eq!(resp.positions.unwrap()["1"].id, "solo");
}

#[tokio::test]
async fn incomplete_round_blocks_with_the_open_match_ids() {
    let coordinator = initialized(spoof_pool("p", 4, "C1")).await;
    coordinator
        .store()
        .set_result("T1", "Community_SF_COMM_C1_SF1", 3, 0);

    let resp = coordinator
        .next_round("T1", Level::Community, "C1")
        .await
        .unwrap();
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("PreviousRoundIncomplete"));
    assert_eq!(
        resp.incomplete_matches.unwrap(),
        vec!["Community_SF_COMM_C1_SF2".to_string()]
    );
    assert_eq!((resp.completed_count, resp.total_count), (Some(1), Some(2)));
}

#[tokio::test]
async fn community_finishers_promote_into_the_county() {
    // two three-player communities inside one county
    let mut players = Vec::new();
    for (community, prefix) in [("C1", "a"), ("C2", "b")] {
        for i in 1..=3 {
            let mut p = spoof_player(&format!("{prefix}{i}"), community);
            p.county_id = Some("K1".into());
            players.push(p);
        }
    }
    let coordinator = initialized(players).await;
    let store = coordinator.store();

    for community in ["C1", "C2"] {
        let initial_id = format!("Community_Final_COMM_{community}_INITIAL");
        store.set_result("T1", &initial_id, 3, 0);
        let resp = coordinator
            .next_round("T1", Level::Community, community)
            .await
            .unwrap();
        let pos23 = &resp.matches.unwrap()[0];
        store.set_result("T1", &pos23.id, 3, 0);
        let resp = coordinator
            .finalize_entity("T1", Level::Community, community)
            .await
            .unwrap();
        assert!(resp.success);
    }

    let resp = coordinator
        .initialize_level("T1", Level::County, None)
        .await
        .unwrap();
    assert!(resp.success, "county init failed: {:?}", resp.error);
    assert_eq!(resp.entities.unwrap(), vec!["K1".to_string()]);
    let matches = resp.matches.unwrap();
    // six promoted players pair into three county matches
    assert_eq!(matches.len(), 3);
    assert!(matches.iter().all(|m| m.round_number == "R1"));
    assert!(matches.iter().all(|m| m.county_id.as_deref() == Some("K1")));

    // the first pairing is position-1 against position-1
    let store_bracket = store.get_bracket("T1").await.unwrap().unwrap();
    let c1 = store_bracket.positions_for(Level::Community, "C1").unwrap();
    let c2 = store_bracket.positions_for(Level::Community, "C2").unwrap();
    assert_eq!(matches[0].player1_id, c1["1"].id);
    assert_eq!(matches[0].player2_id.as_deref(), Some(c2["1"].id.as_str()));
    // and the last pairs the position-3 finishers
    assert_eq!(matches[2].player1_id, c1["3"].id);
    assert_eq!(matches[2].player2_id.as_deref(), Some(c2["3"].id.as_str()));
}

#[tokio::test]
async fn county_init_refuses_while_a_community_is_open() {
    let coordinator = initialized(spoof_pool("p", 3, "C1")).await;
    let resp = coordinator
        .initialize_level("T1", Level::County, None)
        .await
        .unwrap();
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("PreviousRoundIncomplete"));
}

#[tokio::test]
async fn special_tournaments_mix_every_community() {
    let mut players = spoof_pool("x", 3, "C1");
    players.extend(spoof_pool("y", 2, "C2"));
    let store = MemoryStore::new();
    let mut config: TournamentConfig = spoof_config("TS", &players);
    config.special = true;
    store.seed_tournament(config);
    store.seed_players(players);
    let coordinator = Coordinator::new(store);

    let mut req = init_request("TS");
    req.special = true;
    let resp = coordinator.initialize_tournament(&req).await.unwrap();
    assert!(resp.success);
    assert_eq!(resp.level, Some(Level::Special));
    assert_eq!(resp.entities.unwrap(), vec!["special".to_string()]);
    let matches = resp.matches.unwrap();
    // five mixed players: two pairs and the double-duty extra
    assert_eq!(matches.len(), 3);
    assert!(matches.iter().all(|m| m.id.contains("_SPCL_special_")));
    assert!(matches.iter().all(|m| m.community_id.is_none()));
}
