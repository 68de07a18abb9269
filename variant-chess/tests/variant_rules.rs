use cozy_chess::{Color, Move, Piece};
use variant_chess::rules::Applied;
use variant_chess::*;

fn position(fen: &str) -> Position {
    Position::from_fen(fen).unwrap()
}

fn play(setup: &GameSetup, fen: &str, mv: &str) -> Result<MoveResult, MoveError> {
    MoveEngine::new().resolve_move(&position(fen), &parse_move(mv).unwrap(), setup, None, false)
}

mod fischer_random_castling {
    use super::*;

    const START: &str = "rnbkqbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBKQBNR w KQkq - 0 1";
    const READY: &str = "r2k3r/pppppppp/8/8/8/8/PPPPPPPP/R2K3R w KQkq - 0 1";

    fn setup() -> GameSetup {
        GameSetup::new(position(START), VariantCategory::Wild(Wild::FischerRandom))
    }

    #[test]
    fn short_castle_lands_on_g_and_f() {
        let result = play(&setup(), READY, "O-O").unwrap();
        assert_eq!(
            result.position.to_fen(),
            "r2k3r/pppppppp/8/8/8/8/PPPPPPPP/R4RK1 b kq - 1 1"
        );
        assert_eq!(result.mv.san, "O-O");
        assert_eq!(result.mv.kind, MoveKind::Castle(CastleSide::Short));
    }

    #[test]
    fn long_castle_lands_on_c_and_d() {
        let result = play(&setup(), READY, "O-O-O").unwrap();
        assert_eq!(
            result.position.to_fen(),
            "r2k3r/pppppppp/8/8/8/8/PPPPPPPP/2KR3R b kq - 1 1"
        );
        assert_eq!(result.mv.san, "O-O-O");
    }

    #[test]
    fn king_onto_rook_is_castling() {
        let by_rook = play(&setup(), READY, "d1h1").unwrap();
        let by_san = play(&setup(), READY, "O-O").unwrap();
        assert_eq!(by_rook.position, by_san.position);
    }

    #[test]
    fn ordinary_king_step_is_not_castling() {
        let result = play(&setup(), READY, "d1e1").unwrap();
        assert_eq!(result.mv.kind, MoveKind::Normal);
        assert_eq!(result.position.castling.to_string(), "kq");
    }

    #[test]
    fn rook_move_costs_only_its_side() {
        let result = play(&setup(), READY, "h1g1").unwrap();
        assert_eq!(result.position.castling.to_string(), "Qkq");
    }
}

mod wild_zero {
    use super::*;

    const START: &str = "rnbkqbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn black_short_castle_goes_toward_a_file() {
        let setup = GameSetup::new(position(START), VariantCategory::Wild(Wild::Zero));
        let fen = "r2k3r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R b KQkq - 0 1";
        let result = play(&setup, fen, "O-O").unwrap();
        assert_eq!(
            result.position.to_fen(),
            "1kr4r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQ - 1 2"
        );
        let by_coordinate = play(&setup, fen, "d8b8").unwrap();
        assert_eq!(by_coordinate.position, result.position);
    }

    #[test]
    fn white_castles_classically() {
        let setup = GameSetup::new(position(START), VariantCategory::Wild(Wild::Zero));
        let result = play(&setup, "r2k3r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1", "e1g1").unwrap();
        assert_eq!(result.position.placement(), "r2k3r/pppppppp/8/8/8/8/PPPPPPPP/R4RK1");
        assert_eq!(result.position.castling.to_string(), "kq");
    }
}

mod crazyhouse {
    use super::*;

    const BACK_RANK: &str = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";

    fn resolve_with(category: VariantCategory, fen: &str, mv: &str, holdings: Option<&HoldingsState>) -> MoveResult {
        MoveEngine::new()
            .resolve_move(&position(fen), &parse_move(mv).unwrap(), &GameSetup::standard(category), holdings, false)
            .unwrap()
    }

    #[test]
    fn blockable_mate_is_only_check() {
        let result = resolve_with(VariantCategory::Crazyhouse, BACK_RANK, "Ra8", None);
        assert_eq!(result.mv.san, "Ra8+");

        let armed = HoldingsState {
            black: Holdings::from_letters("n"),
            ..HoldingsState::default()
        };
        let result = resolve_with(VariantCategory::Crazyhouse, BACK_RANK, "Ra8", Some(&armed));
        assert_eq!(result.mv.san, "Ra8+");
    }

    #[test]
    fn mate_stands_with_nothing_to_drop() {
        let empty = HoldingsState::default();
        let result = resolve_with(VariantCategory::Crazyhouse, BACK_RANK, "Ra8", Some(&empty));
        assert_eq!(result.mv.san, "Ra8#");
    }

    #[test]
    fn bughouse_keeps_mate() {
        let result = resolve_with(VariantCategory::Bughouse, BACK_RANK, "Ra8", None);
        assert_eq!(result.mv.san, "Ra8#");
    }

    #[test]
    fn clock_is_always_zero() {
        let result = resolve_with(VariantCategory::Crazyhouse, "4k3/8/8/8/8/8/8/R3K3 w - - 0 1", "Ra5", None);
        assert_eq!(result.position.halfmove_clock, 0);
    }

    #[test]
    fn capture_goes_to_hand() {
        let held = HoldingsState::default();
        let result = resolve_with(
            VariantCategory::Crazyhouse,
            "4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1",
            "exd5",
            Some(&held),
        );
        assert_eq!(result.holdings.unwrap().white.pawns, 1);
        assert_eq!(result.partner_gain, None);
    }

    #[test]
    fn drop_from_hand() {
        let held = HoldingsState {
            white: Holdings::from_letters("N"),
            ..HoldingsState::default()
        };
        let result = resolve_with(VariantCategory::Crazyhouse, "4k3/8/8/8/8/8/8/4K3 w - - 3 9", "N@d6", Some(&held));
        assert_eq!(result.mv.san, "N@d6+");
        assert_eq!(result.mv.from, None);
        assert_eq!(result.mv.kind, MoveKind::Drop);
        assert_eq!(result.position.to_fen(), "4k3/8/3N4/8/8/8/8/4K3 b - - 0 9");
        assert!(result.holdings.unwrap().white.is_empty());
    }

    #[test]
    fn promotion_is_remembered() {
        let held = HoldingsState::default();
        let result = resolve_with(VariantCategory::Crazyhouse, "8/4P3/8/8/8/8/k7/4K3 w - - 0 1", "e8", Some(&held));
        assert_eq!(result.mv.promotion, Some(Piece::Queen));
        assert_eq!(result.mv.san, "e8=Q");
        assert!(result.holdings.unwrap().promoted.contains("e8".parse().unwrap()));
    }

    #[test]
    fn normal_move_after_extra_knight() {
        // White has dropped a third knight on c3.
        let fen = "r1bqkbnr/pppppppp/8/8/8/2N5/PPPPPPPP/RNBQKBNR b KQkq - 0 3";
        let held = HoldingsState::default();
        let result = resolve_with(VariantCategory::Crazyhouse, fen, "e7e5", Some(&held));
        assert_eq!(result.mv.san, "e5");
        assert_eq!(
            result.position.to_fen(),
            "r1bqkbnr/pppp1ppp/8/4p3/8/2N5/PPPPPPPP/RNBQKBNR w KQkq e6 0 4"
        );

        let destinations = MoveEngine::new()
            .legal_destinations(&position(fen), &GameSetup::standard(VariantCategory::Crazyhouse))
            .unwrap();
        assert!(!destinations.is_empty());
    }

    #[test]
    fn mate_found_with_extra_material() {
        let empty = HoldingsState::default();
        let result = resolve_with(
            VariantCategory::Crazyhouse,
            "6k1/5ppp/8/8/8/NNN5/PPPPPPPP/R5K1 w - - 0 1",
            "Ra8",
            Some(&empty),
        );
        assert_eq!(result.mv.san, "Ra8#");
    }

    #[test]
    fn bughouse_capture_goes_to_partner() {
        let held = HoldingsState::default();
        let result = resolve_with(
            VariantCategory::Bughouse,
            "4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1",
            "exd5",
            Some(&held),
        );
        assert_eq!(result.partner_gain, Some((Piece::Pawn, Color::Black)));
        assert!(result.holdings.unwrap().white.is_empty());
    }
}

mod premoves {
    use super::*;

    #[test]
    fn premove_is_made_by_the_waiting_side() {
        let setup = GameSetup::standard(VariantCategory::Blitz);
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let result = MoveEngine::new()
            .resolve_move(&position(fen), &parse_move("f1c4").unwrap(), &setup, None, true)
            .unwrap();
        assert_eq!(result.mv.color, Color::White);
        assert_eq!(result.position.side_to_move, Color::Black);
        assert_eq!(result.mv.san, "Bc4");
    }

    #[test]
    fn premove_castling_ignores_attacks() {
        let setup = GameSetup::standard(VariantCategory::Blitz);
        // The black rook on f8 covers f1, so castling now would be illegal.
        let fen = "4kr2/8/8/8/8/8/8/4K2R b K - 0 1";
        let result = MoveEngine::new()
            .resolve_move(&position(fen), &parse_move("O-O").unwrap(), &setup, None, true)
            .unwrap();
        assert_eq!(result.position.placement(), "4kr2/8/8/8/8/8/8/5RK1");
        assert_eq!(result.position.side_to_move, Color::Black);
    }

    #[test]
    fn premove_geometry_is_still_checked() {
        let setup = GameSetup::standard(VariantCategory::Blitz);
        let err = MoveEngine::new()
            .resolve_move(&Position::standard(), &parse_move("g1f3").unwrap(), &setup, None, true)
            .unwrap_err();
        assert_eq!(err, MoveError::Illegal(IllegalMove::WrongColor));
        let err = MoveEngine::new()
            .resolve_move(
                &position("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1"),
                &parse_move("b1b3").unwrap(),
                &setup,
                None,
                true,
            )
            .unwrap_err();
        assert_eq!(err, MoveError::Illegal(IllegalMove::Unreachable));
    }

    #[test]
    fn premove_leaves_holdings_alone() {
        let setup = GameSetup::standard(VariantCategory::Crazyhouse);
        let held = HoldingsState {
            white: Holdings::from_letters("N"),
            ..HoldingsState::default()
        };
        let fen = "4k3/8/8/3p4/4P3/8/8/4K3 b - - 0 1";
        for mv in ["e4d5", "N@f3"] {
            let result = MoveEngine::new()
                .resolve_move(&position(fen), &parse_move(mv).unwrap(), &setup, Some(&held), true)
                .unwrap();
            assert_eq!(result.holdings, Some(held), "{mv}");
            assert_eq!(result.partner_gain, None);
        }
    }
}

mod desync {
    use super::*;

    /// Rules that accept a move but never change the board.
    struct Frozen;

    impl StandardRules for Frozen {
        fn legal_moves(&self, position: &Position) -> Result<Vec<Move>, RulesError> {
            CozyRules.legal_moves(position)
        }

        fn play(&self, position: &Position, mv: Move) -> Result<Option<(Position, Applied)>, RulesError> {
            let (piece, color) = position.piece_at(mv.from).unwrap();
            Ok(Some((
                position.clone(),
                Applied {
                    piece,
                    color,
                    from: mv.from,
                    to: mv.to,
                    promotion: None,
                    captured: None,
                    captured_on: None,
                    kind: MoveKind::Normal,
                },
            )))
        }
    }

    #[test]
    fn unchanged_placement_is_reported() {
        let engine = MoveEngine::with_rules(Frozen);
        let err = engine
            .resolve_move(
                &Position::standard(),
                &parse_move("e4").unwrap(),
                &GameSetup::standard(VariantCategory::Blitz),
                None,
                false,
            )
            .unwrap_err();
        assert!(err.is_desync());
    }
}

mod round_trip {
    use super::*;

    #[test]
    fn every_result_is_well_formed() {
        let setup = GameSetup::standard(VariantCategory::Standard);
        let engine = MoveEngine::new();
        let mut current = Position::standard();
        for mv in ["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "O-O", "Nf6", "Re1", "b5", "Bb3", "d6"] {
            let result = engine
                .resolve_move(&current, &parse_move(mv).unwrap(), &setup, None, false)
                .unwrap();
            assert!(result.position.is_well_formed());
            assert_eq!(Position::from_fen(&result.position.to_fen()).unwrap(), result.position);
            current = result.position;
        }
        assert_eq!(
            current.to_fen(),
            "r1bqkb1r/2p2ppp/p1np1n2/1p2p3/4P3/1B3N2/PPPP1PPP/RNBQR1K1 w kq - 0 7"
        );
    }
}
