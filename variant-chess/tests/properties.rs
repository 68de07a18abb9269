use cozy_chess::{Color, Piece};
use proptest::prelude::*;
use variant_chess::chess960::{back_rank, generate, position_for, CHESS960_COUNT};
use variant_chess::*;

fn non_king_material(position: &Position, holdings: &HoldingsState) -> usize {
    let on_board: usize = Color::ALL
        .iter()
        .flat_map(|color| {
            [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
                .map(|piece| position.count(*color, piece))
        })
        .sum();
    on_board + (holdings.white.total() + holdings.black.total()) as usize
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn chess960_is_deterministic(idn in 0..CHESS960_COUNT) {
        let first = generate(Some(idn));
        prop_assert_eq!(&first, &position_for(idn));
        prop_assert!(first.is_well_formed());

        let rank = back_rank(idn);
        let king = rank.iter().position(|p| *p == Piece::King).unwrap();
        let rooks: Vec<usize> = rank.iter().enumerate().filter(|(_, p)| **p == Piece::Rook).map(|(i, _)| i).collect();
        prop_assert_eq!(rooks.len(), 2);
        prop_assert!(rooks[0] < king && king < rooks[1]);

        let bishops: Vec<usize> = rank.iter().enumerate().filter(|(_, p)| **p == Piece::Bishop).map(|(i, _)| i).collect();
        prop_assert_eq!(bishops.len(), 2);
        prop_assert_ne!(bishops[0] % 2, bishops[1] % 2);
    }

    #[test]
    fn crazyhouse_conserves_material(choices in prop::collection::vec((any::<bool>(), 0usize..64, 0usize..256), 1..60)) {
        let engine = MoveEngine::new();
        let setup = GameSetup::standard(VariantCategory::Crazyhouse);
        let mut position = Position::standard();
        let mut holdings = HoldingsState::default();

        for (try_drop, square, pick) in choices {
            let mover = position.side_to_move;
            let mut result = None;

            if try_drop {
                let held = *holdings.of(mover);
                let piece = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight, Piece::Pawn]
                    .into_iter()
                    .find(|p| held.get(*p) > 0);
                if let Some(piece) = piece {
                    let candidate = CandidateMove::Drop { piece, to: cozy_chess::Square::index(square) };
                    result = engine.resolve_move(&position, &candidate, &setup, Some(&holdings), false).ok();
                }
            }

            if result.is_none() {
                let legal = engine.rules().legal_moves(&position).unwrap();
                if legal.is_empty() {
                    break;
                }
                let mv = legal[pick % legal.len()];
                let candidate = CandidateMove::coordinate(mv.from, mv.to, mv.promotion);
                result = Some(engine.resolve_move(&position, &candidate, &setup, Some(&holdings), false).unwrap());
            }

            let Some(result) = result else { break };
            position = result.position;
            holdings = result.holdings.unwrap();
            prop_assert_eq!(non_king_material(&position, &holdings), 30);
            prop_assert_eq!(position.halfmove_clock, 0);
            prop_assert!(position.is_well_formed());
        }
    }
}
