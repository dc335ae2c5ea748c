//! Property-based tests for the Life kernel and cell placement.
//!
//! Run with: cargo test --release prop_game

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::sync::OnceLock;

use proptest::prelude::*;

use cholerama::bot::{Gateway, Placement};
use cholerama::game::{
    Board, EMPTY, Kernel, NEIGHBOR_OFFSETS, Patch, Pattern, Player, PlayerId, TokenLedger, histogram,
};

const OWNERS: PlayerId = 4;

fn pool() -> &'static Kernel {
    static POOL: OnceLock<Kernel> = OnceLock::new();
    POOL.get_or_init(|| Kernel::new(4).unwrap())
}

fn board_strategy() -> impl Strategy<Value = Board> {
    (3usize..24, 3usize..24).prop_flat_map(|(nx, ny)| {
        prop::collection::vec(prop_oneof![3 => Just(EMPTY), 1 => 1..=OWNERS], nx * ny)
            .prop_map(move |cells| Board::from_cells(nx, ny, cells).unwrap())
    })
}

fn live_neighbors(board: &Board, x: i64, y: i64) -> Vec<PlayerId> {
    NEIGHBOR_OFFSETS
        .iter()
        .map(|&(dx, dy)| board.get(x + dx, y + dy))
        .filter(|&n| n != EMPTY)
        .collect()
}

fn player(number: PlayerId, balance: u32) -> Player {
    Player::new(
        number,
        format!("p{number}"),
        "#000000".to_string(),
        Pattern::default(),
        Patch::new(0, 0, 8, 8),
        TokenLedger::with_pattern(balance, 0).unwrap(),
        0,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The pooled kernel produces exactly the sequential result.
    #[test]
    fn prop_parallel_matches_sequential(old in board_strategy()) {
        let mut seq = old.clone();
        let mut par = old.clone();
        let mut seq_counts = vec![0; usize::from(OWNERS) + 1];
        let mut par_counts = seq_counts.clone();

        Kernel::sequential().evolve(&old, &mut seq, &mut seq_counts);
        pool().evolve(&old, &mut par, &mut par_counts);

        prop_assert_eq!(&seq, &par);
        prop_assert_eq!(seq_counts, par_counts);
    }

    /// Every cell follows the rule: survivors keep their owner and newborns
    /// take an owner from their neighbourhood.
    #[test]
    #[allow(clippy::cast_possible_wrap)]
    fn prop_owners_come_from_neighbourhood(old in board_strategy()) {
        let mut new = old.clone();
        let mut counts = vec![0; usize::from(OWNERS) + 1];
        Kernel::sequential().evolve(&old, &mut new, &mut counts);

        for y in 0..old.height() as i64 {
            for x in 0..old.width() as i64 {
                let before = old.get(x, y);
                let after = new.get(x, y);
                let neighbors = live_neighbors(&old, x, y);

                if before != EMPTY {
                    let survives = neighbors.len() == 2 || neighbors.len() == 3;
                    prop_assert_eq!(after, if survives { before } else { EMPTY });
                } else if neighbors.len() == 3 {
                    prop_assert!(neighbors.contains(&after));
                    // A strict majority always wins the birth
                    for &owner in &neighbors {
                        if neighbors.iter().filter(|&&n| n == owner).count() >= 2 {
                            prop_assert_eq!(after, owner);
                        }
                    }
                } else {
                    prop_assert_eq!(after, EMPTY);
                }
            }
        }
    }

    /// The histogram returned by the kernel matches the board.
    #[test]
    fn prop_counts_match_board(old in board_strategy()) {
        let mut new = old.clone();
        let mut counts = vec![0; usize::from(OWNERS) + 1];
        Kernel::sequential().evolve(&old, &mut new, &mut counts);

        let total: u32 = counts.iter().sum();
        prop_assert_eq!(total as usize, new.width() * new.height());
        for owner in 1..=OWNERS {
            prop_assert_eq!(counts[usize::from(owner)] as usize, new.count(owner));
        }

        let mut again = vec![0; counts.len()];
        histogram(&new, &mut again);
        prop_assert_eq!(counts, again);
    }

    /// A placement is either applied in full and charged per distinct cell,
    /// or leaves both the board and the balance untouched. Requests longer
    /// than the balance never go through, duplicates included.
    #[test]
    fn prop_placement_all_or_nothing(
        old in board_strategy(),
        balance in 0u32..40,
        cells in prop::collection::vec((-50i64..50, -50i64..50), 0..30),
        confine in any::<bool>(),
    ) {
        let gateway = Gateway::new(false, confine);
        let mut board = old.clone();
        let mut p = player(1, balance);
        let placement = Placement::from_cells(cells);

        match gateway.apply(&mut board, &mut p, &placement) {
            Ok(placed) => {
                prop_assert!(placement.len() <= balance as usize);
                prop_assert_eq!(p.ledger.balance(), balance - placed);
                let targets = gateway.resolve(&placement, &p.patch, old.width(), old.height()).unwrap();
                prop_assert_eq!(targets.len(), placed as usize);
                prop_assert_eq!(board.count(1), old.count(1) + targets.len());
                for (x, y) in targets {
                    prop_assert_eq!(old.cells()[y * old.width() + x], EMPTY);
                    prop_assert_eq!(board.cells()[y * old.width() + x], 1);
                }
            }
            Err(_) => {
                prop_assert_eq!(p.ledger.balance(), balance);
                prop_assert_eq!(&board, &old);
            }
        }
    }
}
