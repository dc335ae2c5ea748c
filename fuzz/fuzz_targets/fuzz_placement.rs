#![no_main]

use arbitrary::Arbitrary;
use cholerama::bot::{Gateway, Placement};
use cholerama::game::{Board, EMPTY, Patch, Pattern, Player, TokenLedger};
use libfuzzer_sys::fuzz_target;

/// Structured input for placement fuzzing.
#[derive(Arbitrary, Debug)]
struct PlacementInput {
    /// Board columns (capped).
    nx: u8,
    /// Board rows (capped).
    ny: u8,
    /// Pre-existing live cells as `(x, y, owner)`.
    occupied: Vec<(u8, u8, u8)>,
    /// Requested x coordinates; may be longer or shorter than `ys`.
    xs: Vec<i64>,
    /// Requested y coordinates.
    ys: Vec<i64>,
    /// Balance before the request.
    balance: u16,
    /// Interpret coordinates inside the player's patch.
    confine: bool,
}

fuzz_target!(|input: PlacementInput| {
    let nx = usize::from(input.nx % 64) + 1;
    let ny = usize::from(input.ny % 64) + 1;
    let Some(mut board) = Board::new(nx, ny) else {
        return;
    };
    for &(x, y, owner) in input.occupied.iter().take(256) {
        board.set(i64::from(x), i64::from(y), owner % 5);
    }
    let before = board.clone();

    let Ok(ledger) = TokenLedger::with_pattern(u32::from(input.balance), 0) else {
        return;
    };
    let patch = Patch::new(0, 0, nx.div_ceil(2), ny.div_ceil(2));
    let mut player = Player::new(1, "fuzz".to_string(), "#000000".to_string(), Pattern::default(), patch, ledger, 0);

    let gateway = Gateway::new(false, input.confine);
    let placement = Placement {
        x: input.xs.into_iter().take(512).collect(),
        y: input.ys.into_iter().take(512).collect(),
    };

    match gateway.apply(&mut board, &mut player, &placement) {
        Ok(placed) => {
            assert!(placement.len() <= usize::from(input.balance));
            assert_eq!(player.ledger.balance() + placed, u32::from(input.balance));
            let targets = gateway
                .resolve(&placement, &player.patch, nx, ny)
                .expect("applied placement must resolve");
            assert_eq!(targets.len() as u32, placed);
            for (x, y) in targets {
                assert_eq!(before.cells()[y * nx + x], EMPTY);
                assert_eq!(board.cells()[y * nx + x], 1);
                if input.confine {
                    assert!(player.patch.contains(x, y));
                }
            }
            let changed = before
                .cells()
                .iter()
                .zip(board.cells())
                .filter(|(a, b)| a != b)
                .count();
            assert_eq!(changed as u32, placed);
        }
        Err(_) => {
            assert_eq!(player.ledger.balance(), u32::from(input.balance));
            assert_eq!(board, before);
        }
    }
});
