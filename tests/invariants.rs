//! Property-based invariant tests over the full pipeline.
//!
//! For any input bytes — hostile, truncated, or well-formed — the screen
//! must uphold its structural invariants:
//!
//! 1. The cursor stays inside the page.
//! 2. Every wide cell is followed by a continuation cell.
//! 3. Scrollback plus page never exceeds max_history + rows.
//! 4. No input causes a panic.
//! 5. Chunking never changes the outcome.

use dango_terminal::{Terminal, TerminalConfig, VoidListener};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

fn terminal(cols: usize, rows: usize, max_history: usize) -> Terminal<VoidListener> {
    let config = TerminalConfig {
        cols,
        rows,
        max_history,
        ..TerminalConfig::default()
    };
    Terminal::new(config, VoidListener)
}

fn check_invariants(
    term: &Terminal<VoidListener>,
    max_history: usize,
) -> Result<(), TestCaseError> {
    let screen = term.screen();
    // DECCOLM may have legitimately changed the page size mid-stream
    let (cols, rows) = (screen.cols(), screen.rows());
    let cursor = screen.cursor();
    prop_assert!(cursor.line < rows, "cursor line {} out of page", cursor.line);
    prop_assert!(cursor.col < cols, "cursor col {} out of page", cursor.col);

    let grid = screen.grid();
    prop_assert!(
        grid.total_lines() <= max_history + rows,
        "ring size {} exceeds bound",
        grid.total_lines()
    );

    for row in 0..rows {
        let line = grid.line(row).unwrap();
        let mut col = 0;
        while col < line.len() {
            let cell = line.cell(col).unwrap();
            if cell.width() == 2 {
                prop_assert!(
                    col + 1 < line.len(),
                    "wide cell in last column at ({row}, {col})"
                );
                prop_assert!(
                    line.cell(col + 1).unwrap().is_continuation(),
                    "wide cell at ({row}, {col}) lacks continuation"
                );
                col += 2;
            } else {
                col += 1;
            }
        }
    }
    Ok(())
}

/// Strategy mixing raw byte soup with realistic sequence fragments, so the
/// generator actually reaches deep parser states.
fn vt_input() -> impl Strategy<Value = Vec<u8>> {
    let fragment = prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..24),
        Just(b"\x1b[".to_vec()),
        Just(b"\x1b[1;31m".to_vec()),
        Just(b"\x1b[999;999H".to_vec()),
        Just(b"\x1b[2J".to_vec()),
        Just(b"\x1b[?1049h".to_vec()),
        Just(b"\x1b[?1049l".to_vec()),
        Just(b"\x1b[5;10r".to_vec()),
        Just(b"\x1b[?6h".to_vec()),
        Just(b"\x1bP0;1;0q#0;2;100;0;0~~-\x1b\\".to_vec()),
        Just(b"\x1b]0;title\x07".to_vec()),
        Just(b"\x1b]8;;http://x\x1b\\".to_vec()),
        Just("中文 wide ".as_bytes().to_vec()),
        Just(b"text\r\nmore\r\n".to_vec()),
        Just(b"\x1b[10L\x1b[3M\x1b[5@\x1b[2P\x1b[4X".to_vec()),
        Just(b"\x1bc".to_vec()),
    ];
    proptest::collection::vec(fragment, 0..24).prop_map(|frags| frags.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn arbitrary_bytes_never_break_invariants(input in vt_input()) {
        let history = 50;
        let mut term = terminal(20, 6, history);
        term.write(&input);
        check_invariants(&term, history)?;
    }

    #[test]
    fn pure_random_bytes_never_panic(input in proptest::collection::vec(any::<u8>(), 0..512)) {
        let history = 8;
        let mut term = terminal(10, 4, history);
        term.write(&input);
        check_invariants(&term, history)?;
    }

    #[test]
    fn chunking_is_transparent(input in vt_input(), split in any::<prop::sample::Index>()) {
        let (cols, rows, history) = (20, 6, 50);

        let mut whole = terminal(cols, rows, history);
        whole.write(&input);

        let mut chunked = terminal(cols, rows, history);
        let at = if input.is_empty() { 0 } else { split.index(input.len()) };
        chunked.write(&input[..at]);
        chunked.write(&input[at..]);

        prop_assert!(whole.snapshot().visual_eq(&chunked.snapshot()));
    }

    #[test]
    fn resize_preserves_invariants(
        input in vt_input(),
        new_cols in 1usize..40,
        new_rows in 1usize..12,
    ) {
        let history = 50;
        let mut term = terminal(20, 6, history);
        term.write(&input);
        term.resize(new_cols, new_rows);
        check_invariants(&term, history)?;
        term.write(b"after resize\r\nstill fine");
        check_invariants(&term, history)?;
    }
}
