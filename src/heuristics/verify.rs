//! Cross-check of guessed parameters against the sample.

use crate::dialect::{DialectParameters, QuoteMode};
use crate::scanner::TokenizerBuilder;

/// Tokenize `data` with `params` and check that the rows agree on their
/// number of columns.
///
/// Comments and empty lines are ignored. The first row sets the expected
/// count, which must be above one. With three rows or more, the last row is
/// not checked, since the sample may end in the middle of it. With exactly
/// two rows, both must match.
pub(crate) fn rows_consistent(data: &[u8], params: &DialectParameters) -> bool {
    let mut tok = match TokenizerBuilder::from_dialect(params.clone())
        .quote_mode(QuoteMode::Fuzzy)
        .from_reader(data)
    {
        Ok(tok) => tok,
        Err(err) => {
            tracing::debug!(error = %err, "unusable candidate");
            return false;
        }
    };

    let mut num_cols = 0;
    let mut num_rows = 0;
    let mut cols_in_row = 0;
    while tok.advance() {
        let field = tok.field();
        if field.is_comment() || field.is_empty_line() {
            continue;
        }
        if field.at_row_start() {
            if num_rows > 1 && cols_in_row != num_cols {
                return false;
            }
            num_rows += 1;
            cols_in_row = 0;
        }
        if num_rows == 1 {
            num_cols += 1;
        } else {
            cols_in_row += 1;
        }
    }
    if tok.error().is_some() {
        return false;
    }

    match num_rows {
        0 | 1 => false,
        2 => num_cols > 1 && cols_in_row == num_cols,
        _ => num_cols > 1,
    }
}
